use darling::{ast, FromDeriveInput, FromField};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

/// Whether the field is filled in by the server rather than the client.
fn is_server_owned(attrs: &[syn::Attribute]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(ref list) = attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
		})
	})
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
	let input_ident = format_ident!("{}Input", ident);
	let patch_ident = format_ident!("{}Patch", ident);

	let attrs = &receiver.attrs;

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(ident, "#[model] only supports structs with named fields")
			.to_compile_error()
			.into();
	};

	let fields = fields
		.iter()
		.filter(|field| !is_server_owned(&field.attrs))
		.filter_map(|field| {
			Some((&field.attrs, field.ident.as_ref()?, &field.ty, &field.vis))
		})
		.collect::<Vec<_>>();

	let names = fields.iter().map(|(_, ident, _, _)| ident).collect::<Vec<_>>();

	let input_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		quote! {
			#(#attrs)*
			#vis #ident: #ty,
		}
	});

	let patch_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		quote! {
			#(#attrs)*
			#vis #ident: Option<#ty>,
		}
	});

	quote! {
		#input

		#(#attrs)*
		#vis struct #input_ident #generics {
			#(
				#input_fields
			)*
		}

		#(#attrs)*
		#vis struct #patch_ident #generics {
			#(
				#patch_fields
			)*
		}

		impl #impl_generics From<#ident #ty_generics> for #input_ident #ty_generics #where_clause {
			fn from(model: #ident #ty_generics) -> Self {
				Self {
					#(
						#names: model.#names,
					)*
				}
			}
		}

		impl #impl_generics #patch_ident #ty_generics #where_clause {
			/// Overlays the fields present in this patch on top of `base`.
			#vis fn merge(self, base: #input_ident #ty_generics) -> #input_ident #ty_generics {
				#input_ident {
					#(
						#names: self.#names.unwrap_or(base.#names),
					)*
				}
			}
		}
	}
	.into()
}
