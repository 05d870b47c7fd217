mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the operation summary, and the
/// remaining lines (if any) become its description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates two companion structs for the model: `XInput` and `XPatch`.
///
/// Fields marked with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are
/// owned by the server and left out of both. `XInput` keeps every other field
/// verbatim (including attributes), while `XPatch` wraps each of them in an
/// [`Option`] and gains a `merge` method that fills the gaps from an `XInput`.
///
/// A `From<X> for XInput` conversion is generated as well, so an existing
/// record can serve as the base of a patch.
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
