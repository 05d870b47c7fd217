use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

fn default_host() -> IpAddr {
	IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
	3000
}

/// Runtime configuration, read from the environment (and `.env`, if present).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	/// PostgreSQL connection string. Without it, posts are kept in memory.
	pub database_url: Option<String>,
	#[serde(default = "default_host")]
	pub host: IpAddr,
	#[serde(default = "default_port")]
	pub port: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("error parsing .env file: {0}")]
	Dotenv(#[from] dotenvy::Error),
	#[error("error parsing environment: {0}")]
	Envy(#[from] envy::Error),
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		if let Err(e) = dotenvy::dotenv() {
			if e.not_found() {
				tracing::debug!("no .env file found");
			} else {
				return Err(e.into());
			}
		}

		Self::from_vars(std::env::vars())
	}

	fn from_vars(vars: impl Iterator<Item = (String, String)>) -> Result<Self, Error> {
		Ok(envy::from_iter(vars)?)
	}
}
