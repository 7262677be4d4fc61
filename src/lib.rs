//! Library side of hetzner-ddns: keeps a Hetzner DNS A record pointed at the
//! host's public IPv4 address.

pub mod config;
pub mod constants;
pub mod daemon;
pub mod dns_provider;
pub mod env_file;
pub mod error;
pub mod health;
pub mod hetzner;
pub mod ip_source;
pub mod pipeline;
pub mod validation;
