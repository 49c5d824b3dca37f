//! Configuration discovery and loading for the storefront services.
//!
//! Config is read from `storefront.{toml,yaml,yml,json}` (project-local,
//! then `~/.config/storefront/`), with `${ENV_VAR}` substitution applied to
//! the raw file before parsing. Environment variables override the loaded
//! values for the deploy-sensitive fields (signing secret, database URL,
//! port).

// Tests mutate process env vars, which is unsafe in edition 2024.
#![cfg_attr(test, allow(clippy::unwrap_used, unsafe_code))]

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{clear_config_dir, discover_and_load, load_config, set_config_dir},
    schema::{AuthConfig, DatabaseConfig, GatewayConfig, StorefrontConfig},
};
