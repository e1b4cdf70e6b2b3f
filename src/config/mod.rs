//! Configuration loading and validation
//!
//! Kasumi is configured by a single TOML file declaring the client identity,
//! cache behavior, and optional provider and rule tables. Omitted tables
//! fall back to the built-in catalogs.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{CacheBackend, CacheConfig, Config, IdentityConfig};
pub use validation::validate;
