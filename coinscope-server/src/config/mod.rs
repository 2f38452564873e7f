//! Gateway configuration: TOML file, environment overrides, validation

pub mod defaults;
mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::*;
