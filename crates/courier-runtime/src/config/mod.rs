//! Configuration module for the Courier runtime.
//!
//! Settings are layered with figment: built-in defaults, then TOML/YAML files,
//! then `COURIER_*` environment variables.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config};
pub use schema::{
    CacheConfig, CourierConfig, FailurePolicy, LogFormat, LogLevel, LogOutput, LoggingConfig,
    PluginSettings, PollingConfig, SpanEventConfig,
};
