//! Courier Runtime - configuration, logging and the polling loop.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`, `CourierConfig`)
//! - Logging setup (`LoggingBuilder`)
//! - An in-process cache and lock (`MemoryCache`)
//! - The lock-guarded polling task (`Poller`)
//! - The `Courier` context object tying everything together
//!
//! ```rust,ignore
//! use courier_runtime::Courier;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let courier = Courier::builder(transport, users)
//!         .load_config()?
//!         .build();
//!
//!     // Register plugins and handlers, then poll until Ctrl+C.
//!     courier.run().await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod courier;
pub mod error;
pub mod logging;
pub mod poller;

#[cfg(test)]
mod testing;

pub use cache::MemoryCache;
pub use config::{ConfigError, ConfigLoader, ConfigResult, CourierConfig, FailurePolicy};
pub use courier::{Courier, CourierBuilder};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use poller::{PollOutcome, PollStats, Poller};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros in one import.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
