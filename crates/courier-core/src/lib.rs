//! # Courier Core
//!
//! Data model and collaborator interfaces shared by every Courier crate.
//!
//! The dispatch core talks to four external collaborators, each modelled here
//! as an object-safe async trait:
//!
//! - [`ChatTransport`]: fetches updates and sends messages
//! - [`UserStore`]: answers "who is banned" and "who has role X"
//! - [`CacheService`]: key/value cache doubling as a distributed lock
//! - [`Scheduler`]: job management, delegated as-is
//!
//! Concrete implementations live outside the core; `courier-runtime` ships an
//! in-process cache for single-host deployments and tests.

pub mod cache;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod transport;
pub mod update;

pub use cache::{BoxedCache, CacheService, ComputeFn, ShouldCacheFn};
pub use error::{
    BoxError, CacheError, CacheResult, SchedulerError, SchedulerResult, StoreError, StoreResult,
    TransportError, TransportResult,
};
pub use scheduler::{BoxedScheduler, JobFn, JobInfo, JobSpec, Scheduler, Trigger};
pub use store::{BoxedUserStore, OWNER_ROLE, StoredUser, UserFilter, UserStore};
pub use transport::{BoxedTransport, ChatTransport, ParseMode};
pub use update::{
    CallbackQuery, Chat, ChatId, ChatKind, Message, PhotoSize, Update, User, UserId,
};
