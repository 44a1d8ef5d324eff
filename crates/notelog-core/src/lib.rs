//! notelog-core library.
//!
//! Note state is an event-sourced fold over an append-only record log:
//!
//! - [`record`]: the immutable log entry and its index-line codec.
//! - [`store`]: the index + data file pair that holds a tenant's log.
//! - [`project`]: replays records into the current note map.
//! - [`validate`]: structural checks over a whole stored log.
//! - [`bundle`]: the zip unit exchanged during bulk sync.
//! - [`merge`]: reconciles an uploaded bundle into an existing log.
//! - [`query`]: reads and single-record mutations on top of the above.
//! - [`tenant`]: per-user store handles guarded by per-user locks.
//!
//! # Conventions
//!
//! - **Errors**: module-level `thiserror` enums exposing `code()`; see [`error::ErrorCode`].
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod bundle;
pub mod config;
pub mod error;
pub mod filename;
pub mod lock;
pub mod merge;
pub mod project;
pub mod query;
pub mod record;
pub mod store;
pub mod tenant;
pub mod validate;

pub use record::{Record, RecordKind};
pub use store::{FileStore, MemStore, RecordStore, StoreError, StoreOptions};
