//! postsync Core Library
//!
//! This crate keeps a client-held list of posts synchronized with a remote
//! list-and-create REST resource.
//!
//! # Architecture
//!
//! - **Transport**: HTTP GET/POST against the collection resource
//! - **Store**: ordered, id-unique post list
//! - **Coordinator**: serializes load, refresh and submit, and publishes
//!   snapshots for a presentation layer
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let transport = Arc::new(HttpTransport::from_config(&config)?);
//! let coordinator = SyncCoordinator::new(transport);
//!
//! coordinator.initialize(config.default_limit).await?;
//! let post = coordinator.submit_post("Hello", "World").await?;
//! assert_eq!(coordinator.items()[0].id, post.id);
//! ```
//!
//! # Modules
//!
//! - `sync`: the coordinator and its state machine (main entry point)
//! - `store`: the post collection
//! - `transport`: the `PostTransport` seam and its HTTP implementation
//! - `models`: `Post` and `Draft`
//! - `error`: transport and coordinator errors
//! - `config`: application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod sync;
pub mod transport;

pub use config::Config;
pub use error::{ErrorKind, ErrorState, Operation, SyncError, SyncResult, TransportError};
pub use models::{Draft, Post, PostId};
pub use store::PostStore;
pub use sync::{Snapshot, SyncCoordinator, SyncEvent, SyncPhase, SyncStatus};
pub use transport::{HttpTransport, PostTransport};
