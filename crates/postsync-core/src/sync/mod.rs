//! Collection sync
//!
//! Keeps a client-held post list in step with the remote collection.
//!
//! ## Workflows
//!
//! 1. `initialize`: first load, the list is empty until it succeeds
//! 2. `refresh`: re-fetch, the previous list survives a failure
//! 3. `submit_post`: create remotely, then prepend locally
//!
//! Only one workflow runs at a time. A second request while one is in
//! flight is rejected with `SyncError::AlreadyInProgress`.
//!
//! ## Usage
//!
//! ```ignore
//! let transport = Arc::new(HttpTransport::from_config(&config)?);
//! let coordinator = SyncCoordinator::new(transport);
//! coordinator.initialize(config.default_limit).await?;
//! coordinator.submit_post("Hello", "World").await?;
//! ```

mod coordinator;
mod state;

pub use coordinator::SyncCoordinator;
pub use state::{Snapshot, SyncEvent, SyncPhase, SyncStatus};
