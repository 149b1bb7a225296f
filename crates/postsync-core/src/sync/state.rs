//! Coordinator state
//!
//! Phases, the coarse status shown to users, the snapshot handed to the
//! presentation layer, and the events emitted on every transition.

use chrono::{DateTime, Utc};

use crate::error::{ErrorState, Operation};
use crate::models::Post;

/// Lifecycle phase of the coordinator
///
/// ```text
/// Uninitialized -> Loading -> Ready | LoadFailed
/// LoadFailed    -> Loading
/// Ready         -> Refreshing -> Ready
/// Ready         -> Submitting -> Ready
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing fetched yet
    Uninitialized,
    /// First load in flight
    Loading,
    /// List available, nothing in flight
    Ready,
    /// First load failed, list is empty
    LoadFailed,
    /// Refresh in flight, previous list still shown
    Refreshing,
    /// Create request in flight
    Submitting,
}

impl SyncPhase {
    /// Coarse status for display
    pub fn status(self) -> SyncStatus {
        match self {
            SyncPhase::Uninitialized | SyncPhase::Ready | SyncPhase::LoadFailed => {
                SyncStatus::Idle
            }
            SyncPhase::Loading => SyncStatus::Loading,
            SyncPhase::Refreshing => SyncStatus::Refreshing,
            SyncPhase::Submitting => SyncStatus::Submitting,
        }
    }

    /// The operation currently in flight, if any
    pub fn running(self) -> Option<Operation> {
        match self {
            SyncPhase::Loading => Some(Operation::Load),
            SyncPhase::Refreshing => Some(Operation::Refresh),
            SyncPhase::Submitting => Some(Operation::Submit),
            _ => None,
        }
    }

    /// True when a request is in flight
    pub fn is_busy(self) -> bool {
        self.running().is_some()
    }
}

/// Whether a request is in flight, and which kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Loading,
    Refreshing,
    Submitting,
}

/// Read-only view of the coordinator for rendering
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: SyncPhase,
    pub items: Vec<Post>,
    pub error: Option<ErrorState>,
    /// When the list was last fetched successfully
    pub last_synced: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn status(&self) -> SyncStatus {
        self.phase.status()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            phase: SyncPhase::Uninitialized,
            items: Vec::new(),
            error: None,
            last_synced: None,
        }
    }
}

/// Events emitted by the coordinator
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Phase changed
    PhaseChanged(SyncPhase),
    /// List replaced by a load or refresh, with the new length
    ItemsReplaced(usize),
    /// A created post was added to the list
    PostAdded(Post),
    /// Submission succeeded, input fields can be cleared
    DraftAccepted,
    /// An operation failed
    Error(ErrorState),
}
