//! Application state for the enrollment HTTP server.

use enroll_core::{BroadcastChannel, SeatChange, SeatChangeBroadcaster};
use enroll_store::EnrollmentStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned cheaply (via `Arc` and the store's internal pool) for each
/// request.
#[derive(Clone)]
pub struct AppState {
    /// The transactional reservation engine.
    pub store: EnrollmentStore,

    /// Seat-change broadcaster; dashboards subscribe through it.
    pub broadcaster: Arc<BroadcastChannel>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: EnrollmentStore, broadcaster: Arc<BroadcastChannel>) -> Self {
        Self { store, broadcaster }
    }

    /// Publish committed seat changes, fire-and-forget.
    ///
    /// Called by handlers strictly after the store operation committed; a
    /// rolled-back operation never produces events to publish.
    pub async fn publish_seat_changes(&self, changes: Vec<SeatChange>) {
        for change in changes {
            self.broadcaster.publish(change).await;
        }
    }
}
