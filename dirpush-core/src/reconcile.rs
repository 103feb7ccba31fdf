use crate::event::{ChangeEvent, ChangeKind};
use crate::filter::PathFilter;
use crate::remote::{RemoteClient, RemoteError};
use crate::session::RemoteSession;
use std::sync::Arc;
use tracing::error;

/// Translates accepted filesystem events into remote operations.
pub struct Reconciler<C: RemoteClient> {
    session: Arc<RemoteSession<C>>,
    filter: PathFilter,
}

impl<C: RemoteClient> Reconciler<C> {
    pub fn new(session: Arc<RemoteSession<C>>, filter: PathFilter) -> Self {
        Self { session, filter }
    }

    /// Apply one event. Ignored paths are dropped silently. A remote failure
    /// is logged and swallowed here, at the dispatch boundary, so a single
    /// bad transfer or deletion cannot stop the monitoring loop.
    pub async fn apply(&self, event: ChangeEvent) {
        if self.filter.is_ignored(&event.path) {
            return;
        }
        if let Err(e) = self.dispatch(&event).await {
            error!(
                "error handling {:?} on '{}': {e}",
                event.kind,
                event.path.display()
            );
        }
    }

    async fn dispatch(&self, event: &ChangeEvent) -> Result<(), RemoteError> {
        match event.kind {
            // A freshly created file is not safely readable until its write
            // is closed; only directories are acted on at creation.
            ChangeKind::Created if event.is_dir => self.session.upload(&event.path).await,
            ChangeKind::Created => Ok(()),
            ChangeKind::WrittenAndClosed if !event.is_dir => {
                self.session.upload(&event.path).await
            }
            ChangeKind::WrittenAndClosed => Ok(()),
            ChangeKind::Deleted | ChangeKind::MovedOut => {
                self.session.remove(&event.path, event.is_dir).await
            }
            ChangeKind::MovedIn => self.session.upload(&event.path).await,
        }
    }
}
