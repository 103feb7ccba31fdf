use crate::remote::RemoteClient;
use crate::session::RemoteSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Control handle for the background keepalive task.
#[derive(Debug, Clone)]
pub struct KeepaliveHandle {
    ctrl_tx: mpsc::Sender<()>,
}

impl KeepaliveHandle {
    /// Ask the task to stop. Safe to call more than once and after the task
    /// has already exited.
    pub fn stop(&self) {
        let _ = self.ctrl_tx.try_send(());
    }
}

/// Probe the shared session every `interval` so the remote server does not
/// drop the connection as idle. Runs regardless of event traffic. A failed
/// probe is logged and the schedule keeps running; no reconnect is attempted.
pub fn spawn_keepalive<C: RemoteClient>(
    session: Arc<RemoteSession<C>>,
    interval: Duration,
) -> KeepaliveHandle {
    let (ctrl_tx, mut ctrl_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        // The first tick completes immediately; skip it so the first probe
        // lands one full interval after connect.
        timer.tick().await;
        loop {
            tokio::select! {
                _ = ctrl_rx.recv() => break,
                _ = timer.tick() => {
                    if let Err(e) = session.probe().await {
                        warn!("keepalive probe failed: {e}");
                    }
                }
            }
        }
    });
    KeepaliveHandle { ctrl_tx }
}
