use crate::event::{translate, ChangeEvent};
use crate::filter::PathFilter;
use crate::keepalive::spawn_keepalive;
use crate::reconcile::Reconciler;
use crate::remote::RemoteClient;
use crate::session::RemoteSession;
use anyhow::{anyhow, Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub watch_root: PathBuf,
    pub keepalive_interval: Duration,
}

#[derive(Debug, Clone)]
pub enum MonitorCommand {
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorState {
    Watching,
    Stopped,
}

/// Public handle returned to callers for controlling a running monitor.
pub struct MonitorHandle {
    ctrl_tx: mpsc::Sender<MonitorCommand>,
    state_rx: watch::Receiver<MonitorState>,
    task: JoinHandle<Result<()>>,
}

impl MonitorHandle {
    /// Request a clean stop. Idempotent.
    pub fn stop(&self) {
        let _ = self.ctrl_tx.try_send(MonitorCommand::Stop);
    }

    /// A cheap clone that can stop the monitor from another task.
    pub fn stopper(&self) -> MonitorStopper {
        MonitorStopper {
            ctrl_tx: self.ctrl_tx.clone(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state_rx.borrow().clone()
    }

    /// Wait for the monitor to finish and yield the loop's result.
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| anyhow!("monitor task panicked: {e}"))?
    }
}

#[derive(Debug, Clone)]
pub struct MonitorStopper {
    ctrl_tx: mpsc::Sender<MonitorCommand>,
}

impl MonitorStopper {
    pub fn stop(&self) {
        let _ = self.ctrl_tx.try_send(MonitorCommand::Stop);
    }
}

/// Start watching `cfg.watch_root` and mirroring its changes through
/// `session`. The session must already be connected and based.
pub fn spawn_monitor<C: RemoteClient>(
    session: Arc<RemoteSession<C>>,
    filter: PathFilter,
    cfg: MonitorConfig,
) -> MonitorHandle {
    let (ctrl_tx, ctrl_rx) = mpsc::channel(4);
    let (state_tx, state_rx) = watch::channel(MonitorState::Watching);
    let task = tokio::spawn(run(session, filter, cfg, ctrl_rx, state_tx));
    MonitorHandle {
        ctrl_tx,
        state_rx,
        task,
    }
}

async fn run<C: RemoteClient>(
    session: Arc<RemoteSession<C>>,
    filter: PathFilter,
    cfg: MonitorConfig,
    mut ctrl_rx: mpsc::Receiver<MonitorCommand>,
    state_tx: watch::Sender<MonitorState>,
) -> Result<()> {
    let (ev_tx, mut ev_rx) = mpsc::channel::<ChangeEvent>(1024);
    // Must outlive the loop; dropping the watcher unsubscribes from the OS.
    let _watcher = start_watcher(&cfg.watch_root, ev_tx)?;
    let keepalive = spawn_keepalive(session.clone(), cfg.keepalive_interval);
    let reconciler = Reconciler::new(session, filter);
    info!("start monitoring '{}'", cfg.watch_root.display());

    // Events are handled one at a time, in arrival order. An in-flight
    // operation always runs to completion or failure before the next event
    // is considered.
    let result = loop {
        tokio::select! {
            cmd = ctrl_rx.recv() => match cmd {
                Some(MonitorCommand::Stop) | None => break Ok(()),
            },
            ev = ev_rx.recv() => match ev {
                Some(ev) => reconciler.apply(ev).await,
                // The watcher callback is gone; nothing more will arrive.
                None => break Err(anyhow!("filesystem event stream closed")),
            },
        }
    };

    // Runs on the normal-stop path and the fatal path alike.
    keepalive.stop();
    let _ = state_tx.send(MonitorState::Stopped);
    result
}

fn start_watcher(
    root: &Path,
    ev_tx: mpsc::Sender<ChangeEvent>,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                for ev in translate(event) {
                    let _ = ev_tx.blocking_send(ev);
                }
            }
            Err(e) => tracing::error!("watch error: {e}"),
        },
        notify::Config::default(),
    )?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("cannot watch '{}'", root.display()))?;
    Ok(watcher)
}
