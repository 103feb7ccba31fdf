//! Core library for dirpush – event-driven mirroring of a local directory
//! tree to a remote endpoint.

mod endpoint;
mod event;
mod filter;
mod keepalive;
mod monitor;
mod reconcile;
mod remote;
mod session;

pub use endpoint::{ParseError, RemoteEndpoint};
pub use event::{translate, ChangeEvent, ChangeKind};
pub use filter::PathFilter;
pub use keepalive::{spawn_keepalive, KeepaliveHandle};
pub use monitor::{spawn_monitor, MonitorConfig, MonitorHandle, MonitorState, MonitorStopper};
pub use reconcile::Reconciler;
pub use remote::{RemoteClient, RemoteError};
pub use session::RemoteSession;
