use crate::remote::{RemoteClient, RemoteError};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Owns the single live connection to the remote endpoint. Every public
/// operation holds the session lock for its whole duration, so a keepalive
/// probe and an event-driven mutation never interleave commands on the
/// underlying connection.
pub struct RemoteSession<C: RemoteClient> {
    client: Mutex<C>,
    root: PathBuf,
}

impl<C: RemoteClient> RemoteSession<C> {
    /// Change into the remote base directory and take ownership of the
    /// client. Local paths under `watch_root` map 1:1 onto remote paths
    /// under that base directory.
    pub async fn connect(
        mut client: C,
        base_path: &str,
        watch_root: impl Into<PathBuf>,
    ) -> Result<Self, RemoteError> {
        if !base_path.is_empty() {
            client.change_dir(base_path).await?;
            info!("changed remote directory to '{base_path}'");
        }
        Ok(Self {
            client: Mutex::new(client),
            root: watch_root.into(),
        })
    }

    fn remote_name(&self, local: &Path) -> String {
        let rel = local.strip_prefix(&self.root).unwrap_or(local);
        rel.to_string_lossy().replace('\\', "/")
    }

    /// Mirror `local` to the remote. A directory is created and then
    /// back-filled with everything already under it, parents before
    /// children; the watcher does not emit a synthetic event per existing
    /// descendant. A file is streamed whole.
    pub async fn upload(&self, local: &Path) -> Result<(), RemoteError> {
        let mut client = self.client.lock().await;
        if local.is_dir() {
            for entry in WalkDir::new(local).into_iter().filter_map(|e| e.ok()) {
                let remote = self.remote_name(entry.path());
                if entry.file_type().is_dir() {
                    // The directory may already exist remotely; that must
                    // not abort the traversal.
                    match client.make_dir(&remote).await {
                        Ok(()) => info!("created directory '{remote}'"),
                        Err(e) => debug!("mkdir '{remote}': {e}"),
                    }
                } else {
                    store_file(&mut *client, entry.path(), &remote).await?;
                }
            }
            Ok(())
        } else {
            let remote = self.remote_name(local);
            store_file(&mut *client, local, &remote).await
        }
    }

    /// Remove the remote counterpart of `local`. `is_dir` is a hint: a
    /// failed file delete is retried as a directory removal, since move-out
    /// events no longer have an entry to stat.
    pub async fn remove(&self, local: &Path, is_dir: bool) -> Result<(), RemoteError> {
        let mut client = self.client.lock().await;
        let remote = self.remote_name(local);
        if is_dir {
            remove_dir_tree(&mut *client, &remote).await
        } else {
            match client.delete_file(&remote).await {
                Ok(()) => {
                    info!("deleted '{remote}'");
                    Ok(())
                }
                Err(_) => remove_dir_tree(&mut *client, &remote).await,
            }
        }
    }

    /// Issue a throwaway listing to generate traffic on an idle connection.
    pub async fn probe(&self) -> Result<(), RemoteError> {
        let mut client = self.client.lock().await;
        client.list(".").await.map(|_| ())
    }
}

async fn store_file<C: RemoteClient>(
    client: &mut C,
    local: &Path,
    remote: &str,
) -> Result<(), RemoteError> {
    let mut file = tokio::fs::File::open(local).await?;
    let sent = client.store(remote, &mut file).await?;
    info!("uploaded '{remote}' ({sent} bytes)");
    Ok(())
}

/// Post-order removal driven by remote listings. The watcher does not emit a
/// delete event per descendant of a removed directory, and listings do not
/// reliably flag subdirectories, so each child is tried as a file first and
/// retried as a directory when that fails.
async fn remove_dir_tree<C: RemoteClient>(client: &mut C, path: &str) -> Result<(), RemoteError> {
    let mut stack: Vec<(String, bool)> = vec![(path.to_string(), false)];
    while let Some((dir, visited)) = stack.pop() {
        if visited {
            client.remove_dir(&dir).await?;
            info!("deleted directory '{dir}'");
            continue;
        }
        let entries = match client.list(&dir).await {
            Ok(entries) => entries,
            // Already gone remotely; the target state is reached.
            Err(RemoteError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        };
        stack.push((dir.clone(), true));
        for entry in entries {
            let name = entry.rsplit('/').next().unwrap_or(entry.as_str());
            if name == "." || name == ".." {
                continue;
            }
            let child = format!("{dir}/{name}");
            match client.delete_file(&child).await {
                Ok(()) => info!("deleted '{child}'"),
                Err(_) => stack.push((child, false)),
            }
        }
    }
    Ok(())
}
