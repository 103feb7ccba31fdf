use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Failure of a single remote command. Variants mirror the status classes
/// servers report so callers can branch on them; everything else lands in
/// `Protocol`.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("no such remote path: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Command set of a remote file-transfer session. Paths are relative to the
/// working directory established by `change_dir`, with `/` separators.
#[async_trait]
pub trait RemoteClient: Send + 'static {
    async fn change_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Names of the entries under `path`. Servers differ on whether names
    /// come back bare or prefixed with the listed path, and the listing does
    /// not reliably distinguish files from subdirectories.
    async fn list(&mut self, path: &str) -> Result<Vec<String>, RemoteError>;

    async fn make_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    async fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    async fn delete_file(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Stream `data` to the remote file `path`, returning the bytes written.
    async fn store(
        &mut self,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, RemoteError>;
}
