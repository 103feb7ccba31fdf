//! SFTP-backed remote client for dirpush.

mod ssh_client;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dirpush_core::{RemoteClient, RemoteError};
use russh::client::AuthResult;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::StatusCode;
use ssh_client::Client;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::info;

pub struct SftpClient {
    sftp: SftpSession,
    // Working directory set by change_dir; SFTP has no cwd of its own, so
    // it is prepended to every relative path.
    cwd: String,
}

impl SftpClient {
    /// Open the transport connection and authenticate. Failure here is
    /// fatal to startup; there is no session to keep alive yet.
    pub async fn connect(
        host_with_port: &str,
        user: &str,
        password: Option<&str>,
    ) -> Result<Self> {
        let (host, port) = match host_with_port.rsplit_once(':') {
            Some((h, p)) => {
                let port: u16 = p
                    .parse()
                    .map_err(|_| anyhow!("invalid port in host: {host_with_port}"))?;
                (h.to_string(), port)
            }
            None => (host_with_port.to_string(), 22u16),
        };

        let config = russh::client::Config::default();
        let mut session =
            russh::client::connect(Arc::new(config), (host.as_str(), port), Client).await?;
        let res = session
            .authenticate_password(user, password.unwrap_or(""))
            .await?;
        if let AuthResult::Failure {
            remaining_methods,
            partial_success,
        } = res
        {
            return Err(anyhow!(
                "authentication failed, remaining_methods: {:?}, partial_success: {}",
                remaining_methods,
                partial_success
            ));
        }
        let channel = session.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;
        if user.is_empty() {
            info!("connected to '{host}'");
        } else {
            info!("connected to '{host}' with username '{user}'");
        }
        Ok(Self {
            sftp,
            cwd: String::new(),
        })
    }

    fn resolve(&self, path: &str) -> String {
        if self.cwd.is_empty() || path.starts_with('/') {
            path.to_string()
        } else if path == "." {
            self.cwd.clone()
        } else {
            format!("{}/{}", self.cwd, path)
        }
    }
}

fn to_remote_error(err: russh_sftp::client::error::Error) -> RemoteError {
    use russh_sftp::client::error::Error;
    match &err {
        Error::Status(status) => match status.status_code {
            StatusCode::NoSuchFile => RemoteError::NotFound(status.error_message.clone()),
            StatusCode::PermissionDenied => RemoteError::Permission(status.error_message.clone()),
            _ => RemoteError::Protocol(err.to_string()),
        },
        _ => RemoteError::Protocol(err.to_string()),
    }
}

#[async_trait]
impl RemoteClient for SftpClient {
    async fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        let abs = self
            .sftp
            .canonicalize(path)
            .await
            .map_err(to_remote_error)?;
        let attrs = self
            .sftp
            .metadata(abs.clone())
            .await
            .map_err(to_remote_error)?;
        if !attrs.is_dir() {
            return Err(RemoteError::Protocol(format!("not a directory: {path}")));
        }
        self.cwd = abs;
        Ok(())
    }

    async fn list(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        let entries = self
            .sftp
            .read_dir(self.resolve(path))
            .await
            .map_err(to_remote_error)?;
        let mut names = Vec::new();
        for entry in entries {
            names.push(entry.file_name());
        }
        Ok(names)
    }

    async fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.sftp
            .create_dir(self.resolve(path))
            .await
            .map_err(to_remote_error)
    }

    async fn remove_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.sftp
            .remove_dir(self.resolve(path))
            .await
            .map_err(to_remote_error)
    }

    async fn delete_file(&mut self, path: &str) -> Result<(), RemoteError> {
        self.sftp
            .remove_file(self.resolve(path))
            .await
            .map_err(to_remote_error)
    }

    async fn store(
        &mut self,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<u64, RemoteError> {
        let mut remote = self
            .sftp
            .create(self.resolve(path))
            .await
            .map_err(to_remote_error)?;
        let sent = tokio::io::copy(data, &mut remote).await?;
        remote.shutdown().await?;
        Ok(sent)
    }
}
