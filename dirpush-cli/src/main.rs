use anyhow::{Context, Result};
use clap::Parser;
use dirpush_core::{
    spawn_monitor, MonitorConfig, PathFilter, RemoteEndpoint, RemoteSession,
};
use dirpush_remote_sftp::SftpClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "dirpush",
    version,
    about = "Watch a local directory and push every change to a remote server"
)]
struct Cli {
    /// Remote URL to mirror into: [user[:pass]@]host[:port][/path]
    #[arg(short, long)]
    url: String,

    /// Local directory to watch
    #[arg(short, long, default_value = ".")]
    path: PathBuf,

    /// Comma-separated regular expressions matching paths to ignore
    #[arg(short, long)]
    ignore: Option<String>,

    /// Username, overriding any embedded in the URL
    #[arg(long)]
    user: Option<String>,

    /// Seconds between keepalive probes on the idle connection
    #[arg(long, default_value = "180")]
    keepalive_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let mut endpoint = RemoteEndpoint::parse(&cli.url)?;
    if cli.user.is_some() {
        endpoint.user = cli.user.clone();
    }
    // Lazily prompt when a username was given without a password.
    if endpoint.user.is_some() && endpoint.password.is_none() {
        endpoint.password = Some(rpassword::prompt_password("> Password: ")?);
    }

    let patterns: Vec<String> = cli
        .ignore
        .as_deref()
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    let filter = PathFilter::new(&patterns).context("invalid ignore pattern")?;

    let root = cli
        .path
        .canonicalize()
        .with_context(|| format!("cannot resolve watch path '{}'", cli.path.display()))?;

    let client = SftpClient::connect(
        &endpoint.host,
        endpoint.user.as_deref().unwrap_or(""),
        endpoint.password.as_deref(),
    )
    .await
    .with_context(|| format!("cannot connect to '{}'", endpoint.host))?;

    let session = Arc::new(
        RemoteSession::connect(client, &endpoint.base_path, root.clone())
            .await
            .with_context(|| {
                format!("cannot change into remote directory '{}'", endpoint.base_path)
            })?,
    );

    let handle = spawn_monitor(
        session,
        filter,
        MonitorConfig {
            watch_root: root,
            keepalive_interval: Duration::from_secs(cli.keepalive_secs),
        },
    );

    // Forward ctrl-c as a stop command; the monitor treats it as a clean
    // exit and runs its cleanup before the join below returns.
    let stopper = handle.stopper();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping");
            stopper.stop();
        }
    });

    handle.join().await
}
