//! Supervision of the server process and the cloudflared quick tunnel.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use lazy_regex::regex;
use tokio::process::{Child, Command};
use tokio::time::sleep;

use crate::error::{Result, TunnelError};

pub const PID_FILE_NAME: &str = "facture-tunnel.pid";
pub const LOG_FILE_NAME: &str = "cloudflared.log";

/// Configuration for [`TunnelSupervisor::start`].
pub struct TunnelConfig {
    /// Path to the cloudflared executable.
    pub binary: PathBuf,
    /// Port the server listens on and the tunnel forwards to.
    pub port: u16,
    /// Directory for the PID file and the tunnel log.
    pub state_dir: PathBuf,
    /// Extra arguments appended to the spawned `serve` command.
    pub server_args: Vec<String>,
    /// Server executable to spawn. Defaults to the current executable,
    /// which relaunches itself with a `serve` argument.
    pub server_command: Option<PathBuf>,
    /// How long to watch the tunnel log for the public URL.
    pub url_window: Duration,
    /// Poll interval within that window.
    pub poll_interval: Duration,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("./cloudflared"),
            port: 5000,
            state_dir: PathBuf::from("."),
            server_args: Vec::new(),
            server_command: None,
            url_window: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Owns the server and tunnel child processes.
///
/// Both children are spawned with `kill_on_drop`, so dropping the
/// supervisor without calling [`shutdown`](Self::shutdown) still takes
/// the processes down; only `shutdown` also removes the PID file and
/// the tunnel log.
#[derive(Debug)]
pub struct TunnelSupervisor {
    server: Child,
    tunnel: Child,
    pid_file: PathBuf,
    log_file: PathBuf,
    public_url: Option<String>,
}

impl TunnelSupervisor {
    /// Spawn the server and the tunnel, then watch the tunnel log for
    /// the public URL.
    ///
    /// A missing binary or an unsupported architecture fails before
    /// anything is spawned. Not finding the URL within the window is
    /// not an error: the processes keep running and
    /// [`public_url`](Self::public_url) returns None.
    pub async fn start(config: TunnelConfig) -> Result<Self> {
        check_platform()?;
        if !config.binary.is_file() {
            return Err(TunnelError::BinaryNotFound(config.binary));
        }

        let pid_file = config.state_dir.join(PID_FILE_NAME);
        let log_file = config.state_dir.join(LOG_FILE_NAME);
        if pid_file.exists() {
            tracing::warn!(
                "Stale PID file {} found, a previous run may not have been stopped cleanly",
                pid_file.display()
            );
        }

        let server_exe = match &config.server_command {
            Some(path) => path.clone(),
            None => std::env::current_exe()?,
        };
        let mut cmd = Command::new(&server_exe);
        cmd.arg("serve").arg("--port").arg(config.port.to_string());
        for arg in &config.server_args {
            cmd.arg(arg);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd.kill_on_drop(true);
        tracing::info!("Starting server: {:?}", cmd);
        let server = cmd.spawn().map_err(TunnelError::Spawn)?;

        // cloudflared logs to stderr, so both streams go to the log file.
        let log = std::fs::File::create(&log_file)?;
        let mut cmd = Command::new(&config.binary);
        cmd.arg("tunnel")
            .arg("--url")
            .arg(format!("http://localhost:{}", config.port));
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log));
        cmd.kill_on_drop(true);
        tracing::info!("Starting tunnel: {:?}", cmd);
        let tunnel = cmd.spawn().map_err(TunnelError::Spawn)?;

        write_pid_file(&pid_file, server.id(), tunnel.id())?;

        let public_url = wait_for_url(&log_file, config.url_window, config.poll_interval).await;
        match &public_url {
            Some(url) => tracing::info!("Tunnel is up: {url}"),
            None => tracing::warn!(
                "No tunnel URL detected within {:?}; check {} for the https://*.trycloudflare.com line",
                config.url_window,
                log_file.display()
            ),
        }

        Ok(Self {
            server,
            tunnel,
            pid_file,
            log_file,
            public_url,
        })
    }

    /// The detected quick-tunnel URL, if one appeared in the log.
    pub fn public_url(&self) -> Option<&str> {
        self.public_url.as_deref()
    }

    pub fn server_pid(&self) -> Option<u32> {
        self.server.id()
    }

    pub fn tunnel_pid(&self) -> Option<u32> {
        self.tunnel.id()
    }

    /// Terminate both children, await their exit, and remove the PID
    /// file and the tunnel log.
    pub async fn shutdown(mut self) -> Result<()> {
        tracing::info!("Stopping tunnel and server");
        let _ = self.tunnel.kill().await;
        let _ = self.server.kill().await;

        remove_if_present(&self.pid_file)?;
        remove_if_present(&self.log_file)?;
        Ok(())
    }
}

fn check_platform() -> Result<()> {
    // cloudflared ships Linux builds for these only.
    match std::env::consts::ARCH {
        "x86_64" | "aarch64" | "arm" => Ok(()),
        other => Err(TunnelError::UnsupportedPlatform(other)),
    }
}

fn write_pid_file(path: &Path, server: Option<u32>, tunnel: Option<u32>) -> Result<()> {
    let mut contents = String::new();
    if let Some(pid) = server {
        contents.push_str(&format!("server={pid}\n"));
    }
    if let Some(pid) = tunnel {
        contents.push_str(&format!("tunnel={pid}\n"));
    }
    std::fs::write(path, contents)?;
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn wait_for_url(log_file: &Path, window: Duration, interval: Duration) -> Option<String> {
    let start = tokio::time::Instant::now();
    loop {
        if let Ok(contents) = std::fs::read_to_string(log_file) {
            if let Some(url) = find_public_url(&contents) {
                return Some(url);
            }
        }
        if start.elapsed() > window {
            return None;
        }
        sleep(interval).await;
    }
}

/// First quick-tunnel URL in a cloudflared log.
pub fn find_public_url(log: &str) -> Option<String> {
    regex!(r"https://[a-z0-9-]+\.trycloudflare\.com")
        .find(log)
        .map(|m| m.as_str().to_string())
}
