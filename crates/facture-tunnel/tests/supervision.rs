//! Supervisor tests using stand-in executables: a fake cloudflared that
//! prints the quick-tunnel banner and sleeps, and a fake server that
//! just sleeps. Both are killed by `shutdown` (or on drop).

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use facture_tunnel::{TunnelConfig, TunnelError, TunnelSupervisor};

const BANNER_CLOUDFLARED: &str = "#!/bin/sh\n\
echo \"INF |  https://lime-fox-invoice-demo.trycloudflare.com  |\" >&2\n\
exec sleep 30\n";

const SILENT_CLOUDFLARED: &str = "#!/bin/sh\n\
echo \"INF Requesting new quick Tunnel on trycloudflare.com...\" >&2\n\
exec sleep 30\n";

const FAKE_SERVER: &str = "#!/bin/sh\nexec sleep 30\n";

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
    let mut permissions = std::fs::metadata(path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path, permissions).unwrap();
}

fn test_config(dir: &Path, cloudflared_body: &str) -> TunnelConfig {
    let cloudflared = dir.join("cloudflared");
    write_script(&cloudflared, cloudflared_body);
    let server = dir.join("fake-server");
    write_script(&server, FAKE_SERVER);

    TunnelConfig {
        binary: cloudflared,
        state_dir: dir.to_path_buf(),
        server_command: Some(server),
        url_window: Duration::from_secs(5),
        poll_interval: Duration::from_millis(50),
        ..TunnelConfig::default()
    }
}

#[tokio::test]
async fn start_finds_the_url_and_shutdown_cleans_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path(), BANNER_CLOUDFLARED);

    let supervisor = TunnelSupervisor::start(config).await.expect("start");
    assert_eq!(
        supervisor.public_url(),
        Some("https://lime-fox-invoice-demo.trycloudflare.com")
    );

    let pid_file = dir.path().join("facture-tunnel.pid");
    let log_file = dir.path().join("cloudflared.log");
    let recorded = std::fs::read_to_string(&pid_file).expect("pid file");
    assert_eq!(
        recorded,
        format!(
            "server={}\ntunnel={}\n",
            supervisor.server_pid().unwrap(),
            supervisor.tunnel_pid().unwrap()
        )
    );
    assert!(log_file.is_file());

    supervisor.shutdown().await.expect("shutdown");
    assert!(!pid_file.exists());
    assert!(!log_file.exists());
}

#[tokio::test]
async fn a_url_that_never_appears_is_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path(), SILENT_CLOUDFLARED);
    config.url_window = Duration::from_millis(300);

    let supervisor = TunnelSupervisor::start(config).await.expect("start");
    assert_eq!(supervisor.public_url(), None);
    assert!(supervisor.server_pid().is_some());
    assert!(supervisor.tunnel_pid().is_some());
    assert!(dir.path().join("facture-tunnel.pid").is_file());

    supervisor.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn a_missing_binary_fails_before_anything_is_spawned() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path(), BANNER_CLOUDFLARED);
    config.binary = dir.path().join("not-cloudflared");

    let err = TunnelSupervisor::start(config).await.unwrap_err();
    assert!(matches!(err, TunnelError::BinaryNotFound(_)));
    assert!(!dir.path().join("facture-tunnel.pid").exists());
    assert!(!dir.path().join("cloudflared.log").exists());
}

#[tokio::test]
async fn a_stale_pid_file_is_overwritten() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pid_file = dir.path().join("facture-tunnel.pid");
    std::fs::write(&pid_file, "server=1\ntunnel=2\n").unwrap();

    let config = test_config(dir.path(), BANNER_CLOUDFLARED);
    let supervisor = TunnelSupervisor::start(config).await.expect("start");

    let recorded = std::fs::read_to_string(&pid_file).expect("pid file");
    assert_ne!(recorded, "server=1\ntunnel=2\n");
    assert!(recorded.contains(&format!("server={}", supervisor.server_pid().unwrap())));

    supervisor.shutdown().await.expect("shutdown");
}
