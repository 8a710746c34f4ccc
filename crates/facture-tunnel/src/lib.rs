//! Cloudflare quick-tunnel supervision for the facture server.
//!
//! [`TunnelSupervisor::start`] launches two children: the server (the
//! current executable re-run with `serve`) and `cloudflared tunnel
//! --url http://localhost:<port>` with its output captured in a log
//! file. The log is polled for the `https://*.trycloudflare.com` URL
//! within a bounded window, and both PIDs are recorded in a PID file.
//! [`TunnelSupervisor::shutdown`] terminates both children, awaits
//! their exit, and removes the PID file and the log.
//!
//! # Example
//!
//! ```rust,no_run
//! use facture_tunnel::{TunnelConfig, TunnelSupervisor};
//!
//! # async fn example() -> facture_tunnel::error::Result<()> {
//! let supervisor = TunnelSupervisor::start(TunnelConfig::default()).await?;
//! match supervisor.public_url() {
//!     Some(url) => println!("Public URL: {url}"),
//!     None => println!("Tunnel running, URL not detected yet"),
//! }
//! // ... wait for Ctrl-C ...
//! supervisor.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod supervisor;

pub use error::TunnelError;
pub use supervisor::{find_public_url, TunnelConfig, TunnelSupervisor};
