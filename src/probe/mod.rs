//! TCP reachability probing for the SSH daemon of a fresh machine.
//!
//! A single probe opens a connection, waits for the socket to become
//! readable (sshd sends its banner first) and classifies failures so the
//! caller can decide how long to back off before the next attempt.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

mod policy;

pub use policy::ReachabilityPolicy;

/// Port probed when no override is supplied.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default bound on a single connection attempt.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const BANNER_LIMIT: usize = 256;

/// Result of a single probe attempt that did not raise an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeOutcome {
    /// The port accepted the connection and became readable.
    Open,
    /// Nothing answered within the per-attempt timeout.
    TimedOut,
    /// The host actively refused the connection.
    Refused,
    /// No route to the host (yet).
    Unreachable,
    /// The local system refused to open the connection.
    PermissionDenied,
}

impl ProbeOutcome {
    /// Returns `true` for [`ProbeOutcome::Open`].
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    fn from_io_error(err: &io::Error) -> Option<Self> {
        match err.kind() {
            io::ErrorKind::TimedOut => Some(Self::TimedOut),
            io::ErrorKind::ConnectionRefused => Some(Self::Refused),
            io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                Some(Self::Unreachable)
            }
            io::ErrorKind::PermissionDenied => Some(Self::PermissionDenied),
            _ => None,
        }
    }
}

/// Errors that abort probing altogether.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Raised for connection failures that are not part of the retry model.
    #[error("failed to probe {target}: {source}")]
    Connect {
        /// Address being probed.
        target: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Raised when the caller's on-open action fails.
    #[error("probe action failed for {target}: {source}")]
    Action {
        /// Address being probed.
        target: SocketAddr,
        /// Error returned by the action.
        #[source]
        source: io::Error,
    },
}

/// Action invoked once while a probed connection is open. Receives the
/// first line the server sent, if any.
pub type OnOpen<'a> = Box<dyn FnOnce(Option<&str>) -> io::Result<()> + Send + 'a>;

/// Future returned by [`ReachabilityProbe::probe`].
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Result<ProbeOutcome, ProbeError>> + Send + 'a>>;

/// Seam over the prober so orchestration can be exercised without sockets.
pub trait ReachabilityProbe {
    /// Performs one attempt against `target`, invoking `on_open` exactly once
    /// when the connection succeeds.
    fn probe<'a>(&'a self, target: SocketAddr, on_open: OnOpen<'a>) -> ProbeFuture<'a>;
}

/// Probe backed by real TCP connections.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TcpProber {
    attempt_timeout: Duration,
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl TcpProber {
    /// Creates a prober bounding each attempt by `attempt_timeout`.
    #[must_use]
    pub const fn new(attempt_timeout: Duration) -> Self {
        Self { attempt_timeout }
    }

    async fn attempt(
        &self,
        target: SocketAddr,
        on_open: OnOpen<'_>,
    ) -> Result<ProbeOutcome, ProbeError> {
        let connected = timeout(self.attempt_timeout, async {
            let stream = TcpStream::connect(target).await?;
            stream.readable().await?;
            Ok::<_, io::Error>(stream)
        })
        .await;

        let stream = match connected {
            Err(_elapsed) => return Ok(ProbeOutcome::TimedOut),
            Ok(Err(err)) => {
                return ProbeOutcome::from_io_error(&err)
                    .ok_or(ProbeError::Connect { target, source: err });
            }
            Ok(Ok(stream)) => stream,
        };

        let banner = read_banner(&stream);
        debug!(%target, banner = banner.as_deref().unwrap_or(""), "sshd accepting connections");
        let action = on_open(banner.as_deref());
        drop(stream);
        action.map_err(|source| ProbeError::Action { target, source })?;
        Ok(ProbeOutcome::Open)
    }
}

impl ReachabilityProbe for TcpProber {
    fn probe<'a>(&'a self, target: SocketAddr, on_open: OnOpen<'a>) -> ProbeFuture<'a> {
        Box::pin(self.attempt(target, on_open))
    }
}

fn read_banner(stream: &TcpStream) -> Option<String> {
    let mut buffer = [0_u8; BANNER_LIMIT];
    let read = stream.try_read(&mut buffer).ok()?;
    let text = String::from_utf8_lossy(buffer.get(..read)?);
    let line = text.lines().next()?.trim();
    (!line.is_empty()).then(|| line.to_owned())
}
