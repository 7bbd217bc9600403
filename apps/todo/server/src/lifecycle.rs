use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum_helpers::Readiness;
use eyre::WrapErr;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Process state. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Starting,
    Running,
    Draining,
    Stopped,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives both listeners through `Starting → Running → Draining → Stopped`.
///
/// This handles:
/// - Signal reception (SIGTERM, SIGINT): the first one starts draining, a
///   second one forces the stop
/// - Broadcasting state changes to the listeners and the `/health` route
/// - The root cancellation token every call context derives from
///
/// Clones share the same state.
#[derive(Clone)]
pub struct LifecycleCoordinator {
    state: Arc<watch::Sender<LifecycleState>>,
    root: CancellationToken,
}

impl LifecycleCoordinator {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            state: Arc::new(state),
            root: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Parent token for every call context. Cancelled only by [`Self::force_stop`].
    pub fn root_token(&self) -> CancellationToken {
        self.root.clone()
    }

    /// Both listeners are bound and serving.
    pub fn mark_running(&self) -> bool {
        self.advance(LifecycleState::Running)
    }

    /// Stop accepting new calls and let in-flight ones finish.
    pub fn begin_drain(&self) -> bool {
        self.advance(LifecycleState::Draining)
    }

    /// Every listener has stopped on its own.
    pub fn finish(&self) -> bool {
        self.advance(LifecycleState::Stopped)
    }

    /// Jump to `Stopped` and cancel every outstanding call.
    pub fn force_stop(&self) {
        if self.advance(LifecycleState::Stopped) {
            warn!("Forcing stop, cancelling in-flight calls");
        }
        self.root.cancel();
    }

    fn advance(&self, next: LifecycleState) -> bool {
        let moved = self.state.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if moved {
            info!(state = %next, "Lifecycle state changed");
        }
        moved
    }

    /// Resolves once the state reaches `Running` or later.
    pub fn running(&self) -> impl Future<Output = ()> + Send + use<> {
        self.reached(LifecycleState::Running)
    }

    /// Resolves once the state reaches `Draining` or later. Used as the
    /// graceful-shutdown trigger of both listeners.
    pub fn draining(&self) -> impl Future<Output = ()> + Send + use<> {
        self.reached(LifecycleState::Draining)
    }

    /// Resolves once the state is `Stopped`.
    pub fn stopped(&self) -> impl Future<Output = ()> + Send + use<> {
        self.reached(LifecycleState::Stopped)
    }

    fn reached(&self, target: LifecycleState) -> impl Future<Output = ()> + Send + use<> {
        let mut rx = self.state.subscribe();
        async move {
            // The sender lives as long as any coordinator clone; an error
            // means none is left to wait for.
            let _ = rx.wait_for(|state| *state >= target).await;
        }
    }

    /// Wait for interrupts: the first one starts draining, the second one
    /// forces the stop. Returns early if the process stops on its own.
    pub async fn watch_signals(self) {
        tokio::select! {
            received = shutdown_signal() => {
                match received {
                    Ok(name) => info!(signal = name, "Received signal, draining"),
                    Err(e) => {
                        error!(error = %e, "Failed to install signal handlers");
                        return;
                    }
                }
            }
            _ = self.stopped() => return,
        }
        self.begin_drain();

        tokio::select! {
            received = shutdown_signal() => {
                if let Ok(name) = received {
                    warn!(signal = name, "Received second signal during drain");
                    self.force_stop();
                }
            }
            _ = self.stopped() => {}
        }
    }
}

impl Default for LifecycleCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness for LifecycleCoordinator {
    fn state(&self) -> String {
        LifecycleCoordinator::state(self).to_string()
    }

    fn is_accepting(&self) -> bool {
        LifecycleCoordinator::state(self) == LifecycleState::Running
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM and return its name.
async fn shutdown_signal() -> io::Result<&'static str> {
    #[cfg(unix)]
    let terminate = {
        let mut stream = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        async move {
            stream.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate => Ok("SIGTERM"),
    }
}

/// Both listening sockets, bound before the process reports `Running`.
pub struct Listeners {
    pub rpc: TcpListener,
    pub http: TcpListener,
}

impl Listeners {
    /// Bind the RPC port, then the gateway port.
    ///
    /// If the second bind fails the first socket is closed before the error
    /// is returned.
    pub async fn bind(rpc_addr: &str, http_addr: &str) -> eyre::Result<Self> {
        let rpc = TcpListener::bind(rpc_addr)
            .await
            .wrap_err_with(|| format!("failed to bind RPC listener on {rpc_addr}"))?;

        let http = match TcpListener::bind(http_addr).await {
            Ok(http) => http,
            Err(e) => {
                drop(rpc);
                return Err(e).wrap_err_with(|| format!("failed to bind gateway listener on {http_addr}"));
            }
        };

        Ok(Self { rpc, http })
    }

    pub fn rpc_addr(&self) -> io::Result<SocketAddr> {
        self.rpc.local_addr()
    }

    pub fn http_addr(&self) -> io::Result<SocketAddr> {
        self.http.local_addr()
    }
}
