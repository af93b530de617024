//! Proxy server: accept loop and session spawning.
//!
//! # Responsibilities
//! - Build the shared dispatcher (and its gateway client) from configuration
//! - Bind the listener; failure here is fatal for the caller
//! - Accept connections and run one session task per connection
//! - Contain session failures, including panics, to their own task

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::dispatch::Dispatcher;
use crate::gateway::GatewayError;
use crate::net::{ClientSession, Listener, ListenerError, SessionError, SessionPermit, SessionTracker};

/// Pause after a failed accept (e.g. file descriptor exhaustion).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Startup errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("gateway client: {0}")]
    Gateway(#[from] GatewayError),
    #[error("listener: {0}")]
    Listener(#[from] ListenerError),
}

/// Line-protocol proxy server.
pub struct ProxyServer {
    config: Arc<ProxyConfig>,
    dispatcher: Arc<Dispatcher>,
    tracker: SessionTracker,
}

impl ProxyServer {
    /// Create a server. The configuration is frozen from here on.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let config = Arc::new(config);
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&config))?);
        Ok(Self {
            config,
            dispatcher,
            tracker: SessionTracker::new(),
        })
    }

    /// Bind the configured listener.
    pub async fn bind(&self) -> Result<Listener, ServerError> {
        Ok(Listener::bind(&self.config.listener).await?)
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(
                address = %addr,
                simulate_card = self.config.card.simulate,
                gateway = %self.config.gateway.url,
                "Proxy accepting connections"
            );
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_session(stream, peer, permit),
                    Err(ListenerError::Closed) => break,
                    Err(e) => {
                        tracing::error!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!(active_sessions = self.tracker.active_count(), "Stopping accept loop");
                    break;
                }
            }
        }
    }

    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr, permit: SessionPermit) {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer_addr = %peer, error = %e, "Could not set TCP_NODELAY");
        }

        let guard = self.tracker.track();
        let id = guard.id();
        tracing::info!(
            peer_addr = %peer,
            session_id = %id,
            active_sessions = self.tracker.active_count(),
            "Connected"
        );

        let session = ClientSession::new(
            stream,
            Arc::clone(&self.dispatcher),
            self.config.listener.read_buffer_bytes,
        );
        let span = tracing::info_span!("session", session_id = %id, peer_addr = %peer);

        tokio::spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                match AssertUnwindSafe(session.run()).catch_unwind().await {
                    Ok(Ok(())) => tracing::info!("Session closed"),
                    Ok(Err(SessionError::Read(e))) => {
                        tracing::info!(error = %e, "Connection lost")
                    }
                    Ok(Err(e)) => tracing::warn!(error = %e, "Session ended with error"),
                    Err(_) => tracing::error!("Session panicked, connection dropped"),
                }
            }
            .instrument(span),
        );
    }
}
