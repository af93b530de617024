//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Resolve and bind the configured host/port with address reuse
//! - Listen with the configured backlog
//! - Enforce max_sessions limit via semaphore
//! - Surface accept errors to the accept loop without closing the listener

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Bind host did not resolve to an address.
    #[error("Failed to resolve {address}: {source}")]
    Resolve { address: String, source: io::Error },
    /// Failed to create or bind the socket.
    #[error("Failed to bind: {0}")]
    Bind(io::Error),
    /// Failed to start listening.
    #[error("Failed to listen: {0}")]
    Listen(io::Error),
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(io::Error),
    /// The session limiter was closed.
    #[error("Session limiter closed")]
    Closed,
    /// `max_sessions` exceeds what the limiter can hold.
    #[error("max_sessions {0} exceeds the session limiter capacity")]
    SessionLimit(usize),
}

/// A bounded TCP listener that limits concurrent sessions.
///
/// Uses a semaphore to enforce `max_sessions`. When the limit is reached,
/// new connections wait in the kernel backlog until a slot becomes available.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    session_limit: Arc<Semaphore>,
    max_sessions: usize,
}

impl Listener {
    /// Bind to the configured address with session limits.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        if config.max_sessions > Semaphore::MAX_PERMITS {
            return Err(ListenerError::SessionLimit(config.max_sessions));
        }

        let address = config.bind_address();
        let addr = resolve(&address).await?;

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(ListenerError::Bind)?;

        socket.set_reuseaddr(true).map_err(ListenerError::Bind)?;
        socket.bind(addr).map_err(ListenerError::Bind)?;
        let listener = socket.listen(config.backlog).map_err(ListenerError::Listen)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            max_sessions = config.max_sessions,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            session_limit: Arc::new(Semaphore::new(config.max_sessions)),
            max_sessions: config.max_sessions,
        })
    }

    /// Accept a new connection, respecting the session limit.
    ///
    /// This will wait if the session limit has been reached.
    /// Returns the stream and a permit that must be held for the session's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, SessionPermit), ListenerError> {
        // Acquire permit first (backpressure)
        let permit = self
            .session_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.session_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, SessionPermit { _permit: permit }))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, io::Error> {
        self.inner.local_addr()
    }

    /// Get current available session slots.
    pub fn available_permits(&self) -> usize {
        self.session_limit.available_permits()
    }

    /// Get configured maximum sessions.
    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

async fn resolve(address: &str) -> Result<SocketAddr, ListenerError> {
    let resolve_error = |source: io::Error| ListenerError::Resolve {
        address: address.to_string(),
        source,
    };
    tokio::net::lookup_host(address)
        .await
        .map_err(resolve_error)?
        .next()
        .ok_or_else(|| resolve_error(io::Error::new(io::ErrorKind::NotFound, "no addresses")))
}

/// A permit representing a session slot.
///
/// When dropped, the slot is released back to the pool.
/// This keeps backpressure intact even if the session panics.
#[derive(Debug)]
pub struct SessionPermit {
    _permit: OwnedSemaphorePermit,
}
