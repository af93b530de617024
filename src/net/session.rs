//! Per-connection session loop.
//!
//! ```text
//! Reading → Parsing → Dispatching → Replying → Reading …
//!    │         │            │            │
//!    └─────────┴────────────┴────────────┴──→ Closed
//! ```
//!
//! - Reading: a zero-length read means the peer closed cleanly.
//! - Parsing: a buffer without commands goes straight back to Reading.
//! - Dispatching/Replying: one command at a time, each reply written as soon
//!   as it is known.

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::dispatch::Dispatcher;
use crate::observability::metrics;
use crate::protocol::{parser, ProtocolError};

/// Session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Reading,
    Parsing,
    Dispatching,
    Replying,
    Closed,
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("read failed: {0}")]
    Read(io::Error),
    #[error("write failed: {0}")]
    Write(io::Error),
}

/// One accepted connection and the state needed to serve it.
///
/// Session id and peer address live on the enclosing tracing span.
pub struct ClientSession<S> {
    stream: S,
    dispatcher: Arc<Dispatcher>,
    read_buffer_bytes: usize,
    state: SessionState,
}

impl<S> ClientSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, dispatcher: Arc<Dispatcher>, read_buffer_bytes: usize) -> Self {
        Self {
            stream,
            dispatcher,
            read_buffer_bytes,
            state: SessionState::Reading,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn enter(&mut self, state: SessionState) {
        tracing::trace!(from = ?self.state, to = ?state, "Session state change");
        self.state = state;
    }

    /// Serve the connection until the peer closes it or an I/O error occurs.
    ///
    /// A clean close by the peer returns `Ok(())`.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let mut buffer = vec![0u8; self.read_buffer_bytes];

        let result = loop {
            self.enter(SessionState::Reading);
            let n = match self.stream.read(&mut buffer).await {
                Ok(0) => {
                    tracing::debug!("Peer closed connection");
                    break Ok(());
                }
                Ok(n) => n,
                Err(e) => break Err(SessionError::Read(e)),
            };

            if let Err(e) = self.handle_buffer(&buffer[..n]).await {
                break Err(e);
            }
        };

        self.enter(SessionState::Closed);
        result
    }

    async fn handle_buffer(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.enter(SessionState::Parsing);
        tracing::debug!(bytes = data.len(), input = %String::from_utf8_lossy(data).trim_end(), ">>");

        let report = parser::parse(data);
        log_issues(&report.issues);

        let (reader, commands) = report.request.into_parts();
        if commands.is_empty() {
            if let Ok(text) = std::str::from_utf8(data) {
                for line in parser::noise_lines(text) {
                    tracing::debug!(line = %line, "Ignoring non-frame line");
                }
            }
            tracing::debug!("No commands in buffer, waiting for more input");
            return Ok(());
        }

        let reader = reader.unwrap_or_default();
        for entry in &commands {
            self.enter(SessionState::Dispatching);
            let reply = self.dispatcher.dispatch(&reader, entry).await;

            self.enter(SessionState::Replying);
            tracing::info!(reply = %reply, "Sending reply");
            self.stream
                .write_all(reply.to_wire().as_bytes())
                .await
                .map_err(SessionError::Write)?;
        }
        self.stream.flush().await.map_err(SessionError::Write)
    }
}

fn log_issues(issues: &[ProtocolError]) {
    if issues.is_empty() {
        return;
    }
    for issue in issues {
        match issue {
            ProtocolError::Decode(_) => tracing::error!(error = %issue, "Cannot decode input"),
            _ => tracing::warn!(error = %issue, "Skipping malformed line"),
        }
    }
    metrics::record_malformed_lines(issues.len());
}
