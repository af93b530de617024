//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, session limits)
//!     → connection.rs (session id, live-session tracking)
//!     → session.rs (read → parse → dispatch → reply loop)
//! ```
//!
//! # Design Decisions
//! - Bounded session count prevents resource exhaustion
//! - One task per session; a failing session never touches the listener

pub mod connection;
pub mod listener;
pub mod session;

pub use connection::{SessionGuard, SessionId, SessionTracker};
pub use listener::{Listener, ListenerError, SessionPermit};
pub use session::{ClientSession, SessionError, SessionState};
