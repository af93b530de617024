//! Reader gateway subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher (query parameters for one command)
//!     → client.rs (GET base_url?params, auth header, timeout)
//!     → response body
//!     → first line that is not empty and not "null"
//!     → Option<String> back to the dispatcher
//! ```

pub mod client;

pub use client::{first_meaningful_line, GatewayClient, GatewayError};
