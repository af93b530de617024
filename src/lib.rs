//! Smart-card reader protocol proxy library.
//!
//! Accepts reader commands over a line-delimited TCP protocol, forwards each
//! one to a REST reader gateway and writes back `>{id}:{data|FAIL}@@` lines.

pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod server;

pub use config::ProxyConfig;
pub use lifecycle::Shutdown;
pub use server::{ProxyServer, ServerError};
