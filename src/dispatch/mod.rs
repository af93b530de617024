//! Command dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! (reader name, CommandEntry)
//!     → command.rs (keyword → CommandKind, case-insensitive)
//!     → dispatcher.rs
//!         simulated card → fixed answer
//!         APDU / RESET   → gateway call (local reader override applied)
//!         ENUM / other   → no call
//!     → Reply (">id:data@@" or ">id:FAIL@@")
//! ```

pub mod command;
pub mod dispatcher;

pub use command::CommandKind;
pub use dispatcher::{Dispatcher, SIMULATED_APDU_RESPONSE, SIMULATED_RESET_RESPONSE};
