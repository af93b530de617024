//! Reader line protocol.
//!
//! # Data Flow
//! ```text
//! bytes from one socket read
//!     → parser.rs (tokenize lines, reader frame + command frames)
//!     → ParsedRequest { reader_name, commands } + non-fatal issues
//!     → (dispatcher)
//!     → reply.rs (">id:payload@@\n")
//! ```
//!
//! # Wire format
//! ```text
//! >#comment text
//! ><readerName>|
//! ><commandID>:<commandName>:<hexDataOptional>|
//! ```

pub mod parser;
pub mod reply;
pub mod request;

pub use parser::{parse, ProtocolError};
pub use reply::{Reply, ReplyPayload, RESPONSE_END, RESPONSE_FAIL};
pub use request::{CommandEntry, ParseReport, ParsedRequest};
