//! Reply line formatting: `>{id}:{payload}@@\n`.

use std::fmt;

/// Payload sent when a command could not be resolved.
pub const RESPONSE_FAIL: &str = "FAIL";
/// Marker closing every reply payload.
pub const RESPONSE_END: &str = "@@";

/// What a command resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPayload {
    /// Response data, usually hex.
    Data(String),
    /// The `FAIL` sentinel.
    Fail,
}

impl fmt::Display for ReplyPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyPayload::Data(data) => f.write_str(data),
            ReplyPayload::Fail => f.write_str(RESPONSE_FAIL),
        }
    }
}

/// A reply to one command, correlated by the command's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    id: String,
    payload: ReplyPayload,
}

impl Reply {
    /// Build a reply from an optional response; missing or empty text becomes `FAIL`.
    pub fn from_response(id: impl Into<String>, response: Option<String>) -> Self {
        let payload = match response {
            Some(text) if !text.is_empty() => ReplyPayload::Data(text),
            _ => ReplyPayload::Fail,
        };
        Self {
            id: id.into(),
            payload,
        }
    }

    pub fn fail(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: ReplyPayload::Fail,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_fail(&self) -> bool {
        self.payload == ReplyPayload::Fail
    }

    /// Newline-terminated line as written to the socket.
    pub fn to_wire(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">{}:{}{}", self.id, self.payload, RESPONSE_END)
    }
}
