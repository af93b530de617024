//! Structured values produced by the line parser.

use crate::protocol::ProtocolError;

/// One command frame: `><id>:<name>[:<data>]|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    id: String,
    name: String,
    data: Option<String>,
}

impl CommandEntry {
    /// Build an entry. Returns `None` when `name` is empty.
    ///
    /// Whitespace inside `data` is removed.
    pub fn new(id: impl Into<String>, name: impl Into<String>, data: Option<&str>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            name,
            data: data.map(|d| d.chars().filter(|c| !c.is_whitespace()).collect()),
        })
    }

    /// Caller-supplied correlation token, echoed in the reply.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Command keyword in its original case.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hex payload with whitespace removed, if the frame had a third field.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// Everything recognised in one received buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRequest {
    reader_name: Option<String>,
    commands: Vec<CommandEntry>,
}

impl ParsedRequest {
    pub(crate) fn new(reader_name: Option<String>, commands: Vec<CommandEntry>) -> Self {
        Self {
            reader_name,
            commands,
        }
    }

    /// Reader named by the first frame of the buffer.
    pub fn reader_name(&self) -> Option<&str> {
        self.reader_name.as_deref()
    }

    /// Command frames in the order they appeared.
    pub fn commands(&self) -> &[CommandEntry] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Split into reader name and owned commands.
    pub fn into_parts(self) -> (Option<String>, Vec<CommandEntry>) {
        (self.reader_name, self.commands)
    }
}

/// Parse result plus the non-fatal problems met along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub request: ParsedRequest,
    pub issues: Vec<ProtocolError>,
}
