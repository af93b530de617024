//! Line grammar for the reader protocol.
//!
//! ```text
//! buffer   := line ( "\n" line )*
//! line     := blank | comment | frame | noise
//! comment  := "#" text | ">" ws* "#" text
//! frame    := ">" body [ "|" trailer ]        body runs to the last "|"
//! request  := reader-frame command-frame*
//! command  := id ":" name [ ":" data ]
//! ```
//!
//! The first frame of a buffer names the reader; every later frame is a command.
//! Problems with individual lines never abort the parse: the line is dropped and a
//! [`ProtocolError`] is recorded in the [`ParseReport`].

use thiserror::Error;

use crate::protocol::request::{CommandEntry, ParseReport, ParsedRequest};

/// Frame start marker.
pub const FRAME_START: char = '>';
/// Frame terminator; the body ends at the last one on the line.
pub const FRAME_END: char = '|';
/// Separator between command fields.
pub const FIELD_SEPARATOR: char = ':';
/// Comment marker.
pub const COMMENT: char = '#';

/// Non-fatal problems found while parsing a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Buffer is not UTF-8; nothing was parsed.
    #[error("buffer is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// Frame has no `|` terminator.
    #[error("line {line}: frame has no '|' terminator")]
    MissingTerminator { line: usize },

    /// Command frame does not have 2 or 3 fields.
    #[error("line {line}: expected 2 or 3 ':'-separated fields, found {found}")]
    FieldCount { line: usize, found: usize },

    /// Command frame has an empty command name.
    #[error("line {line}: command name is empty")]
    EmptyName { line: usize },
}

/// Lexical class of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Comment,
    Noise(&'a str),
    Frame { body: &'a str, terminated: bool },
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    if line.starts_with(COMMENT) {
        return Line::Comment;
    }
    let Some(rest) = line.strip_prefix(FRAME_START) else {
        return Line::Noise(line);
    };
    let rest = rest.trim_start();
    if rest.starts_with(COMMENT) {
        return Line::Comment;
    }
    match rest.rfind(FRAME_END) {
        Some(end) => Line::Frame {
            body: rest[..end].trim(),
            terminated: true,
        },
        None => Line::Frame {
            body: rest,
            terminated: false,
        },
    }
}

fn parse_command(body: &str, line: usize) -> Result<CommandEntry, ProtocolError> {
    let fields: Vec<&str> = body.split(FIELD_SEPARATOR).collect();
    let (id, name, data) = match fields.as_slice() {
        [id, name] => (*id, *name, None),
        [id, name, data] => (*id, *name, Some(*data)),
        other => {
            return Err(ProtocolError::FieldCount {
                line,
                found: other.len(),
            })
        }
    };
    CommandEntry::new(id.trim(), name.trim(), data).ok_or(ProtocolError::EmptyName { line })
}

/// Parse one received buffer.
///
/// Pure and deterministic: the same bytes always produce the same report.
pub fn parse(buffer: &[u8]) -> ParseReport {
    let text = match std::str::from_utf8(buffer) {
        Ok(text) => text,
        Err(e) => {
            return ParseReport {
                request: ParsedRequest::default(),
                issues: vec![ProtocolError::Decode(e)],
            }
        }
    };

    let mut reader_name: Option<String> = None;
    let mut commands = Vec::new();
    let mut issues = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let (body, terminated) = match classify(raw) {
            Line::Frame { body, terminated } => (body, terminated),
            Line::Blank | Line::Comment | Line::Noise(_) => continue,
        };

        if reader_name.is_none() {
            if !terminated {
                issues.push(ProtocolError::MissingTerminator { line });
            }
            reader_name = Some(body.to_string());
            continue;
        }

        if !terminated {
            issues.push(ProtocolError::MissingTerminator { line });
            continue;
        }
        match parse_command(body, line) {
            Ok(entry) => commands.push(entry),
            Err(e) => issues.push(e),
        }
    }

    ParseReport {
        request: ParsedRequest::new(reader_name, commands),
        issues,
    }
}

/// Lines that were neither frames, comments nor blank; useful for debug logging.
pub fn noise_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().filter_map(|raw| match classify(raw) {
        Line::Noise(line) => Some(line),
        _ => None,
    })
}
