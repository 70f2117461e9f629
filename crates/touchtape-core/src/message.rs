//! Touch lifecycle messages and their text-line codec.
//!
//! The wire format is one newline-terminated ASCII line per message, with
//! space-separated decimal integer fields:
//!
//! ```text
//! reset <timestampMs>
//! stop  <timestampMs> <trackingId>
//! sync  <timestampMs> <trackingId> <x> <y>
//! ```
//!
//! `reset` re-anchors the replay timebase, `stop` ends one contact, and
//! `sync` reports one contact's screen-space position for a frame.

use std::str::SplitWhitespace;

use thiserror::Error;

/// One discrete touch lifecycle event.
///
/// Timestamps are milliseconds relative to the [`Clock`](crate::clock::Clock)
/// epoch; `tracking_id` identifies one continuous contact; `x`/`y` are
/// screen-space pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Re-anchor the replay timebase to this timestamp.
    Reset { timestamp: i64 },
    /// The contact identified by `tracking_id` lifted.
    Stop { timestamp: i64, tracking_id: i32 },
    /// One contact's position for one frame.
    Sync {
        timestamp: i64,
        tracking_id: i32,
        x: i32,
        y: i32,
    },
}

/// Why a protocol line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown message type '{0}'")]
    UnknownType(String),
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("malformed {field} field '{value}'")]
    BadField { field: &'static str, value: String },
}

impl Message {
    /// The message's timestamp, whichever variant it is.
    pub fn timestamp(&self) -> i64 {
        match *self {
            Message::Reset { timestamp }
            | Message::Stop { timestamp, .. }
            | Message::Sync { timestamp, .. } => timestamp,
        }
    }

    /// Serialize to one newline-terminated protocol line.
    pub fn encode(&self) -> String {
        match *self {
            Message::Reset { timestamp } => format!("reset {}\n", timestamp),
            Message::Stop {
                timestamp,
                tracking_id,
            } => format!("stop {} {}\n", timestamp, tracking_id),
            Message::Sync {
                timestamp,
                tracking_id,
                x,
                y,
            } => format!("sync {} {} {} {}\n", timestamp, tracking_id, x, y),
        }
    }

    /// Parse one protocol line (with or without its terminator).
    ///
    /// The leading token picks the variant; the fixed number of integer
    /// fields for that variant follows. Trailing extra tokens are ignored.
    pub fn decode(line: &str) -> Result<Message, ParseError> {
        let mut fields = line.split_whitespace();
        let kind = fields.next().ok_or(ParseError::Empty)?;

        match kind {
            "reset" => Ok(Message::Reset {
                timestamp: next_int(&mut fields, "timestamp")?,
            }),
            "stop" => Ok(Message::Stop {
                timestamp: next_int(&mut fields, "timestamp")?,
                tracking_id: next_int(&mut fields, "tracking id")?,
            }),
            "sync" => Ok(Message::Sync {
                timestamp: next_int(&mut fields, "timestamp")?,
                tracking_id: next_int(&mut fields, "tracking id")?,
                x: next_int(&mut fields, "x")?,
                y: next_int(&mut fields, "y")?,
            }),
            other => Err(ParseError::UnknownType(other.to_string())),
        }
    }
}

fn next_int<T: std::str::FromStr>(
    fields: &mut SplitWhitespace<'_>,
    field: &'static str,
) -> Result<T, ParseError> {
    let raw = fields.next().ok_or(ParseError::MissingField(field))?;
    raw.parse().map_err(|_| ParseError::BadField {
        field,
        value: raw.to_string(),
    })
}
