//! Outgoing message payloads.
//!
//! A [`Message`] is either plain text or a structured [`Record`].  Encoding
//! happens exactly once per exchange via [`Message::encode`]; the resulting
//! [`EncodedFrame`] is what the exchanger resends on every retry.

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::frame::{EncodedFrame, FrameError};

/// A structured record.  All fields are optional; absent fields are left
/// out of the serialised form.
///
/// Serialised as compact JSON with the fixed key order `data`, `sender`,
/// `time`, and `time` in RFC 3339.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub time: Option<OffsetDateTime>,
}

impl Record {
    /// Build a record stamped with the current time at `offset`.
    ///
    /// Read the offset once at startup with [`local_offset`]; on Unix the
    /// lookup is refused once the process has more than one thread.
    pub fn stamped(data: Option<String>, sender: Option<String>, offset: UtcOffset) -> Self {
        Self {
            data,
            sender,
            time: Some(OffsetDateTime::now_utc().to_offset(offset)),
        }
    }

    /// Serialise into the compact form sent on the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FrameError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// The local UTC offset, or UTC when it cannot be determined.
///
/// Call before starting any threads (in particular before the tokio runtime).
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or_else(|e| {
        log::warn!("local UTC offset unavailable ({e}); stamping records in UTC");
        UtcOffset::UTC
    })
}

/// An application message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Record(Record),
}

impl Message {
    /// Encode into a frame.
    ///
    /// Text is sent as one write of `utf8 ++ <|EOM|>`; a record is sent as
    /// its serialised bytes followed by `<|EOM|>` in a second write.
    pub fn encode(&self) -> Result<EncodedFrame, FrameError> {
        match self {
            Message::Text(text) => EncodedFrame::single(text.as_bytes()),
            Message::Record(record) => EncodedFrame::split(record.to_bytes()?),
        }
    }

    /// Short human-readable description for log lines.
    pub fn describe(&self) -> String {
        match self {
            Message::Text(text) => format!("\"{text}\""),
            Message::Record(record) => format!(
                "record(data={:?}, sender={:?})",
                record.data.as_deref().unwrap_or(""),
                record.sender.as_deref().unwrap_or("")
            ),
        }
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_owned())
    }
}

impl From<Record> for Message {
    fn from(record: Record) -> Self {
        Message::Record(record)
    }
}
