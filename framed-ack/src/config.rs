//! Command-line / environment configuration.

use std::time::Duration;

use time::UtcOffset;

use clap::Parser;

use crate::exchanger::DEFAULT_RECV_CAPACITY;
use crate::message::{Message, Record};
use crate::retry::{RetryPolicy, DEFAULT_MAX_BACKOFF};

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Send one line from stdin as a delimiter-framed message and wait for
/// `<|ACK|>`.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Config {
    /// Host name or address of the peer.
    #[arg(long, env = "FRAMED_ACK_HOST", default_value = "localhost")]
    pub host: String,

    /// TCP port of the peer.
    #[arg(short, long, env = "FRAMED_ACK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Send the line as a structured record instead of plain text.
    #[arg(long, env = "FRAMED_ACK_RECORD")]
    pub record: bool,

    /// `sender` field of a structured record.
    #[arg(long, env = "FRAMED_ACK_SENDER", requires = "record")]
    pub sender: Option<String>,

    /// Give up after this many unacknowledged sends (default: never).
    #[arg(long, env = "FRAMED_ACK_MAX_ATTEMPTS", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Treat a reply not received within this many milliseconds as negative.
    #[arg(long, env = "FRAMED_ACK_REPLY_TIMEOUT_MS")]
    pub reply_timeout_ms: Option<u64>,

    /// Initial delay before a resend, doubled per consecutive failure.
    #[arg(long, env = "FRAMED_ACK_BACKOFF_MS", default_value_t = 0)]
    pub backoff_ms: u64,

    /// Upper bound on the resend delay.
    #[arg(long, env = "FRAMED_ACK_MAX_BACKOFF_MS", default_value_t = DEFAULT_MAX_BACKOFF.as_millis() as u64)]
    pub max_backoff_ms: u64,

    /// Receive buffer size; longer replies are rejected.
    #[arg(long, env = "FRAMED_ACK_RECV_CAPACITY", default_value_t = DEFAULT_RECV_CAPACITY)]
    pub recv_capacity: usize,
}

impl Config {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            reply_timeout: self.reply_timeout_ms.map(Duration::from_millis),
            backoff: Duration::from_millis(self.backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    /// Wrap an operator line as the configured message kind.
    ///
    /// Records are stamped at `offset` (see [`crate::message::local_offset`]).
    pub fn message_for(&self, line: String, offset: UtcOffset) -> Message {
        if self.record {
            Message::Record(Record::stamped(Some(line), self.sender.clone(), offset))
        } else {
            Message::Text(line)
        }
    }
}
