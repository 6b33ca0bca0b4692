//! Framed message exchanger: send, wait for `<|ACK|>`, resend otherwise.
//!
//! # Send-and-wait contract
//! - The message is encoded **once**; every resend writes byte-identical
//!   segments.
//! - Each segment is written with `write_all`, so a short write never leaves
//!   a partial frame behind.
//! - After each transmission exactly one read is performed.  The reply is
//!   positive only when it equals [`crate::frame::ACK`] byte for byte.
//! - A zero-byte read means the peer closed: the exchange fails with
//!   [`ExchangeError::PeerClosed`] instead of resending into a dead socket.
//! - A reply larger than the receive capacity fails with
//!   [`ExchangeError::ProtocolViolation`] instead of comparing a truncated
//!   prefix.
//! - Everything else (wrong bytes, reply timeout) is a negative
//!   acknowledgment and triggers a resend, subject to [`RetryPolicy`].
//!
//! The exchanger is generic over the stream so it can run on a
//! [`tokio::net::TcpStream`] or any in-memory `AsyncRead + AsyncWrite`.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::frame::{is_ack, EncodedFrame, FrameError};
use crate::message::Message;
use crate::retry::RetryPolicy;
use crate::state::ExchangeState;

/// Receive buffer size for one reply.
pub const DEFAULT_RECV_CAPACITY: usize = 1024;

/// Errors that end an exchange without an acknowledgment.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("encoding failed: {0}")]
    Frame(#[from] FrameError),
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Zero-byte read while waiting for a reply.
    #[error("peer closed the connection after {attempts} send(s)")]
    PeerClosed { attempts: u32 },
    /// Reply did not fit in the receive buffer.
    #[error("reply exceeds receive capacity of {capacity} bytes")]
    ProtocolViolation { capacity: usize },
    #[error("no acknowledgment after {attempts} send(s)")]
    MaxAttemptsExceeded { attempts: u32 },
}

/// Outcome of a successful exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeReport {
    /// Number of transmissions, including the acknowledged one.
    pub attempts: u32,
    /// Total bytes written across all transmissions.
    pub bytes_sent: u64,
}

/// Classification of one read.
#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Ack,
    Nack(Vec<u8>),
    Timeout,
    Closed,
}

/// Send counter step; an unbounded policy must not overflow.
fn next_attempt(attempts: u32) -> u32 {
    attempts.saturating_add(1)
}

/// Drives one exchange over an exclusively owned stream.
#[derive(Debug)]
pub struct Exchanger<S> {
    stream: S,
    policy: RetryPolicy,
    recv_capacity: usize,
    state: ExchangeState,
}

impl<S> Exchanger<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Exchanger with an unbounded retry policy and a 1024-byte receive
    /// buffer.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            policy: RetryPolicy::default(),
            recv_capacity: DEFAULT_RECV_CAPACITY,
            state: ExchangeState::Encode,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the receive buffer size.  Zero is raised to one byte.
    pub fn with_recv_capacity(mut self, capacity: usize) -> Self {
        self.recv_capacity = capacity.max(1);
        self
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Give the stream back to the caller.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Encode `message` and deliver it until acknowledged.
    pub async fn exchange(&mut self, message: &Message) -> Result<ExchangeReport, ExchangeError> {
        self.state = ExchangeState::Encode;
        let frame = message.encode()?;
        self.deliver(&frame, &message.describe()).await
    }

    /// Deliver a pre-encoded frame until acknowledged.
    ///
    /// `label` only appears in log lines.
    pub async fn deliver(
        &mut self,
        frame: &EncodedFrame,
        label: &str,
    ) -> Result<ExchangeReport, ExchangeError> {
        self.state = ExchangeState::SendAndWait;
        let mut attempts = 0u32;
        let mut bytes_sent = 0u64;

        loop {
            self.write_frame(frame).await?;
            attempts = next_attempt(attempts);
            bytes_sent += frame.wire_len() as u64;
            log::info!(
                "sent {label} ({} bytes, attempt {attempts})",
                frame.wire_len()
            );

            match self.await_reply().await? {
                Reply::Ack => {
                    self.state = ExchangeState::Done;
                    log::info!("received acknowledgment after {attempts} attempt(s)");
                    return Ok(ExchangeReport {
                        attempts,
                        bytes_sent,
                    });
                }
                Reply::Closed => {
                    log::warn!("peer closed the connection while awaiting acknowledgment");
                    return Err(ExchangeError::PeerClosed { attempts });
                }
                Reply::Nack(bytes) => {
                    log::debug!(
                        "negative reply {:?}, resending",
                        String::from_utf8_lossy(&bytes)
                    );
                }
                Reply::Timeout => {
                    log::warn!("no reply within {:?}, resending", self.policy.reply_timeout);
                }
            }

            if !self.policy.allows_another(attempts) {
                return Err(ExchangeError::MaxAttemptsExceeded { attempts });
            }
            // Every reply so far was negative, so `attempts` is also the
            // consecutive-failure count.
            let delay = self.policy.delay_after(attempts);
            if !delay.is_zero() {
                log::debug!("backing off {delay:?} before attempt {}", attempts + 1);
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn write_frame(&mut self, frame: &EncodedFrame) -> Result<(), ExchangeError> {
        for segment in frame.segments() {
            self.stream.write_all(segment).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }

    /// Perform one read and classify it.
    async fn await_reply(&mut self) -> Result<Reply, ExchangeError> {
        // One spare byte distinguishes "exactly full" from "over capacity".
        let mut buf = vec![0u8; self.recv_capacity + 1];
        let read = self.stream.read(&mut buf);
        let n = match self.policy.reply_timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(result) => result?,
                Err(_) => return Ok(Reply::Timeout),
            },
            None => read.await?,
        };

        if n == 0 {
            return Ok(Reply::Closed);
        }
        if n > self.recv_capacity {
            log::warn!("reply of at least {n} bytes exceeds capacity {}", self.recv_capacity);
            return Err(ExchangeError::ProtocolViolation {
                capacity: self.recv_capacity,
            });
        }
        buf.truncate(n);
        if is_ack(&buf) {
            Ok(Reply::Ack)
        } else {
            Ok(Reply::Nack(buf))
        }
    }
}
