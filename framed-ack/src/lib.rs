//! `framed-ack` — delimiter-framed message delivery with exact-token
//! acknowledgment over a TCP stream.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐  encode once   ┌──────────────┐
//!  │ Message  │───────────────▶│ EncodedFrame │  payload ++ <|EOM|>
//!  └──────────┘                └──────┬───────┘
//!                                     │ write_all (1 or 2 segments)
//!  ┌──────────────────────────────────▼───┐
//!  │              Exchanger               │
//!  │  send ─▶ read reply ─▶ == <|ACK|> ?  │
//!  │    ▲                        │ no     │
//!  │    └──── RetryPolicy ◀──────┘        │
//!  └──────────────────┬───────────────────┘
//!                     │ bytes
//!  ┌──────────────────▼───┐
//!  │  Endpoint (TcpStream)│  resolved + connected by `connection`
//!  └──────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`frame`]      — delimiter/ack tokens, frame encoding and decoding
//! - [`message`]    — text and structured-record payloads
//! - [`connection`] — name resolution, connect, shutdown-then-close
//! - [`exchanger`]  — the send-and-wait acknowledgment loop
//! - [`retry`]      — attempt cap, reply timeout, back-off
//! - [`state`]      — exchange finite-state-machine types
//! - [`input`]      — operator line input and confirmation
//! - [`config`]     — command-line / environment configuration

pub mod config;
pub mod connection;
pub mod exchanger;
pub mod frame;
pub mod input;
pub mod message;
pub mod retry;
pub mod state;

pub use connection::{connect, ConnError, Endpoint};
pub use exchanger::{ExchangeError, ExchangeReport, Exchanger};
pub use frame::{EncodedFrame, FrameDecoder, FrameError, ACK, DELIMITER};
pub use message::{Message, Record};
pub use retry::RetryPolicy;
pub use state::ExchangeState;
