//! Wire-format definitions for delimiter-framed messages.
//!
//! Every message written to the stream is a *frame*: the encoded payload
//! followed by the end-of-message sentinel.  This module is responsible for:
//! - Defining the sentinel and acknowledgment tokens.
//! - Holding an encoded frame as an ordered list of write segments.
//! - Splitting an inbound byte stream back into frames ([`FrameDecoder`]).
//!
//! Pure data transformation; no I/O.
//!
//! # Wire format
//!
//! ```text
//!  text mode:    [ payload (UTF-8) | <|EOM|> ]            one write
//!  record mode:  [ payload (JSON) ] [ <|EOM|> ]           two writes
//!  reply:        [ <|ACK|> ]                              exact bytes
//! ```
//!
//! There is no escaping.  A payload containing [`DELIMITER`] is rejected at
//! encode time with [`FrameError::DelimiterInPayload`].

/// End-of-message sentinel appended after every payload.
pub const DELIMITER: &[u8] = b"<|EOM|>";

/// Positive acknowledgment token.  Only a reply byte-for-byte equal to this
/// ends the send-and-wait loop.
pub const ACK: &[u8] = b"<|ACK|>";

/// Errors that can arise while building a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The encoded payload contains the delimiter and would split into two
    /// frames on the receiving side.
    #[error("payload contains the frame delimiter at byte {offset}")]
    DelimiterInPayload { offset: usize },
    /// A structured record could not be serialised.
    #[error("record serialisation failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A fully encoded frame, ready for transmission.
///
/// `segments` are written to the stream in order, each with its own
/// `write_all`.  Retries resend the same segments unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    segments: Vec<Vec<u8>>,
}

impl EncodedFrame {
    /// Frame `payload` as a single write: `payload ++ DELIMITER`.
    pub fn single(payload: &[u8]) -> Result<Self, FrameError> {
        check_payload(payload)?;
        let mut buf = Vec::with_capacity(payload.len() + DELIMITER.len());
        buf.extend_from_slice(payload);
        buf.extend_from_slice(DELIMITER);
        Ok(Self {
            segments: vec![buf],
        })
    }

    /// Frame `payload` as two writes: the payload, then the delimiter.
    pub fn split(payload: Vec<u8>) -> Result<Self, FrameError> {
        check_payload(&payload)?;
        Ok(Self {
            segments: vec![payload, DELIMITER.to_vec()],
        })
    }

    /// The write segments in transmission order.
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    /// Total bytes on the wire for one transmission of this frame.
    pub fn wire_len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// The frame as one contiguous buffer (what the peer observes).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.segments.concat()
    }
}

fn check_payload(payload: &[u8]) -> Result<(), FrameError> {
    match find(payload, DELIMITER) {
        Some(offset) => Err(FrameError::DelimiterInPayload { offset }),
        None => Ok(()),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// `true` only when `reply` is exactly the acknowledgment token.
pub fn is_ack(reply: &[u8]) -> bool {
    reply == ACK
}

// ---------------------------------------------------------------------------
// FrameDecoder
// ---------------------------------------------------------------------------

/// Receiving-side reassembly: accumulates stream bytes and yields complete
/// frames (delimiter stripped).
///
/// Bytes after the last delimiter stay buffered until more input arrives.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the stream.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let end = find(&self.buf, DELIMITER)?;
        let frame = self.buf[..end].to_vec();
        self.buf.drain(..end + DELIMITER.len());
        Some(frame)
    }

    /// Number of bytes buffered but not yet part of a complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_appends_delimiter() {
        let frame = EncodedFrame::single(b"hello").unwrap();
        assert_eq!(frame.segments().len(), 1);
        assert_eq!(frame.to_bytes(), b"hello<|EOM|>");
    }

    #[test]
    fn split_writes_delimiter_separately() {
        let frame = EncodedFrame::split(br#"{"data":"x"}"#.to_vec()).unwrap();
        assert_eq!(frame.segments().len(), 2);
        assert_eq!(frame.segments()[0], br#"{"data":"x"}"#);
        assert_eq!(frame.segments()[1], DELIMITER);
    }

    #[test]
    fn both_modes_produce_the_same_stream() {
        let one = EncodedFrame::single(b"abc").unwrap();
        let two = EncodedFrame::split(b"abc".to_vec()).unwrap();
        assert_eq!(one.to_bytes(), two.to_bytes());
        assert_eq!(one.wire_len(), two.wire_len());
    }

    #[test]
    fn empty_payload_is_just_the_delimiter() {
        let frame = EncodedFrame::single(b"").unwrap();
        assert_eq!(frame.to_bytes(), DELIMITER);
    }

    #[test]
    fn delimiter_inside_payload_is_rejected() {
        let err = EncodedFrame::single(b"ab<|EOM|>cd").unwrap_err();
        assert!(matches!(err, FrameError::DelimiterInPayload { offset: 2 }));
        assert!(EncodedFrame::split(b"<|EOM|>".to_vec()).is_err());
    }

    #[test]
    fn partial_delimiter_is_allowed() {
        assert!(EncodedFrame::single(b"<|EOM|").is_ok());
        assert!(EncodedFrame::single(b"|EOM|>").is_ok());
    }

    #[test]
    fn ack_must_match_exactly() {
        assert!(is_ack(b"<|ACK|>"));
        assert!(!is_ack(b"<|ACK|>!"));
        assert!(!is_ack(b"<|ACK|> "));
        assert!(!is_ack(b"<|ack|>"));
        assert!(!is_ack(b"<|ACK|"));
        assert!(!is_ack(b""));
    }

    #[test]
    fn decoder_recovers_text_message() {
        for msg in ["hello", "", "with spaces and ünïcödé", "<|EOM|", "a<b|c>"] {
            let mut dec = FrameDecoder::new();
            dec.push(&EncodedFrame::single(msg.as_bytes()).unwrap().to_bytes());
            assert_eq!(dec.next_frame().unwrap(), msg.as_bytes());
            assert_eq!(dec.next_frame(), None);
            assert_eq!(dec.pending(), 0);
        }
    }

    #[test]
    fn decoder_handles_byte_at_a_time_input() {
        let bytes = EncodedFrame::single(b"drip").unwrap().to_bytes();
        let mut dec = FrameDecoder::new();
        for (i, b) in bytes.iter().enumerate() {
            dec.push(std::slice::from_ref(b));
            if i + 1 < bytes.len() {
                assert_eq!(dec.next_frame(), None);
            }
        }
        assert_eq!(dec.next_frame().unwrap(), b"drip");
    }

    #[test]
    fn decoder_splits_back_to_back_frames() {
        let mut dec = FrameDecoder::new();
        dec.push(b"one<|EOM|>two<|EOM|>thr");
        assert_eq!(dec.next_frame().unwrap(), b"one");
        assert_eq!(dec.next_frame().unwrap(), b"two");
        assert_eq!(dec.next_frame(), None);
        assert_eq!(dec.pending(), 3);
        dec.push(b"ee<|EOM|>");
        assert_eq!(dec.next_frame().unwrap(), b"three");
    }
}
