//! Exchange finite-state machine (FSM) types.
//!
//! Transitions are driven by [`crate::exchanger::Exchanger`]; this module
//! only names the states.
//!
//! ```text
//!  ENCODE ──once──▶ SEND_AND_WAIT ──<|ACK|>──▶ DONE
//!                     │        ▲
//!                     └─ nack ─┘
//! ```

/// All possible states of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    /// Message not yet encoded; initial state.
    #[default]
    Encode,
    /// Frame written at least once; waiting for the acknowledgment.
    SendAndWait,
    /// Acknowledgment observed.  No further sends occur.
    Done,
}

impl std::fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Encode => "ENCODE",
            Self::SendAndWait => "SEND-AND-WAIT",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_encode() {
        assert_eq!(ExchangeState::default(), ExchangeState::Encode);
    }

    #[test]
    fn display_names() {
        assert_eq!(ExchangeState::SendAndWait.to_string(), "SEND-AND-WAIT");
        assert_eq!(ExchangeState::Done.to_string(), "DONE");
    }
}
