//! Operator input: one outgoing line, then a confirmation keypress.
//!
//! [`read_message`] never returns an absent message.  On end-of-input it
//! tells the operator and reads again, in a loop rather than recursion.
//!
//! Both readers block.  Async callers run them through [`off_runtime`] so a
//! waiting operator does not hold a runtime worker.

use std::io::{self, BufRead, Write};

/// Shown on the operator sink whenever the source reports end-of-input.
pub const EMPTY_INPUT_NOTICE: &str = "Please just write something...";

/// Shown before waiting for the confirmation keypress.
pub const CONFIRM_PROMPT: &str = "Press enter to continue...";

/// Errors raised while talking to the operator.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("operator I/O error: {0}")]
    Io(#[from] io::Error),
    /// The blocking reader task panicked or was cancelled.
    #[error("input task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A source of operator lines.
///
/// `Ok(None)` signals end-of-input.
pub trait LineSource {
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

impl<R: BufRead> LineSource for R {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if BufRead::read_line(self, &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Read one line of text, re-prompting on every end-of-input.
///
/// The trailing line terminator (`\n` or `\r\n`) is stripped.
pub fn read_message<S, W>(source: &mut S, operator: &mut W) -> Result<String, InputError>
where
    S: LineSource + ?Sized,
    W: Write + ?Sized,
{
    loop {
        match source.read_line()? {
            Some(line) => return Ok(trim_newline(line)),
            None => {
                log::debug!("end of input while waiting for a message");
                writeln!(operator, "{EMPTY_INPUT_NOTICE}\n")?;
                operator.flush()?;
            }
        }
    }
}

/// Prompt, then block until the operator presses enter.
///
/// End-of-input also releases the wait.
pub fn wait_for_confirmation<S, W>(source: &mut S, operator: &mut W) -> Result<(), InputError>
where
    S: LineSource + ?Sized,
    W: Write + ?Sized,
{
    writeln!(operator, "\n{CONFIRM_PROMPT}\n")?;
    operator.flush()?;
    source.read_line()?;
    Ok(())
}

/// Run a blocking operator interaction on tokio's blocking pool.
pub async fn off_runtime<T, F>(interaction: F) -> Result<T, InputError>
where
    F: FnOnce() -> Result<T, InputError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(interaction).await?
}

fn trim_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
