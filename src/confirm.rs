//! Yes/no gate in front of destructive operations.

use crate::helpers::is_affirmative;
use std::io::{BufRead, Write};

pub trait Confirm {
    /// Returns true only on explicit consent.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Writes the prompt and reads one line of answer. Read errors and EOF decline.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{prompt}").and_then(|()| self.output.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let answer = PromptConfirm::new(Cursor::new(input.as_bytes()), &mut output).confirm("proceed? (y/n): ");
        (answer, String::from_utf8(output).expect("utf8"))
    }

    #[test]
    fn prompt_is_written_and_yes_accepted() {
        let (answer, output) = ask("y\n");
        assert!(answer);
        assert_eq!(output, "proceed? (y/n): ");
    }

    #[test]
    fn default_is_no() {
        assert!(!ask("\n").0);
        assert!(!ask("").0);
        assert!(!ask("n\n").0);
        assert!(!ask("maybe\n").0);
    }
}
