//! Line-oriented prompt loop shared by the interactive commands.

use std::io::{self, BufRead, Write};

/// What the user typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A non-blank, trimmed message.
    Message(String),
    /// `clear`, when the loop accepts it.
    Clear,
    /// `exit`, `quit`, or end of input.
    Exit,
}

/// Reads trimmed lines from `input` and writes prompts and replies to `output`.
pub struct Repl<R, W> {
    input: R,
    output: W,
    prompt: String,
    accepts_clear: bool,
}

impl Repl<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the terminal.
    pub fn stdin(prompt: &str) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), prompt)
    }
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(input: R, output: W, prompt: &str) -> Self {
        Self {
            input,
            output,
            prompt: prompt.to_string(),
            accepts_clear: false,
        }
    }

    /// Treat `clear` as a command instead of a message.
    pub fn with_clear(mut self) -> Self {
        self.accepts_clear = true;
        self
    }

    /// Writer for replies.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Write one line to the output.
    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }

    /// Prompt until the user types something. Blank lines are skipped.
    ///
    /// `exit` and `quit` in any case print `Goodbye!`. End of input ends the
    /// loop the same way.
    pub fn read(&mut self) -> io::Result<Line> {
        loop {
            write!(self.output, "{}", self.prompt)?;
            self.output.flush()?;

            let mut buf = String::new();
            if self.input.read_line(&mut buf)? == 0 {
                writeln!(self.output)?;
                self.say("Goodbye!")?;
                return Ok(Line::Exit);
            }

            let line = buf.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                self.say("Goodbye!")?;
                return Ok(Line::Exit);
            }
            if self.accepts_clear && line.eq_ignore_ascii_case("clear") {
                return Ok(Line::Clear);
            }
            return Ok(Line::Message(line.to_string()));
        }
    }

    #[cfg(test)]
    pub(crate) fn into_output(self) -> W {
        self.output
    }
}
