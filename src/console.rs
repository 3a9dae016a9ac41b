//! Console collaborators for READ and PRINT
//!
//! `StdConsole` talks to the terminal; `HeadlessConsole` feeds scripted input
//! and collects output, for tests and non-interactive runs.

use crate::compiler::ir::Word;
use log::debug;
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Console error type
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleError {
    pub message: String,
}

impl ConsoleError {
    pub fn new(message: impl Into<String>) -> Self {
        ConsoleError {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConsoleError {}

pub trait Console {
    /// Read one integer for a READ instruction
    fn read_value(&mut self) -> Result<Word, ConsoleError>;

    /// Emit the operand of a PRINT instruction
    fn print_value(&mut self, value: Word) -> Result<(), ConsoleError>;
}

/// Standard input / standard output
pub struct StdConsole {
    buffer: String,
    prompt: bool,
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl StdConsole {
    /// Prompts for input only when stdin is a terminal
    pub fn new() -> Self {
        StdConsole {
            buffer: String::new(),
            prompt: atty::is(atty::Stream::Stdin),
        }
    }
}

impl Console for StdConsole {
    fn read_value(&mut self) -> Result<Word, ConsoleError> {
        let stdin = io::stdin();
        loop {
            if self.prompt {
                print!("? ");
                io::stdout()
                    .flush()
                    .map_err(|e| ConsoleError::new(format!("Failed to flush stdout: {e}")))?;
            }

            self.buffer.clear();
            let bytes_read = stdin
                .lock()
                .read_line(&mut self.buffer)
                .map_err(|e| ConsoleError::new(format!("Failed to read line: {e}")))?;

            // EOF would otherwise spin on empty input forever
            if bytes_read == 0 {
                debug!("console: EOF on stdin");
                return Err(ConsoleError::new("EOF: no more input for READ"));
            }

            match self.buffer.trim().parse::<Word>() {
                Ok(value) => return Ok(value),
                Err(_) if self.prompt => {
                    println!("Please enter an integer");
                }
                Err(_) => {
                    return Err(ConsoleError::new(format!(
                        "READ expected an integer, got '{}'",
                        self.buffer.trim()
                    )))
                }
            }
        }
    }

    fn print_value(&mut self, value: Word) -> Result<(), ConsoleError> {
        let mut out = io::stdout();
        writeln!(out, "{}", value)
            .and_then(|_| out.flush())
            .map_err(|e| ConsoleError::new(format!("Failed to write output: {e}")))
    }
}

/// Scripted input, captured output
#[derive(Debug, Default)]
pub struct HeadlessConsole {
    input: VecDeque<Word>,
    output: Vec<Word>,
}

impl HeadlessConsole {
    pub fn new(input: &[Word]) -> Self {
        HeadlessConsole {
            input: input.iter().copied().collect(),
            output: Vec::new(),
        }
    }

    /// Values printed so far
    pub fn output(&self) -> &[Word] {
        &self.output
    }

    /// Output as it would appear on stdout
    pub fn output_text(&self) -> String {
        self.output.iter().map(|v| format!("{}\n", v)).collect()
    }

    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Console for HeadlessConsole {
    fn read_value(&mut self) -> Result<Word, ConsoleError> {
        let value = self
            .input
            .pop_front()
            .ok_or_else(|| ConsoleError::new("EOF: no more input for READ"))?;
        debug!("Headless: read {}", value);
        Ok(value)
    }

    fn print_value(&mut self, value: Word) -> Result<(), ConsoleError> {
        debug!("Headless: print {}", value);
        self.output.push(value);
        Ok(())
    }
}
