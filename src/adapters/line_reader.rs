//! Line-oriented card reader.
//!
//! USB "keyboard wedge" RFID readers type the card number followed by
//! Enter; serial bridges for SPI readers print one identifier per line.
//! Both look the same from here: one line per presentation.
//!
//! - blank lines are skipped (some readers send a bare CR/LF pair)
//! - a line that fails [`Identifier::parse`] is a [`ReaderFault`]
//! - end of input means the reader is gone: [`GateError::Cancelled`]

use std::io::BufRead;

use crate::app::ports::CardReader;
use crate::card::Identifier;
use crate::error::{GateError, ReaderFault};

pub struct LineReader<R: BufRead> {
    input: R,
    line: String,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: String::new(),
        }
    }
}

impl<R: BufRead> CardReader for LineReader<R> {
    fn read_identifier(&mut self) -> Result<Identifier, GateError> {
        loop {
            self.line.clear();
            let n = self
                .input
                .read_line(&mut self.line)
                .map_err(|e| ReaderFault::new(format!("read failed: {e}")))?;
            if n == 0 {
                return Err(GateError::Cancelled);
            }
            if self.line.trim().is_empty() {
                continue;
            }
            return Ok(Identifier::parse(&self.line)?);
        }
    }
}
