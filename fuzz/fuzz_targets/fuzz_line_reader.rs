//! Fuzz target: `LineReader` over arbitrary reader output
//!
//! Raw bytes from a misbehaving reader (binary noise, invalid UTF-8,
//! missing newlines) must only ever produce identifiers, reader faults,
//! or end of input:
//! - No panics
//! - Terminates with `Cancelled` within one call per input line
//!
//! cargo fuzz run fuzz_line_reader

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use rfidgate::adapters::line_reader::LineReader;
use rfidgate::app::ports::CardReader;
use rfidgate::error::GateError;

fuzz_target!(|data: &[u8]| {
    let max_calls = data.iter().filter(|&&b| b == b'\n').count() + 2;
    let mut reader = LineReader::new(Cursor::new(data.to_vec()));
    for _ in 0..max_calls {
        match reader.read_identifier() {
            Ok(_) | Err(GateError::Reader(_)) => {}
            Err(GateError::Cancelled) => return,
            Err(other) => panic!("unexpected error from line reader: {other}"),
        }
    }
    panic!("line reader did not reach end of input");
});
