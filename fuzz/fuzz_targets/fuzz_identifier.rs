//! Fuzz target: `Identifier::parse`
//!
//! Feeds arbitrary UTF-8 to the identifier parser and checks:
//! - No panics
//! - Accepted identifiers are non-empty, trimmed, within the length cap,
//!   and free of control characters
//! - Parsing an accepted identifier's text yields the same identifier
//!
//! cargo fuzz run fuzz_identifier

#![no_main]

use libfuzzer_sys::fuzz_target;
use rfidgate::card::{IDENTIFIER_MAX_LEN, Identifier};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(id) = Identifier::parse(text) {
        let s = id.as_str();
        assert!(!s.is_empty());
        assert!(s.len() <= IDENTIFIER_MAX_LEN);
        assert_eq!(s, s.trim());
        assert!(!s.chars().any(char::is_control));
        assert_eq!(Identifier::parse(s).ok().as_ref(), Some(&id));
    }
});
