#![no_main]

use libfuzzer_sys::fuzz_target;
use notelog_core::record::{parse_index, write_index};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Anything that parses must re-encode to text that parses the same way.
    if let Ok(records) = parse_index(text) {
        if let Ok(encoded) = write_index(&records) {
            let again = parse_index(&encoded);
            assert!(again.is_ok_and(|r| r.len() == records.len()));
        }
    }
});
