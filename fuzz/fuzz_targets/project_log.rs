#![no_main]

use libfuzzer_sys::fuzz_target;
use notelog_core::project::{ProjectionMode, project};
use notelog_core::record::parse_index;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(records) = parse_index(text) else {
        return;
    };
    // A log that projects strictly projects identically in tolerant mode.
    if let Ok(strict) = project(&records, ProjectionMode::Strict) {
        let tolerant = project(&records, ProjectionMode::Tolerant).ok();
        assert_eq!(tolerant.as_ref(), Some(&strict));
    }
});
