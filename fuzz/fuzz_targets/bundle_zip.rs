#![no_main]

use libfuzzer_sys::fuzz_target;
use notelog_core::bundle::Bundle;

fuzz_target!(|data: &[u8]| {
    if let Ok(bundle) = Bundle::from_zip(data) {
        for rec in &bundle.records {
            assert!(bundle.content(rec).is_ok());
        }
    }
});
