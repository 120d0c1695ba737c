#![no_main]

use libfuzzer_sys::fuzz_target;
use mbus_master::payload::parse_records;

fuzz_target!(|data: &[u8]| {
    if let Ok((records, _)) = parse_records(data) {
        for record in &records {
            let _ = record.normalized_value();
        }
    }
});
