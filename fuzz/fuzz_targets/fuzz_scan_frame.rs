#![no_main]

use libfuzzer_sys::fuzz_target;
use mbus_master::mbus::reader::LongFrameScanner;

fuzz_target!(|data: &[u8]| {
    let mut scanner = LongFrameScanner::new();
    for &byte in data {
        match scanner.push(byte) {
            Ok(Some(frame)) => {
                let _ = frame.decode();
                scanner = LongFrameScanner::new();
            }
            Ok(None) => {}
            Err(_) => scanner = LongFrameScanner::new(),
        }
    }
});
