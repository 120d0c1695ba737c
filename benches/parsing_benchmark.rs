use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mbus_master::mbus::frame::LongFrame;
use mbus_master::mbus::reader::LongFrameScanner;
use mbus_master::util::hex::decode_hex;

const EXAMPLE_DATA_01_HEX: &str = "6831316808017245585703B40534049E0027B60306F934150315C6004D052E00000000053D00000000055B22F32642055FC7DA0D42FA16";

fn benchmark_scan_frame(c: &mut Criterion) {
    let mut stream = vec![0x00, 0xFF, 0x68, 0x02];
    stream.extend(decode_hex(EXAMPLE_DATA_01_HEX).unwrap());

    c.bench_function("scan_long_frame", |b| {
        b.iter(|| {
            let mut scanner = LongFrameScanner::new();
            for &byte in black_box(&stream) {
                if let Ok(Some(frame)) = scanner.push(byte) {
                    black_box(frame);
                    break;
                }
            }
        })
    });
}

fn benchmark_decode_frame(c: &mut Criterion) {
    let frame = LongFrame::from_bytes(decode_hex(EXAMPLE_DATA_01_HEX).unwrap());

    c.bench_function("decode_long_frame", |b| {
        b.iter(|| {
            let _ = black_box(black_box(&frame).decode());
        })
    });
}

criterion_group!(benches, benchmark_scan_frame, benchmark_decode_frame);
criterion_main!(benches);
