//! Throughput benchmarks for the parse -> build -> dispatch pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use vtscreen_core::{NullListener, Screen, WindowSize};

fn plain_text_input() -> Vec<u8> {
    let mut input = Vec::with_capacity(64 * 1024);
    while input.len() < 64 * 1024 {
        input.extend_from_slice(b"the quick brown fox jumps over the lazy dog \r\n");
    }
    input
}

fn sgr_heavy_input() -> Vec<u8> {
    let mut input = Vec::with_capacity(64 * 1024);
    let mut color = 0u16;
    while input.len() < 64 * 1024 {
        color = (color + 1) % 256;
        input.extend_from_slice(format!("\x1b[38;5;{color}mX\x1b[0m").as_bytes());
        if color % 64 == 0 {
            input.extend_from_slice(b"\r\n");
        }
    }
    input
}

fn cursor_heavy_input() -> Vec<u8> {
    let mut input = Vec::with_capacity(64 * 1024);
    let mut row = 1usize;
    while input.len() < 64 * 1024 {
        row = row % 24 + 1;
        input.extend_from_slice(format!("\x1b[{row};{}H*", row * 3 % 80 + 1).as_bytes());
    }
    input
}

fn wide_text_input() -> Vec<u8> {
    let mut input = Vec::with_capacity(64 * 1024);
    while input.len() < 64 * 1024 {
        input.extend_from_slice("终端屏幕引擎基准测试 ".as_bytes());
        input.extend_from_slice(b"\r\n");
    }
    input
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen_write");
    for (name, input) in [
        ("plain_text", plain_text_input()),
        ("sgr_heavy", sgr_heavy_input()),
        ("cursor_heavy", cursor_heavy_input()),
        ("wide_text", wide_text_input()),
    ] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut screen =
                    Screen::with_history(WindowSize::new(80, 24), Some(1000), NullListener);
                screen.write(black_box(&input));
                black_box(screen.real_cursor_position())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_write);
criterion_main!(benches);
