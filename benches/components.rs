//! Component-level microbenchmarks for ppz: checksum, Huffman, match
//! finding, and the full codec at representative levels.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ppz::checksum::sum16;
use ppz::compress::{huffman, matcher};
use ppz::header::Mode;
use ppz::progress::Progress;

fn make_pattern(len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    while out.len() < len {
        out.extend_from_slice(pattern);
    }
    out.truncate(len);
    out
}

fn make_random(len: usize, mut seed: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
        out.push((seed >> 16) as u8);
    }
    out.truncate(len);
    out
}

fn bench_checksum(c: &mut Criterion) {
    let data = make_random(1 << 20, 0x1234_5678);
    let mut group = c.benchmark_group("checksum");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("sum16_1mib", |b| b.iter(|| sum16(black_box(&data))));
    group.finish();
}

fn bench_huffman(c: &mut Criterion) {
    let data = make_pattern(1 << 20);
    let mut group = c.benchmark_group("huffman");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("count_and_build", |b| {
        b.iter(|| {
            let freqs = huffman::count_frequencies(black_box(&data), &mut Progress::none());
            let tree = huffman::build_tree(&freqs).unwrap();
            huffman::serialize_tree(&tree).unwrap()
        })
    });
    group.finish();
}

fn bench_matcher(c: &mut Criterion) {
    let compressible = make_pattern(1 << 20);
    let random = make_random(1 << 20, 0xDEAD_BEEF);
    let mut group = c.benchmark_group("matcher");
    group.throughput(Throughput::Bytes(compressible.len() as u64));

    for mode in [Mode::Fast, Mode::Balanced, Mode::Web, Mode::Ultra] {
        group.bench_with_input(
            BenchmarkId::new("tokenize_text", mode.name()),
            &compressible,
            |b, data| b.iter(|| matcher::tokenize(black_box(data), mode, &mut Progress::none())),
        );
    }
    group.bench_function("tokenize_random_balanced", |b| {
        b.iter(|| matcher::tokenize(black_box(&random), Mode::Balanced, &mut Progress::none()))
    });
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let data = make_pattern(1 << 20);
    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(data.len() as u64));

    for level in [1u8, 6, 9] {
        group.bench_with_input(BenchmarkId::new("compress", level), &data, |b, data| {
            b.iter(|| ppz::compress(black_box(data), level).unwrap())
        });
    }

    let container = ppz::compress(&data, 6).unwrap();
    group.bench_function("decompress", |b| {
        b.iter(|| ppz::decompress(black_box(&container)).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_checksum,
    bench_huffman,
    bench_matcher,
    bench_codec
);
criterion_main!(benches);
