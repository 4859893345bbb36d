use criterion::{criterion_group, criterion_main, Criterion};
use panodepth::codecs::rvl::{compress, decompress};

fn depth_like_samples() -> Vec<u16> {
    // A plausible quantized panorama row pattern: smooth ramps broken by hole runs.
    (0..1024u32 * 512)
        .map(|i| {
            if i % 97 < 13 {
                0
            } else {
                (20_000 + (i % 512) * 17) as u16
            }
        })
        .collect()
}

pub fn bench_rvl(c: &mut Criterion) {
    let samples = depth_like_samples();
    c.bench_function("rvl_compress", |b| b.iter(|| compress(&samples)));

    let encoded = compress(&samples);
    c.bench_function("rvl_decompress", |b| {
        b.iter(|| decompress(&encoded, samples.len()).unwrap())
    });
}

criterion_group!(benches, bench_rvl);
criterion_main!(benches);
