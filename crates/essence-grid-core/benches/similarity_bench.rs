//! Float vs integer-kernel similarity benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use essence_grid_core::quantization::{kernel, quantize};
use essence_grid_core::similarity::{dot_product, normalize};

fn unit_vector(seed: u64, dim: usize) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut v: Vec<f32> = (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect();
    normalize(&mut v);
    v
}

fn bench_similarity(c: &mut Criterion) {
    let a = unit_vector(1, 384);
    let b = unit_vector(2, 384);
    let qa = quantize(&a).expect("finite vector");
    let qb = quantize(&b).expect("finite vector");

    let mut group = c.benchmark_group("dot_384");
    group.bench_function("float", |bench| {
        bench.iter(|| dot_product(black_box(&a), black_box(&b)).unwrap())
    });
    group.bench_function("quantized_kernel", |bench| {
        bench.iter(|| kernel::quantized_dot(black_box(&qa), black_box(&qb)).unwrap())
    });
    group.bench_function("mixed_kernel", |bench| {
        bench.iter(|| kernel::mixed_dot(black_box(&a), black_box(&qb)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_similarity);
criterion_main!(benches);
