//! Benchmarks for particle redistribution.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cvortex::{
    compute::{RedistKernel, RedistributionEngine, find_cutoff},
    schema::{Particle, Particle2, Particle3, RedistConfig},
};

fn cloud_2d(n: usize) -> Vec<Particle2> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..n)
        .map(|_| {
            Particle::new(
                [rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)],
                rng.gen_range(-1.0..1.0),
                1.0 / n as f32,
            )
        })
        .collect()
}

fn cloud_3d(n: usize) -> Vec<Particle3> {
    let mut rng = StdRng::seed_from_u64(11);
    (0..n)
        .map(|_| {
            Particle::new(
                [
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                ],
                [
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                ],
                1.0 / n as f32,
            )
        })
        .collect()
}

fn bench_kernels_2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("redistribute_2d");
    let particles = cloud_2d(100_000);

    for kernel in RedistKernel::ALL {
        let config = RedistConfig::new(kernel, 0.005, 50_000).with_negligible_fraction(0.01);
        let engine = RedistributionEngine::new(config).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(kernel.name()),
            &kernel,
            |b, _| {
                b.iter(|| engine.redistribute(black_box(&particles)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_particle_count_3d(c: &mut Criterion) {
    let mut group = c.benchmark_group("redistribute_3d");
    group.sample_size(10);

    for n in [10_000, 100_000] {
        let particles = cloud_3d(n);
        let config = RedistConfig::new(RedistKernel::M4Prime, 0.02, n);
        let engine = RedistributionEngine::new(config).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| engine.redistribute(black_box(&particles)).unwrap());
        });
    }

    group.finish();
}

fn bench_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("workers");
    let particles = cloud_2d(200_000);

    for workers in [1, 2, 4, 8] {
        let config =
            RedistConfig::new(RedistKernel::Lambda3, 0.005, usize::MAX).with_workers(workers);
        let engine = RedistributionEngine::new(config).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, _| {
                b.iter(|| engine.redistribute(black_box(&particles)).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_find_cutoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_cutoff");
    let mut rng = StdRng::seed_from_u64(3);
    let values: Vec<f32> = (0..1_000_000)
        .map(|_| {
            let u: f32 = rng.gen_range(1e-3..1.0);
            1.0 / (u * u)
        })
        .collect();

    for keep in [1_000, 100_000, 500_000] {
        group.bench_with_input(BenchmarkId::from_parameter(keep), &keep, |b, &keep| {
            b.iter(|| find_cutoff(black_box(&values), keep));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_kernels_2d,
    bench_particle_count_3d,
    bench_workers,
    bench_find_cutoff
);
criterion_main!(benches);
