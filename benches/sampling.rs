use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use std::hint::black_box;
use streamtune::{roulette_wheel, Adaptation, Parameter, ParameterDeclaration, TruncatedNormal};

fn bench_roulette(c: &mut Criterion) {
    let mut group = c.benchmark_group("roulette_wheel");
    for &n in &[2usize, 10, 100] {
        // Slightly uneven weights with a few zeros.
        let weights: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 11) as f64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let mut rng = StdRng::seed_from_u64(1);
            b.iter(|| black_box(roulette_wheel(black_box(&weights), &mut rng).unwrap()))
        });
    }
    group.finish();
}

fn bench_truncated(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncated_normal");
    // Wide spread around the centre vs. a mean pinned at the lower bound, where
    // half of the draws are rejected.
    for (name, mean) in [("centered", 0.5), ("at_bound", 0.0)] {
        let dist = TruncatedNormal::new(mean, 0.3, 0.0, 1.0).unwrap();
        group.bench_function(name, |b| {
            let mut rng = StdRng::seed_from_u64(2);
            b.iter(|| black_box(dist.sample(&mut rng)))
        });
    }
    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let decls = [
        ParameterDeclaration::numeric("e", 0.08, 0.001, 0.2),
        ParameterDeclaration::integer("m", 10, 2, 200),
        ParameterDeclaration::categorical("d", "a", &["a", "b", "c", "d"]),
        ParameterDeclaration::boolean("w", true),
        ParameterDeclaration::ordinal("h", "mid", &["low", "mid", "high"]),
    ];
    let mut group = c.benchmark_group("resample");
    for decl in &decls {
        let base = Parameter::from_declaration(decl).unwrap();
        group.bench_function(decl.kind.as_str(), |b| {
            let mut rng = StdRng::seed_from_u64(3);
            // Shrink factor 1 keeps the spread stable across iterations.
            let adaptation = Adaptation::new(1.0, decls.len());
            let mut p = base.clone();
            b.iter(|| {
                p.resample(adaptation, &mut rng).unwrap();
                black_box(p.scalar())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_roulette, bench_truncated, bench_resample);
criterion_main!(benches);
