use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kinex_stats::correlation::pearson;
use kinex_stats::glm::{poisson_glm, GlmConfig};
use kinex_stats::mantel::{mantel_test, MantelConfig};
use kinex_stats::model_frame::{Factor, Formula, Frame, Term};

fn random_f64(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

fn random_symmetric(n: usize, seed: u64) -> Vec<Vec<f64>> {
    let cells = random_f64(n * n, seed);
    let mut m = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            m[i][j] = cells[i * n + j];
            m[j][i] = cells[i * n + j];
        }
    }
    m
}

fn bench_pearson(c: &mut Criterion) {
    let mut group = c.benchmark_group("pearson");

    let x = random_f64(300, 42);
    let y = random_f64(300, 43);
    group.bench_function("300_pairs", |b| b.iter(|| pearson(black_box(&x), black_box(&y))));

    group.finish();
}

fn bench_mantel(c: &mut Criterion) {
    let mut group = c.benchmark_group("mantel");
    group.sample_size(10);

    // 25 households, the size of the field data.
    let a = random_symmetric(25, 42);
    let b = random_symmetric(25, 7);
    let config = MantelConfig::default();
    group.bench_function("25x25_20k_perms", |bench| {
        bench.iter(|| mantel_test(black_box(&a), black_box(&b), &config))
    });

    group.finish();
}

fn bench_poisson(c: &mut Criterion) {
    let mut group = c.benchmark_group("poisson_glm");

    let n = 500;
    let u = random_f64(n, 11);
    let degree: Vec<f64> = u.iter().map(|v| (v * 8.0).floor()).collect();
    let head: Vec<&str> = (0..n).map(|i| if i % 5 == 0 { "TRUE" } else { "FALSE" }).collect();
    let gender: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "F" } else { "M" }).collect();
    let frame = Frame::new()
        .with_numeric("degree", degree)
        .unwrap()
        .with_factor("head", Factor::from_labels(&head))
        .unwrap()
        .with_factor("gender", Factor::from_labels(&gender))
        .unwrap();
    let formula = Formula::new("degree")
        .term(Term::Factor("head".into()))
        .term(Term::Factor("gender".into()));
    let config = GlmConfig::default();
    group.bench_function("500_people", |b| {
        b.iter(|| poisson_glm(black_box(&frame), &formula, &config))
    });

    group.finish();
}

criterion_group!(benches, bench_pearson, bench_mantel, bench_poisson);
criterion_main!(benches);
