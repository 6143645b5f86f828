use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use setsim_core::{SearchIndex, SimilarityKind};
use std::collections::HashSet;

/// Records over a skewed vocabulary: low token ids are far more common.
fn skewed_records(n: usize, vocab: u32, seed: u64) -> Vec<Vec<u32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let len = rng.gen_range(5..60);
            let mut seen = HashSet::with_capacity(len);
            while seen.len() < len {
                let u: f64 = rng.gen();
                seen.insert((u.powi(3) * vocab as f64) as u32);
            }
            seen.into_iter().collect()
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let records = skewed_records(5_000, 20_000, 7);
    c.bench_function("build_jaccard_5k", |b| {
        b.iter(|| SearchIndex::build(black_box(&records), SimilarityKind::Jaccard, 0.7).unwrap())
    });
}

fn bench_query(c: &mut Criterion) {
    let records = skewed_records(5_000, 20_000, 7);
    for kind in SimilarityKind::ALL {
        let index = SearchIndex::build(&records, kind, 0.7).unwrap();
        c.bench_function(&format!("query_{kind}_5k"), |b| {
            b.iter(|| {
                for record in records.iter().take(100) {
                    black_box(index.query(record).unwrap());
                }
            })
        });
    }
}

criterion_group!(benches, bench_build, bench_query);
criterion_main!(benches);
