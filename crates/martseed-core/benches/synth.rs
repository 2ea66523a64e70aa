use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use martseed_core::facts::{generate_batch, SamplerProfile, DEFAULT_BATCH_SIZE};
use martseed_core::load::{DimensionKeys, ProductKey};

fn realistic_keys() -> DimensionKeys {
    DimensionKeys {
        customer_ids: (1..=5000).collect(),
        products: (1..=500)
            .map(|i| ProductKey {
                product_id: i,
                price: 10.0 + f64::from(i) * 0.37,
            })
            .collect(),
        date_ids: (1..=731).collect(),
    }
}

fn bench_generate_batch(c: &mut Criterion) {
    let keys = realistic_keys();
    let profile = SamplerProfile::default();

    c.bench_function("generate_batch_5000", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            black_box(generate_batch(
                &mut rng,
                black_box(&keys),
                &profile,
                DEFAULT_BATCH_SIZE,
            ))
        })
    });
}

criterion_group!(benches, bench_generate_batch);
criterion_main!(benches);
