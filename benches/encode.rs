//! Criterion benchmarks for BPS encoding.

use bps_burn::prelude::*;
use burn::backend::NdArray;
use burn::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

type BenchBackend = NdArray;

fn synthetic_cloud(n: usize, p: usize) -> Tensor<BenchBackend, 3> {
    let data: Vec<f32> = (0..n * p * 3)
        .map(|i| ((i * 37 + 11) % 97) as f32 / 97.0 - 0.5)
        .collect();
    Tensor::from_data(TensorData::new(data, [n, p, 3]), &Default::default())
}

fn bench_enc_points(c: &mut Criterion) {
    let device = Default::default();
    let bps = Bps::<BenchBackend>::new(BpsConfig::new().with_n_bps_points(512), &device).unwrap();
    let opts = EncodeOptions::new().with_feature_types(vec![FeatureType::Dists, FeatureType::Deltas]);

    let mut group = c.benchmark_group("enc_points");
    for p_x in [256usize, 1024, 4096] {
        let x = synthetic_cloud(1, p_x);
        group.throughput(Throughput::Elements(p_x as u64));
        group.bench_with_input(BenchmarkId::from_parameter(p_x), &x, |b, x| {
            b.iter(|| bps.enc_points(black_box(x.clone()), &opts).unwrap());
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let device = Default::default();
    let bps = Bps::<BenchBackend>::new(BpsConfig::new().with_n_bps_points(512), &device).unwrap();
    let enc = bps
        .enc_points(
            synthetic_cloud(4, 1024),
            &EncodeOptions::new().with_feature_types(vec![FeatureType::Deltas]),
        )
        .unwrap();
    let deltas = enc.deltas.unwrap();

    c.bench_function("decode_512x4", |b| {
        b.iter(|| bps.decode(black_box(deltas.clone()), None).unwrap());
    });
}

criterion_group!(benches, bench_enc_points, bench_decode);
criterion_main!(benches);
