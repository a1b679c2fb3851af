//! Property-based tests for the encode/decode round trip.

use bps_burn::prelude::*;
use burn::backend::NdArray;
use burn::prelude::*;
use proptest::prelude::*;

type TestBackend = NdArray;

fn device() -> <TestBackend as Backend>::Device {
    Default::default()
}

/// Strategy: a batch of clouds as (n, p_x, flat values in the unit cube).
fn cloud_strategy() -> impl Strategy<Value = (usize, usize, Vec<f32>)> {
    (1usize..4, 1usize..24).prop_flat_map(|(n, p_x)| {
        proptest::collection::vec(-1.0f32..1.0, n * p_x * 3)
            .prop_map(move |values| (n, p_x, values))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Decoding the deltas channel reproduces, per basis point, the input
    /// point it was matched to.
    #[test]
    fn decode_of_deltas_matches_gathered_inputs((n, p_x, values) in cloud_strategy()) {
        let bps = Bps::<TestBackend>::new(
            BpsConfig::new().with_n_bps_points(16),
            &device(),
        ).unwrap();
        let x: Tensor<TestBackend, 3> = Tensor::from_data(
            TensorData::new(values.clone(), [n, p_x, 3]),
            &device(),
        );

        let enc = bps.enc_points(
            x,
            &EncodeOptions::new().with_feature_types(vec![FeatureType::Deltas]),
        ).unwrap();
        let ids: Vec<i64> = enc.ids.unwrap().to_data().to_vec().unwrap();
        let rec: Vec<f32> = bps
            .decode(enc.deltas.unwrap(), None)
            .unwrap()
            .to_data()
            .to_vec()
            .unwrap();

        let p = bps.n_points();
        for b in 0..n {
            for j in 0..p {
                let id = ids[b * p + j] as usize;
                prop_assert!(id < p_x);
                for a in 0..3 {
                    let got = rec[(b * p + j) * 3 + a];
                    let want = values[(b * p_x + id) * 3 + a];
                    prop_assert!((got - want).abs() < 1e-5);
                }
            }
        }
    }

    /// The dists channel equals the Euclidean length of the deltas channel.
    #[test]
    fn dists_equal_delta_norms((n, p_x, values) in cloud_strategy()) {
        let bps = Bps::<TestBackend>::new(
            BpsConfig::new().with_n_bps_points(8),
            &device(),
        ).unwrap();
        let x: Tensor<TestBackend, 3> = Tensor::from_data(
            TensorData::new(values, [n, p_x, 3]),
            &device(),
        );

        let enc = bps.enc_points(
            x,
            &EncodeOptions::new().with_feature_types(vec![
                FeatureType::Dists,
                FeatureType::Deltas,
            ]),
        ).unwrap();

        let dists: Vec<f32> = enc.dists.unwrap().to_data().to_vec().unwrap();
        let deltas: Vec<f32> = enc.deltas.unwrap().to_data().to_vec().unwrap();
        for (j, d) in dists.iter().enumerate() {
            let norm = (0..3)
                .map(|a| deltas[j * 3 + a].powi(2))
                .sum::<f32>()
                .sqrt();
            prop_assert!((d - norm).abs() < 1e-5);
        }
    }

    /// Sampled bases stay within their radius for every strategy.
    #[test]
    fn sampled_bases_respect_the_radius(seed in 0u64..1000, radius in 0.1f32..5.0) {
        for basis_type in [
            BasisType::RandomUniform,
            BasisType::RandomNonUniform,
            BasisType::GridSphere,
        ] {
            let bps = Bps::<TestBackend>::new(
                BpsConfig::new()
                    .with_basis_type(basis_type)
                    .with_n_bps_points(32)
                    .with_radius(radius)
                    .with_random_seed(seed),
                &device(),
            ).unwrap();

            let vals: Vec<f32> = bps.basis().to_data().to_vec().unwrap();
            for point in vals.chunks(3) {
                let norm = point.iter().map(|v| v * v).sum::<f32>().sqrt();
                prop_assert!(norm <= radius * (1.0 + 1e-4));
            }
        }
    }
}
