//! Nearest-neighbor oracle seam.
//!
//! The encoder treats nearest-neighbor search as a black box behind
//! [`NearestNeighbor`]. [`BruteForce`] is the built-in implementation: a
//! broadcasted pairwise-distance reduction expressed entirely in tensor ops,
//! so any parallelism comes from the backend itself.

use burn::prelude::*;

use crate::error::{BpsError, Result};

/// Bidirectional nearest-neighbor correspondence between a query set and a
/// reference set.
///
/// Shapes use `N` for the batch, `Py` for query points, and `Px` for
/// reference points.
#[derive(Debug, Clone)]
pub struct Correspondence<B: Backend> {
    /// Euclidean distance from each query point to its nearest reference
    /// point, shape `[N, Py]`.
    pub query_dists: Tensor<B, 2>,
    /// Euclidean distance from each reference point to its nearest query
    /// point, shape `[N, Px]`.
    pub ref_dists: Tensor<B, 2>,
    /// Index of the nearest reference point for each query point,
    /// shape `[N, Py]`.
    pub query_ids: Tensor<B, 2, Int>,
    /// Index of the nearest query point for each reference point,
    /// shape `[N, Px]`.
    pub ref_ids: Tensor<B, 2, Int>,
}

/// Batched nearest-neighbor search between two point sets.
pub trait NearestNeighbor<B: Backend> {
    /// Compute the bidirectional correspondence between `query`
    /// (`[Nq, Py, D]`) and `reference` (`[Nr, Px, D]`).
    ///
    /// Batch sizes must match, or either side may be 1 and is broadcast.
    fn nearest(
        &self,
        query: &Tensor<B, 3>,
        reference: &Tensor<B, 3>,
    ) -> Result<Correspondence<B>>;
}

/// Exhaustive nearest-neighbor search over all point pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl<B: Backend> NearestNeighbor<B> for BruteForce {
    fn nearest(
        &self,
        query: &Tensor<B, 3>,
        reference: &Tensor<B, 3>,
    ) -> Result<Correspondence<B>> {
        let [nq, py, dq] = query.dims();
        let [nr, px, dr] = reference.dims();

        if dq != dr {
            return Err(BpsError::Oracle {
                message: format!(
                    "point dimensionality mismatch: query has {}, reference has {}",
                    dq, dr
                ),
            });
        }
        if py == 0 || px == 0 {
            return Err(BpsError::Oracle {
                message: "nearest-neighbor search over an empty point set".to_string(),
            });
        }
        if nq != nr && nq != 1 && nr != 1 {
            return Err(BpsError::Oracle {
                message: format!("incompatible batch sizes: query {}, reference {}", nq, nr),
            });
        }

        let n = nq.max(nr);
        let d = dq;

        let mut query_dists = Vec::with_capacity(n);
        let mut ref_dists = Vec::with_capacity(n);
        let mut query_ids = Vec::with_capacity(n);
        let mut ref_ids = Vec::with_capacity(n);

        for i in 0..n {
            let y = slice_item(query, if nq == 1 { 0 } else { i }, py, d);
            let x = slice_item(reference, if nr == 1 { 0 } else { i }, px, d);

            // Pairwise squared distances [Py, Px] via broadcasting.
            let y3 = y.reshape([py, 1, d]).expand([py, px, d]);
            let x3 = x.reshape([1, px, d]).expand([py, px, d]);
            let sq: Tensor<B, 2> = (y3 - x3).powf_scalar(2.0).sum_dim(2).squeeze(2);

            let y_ids: Tensor<B, 1, Int> = sq.clone().argmin(1).reshape([py]);
            let y_min: Tensor<B, 1> = sq.clone().min_dim(1).reshape([py]).sqrt();
            let x_ids: Tensor<B, 1, Int> = sq.clone().argmin(0).reshape([px]);
            let x_min: Tensor<B, 1> = sq.min_dim(0).reshape([px]).sqrt();

            query_ids.push(y_ids);
            query_dists.push(y_min);
            ref_ids.push(x_ids);
            ref_dists.push(x_min);
        }

        Ok(Correspondence {
            query_dists: Tensor::stack(query_dists, 0),
            ref_dists: Tensor::stack(ref_dists, 0),
            query_ids: Tensor::stack(query_ids, 0),
            ref_ids: Tensor::stack(ref_ids, 0),
        })
    }
}

fn slice_item<B: Backend>(t: &Tensor<B, 3>, i: usize, p: usize, d: usize) -> Tensor<B, 2> {
    t.clone().slice([i..i + 1, 0..p, 0..d]).reshape([p, d])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn points(data: Vec<f32>, shape: [usize; 3]) -> Tensor<TestBackend, 3> {
        Tensor::from_data(TensorData::new(data, shape), &Default::default())
    }

    #[test]
    fn test_brute_force_known_correspondence() {
        let query = points(vec![0.0, 0.0, 10.0, 0.0], [1, 2, 2]);
        let reference = points(vec![9.0, 0.0, 1.0, 0.0, 6.0, 4.0], [1, 3, 2]);

        let corr = BruteForce.nearest(&query, &reference).unwrap();

        let q_ids: Vec<i64> = corr.query_ids.to_data().to_vec().unwrap();
        assert_eq!(q_ids, vec![1, 0]);

        let q_dists: Vec<f32> = corr.query_dists.to_data().to_vec().unwrap();
        assert!((q_dists[0] - 1.0).abs() < 1e-6);
        assert!((q_dists[1] - 1.0).abs() < 1e-6);

        let r_ids: Vec<i64> = corr.ref_ids.to_data().to_vec().unwrap();
        assert_eq!(r_ids, vec![1, 0, 1]);
    }

    #[test]
    fn test_brute_force_batch_broadcast() {
        // One query set against a 2-item reference batch.
        let query = points(vec![0.0, 0.0, 0.0], [1, 1, 3]);
        let reference = points(
            vec![1.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 5.0, 0.0],
            [2, 2, 3],
        );

        let corr = BruteForce.nearest(&query, &reference).unwrap();
        assert_eq!(corr.query_dists.dims(), [2, 1]);
        assert_eq!(corr.ref_ids.dims(), [2, 2]);

        let dists: Vec<f32> = corr.query_dists.to_data().to_vec().unwrap();
        assert!((dists[0] - 1.0).abs() < 1e-6);
        assert!((dists[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_brute_force_rejects_dim_mismatch() {
        let query = points(vec![0.0, 0.0], [1, 1, 2]);
        let reference = points(vec![0.0, 0.0, 0.0], [1, 1, 3]);
        let err = BruteForce.nearest(&query, &reference).unwrap_err();
        assert!(matches!(err, BpsError::Oracle { .. }));
    }

    #[test]
    fn test_brute_force_rejects_empty_sets() {
        let query = points(vec![], [1, 0, 3]);
        let reference = points(vec![0.0, 0.0, 0.0], [1, 1, 3]);
        assert!(BruteForce.nearest(&query, &reference).is_err());
    }
}
