//! The BPS object: basis construction, encode dispatch, and decode.

use burn::prelude::*;

use crate::config::{BasisType, BpsConfig};
use crate::error::{BpsError, Result};
use crate::features::{BpsFeatures, EncodeOptions, FeatureType};
use crate::nn::{BruteForce, NearestNeighbor};
use crate::sampling;
use crate::surface::{BvhSurface, SurfaceDistance, TriMesh};

/// Basis scale applied before mesh surface queries.
///
/// Existing datasets were encoded with this value; changing it breaks
/// bit-for-bit compatibility with them.
const MESH_QUERY_SCALE: f32 = 1000.0;

/// One batch of encodable input.
///
/// The two accepted kinds are point-cloud batches (`[N, P_x, D]` tensors)
/// and triangle-mesh batches; [`Bps::encode`] dispatches on the variant.
#[derive(Debug, Clone)]
pub enum BpsInput<B: Backend> {
    /// A dense batch of point clouds, shape `[N, P_x, D]`.
    Points(Tensor<B, 3>),
    /// A batch of triangle meshes.
    Meshes(Vec<TriMesh>),
}

/// A fixed basis point set, constructed once and reused across encode and
/// decode calls.
///
/// The basis is stored as a `[1, P, D]` tensor on the construction device
/// and never mutated afterwards, so a shared `Bps` may be used from
/// concurrent encode calls without locking.
#[derive(Debug, Clone)]
pub struct Bps<B: Backend> {
    basis: Tensor<B, 3>,
    device: B::Device,
}

impl<B: Backend> Bps<B> {
    /// Construct a basis by sampling according to `config`.
    ///
    /// For [`BasisType::GridCube`] the realized point count may differ from
    /// the request; read it back via [`Bps::n_points`].
    pub fn new(config: BpsConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;

        let basis: Tensor<B, 2> = match config.basis_type {
            BasisType::RandomUniform => sampling::sample_sphere_uniform(
                config.n_bps_points,
                config.n_dims,
                config.radius,
                config.random_seed,
                device,
            ),
            BasisType::RandomNonUniform => sampling::sample_sphere_nonuniform(
                config.n_bps_points,
                config.n_dims,
                config.radius,
                config.random_seed,
                device,
            ),
            BasisType::GridCube => sampling::sample_grid_cube(
                config.grid_size(),
                -config.radius,
                config.radius,
                config.n_dims,
                device,
            ),
            BasisType::GridSphere => sampling::sample_grid_sphere(
                config.n_bps_points,
                config.n_dims,
                config.radius,
                config.randomize,
                config.random_seed,
                device,
            ),
        };

        Ok(Self {
            basis: basis.unsqueeze(),
            device: device.clone(),
        })
    }

    /// Construct from a caller-supplied `[P, D]` basis, bypassing sampling.
    pub fn from_basis(basis: Tensor<B, 2>) -> Result<Self> {
        let [p, d] = basis.dims();
        if p == 0 || d == 0 {
            return Err(BpsError::InvalidConfig {
                message: format!("custom basis must be non-empty, got shape [{}, {}]", p, d),
            });
        }
        let device = basis.device();
        Ok(Self {
            basis: basis.unsqueeze(),
            device,
        })
    }

    /// The stored basis, shape `[1, P, D]`.
    pub fn basis(&self) -> &Tensor<B, 3> {
        &self.basis
    }

    /// Realized number of basis points.
    pub fn n_points(&self) -> usize {
        self.basis.dims()[1]
    }

    /// Dimensionality of the basis points.
    pub fn n_dims(&self) -> usize {
        self.basis.dims()[2]
    }

    /// Device the basis lives on; inputs are moved here per call.
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Encode a batch of point clouds or meshes, dispatching on the input
    /// kind.
    pub fn encode(&self, input: BpsInput<B>, opts: &EncodeOptions<B>) -> Result<BpsFeatures<B>> {
        match input {
            BpsInput::Points(x) => self.enc_points(x, opts),
            BpsInput::Meshes(meshes) => self.enc_mesh(&meshes, opts),
        }
    }

    /// Encode a batch of point clouds with the built-in exhaustive
    /// nearest-neighbor oracle.
    pub fn enc_points(&self, x: Tensor<B, 3>, opts: &EncodeOptions<B>) -> Result<BpsFeatures<B>> {
        self.enc_points_with(&BruteForce, x, opts)
    }

    /// Encode a single unbatched `[P_x, D]` point cloud.
    ///
    /// Equivalent to promoting the cloud to a batch of one; the returned
    /// feature tensors carry a leading batch dimension of 1.
    pub fn enc_points_single(
        &self,
        x: Tensor<B, 2>,
        opts: &EncodeOptions<B>,
    ) -> Result<BpsFeatures<B>> {
        self.enc_points(x.unsqueeze(), opts)
    }

    /// Encode a batch of point clouds against a caller-supplied
    /// nearest-neighbor oracle.
    ///
    /// Every batch item is processed independently: one oracle call per
    /// item, no cross-item state beyond the read-only basis.
    pub fn enc_points_with<O: NearestNeighbor<B>>(
        &self,
        oracle: &O,
        x: Tensor<B, 3>,
        opts: &EncodeOptions<B>,
    ) -> Result<BpsFeatures<B>> {
        if opts.feature_types.is_empty() {
            return Err(BpsError::NoFeaturesRequested);
        }
        let x_features = match (opts.wants(FeatureType::Features), &opts.x_features) {
            (true, Some(xf)) => Some(xf.clone()),
            (true, None) => return Err(BpsError::MissingPointFeatures),
            (false, _) => None,
        };

        let x = x.to_device(&self.device);
        let [n, p_x, d] = x.dims();
        if n == 0 || p_x == 0 {
            return Err(BpsError::InvalidConfig {
                message: format!("input batch must be non-empty, got shape [{}, {}, {}]", n, p_x, d),
            });
        }

        let basis = self.resolve_basis(opts.custom_basis.as_ref());
        let [nb, p, d_b] = basis.dims();
        if d_b != d {
            return Err(BpsError::ShapeMismatch {
                expected: vec![nb, p, d_b],
                got: vec![n, p_x, d],
            });
        }
        if nb != 1 && nb != n {
            return Err(BpsError::BasisBatchMismatch {
                basis_batch: nb,
                input_batch: n,
            });
        }

        let x_features = match x_features {
            Some(xf) => {
                let xf = xf.to_device(&self.device);
                let [nf, pf, _] = xf.dims();
                if nf != n || pf != p_x {
                    return Err(BpsError::ShapeMismatch {
                        expected: vec![n, p_x],
                        got: vec![nf, pf],
                    });
                }
                Some(xf)
            }
            None => None,
        };

        let mut delta_items = Vec::with_capacity(n);
        let mut id_items = Vec::with_capacity(n);
        let mut closest_items = Vec::new();
        let mut feature_items = Vec::new();

        for i in 0..n {
            let basis_i = if nb == n {
                basis.clone().slice([i..i + 1, 0..p, 0..d])
            } else {
                basis.clone()
            };
            let x_i = x.clone().slice([i..i + 1, 0..p_x, 0..d]);

            let corr = oracle.nearest(&basis_i, &x_i)?;
            debug_assert_eq!(corr.ref_ids.dims(), [1, p_x]);

            let ids_i: Tensor<B, 1, Int> = corr.query_ids.reshape([p]);
            let nearest = x_i.reshape([p_x, d]).select(0, ids_i.clone());
            let delta = nearest.clone() - basis_i.reshape([p, d]);

            if opts.wants(FeatureType::Closest) {
                closest_items.push(nearest);
            }
            if let Some(xf) = &x_features {
                let f = xf.dims()[2];
                let xf_i = xf.clone().slice([i..i + 1, 0..p_x, 0..f]).reshape([p_x, f]);
                feature_items.push(xf_i.select(0, ids_i.clone()));
            }

            delta_items.push(delta);
            id_items.push(ids_i);
        }

        let deltas: Tensor<B, 3> = Tensor::stack(delta_items, 0);
        let ids: Tensor<B, 2, Int> = Tensor::stack(id_items, 0);

        let mut out = BpsFeatures::empty();
        if opts.wants(FeatureType::Dists) {
            out.dists = Some(deltas.clone().powf_scalar(2.0).sum_dim(2).sqrt().squeeze(2));
        }
        if opts.wants(FeatureType::Closest) {
            out.closest = Some(Tensor::stack(closest_items, 0));
        }
        if opts.wants(FeatureType::Features) {
            out.features = Some(Tensor::stack(feature_items, 0));
        }
        if opts.wants(FeatureType::Deltas) {
            out.deltas = Some(deltas);
        }
        out.ids = Some(ids);
        Ok(out)
    }

    /// Encode a batch of meshes with the built-in BVH surface oracle.
    pub fn enc_mesh(&self, meshes: &[TriMesh], opts: &EncodeOptions<B>) -> Result<BpsFeatures<B>> {
        self.enc_mesh_with(&BvhSurface, meshes, opts)
    }

    /// Encode a batch of meshes against a caller-supplied surface-distance
    /// oracle.
    ///
    /// Only the `dists` channel exists for meshes; any other requested
    /// channel is ignored with a warning. The basis is scaled by 1000
    /// before querying so outputs stay compatible with existing encoded
    /// datasets.
    pub fn enc_mesh_with<O: SurfaceDistance>(
        &self,
        oracle: &O,
        meshes: &[TriMesh],
        opts: &EncodeOptions<B>,
    ) -> Result<BpsFeatures<B>> {
        if opts.feature_types.is_empty() {
            return Err(BpsError::NoFeaturesRequested);
        }
        if opts.feature_types.iter().any(|f| *f != FeatureType::Dists) {
            log::warn!("mesh encoding only supports the dists channel; other requested channels are ignored");
        }
        if meshes.is_empty() {
            return Err(BpsError::InvalidConfig {
                message: "mesh batch must be non-empty".to_string(),
            });
        }

        let basis = self.resolve_basis(opts.custom_basis.as_ref());
        let [nb, p, d] = basis.dims();
        if d != 3 {
            return Err(BpsError::InvalidConfig {
                message: format!("mesh encoding requires a 3D basis, got {} dims", d),
            });
        }
        let n = meshes.len();
        if nb != 1 && nb != n {
            return Err(BpsError::BasisBatchMismatch {
                basis_batch: nb,
                input_batch: n,
            });
        }

        let scaled = basis.mul_scalar(MESH_QUERY_SCALE);
        let flat: Vec<f32> = scaled.into_data().to_vec().map_err(|e| BpsError::Oracle {
            message: format!("basis readback failed: {:?}", e),
        })?;

        let mut rows = Vec::with_capacity(n * p);
        for (i, mesh) in meshes.iter().enumerate() {
            let item = if nb == n { i } else { 0 };
            let offset = item * p * 3;
            let queries: Vec<[f32; 3]> = (0..p)
                .map(|j| {
                    let at = offset + j * 3;
                    [flat[at], flat[at + 1], flat[at + 2]]
                })
                .collect();

            let dists = oracle.surface_distances(mesh, &queries)?;
            if dists.len() != p {
                return Err(BpsError::Oracle {
                    message: format!(
                        "surface oracle returned {} distances for {} queries",
                        dists.len(),
                        p
                    ),
                });
            }
            rows.extend(dists);
        }

        let mut out = BpsFeatures::empty();
        out.dists = Some(Tensor::from_data(
            TensorData::new(rows, [n, p]),
            &self.device,
        ));
        Ok(out)
    }

    /// Reconstruct absolute positions from per-basis-point offsets.
    ///
    /// Computes `basis + delta` with the basis broadcast over the batch.
    /// This inverts the `deltas` channel exactly, which reconstructs the
    /// nearest input point matched to each basis point, not the original
    /// cloud: input points never selected as a nearest neighbor are
    /// unrecoverable.
    pub fn decode(
        &self,
        x_deltas: Tensor<B, 3>,
        custom_basis: Option<&Tensor<B, 3>>,
    ) -> Result<Tensor<B, 3>> {
        let x = x_deltas.to_device(&self.device);
        let [n, p, d] = x.dims();

        let basis = self.resolve_basis(custom_basis);
        let [nb, pb, db] = basis.dims();
        if pb != p || db != d {
            return Err(BpsError::ShapeMismatch {
                expected: vec![nb, pb, db],
                got: vec![n, p, d],
            });
        }
        if nb != 1 && nb != n {
            return Err(BpsError::BasisBatchMismatch {
                basis_batch: nb,
                input_batch: n,
            });
        }

        let basis = if nb == n {
            basis
        } else {
            basis.expand([n, p, d])
        };
        Ok(basis + x)
    }

    /// Decode a single unbatched `[P, D]` offset tensor.
    pub fn decode_single(
        &self,
        x_deltas: Tensor<B, 2>,
        custom_basis: Option<&Tensor<B, 3>>,
    ) -> Result<Tensor<B, 2>> {
        let [p, d] = x_deltas.dims();
        Ok(self.decode(x_deltas.unsqueeze(), custom_basis)?.reshape([p, d]))
    }

    /// The basis for this call: the one-off override if given, else the
    /// stored basis. The override is moved to the object's device and never
    /// persisted.
    fn resolve_basis(&self, custom: Option<&Tensor<B, 3>>) -> Tensor<B, 3> {
        match custom {
            Some(basis) => basis.clone().to_device(&self.device),
            None => self.basis.clone(),
        }
    }
}
