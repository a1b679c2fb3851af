//! # bps-burn
//!
//! Basis Point Set (BPS) encoding of 3D point clouds and meshes on Burn
//! tensors.
//!
//! BPS turns a variable-size, unordered point set into a fixed-length
//! feature vector: a reference set of basis points is sampled once, and
//! each basis point records its relationship (distance, offset, nearest
//! point) to the input set. The resulting vectors are fixed-size and
//! order-invariant, which makes them directly consumable by downstream
//! learned models. The `deltas` channel is approximately invertible via
//! [`Bps::decode`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use bps_burn::prelude::*;
//! use burn::backend::NdArray;
//!
//! let device = Default::default();
//! let bps = Bps::<NdArray>::new(BpsConfig::new().with_n_bps_points(512), &device)?;
//!
//! // x: [N, P_x, 3] batch of point clouds
//! let opts = EncodeOptions::new()
//!     .with_feature_types(vec![FeatureType::Dists, FeatureType::Deltas]);
//! let enc = bps.enc_points(x, &opts)?;
//!
//! // Reconstruct the matched nearest points from the offsets.
//! let rec = bps.decode(enc.deltas.unwrap(), None)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! sampling ──▶ Bps (fixed [1, P, D] basis)
//!                 │
//!        ┌────────┴─────────┐
//!        ▼                  ▼
//!   enc_points          enc_mesh
//!   (NearestNeighbor)   (SurfaceDistance)
//!        │
//!        ▼
//!     decode (basis + deltas)
//! ```
//!
//! Nearest-neighbor search and point-to-surface distance are seams:
//! [`nn::BruteForce`] and [`surface::BvhSurface`] are the built-in
//! implementations, and callers may substitute their own via
//! [`Bps::enc_points_with`] / [`Bps::enc_mesh_with`].
//!
//! ## Feature Flags
//!
//! - `ndarray` (default): CPU backend for out-of-the-box usage
//! - `wgpu`: cross-platform GPU backend

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod nn;
pub mod sampling;
pub mod surface;

pub use config::{BasisType, BpsConfig};
pub use encoder::{Bps, BpsInput};
pub use error::{BpsError, Result};
pub use features::{BpsFeatures, EncodeOptions, FeatureType};
pub use nn::{BruteForce, Correspondence, NearestNeighbor};
pub use surface::{BvhSurface, SurfaceDistance, TriMesh};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{BasisType, BpsConfig};
    pub use crate::encoder::{Bps, BpsInput};
    pub use crate::error::{BpsError, Result};
    pub use crate::features::{BpsFeatures, EncodeOptions, FeatureType};
    pub use crate::nn::{BruteForce, Correspondence, NearestNeighbor};
    pub use crate::surface::{BvhSurface, SurfaceDistance, TriMesh};
}
