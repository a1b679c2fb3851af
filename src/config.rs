//! Basis construction configuration.

use crate::error::{BpsError, Result};

/// Strategy used to sample the fixed basis point set.
///
/// A caller-supplied basis bypasses sampling entirely; see
/// [`Bps::from_basis`](crate::encoder::Bps::from_basis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BasisType {
    /// Directions drawn uniformly on the sphere surface, scaled by the radius.
    #[default]
    RandomUniform,
    /// Random points inside the ball with density concentrated at the center.
    RandomNonUniform,
    /// Regular axis-aligned grid spanning `[-radius, radius]` per axis.
    ///
    /// The realized point count is the nearest perfect `n_dims`-th power of
    /// the requested count; read it back via
    /// [`Bps::n_points`](crate::encoder::Bps::n_points).
    GridCube,
    /// Grid nodes restricted to the ball, optionally jittered.
    GridSphere,
}

/// Configuration for constructing a [`Bps`](crate::encoder::Bps) object.
///
/// Defaults: 1024 basis points sampled on the unit sphere in 3 dimensions,
/// seed 13.
#[derive(Debug, Clone, PartialEq)]
pub struct BpsConfig {
    /// Sampling strategy for the basis.
    pub basis_type: BasisType,
    /// Requested number of basis points.
    pub n_bps_points: usize,
    /// Radius of the sampling domain.
    pub radius: f32,
    /// Dimensionality of the point space.
    pub n_dims: usize,
    /// Seed controlling every random draw during sampling.
    pub random_seed: u64,
    /// Jitter grid-sphere nodes (ignored by other strategies).
    pub randomize: bool,
}

impl Default for BpsConfig {
    fn default() -> Self {
        Self {
            basis_type: BasisType::RandomUniform,
            n_bps_points: 1024,
            radius: 1.0,
            n_dims: 3,
            random_seed: 13,
            randomize: false,
        }
    }
}

impl BpsConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling strategy.
    pub fn with_basis_type(mut self, basis_type: BasisType) -> Self {
        self.basis_type = basis_type;
        self
    }

    /// Set the requested number of basis points.
    pub fn with_n_bps_points(mut self, n_bps_points: usize) -> Self {
        self.n_bps_points = n_bps_points;
        self
    }

    /// Set the radius of the sampling domain.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Set the dimensionality of the point space.
    pub fn with_n_dims(mut self, n_dims: usize) -> Self {
        self.n_dims = n_dims;
        self
    }

    /// Set the sampling seed.
    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// Toggle grid-sphere jitter.
    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Number of grid divisions per axis realized by [`BasisType::GridCube`].
    pub fn grid_size(&self) -> usize {
        let size = (self.n_bps_points as f64)
            .powf(1.0 / self.n_dims as f64)
            .round() as usize;
        size.max(1)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.n_bps_points == 0 {
            return Err(BpsError::InvalidConfig {
                message: "n_bps_points must be positive".to_string(),
            });
        }
        if self.n_dims == 0 {
            return Err(BpsError::InvalidConfig {
                message: "n_dims must be positive".to_string(),
            });
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(BpsError::InvalidConfig {
                message: format!("radius must be a positive finite value, got {}", self.radius),
            });
        }
        Ok(())
    }
}
