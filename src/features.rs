//! Feature channel selection and the typed encode output.

use burn::prelude::*;

/// A feature channel derivable from the basis-to-input correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    /// Euclidean distance from each basis point to its nearest input point.
    Dists,
    /// Vector offset from each basis point to its nearest input point.
    Deltas,
    /// Coordinates of the nearest input point for each basis point.
    Closest,
    /// Caller-supplied per-point data gathered at the nearest-neighbor
    /// indices (requires `x_features`).
    Features,
}

/// The encoder output: one tensor per requested channel.
///
/// Every optional channel is `Some` exactly when it was requested. The
/// point-cloud encoder always populates `ids`; the mesh encoder has no
/// point correspondence and leaves it `None`.
#[derive(Debug, Clone)]
pub struct BpsFeatures<B: Backend> {
    /// Index of the nearest input point per basis point, `[N, P]`.
    pub ids: Option<Tensor<B, 2, Int>>,
    /// Scalar distance per basis point, `[N, P]`.
    pub dists: Option<Tensor<B, 2>>,
    /// Vector offset per basis point, `[N, P, D]`.
    pub deltas: Option<Tensor<B, 3>>,
    /// Nearest input point coordinates per basis point, `[N, P, D]`.
    pub closest: Option<Tensor<B, 3>>,
    /// Gathered per-point side-channel data, `[N, P, F]`.
    pub features: Option<Tensor<B, 3>>,
}

impl<B: Backend> BpsFeatures<B> {
    pub(crate) fn empty() -> Self {
        Self {
            ids: None,
            dists: None,
            deltas: None,
            closest: None,
            features: None,
        }
    }
}

/// Per-call options for an encode invocation.
///
/// The default requests only [`FeatureType::Dists`].
#[derive(Debug, Clone)]
pub struct EncodeOptions<B: Backend> {
    /// Requested feature channels.
    pub feature_types: Vec<FeatureType>,
    /// Per-point side-channel data aligned with the input cloud,
    /// `[N, P_x, F]`. Required when [`FeatureType::Features`] is requested.
    pub x_features: Option<Tensor<B, 3>>,
    /// One-off basis override, `[1-or-N, P, D]`. Never persisted on the
    /// [`Bps`](crate::encoder::Bps) object.
    pub custom_basis: Option<Tensor<B, 3>>,
}

impl<B: Backend> Default for EncodeOptions<B> {
    fn default() -> Self {
        Self {
            feature_types: vec![FeatureType::Dists],
            x_features: None,
            custom_basis: None,
        }
    }
}

impl<B: Backend> EncodeOptions<B> {
    /// Options with the default `dists` channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of requested channels.
    pub fn with_feature_types(mut self, feature_types: Vec<FeatureType>) -> Self {
        self.feature_types = feature_types;
        self
    }

    /// Supply per-point side-channel data for [`FeatureType::Features`].
    pub fn with_x_features(mut self, x_features: Tensor<B, 3>) -> Self {
        self.x_features = Some(x_features);
        self
    }

    /// Override the basis for this call only.
    pub fn with_custom_basis(mut self, custom_basis: Tensor<B, 3>) -> Self {
        self.custom_basis = Some(custom_basis);
        self
    }

    pub(crate) fn wants(&self, feature: FeatureType) -> bool {
        self.feature_types.contains(&feature)
    }
}
