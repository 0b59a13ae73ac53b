//! Sub-window sampling and multi-scale feature patch alignment for deep visual object trackers.
//!
//! The crate turns a frame and a target box into the tensors a correlation tracker consumes:
//! a normalized sub-window, per-layer feature maps cropped to a common physical footprint and
//! a channel-selected, balance-weighted feature stack.
//!
pub mod diagnostics;
pub mod features;
pub mod options;
pub mod prelude;
pub mod subwindow;
pub mod test_stuff;
pub mod utils;

#[cfg(feature = "python")]
pub mod py;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
    #[error("Box must have positive width and height, got width={0}, height={1}.")]
    InvalidBox(f32, f32),
    #[error("Image must have non-zero dimensions, got height={0}, width={1}.")]
    EmptyImage(usize, usize),
    #[error("Image must have shape (height, width, 3), got {0:?}.")]
    InvalidImageShape(Vec<usize>),
    #[error("Feature map of layer {0} must have shape (1, C, H, W) with non-empty spatial dimensions, got {1:?}.")]
    InvalidFeatureShape(usize, Vec<usize>),
    #[error("Feature maps of all layers must share the spatial shape, got {0:?} and {1:?}.")]
    SpatialShapeMismatch(Vec<usize>, Vec<usize>),
    #[error("Patch {location:?} of layer {layer} exceeds the feature map of size {height}x{width}.")]
    PatchOutOfBounds {
        layer: usize,
        location: [i64; 4],
        height: usize,
        width: usize,
    },
    #[error("Unknown selection mode '{0}', expected 'pca', 'sa', 'pca_sa' or 'reduction'.")]
    UnknownSelectionMode(String),
    #[error("Selection mode '{0}' is not implemented, only 'reduction' is available.")]
    UnsupportedSelectionMode(String),
    #[error("No feature maps were supplied.")]
    EmptyFeatureList,
    #[error("Layer count mismatch: {features} feature maps, {weights} channel weights, {balance} balance weights.")]
    LayerCountMismatch {
        features: usize,
        weights: usize,
        balance: usize,
    },
    #[error("Channel weights of layer {layer} have {weights} entries, the feature map has {channels} channels.")]
    WeightLengthMismatch {
        layer: usize,
        weights: usize,
        channels: usize,
    },
    #[error("Selected {actual} channels, but the channel weights account for {expected}.")]
    ChannelCountMismatch { expected: f32, actual: usize },
}

pub(crate) const EPS: f32 = 0.00001;

/// Approximate equality for float based values
///
pub trait EstimateClose {
    fn almost_same(&self, other: &Self, eps: f32) -> bool;
}
