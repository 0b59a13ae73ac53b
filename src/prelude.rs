pub use crate::diagnostics::{DisplaySink, NoopDisplay, PngDisplay};
pub use crate::features::patch::{generate_patch_features, PatchFeatures, PatchLocation};
pub use crate::features::selection::{feature_selection, features_selection, SelectionMode};
pub use crate::features::{
    get_frame_features, get_subwindow_feature, FeatureExtractor, FrameFeatures, LayerSelector,
};
pub use crate::options::{Device, ExtractionOptions};
pub use crate::subwindow::grid::SamplingGrid;
pub use crate::subwindow::{crop_subwindow, get_subwindow, sample_subwindow};
pub use crate::utils::bbox::{BoundingBox, Size};
pub use crate::Errors;
