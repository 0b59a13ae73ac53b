/// Bounding boxes and sizes
pub mod bbox;

/// Clamping of sampling indices
pub mod clamp;

/// Bilinear resize for images and tensors
pub mod resize;

/// Half-up rounding
pub mod rounding;
