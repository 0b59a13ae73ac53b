/// Feature-space patch alignment
pub mod patch;

/// Channel selection and balance weighting
pub mod selection;

use crate::diagnostics::NoopDisplay;
use crate::options::{Device, ExtractionOptions};
use crate::subwindow::{check_image, get_subwindow, image_to_tensor};
use crate::utils::bbox::BoundingBox;
use crate::Errors;
use anyhow::Result;
use log::debug;
use ndarray::{Array3, Array4, ArrayView3, ArrayView4, Axis};

/// Layers of the model whose activations are requested
///
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LayerSelector {
    /// Every layer the model exposes by default
    #[default]
    All,
    /// Layers by name, in the order the maps are expected back
    Named(Vec<String>),
}

impl LayerSelector {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LayerSelector::Named(names.into_iter().map(Into::into).collect())
    }
}

/// Convolutional feature extractor.
///
/// The implementor receives an NCHW tensor with batch `1` and returns one `(1, C, H, W)`
/// map per requested layer. The crate never modifies the returned maps.
///
pub trait FeatureExtractor {
    fn extract(
        &self,
        input: ArrayView4<f32>,
        layers: &LayerSelector,
        device: &Device,
    ) -> Result<Vec<Array4<f32>>>;
}

/// Whole-frame features together with the frame tensor they were computed from
///
#[derive(Debug, Clone)]
pub struct FrameFeatures {
    /// `(3, height, width)` frame with the pixel bias subtracted
    pub frame: Array3<f32>,
    pub features: Vec<Array4<f32>>,
}

/// Checks that every map is a non-empty `(1, C, H, W)` tensor
///
pub fn check_feature_maps(features: &[Array4<f32>]) -> Result<()> {
    for (layer, f) in features.iter().enumerate() {
        let (batch, _, height, width) = f.dim();
        if batch != 1 || height == 0 || width == 0 {
            return Err(Errors::InvalidFeatureShape(layer, f.shape().to_vec()).into());
        }
    }
    Ok(())
}

fn run_model<M: FeatureExtractor + ?Sized>(
    model: &M,
    tensor: Array3<f32>,
    layers: &LayerSelector,
    options: &ExtractionOptions,
) -> Result<Vec<Array4<f32>>> {
    let input = tensor.insert_axis(Axis(0));
    let features = model.extract(input.view(), layers, options.get_device())?;
    check_feature_maps(&features)?;
    debug!(
        "Extracted {} feature maps on {:?}: {:?}",
        features.len(),
        options.get_device(),
        features.iter().map(|f| f.shape().to_vec()).collect::<Vec<_>>()
    );
    Ok(features)
}

/// Extracts the features of the sub-window defined by `location`.
///
/// # Parameters
/// * `model` - the extractor;
/// * `image` - `(height, width, 3)` frame;
/// * `location` - sub-window in the frame;
/// * `input_size` - model input `(width, height)` the sub-window is resized to;
/// * `layers` - the layers to return.
///
pub fn get_subwindow_feature<M: FeatureExtractor + ?Sized>(
    model: &M,
    image: ArrayView3<u8>,
    location: &BoundingBox,
    input_size: (usize, usize),
    layers: &LayerSelector,
    options: &ExtractionOptions,
) -> Result<Vec<Array4<f32>>> {
    let window_options = options.clone().visualize_subwindow(false);
    let subwindow = get_subwindow(image, location, input_size, &window_options, &mut NoopDisplay)?;
    run_model(model, subwindow, layers, options)
}

/// Extracts the features of the whole frame.
///
/// Returns the biased channel-first frame along with the maps, so the caller can reuse the
/// pixel-aligned tensor.
///
pub fn get_frame_features<M: FeatureExtractor + ?Sized>(
    model: &M,
    image: ArrayView3<u8>,
    layers: &LayerSelector,
    options: &ExtractionOptions,
) -> Result<FrameFeatures> {
    check_image(&image)?;
    let frame = image_to_tensor(image, options.get_pixel_bias());
    let features = run_model(model, frame.clone(), layers, options)?;
    Ok(FrameFeatures { frame, features })
}
