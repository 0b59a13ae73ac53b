use crate::diagnostics::{channel_heatmap, tensor_show, DisplaySink, TensorDisplay};
use crate::features::check_feature_maps;
use crate::utils::bbox::{BoundingBox, Size};
use crate::utils::rounding::round_half_up;
use crate::Errors;
use anyhow::Result;
use log::{debug, warn};
use nalgebra::Vector2;
use ndarray::{s, Array4};
use std::time::Duration;

/// How long the patch heatmap stays on a blocking sink
const PATCH_HEATMAP_TIMEOUT: Duration = Duration::from_secs(100);

/// Inclusive feature-space crop bounds `(r0, c0, r1, c1)`
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatchLocation {
    pub r0: i64,
    pub c0: i64,
    pub r1: i64,
    pub c1: i64,
}

impl PatchLocation {
    pub fn height(&self) -> i64 {
        self.r1 - self.r0 + 1
    }

    pub fn width(&self) -> i64 {
        self.c1 - self.c0 + 1
    }

    /// Center as `(row, col)`
    ///
    pub fn center(&self) -> (i64, i64) {
        ((self.r0 + self.r1) / 2, (self.c0 + self.c1) / 2)
    }

    /// Whether the patch lies within a `height x width` map
    ///
    pub fn fits(&self, height: usize, width: usize) -> bool {
        self.r0 >= 0 && self.c0 >= 0 && self.r1 < height as i64 && self.c1 < width as i64
    }

    pub fn as_array(&self) -> [i64; 4] {
        [self.r0, self.c0, self.r1, self.c1]
    }
}

/// Cropped maps and the locations they were cropped at, in the order of the input layers
///
#[derive(Debug, Clone)]
pub struct PatchFeatures {
    pub features: Vec<Array4<f32>>,
    pub locations: Vec<PatchLocation>,
}

#[inline]
fn rows_cols(height: usize, width: usize) -> Vector2<f64> {
    Vector2::new(height as f64, width as f64)
}

/// Center of a `height x width` map as `(row, col)`, using half-up rounding
///
pub fn feature_center(height: usize, width: usize) -> Vector2<i64> {
    rows_cols(height, width)
        .map(|v| round_half_up(v / 2.0) - 1.0)
        .map(|v| v as i64)
}

/// Odd patch extent `(rows, cols)` covering the target in a `height x width` map.
///
/// The components are paired by position: the row extent is `target.width * height /
/// search.width` and the column extent is `target.height * width / search.height`, each
/// rounded down to the nearest odd number (at least `1`).
///
pub fn patch_size(
    target_size: &Size,
    search_window: &BoundingBox,
    height: usize,
    width: usize,
) -> Vector2<i64> {
    let ratio = target_size
        .as_vector()
        .component_mul(&rows_cols(height, width))
        .component_div(&search_window.size().as_vector());
    ratio.map(|v| ((v / 2.0).floor() * 2.0 + 1.0) as i64)
}

/// Patch of a `height x width` map aligned with the target, no bounds checking
///
pub fn patch_location(
    target_size: &Size,
    search_window: &BoundingBox,
    height: usize,
    width: usize,
) -> PatchLocation {
    let center = feature_center(height, width);
    let half = patch_size(target_size, search_window, height, width).map(|v| v / 2);
    PatchLocation {
        r0: center.x - half.x,
        c0: center.y - half.y,
        r1: center.x + half.x,
        c1: center.y + half.y,
    }
}

/// Crops every map to the patch covering the target.
///
/// # Parameters
/// * `target_size` - size of the tracked object in frame pixels;
/// * `search_window` - the box the maps were extracted from;
/// * `features` - `(1, C, H, W)` maps, one per layer.
///
/// Patches are never clamped: when a patch exceeds its map (the target is too large for the
/// search window) the call fails with [PatchOutOfBounds](Errors::PatchOutOfBounds).
///
pub fn generate_patch_features(
    target_size: &Size,
    search_window: &BoundingBox,
    features: &[Array4<f32>],
) -> Result<PatchFeatures> {
    check_feature_maps(features)?;

    let mut patch_features = Vec::with_capacity(features.len());
    let mut patch_locations = Vec::with_capacity(features.len());

    for (layer, feature) in features.iter().enumerate() {
        let (_, _, height, width) = feature.dim();
        let loc = patch_location(target_size, search_window, height, width);
        if !loc.fits(height, width) {
            return Err(Errors::PatchOutOfBounds {
                layer,
                location: loc.as_array(),
                height,
                width,
            }
            .into());
        }
        debug!(
            "Layer {} of size {}x{}: patch {:?}",
            layer, height, width, loc
        );

        let (r0, c0, r1, c1) = (loc.r0 as usize, loc.c0 as usize, loc.r1 as usize, loc.c1 as usize);
        patch_features.push(feature.slice(s![.., .., r0..=r1, c0..=c1]).to_owned());
        patch_locations.push(loc);
    }

    Ok(PatchFeatures {
        features: patch_features,
        locations: patch_locations,
    })
}

/// Same as [generate_patch_features](generate_patch_features), additionally shows the summed
/// patch activations on `sink`.
///
/// The heatmap needs all patches to share the spatial shape; when they don't, it is skipped
/// with a warning and the patches are still returned.
///
pub fn generate_patch_features_with_sink<S: DisplaySink + ?Sized>(
    target_size: &Size,
    search_window: &BoundingBox,
    features: &[Array4<f32>],
    sink: &mut S,
) -> Result<PatchFeatures> {
    let patches = generate_patch_features(target_size, search_window, features)?;
    let shown = channel_heatmap(&patches.features).and_then(|heat| {
        tensor_show(
            TensorDisplay::Feature(heat.view()),
            None,
            PATCH_HEATMAP_TIMEOUT,
            sink,
        )
    });
    if let Err(e) = shown {
        warn!("Unable to display the patch heatmap. Error is: {:?}", e);
    }
    Ok(patches)
}
