use crate::{Errors, EPS};
use anyhow::Result;
use itertools::Itertools;
use log::debug;
use ndarray::{concatenate, Array1, Array4, ArrayView4, Axis};
use std::fmt;
use std::str::FromStr;

/// Strategy that decides which channels of the patch features are kept
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    Pca,
    Sa,
    PcaSa,
    /// Keep the channels with a positive weight
    #[default]
    Reduction,
}

impl SelectionMode {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionMode::Pca => "pca",
            SelectionMode::Sa => "sa",
            SelectionMode::PcaSa => "pca_sa",
            SelectionMode::Reduction => "reduction",
        }
    }

    fn ensure_implemented(&self) -> Result<()> {
        match self {
            SelectionMode::Reduction => Ok(()),
            other => Err(Errors::UnsupportedSelectionMode(other.name().to_string()).into()),
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SelectionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pca" => Ok(SelectionMode::Pca),
            "sa" => Ok(SelectionMode::Sa),
            "pca_sa" => Ok(SelectionMode::PcaSa),
            "reduction" => Ok(SelectionMode::Reduction),
            _ => Err(Errors::UnknownSelectionMode(s.to_string()).into()),
        }
    }
}

fn selected_channels(
    layer: usize,
    feature: &Array4<f32>,
    weight: &Array1<f32>,
) -> Result<Vec<usize>> {
    let channels = feature.dim().1;
    if weight.len() != channels {
        return Err(Errors::WeightLengthMismatch {
            layer,
            weights: weight.len(),
            channels,
        }
        .into());
    }
    Ok(weight.iter().positions(|w| *w > 0.0).collect())
}

/// Keeps the channels of a single map whose weight is positive
///
pub fn feature_selection(
    feature: &Array4<f32>,
    weight: &Array1<f32>,
    mode: SelectionMode,
) -> Result<Array4<f32>> {
    mode.ensure_implemented()?;
    let channels = selected_channels(0, feature, weight)?;
    Ok(feature.select(Axis(1), &channels))
}

/// Selects and weights channels of every layer and stacks them along the channel axis.
///
/// # Parameters
/// * `features` - `(1, C_l, H, W)` patch maps; all layers must share `H` and `W`;
/// * `weights` - per-layer channel indicators, `1` keeps a channel, `0` drops it;
/// * `balance_weights` - per-layer multipliers applied to the kept channels;
/// * `mode` - only [Reduction](SelectionMode::Reduction) is implemented, other modes fail.
///
/// The number of stacked channels must equal the sum of all weights, so weights other than
/// `0`/`1` fail with [ChannelCountMismatch](Errors::ChannelCountMismatch).
///
pub fn features_selection(
    features: &[Array4<f32>],
    weights: &[Array1<f32>],
    balance_weights: &[f32],
    mode: SelectionMode,
) -> Result<Array4<f32>> {
    mode.ensure_implemented()?;

    if features.len() != weights.len() || features.len() != balance_weights.len() {
        return Err(Errors::LayerCountMismatch {
            features: features.len(),
            weights: weights.len(),
            balance: balance_weights.len(),
        }
        .into());
    }
    if features.is_empty() {
        return Err(Errors::EmptyFeatureList.into());
    }

    let mut selected = Vec::with_capacity(features.len());
    let mut expected = 0.0_f32;
    for (layer, ((feature, weight), balance)) in features
        .iter()
        .zip_eq(weights)
        .zip_eq(balance_weights)
        .enumerate()
    {
        let channels = selected_channels(layer, feature, weight)?;
        debug!(
            "Layer {}: {} of {} channels kept, balance weight {}",
            layer,
            channels.len(),
            feature.dim().1,
            balance
        );
        selected.push(feature.select(Axis(1), &channels).mapv(|v| v * balance));
        expected += weight.sum();
    }

    let views = selected.iter().map(|f| f.view()).collect::<Vec<ArrayView4<f32>>>();
    let target = concatenate(Axis(1), &views).map_err(|_| {
        let first = features[0].shape().to_vec();
        let other = features
            .iter()
            .map(|f| f.shape().to_vec())
            .find(|s| s[2..] != first[2..])
            .unwrap_or_else(|| first.clone());
        Errors::SpatialShapeMismatch(first, other)
    })?;

    let actual = target.dim().1;
    if (expected - actual as f32).abs() > EPS {
        return Err(Errors::ChannelCountMismatch { expected, actual }.into());
    }
    Ok(target)
}
