use crate::subwindow::{check_image, crop_subwindow};
use crate::utils::bbox::BoundingBox;
use crate::utils::resize::resize_tensor;
use crate::{Errors, EPS};
use anyhow::Result;
use image::{Rgb, RgbImage};
use log::debug;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use std::path::PathBuf;
use std::time::Duration;

/// Channel means of ImageNet-normalized tensors
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Channel standard deviations of ImageNet-normalized tensors
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Window title of the heatmap overlay
pub const HEATMAP_TITLE: &str = "Combination";

/// Outline color of boxes drawn over tensors
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Receiver of diagnostic images.
///
/// Interactive implementations may block for up to `timeout` (forever when `None`); that is
/// the only blocking path of the crate and it is never reached unless the caller passes a
/// sink that blocks.
///
pub trait DisplaySink {
    fn show(&mut self, title: &str, image: &RgbImage, timeout: Option<Duration>) -> Result<()>;
}

/// Sink that drops every image
///
#[derive(Default, Clone, Debug)]
pub struct NoopDisplay;

impl DisplaySink for NoopDisplay {
    fn show(&mut self, _title: &str, _image: &RgbImage, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}

/// Sink that writes every image as `<dir>/<counter>_<title>.png` and never blocks
///
#[derive(Clone, Debug)]
pub struct PngDisplay {
    dir: PathBuf,
    counter: usize,
}

impl PngDisplay {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            counter: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.counter
    }
}

impl DisplaySink for PngDisplay {
    fn show(&mut self, title: &str, image: &RgbImage, _timeout: Option<Duration>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("{:05}_{}.png", self.counter, title.replace(' ', "_")));
        image.save(&path)?;
        debug!("Diagnostic image '{}' written to {:?}", title, path);
        self.counter += 1;
        Ok(())
    }
}

/// Copies a `(height, width, 3)` array into an image
///
pub fn array_to_rgb_image(image: ArrayView3<u8>) -> Result<RgbImage> {
    let (height, width) = check_image(&image)?;
    Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (i, j) = (y as usize, x as usize);
        Rgb([image[[i, j, 0]], image[[i, j, 1]], image[[i, j, 2]]])
    }))
}

/// Maps an intensity to the JET palette (blue - cyan - yellow - red)
///
pub fn jet(value: u8) -> Rgb<u8> {
    let v = value as f32 / 255.0;
    let channel = |offset: f32| {
        let c = (1.5 - (4.0 * v - offset).abs()).clamp(0.0, 1.0);
        (c * 255.0).round() as u8
    };
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Sums all channels of all layers and scales the result by its maximum.
///
/// Layers must share the spatial shape. An all-zero map is returned unscaled.
///
pub fn channel_heatmap(features: &[ndarray::Array4<f32>]) -> Result<Array2<f32>> {
    let first = features.first().ok_or(Errors::EmptyFeatureList)?;
    let (_, _, height, width) = first.dim();

    let mut heat = Array2::<f32>::zeros((height, width));
    for (layer, f) in features.iter().enumerate() {
        let (batch, _, h, w) = f.dim();
        if batch != 1 {
            return Err(Errors::InvalidFeatureShape(layer, f.shape().to_vec()).into());
        }
        if (h, w) != (height, width) {
            return Err(
                Errors::SpatialShapeMismatch(first.shape().to_vec(), f.shape().to_vec()).into(),
            );
        }
        heat += &f.index_axis(Axis(0), 0).sum_axis(Axis(0));
    }

    let max = heat.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max.abs() > EPS {
        heat.mapv_inplace(|v| v / max);
    }
    Ok(heat)
}

/// Resizes a `[0, 1]` heatmap to `width x height` and colors it with [jet](jet)
///
pub fn heatmap_to_rgb(heat: ArrayView2<f32>, width: usize, height: usize) -> Result<RgbImage> {
    let (h, w) = heat.dim();
    let resized = resize_tensor(
        heat.into_shape((1, 1, h, w))?,
        (height, width),
        false,
    )?;
    Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let v = (255.0 * resized[[0, 0, y as usize, x as usize]]).clamp(0.0, 255.0);
        jet(v as u8)
    }))
}

/// Weighted sum of two images of the same size, saturated to `u8`
///
pub fn blend(base: &RgbImage, overlay: &RgbImage, alpha: f32, beta: f32) -> RgbImage {
    RgbImage::from_fn(base.width(), base.height(), |x, y| {
        let Rgb(b) = *base.get_pixel(x, y);
        let Rgb(o) = *overlay.get_pixel(x, y);
        let mix = |i: usize| {
            (alpha * b[i] as f32 + beta * o[i] as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb([mix(0), mix(1), mix(2)])
    })
}

/// Renders the summed feature activations over the image they were computed from.
///
/// With `location` the base image is the sub-window of that box resized to `input_size`
/// (width, height); without it the whole frame is used. The overlay is 60% image and 40%
/// heatmap. The result is shown on `sink` and returned.
///
pub fn show_heatmap_over_image<S: DisplaySink + ?Sized>(
    location: Option<&BoundingBox>,
    image: ArrayView3<u8>,
    input_size: (usize, usize),
    features: &[ndarray::Array4<f32>],
    sink: &mut S,
) -> Result<RgbImage> {
    let base = match location {
        Some(bbox) => array_to_rgb_image(crop_subwindow(image, bbox, input_size)?.view())?,
        None => array_to_rgb_image(image)?,
    };
    let heat = channel_heatmap(features)?;
    let colored = heatmap_to_rgb(heat.view(), base.width() as usize, base.height() as usize)?;
    let overlay = blend(&base, &colored, 0.6, 0.4);
    sink.show(HEATMAP_TITLE, &overlay, None)?;
    Ok(overlay)
}

/// Reverts ImageNet normalization of a `(3, height, width)` tensor and clips it to `[0, 1]`
///
pub fn unnormalize(tensor: ArrayView3<f32>) -> Result<Array3<f32>> {
    let (channels, height, width) = tensor.dim();
    if channels != 3 {
        return Err(Errors::InvalidImageShape(tensor.shape().to_vec()).into());
    }
    Ok(Array3::from_shape_fn((channels, height, width), |(c, i, j)| {
        (tensor[[c, i, j]] * IMAGENET_STD[c] + IMAGENET_MEAN[c]).clamp(0.0, 1.0)
    }))
}

/// Tensor to display with [tensor_show](tensor_show)
///
#[derive(Debug, Clone)]
pub enum TensorDisplay<'a> {
    /// ImageNet-normalized `(3, height, width)` tensor
    Normalized(ArrayView3<'a, f32>),
    /// `(3, height, width)` tensor with values in `[0, 1]`
    Raw(ArrayView3<'a, f32>),
    /// Single-channel feature map, min-max scaled and colored with [jet](jet)
    Feature(ArrayView2<'a, f32>),
}

fn unit_tensor_to_image(tensor: ArrayView3<f32>) -> Result<RgbImage> {
    let (channels, height, width) = tensor.dim();
    if channels != 3 {
        return Err(Errors::InvalidImageShape(tensor.shape().to_vec()).into());
    }
    Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (i, j) = (y as usize, x as usize);
        let px = |c: usize| (tensor[[c, i, j]].clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb([px(0), px(1), px(2)])
    }))
}

fn feature_to_image(map: ArrayView2<f32>) -> RgbImage {
    let (height, width) = map.dim();
    let (lo, hi) = map
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let range = if hi - lo > EPS { hi - lo } else { 1.0 };
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let v = (map[[y as usize, x as usize]] - lo) / range;
        jet((v.clamp(0.0, 1.0) * 255.0).round() as u8)
    })
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let x0 = bbox.x().round() as i64;
    let y0 = bbox.y().round() as i64;
    let x1 = (bbox.x() + bbox.width()).round() as i64 - 1;
    let y1 = (bbox.y() + bbox.height()).round() as i64 - 1;

    let mut put = |x: i64, y: i64| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            image.put_pixel(x as u32, y as u32, BOX_COLOR);
        }
    };
    for x in x0..=x1 {
        put(x, y0);
        put(x, y1);
    }
    for y in y0..=y1 {
        put(x0, y);
        put(x1, y);
    }
}

/// Renders a tensor, optionally outlines `bbox` on it and shows it on `sink` for `timeout`
///
pub fn tensor_show<S: DisplaySink + ?Sized>(
    tensor: TensorDisplay<'_>,
    bbox: Option<&BoundingBox>,
    timeout: Duration,
    sink: &mut S,
) -> Result<RgbImage> {
    let mut image = match tensor {
        TensorDisplay::Normalized(t) => unit_tensor_to_image(unnormalize(t)?.view())?,
        TensorDisplay::Raw(t) => unit_tensor_to_image(t)?,
        TensorDisplay::Feature(m) => feature_to_image(m),
    };
    if let Some(b) = bbox {
        draw_box(&mut image, b);
    }
    sink.show("tensor", &image, Some(timeout))?;
    Ok(image)
}
