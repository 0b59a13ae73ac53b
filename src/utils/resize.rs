use crate::Errors;
use anyhow::Result;
use fast_image_resize as fr;
use ndarray::{Array3, Array4, ArrayView3, ArrayView4};

/// Source sampling position for a single destination coordinate.
///
/// `lo` and `hi` are the neighbouring source indices, `frac` is the weight of `hi`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f32,
}

fn axis_taps(src_len: usize, dst_len: usize, align_corners: bool) -> Vec<Tap> {
    let last = src_len - 1;
    (0..dst_len)
        .map(|d| {
            let pos = if align_corners {
                if dst_len > 1 {
                    d as f64 * last as f64 / (dst_len - 1) as f64
                } else {
                    0.0
                }
            } else {
                ((d as f64 + 0.5) * src_len as f64 / dst_len as f64 - 0.5).max(0.0)
            };
            let lo = (pos.floor() as usize).min(last);
            let hi = (lo + 1).min(last);
            let frac = if lo == last { 0.0 } else { (pos - lo as f64) as f32 };
            Tap { lo, hi, frac }
        })
        .collect()
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn pixel_type(channels: usize) -> Option<fr::PixelType> {
    match channels {
        1 => Some(fr::PixelType::U8),
        2 => Some(fr::PixelType::U8x2),
        3 => Some(fr::PixelType::U8x3),
        4 => Some(fr::PixelType::U8x4),
        _ => None,
    }
}

/// Bilinear resize of an interleaved `(height, width, channels)` image.
///
/// Uses `fast_image_resize` bilinear interpolation without kernel widening on downscale, which
/// follows OpenCV's `INTER_LINEAR`: half-pixel sample centers and replicated edges. When the
/// size is unchanged the image is copied unchanged.
///
pub fn resize_image_bilinear(
    image: ArrayView3<u8>,
    width: usize,
    height: usize,
) -> Result<Array3<u8>> {
    let (src_h, src_w, channels) = image.dim();
    if src_h == 0 || src_w == 0 {
        return Err(Errors::EmptyImage(src_h, src_w).into());
    }
    if width == 0 || height == 0 {
        return Err(Errors::EmptyImage(height, width).into());
    }
    if (src_h, src_w) == (height, width) {
        return Ok(image.to_owned());
    }
    let pixels = pixel_type(channels)
        .ok_or_else(|| Errors::InvalidImageShape(image.shape().to_vec()))?;

    let src_image = fr::images::Image::from_vec_u8(
        src_w as u32,
        src_h as u32,
        image.iter().copied().collect(),
        pixels,
    )?;
    let mut dst_image = fr::images::Image::new(width as u32, height as u32, pixels);

    let mut resizer = fr::Resizer::new();
    resizer.resize(
        &src_image,
        &mut dst_image,
        &fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Interpolation(fr::FilterType::Bilinear)),
    )?;

    Ok(Array3::from_shape_vec(
        (height, width, channels),
        dst_image.into_vec(),
    )?)
}

/// Bilinear resize of the spatial axes of an NCHW tensor.
///
/// # Parameters
/// * `size` - target `(height, width)`;
/// * `align_corners` - when `true` the corner samples of input and output are aligned,
///   otherwise half-pixel centers are used.
///
pub fn resize_tensor(
    input: ArrayView4<f32>,
    size: (usize, usize),
    align_corners: bool,
) -> Result<Array4<f32>> {
    let (n, c, src_h, src_w) = input.dim();
    if src_h == 0 || src_w == 0 {
        return Err(Errors::EmptyImage(src_h, src_w).into());
    }
    let (height, width) = size;
    let rows = axis_taps(src_h, height, align_corners);
    let cols = axis_taps(src_w, width, align_corners);

    Ok(Array4::from_shape_fn((n, c, height, width), |(b, ch, i, j)| {
        let (r, q) = (rows[i], cols[j]);
        let top = lerp(input[[b, ch, r.lo, q.lo]], input[[b, ch, r.lo, q.hi]], q.frac);
        let bottom = lerp(input[[b, ch, r.hi, q.lo]], input[[b, ch, r.hi, q.hi]], q.frac);
        lerp(top, bottom, r.frac)
    }))
}
