/// Sampling grid construction
pub mod grid;

use crate::diagnostics::{array_to_rgb_image, DisplaySink};
use crate::options::ExtractionOptions;
use crate::subwindow::grid::SamplingGrid;
use crate::utils::bbox::BoundingBox;
use crate::utils::resize::resize_image_bilinear;
use crate::Errors;
use anyhow::Result;
use log::{debug, warn};
use ndarray::{Array3, ArrayView3};

/// Window title used for the sub-window preview
pub const SUBWINDOW_TITLE: &str = "input_image";

/// Validates the `(height, width, 3)` layout and returns `(height, width)`
///
pub fn check_image<T>(image: &ArrayView3<T>) -> Result<(usize, usize)> {
    let (height, width, channels) = image.dim();
    if channels != 3 {
        return Err(Errors::InvalidImageShape(image.shape().to_vec()).into());
    }
    if height == 0 || width == 0 {
        return Err(Errors::EmptyImage(height, width).into());
    }
    Ok((height, width))
}

/// Converts an interleaved image into a channel-first tensor with `bias` subtracted
///
pub fn image_to_tensor(image: ArrayView3<u8>, bias: f32) -> Array3<f32> {
    let (height, width, channels) = image.dim();
    Array3::from_shape_fn((channels, height, width), |(c, i, j)| {
        image[[i, j, c]] as f32 - bias
    })
}

/// Samples the box out of the image at its own size, `ceil(height) x ceil(width)` pixels.
///
/// The crop is sampled with [SamplingGrid](SamplingGrid), so a box partially or fully outside
/// the frame produces repeated boundary pixels instead of an error.
///
pub fn sample_subwindow(image: ArrayView3<u8>, bbox: &BoundingBox) -> Result<Array3<u8>> {
    let (height, width) = check_image(&image)?;
    let grid = SamplingGrid::build(bbox, width, height)?;

    if bbox.x() + bbox.width() <= 0.0
        || bbox.y() + bbox.height() <= 0.0
        || bbox.x() >= width as f32
        || bbox.y() >= height as f32
    {
        warn!(
            "Box {:?} lies outside of the {}x{} frame, the sub-window repeats boundary pixels",
            bbox, width, height
        );
    }

    debug!("Sub-window {:?} sampled as {:?}", bbox, grid.shape());
    Ok(grid.gather(image))
}

/// Crops the box out of the image and resizes the crop to `out_size` (width, height)
///
pub fn crop_subwindow(
    image: ArrayView3<u8>,
    bbox: &BoundingBox,
    out_size: (usize, usize),
) -> Result<Array3<u8>> {
    let crop = sample_subwindow(image, bbox)?;
    resize_image_bilinear(crop.view(), out_size.0, out_size.1)
}

/// Crops the box, resizes it to `out_size` (width, height) and converts it to a model input
/// tensor of shape `(3, height, width)`.
///
/// When [visualize_subwindow](ExtractionOptions::visualize_subwindow) is set, the crop is
/// handed to `sink` before it is resized. Sink failures are logged and never affect the
/// returned tensor.
///
pub fn get_subwindow<S: DisplaySink + ?Sized>(
    image: ArrayView3<u8>,
    bbox: &BoundingBox,
    out_size: (usize, usize),
    options: &ExtractionOptions,
    sink: &mut S,
) -> Result<Array3<f32>> {
    let crop = sample_subwindow(image, bbox)?;

    if options.get_visualize_subwindow() {
        let shown = array_to_rgb_image(crop.view())
            .and_then(|img| sink.show(SUBWINDOW_TITLE, &img, options.get_display_timeout()));
        if let Err(e) = shown {
            warn!("Unable to display the sub-window. Error is: {:?}", e);
        }
    }

    let resized = resize_image_bilinear(crop.view(), out_size.0, out_size.1)?;
    Ok(image_to_tensor(resized.view(), options.get_pixel_bias()))
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::{DisplaySink, NoopDisplay};
    use crate::options::ExtractionOptions;
    use crate::subwindow::{
        check_image, crop_subwindow, get_subwindow, image_to_tensor, sample_subwindow,
    };
    use crate::test_stuff::gradient_image;
    use crate::utils::bbox::BoundingBox;
    use crate::{Errors, EPS};
    use anyhow::Result;
    use image::RgbImage;
    use ndarray::Array3;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingDisplay {
        shown: Vec<(String, (u32, u32), Option<Duration>)>,
    }

    impl DisplaySink for RecordingDisplay {
        fn show(
            &mut self,
            title: &str,
            image: &RgbImage,
            timeout: Option<Duration>,
        ) -> Result<()> {
            self.shown
                .push((title.to_string(), image.dimensions(), timeout));
            Ok(())
        }
    }

    struct FailingDisplay;

    impl DisplaySink for FailingDisplay {
        fn show(
            &mut self,
            _title: &str,
            _image: &RgbImage,
            _timeout: Option<Duration>,
        ) -> Result<()> {
            Err(anyhow::anyhow!("no display attached"))
        }
    }

    #[test]
    fn image_shape_checks() {
        let gray = Array3::<u8>::zeros((4, 4, 1));
        let e = check_image(&gray.view()).unwrap_err();
        assert_eq!(
            e.downcast_ref::<Errors>().unwrap(),
            &Errors::InvalidImageShape(vec![4, 4, 1])
        );

        let empty = Array3::<u8>::zeros((0, 4, 3));
        let e = check_image(&empty.view()).unwrap_err();
        assert_eq!(e.downcast_ref::<Errors>().unwrap(), &Errors::EmptyImage(0, 4));
    }

    #[test]
    fn tensor_layout_and_bias() {
        let img = gradient_image(3, 4);
        let t = image_to_tensor(img.view(), 128.0);
        assert_eq!(t.dim(), (3, 3, 4));
        for c in 0..3 {
            for i in 0..3 {
                for j in 0..4 {
                    assert!((t[[c, i, j]] - (img[[i, j, c]] as f32 - 128.0)).abs() < EPS);
                }
            }
        }
    }

    #[test]
    fn crop_without_resize() {
        let img = gradient_image(20, 20);
        let b = BoundingBox::new(10.0, 10.0, 4.0, 4.0);
        let crop = crop_subwindow(img.view(), &b, (4, 4)).unwrap();
        assert_eq!(crop.dim(), (4, 4, 3));
        assert_eq!(crop[[0, 0, 0]], img[[11, 11, 0]]);
        assert_eq!(crop[[3, 3, 1]], img[[14, 14, 1]]);
    }

    #[test]
    fn sampled_at_box_size() {
        let img = gradient_image(30, 40);
        let b = BoundingBox::new(5.0, 3.0, 10.5, 7.0);
        let crop = sample_subwindow(img.view(), &b).unwrap();
        assert_eq!(crop.dim(), (7, 11, 3));
        let resized = crop_subwindow(img.view(), &b, (11, 7)).unwrap();
        assert_eq!(crop, resized);
    }

    #[test]
    fn crop_outside_repeats_edge() {
        let img = gradient_image(10, 10);
        let b = BoundingBox::new(-5.0, -5.0, 4.0, 4.0);
        let crop = crop_subwindow(img.view(), &b, (8, 6)).unwrap();
        assert_eq!(crop.dim(), (6, 8, 3));
        for c in 0..3 {
            assert!(crop
                .index_axis(ndarray::Axis(2), c)
                .iter()
                .all(|v| *v == img[[0, 0, c]]));
        }
    }

    #[test]
    fn subwindow_tensor() {
        let img = gradient_image(30, 40);
        let b = BoundingBox::new(5.0, 3.0, 11.0, 7.0);
        let opts = ExtractionOptions::default();
        let t = get_subwindow(img.view(), &b, (16, 12), &opts, &mut NoopDisplay).unwrap();
        assert_eq!(t.dim(), (3, 12, 16));
        let crop = crop_subwindow(img.view(), &b, (16, 12)).unwrap();
        assert!((t[[2, 5, 7]] - (crop[[5, 7, 2]] as f32 - 128.0)).abs() < EPS);
    }

    #[test]
    fn visualization_does_not_change_tensor() {
        let img = gradient_image(30, 40);
        let b = BoundingBox::new(5.0, 3.0, 11.0, 7.0);
        let plain = ExtractionOptions::default();
        let shown = plain.clone().visualize_subwindow(true);

        let mut recorder = RecordingDisplay::default();
        let t1 = get_subwindow(img.view(), &b, (16, 12), &plain, &mut recorder).unwrap();
        assert!(recorder.shown.is_empty());

        let t2 = get_subwindow(img.view(), &b, (16, 12), &shown, &mut recorder).unwrap();
        assert_eq!(t1, t2);
        assert_eq!(recorder.shown.len(), 1);
        assert_eq!(recorder.shown[0].0, "input_image");
        // the crop is shown at the sampled size, before resizing
        assert_eq!(recorder.shown[0].1, (11, 7));
        assert_eq!(recorder.shown[0].2, Some(Duration::from_secs(10)));

        let t3 = get_subwindow(img.view(), &b, (16, 12), &shown, &mut FailingDisplay).unwrap();
        assert_eq!(t1, t3);
    }
}
