use crate::utils::bbox::BoundingBox;
use crate::utils::clamp::clamp_indices;
use crate::Errors;
use anyhow::Result;
use itertools::iproduct;
use ndarray::{Array3, ArrayView3};

/// Integer sampling coordinates along one axis, before clamping.
///
/// Produces `ceil(size)` consecutive coordinates `floor(center + k - ceil(size / 2))` for
/// `k = 1..=ceil(size)`. For even sizes the extra pixel lands after the center.
///
pub fn axis_indices(center: f64, size: f64) -> Vec<i64> {
    let count = size.ceil() as i64;
    let shift = (size / 2.0).ceil();
    (1..=count)
        .map(|k| (center + k as f64 - shift).floor() as i64)
        .collect()
}

/// Row and column indices used to crop a box out of an image.
///
/// The full grid is the outer product of `rows` and `cols`: sample `(i, j)` reads the pixel
/// at `(rows[i], cols[j])`. All indices are clamped into the image, so boxes crossing or
/// leaving the frame repeat the boundary pixels.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingGrid {
    rows: Vec<usize>,
    cols: Vec<usize>,
}

impl SamplingGrid {
    /// Builds the grid for `bbox` over an image of `image_width x image_height` pixels
    ///
    pub fn build(bbox: &BoundingBox, image_width: usize, image_height: usize) -> Result<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(Errors::EmptyImage(image_height, image_width).into());
        }

        let center = bbox.center();
        let cols = axis_indices(center.x, bbox.width() as f64);
        let rows = axis_indices(center.y, bbox.height() as f64);

        let cols = clamp_indices(&cols, 0, image_width as i64 - 1);
        let rows = clamp_indices(&rows, 0, image_height as i64 - 1);

        Ok(Self {
            rows: rows.into_iter().map(|v| v as usize).collect(),
            cols: cols.into_iter().map(|v| v as usize).collect(),
        })
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    /// Grid shape as `(rows, cols)`
    ///
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    /// All `(row, col)` pairs in row-major order
    ///
    pub fn points(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        iproduct!(self.rows.iter().copied(), self.cols.iter().copied())
    }

    /// Gathers the pixels of every channel at the grid points.
    ///
    /// The image must be at least as large as the one the grid was built for.
    ///
    pub fn gather<T: Copy>(&self, image: ArrayView3<T>) -> Array3<T> {
        let (rows, cols) = self.shape();
        let channels = image.dim().2;
        Array3::from_shape_fn((rows, cols, channels), |(i, j, c)| {
            image[[self.rows[i], self.cols[j], c]]
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::subwindow::grid::{axis_indices, SamplingGrid};
    use crate::test_stuff::BoxGen;
    use crate::utils::bbox::BoundingBox;
    use crate::Errors;
    use ndarray::Array3;

    #[test]
    fn odd_axis() {
        // center 12.5, covers pixels 10..=14
        assert_eq!(axis_indices(12.5, 5.0), vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn even_axis() {
        // the extra pixel goes after the center
        assert_eq!(axis_indices(12.0, 4.0), vec![11, 12, 13, 14]);
    }

    #[test]
    fn fractional_axis() {
        // numpy arange(1, 3.5 + 1) yields four offsets
        assert_eq!(axis_indices(5.0, 3.5), vec![4, 5, 6, 7]);
    }

    #[test]
    fn grid_shape() {
        let b = BoundingBox::new(2.0, 2.0, 5.0, 3.0);
        let g = SamplingGrid::build(&b, 20, 20).unwrap();
        assert_eq!(g.shape(), (3, 5));
        assert_eq!(g.points().count(), 15);
    }

    #[test]
    fn even_box_indices() {
        let b = BoundingBox::new(10.0, 10.0, 4.0, 4.0);
        let g = SamplingGrid::build(&b, 32, 32).unwrap();
        assert_eq!(g.cols(), &[11, 12, 13, 14]);
        assert_eq!(g.rows(), &[11, 12, 13, 14]);
    }

    #[test]
    fn boundary_clamp() {
        let b = BoundingBox::new(-5.0, -5.0, 4.0, 4.0);
        let g = SamplingGrid::build(&b, 10, 10).unwrap();
        assert_eq!(g.cols(), &[0, 0, 0, 0]);
        assert_eq!(g.rows(), &[0, 0, 0, 0]);

        let img = Array3::from_shape_fn((10, 10, 3), |(i, j, c)| (i * 10 + j + c) as u8);
        let crop = g.gather(img.view());
        assert_eq!(crop.dim(), (4, 4, 3));
        for c in 0..3 {
            assert!(crop
                .index_axis(ndarray::Axis(2), c)
                .iter()
                .all(|v| *v == c as u8));
        }
    }

    #[test]
    fn partially_outside() {
        let b = BoundingBox::new(7.0, 1.0, 6.0, 2.0);
        let g = SamplingGrid::build(&b, 10, 10).unwrap();
        assert_eq!(g.cols(), &[8, 9, 9, 9, 9, 9]);
        assert_eq!(g.rows(), &[2, 3]);
    }

    #[test]
    fn outer_pairing() {
        let b = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let g = SamplingGrid::build(&b, 10, 10).unwrap();
        assert_eq!(
            g.points().collect::<Vec<_>>(),
            vec![(1, 1), (1, 2), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn empty_image() {
        let b = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let e = SamplingGrid::build(&b, 0, 10).unwrap_err();
        assert_eq!(e.downcast_ref::<Errors>().unwrap(), &Errors::EmptyImage(10, 0));
    }

    #[test]
    fn random_boxes_stay_inside() {
        let boxes = BoxGen::new(5.0, 5.0, 20.0, 12.0, 15.0, 3.0);
        for b in boxes.take(300) {
            let g = SamplingGrid::build(&b, 40, 30).unwrap();
            assert_eq!(g.shape().1, b.width().ceil() as usize);
            assert_eq!(g.shape().0, b.height().ceil() as usize);
            assert!(g.cols().iter().all(|c| *c < 40));
            assert!(g.rows().iter().all(|r| *r < 30));
        }
    }
}
