use crate::{Errors, EstimateClose};
use anyhow::Result;
use nalgebra::Vector2;

/// Bounding box in the format (x, y, width, height), in image pixels
///
/// `x` and `y` define the top-left corner. Width and height are always positive.
///
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct BoundingBox {
    _x: f32,
    _y: f32,
    _width: f32,
    _height: f32,
}

impl BoundingBox {
    /// Constructor
    ///
    /// # Panics
    /// When `width` or `height` is not positive. Use [try_new](BoundingBox::try_new) to get an
    /// error instead.
    ///
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "Box width and height must be positive"
        );
        Self {
            _x: x,
            _y: y,
            _width: width,
            _height: height,
        }
    }

    /// Fallible constructor
    ///
    pub fn try_new(x: f32, y: f32, width: f32, height: f32) -> Result<Self> {
        if width > 0.0 && height > 0.0 {
            Ok(Self {
                _x: x,
                _y: y,
                _width: width,
                _height: height,
            })
        } else {
            Err(Errors::InvalidBox(width, height).into())
        }
    }

    pub fn x(&self) -> f32 {
        self._x
    }

    pub fn y(&self) -> f32 {
        self._y
    }

    pub fn width(&self) -> f32 {
        self._width
    }

    pub fn height(&self) -> f32 {
        self._height
    }

    pub fn size(&self) -> Size {
        Size::new(self._width, self._height)
    }

    /// Geometric center as `(x, y)`
    ///
    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(
            self._x as f64 + self._width as f64 / 2.0,
            self._y as f64 + self._height as f64 / 2.0,
        )
    }

    /// Box with the same center and the size multiplied by `scale`
    ///
    pub fn scaled(&self, scale: f32) -> Result<Self> {
        let width = self._width * scale;
        let height = self._height * scale;
        Self::try_new(
            self._x + (self._width - width) / 2.0,
            self._y + (self._height - height) / 2.0,
            width,
            height,
        )
    }
}

impl EstimateClose for BoundingBox {
    /// Allows comparing bboxes
    ///
    fn almost_same(&self, other: &Self, eps: f32) -> bool {
        (self._x - other._x).abs() < eps
            && (self._y - other._y).abs() < eps
            && (self._width - other._width).abs() < eps
            && (self._height - other._height).abs() < eps
    }
}

impl TryFrom<[f32; 4]> for BoundingBox {
    type Error = anyhow::Error;

    fn try_from(v: [f32; 4]) -> Result<Self> {
        Self::try_new(v[0], v[1], v[2], v[3])
    }
}

impl From<&BoundingBox> for [f32; 4] {
    fn from(b: &BoundingBox) -> Self {
        [b._x, b._y, b._width, b._height]
    }
}

/// Object size in the format (width, height)
///
#[derive(Clone, Debug, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size as a `(width, height)` vector
    ///
    pub fn as_vector(&self) -> Vector2<f64> {
        Vector2::new(self.width as f64, self.height as f64)
    }
}

impl EstimateClose for Size {
    fn almost_same(&self, other: &Self, eps: f32) -> bool {
        (self.width - other.width).abs() < eps && (self.height - other.height).abs() < eps
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::bbox::{BoundingBox, Size};
    use crate::{Errors, EstimateClose, EPS};

    #[test]
    fn center() {
        let b = BoundingBox::new(10.0, 20.0, 4.0, 5.0);
        let c = b.center();
        assert!((c.x - 12.0).abs() < EPS as f64);
        assert!((c.y - 22.5).abs() < EPS as f64);
    }

    #[test]
    fn invalid_box() {
        let r = BoundingBox::try_new(0.0, 0.0, 0.0, 3.0);
        let e = r.unwrap_err();
        assert_eq!(
            e.downcast_ref::<Errors>().unwrap(),
            &Errors::InvalidBox(0.0, 3.0)
        );
        assert!(BoundingBox::try_from([1.0, 1.0, 2.0, -1.0]).is_err());
    }

    #[test]
    #[should_panic]
    fn invalid_box_panics() {
        BoundingBox::new(0.0, 0.0, 1.0, 0.0);
    }

    #[test]
    fn scaled_keeps_center() {
        let b = BoundingBox::new(10.0, 10.0, 4.0, 6.0);
        let s = b.scaled(2.0).unwrap();
        assert!(s.almost_same(&BoundingBox::new(8.0, 7.0, 8.0, 12.0), EPS));
        assert_eq!(b.center(), s.center());
    }

    #[test]
    fn size_order() {
        let s = Size::new(3.0, 7.0);
        let v = s.as_vector();
        assert_eq!((v.x, v.y), (3.0, 7.0));
        assert!(BoundingBox::new(0.0, 0.0, 3.0, 7.0)
            .size()
            .almost_same(&s, EPS));
    }
}
