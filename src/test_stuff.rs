use crate::features::{FeatureExtractor, LayerSelector};
use crate::options::Device;
use crate::utils::bbox::BoundingBox;
use anyhow::Result;
use ndarray::{Array3, Array4, ArrayView4};
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;

/// Synthetic `(height, width, 3)` frame where each channel is a different function of the
/// pixel position
///
pub fn gradient_image(height: usize, width: usize) -> Array3<u8> {
    Array3::from_shape_fn((height, width, 3), |(i, j, c)| match c {
        0 => ((i * 7 + j * 3) % 256) as u8,
        1 => ((i * 5 + j * 11) % 256) as u8,
        _ => ((i + j) % 256) as u8,
    })
}

/// Extractor that average-pools the input with one stride per layer.
///
/// Every layer keeps the input channels, so a stride `s` layer of an `H x W` input has the
/// shape `(1, C, H / s, W / s)`. Useful as a stand-in for a VGG-like backbone whose layers
/// have strides `4`, `8` and so on.
///
#[derive(Debug, Clone)]
pub struct StridedMeanExtractor {
    strides: Vec<usize>,
}

impl StridedMeanExtractor {
    pub fn new(strides: &[usize]) -> Self {
        assert!(
            strides.iter().all(|s| *s > 0),
            "Strides must be positive numbers"
        );
        Self {
            strides: strides.to_vec(),
        }
    }
}

impl FeatureExtractor for StridedMeanExtractor {
    fn extract(
        &self,
        input: ArrayView4<f32>,
        _layers: &LayerSelector,
        _device: &Device,
    ) -> Result<Vec<Array4<f32>>> {
        let (batch, channels, height, width) = input.dim();
        Ok(self
            .strides
            .iter()
            .map(|&s| {
                let area = (s * s) as f32;
                Array4::from_shape_fn((batch, channels, height / s, width / s), |(b, c, i, j)| {
                    let mut acc = 0.0;
                    for di in 0..s {
                        for dj in 0..s {
                            acc += input[[b, c, i * s + di, j * s + dj]];
                        }
                    }
                    acc / area
                })
            })
            .collect())
    }
}

/// Endless generator of drifting boxes
///
pub struct BoxGen {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    gen: ThreadRng,
    dist_pos: Uniform<f32>,
    dist_box: Uniform<f32>,
}

impl BoxGen {
    pub fn new(x: f32, y: f32, width: f32, height: f32, pos_drift: f32, box_drift: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            gen: rand::thread_rng(),
            dist_pos: Uniform::new(-pos_drift, pos_drift),
            dist_box: Uniform::new(-box_drift, box_drift),
        }
    }
}

impl Iterator for BoxGen {
    type Item = BoundingBox;

    fn next(&mut self) -> Option<Self::Item> {
        self.x += self.gen.sample(self.dist_pos);
        self.y += self.gen.sample(self.dist_pos);

        self.width += self.gen.sample(self.dist_box);
        self.height += self.gen.sample(self.dist_box);

        if self.width < 1.0 {
            self.width = 1.0;
        }
        if self.height < 1.0 {
            self.height = 1.0;
        }

        Some(BoundingBox::new(self.x, self.y, self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use crate::features::{FeatureExtractor, LayerSelector};
    use crate::options::Device;
    use crate::test_stuff::{BoxGen, StridedMeanExtractor};
    use crate::EPS;
    use ndarray::Array4;

    #[test]
    fn strided_mean() {
        let input = Array4::from_shape_fn((1, 2, 4, 4), |(_, c, i, j)| (c * 16 + i * 4 + j) as f32);
        let model = StridedMeanExtractor::new(&[2]);
        let out = model
            .extract(input.view(), &LayerSelector::All, &Device::Cpu)
            .unwrap();
        assert_eq!(out[0].shape(), &[1, 2, 2, 2]);
        // mean of 0, 1, 4, 5
        assert!((out[0][[0, 0, 0, 0]] - 2.5).abs() < EPS);
        // mean of 26, 27, 30, 31
        assert!((out[0][[0, 1, 1, 1]] - 28.5).abs() < EPS);
    }

    #[test]
    fn boxes_stay_valid() {
        for b in BoxGen::new(0.0, 0.0, 2.0, 2.0, 3.0, 5.0).take(100) {
            assert!(b.width() >= 1.0 && b.height() >= 1.0);
        }
    }
}
