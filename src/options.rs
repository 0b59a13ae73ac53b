use std::time::Duration;

/// Value subtracted from every 8-bit sample before it is fed to the model
pub const DEFAULT_PIXEL_BIAS: f32 = 128.0;

/// How long a blocking display keeps the sub-window on screen
pub const DEFAULT_DISPLAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Compute device the feature extractor runs on
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    /// CUDA device with the ordinal
    Cuda(usize),
}

impl Device {
    pub fn is_accelerated(&self) -> bool {
        matches!(self, Device::Cuda(_))
    }
}

/// Class that is used to configure feature extraction
///
/// The options are passed explicitly into every extraction entry point, so no process-wide
/// state decides the device or the normalization.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOptions {
    device: Device,
    pixel_bias: f32,
    visualize_subwindow: bool,
    display_timeout: Option<Duration>,
}

impl ExtractionOptions {
    /// The device handed to the feature extractor.
    ///
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// The value subtracted from every pixel sample when an image is converted to a tensor.
    ///
    /// The default `128` matches the input normalization of MatConvNet VGG models; change it
    /// only together with the model.
    ///
    pub fn pixel_bias(mut self, bias: f32) -> Self {
        self.pixel_bias = bias;
        self
    }

    /// When set, every extracted sub-window is also handed to the display sink before it is
    /// converted to a tensor.
    ///
    pub fn visualize_subwindow(mut self, visualize: bool) -> Self {
        self.visualize_subwindow = visualize;
        self
    }

    /// How long a blocking sink may keep the window open. `None` waits for the user.
    ///
    pub fn display_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.display_timeout = timeout;
        self
    }

    pub fn get_device(&self) -> &Device {
        &self.device
    }

    pub fn get_pixel_bias(&self) -> f32 {
        self.pixel_bias
    }

    pub fn get_visualize_subwindow(&self) -> bool {
        self.visualize_subwindow
    }

    pub fn get_display_timeout(&self) -> Option<Duration> {
        self.display_timeout
    }
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            device: Device::default(),
            pixel_bias: DEFAULT_PIXEL_BIAS,
            visualize_subwindow: false,
            display_timeout: Some(DEFAULT_DISPLAY_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::options::{Device, ExtractionOptions, DEFAULT_DISPLAY_TIMEOUT};
    use std::time::Duration;

    #[test]
    fn defaults() {
        let opts = ExtractionOptions::default();
        assert_eq!(opts.get_device(), &Device::Cpu);
        assert_eq!(opts.get_pixel_bias(), 128.0);
        assert!(!opts.get_visualize_subwindow());
        assert_eq!(opts.get_display_timeout(), Some(DEFAULT_DISPLAY_TIMEOUT));
    }

    #[test]
    fn builder() {
        let opts = ExtractionOptions::default()
            .device(Device::Cuda(1))
            .pixel_bias(0.0)
            .visualize_subwindow(true)
            .display_timeout(Some(Duration::from_millis(10)));
        assert!(opts.get_device().is_accelerated());
        assert_eq!(opts.get_pixel_bias(), 0.0);
        assert!(opts.get_visualize_subwindow());
        assert_eq!(opts.get_display_timeout(), Some(Duration::from_millis(10)));
    }
}
