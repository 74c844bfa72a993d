use image::{GrayImage, RgbImage};
use crate::{
    error::{FeatureError, Result},
    traits::{ColorPreprocessor, ImagePreprocessor},
};

/// Gaussian blur preprocessor for noise reduction
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: 0.1 }
    }
}

impl GaussianBlurPreprocessor {
    fn check_sigma(&self) -> Result<()> {
        if self.sigma > 0.0 && self.sigma.is_finite() {
            Ok(())
        } else {
            Err(FeatureError::InvalidParameter {
                name: "sigma",
                reason: format!("must be a positive finite number, got {}", self.sigma),
            })
        }
    }

    /// Unit-sum 1D Gaussian covering three sigmas each side, at least 3 taps
    pub fn kernel(&self) -> Result<Vec<f32>> {
        self.check_sigma()?;
        let radius = (3.0 * self.sigma).ceil().max(1.0) as i32;
        let denom = 2.0 * self.sigma * self.sigma;
        let mut weights: Vec<f32> = (-radius..=radius)
            .map(|x| (-((x * x) as f32) / denom).exp())
            .collect();
        let sum: f32 = weights.iter().sum();
        weights.iter_mut().for_each(|w| *w /= sum);
        Ok(weights)
    }
}

impl ColorPreprocessor for GaussianBlurPreprocessor {
    fn preprocess_color(&self, image: &RgbImage) -> Result<RgbImage> {
        let kernel = self.kernel()?;
        Ok(imageproc::filter::separable_filter_equal(image, &kernel))
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let kernel = self.kernel()?;
        Ok(imageproc::filter::separable_filter_equal(image, &kernel))
    }
}

/// Simple thresholding preprocessor
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: 128 }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(image, self.threshold))
    }
}

/// Threshold at the level picked by Otsu's method
#[derive(Debug, Clone, Default)]
pub struct OtsuThresholdPreprocessor;

impl ImagePreprocessor for OtsuThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let level = imageproc::contrast::otsu_level(image);
        tracing::debug!(level, "otsu threshold level");
        Ok(imageproc::contrast::threshold(image, level))
    }
}
