use image::{GrayImage, RgbImage};
use crate::{
    algorithms::Moments,
    error::Result,
    types::{Contour, FittedEllipse, ShapeFeatures},
};

/// Trait for preprocessing applied to the colour image
pub trait ColorPreprocessor: Send + Sync {
    fn preprocess_color(&self, image: &RgbImage) -> Result<RgbImage>;
}

/// Trait for image preprocessing algorithms
pub trait ImagePreprocessor: Send + Sync {
    /// Preprocess the grayscale image (e.g., blur, threshold)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract contours from a grayscale image; every non-zero pixel is foreground
    fn extract_contours(&self, image: &GrayImage) -> Result<Vec<Contour>>;
}

/// Trait for ellipse fitting algorithms
pub trait EllipseFitter: Send + Sync {
    /// Fit an ellipse to the contour points, `None` when no ellipse exists
    fn fit(&self, points: &[[f64; 2]], moments: &Moments) -> Option<FittedEllipse>;
}

/// Main trait for per-contour feature computation
pub trait FeatureExtractor: Send + Sync {
    fn extract_features(&self, index: usize, contour: &Contour) -> Result<ShapeFeatures>;
}
