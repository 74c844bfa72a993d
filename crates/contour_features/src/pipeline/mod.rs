pub mod builder;

use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info, info_span};
use crate::{
    algorithms::build_hierarchy,
    error::Result,
    traits::{ColorPreprocessor, ContourExtractor, FeatureExtractor, ImagePreprocessor},
    types::FeatureReport,
};

/// Reads an image from disk, reporting failures as `FeatureError::ImageLoad`
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    let image = image::open(path)?;
    info!(path = %path.display(), width = image.width(), height = image.height(), "loaded image");
    Ok(image)
}

/// Blur, grayscale, contour extraction and per-contour features, in that order
pub struct Pipeline {
    color_preprocessors: Vec<Box<dyn ColorPreprocessor>>,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    contour_extractor: Box<dyn ContourExtractor>,
    feature_extractor: Box<dyn FeatureExtractor>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        color_preprocessors: Vec<Box<dyn ColorPreprocessor>>,
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        contour_extractor: Box<dyn ContourExtractor>,
        feature_extractor: Box<dyn FeatureExtractor>,
    ) -> Self {
        Self {
            color_preprocessors,
            preprocessors,
            contour_extractor,
            feature_extractor,
        }
    }

    /// Load an image from disk and process it
    pub fn process_path<P: AsRef<Path>>(&self, path: P) -> Result<FeatureReport> {
        let image = load_image(path)?;
        self.process(&image)
    }

    /// Process an image through the entire pipeline
    pub fn process(&self, image: &DynamicImage) -> Result<FeatureReport> {
        let _span = info_span!("pipeline", width = image.width(), height = image.height()).entered();

        // Step 1: Colour preprocessing (noise removal)
        let mut color = image.to_rgb8();
        for preprocessor in &self.color_preprocessors {
            color = preprocessor.preprocess_color(&color)?;
        }

        // Step 2: Grayscale conversion, then grayscale preprocessing
        let mut gray = DynamicImage::ImageRgb8(color).to_luma8();
        for preprocessor in &self.preprocessors {
            gray = preprocessor.preprocess(&gray)?;
        }

        // Step 3: Contours and their nesting
        let contours = self.contour_extractor.extract_contours(&gray)?;
        let hierarchy = build_hierarchy(&contours);
        info!("Number of contours: {}", contours.len());

        // Step 4: Per-contour features
        let features = contours
            .iter()
            .enumerate()
            .map(|(i, contour)| self.feature_extractor.extract_features(i, contour))
            .collect::<Result<Vec<_>>>()?;
        debug!(computed = features.len(), "computed shape features");

        Ok(FeatureReport {
            image_width: image.width(),
            image_height: image.height(),
            contour_count: contours.len(),
            contours,
            hierarchy,
            features,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {} colour preprocessors, {} grayscale preprocessors, 1 contour extractor, 1 feature extractor",
            self.color_preprocessors.len(),
            self.preprocessors.len()
        )
    }
}
