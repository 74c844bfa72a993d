use crate::{
    pipeline::Pipeline,
    traits::{ColorPreprocessor, ContourExtractor, EllipseFitter, FeatureExtractor, ImagePreprocessor},
    algorithms::{
        ChainApproximation,
        ContourFeatureExtractor,
        ContourRetrieval,
        DefaultFeatureExtractor,
        GaussianBlurPreprocessor,
        ImageprocContourExtractor,
        OtsuThresholdPreprocessor,
        ThresholdPreprocessor,
    },
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    color_preprocessors: Vec<Box<dyn ColorPreprocessor>>,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    feature_extractor: Option<Box<dyn FeatureExtractor>>,
    default_blur: bool,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            color_preprocessors: Vec::new(),
            preprocessors: Vec::new(),
            contour_extractor: None,
            feature_extractor: None,
            default_blur: true,
        }
    }

    /// Add a preprocessor that runs on the colour image
    pub fn add_color_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ColorPreprocessor + 'static,
    {
        self.default_blur = false;
        self.color_preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Add a preprocessor that runs after grayscale conversion
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Blur the colour image with the given sigma (replaces the default blur)
    pub fn with_blur(self, sigma: f32) -> Self {
        self.add_color_preprocessor(GaussianBlurPreprocessor { sigma })
    }

    /// Skip colour preprocessing entirely
    pub fn without_blur(mut self) -> Self {
        self.default_blur = false;
        self.color_preprocessors.clear();
        self
    }

    /// Binarise at a fixed level after grayscale conversion
    pub fn with_threshold(self, threshold: u8) -> Self {
        self.add_preprocessor(ThresholdPreprocessor { threshold })
    }

    /// Binarise at the Otsu level after grayscale conversion
    pub fn with_otsu_threshold(self) -> Self {
        self.add_preprocessor(OtsuThresholdPreprocessor)
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Use the imageproc extractor with the given modes
    pub fn with_contour_modes(self, retrieval: ContourRetrieval, approximation: ChainApproximation) -> Self {
        self.set_contour_extractor(ImageprocContourExtractor::new(retrieval, approximation))
    }

    /// Set the feature extractor (replaces any existing one)
    pub fn set_feature_extractor<F>(mut self, extractor: F) -> Self
    where
        F: FeatureExtractor + 'static,
    {
        self.feature_extractor = Some(Box::new(extractor));
        self
    }

    /// Compute features with a different ellipse fitter
    pub fn with_ellipse_fitter<E>(self, fitter: E) -> Self
    where
        E: EllipseFitter + 'static,
    {
        self.set_feature_extractor(ContourFeatureExtractor::new(fitter))
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let mut color_preprocessors = self.color_preprocessors;
        if self.default_blur {
            color_preprocessors.push(Box::new(GaussianBlurPreprocessor::default()));
        }

        let contour_extractor = self.contour_extractor
            .unwrap_or_else(|| Box::new(ImageprocContourExtractor::default()));

        let feature_extractor = self.feature_extractor
            .unwrap_or_else(|| Box::new(DefaultFeatureExtractor::default()));

        Pipeline::new(
            color_preprocessors,
            self.preprocessors,
            contour_extractor,
            feature_extractor,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
