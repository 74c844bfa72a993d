use contour_features::{
    AnnotationOptions,
    ChainApproximation,
    ContourRetrieval,
    FeatureReport,
    Pipeline,
    annotate,
    load_image,
    save_annotated,
};

use clap::Args;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Process exit code when the input image cannot be read
pub const EXIT_IMAGE_LOAD: i32 = -1;

#[derive(Error, Debug)]
pub enum ContourKitError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    FeatureError(#[from] contour_features::FeatureError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("Blur sigma must be finite and non-negative, got {0}")]
    InvalidBlurSigma(f32),
    #[error("A fixed threshold and Otsu thresholding cannot both be enabled")]
    ConflictingThreshold,
}

/// Noise removal and binarisation applied before contour extraction
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct PreprocessingSection {
    /// Gaussian blur sigma on the colour image; 0 disables the blur
    pub blur_sigma: f32,
    /// Fixed binarisation level applied to the grayscale image
    pub threshold: Option<u8>,
    /// Binarise at the Otsu level instead of a fixed one
    pub otsu: bool,
}

impl Default for PreprocessingSection {
    fn default() -> Self {
        Self {
            blur_sigma: 0.1,
            threshold: None,
            otsu: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ContourSection {
    pub retrieval: ContourRetrieval,
    pub approximation: ChainApproximation,
}

/// Overlays drawn on the output image
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AnnotationSection {
    pub bounding_boxes: bool,
    pub orientation: bool,
    pub contours: bool,
    pub ellipses: bool,
    pub axes: bool,
    pub marker_length: f32,
}

impl Default for AnnotationSection {
    fn default() -> Self {
        let options = AnnotationOptions::default();
        Self {
            bounding_boxes: options.bounding_boxes,
            orientation: options.orientation,
            contours: options.contours,
            ellipses: options.ellipses,
            axes: options.axes,
            marker_length: options.marker_length,
        }
    }
}

/// Everything one analysis run needs
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Image to analyse
    pub input: PathBuf,
    /// Annotated image; the format follows the extension
    pub output: PathBuf,
    /// Optional JSON report
    pub json: Option<PathBuf>,
    /// Optional GeoJSON report
    pub geojson: Option<PathBuf>,
    pub preprocessing: PreprocessingSection,
    pub contours: ContourSection,
    pub annotation: AnnotationSection,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("../Images/test.png"),
            output: PathBuf::from("annotated.png"),
            json: None,
            geojson: None,
            preprocessing: PreprocessingSection::default(),
            contours: ContourSection::default(),
            annotation: AnnotationSection::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load AnalysisConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ContourKitError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load AnalysisConfig from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ContourKitError> {
        Ok(toml::from_str(content)?)
    }

    /// Load AnalysisConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ContourKitError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load AnalysisConfig from JSON string
    pub fn from_json(content: &str) -> Result<Self, ContourKitError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ContourKitError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ContourKitError::UnsupportedFileFormat),
        }
    }

    /// Auto-detect file format and save configuration
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ContourKitError> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(ContourKitError::UnsupportedFileFormat),
        };
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ContourKitError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, ContourKitError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the configuration file
    pub fn schema_json() -> Result<String, ContourKitError> {
        let schema = schemars::schema_for!(AnalysisConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    pub fn validate(&self) -> Result<(), ContourKitError> {
        let sigma = self.preprocessing.blur_sigma;
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(ContourKitError::InvalidBlurSigma(sigma));
        }
        if self.preprocessing.otsu && self.preprocessing.threshold.is_some() {
            return Err(ContourKitError::ConflictingThreshold);
        }
        Ok(())
    }

    pub fn build_pipeline(&self) -> Result<Pipeline, ContourKitError> {
        self.validate()?;
        let preprocessing = &self.preprocessing;

        let mut builder = Pipeline::builder();
        builder = if preprocessing.blur_sigma > 0.0 {
            builder.with_blur(preprocessing.blur_sigma)
        } else {
            builder.without_blur()
        };
        if let Some(threshold) = preprocessing.threshold {
            builder = builder.with_threshold(threshold);
        } else if preprocessing.otsu {
            builder = builder.with_otsu_threshold();
        }

        Ok(builder
            .with_contour_modes(self.contours.retrieval, self.contours.approximation)
            .build())
    }

    pub fn annotation_options(&self) -> AnnotationOptions {
        let a = &self.annotation;
        AnnotationOptions {
            bounding_boxes: a.bounding_boxes,
            orientation: a.orientation,
            contours: a.contours,
            ellipses: a.ellipses,
            axes: a.axes,
            marker_length: a.marker_length,
        }
    }
}

/// Command-line arguments of `analyze`; flags given here win over the config file
#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Image to analyse
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Annotated output image
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Write the full report as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
    /// Write contours and features as GeoJSON
    #[arg(long)]
    pub geojson: Option<PathBuf>,
    /// Gaussian blur sigma (0 disables the blur)
    #[arg(long)]
    pub blur_sigma: Option<f32>,
    /// Binarise at a fixed grayscale level
    #[arg(long, conflicts_with = "otsu")]
    pub threshold: Option<u8>,
    /// Binarise at the Otsu level
    #[arg(long)]
    pub otsu: bool,
    /// Contour retrieval mode: tree, external or list
    #[arg(long)]
    pub retrieval: Option<ContourRetrieval>,
    /// Chain approximation: simple or none
    #[arg(long)]
    pub approximation: Option<ChainApproximation>,
    /// Outline every contour
    #[arg(long)]
    pub draw_contours: bool,
    /// Draw the fitted ellipses
    #[arg(long)]
    pub draw_ellipses: bool,
    /// Draw a cross through each centroid
    #[arg(long)]
    pub draw_axes: bool,
    /// Do not print the text report
    #[arg(short, long)]
    pub quiet: bool,
}

impl AnalyzeArgs {
    /// Loads the config file if one was given, then applies the flags
    pub fn resolve(&self) -> Result<AnalysisConfig, ContourKitError> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut AnalysisConfig) {
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if self.json.is_some() {
            config.json = self.json.clone();
        }
        if self.geojson.is_some() {
            config.geojson = self.geojson.clone();
        }
        if let Some(sigma) = self.blur_sigma {
            config.preprocessing.blur_sigma = sigma;
        }
        if let Some(threshold) = self.threshold {
            config.preprocessing.threshold = Some(threshold);
            config.preprocessing.otsu = false;
        }
        if self.otsu {
            config.preprocessing.otsu = true;
            config.preprocessing.threshold = None;
        }
        if let Some(retrieval) = self.retrieval {
            config.contours.retrieval = retrieval;
        }
        if let Some(approximation) = self.approximation {
            config.contours.approximation = approximation;
        }
        config.annotation.contours |= self.draw_contours;
        config.annotation.ellipses |= self.draw_ellipses;
        config.annotation.axes |= self.draw_axes;
    }
}

/// How an analysis run ended
#[derive(Debug)]
pub enum AnalysisOutcome {
    Completed(FeatureReport),
    /// The input could not be decoded; nothing was written
    ImageUnavailable,
}

impl AnalysisOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(_) => 0,
            Self::ImageUnavailable => EXIT_IMAGE_LOAD,
        }
    }
}

/// Runs the pipeline on the configured input and writes every configured output
pub fn run_analysis(config: &AnalysisConfig, quiet: bool) -> Result<AnalysisOutcome, ContourKitError> {
    let pipeline = config.build_pipeline()?;
    info!("{}", pipeline.info());

    let image = match load_image(&config.input) {
        Ok(image) => image,
        Err(err) if err.is_image_load() => {
            error!("Could not load image {}: {err}", config.input.display());
            return Ok(AnalysisOutcome::ImageUnavailable);
        }
        Err(err) => return Err(err.into()),
    };

    let report = pipeline.process(&image)?;
    if !quiet {
        print!("{}", report.to_text());
    }

    let canvas = annotate(&image, &report, &config.annotation_options());
    save_annotated(&canvas, &config.output)?;

    if let Some(path) = &config.json {
        report.save_json(path)?;
    }
    if let Some(path) = &config.geojson {
        report.save_geojson(path)?;
    }

    info!("✅ Analysed {} contours", report.contour_count);
    Ok(AnalysisOutcome::Completed(report))
}
