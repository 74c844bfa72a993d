//! # Contour Shape Features
//!
//! Finds the contours of every blob in an image and describes each one with
//! classical shape descriptors: area, perimeter, centroid, bounding box,
//! fitted ellipse axes and orientation, roundness, eccentricity, axis ratio
//! and equivalent diameter.
//!
//! ## Core Features
//!
//! - **Trait-based Architecture**: swap preprocessing, extraction or ellipse fitting
//! - **Contour Hierarchy**: outer borders and holes with parent/child links
//! - **Direct Ellipse Fit**: least-squares conic fit with a moment-based fallback
//! - **Reports**: plain text listing, JSON and GeoJSON export, annotated images
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contour_features::{AnnotationOptions, Pipeline, annotate, save_annotated};
//!
//! let pipeline = Pipeline::builder().build();
//! let image = image::open("shapes.png")?;
//! let report = pipeline.process(&image)?;
//!
//! print!("{}", report.to_text());
//!
//! let canvas = annotate(&image, &report, &AnnotationOptions::default());
//! save_annotated(&canvas, "annotated.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use contour_features::{Pipeline, algorithms::*};
//!
//! let pipeline = Pipeline::builder()
//!     .with_blur(1.0)
//!     .with_otsu_threshold()
//!     .with_contour_modes(ContourRetrieval::External, ChainApproximation::None)
//!     .with_ellipse_fitter(MomentEllipseFitter)
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod annotate;
pub mod io;

pub use error::{FeatureError, Result};
pub use types::*;
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{Pipeline, builder::PipelineBuilder, load_image};
pub use annotate::{AnnotationOptions, annotate, save_annotated};
pub use io::{ContourProperties, TextReport};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    fn create_test_image() -> DynamicImage {
        let mut img = GrayImage::new(100, 100);
        for y in 20..80 {
            for x in 20..80 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_pipeline_basic() {
        let pipeline = Pipeline::builder().build();
        let report = pipeline.process(&create_test_image()).expect("Should process successfully");

        assert_eq!(report.contour_count, 1);
        assert_eq!(report.image_width, 100);
        let area = report.features[0].area;
        assert!((area - 3481.0).abs() < 1.0, "area {area}");
    }

    #[test]
    fn test_reports_agree() {
        let report = Pipeline::builder().build().process(&create_test_image()).expect("Should process successfully");

        let text = report.to_text().to_string();
        assert!(text.starts_with("Number of contours: 1\n"));

        let geojson = report.to_geojson().expect("Should create GeoJSON");
        assert_eq!(geojson.features.len(), 1);

        let json = report.to_json_string().expect("Should create JSON");
        let back = FeatureReport::from_json_str(&json).expect("Should parse JSON");
        assert_eq!(back.contours, report.contours);
    }
}
