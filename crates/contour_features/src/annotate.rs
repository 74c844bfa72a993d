use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use crate::{
    error::{FeatureError, Result},
    types::{FeatureReport, ShapeFeatures},
};

pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

/// Which overlays are drawn for each contour
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationOptions {
    pub bounding_boxes: bool,
    pub orientation: bool,
    pub contours: bool,
    pub ellipses: bool,
    /// Horizontal and vertical lines through the centroid
    pub axes: bool,
    /// Length in pixels of the orientation line and of each axis half
    pub marker_length: f32,
}

impl Default for AnnotationOptions {
    fn default() -> Self {
        Self {
            bounding_boxes: true,
            orientation: true,
            contours: false,
            ellipses: false,
            axes: false,
            marker_length: 30.0,
        }
    }
}

/// Draws the report's overlays onto a copy of `image`
pub fn annotate(image: &DynamicImage, report: &FeatureReport, options: &AnnotationOptions) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for (contour, features) in report.iter() {
        if options.contours && contour.len() > 1 {
            let n = contour.points.len();
            for i in 0..n {
                let [x0, y0] = contour.points[i];
                let [x1, y1] = contour.points[(i + 1) % n];
                draw_line_segment_mut(&mut canvas, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), RED);
            }
        }

        if options.ellipses {
            draw_ellipse(&mut canvas, features);
        }

        if options.bounding_boxes {
            if let Some(rect) = features.bounding_rect {
                draw_hollow_rect_mut(&mut canvas, rect.to_imageproc_rect(), GREEN);
            }
        }

        let Some([cx, cy]) = features.centroid else { continue };
        let (cx, cy) = (cx as f32, cy as f32);
        let len = options.marker_length;

        if options.axes {
            draw_line_segment_mut(&mut canvas, (cx - len, cy), (cx + len, cy), RED);
            draw_line_segment_mut(&mut canvas, (cx, cy - len), (cx, cy + len), RED);
        }

        if options.orientation {
            if let Some(angle) = features.orientation {
                let (sin, cos) = (angle as f32).to_radians().sin_cos();
                draw_line_segment_mut(&mut canvas, (cx, cy), (cx + len * cos, cy + len * sin), BLUE);
            }
        }
    }

    canvas
}

fn draw_ellipse(canvas: &mut RgbImage, features: &ShapeFeatures) {
    let Some(ellipse) = features.ellipse else { return };
    let samples = ellipse.sample_points(72);
    for (i, p) in samples.iter().enumerate() {
        let q = samples[(i + 1) % samples.len()];
        draw_line_segment_mut(
            canvas,
            (p[0] as f32, p[1] as f32),
            (q[0] as f32, q[1] as f32),
            YELLOW,
        );
    }
}

/// Writes the annotated image; the format follows the file extension
pub fn save_annotated<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    image.save(path).map_err(|source| FeatureError::ImageSave {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote annotated image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;

    fn square_image() -> DynamicImage {
        let mut img = RgbImage::new(100, 100);
        for y in 20..80 {
            for x in 40..60 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_bounding_box_drawn_in_green() {
        let image = square_image();
        let report = Pipeline::builder().build().process(&image).expect("should process");
        let canvas = annotate(&image, &report, &AnnotationOptions::default());

        let rect = report.features[0].bounding_rect.expect("rect");
        let corner = canvas.get_pixel(rect.x as u32, (rect.y + rect.height as i32 - 1) as u32);
        assert_eq!(*corner, GREEN);
    }

    #[test]
    fn test_orientation_line_follows_minor_axis() {
        let image = square_image();
        let report = Pipeline::builder().build().process(&image).expect("should process");
        let canvas = annotate(&image, &report, &AnnotationOptions::default());

        // Tall rectangle: the minor axis is horizontal, so the line leaves the
        // centroid sideways and nothing is drawn straight below it
        let [cx, cy] = report.features[0].centroid.expect("centroid");
        let row = cy.floor() as u32;
        let blue_at = |x: u32| (row - 1..=row + 1).any(|y| *canvas.get_pixel(x, y) == BLUE);
        let (left, right) = ((cx - 15.0).round() as u32, (cx + 15.0).round() as u32);
        assert!(blue_at(left) || blue_at(right), "no orientation pixel beside the centroid");

        let below = cy.round() as u32 + 15;
        let column = cx.floor() as u32;
        assert!((column - 1..=column + 1).all(|x| *canvas.get_pixel(x, below) != BLUE));
    }

    #[test]
    fn test_disabled_overlays_leave_image_untouched() {
        let image = square_image();
        let report = Pipeline::builder().build().process(&image).expect("should process");
        let options = AnnotationOptions {
            bounding_boxes: false,
            orientation: false,
            ..AnnotationOptions::default()
        };
        let canvas = annotate(&image, &report, &options);
        assert_eq!(canvas, image.to_rgb8());
    }

    #[test]
    fn test_save_annotated_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.png");
        save_annotated(&RgbImage::new(4, 4), &path).expect("should save");
        assert!(path.exists());
    }

    #[test]
    fn test_save_to_unknown_extension_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.not-an-image");
        let err = save_annotated(&RgbImage::new(4, 4), &path).expect_err("unknown format");
        assert!(matches!(err, FeatureError::ImageSave { .. }));
    }
}
