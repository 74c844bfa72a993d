use std::f64::consts::PI;

use crate::{
    algorithms::{DirectEllipseFitter, Moments},
    error::Result,
    traits::{EllipseFitter, FeatureExtractor},
    types::{Contour, ShapeFeatures},
};

/// Computes area and centroid from moments, the perimeter from the closed
/// arc length, and axis-derived descriptors from a fitted ellipse
#[derive(Debug, Clone)]
pub struct ContourFeatureExtractor<E>
where
    E: EllipseFitter,
{
    pub ellipse_fitter: E,
}

/// Direct ellipse fit with the moment ellipse as fallback
pub type DefaultFeatureExtractor = ContourFeatureExtractor<DirectEllipseFitter>;

impl Default for DefaultFeatureExtractor {
    fn default() -> Self {
        Self::new(DirectEllipseFitter::default())
    }
}

impl<E: EllipseFitter> ContourFeatureExtractor<E> {
    pub fn new(ellipse_fitter: E) -> Self {
        Self { ellipse_fitter }
    }
}

impl<E: EllipseFitter> FeatureExtractor for ContourFeatureExtractor<E> {
    fn extract_features(&self, index: usize, contour: &Contour) -> Result<ShapeFeatures> {
        let points = contour.to_f64_points();
        let moments = Moments::from_polygon(&points);
        let area = moments.area();
        let polygon_area = polygon_area(contour);
        if (polygon_area - area).abs() > 1e-6 * area.max(1.0) {
            tracing::warn!(index, area, polygon_area, "moment area disagrees with polygon area");
        }
        let perimeter = arc_length(contour);
        let ellipse = self.ellipse_fitter.fit(&points, &moments);

        let major_axis = ellipse.map(|e| e.major_axis);
        let minor_axis = ellipse.map(|e| e.minor_axis);
        let axis_ratio = ellipse
            .filter(|e| e.major_axis > 0.0)
            .map(|e| e.minor_axis / e.major_axis);

        Ok(ShapeFeatures {
            index,
            point_count: contour.len(),
            moments,
            area,
            centroid: moments.centroid(),
            perimeter,
            bounding_rect: contour.bounding_rect(),
            ellipse,
            major_axis,
            minor_axis,
            orientation: ellipse.map(|e| e.orientation()),
            roundness: roundness(perimeter, area),
            eccentricity: axis_ratio.map(|r| (1.0 - r * r).max(0.0).sqrt()),
            ratio: axis_ratio.map(|r| r * 100.0),
            diameter: equivalent_diameter(area),
        })
    }
}

/// Length of the closed boundary
pub fn arc_length(contour: &Contour) -> f64 {
    use geo::EuclideanLength;
    contour.to_closed_line_string().euclidean_length()
}

/// Unsigned shoelace area of the contour polygon
pub fn polygon_area(contour: &Contour) -> f64 {
    use geo::Area;
    if contour.len() < 3 {
        return 0.0;
    }
    contour.to_geo_polygon().unsigned_area()
}

/// `perimeter² / (2π·area)`, undefined for zero area
pub fn roundness(perimeter: f64, area: f64) -> Option<f64> {
    (area > 0.0).then(|| perimeter * perimeter / (2.0 * PI * area))
}

/// Diameter of the circle with the given area
pub fn equivalent_diameter(area: f64) -> f64 {
    (4.0 * area.max(0.0) / PI).sqrt()
}
