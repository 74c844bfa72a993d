use geo_types::{Coord, LineString, Polygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use crate::algorithms::Moments;

/// Which side of a region a border was traced on
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BorderKind {
    Outer,
    Hole,
}

impl From<imageproc::contours::BorderType> for BorderKind {
    fn from(border: imageproc::contours::BorderType) -> Self {
        match border {
            imageproc::contours::BorderType::Outer => Self::Outer,
            imageproc::contours::BorderType::Hole => Self::Hole,
        }
    }
}

/// An ordered boundary curve, stored as integer pixel coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub points: Vec<[i32; 2]>,
    pub border: BorderKind,
    /// Index of the enclosing contour in the same contour list
    pub parent: Option<usize>,
}

impl Contour {
    pub fn new(points: Vec<[i32; 2]>, border: BorderKind, parent: Option<usize>) -> Self {
        Self { points, border, parent }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_f64_points(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|&[x, y]| [x as f64, y as f64])
            .collect()
    }

    /// Closed ring through all points (first point repeated at the end)
    pub fn to_closed_line_string(&self) -> LineString<f64> {
        let coords: Vec<Coord<f64>> = self.points
            .iter()
            .map(|&[x, y]| Coord { x: x as f64, y: y as f64 })
            .collect();

        let mut ring = LineString::new(coords);
        ring.close();
        ring
    }

    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        Polygon::new(self.to_closed_line_string(), vec![])
    }

    /// Smallest upright rectangle containing every point, inclusive of the
    /// edge pixels
    pub fn bounding_rect(&self) -> Option<BoundingRect> {
        let (first, rest) = self.points.split_first()?;
        let (mut min_x, mut min_y) = (first[0], first[1]);
        let (mut max_x, mut max_y) = (first[0], first[1]);

        for &[x, y] in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Some(BoundingRect {
            x: min_x,
            y: min_y,
            width: (max_x - min_x) as u32 + 1,
            height: (max_y - min_y) as u32 + 1,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    pub fn to_imageproc_rect(&self) -> imageproc::rect::Rect {
        imageproc::rect::Rect::at(self.x, self.y).of_size(self.width, self.height)
    }
}

/// Topology links of one contour, parallel to the contour list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub first_child: Option<usize>,
    pub parent: Option<usize>,
}

impl HierarchyNode {
    /// `[next, previous, first_child, parent]` with -1 for missing links
    pub fn as_array(&self) -> [i64; 4] {
        let link = |idx: Option<usize>| idx.map_or(-1, |i| i as i64);
        [
            link(self.next),
            link(self.previous),
            link(self.first_child),
            link(self.parent),
        ]
    }
}

/// How the ellipse of a contour was obtained
#[derive(
    Debug, Clone, Copy, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EllipseMethod {
    /// Direct least-squares fit to the boundary points
    Direct,
    /// Ellipse with the same second central moments as the contour
    Moments,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedEllipse {
    pub center: [f64; 2],
    /// Full length of the longer axis
    pub major_axis: f64,
    /// Full length of the shorter axis
    pub minor_axis: f64,
    /// Direction of the major axis from +x, degrees in [0, 180).
    /// Image coordinates, so positive angles turn clockwise on screen.
    pub angle: f64,
    pub method: EllipseMethod,
}

impl FittedEllipse {
    /// Builds an ellipse from two full axis lengths in either order,
    /// canonicalising so `major_axis >= minor_axis`.
    ///
    /// `angle_rad` is the direction of `first_axis`.
    pub fn from_axes(
        center: [f64; 2],
        first_axis: f64,
        second_axis: f64,
        angle_rad: f64,
        method: EllipseMethod,
    ) -> Self {
        let (major_axis, minor_axis, angle_rad) = if first_axis >= second_axis {
            (first_axis, second_axis, angle_rad)
        } else {
            (second_axis, first_axis, angle_rad + std::f64::consts::FRAC_PI_2)
        };

        Self {
            center,
            major_axis,
            minor_axis,
            angle: normalize_degrees(angle_rad.to_degrees()),
            method,
        }
    }

    /// Reported orientation: the direction of the minor axis, degrees in
    /// [0, 180). A horizontally elongated shape reports 90.
    pub fn orientation(&self) -> f64 {
        normalize_degrees(self.angle + 90.0)
    }

    pub fn angle_radians(&self) -> f64 {
        self.angle.to_radians()
    }

    pub fn is_valid(&self) -> bool {
        self.major_axis.is_finite()
            && self.minor_axis.is_finite()
            && self.center.iter().all(|c| c.is_finite())
            && self.angle.is_finite()
            && self.minor_axis >= 0.0
            && self.major_axis > 0.0
    }

    /// `n` points on the boundary, used for drawing
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let (sin_a, cos_a) = self.angle_radians().sin_cos();
        let (a, b) = (self.major_axis / 2.0, self.minor_axis / 2.0);
        (0..n)
            .map(|i| {
                let t = std::f64::consts::TAU * i as f64 / n as f64;
                let (px, py) = (a * t.cos(), b * t.sin());
                [
                    self.center[0] + cos_a * px - sin_a * py,
                    self.center[1] + sin_a * px + cos_a * py,
                ]
            })
            .collect()
    }
}

fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(180.0);
    // rem_euclid can round up to exactly 180.0 for tiny negative inputs
    if wrapped >= 180.0 { 0.0 } else { wrapped }
}

/// Descriptors computed for one contour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeFeatures {
    /// Position of the contour in the contour list
    pub index: usize,
    pub point_count: usize,
    pub moments: Moments,
    /// Polygon area, `m00`
    pub area: f64,
    pub centroid: Option<[f64; 2]>,
    pub perimeter: f64,
    pub bounding_rect: Option<BoundingRect>,
    pub ellipse: Option<FittedEllipse>,
    pub major_axis: Option<f64>,
    pub minor_axis: Option<f64>,
    /// Minor-axis direction of the fitted ellipse, degrees in [0, 180)
    pub orientation: Option<f64>,
    /// `perimeter² / (2π·area)`
    pub roundness: Option<f64>,
    pub eccentricity: Option<f64>,
    /// `minor / major · 100`
    pub ratio: Option<f64>,
    /// Diameter of the circle with the same area
    pub diameter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureReport {
    /// Original image dimensions
    pub image_width: u32,
    pub image_height: u32,
    pub contour_count: usize,
    pub contours: Vec<Contour>,
    pub hierarchy: Vec<HierarchyNode>,
    pub features: Vec<ShapeFeatures>,
}

impl FeatureReport {
    /// Features paired with the contour they describe
    pub fn iter(&self) -> impl Iterator<Item = (&Contour, &ShapeFeatures)> {
        self.contours.iter().zip(self.features.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_contour() -> Contour {
        Contour::new(
            vec![[10, 10], [10, 19], [19, 19], [19, 10]],
            BorderKind::Outer,
            None,
        )
    }

    #[test]
    fn test_bounding_rect_is_inclusive() {
        let rect = square_contour().bounding_rect().expect("non-empty contour");
        assert_eq!(rect, BoundingRect { x: 10, y: 10, width: 10, height: 10 });
    }

    #[test]
    fn test_bounding_rect_empty_contour() {
        let contour = Contour::new(vec![], BorderKind::Outer, None);
        assert!(contour.bounding_rect().is_none());
    }

    #[test]
    fn test_closed_line_string_repeats_first_point() {
        let ring = square_contour().to_closed_line_string();
        assert_eq!(ring.0.len(), 5);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn test_ellipse_from_axes_canonicalises() {
        let e = FittedEllipse::from_axes([0.0, 0.0], 4.0, 10.0, 0.0, EllipseMethod::Direct);
        assert_eq!(e.major_axis, 10.0);
        assert_eq!(e.minor_axis, 4.0);
        assert!((e.angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_orientation_follows_minor_axis() {
        let wide = FittedEllipse::from_axes([0.0, 0.0], 10.0, 4.0, 0.0, EllipseMethod::Direct);
        assert!((wide.orientation() - 90.0).abs() < 1e-9);

        let tall = FittedEllipse::from_axes([0.0, 0.0], 4.0, 10.0, 0.0, EllipseMethod::Direct);
        assert_eq!(tall.orientation(), 0.0);

        let tilted = FittedEllipse::from_axes([0.0, 0.0], 10.0, 4.0, 30f64.to_radians(), EllipseMethod::Direct);
        assert!((tilted.orientation() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_ellipse_angle_wraps_into_half_turn() {
        let e = FittedEllipse::from_axes(
            [0.0, 0.0],
            10.0,
            4.0,
            -std::f64::consts::FRAC_PI_4,
            EllipseMethod::Moments,
        );
        assert!((e.angle - 135.0).abs() < 1e-9);
    }

    #[test]
    fn test_hierarchy_node_array_uses_minus_one() {
        let node = HierarchyNode {
            next: Some(2),
            previous: None,
            first_child: Some(1),
            parent: None,
        };
        assert_eq!(node.as_array(), [2, -1, 1, -1]);
    }
}
