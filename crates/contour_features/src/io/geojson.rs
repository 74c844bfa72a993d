use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::{
    algorithms::contour_depths,
    error::Result,
    types::{BorderKind, Contour, FeatureReport, ShapeFeatures},
};

/// Properties attached to each contour feature
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, JsonSchema)]
#[schemars(description = "Shape descriptors of one contour")]
pub struct ContourProperties {
    #[schemars(description = "Index of the contour in the report")]
    pub id: usize,
    pub border: BorderKind,
    #[schemars(description = "Index of the enclosing contour")]
    pub parent: Option<usize>,
    #[schemars(description = "Nesting depth, 0 for top-level contours")]
    pub depth: usize,
    #[schemars(description = "Area in square pixels")]
    pub area: f64,
    #[schemars(description = "Closed boundary length in pixels")]
    pub perimeter: f64,
    pub centroid: Option<[f64; 2]>,
    pub major_axis: Option<f64>,
    pub minor_axis: Option<f64>,
    #[schemars(description = "Minor axis direction in degrees, [0, 180)")]
    pub orientation: Option<f64>,
    pub roundness: Option<f64>,
    pub eccentricity: Option<f64>,
    pub ratio: Option<f64>,
    pub diameter: f64,
    #[schemars(description = "Seven Hu moment invariants")]
    pub hu_moments: Option<[f64; 7]>,
}

impl ContourProperties {
    pub fn new(contour: &Contour, features: &ShapeFeatures, depth: usize) -> Self {
        Self {
            id: features.index,
            border: contour.border,
            parent: contour.parent,
            depth,
            area: features.area,
            perimeter: features.perimeter,
            centroid: features.centroid,
            major_axis: features.major_axis,
            minor_axis: features.minor_axis,
            orientation: features.orientation,
            roundness: features.roundness,
            eccentricity: features.eccentricity,
            ratio: features.ratio,
            diameter: features.diameter,
            hu_moments: features.moments.hu_invariants(),
        }
    }
}

/// Polygon for closed contours, falling back to a line or point when
/// there are too few vertices to form a ring
fn contour_geometry(contour: &Contour) -> Option<Geometry> {
    let position = |&[x, y]: &[i32; 2]| vec![x as f64, y as f64];
    let value = match contour.points.as_slice() {
        [] => return None,
        [single] => Value::Point(position(single)),
        [a, b] => Value::LineString(vec![position(a), position(b)]),
        points => {
            let mut ring: Vec<Vec<f64>> = points.iter().map(position).collect();
            ring.push(position(&points[0]));
            Value::Polygon(vec![ring])
        }
    };
    Some(Geometry::new(value))
}

impl FeatureReport {
    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(self.contour_count);
        let depths = contour_depths(&self.hierarchy);

        for ((contour, shape), depth) in self.iter().zip(depths) {
            let properties = serde_json::to_value(ContourProperties::new(contour, shape, depth))?;

            features.push(Feature {
                bbox: None,
                geometry: contour_geometry(contour),
                id: Some(geojson::feature::Id::Number(serde_json::Number::from(shape.index))),
                properties: properties.as_object().cloned(),
                foreign_members: None,
            });
        }

        // Image metadata rides along as foreign members of the collection
        let mut foreign_members = serde_json::Map::new();
        foreign_members.insert("image_width".to_string(), serde_json::Value::from(self.image_width));
        foreign_members.insert("image_height".to_string(), serde_json::Value::from(self.image_height));
        foreign_members.insert("contour_count".to_string(), serde_json::Value::from(self.contour_count));

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_geojson_string()?)?;
        tracing::info!(path = %path.as_ref().display(), "wrote GeoJSON report");
        Ok(())
    }
}
