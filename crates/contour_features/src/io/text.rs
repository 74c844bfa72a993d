use std::fmt;

use crate::types::FeatureReport;

/// Human-readable listing of a report, one block per contour
pub struct TextReport<'a> {
    report: &'a FeatureReport,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a FeatureReport) -> Self {
        Self { report }
    }
}

struct Value(Option<f64>);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.1}"),
            None => f.write_str("n/a"),
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of contours: {}", self.report.contour_count)?;
        for shape in &self.report.features {
            writeln!(f, "Area: {}", Value(Some(shape.area)))?;
            writeln!(f, "Perimeter: {}", Value(Some(shape.perimeter)))?;
            writeln!(f, "Major Axis: {}", Value(shape.major_axis))?;
            writeln!(f, "Minor Axis: {}", Value(shape.minor_axis))?;
            writeln!(f, "Orientation: {}", Value(shape.orientation))?;
            writeln!(f, "Roundness: {}", Value(shape.roundness))?;
            writeln!(f, "Eccentricity: {}", Value(shape.eccentricity))?;
            writeln!(f, "Ratio: {}", Value(shape.ratio))?;
            writeln!(f, "Diameter: {}", Value(Some(shape.diameter)))?;
            writeln!(f)?;
        }
        Ok(())
    }
}

impl FeatureReport {
    pub fn to_text(&self) -> TextReport<'_> {
        TextReport::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::DefaultFeatureExtractor,
        traits::FeatureExtractor,
        types::{BorderKind, Contour},
    };

    fn report(contours: Vec<Contour>) -> FeatureReport {
        let extractor = DefaultFeatureExtractor::default();
        let features = contours
            .iter()
            .enumerate()
            .map(|(i, c)| extractor.extract_features(i, c).expect("features"))
            .collect();
        FeatureReport {
            image_width: 100,
            image_height: 100,
            contour_count: contours.len(),
            hierarchy: crate::algorithms::build_hierarchy(&contours),
            contours,
            features,
        }
    }

    #[test]
    fn test_square_listing() {
        let square = Contour::new(vec![[20, 20], [79, 20], [79, 79], [20, 79]], BorderKind::Outer, None);
        let text = report(vec![square]).to_text().to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Number of contours: 1");
        assert_eq!(lines[1], "Area: 3481.0");
        assert_eq!(lines[2], "Perimeter: 236.0");
        assert_eq!(lines[8], "Ratio: 100.0");
        assert_eq!(lines[9], "Diameter: 66.6");
        assert_eq!(lines[10], "");
    }

    #[test]
    fn test_undefined_values_print_as_na() {
        let segment = Contour::new(vec![[5, 5], [6, 6]], BorderKind::Outer, None);
        let text = report(vec![segment]).to_text().to_string();

        assert!(text.contains("Area: 0.0"));
        assert!(text.contains("Roundness: n/a"));
        assert!(text.contains("Major Axis: n/a"));
        assert!(text.contains("Diameter: 0.0"));
    }

    #[test]
    fn test_empty_report() {
        let text = report(Vec::new()).to_text().to_string();
        assert_eq!(text, "Number of contours: 0\n");
    }
}
