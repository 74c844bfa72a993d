pub mod geojson;
pub mod json;
pub mod text;

pub use self::geojson::ContourProperties;
pub use self::text::TextReport;
