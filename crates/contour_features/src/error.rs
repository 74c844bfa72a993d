use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Failed to write image {}: {source}", path.display())]
    ImageSave {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Ellipse fit failed: {0}")]
    EllipseFit(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl FeatureError {
    /// True when the error comes from reading or decoding the input image.
    pub fn is_image_load(&self) -> bool {
        matches!(self, Self::ImageLoad(_))
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
