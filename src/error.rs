use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Closed error taxonomy for the extraction pipeline. Construction-time
/// validation fails before any I/O is attempted; collaborator failures
/// from GDAL/OGR are propagated untouched.
#[derive(Debug, Error)]
pub enum Error {
    #[error("origin should be a pair of the form 'easting,northing' in meters, got '{0}'")]
    OriginFormat(String),

    #[error("window size should be a pair of the form 'width,height' in meters, got '{0}'")]
    SizeFormat(String),

    #[error("window size should have non-negative extents, got ({0}, {1})")]
    WindowSize(f64, f64),

    #[error("depth bins should be a non-empty ascending sequence of numbers, got {0:?}")]
    DepthBins(Vec<i32>),

    #[error("region '{name}' not valid, possible candidates are {candidates:?}")]
    RegionName {
        name: String,
        candidates: &'static [&'static str],
    },

    #[error("feature name '{name}' not valid, possible candidates are {candidates:?}")]
    FeatureName {
        name: String,
        candidates: &'static [&'static str],
    },

    #[error("region '{name}' not found in path '{dir}'")]
    RegionFileNotFound { name: String, dir: PathBuf },

    #[error("region '{name}' should have a file of the form '{template}', found '{file_name}'")]
    RegionFileTemplate {
        name: String,
        file_name: String,
        template: String,
    },

    #[error("feature '{feature}' has no shape type, no source layer was read for it")]
    ShapeTypeUndetermined { feature: String },

    #[error("unsupported geometry '{found}', only Point and Polygon layers are handled")]
    UnsupportedGeometry { found: String },

    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
