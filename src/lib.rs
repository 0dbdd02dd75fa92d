pub mod catalog;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod reader;
pub mod region;
pub mod writer;

pub use catalog::SourceCatalog;
pub use error::{Error, Result};
pub use model::{BoundingBox, Feature, FeatureCatalog, FeatureKind, ShapeType, SpatialRecord};
pub use pipeline::ExtractionPipeline;
pub use reader::RecordReader;
pub use region::{Region, RegionResolver};
pub use writer::LayerWriter;
