use std::fs;
use std::path::PathBuf;

use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Geometry, LayerAccess, OGRFieldType, OGRwkbGeometryType};
use gdal::LayerOptions;
use gdal::DriverManager;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{Feature, ShapeCoords, SpatialRecord};

/// Default directory for the extracted output layers.
pub const DEFAULT_OUTPUT_DIR: &str = "data/charts";

const OUTPUT_DRIVER: &str = "ESRI Shapefile";
const OUTPUT_EPSG: u32 = 25833;

/// Serializes a feature's accumulated records into a new output layer
/// with the fixed `{depth}` schema and the feature's discovered shape
/// type.
#[derive(Debug, Clone)]
pub struct LayerWriter {
    output_root: PathBuf,
}

impl LayerWriter {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Deterministic destination path, keyed by feature name.
    pub fn layer_path(&self, feature: &Feature) -> PathBuf {
        self.output_root
            .join(feature.name())
            .join(format!("{}.shp", feature.name()))
    }

    /// Create or overwrite the feature's output layer, writing one
    /// record per accumulated SpatialRecord in accumulation order. An
    /// empty record set still produces a valid empty layer. The dataset
    /// handle closes on scope exit even if a mid-write call fails.
    pub fn write(&self, feature: &Feature, records: &[SpatialRecord]) -> Result<()> {
        let shape_type = feature
            .shape_type
            .ok_or_else(|| Error::ShapeTypeUndetermined {
                feature: feature.name().to_string(),
            })?;

        let layer_dir = self.output_root.join(feature.name());
        if layer_dir.exists() {
            fs::remove_dir_all(&layer_dir)?;
        }
        fs::create_dir_all(&layer_dir)?;
        let path = self.layer_path(feature);

        let driver = DriverManager::get_driver_by_name(OUTPUT_DRIVER)?;
        let mut dataset = driver.create_vector_only(&path)?;
        let srs = SpatialRef::from_epsg(OUTPUT_EPSG)?;
        let mut layer = dataset.create_layer(LayerOptions {
            name: feature.name(),
            ty: shape_type.to_wkb(),
            srs: Some(&srs),
            ..Default::default()
        })?;
        layer.create_defn_fields(&[("depth", OGRFieldType::OFTReal)])?;

        for record in records {
            let geometry = build_geometry(&record.coords)?;
            layer.create_feature_fields(
                geometry,
                &["depth"],
                &[FieldValue::RealValue(record.depth)],
            )?;
        }

        info!("wrote {} records to {}", records.len(), path.display());
        Ok(())
    }
}

fn build_geometry(coords: &ShapeCoords) -> Result<Geometry> {
    match coords {
        ShapeCoords::Point((x, y)) => {
            let mut point = Geometry::empty(OGRwkbGeometryType::wkbPoint)?;
            point.add_point_2d((*x, *y));
            Ok(point)
        }
        ShapeCoords::Ring(points) => {
            let mut ring = Geometry::empty(OGRwkbGeometryType::wkbLinearRing)?;
            for &(x, y) in points {
                ring.add_point_2d((x, y));
            }
            let mut polygon = Geometry::empty(OGRwkbGeometryType::wkbPolygon)?;
            polygon.add_geometry(ring)?;
            Ok(polygon)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureKind, ShapeType};
    use gdal::Dataset;
    use tempfile::TempDir;

    fn shapefile_driver_available() -> bool {
        DriverManager::get_driver_by_name(OUTPUT_DRIVER).is_ok()
    }

    fn polygon_feature() -> Feature {
        let mut feature = Feature::new(FeatureKind::Seabed);
        feature.record_shape_type(ShapeType::Polygon);
        feature
    }

    #[test]
    fn test_write_empty_set_produces_valid_layer() {
        if !shapefile_driver_available() {
            eprintln!("Skipping test: ESRI Shapefile driver not available");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let writer = LayerWriter::new(temp_dir.path());
        let feature = polygon_feature();

        writer.write(&feature, &[]).unwrap();

        let path = writer.layer_path(&feature);
        assert!(path.exists());

        let dataset = Dataset::open(&path).unwrap();
        let layer = dataset.layer(0).unwrap();
        assert_eq!(layer.feature_count(), 0);
        let field_names: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();
        assert!(field_names.iter().any(|name| name == "depth"));
    }

    #[test]
    fn test_write_preserves_record_order_and_depths() {
        if !shapefile_driver_available() {
            eprintln!("Skipping test: ESRI Shapefile driver not available");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let writer = LayerWriter::new(temp_dir.path());

        let mut feature = Feature::new(FeatureKind::Rocks);
        feature.record_shape_type(ShapeType::Point);
        let records = vec![
            SpatialRecord {
                depth: 0.0,
                coords: ShapeCoords::Point((10.0, 20.0)),
            },
            SpatialRecord {
                depth: 7.0,
                coords: ShapeCoords::Point((30.0, 40.0)),
            },
        ];

        writer.write(&feature, &records).unwrap();

        let dataset = Dataset::open(writer.layer_path(&feature)).unwrap();
        let mut layer = dataset.layer(0).unwrap();
        let depths: Vec<f64> = layer
            .features()
            .map(|f| f.field_as_double_by_name("depth").unwrap().unwrap())
            .collect();
        assert_eq!(depths, vec![0.0, 7.0]);
    }

    #[test]
    fn test_write_overwrites_previous_layer() {
        if !shapefile_driver_available() {
            eprintln!("Skipping test: ESRI Shapefile driver not available");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let writer = LayerWriter::new(temp_dir.path());
        let feature = polygon_feature();

        let records = vec![SpatialRecord {
            depth: 3.0,
            coords: ShapeCoords::Ring(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
        }];
        writer.write(&feature, &records).unwrap();
        writer.write(&feature, &[]).unwrap();

        let dataset = Dataset::open(writer.layer_path(&feature)).unwrap();
        let layer = dataset.layer(0).unwrap();
        assert_eq!(layer.feature_count(), 0);
    }

    #[test]
    fn test_write_before_shape_type_determination_fails() {
        let temp_dir = TempDir::new().unwrap();
        let writer = LayerWriter::new(temp_dir.path());
        let feature = Feature::new(FeatureKind::Seabed);

        let err = writer.write(&feature, &[]).unwrap_err();
        assert!(matches!(err, Error::ShapeTypeUndetermined { .. }));
    }
}
