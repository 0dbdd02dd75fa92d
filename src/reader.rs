use std::path::Path;

use gdal::errors::CplErrType;
use gdal::vector::{geometry_type_to_name, Geometry, Layer, LayerAccess, OGRwkbGeometryType};
use gdal::Dataset;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::model::{
    flatten_wkb, BoundingBox, ExternalLabel, ShapeCoords, ShapeType, SpatialRecord,
};

/// Route GDAL's own diagnostics into tracing. Geometry-precision
/// warnings and similar chatter from the underlying library are
/// non-actionable and would otherwise pollute the output stream.
pub fn route_gdal_messages() {
    gdal::config::set_error_handler(|class, number, message| match class {
        CplErrType::Warning => debug!("gdal warning [{}]: {}", number, message),
        CplErrType::None | CplErrType::Debug => trace!("gdal [{}]: {}", number, message),
        _ => warn!("gdal error [{}]: {}", number, message),
    });
}

/// Streams records intersecting the bounding box out of a source
/// container, one layer at a time. The source handle is scoped to each
/// read call and released before the next source is opened.
#[derive(Debug, Clone, Copy)]
pub struct RecordReader {
    bbox: BoundingBox,
}

impl RecordReader {
    pub fn new(bbox: BoundingBox) -> Self {
        Self { bbox }
    }

    /// Layer names available within a container.
    pub fn list_layers(source: &Path) -> Result<Vec<String>> {
        let dataset = Dataset::open(source)?;
        Ok(dataset.layers().map(|layer| layer.name()).collect())
    }

    /// Read one named layer: bbox filter, depth filter, geometry
    /// normalization. Returns the layer's simplified schema shape type
    /// together with the retained records in source order.
    pub fn read_layer(
        &self,
        source: &Path,
        layer_id: &str,
        depth_label: Option<&str>,
        threshold: f64,
    ) -> Result<(ShapeType, Vec<SpatialRecord>)> {
        let dataset = Dataset::open(source)?;
        let mut layer = dataset.layer_by_name(layer_id)?;
        let shape_type = layer_shape_type(&layer)?;
        let records = self.collect_records(&mut layer, layer_id, depth_label, threshold)?;
        Ok((shape_type, records))
    }

    /// Layered-container variant: read every external label from one
    /// container. Bare labels pass all intersecting records through;
    /// depth-bearing descriptors keep only records at or above the
    /// threshold. Labels absent from the container are skipped.
    pub fn read_labeled_layers(
        &self,
        source: &Path,
        labels: &[ExternalLabel],
        threshold: f64,
    ) -> Result<Vec<SpatialRecord>> {
        let dataset = Dataset::open(source)?;
        let layer_names: Vec<String> = dataset.layers().map(|layer| layer.name()).collect();
        let mut records = Vec::new();
        for label in labels {
            let (layer_id, depth_label) = match label {
                ExternalLabel::Layer(layer) => (layer.as_str(), None),
                ExternalLabel::DepthFiltered { layer, depth_label } => {
                    (layer.as_str(), Some(depth_label.as_str()))
                }
            };
            if !layer_names.iter().any(|name| name == layer_id) {
                debug!(
                    "label layer '{}' absent from '{}', skipped",
                    layer_id,
                    source.display()
                );
                continue;
            }
            let mut layer = dataset.layer_by_name(layer_id)?;
            records.extend(self.collect_records(&mut layer, layer_id, depth_label, threshold)?);
        }
        Ok(records)
    }

    /// Reopen a previously written chart layer and stream its records
    /// back, bbox-filtered. A chart that was never written yields no
    /// records; the stored `depth` attribute is read back verbatim, so
    /// no threshold is applied.
    pub fn read_chart(&self, path: &Path) -> Result<Vec<SpatialRecord>> {
        if !path.exists() {
            debug!("chart '{}' does not exist, nothing to read", path.display());
            return Ok(Vec::new());
        }
        let dataset = Dataset::open(path)?;
        let mut layer = dataset.layer(0)?;
        self.collect_records(&mut layer, "chart", Some("depth"), f64::NEG_INFINITY)
    }

    fn collect_records(
        &self,
        layer: &mut Layer,
        layer_id: &str,
        depth_label: Option<&str>,
        threshold: f64,
    ) -> Result<Vec<SpatialRecord>> {
        let (min_e, min_n, max_e, max_n) = self.bbox.as_tuple();
        layer.set_spatial_filter_rect(min_e, min_n, max_e, max_n);

        let mut records = Vec::new();
        for feature in layer.features() {
            let depth = match depth_label {
                Some(label) => feature.field_as_double_by_name(label)?.unwrap_or(0.0),
                None => 0.0,
            };
            // Inclusive threshold: a record exactly at the threshold stays.
            if depth_label.is_some() && depth < threshold {
                continue;
            }
            let Some(geometry) = feature.geometry() else {
                debug!("record without geometry in layer '{}', skipped", layer_id);
                continue;
            };
            let (_, coords) = normalize(geometry)?;
            records.push(SpatialRecord { depth, coords });
            trace!("number of '{}' records read: {}", layer_id, records.len());
        }
        info!("read {} '{}' records", records.len(), layer_id);
        Ok(records)
    }
}

/// Simplified shape type of a layer's geometry schema.
fn layer_shape_type(layer: &Layer) -> Result<ShapeType> {
    let geom_field = layer
        .defn()
        .geom_fields()
        .next()
        .ok_or_else(|| Error::UnsupportedGeometry {
            found: "None".to_string(),
        })?;
    ShapeType::from_wkb(geom_field.field_type())
}

/// Strip any `Multi` qualifier and keep the first ring or point: for
/// polygons only the exterior ring of the first member survives, all
/// holes and further members are discarded; points pass unchanged with
/// any Z coordinate dropped.
pub fn normalize(geometry: &Geometry) -> Result<(ShapeType, ShapeCoords)> {
    match flatten_wkb(geometry.geometry_type()) {
        OGRwkbGeometryType::wkbPoint => Ok((ShapeType::Point, point_coords(geometry))),
        OGRwkbGeometryType::wkbMultiPoint => {
            ensure_member(geometry)?;
            Ok((ShapeType::Point, point_coords(&geometry.get_geometry(0))))
        }
        OGRwkbGeometryType::wkbPolygon => Ok((ShapeType::Polygon, outer_ring(geometry)?)),
        OGRwkbGeometryType::wkbMultiPolygon => {
            ensure_member(geometry)?;
            Ok((ShapeType::Polygon, outer_ring(&geometry.get_geometry(0))?))
        }
        other => Err(Error::UnsupportedGeometry {
            found: geometry_type_to_name(other),
        }),
    }
}

fn ensure_member(geometry: &Geometry) -> Result<()> {
    if geometry.geometry_count() == 0 {
        return Err(Error::UnsupportedGeometry {
            found: format!("empty {}", geometry_type_to_name(geometry.geometry_type())),
        });
    }
    Ok(())
}

fn point_coords(geometry: &Geometry) -> ShapeCoords {
    let (x, y, _) = geometry.get_point(0);
    ShapeCoords::Point((x, y))
}

fn outer_ring(polygon: &Geometry) -> Result<ShapeCoords> {
    if polygon.geometry_count() == 0 {
        return Err(Error::UnsupportedGeometry {
            found: "empty Polygon".to_string(),
        });
    }
    let ring = polygon.get_geometry(0);
    let points = ring
        .get_point_vec()
        .into_iter()
        .map(|(x, y, _)| (x, y))
        .collect();
    Ok(ShapeCoords::Ring(points))
}
