use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::catalog::SourceCatalog;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Feature, SpatialRecord};
use crate::reader::RecordReader;
use crate::region::Region;
use crate::writer::LayerWriter;

/// Default depth bins; the first bin is the minimum-depth threshold
/// applied when reading depth-bearing layers.
pub const DEFAULT_DEPTH_BINS: &[i32] = &[0, 3, 6, 10, 20, 50, 100, 200, 300, 400, 500];

/// Orchestrates extraction: for each feature, for each source in order,
/// read, depth-filter, normalize and accumulate, then persist the
/// accumulated set as one output layer per feature.
pub struct ExtractionPipeline {
    reader: RecordReader,
    catalog: SourceCatalog,
    writer: LayerWriter,
    depth_bins: Vec<i32>,
}

impl ExtractionPipeline {
    pub fn new(
        bbox: BoundingBox,
        catalog: SourceCatalog,
        writer: LayerWriter,
        depth_bins: Option<Vec<i32>>,
    ) -> Result<Self> {
        let depth_bins = match depth_bins {
            Some(bins) => {
                if bins.is_empty() || !bins.windows(2).all(|pair| pair[0] < pair[1]) {
                    return Err(Error::DepthBins(bins));
                }
                bins
            }
            None => DEFAULT_DEPTH_BINS.to_vec(),
        };
        Ok(Self {
            reader: RecordReader::new(bbox),
            catalog,
            writer,
            depth_bins,
        })
    }

    pub fn depth_bins(&self) -> &[i32] {
        &self.depth_bins
    }

    pub fn threshold_depth(&self) -> f64 {
        f64::from(self.depth_bins[0])
    }

    /// Extract and persist every requested feature from the given
    /// regions, in region-list order. Returns the written record count
    /// per feature.
    pub fn run(&self, features: &mut [Feature], regions: &[Region]) -> Result<Vec<(String, usize)>> {
        let sources: Vec<PathBuf> = regions
            .iter()
            .map(|region| PathBuf::from(region.gdb_path()))
            .collect();
        self.run_sources(features, &sources)
    }

    /// Same as [`run`](Self::run) but over already-resolved source
    /// containers.
    pub fn run_sources(
        &self,
        features: &mut [Feature],
        sources: &[PathBuf],
    ) -> Result<Vec<(String, usize)>> {
        info!("parsing features from {} sources", sources.len());
        let mut written = Vec::new();
        for feature in features.iter_mut() {
            let records = self.extract_feature(feature, sources)?;
            if feature.shape_type.is_none() {
                warn!(
                    "feature '{}' was present in no source, no layer written",
                    feature.name()
                );
                continue;
            }
            self.writer.write(feature, &records)?;
            info!(
                "feature layer extracted: '{}' ({} records)",
                feature.name(),
                records.len()
            );
            written.push((feature.name().to_string(), records.len()));
        }
        info!("external data parsing complete");
        Ok(written)
    }

    /// Read a feature's previously written chart layer back from the
    /// output directory, filtered by the extraction window. A feature
    /// whose chart was never written yields no records.
    pub fn read_feature_shapes(&self, feature: &Feature) -> Result<Vec<SpatialRecord>> {
        self.reader.read_chart(&self.writer.layer_path(feature))
    }

    /// Accumulate one feature's records across all sources, in source
    /// order. Sources lacking the feature's layer are skipped silently;
    /// database containers discovered by the catalog contribute via the
    /// feature's external labels afterwards.
    pub fn extract_feature(
        &self,
        feature: &mut Feature,
        sources: &[PathBuf],
    ) -> Result<Vec<SpatialRecord>> {
        // Resolved once per feature, not per record.
        let depth_label = feature.kind.depth_label();
        let threshold = self.threshold_depth();
        let layer_id = feature.kind.layer_id();

        let mut data = Vec::new();
        for source in sources {
            let layers = RecordReader::list_layers(source)?;
            if !layers.iter().any(|name| name == layer_id) {
                debug!(
                    "layer '{}' absent from '{}', skipped",
                    layer_id,
                    source.display()
                );
                continue;
            }
            let (shape_type, mut records) =
                self.reader
                    .read_layer(source, layer_id, depth_label, threshold)?;
            feature.record_shape_type(shape_type);
            data.append(&mut records);
        }

        if !feature.external_labels.is_empty() {
            for container in self.catalog.container_paths() {
                data.extend(self.reader.read_labeled_layers(
                    &container,
                    &feature.external_labels,
                    threshold,
                )?);
            }
        }
        Ok(data)
    }
}
