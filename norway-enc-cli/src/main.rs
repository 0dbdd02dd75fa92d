use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use norway_enc::model::{parse_origin, parse_size, FeatureCatalog};
use norway_enc::reader::route_gdal_messages;
use norway_enc::region::DEFAULT_CHARTS_DIR;
use norway_enc::writer::DEFAULT_OUTPUT_DIR;
use norway_enc::{BoundingBox, ExtractionPipeline, LayerWriter, RegionResolver, SourceCatalog};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Extraction window origin as "easting,northing" in meters (EPSG:25833)
    #[arg(long, value_name = "E,N")]
    origin: String,

    /// Extraction window size as "width,height" in meters
    #[arg(long, value_name = "W,H")]
    size: String,

    /// Region name; repeat to merge several regions in the given order
    #[arg(short, long = "region", value_name = "NAME", required = true)]
    regions: Vec<String>,

    /// Feature names to extract (defaults to all supported features)
    #[arg(short, long = "feature", value_name = "NAME")]
    features: Vec<String>,

    /// Depth bins; the first bin is the minimum-depth threshold
    #[arg(long, value_delimiter = ',', value_name = "D,D,...")]
    depths: Option<Vec<i32>>,

    /// Directory holding the regional FGDB zip releases
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CHARTS_DIR)]
    charts_dir: PathBuf,

    /// Additional directories to scan for .gdb database containers
    #[arg(long = "path", value_name = "DIR")]
    paths: Vec<PathBuf>,

    /// Output directory for the extracted layers
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let start_time = Instant::now();

    // Keep GDAL's warning chatter out of the output stream.
    route_gdal_messages();

    let origin = parse_origin(&args.origin)?;
    let size = parse_size(&args.size)?;
    let bbox = BoundingBox::new(origin, size)?;

    let resolver = RegionResolver::new(&args.charts_dir);
    let regions = resolver
        .resolve_all(&args.regions)
        .context("failed to resolve requested regions")?;

    let names = if args.features.is_empty() {
        None
    } else {
        Some(args.features.as_slice())
    };
    let mut features = FeatureCatalog::resolve(names)?;

    let catalog = SourceCatalog::new(args.paths)?;
    let writer = LayerWriter::new(&args.output);
    let pipeline = ExtractionPipeline::new(bbox, catalog, writer, args.depths)?;

    let written = pipeline.run(&mut features, &regions)?;
    for (name, count) in &written {
        info!("extracted '{}': {} records", name, count);
    }

    info!("Total processing time: {:?}", start_time.elapsed());
    Ok(())
}
