use gdal::vector::{geometry_type_to_name, OGRwkbGeometryType};

use crate::error::{Error, Result};

/// Terrain classes supported by the Kartverket depth-data releases, in
/// canonical order.
pub const SUPPORTED_FEATURES: &[&str] = &["seabed", "land", "rocks", "shallows", "shore"];

/// Axis-aligned extraction window in EPSG:25833 easting/northing meters.
///
/// Built once from an origin and a window size, read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_easting: f64,
    pub min_northing: f64,
    pub max_easting: f64,
    pub max_northing: f64,
}

impl BoundingBox {
    pub fn new(origin: (f64, f64), size: (f64, f64)) -> Result<Self> {
        if !origin.0.is_finite() || !origin.1.is_finite() {
            return Err(Error::OriginFormat(format!("{},{}", origin.0, origin.1)));
        }
        // A negative or NaN extent would break the min <= max invariant.
        if !(size.0 >= 0.0 && size.1 >= 0.0) {
            return Err(Error::WindowSize(size.0, size.1));
        }
        Ok(Self {
            min_easting: origin.0,
            min_northing: origin.1,
            max_easting: origin.0 + size.0,
            max_northing: origin.1 + size.1,
        })
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (
            self.min_easting,
            self.min_northing,
            self.max_easting,
            self.max_northing,
        )
    }
}

/// Parse an "easting,northing" pair as given on the command line.
pub fn parse_origin(text: &str) -> Result<(f64, f64)> {
    parse_pair(text).ok_or_else(|| Error::OriginFormat(text.to_string()))
}

/// Parse a "width,height" pair as given on the command line.
pub fn parse_size(text: &str) -> Result<(f64, f64)> {
    parse_pair(text).ok_or_else(|| Error::SizeFormat(text.to_string()))
}

fn parse_pair(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split(',');
    let first = parts.next()?.trim().parse().ok()?;
    let second = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((first, second))
}

/// Output geometry kind, always with the `Multi` qualifier stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Point,
    Polygon,
}

/// Strip the dimensionality markers from a wkb geometry type: the
/// legacy 2.5D flag bit and the ISO Z/M/ZM offsets. Kartverket depth
/// layers routinely declare Z-bearing geometry.
pub fn flatten_wkb(ty: OGRwkbGeometryType::Type) -> OGRwkbGeometryType::Type {
    let ty = ty & !0x8000_0000;
    if (1000..4000).contains(&ty) {
        ty % 1000
    } else {
        ty
    }
}

impl ShapeType {
    /// Map an OGR schema geometry type to the simplified output kind.
    /// Multi variants collapse to their member kind and Z/M variants to
    /// their 2D base.
    pub fn from_wkb(ty: OGRwkbGeometryType::Type) -> Result<Self> {
        match flatten_wkb(ty) {
            OGRwkbGeometryType::wkbPoint | OGRwkbGeometryType::wkbMultiPoint => Ok(Self::Point),
            OGRwkbGeometryType::wkbPolygon | OGRwkbGeometryType::wkbMultiPolygon => {
                Ok(Self::Polygon)
            }
            other => Err(Error::UnsupportedGeometry {
                found: geometry_type_to_name(other),
            }),
        }
    }

    pub fn to_wkb(self) -> OGRwkbGeometryType::Type {
        match self {
            Self::Point => OGRwkbGeometryType::wkbPoint,
            Self::Polygon => OGRwkbGeometryType::wkbPolygon,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::Polygon => "Polygon",
        }
    }
}

/// Normalized record geometry: a bare coordinate pair, or the exterior
/// ring of a polygon with all holes already discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeCoords {
    Point((f64, f64)),
    Ring(Vec<(f64, f64)>),
}

/// The unit flowing through the pipeline. `depth` is 0 whenever the
/// source layer defines no depth attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRecord {
    pub depth: f64,
    pub coords: ShapeCoords,
}

/// Secondary depth-bearing layer descriptor for layered containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalLabel {
    /// All intersecting records pass through unfiltered.
    Layer(String),
    /// Only records with `properties[depth_label] >= threshold` pass.
    DepthFiltered { layer: String, depth_label: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Seabed,
    Land,
    Rocks,
    Shallows,
    Shore,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 5] = [
        FeatureKind::Seabed,
        FeatureKind::Land,
        FeatureKind::Rocks,
        FeatureKind::Shallows,
        FeatureKind::Shore,
    ];

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "seabed" => Ok(Self::Seabed),
            "land" => Ok(Self::Land),
            "rocks" => Ok(Self::Rocks),
            "shallows" => Ok(Self::Shallows),
            "shore" => Ok(Self::Shore),
            other => Err(Error::FeatureName {
                name: other.to_string(),
                candidates: SUPPORTED_FEATURES,
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Seabed => "seabed",
            Self::Land => "land",
            Self::Rocks => "rocks",
            Self::Shallows => "shallows",
            Self::Shore => "shore",
        }
    }

    /// Source layer identifier inside the regional containers.
    pub fn layer_id(self) -> &'static str {
        match self {
            Self::Seabed => "dybdeareal",
            Self::Land => "landareal",
            Self::Rocks => "skjer",
            Self::Shallows => "grunne",
            Self::Shore => "torrfall",
        }
    }

    /// Depth attribute to read from record properties, or `None` meaning
    /// "no depth, always 0". Resolved once per feature, never per record.
    pub fn depth_label(self) -> Option<&'static str> {
        match self {
            Self::Seabed => Some("minimumsdybde"),
            Self::Shallows => Some("dybde"),
            _ => None,
        }
    }
}

/// A terrain class bound to its source layer, its shape type discovered
/// lazily from the first source read.
#[derive(Debug, Clone)]
pub struct Feature {
    pub kind: FeatureKind,
    /// Set exactly once upon the first successful read; later sources
    /// are assumed to carry the same geometry kind.
    pub shape_type: Option<ShapeType>,
    pub external_labels: Vec<ExternalLabel>,
}

impl Feature {
    /// Feature with the default external label for its own layer. The
    /// labels make every discovered catalog container contribute
    /// records in addition to the regional sources; a region present
    /// both as a zip release and as an extracted `.gdb` under a catalog
    /// path would therefore be accumulated twice. Use
    /// [`without_external_labels`](Self::without_external_labels) to
    /// read from the regional sources only.
    pub fn new(kind: FeatureKind) -> Self {
        let external_labels = match kind.depth_label() {
            Some(label) => vec![ExternalLabel::DepthFiltered {
                layer: kind.layer_id().to_string(),
                depth_label: label.to_string(),
            }],
            None => vec![ExternalLabel::Layer(kind.layer_id().to_string())],
        };
        Self {
            kind,
            shape_type: None,
            external_labels,
        }
    }

    /// Feature that reads from the regional sources only, never from
    /// catalog containers.
    pub fn without_external_labels(kind: FeatureKind) -> Self {
        Self {
            kind,
            shape_type: None,
            external_labels: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn record_shape_type(&mut self, shape_type: ShapeType) {
        if self.shape_type.is_none() {
            self.shape_type = Some(shape_type);
        }
    }
}

/// Validates requested feature names against the supported terrain set.
pub struct FeatureCatalog;

impl FeatureCatalog {
    /// Resolve a list of feature names, or the full supported set when
    /// no names are given.
    pub fn resolve(names: Option<&[String]>) -> Result<Vec<Feature>> {
        match names {
            Some(names) if !names.is_empty() => names
                .iter()
                .map(|name| Ok(Feature::new(FeatureKind::from_name(name)?)))
                .collect(),
            _ => Ok(FeatureKind::ALL.into_iter().map(Feature::new).collect()),
        }
    }
}
