use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Region names recognized by the Kartverket depth-data releases.
/// Matching is exact, including diacritics.
pub const SUPPORTED_REGIONS: &[&str] = &[
    "Agder",
    "Hele landet",
    "Møre og Romsdal",
    "Nordland",
    "Nordsjøen",
    "Norge",
    "Oslo",
    "Rogaland",
    "Svalbard",
    "Troms og Finnmark",
    "Trøndelag",
    "Vestfold og Telemark",
    "Vestland",
    "Viken",
];

/// Default directory holding the regional FGDB zip releases.
pub const DEFAULT_CHARTS_DIR: &str = "data/external";

const FILE_PREFIX: &str = "Basisdata";
const FILE_SUFFIX: &str = "FGDB.zip";
const FILE_DATA_TYPE: &str = "Dybdedata";
const FILE_PROJECTION: &str = "25833";

/// A validated region with its resolved on-disk source container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    name: &'static str,
    file_name: String,
    charts_dir: PathBuf,
}

impl Region {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Internal identifier used in release file names: diacritics
    /// transliterated, spaces replaced by underscores.
    pub fn id(&self) -> String {
        transliterate(self.name)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// OGR virtual path into the FileGDB inside the zip release.
    pub fn gdb_path(&self) -> String {
        let db_file = self.file_name.replace(".zip", ".gdb");
        format!(
            "/vsizip/{}/{}",
            self.charts_dir.join(&self.file_name).display(),
            db_file
        )
    }
}

/// Maps user-supplied region names to their source containers found in
/// the external charts directory.
#[derive(Debug, Clone)]
pub struct RegionResolver {
    charts_dir: PathBuf,
}

impl RegionResolver {
    pub fn new(charts_dir: impl Into<PathBuf>) -> Self {
        Self {
            charts_dir: charts_dir.into(),
        }
    }

    /// Validate a region name and locate its release file. Fails closed:
    /// an unknown name, a missing file and a file that does not match the
    /// release naming template are three distinct errors.
    pub fn resolve(&self, name: &str) -> Result<Region> {
        let canonical = canonical_name(name)?;
        let listing = self.dir_listing()?;
        let file_name = validate_file_name(canonical, &listing, &self.charts_dir)?;
        Ok(Region {
            name: canonical,
            file_name,
            charts_dir: self.charts_dir.clone(),
        })
    }

    /// Resolve a sequence of names, each validated independently. Order
    /// and duplicates are preserved.
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Region>> {
        names.iter().map(|name| self.resolve(name.as_ref())).collect()
    }

    fn dir_listing(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.charts_dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// Validate a name against the supported set and canonicalize the
/// whole-country alias.
fn canonical_name(name: &str) -> Result<&'static str> {
    let canonical = SUPPORTED_REGIONS
        .iter()
        .find(|region| **region == name)
        .ok_or_else(|| Error::RegionName {
            name: name.to_string(),
            candidates: SUPPORTED_REGIONS,
        })?;
    Ok(if *canonical == "Hele landet" {
        "Norge"
    } else {
        canonical
    })
}

pub fn transliterate(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'æ' => 'e',
            'ø' => 'o',
            'å' => 'a',
            ' ' => '_',
            other => other,
        })
        .collect()
}

fn validate_file_name(name: &'static str, listing: &[String], dir: &Path) -> Result<String> {
    let id = transliterate(name);
    // Substring containment picks the candidate; if a region id ever
    // contained '_' itself this could latch onto an unrelated file, an
    // ambiguity inherited from the release naming convention.
    for file_name in listing {
        if file_name.contains(&id) {
            return if matches_template(file_name) {
                Ok(file_name.clone())
            } else {
                Err(Error::RegionFileTemplate {
                    name: name.to_string(),
                    file_name: file_name.clone(),
                    template: format!(
                        "{FILE_PREFIX}_<int>_{id}_{FILE_PROJECTION}_{FILE_DATA_TYPE}_{FILE_SUFFIX}"
                    ),
                })
            };
        }
    }
    Err(Error::RegionFileNotFound {
        name: name.to_string(),
        dir: dir.to_path_buf(),
    })
}

/// Check the four fixed tokens of the release naming template: constant
/// prefix up front, then suffix, data type and projection code counted
/// from the end.
fn matches_template(file_name: &str) -> bool {
    let items: Vec<&str> = file_name.split('_').collect();
    if items.len() < 4 {
        return false;
    }
    let form = (
        items[0],
        items[items.len() - 1],
        items[items.len() - 2],
        items[items.len() - 3],
    );
    form == (FILE_PREFIX, FILE_SUFFIX, FILE_DATA_TYPE, FILE_PROJECTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn charts_dir(file_names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in file_names {
            File::create(dir.path().join(name)).unwrap();
        }
        dir
    }

    #[test]
    fn test_transliteration_removes_diacritics_and_spaces() {
        for name in SUPPORTED_REGIONS {
            let id = transliterate(name);
            assert!(
                !id.contains(['æ', 'ø', 'å', ' ']),
                "id '{}' still carries diacritics or spaces",
                id
            );
        }
        assert_eq!(transliterate("Møre og Romsdal"), "More_og_Romsdal");
        assert_eq!(transliterate("Trøndelag"), "Trondelag");
        assert_eq!(transliterate("Nordsjøen"), "Nordsjoen");
    }

    #[test]
    fn test_resolve_supported_region() {
        let dir = charts_dir(&["Basisdata_66_Agder_25833_Dybdedata_FGDB.zip"]);
        let resolver = RegionResolver::new(dir.path());

        let region = resolver.resolve("Agder").unwrap();
        assert_eq!(region.name(), "Agder");
        assert_eq!(region.id(), "Agder");
        assert_eq!(
            region.file_name(),
            "Basisdata_66_Agder_25833_Dybdedata_FGDB.zip"
        );
    }

    #[test]
    fn test_resolve_region_with_diacritics() {
        let dir = charts_dir(&["Basisdata_15_More_og_Romsdal_25833_Dybdedata_FGDB.zip"]);
        let resolver = RegionResolver::new(dir.path());

        let region = resolver.resolve("Møre og Romsdal").unwrap();
        assert_eq!(region.id(), "More_og_Romsdal");
    }

    #[test]
    fn test_whole_country_alias_is_canonicalized() {
        let dir = charts_dir(&["Basisdata_0000_Norge_25833_Dybdedata_FGDB.zip"]);
        let resolver = RegionResolver::new(dir.path());

        let region = resolver.resolve("Hele landet").unwrap();
        assert_eq!(region.name(), "Norge");
    }

    #[test]
    fn test_unknown_region_lists_all_candidates() {
        let dir = charts_dir(&[]);
        let resolver = RegionResolver::new(dir.path());

        let err = resolver.resolve("Atlantis").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Atlantis"));
        for name in SUPPORTED_REGIONS {
            assert!(message.contains(name), "missing candidate '{}'", name);
        }
    }

    #[test]
    fn test_missing_release_file_is_not_found() {
        let dir = charts_dir(&["Basisdata_66_Agder_25833_Dybdedata_FGDB.zip"]);
        let resolver = RegionResolver::new(dir.path());

        let err = resolver.resolve("Viken").unwrap_err();
        assert!(matches!(err, Error::RegionFileNotFound { .. }));
    }

    #[test]
    fn test_malformed_release_file_fails_template_check() {
        let dir = charts_dir(&["Agder_dump.zip"]);
        let resolver = RegionResolver::new(dir.path());

        let err = resolver.resolve("Agder").unwrap_err();
        assert!(matches!(err, Error::RegionFileTemplate { .. }));
    }

    #[test]
    fn test_resolve_all_preserves_order_and_duplicates() {
        let dir = charts_dir(&[
            "Basisdata_66_Agder_25833_Dybdedata_FGDB.zip",
            "Basisdata_03_Oslo_25833_Dybdedata_FGDB.zip",
        ]);
        let resolver = RegionResolver::new(dir.path());

        let regions = resolver
            .resolve_all(&["Oslo", "Agder", "Oslo"])
            .unwrap();
        let names: Vec<_> = regions.iter().map(Region::name).collect();
        assert_eq!(names, ["Oslo", "Agder", "Oslo"]);
    }

    #[test]
    fn test_gdb_path_targets_zipped_container() {
        let dir = charts_dir(&["Basisdata_66_Agder_25833_Dybdedata_FGDB.zip"]);
        let resolver = RegionResolver::new(dir.path());

        let path = resolver.resolve("Agder").unwrap().gdb_path();
        assert!(path.starts_with("/vsizip/"));
        assert!(path.ends_with("Basisdata_66_Agder_25833_Dybdedata_FGDB.gdb"));
        assert!(path.contains("Basisdata_66_Agder_25833_Dybdedata_FGDB.zip"));
    }

    #[test]
    fn test_template_tokens_counted_from_the_end() {
        assert!(matches_template(
            "Basisdata_21_Svalbard_25833_Dybdedata_FGDB.zip"
        ));
        // Wrong projection code
        assert!(!matches_template(
            "Basisdata_21_Svalbard_4326_Dybdedata_FGDB.zip"
        ));
        // Wrong data type token
        assert!(!matches_template(
            "Basisdata_21_Svalbard_25833_Hoydedata_FGDB.zip"
        ));
        assert!(!matches_template("Svalbard.zip"));
    }
}
