//! Analytical method lookup.
//!
//! Laboratory method codes are mapped to a generic determination, digestion
//! and fusion type through a user-supplied CSV table.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use geochem_model::{GeochemError, Result};

/// Placeholder for codes without a lookup entry.
pub const UNKNOWN_METHOD: &str = "unknown";

#[derive(Debug, Deserialize)]
struct MethodRow {
    #[serde(rename = "CHEM_METHOD")]
    code: String,
    #[serde(rename = "DETERMINATION_CODE_RD", default)]
    determination: Option<String>,
    #[serde(rename = "DIGESTION_CODE_RD", default)]
    digestion: Option<String>,
    #[serde(rename = "FUSION_TYPE", default)]
    fusion: Option<String>,
}

/// Normalised description of one method code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub determination: String,
    pub digestion: String,
    pub fusion: String,
}

impl MethodInfo {
    fn unknown() -> Self {
        Self {
            determination: UNKNOWN_METHOD.to_string(),
            digestion: UNKNOWN_METHOD.to_string(),
            fusion: UNKNOWN_METHOD.to_string(),
        }
    }
}

/// Method code → normalised description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodLookup {
    entries: BTreeMap<String, MethodInfo>,
}

impl MethodLookup {
    /// Load a lookup table from a CSV file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|error| GeochemError::from_read(path, error))?;
        let lookup = Self::from_reader(file, path)?;
        debug!(path = %path.display(), entries = lookup.len(), "loaded method lookup");
        Ok(lookup)
    }

    /// Parse a lookup table; `path` only labels errors.
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut entries = BTreeMap::new();
        for row in csv_reader.deserialize::<MethodRow>() {
            let row = row.map_err(|error| GeochemError::csv(path, error))?;
            if row.code.is_empty() {
                continue;
            }
            let text = |value: Option<String>| {
                value
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| UNKNOWN_METHOD.to_string())
            };
            // First entry wins for duplicated codes.
            entries.entry(row.code).or_insert_with(|| MethodInfo {
                determination: text(row.determination),
                digestion: text(row.digestion),
                fusion: text(row.fusion),
            });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&MethodInfo> {
        self.entries.get(code)
    }

    /// Description for `code`, `unknown` in every slot when not listed.
    pub fn describe(&self, code: Option<&str>) -> MethodInfo {
        code.and_then(|code| self.get(code))
            .cloned()
            .unwrap_or_else(MethodInfo::unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
CHEM_METHOD,DETERMINATION_CODE_RD,DIGESTION_CODE_RD,FUSION_TYPE
ICP_MS,ICPMS,4 acid,
FA50,AAS,aqua regia,lead collection
";

    #[test]
    fn maps_known_codes_and_fills_unknown() {
        let lookup = MethodLookup::from_reader(TABLE.as_bytes(), Path::new("methods.csv")).unwrap();
        assert_eq!(lookup.len(), 2);

        let icp = lookup.describe(Some("ICP_MS"));
        assert_eq!(icp.determination, "ICPMS");
        assert_eq!(icp.fusion, UNKNOWN_METHOD);

        let missing = lookup.describe(Some("XRF1"));
        assert_eq!(missing, MethodInfo::unknown());
        assert_eq!(lookup.describe(None), MethodInfo::unknown());
    }

    #[test]
    fn missing_code_column_is_a_parse_error() {
        let err = MethodLookup::from_reader("CODE,X\nA,B\n".as_bytes(), Path::new("m.csv"))
            .unwrap_err();
        assert!(matches!(err, GeochemError::CsvParse { .. }));
    }
}
