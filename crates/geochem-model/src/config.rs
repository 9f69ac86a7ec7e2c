//! User configuration document.
//!
//! The configuration is loaded once by the command layer and passed by
//! reference into every pipeline entry point. Nothing in the pipeline reads
//! it from disk on its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::field::SemanticField;
use crate::schema::SchemaTag;

/// Default map projection (EPSG:8059, GDA2020 / SA Lambert).
pub const DEFAULT_PROJECTION: u32 = 8059;

/// Persisted user configuration (TOML).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Map projection as an EPSG code.
    pub projection: u32,
    /// Default map extent.
    pub extent: MapExtent,
    /// Named annotation points drawn on maps.
    pub places: Vec<Place>,
    /// Average crustal abundance per element (ppm), used for normalisation.
    pub crustal_abundance: BTreeMap<String, f64>,
    /// Column mappings per schema.
    pub columns: ColumnSettings,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            projection: DEFAULT_PROJECTION,
            extent: MapExtent::default(),
            places: default_places(),
            crustal_abundance: default_crustal_abundance(),
            columns: ColumnSettings::default(),
        }
    }
}

impl UserConfig {
    /// Crustal abundance reference for `element`, if configured.
    pub fn crustal_abundance_for(&self, element: &str) -> Option<f64> {
        self.crustal_abundance
            .get(element)
            .copied()
            .filter(|value| *value > 0.0)
    }

    /// Check column keys against the semantic field names.
    ///
    /// Returns one message per unknown key.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        for schema in [SchemaTag::Sarig, SchemaTag::Generic] {
            for key in self.columns.for_schema(schema).keys() {
                if key.parse::<SemanticField>().is_err() {
                    problems.push(format!("unknown field '{key}' in [columns.{schema}]"));
                }
            }
        }
        for (element, value) in &self.crustal_abundance {
            if !value.is_finite() || *value <= 0.0 {
                problems.push(format!(
                    "crustal abundance for '{element}' must be a positive number"
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Map extent in projection coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapExtent {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Default for MapExtent {
    fn default() -> Self {
        Self {
            west: 129.0,
            east: 141.0,
            south: -38.5,
            north: -26.0,
        }
    }
}

/// Labelled map annotation point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Semantic field → header overrides, keyed by config field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    pub sarig: BTreeMap<String, String>,
    pub generic: BTreeMap<String, String>,
}

impl ColumnSettings {
    pub fn for_schema(&self, schema: SchemaTag) -> &BTreeMap<String, String> {
        match schema {
            SchemaTag::Sarig => &self.sarig,
            SchemaTag::Generic => &self.generic,
        }
    }
}

fn default_places() -> Vec<Place> {
    [
        ("Adelaide", -34.93, 138.60),
        ("Port Augusta", -32.49, 137.77),
        ("Coober Pedy", -29.01, 134.75),
        ("Ceduna", -32.13, 133.68),
        ("Roxby Downs", -30.56, 136.90),
    ]
    .into_iter()
    .map(|(label, latitude, longitude)| Place {
        label: label.to_string(),
        latitude,
        longitude,
    })
    .collect()
}

// Upper continental crust, Rudnick & Gao (2003).
fn default_crustal_abundance() -> BTreeMap<String, f64> {
    [
        ("Ag", 0.053),
        ("As", 4.8),
        ("Au", 0.0015),
        ("Ba", 624.0),
        ("Bi", 0.16),
        ("Ce", 63.0),
        ("Co", 17.3),
        ("Cr", 92.0),
        ("Cu", 28.0),
        ("Fe", 39_200.0),
        ("La", 31.0),
        ("Li", 24.0),
        ("Mn", 774.0),
        ("Mo", 1.1),
        ("Ni", 47.0),
        ("Pb", 17.0),
        ("Sb", 0.4),
        ("Sn", 2.1),
        ("Th", 10.5),
        ("U", 2.7),
        ("V", 97.0),
        ("W", 1.9),
        ("Zn", 67.0),
    ]
    .into_iter()
    .map(|(element, ppm)| (element.to_string(), ppm))
    .collect()
}
