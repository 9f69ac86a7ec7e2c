//! Input schema tags and the semantic column resolver.
//!
//! Every loader call resolves the semantic fields it needs exactly once,
//! through a [`ColumnMap`] built from the user configuration. The survey
//! ("sarig") schema ships with a built-in mapping that configuration may
//! override field by field; the generic schema is configured entirely by
//! the user.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::UserConfig;
use crate::error::{GeochemError, Result};
use crate::field::SemanticField;

/// Declared shape of an input file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaTag {
    /// The fixed geochemical survey export (`sarig_rs_chem_exp.csv`).
    #[default]
    Sarig,
    /// Any long-format table mapped through user configuration.
    Generic,
}

impl SchemaTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaTag::Sarig => "sarig",
            SchemaTag::Generic => "generic",
        }
    }

    /// Built-in header for `field`, if this schema defines one.
    pub fn builtin_column(self, field: SemanticField) -> Option<&'static str> {
        match self {
            SchemaTag::Sarig => Some(match field {
                SemanticField::SampleId => "SAMPLE_NO",
                SemanticField::DrillholeId => "DRILLHOLE_NUMBER",
                SemanticField::Element => "CHEM_CODE",
                SemanticField::Value => "VALUE",
                SemanticField::Unit => "UNIT",
                SemanticField::MethodCode => "CHEM_METHOD_CODE",
                SemanticField::MethodDescription => "CHEM_METHOD_DESC",
                SemanticField::SampleType => "SAMPLE_SOURCE",
                SemanticField::DepthFrom => "DH_DEPTH_FROM",
                SemanticField::DepthTo => "DH_DEPTH_TO",
                SemanticField::Longitude => "LONGITUDE_GDA2020",
                SemanticField::Latitude => "LATITUDE_GDA2020",
            }),
            SchemaTag::Generic => None,
        }
    }

    /// Columns that describe a single analysis and never carry into wide rows.
    pub fn per_analysis_columns(self) -> &'static [&'static str] {
        match self {
            SchemaTag::Sarig => &[
                "SAMPLE_ANALYSIS_NO",
                "OTHER_ANALYSIS_ID",
                "ANALYSIS_TYPE_DESC",
                "LABORATORY",
            ],
            SchemaTag::Generic => &[],
        }
    }
}

impl fmt::Display for SchemaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaTag {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sarig" => Ok(SchemaTag::Sarig),
            "generic" | "gen" | "general" => Ok(SchemaTag::Generic),
            other => Err(format!("unknown schema '{other}'")),
        }
    }
}

/// Resolved semantic field → header mapping for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    schema: SchemaTag,
    columns: BTreeMap<SemanticField, String>,
}

impl ColumnMap {
    /// Build the mapping for `schema`, layering configuration over built-ins.
    pub fn for_schema(schema: SchemaTag, config: &UserConfig) -> Self {
        let mut columns = BTreeMap::new();
        for field in SemanticField::ALL {
            if let Some(header) = schema.builtin_column(field) {
                columns.insert(field, header.to_string());
            }
        }
        for (key, header) in config.columns.for_schema(schema) {
            // Unknown keys are rejected when the configuration is loaded.
            if let Ok(field) = key.parse::<SemanticField>() {
                let header = header.trim();
                if header.is_empty() {
                    columns.remove(&field);
                } else {
                    columns.insert(field, header.to_string());
                }
            }
        }
        Self { schema, columns }
    }

    /// Built-in mapping only.
    pub fn builtin(schema: SchemaTag) -> Self {
        Self::for_schema(schema, &UserConfig::default())
    }

    pub fn schema(&self) -> SchemaTag {
        self.schema
    }

    /// Header for `field`, failing with `SchemaMapping` when unmapped.
    pub fn resolve(&self, field: SemanticField) -> Result<&str> {
        self.get(field).ok_or(GeochemError::SchemaMapping {
            field,
            schema: self.schema,
        })
    }

    pub fn get(&self, field: SemanticField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// Field mapped to `header`, if any.
    pub fn field_for(&self, header: &str) -> Option<SemanticField> {
        self.columns
            .iter()
            .find(|(_, mapped)| mapped.as_str() == header)
            .map(|(field, _)| *field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SemanticField, &str)> {
        self.columns
            .iter()
            .map(|(field, header)| (*field, header.as_str()))
    }
}
