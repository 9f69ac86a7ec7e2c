//! Semantic field names for long-format survey columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Abstract column roles, resolved to concrete headers per schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    SampleId,
    DrillholeId,
    Element,
    Value,
    Unit,
    MethodCode,
    MethodDescription,
    SampleType,
    DepthFrom,
    DepthTo,
    Longitude,
    Latitude,
}

impl SemanticField {
    pub const ALL: [SemanticField; 12] = [
        SemanticField::SampleId,
        SemanticField::DrillholeId,
        SemanticField::Element,
        SemanticField::Value,
        SemanticField::Unit,
        SemanticField::MethodCode,
        SemanticField::MethodDescription,
        SemanticField::SampleType,
        SemanticField::DepthFrom,
        SemanticField::DepthTo,
        SemanticField::Longitude,
        SemanticField::Latitude,
    ];

    /// Fields describing one analytical reading rather than the sample.
    pub const ANALYSIS: [SemanticField; 5] = [
        SemanticField::Element,
        SemanticField::Value,
        SemanticField::Unit,
        SemanticField::MethodCode,
        SemanticField::MethodDescription,
    ];

    /// Configuration key for this field.
    pub fn as_str(self) -> &'static str {
        match self {
            SemanticField::SampleId => "sample_id",
            SemanticField::DrillholeId => "drillhole_id",
            SemanticField::Element => "element",
            SemanticField::Value => "value",
            SemanticField::Unit => "unit",
            SemanticField::MethodCode => "method_code",
            SemanticField::MethodDescription => "method_description",
            SemanticField::SampleType => "sample_type",
            SemanticField::DepthFrom => "depth_from",
            SemanticField::DepthTo => "depth_to",
            SemanticField::Longitude => "longitude",
            SemanticField::Latitude => "latitude",
        }
    }

    pub fn is_analysis(self) -> bool {
        Self::ANALYSIS.contains(&self)
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == key)
            .ok_or_else(|| format!("unknown field '{value}'"))
    }
}
