//! Element value processing.
//!
//! Cleans the raw value text (detection-limit markers), converts oxides to
//! their base element and units to ppm, and replaces below-detection values
//! with a small non-zero ppm value.

use tracing::debug;

use geochem_model::{Record, parse_f64};

/// ppm substituted for below-detection readings.
pub const BDL_PPM: f64 = 0.001;

/// ppm substituted for below-detection readings reported in ppb.
pub const BDL_PPM_FROM_PPB: f64 = 0.00001;

/// Oxide code, base element, oxide-to-element divisor.
const OXIDES: [(&str, &str, f64); 5] = [
    ("Fe2O3", "Fe", 1.4297),
    ("FeO", "Fe", 1.2865),
    ("U3O8", "U", 1.1792),
    ("CoO", "Co", 1.2715),
    ("NiO", "Ni", 1.2725),
];

/// Detection status recovered from the raw value text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DetectionFlag {
    #[default]
    Measured,
    /// `<x`, or a dash when dashes mark detection limits.
    BelowDetection,
    /// `>x`.
    OverRange,
}

impl DetectionFlag {
    /// Numeric code written to `DETECTION_FLAG`.
    pub fn code(self) -> u8 {
        match self {
            DetectionFlag::Measured => 0,
            DetectionFlag::BelowDetection => 1,
            DetectionFlag::OverRange => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Treat a `-` in the value text as below detection instead of
    /// discarding the value.
    pub dash_bdl: bool,
}

/// A reading with its ppm value and detection flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    /// Reading with the cleaned, oxide-converted value.
    pub record: Record,
    pub ppm: Option<f64>,
    pub flag: DetectionFlag,
}

impl ProcessedRecord {
    /// Reading whose value is the converted ppm, for aggregation.
    pub fn into_ppm_record(self) -> Record {
        Record {
            value: self.ppm,
            ..self.record
        }
    }
}

/// Base element and divisor for an oxide code.
pub fn oxide_factor(element: &str) -> Option<(&'static str, f64)> {
    OXIDES
        .iter()
        .find(|(oxide, _, _)| *oxide == element)
        .map(|(_, base, factor)| (*base, *factor))
}

/// Element a code reports on: the base element for oxides, else itself.
pub fn base_element(element: &str) -> &str {
    oxide_factor(element).map_or(element, |(base, _)| base)
}

/// Parse a raw value cell into a value and detection flag.
///
/// Plain non-negative numbers (including exponents such as `1e-5`) are
/// measured values. Otherwise `>` marks over-range, `<` below detection,
/// and a `-` is either below detection (`dash_bdl`) or discards the value.
pub fn detect(raw: &str, dash_bdl: bool) -> (Option<f64>, DetectionFlag) {
    let raw = raw.trim();
    if let Some(value) = parse_f64(raw).filter(|value| *value >= 0.0) {
        return (Some(value), DetectionFlag::Measured);
    }
    let has_dash = raw.contains('-');
    if has_dash && !dash_bdl {
        return (None, DetectionFlag::Measured);
    }
    let flag = if raw.contains('>') {
        DetectionFlag::OverRange
    } else if raw.contains('<') || has_dash {
        DetectionFlag::BelowDetection
    } else {
        DetectionFlag::Measured
    };
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '<' | '>' | '-')).collect();
    (parse_f64(&cleaned), flag)
}

/// Convert `value` in `unit` to ppm.
pub fn to_ppm(value: f64, unit: Option<&str>) -> f64 {
    match unit.map(str::trim) {
        Some("%") => value * 10_000.0,
        Some(unit) if unit.eq_ignore_ascii_case("ppb") => value / 1_000.0,
        _ => value,
    }
}

fn is_unit(unit: Option<&str>, expected: &str) -> bool {
    unit.is_some_and(|unit| unit.trim().eq_ignore_ascii_case(expected))
}

/// Process one reading; readings in counts per second are dropped.
pub fn process_record(record: Record, options: ProcessOptions) -> Option<ProcessedRecord> {
    let unit = record.unit.as_deref();
    if is_unit(unit, "cps") {
        return None;
    }
    let (value, flag) = detect(&record.raw_value, options.dash_bdl);
    let value = match oxide_factor(&record.element) {
        Some((_, factor)) => value.map(|value| value / factor),
        None => value,
    };
    let ppm = if flag == DetectionFlag::BelowDetection {
        Some(if is_unit(unit, "ppb") {
            BDL_PPM_FROM_PPB
        } else {
            BDL_PPM
        })
    } else {
        value.map(|value| to_ppm(value, unit))
    };
    Some(ProcessedRecord {
        record: Record { value, ..record },
        ppm,
        flag,
    })
}

/// Process a subset, dropping readings that cannot be converted to ppm.
pub fn process(records: Vec<Record>, options: ProcessOptions) -> Vec<ProcessedRecord> {
    let total = records.len();
    let processed: Vec<ProcessedRecord> = records
        .into_iter()
        .filter_map(|record| process_record(record, options))
        .collect();
    if processed.len() < total {
        debug!(dropped = total - processed.len(), "dropped cps readings");
    }
    processed
}
