//! Long-format analytical readings.

/// One analytical reading (one row of a long-format table).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub sample_id: String,
    /// `None` for surface samples.
    pub drillhole_id: Option<String>,
    pub element: String,
    /// Parsed value; `None` for blanks, non-detects and unparseable text.
    pub value: Option<f64>,
    /// Value cell as written in the file.
    pub raw_value: String,
    pub unit: Option<String>,
    pub method_code: Option<String>,
    pub method_description: Option<String>,
    pub sample_type: Option<String>,
    pub depth_from: Option<f64>,
    pub depth_to: Option<f64>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Sample metadata columns carried into wide output, in loader order.
    pub carried: Vec<String>,
}

impl Record {
    /// Reading of `element` for `sample_id` with an optional value.
    pub fn reading(
        sample_id: impl Into<String>,
        element: impl Into<String>,
        value: Option<f64>,
    ) -> Self {
        Self {
            sample_id: sample_id.into(),
            drillhole_id: None,
            element: element.into(),
            value,
            raw_value: value.map(format_numeric).unwrap_or_default(),
            unit: None,
            method_code: None,
            method_description: None,
            sample_type: None,
            depth_from: None,
            depth_to: None,
            longitude: None,
            latitude: None,
            carried: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_drillhole(mut self, drillhole_id: impl Into<String>) -> Self {
        self.drillhole_id = Some(drillhole_id.into());
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub fn with_method(mut self, method_code: impl Into<String>) -> Self {
        self.method_code = Some(method_code.into());
        self
    }

    #[must_use]
    pub fn with_sample_type(mut self, sample_type: impl Into<String>) -> Self {
        self.sample_type = Some(sample_type.into());
        self
    }

    #[must_use]
    pub fn with_depth(mut self, from: Option<f64>, to: Option<f64>) -> Self {
        self.depth_from = from;
        self.depth_to = to;
        self
    }

    #[must_use]
    pub fn with_location(mut self, longitude: f64, latitude: f64) -> Self {
        self.longitude = Some(longitude);
        self.latitude = Some(latitude);
        self
    }

    #[must_use]
    pub fn with_raw_value(mut self, raw: impl Into<String>) -> Self {
        self.raw_value = raw.into();
        self
    }

    pub fn is_drillhole_sample(&self) -> bool {
        self.drillhole_id.is_some()
    }

    /// Copy reduced to the narrow extraction columns.
    ///
    /// Sample type, method description and carried metadata are dropped.
    pub fn narrow(&self) -> Self {
        Self {
            sample_type: None,
            method_description: None,
            carried: Vec::new(),
            ..self.clone()
        }
    }
}

/// Normalise an identifier cell: trims, maps blanks to `None` and renders
/// float-exported integers (`6363.0`) in integral form.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(integral) = trimmed
        .strip_suffix(".0")
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    {
        return Some(integral.to_string());
    }
    Some(trimmed.to_string())
}

/// Parse a numeric cell; blanks, text and non-finite values become `None`.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("6363.0"), Some("6363".to_string()));
        assert_eq!(normalize_identifier(" 133881 "), Some("133881".to_string()));
        assert_eq!(normalize_identifier("RC-01.0"), Some("RC-01.0".to_string()));
        assert_eq!(normalize_identifier("12.5"), Some("12.5".to_string()));
        assert_eq!(normalize_identifier("   "), None);
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(" 7.8 "), Some(7.8));
        assert_eq!(parse_f64("-10"), Some(-10.0));
        assert_eq!(parse_f64("<15"), None);
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_f64("inf"), None);
        assert_eq!(parse_f64(""), None);
    }

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(1.0), "1");
        assert_eq!(format_numeric(1.5), "1.5");
        assert_eq!(format_numeric(150000.0), "150000");
        assert_eq!(format_numeric(0.0), "0");
        assert_eq!(format_numeric(-0.25), "-0.25");
    }

    #[test]
    fn narrow_drops_sample_metadata() {
        let mut record = Record::reading("9661", "Cu", Some(15.0))
            .with_drillhole("6363")
            .with_sample_type("Drill core");
        record.carried = vec!["DC".to_string()];
        let narrow = record.narrow();
        assert_eq!(narrow.sample_type, None);
        assert!(narrow.carried.is_empty());
        assert_eq!(narrow.drillhole_id.as_deref(), Some("6363"));
        assert_eq!(narrow.value, Some(15.0));
    }
}
