//! Header resolution for one opened file.

use std::path::Path;

use csv::StringRecord;

use geochem_model::{
    ColumnMap, GeochemError, Result, SchemaTag, SemanticField, normalize_identifier, parse_f64,
};

/// Semantic field → column index, resolved once when a file is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    schema: SchemaTag,
    indices: [Option<usize>; SemanticField::ALL.len()],
    carried: Vec<usize>,
    carried_headers: Vec<String>,
}

impl ResolvedColumns {
    /// Resolve `required` and `optional` fields against `headers`.
    ///
    /// Required fields must be mapped and present; optional fields are
    /// resolved only when both hold.
    pub fn resolve(
        path: &Path,
        headers: &[String],
        columns: &ColumnMap,
        required: &[SemanticField],
        optional: &[SemanticField],
        carry_metadata: bool,
    ) -> Result<Self> {
        let mut indices = [None; SemanticField::ALL.len()];
        for &field in required {
            let header = columns.resolve(field)?;
            let idx = position(headers, header).ok_or_else(|| GeochemError::MissingColumn {
                field,
                column: header.to_string(),
                path: path.to_path_buf(),
            })?;
            indices[field as usize] = Some(idx);
        }
        for &field in optional {
            if indices[field as usize].is_some() {
                continue;
            }
            if let Some(header) = columns.get(field) {
                indices[field as usize] = position(headers, header);
            }
        }

        let mut carried = Vec::new();
        let mut carried_headers = Vec::new();
        if carry_metadata {
            let per_analysis = columns.schema().per_analysis_columns();
            for (idx, header) in headers.iter().enumerate() {
                let skip = match columns.field_for(header) {
                    Some(field) => field.is_analysis() || field == SemanticField::SampleId,
                    None => per_analysis.contains(&header.as_str()),
                };
                if !skip && !header.is_empty() {
                    carried.push(idx);
                    carried_headers.push(header.clone());
                }
            }
        }

        Ok(Self {
            schema: columns.schema(),
            indices,
            carried,
            carried_headers,
        })
    }

    pub fn schema(&self) -> SchemaTag {
        self.schema
    }

    pub fn index(&self, field: SemanticField) -> Option<usize> {
        self.indices[field as usize]
    }

    pub fn has(&self, field: SemanticField) -> bool {
        self.index(field).is_some()
    }

    /// Headers of the sample metadata columns carried into wide rows.
    pub fn carried_headers(&self) -> &[String] {
        &self.carried_headers
    }

    /// Trimmed text of `field`, `None` when unresolved or blank.
    pub fn text<'r>(&self, row: &'r StringRecord, field: SemanticField) -> Option<&'r str> {
        self.index(field)
            .and_then(|idx| row.get(idx))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn identifier(&self, row: &StringRecord, field: SemanticField) -> Option<String> {
        self.text(row, field).and_then(normalize_identifier)
    }

    pub fn number(&self, row: &StringRecord, field: SemanticField) -> Option<f64> {
        self.text(row, field).and_then(parse_f64)
    }

    pub fn carried_values(&self, row: &StringRecord) -> Vec<String> {
        self.carried
            .iter()
            .map(|&idx| row.get(idx).map(str::trim).unwrap_or("").to_string())
            .collect()
    }
}

fn position(headers: &[String], header: &str) -> Option<usize> {
    headers
        .iter()
        .position(|candidate| candidate == header)
        .or_else(|| {
            headers
                .iter()
                .position(|candidate| candidate.eq_ignore_ascii_case(header))
        })
}

pub(crate) fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn resolves_case_insensitively() {
        let map = ColumnMap::builtin(SchemaTag::Sarig);
        let headers = headers(&["sample_no", "CHEM_CODE", "VALUE"]);
        let resolved = ResolvedColumns::resolve(
            Path::new("in.csv"),
            &headers,
            &map,
            &[SemanticField::SampleId, SemanticField::Element],
            &[SemanticField::Value, SemanticField::Unit],
            false,
        )
        .unwrap();
        assert_eq!(resolved.index(SemanticField::SampleId), Some(0));
        assert_eq!(resolved.index(SemanticField::Value), Some(2));
        assert!(!resolved.has(SemanticField::Unit));
    }

    #[test]
    fn missing_required_column_is_named() {
        let map = ColumnMap::builtin(SchemaTag::Sarig);
        let headers = headers(&["SAMPLE_NO", "VALUE"]);
        let err = ResolvedColumns::resolve(
            Path::new("in.csv"),
            &headers,
            &map,
            &[SemanticField::Element],
            &[],
            false,
        )
        .unwrap_err();
        match err {
            GeochemError::MissingColumn { field, column, .. } => {
                assert_eq!(field, SemanticField::Element);
                assert_eq!(column, "CHEM_CODE");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn carries_sample_metadata_only() {
        let map = ColumnMap::builtin(SchemaTag::Sarig);
        let headers = headers(&[
            "SAMPLE_NO",
            "SAMPLE_SOURCE_CODE",
            "DRILLHOLE_NUMBER",
            "LABORATORY",
            "CHEM_CODE",
            "VALUE",
            "UNIT",
            "LONGITUDE_GDA2020",
        ]);
        let resolved = ResolvedColumns::resolve(
            Path::new("in.csv"),
            &headers,
            &map,
            &[SemanticField::SampleId, SemanticField::Element],
            &[],
            true,
        )
        .unwrap();
        assert_eq!(
            resolved.carried_headers(),
            &["SAMPLE_SOURCE_CODE", "DRILLHOLE_NUMBER", "LONGITUDE_GDA2020"]
        );
    }
}
