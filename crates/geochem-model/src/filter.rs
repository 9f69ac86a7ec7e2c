//! Filter specification for long-format readings.

use std::collections::BTreeSet;

use crate::record::{Record, normalize_identifier};

/// Immutable conjunction of membership filters.
///
/// An empty membership list places no restriction on its dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    elements: BTreeSet<String>,
    sample_types: BTreeSet<String>,
    drillholes: BTreeSet<String>,
    drillhole_only: bool,
}

impl FilterSpec {
    pub fn new<E, S, D>(elements: E, sample_types: S, drillholes: D, drillhole_only: bool) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            elements: collect_trimmed(elements),
            sample_types: collect_trimmed(sample_types),
            drillholes: drillholes
                .into_iter()
                .map(Into::into)
                .filter_map(|id: String| normalize_identifier(&id))
                .collect(),
            drillhole_only,
        }
    }

    /// Restrict to the given element codes.
    #[must_use]
    pub fn with_elements<E>(mut self, elements: E) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
    {
        self.elements = collect_trimmed(elements);
        self
    }

    #[must_use]
    pub fn with_drillhole_only(mut self, drillhole_only: bool) -> Self {
        self.drillhole_only = drillhole_only;
        self
    }

    pub fn elements(&self) -> &BTreeSet<String> {
        &self.elements
    }

    pub fn sample_types(&self) -> &BTreeSet<String> {
        &self.sample_types
    }

    pub fn drillholes(&self) -> &BTreeSet<String> {
        &self.drillholes
    }

    pub fn drillhole_only(&self) -> bool {
        self.drillhole_only
    }

    /// True when every row passes.
    pub fn is_unrestricted(&self) -> bool {
        !self.drillhole_only
            && self.elements.is_empty()
            && self.sample_types.is_empty()
            && self.drillholes.is_empty()
    }

    /// Evaluate the predicate on raw field values.
    ///
    /// Checks run cheapest first: the null test, then the element list
    /// (usually the most selective), then sample types and drillhole ids.
    pub fn admits(&self, element: &str, sample_type: Option<&str>, drillhole: Option<&str>) -> bool {
        if self.drillhole_only && drillhole.is_none() {
            return false;
        }
        if !self.elements.is_empty() && !self.elements.contains(element) {
            return false;
        }
        if !self.sample_types.is_empty()
            && !sample_type.is_some_and(|value| self.sample_types.contains(value))
        {
            return false;
        }
        if !self.drillholes.is_empty()
            && !drillhole.is_some_and(|value| self.drillholes.contains(value))
        {
            return false;
        }
        true
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.admits(
            &record.element,
            record.sample_type.as_deref(),
            record.drillhole_id.as_deref(),
        )
    }
}

fn collect_trimmed<I>(values: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    values
        .into_iter()
        .map(Into::into)
        .map(|value: String| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}
