//! Single-element extraction.

use std::collections::BTreeMap;

use tracing::{info, warn};

use geochem_model::{FilterSpec, Record};

/// Routes readings of the requested elements into one narrow subset each.
#[derive(Debug, Clone)]
pub struct Extractor {
    subsets: BTreeMap<String, Vec<Record>>,
    drillhole_only: bool,
}

impl Extractor {
    pub fn new<I>(elements: I, drillhole_only: bool) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let subsets = elements
            .into_iter()
            .map(Into::into)
            .map(|element: String| element.trim().to_string())
            .filter(|element| !element.is_empty())
            .map(|element| (element, Vec::new()))
            .collect();
        Self {
            subsets,
            drillhole_only,
        }
    }

    /// Filter that admits exactly the rows this extractor keeps, for
    /// pushing into the reader.
    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec::default()
            .with_elements(self.subsets.keys().cloned())
            .with_drillhole_only(self.drillhole_only)
    }

    pub fn push(&mut self, record: &Record) {
        if self.drillhole_only && !record.is_drillhole_sample() {
            return;
        }
        if let Some(subset) = self.subsets.get_mut(&record.element) {
            subset.push(record.narrow());
        }
    }

    pub fn push_batch(&mut self, batch: &[Record]) {
        for record in batch {
            self.push(record);
        }
    }

    /// One subset per requested element, in element order.
    ///
    /// Elements without rows keep an empty subset and log a warning.
    pub fn finish(self) -> BTreeMap<String, Vec<Record>> {
        for (element, rows) in &self.subsets {
            if rows.is_empty() {
                warn!(element = %element, "no rows found for element");
            } else {
                info!(element = %element, rows = rows.len(), "extracted element");
            }
        }
        self.subsets
    }
}

/// Split `records` into one narrow subset per requested element.
pub fn extract<I>(records: &[Record], elements: I, drillhole_only: bool) -> BTreeMap<String, Vec<Record>>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut extractor = Extractor::new(elements, drillhole_only);
    extractor.push_batch(records);
    extractor.finish()
}
