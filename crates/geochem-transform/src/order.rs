//! Identifier ordering for sample and drillhole keys.

use std::cmp::Ordering;

/// Sort key for identifiers: numeric ids ascending by value, then every
/// other id in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdKey {
    numeric: Option<u64>,
    text: String,
}

impl IdKey {
    pub fn new(id: impl Into<String>) -> Self {
        let text = id.into();
        Self {
            numeric: text.parse().ok(),
            text,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl Ord for IdKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.text.cmp(&other.text)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.text.cmp(&other.text),
        }
    }
}

impl PartialOrd for IdKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
