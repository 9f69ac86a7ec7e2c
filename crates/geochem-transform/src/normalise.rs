//! Crustal abundance normalisation.

use tracing::warn;

use geochem_model::UserConfig;

use crate::process::base_element;

/// Column holding ppm values divided by the crustal abundance reference.
pub const NORMALISED_COLUMN: &str = "NORMALISED_CRUSTAL_ABUNDANCE";

/// Divides ppm values by the configured abundance of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Normaliser {
    element: String,
    reference: Option<f64>,
}

impl Normaliser {
    /// Look up the reference for `element` (oxides use their base element).
    pub fn new(element: &str, config: &UserConfig) -> Self {
        let base = base_element(element);
        let reference = config.crustal_abundance_for(base);
        if reference.is_none() {
            warn!(
                element = %base,
                "no crustal abundance reference configured; normalised column left empty"
            );
        }
        Self {
            element: base.to_string(),
            reference,
        }
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn reference(&self) -> Option<f64> {
        self.reference
    }

    pub fn apply(&self, ppm: Option<f64>) -> Option<f64> {
        ppm.zip(self.reference).map(|(ppm, reference)| ppm / reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divides_by_reference() {
        let mut config = UserConfig::default();
        config.crustal_abundance.insert("Cu".to_string(), 28.0);
        let normaliser = Normaliser::new("Cu", &config);
        assert_eq!(normaliser.apply(Some(56.0)), Some(2.0));
        assert_eq!(normaliser.apply(None), None);
    }

    #[test]
    fn oxides_use_base_element() {
        let mut config = UserConfig::default();
        config.crustal_abundance.insert("Fe".to_string(), 39_200.0);
        let normaliser = Normaliser::new("Fe2O3", &config);
        assert_eq!(normaliser.element(), "Fe");
        assert_eq!(normaliser.reference(), Some(39_200.0));
    }

    #[test]
    fn missing_reference_leaves_values_empty() {
        let mut config = UserConfig::default();
        config.crustal_abundance.clear();
        let normaliser = Normaliser::new("Cu", &config);
        assert_eq!(normaliser.apply(Some(10.0)), None);
    }
}
