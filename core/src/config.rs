use crate::error::Error;
use crate::similarity::SimilarityKind;
use serde::{Deserialize, Serialize};

/// Parameters fixed for the lifetime of an index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub similarity: SimilarityKind,
    pub threshold: f64,
}

impl IndexConfig {
    pub fn new(similarity: SimilarityKind, threshold: f64) -> Result<Self, Error> {
        let config = Self { similarity, threshold };
        config.validate()?;
        Ok(config)
    }

    /// Like [`IndexConfig::new`] but takes the measure by name.
    pub fn named(similarity: &str, threshold: f64) -> Result<Self, Error> {
        Self::new(similarity.parse()?, threshold)
    }

    pub fn validate(&self) -> Result<(), Error> {
        // also rejects NaN
        if self.threshold > 0.0 && self.threshold <= 1.0 {
            Ok(())
        } else {
            Err(Error::InvalidThreshold(self.threshold))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_must_be_in_unit_interval() {
        assert!(IndexConfig::new(SimilarityKind::Jaccard, 1.0).is_ok());
        assert!(IndexConfig::new(SimilarityKind::Cosine, 1e-6).is_ok());
        for bad in [0.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            let err = IndexConfig::new(SimilarityKind::Jaccard, bad).unwrap_err();
            assert!(matches!(err, Error::InvalidThreshold(_)));
        }
    }

    #[test]
    fn named_rejects_unknown_measure() {
        let err = IndexConfig::named("hamming", 0.5).unwrap_err();
        assert_eq!(err, Error::UnsupportedSimilarity("hamming".into()));
        let cfg = IndexConfig::named("containment", 0.9).unwrap();
        assert_eq!(cfg.similarity, SimilarityKind::Containment);
    }

    #[test]
    fn serializes_measure_in_lowercase() {
        let cfg = IndexConfig::new(SimilarityKind::Containment, 0.9).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(json, r#"{"similarity":"containment","threshold":0.9}"#);
    }
}
