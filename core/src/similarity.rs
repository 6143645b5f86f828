//! Similarity measures and the algebraic bounds prefix filtering relies on.
//!
//! Every bound here errs on the permissive side: a minimum overlap may be
//! under-estimated and a prefix or length range over-estimated, never the
//! reverse, so floating point rounding can cost extra candidates but never
//! a missed match.

use crate::error::Error;
use crate::Token;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const EPSILON: f64 = 1e-9;

fn ceil_down(x: f64) -> usize {
    (x - EPSILON).ceil().max(0.0) as usize
}

fn floor_up(x: f64) -> usize {
    let v = (x + EPSILON).floor();
    if v >= usize::MAX as f64 { usize::MAX } else { v.max(0.0) as usize }
}

/// `len - required + 1`, clamped to the record.
fn prefix_for(len: usize, required: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (len + 1).saturating_sub(required.max(1)).min(len)
}

/// Capabilities a similarity measure provides to the index.
///
/// `query_len` is always the probe side. Only [`Containment`] cares about the
/// distinction.
pub trait Measure {
    /// Exact score from the intersection size and both set sizes.
    fn score(&self, overlap: usize, query_len: usize, candidate_len: usize) -> f64;

    /// Smallest intersection for which `score >= threshold` is possible.
    fn min_overlap(&self, query_len: usize, candidate_len: usize, threshold: f64) -> usize;

    /// Number of leading rank-sorted query tokens that must be probed.
    fn probing_prefix_len(&self, len: usize, threshold: f64) -> usize;

    /// Number of leading rank-sorted tokens of an indexed record that must be posted.
    fn indexing_prefix_len(&self, len: usize, threshold: f64) -> usize {
        self.probing_prefix_len(len, threshold)
    }

    /// Inclusive range of candidate sizes that can reach `threshold` against a probe of `len`.
    fn length_bounds(&self, len: usize, threshold: f64) -> (usize, usize);
}

/// `|A ∩ B| / |A ∪ B|`
#[derive(Debug, Clone, Copy, Default)]
pub struct Jaccard;

impl Measure for Jaccard {
    fn score(&self, overlap: usize, query_len: usize, candidate_len: usize) -> f64 {
        let union = query_len + candidate_len - overlap;
        if union == 0 {
            return 0.0;
        }
        overlap as f64 / union as f64
    }

    fn min_overlap(&self, query_len: usize, candidate_len: usize, threshold: f64) -> usize {
        ceil_down(threshold / (1.0 + threshold) * (query_len + candidate_len) as f64)
    }

    fn probing_prefix_len(&self, len: usize, threshold: f64) -> usize {
        prefix_for(len, ceil_down(threshold * len as f64))
    }

    fn length_bounds(&self, len: usize, threshold: f64) -> (usize, usize) {
        (ceil_down(threshold * len as f64), floor_up(len as f64 / threshold))
    }
}

/// `|A ∩ B| / sqrt(|A| * |B|)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Cosine;

impl Measure for Cosine {
    fn score(&self, overlap: usize, query_len: usize, candidate_len: usize) -> f64 {
        if query_len == 0 || candidate_len == 0 {
            return 0.0;
        }
        overlap as f64 / ((query_len as f64) * (candidate_len as f64)).sqrt()
    }

    fn min_overlap(&self, query_len: usize, candidate_len: usize, threshold: f64) -> usize {
        ceil_down(threshold * ((query_len as f64) * (candidate_len as f64)).sqrt())
    }

    fn probing_prefix_len(&self, len: usize, threshold: f64) -> usize {
        prefix_for(len, ceil_down(threshold * threshold * len as f64))
    }

    fn length_bounds(&self, len: usize, threshold: f64) -> (usize, usize) {
        let t2 = threshold * threshold;
        (ceil_down(t2 * len as f64), floor_up(len as f64 / t2))
    }
}

/// `|A ∩ B| / |A|` where `A` is the query.
#[derive(Debug, Clone, Copy, Default)]
pub struct Containment;

impl Measure for Containment {
    fn score(&self, overlap: usize, query_len: usize, _candidate_len: usize) -> f64 {
        if query_len == 0 {
            return 0.0;
        }
        overlap as f64 / query_len as f64
    }

    fn min_overlap(&self, query_len: usize, _candidate_len: usize, threshold: f64) -> usize {
        ceil_down(threshold * query_len as f64)
    }

    fn probing_prefix_len(&self, len: usize, threshold: f64) -> usize {
        prefix_for(len, ceil_down(threshold * len as f64))
    }

    // The overlap a candidate needs depends on the query's size, which is
    // unknown at build time; a single shared token can be enough.
    fn indexing_prefix_len(&self, len: usize, _threshold: f64) -> usize {
        len
    }

    fn length_bounds(&self, len: usize, threshold: f64) -> (usize, usize) {
        (ceil_down(threshold * len as f64), usize::MAX)
    }
}

/// The closed set of supported measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityKind {
    Jaccard,
    Cosine,
    Containment,
}

impl SimilarityKind {
    pub const ALL: [SimilarityKind; 3] =
        [SimilarityKind::Jaccard, SimilarityKind::Cosine, SimilarityKind::Containment];

    pub fn name(&self) -> &'static str {
        match self {
            SimilarityKind::Jaccard => "jaccard",
            SimilarityKind::Cosine => "cosine",
            SimilarityKind::Containment => "containment",
        }
    }

    fn measure(&self) -> &'static dyn Measure {
        match self {
            SimilarityKind::Jaccard => &Jaccard,
            SimilarityKind::Cosine => &Cosine,
            SimilarityKind::Containment => &Containment,
        }
    }

    /// Brute-force score of two raw token sets, `a` being the probe side.
    pub fn similarity(&self, a: &[Token], b: &[Token]) -> f64 {
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let lookup: HashSet<Token> = small.iter().copied().collect();
        let overlap = large.iter().filter(|t| lookup.contains(t)).count();
        self.score(overlap, a.len(), b.len())
    }
}

impl Measure for SimilarityKind {
    fn score(&self, overlap: usize, query_len: usize, candidate_len: usize) -> f64 {
        self.measure().score(overlap, query_len, candidate_len)
    }

    fn min_overlap(&self, query_len: usize, candidate_len: usize, threshold: f64) -> usize {
        self.measure().min_overlap(query_len, candidate_len, threshold)
    }

    fn probing_prefix_len(&self, len: usize, threshold: f64) -> usize {
        self.measure().probing_prefix_len(len, threshold)
    }

    fn indexing_prefix_len(&self, len: usize, threshold: f64) -> usize {
        self.measure().indexing_prefix_len(len, threshold)
    }

    fn length_bounds(&self, len: usize, threshold: f64) -> (usize, usize) {
        self.measure().length_bounds(len, threshold)
    }
}

impl fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimilarityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jaccard" => Ok(SimilarityKind::Jaccard),
            "cosine" => Ok(SimilarityKind::Cosine),
            "containment" => Ok(SimilarityKind::Containment),
            _ => Err(Error::UnsupportedSimilarity(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_scenario_scores() {
        let s = SimilarityKind::Jaccard.similarity(&[1, 2, 3, 4, 5], &[1, 2, 3, 4, 6]);
        assert!((s - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(SimilarityKind::Jaccard.similarity(&[1, 2], &[3, 4]), 0.0);
    }

    #[test]
    fn containment_is_asymmetric() {
        let probe = [1, 2, 3];
        let big = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(SimilarityKind::Containment.similarity(&probe, &big), 1.0);
        assert_eq!(SimilarityKind::Containment.similarity(&big, &probe), 3.0 / 8.0);
    }

    #[test]
    fn identical_sets_score_one() {
        let a = [9, 4, 7, 1, 12];
        for kind in SimilarityKind::ALL {
            assert_eq!(kind.similarity(&a, &a), 1.0, "{kind}");
        }
    }

    #[test]
    fn empty_sets_score_zero() {
        for kind in SimilarityKind::ALL {
            assert_eq!(kind.similarity(&[], &[]), 0.0);
            assert_eq!(kind.similarity(&[], &[1]), 0.0);
        }
    }

    #[test]
    fn jaccard_bounds() {
        assert_eq!(Jaccard.min_overlap(5, 5, 0.6), 4);
        // 3 of 5 tokens must be shared: 5 - 3 + 1
        assert_eq!(Jaccard.probing_prefix_len(5, 0.6), 3);
        assert_eq!(Jaccard.length_bounds(5, 0.6), (3, 8));
        assert_eq!(Jaccard.probing_prefix_len(5, 1.0), 1);
        assert_eq!(Jaccard.probing_prefix_len(0, 0.5), 0);
    }

    #[test]
    fn cosine_bounds() {
        assert_eq!(Cosine.min_overlap(4, 9, 0.5), 3);
        assert_eq!(Cosine.probing_prefix_len(4, 0.5), 4);
        assert_eq!(Cosine.length_bounds(4, 0.5), (1, 16));
    }

    #[test]
    fn containment_indexes_everything() {
        assert_eq!(Containment.indexing_prefix_len(8, 0.9), 8);
        assert_eq!(Containment.probing_prefix_len(3, 0.9), 1);
        assert_eq!(Containment.min_overlap(3, 8, 0.9), 3);
        assert_eq!(Containment.length_bounds(3, 0.9), (3, usize::MAX));
    }

    #[test]
    fn prefix_never_exceeds_record() {
        for kind in SimilarityKind::ALL {
            for len in 0..40 {
                for t in [0.05, 0.3, 0.5, 0.75, 0.9, 1.0] {
                    assert!(kind.probing_prefix_len(len, t) <= len);
                    assert!(kind.indexing_prefix_len(len, t) <= len);
                    if len > 0 {
                        assert!(kind.probing_prefix_len(len, t) >= 1);
                    }
                }
            }
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("Jaccard".parse::<SimilarityKind>().unwrap(), SimilarityKind::Jaccard);
        assert_eq!("cosine".parse::<SimilarityKind>().unwrap(), SimilarityKind::Cosine);
        assert_eq!(
            "dice".parse::<SimilarityKind>().unwrap_err(),
            Error::UnsupportedSimilarity("dice".into())
        );
    }
}
