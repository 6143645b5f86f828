//! Candidate generation and verification.

use crate::error::{Error, RecordLocation};
use crate::index::SearchIndex;
use crate::similarity::Measure;
use crate::{Rank, RecordId, Token};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An indexed record that reached the threshold, with its exact score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub record_id: RecordId,
    pub score: f64,
}

#[derive(Debug)]
struct Candidate {
    record: RecordId,
    /// Shared tokens seen so far; exact for ranks up to the last hit.
    overlap: usize,
    /// Positions of the last shared token in the query and the candidate.
    query_pos: usize,
    record_pos: usize,
    pruned: bool,
}

impl SearchIndex {
    /// Every indexed record scoring at least the index threshold against `record`.
    ///
    /// Hits come back in the order candidates were first met; sort them if a
    /// stable order matters. Fails only when `record` repeats a token.
    pub fn query(&self, record: &[Token]) -> Result<Vec<SearchHit>, Error> {
        let query = self.table.rank_record(record, RecordLocation::Query)?;
        let q_len = query.len();
        if q_len == 0 {
            return Ok(Vec::new());
        }

        let similarity = self.config.similarity;
        let threshold = self.config.threshold;
        let prefix = similarity.probing_prefix_len(q_len, threshold);
        let (min_len, max_len) = similarity.length_bounds(q_len, threshold);

        let mut slots: HashMap<RecordId, usize> = HashMap::new();
        let mut candidates: Vec<Candidate> = Vec::new();

        // Unseen tokens sort after every known rank, so taking from the known
        // ranks alone leaves them out of the probe.
        for (q_pos, &rank) in query.ranks.iter().take(prefix).enumerate() {
            for posting in self.postings.list(rank) {
                let c_len = self.records[posting.record as usize].len();
                if c_len < min_len || c_len > max_len {
                    continue;
                }
                let slot = *slots.entry(posting.record).or_insert_with(|| {
                    candidates.push(Candidate {
                        record: posting.record,
                        overlap: 0,
                        query_pos: 0,
                        record_pos: 0,
                        pruned: false,
                    });
                    candidates.len() - 1
                });
                let candidate = &mut candidates[slot];
                if candidate.pruned {
                    continue;
                }

                let r_pos = posting.position as usize;
                let reachable = candidate.overlap + 1 + (q_len - q_pos - 1).min(c_len - r_pos - 1);
                if reachable < similarity.min_overlap(q_len, c_len, threshold) {
                    candidate.pruned = true;
                    continue;
                }
                candidate.overlap += 1;
                candidate.query_pos = q_pos;
                candidate.record_pos = r_pos;
            }
        }

        let mut hits = Vec::new();
        for candidate in candidates.iter().filter(|c| !c.pruned) {
            let ranks = &self.records[candidate.record as usize];
            let c_len = ranks.len();
            let reachable = candidate.overlap
                + (q_len - candidate.query_pos - 1).min(c_len - candidate.record_pos - 1);
            if reachable < similarity.min_overlap(q_len, c_len, threshold) {
                continue;
            }

            let overlap = candidate.overlap
                + overlap_count(&query.ranks[candidate.query_pos + 1..], &ranks[candidate.record_pos + 1..]);
            let score = similarity.score(overlap, q_len, c_len);
            if score >= threshold {
                hits.push(SearchHit { record_id: candidate.record, score });
            }
        }

        tracing::trace!(q_len, prefix, candidates = candidates.len(), hits = hits.len(), "query");
        Ok(hits)
    }
}

/// Intersection size of two ascending rank lists.
fn overlap_count(a: &[Rank], b: &[Rank]) -> usize {
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                n += 1;
                i += 1;
                j += 1;
            }
        }
    }
    n
}
