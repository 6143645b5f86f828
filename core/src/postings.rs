//! Posting lists stored in one contiguous arena.

use crate::{Rank, RecordId};
use anyhow::bail;
use serde::{Deserialize, Serialize};

/// One prefix occurrence of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub record: RecordId,
    /// Position of the token within the record's rank-sorted token list.
    pub position: u32,
}

/// Posting lists for every rank, laid out back to back.
///
/// The list for rank `r` is `entries[offsets[r]..offsets[r + 1]]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingArena {
    offsets: Vec<usize>,
    entries: Vec<Posting>,
}

impl PostingArena {
    /// Lay out postings for `records`, posting the first `prefix_lens[i]`
    /// ranks of record `i`.
    ///
    /// Records are visited in id order, so every list is ascending by record.
    pub fn build(num_ranks: usize, records: &[Vec<Rank>], prefix_lens: &[usize]) -> Self {
        debug_assert_eq!(records.len(), prefix_lens.len());

        let mut offsets = vec![0usize; num_ranks + 1];
        for (ranks, &k) in records.iter().zip(prefix_lens) {
            for &rank in &ranks[..k] {
                offsets[rank as usize + 1] += 1;
            }
        }
        for r in 0..num_ranks {
            offsets[r + 1] += offsets[r];
        }

        let mut cursor = offsets.clone();
        let mut entries = vec![Posting { record: 0, position: 0 }; offsets[num_ranks]];
        for (id, (ranks, &k)) in records.iter().zip(prefix_lens).enumerate() {
            for (position, &rank) in ranks[..k].iter().enumerate() {
                let slot = &mut cursor[rank as usize];
                entries[*slot] = Posting { record: id as RecordId, position: position as u32 };
                *slot += 1;
            }
        }

        Self { offsets, entries }
    }

    /// Postings for `rank`; empty for ranks outside the table.
    pub fn list(&self, rank: Rank) -> &[Posting] {
        let r = rank as usize;
        if r + 1 >= self.offsets.len() {
            return &[];
        }
        &self.entries[self.offsets[r]..self.offsets[r + 1]]
    }

    /// Every posting must point at `records[record][position] == rank`.
    pub(crate) fn check(&self, num_ranks: usize, records: &[Vec<Rank>]) -> anyhow::Result<()> {
        if self.offsets.len() != num_ranks + 1 {
            bail!("{} posting offsets for {} ranks", self.offsets.len(), num_ranks);
        }
        if self.offsets.first() != Some(&0) || self.offsets.windows(2).any(|w| w[0] > w[1]) {
            bail!("posting offsets are not ascending from zero");
        }
        if self.offsets[num_ranks] != self.entries.len() {
            bail!("posting offsets end at {} but there are {} postings", self.offsets[num_ranks], self.entries.len());
        }
        for rank in 0..num_ranks {
            for p in self.list(rank as Rank) {
                let Some(ranks) = records.get(p.record as usize) else {
                    bail!("posting for rank {rank} names missing record {}", p.record);
                };
                if ranks.get(p.position as usize) != Some(&(rank as Rank)) {
                    bail!("posting for rank {rank} does not match record {} position {}", p.record, p.position);
                }
            }
        }
        Ok(())
    }

    pub fn num_ranks(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Total number of postings across all lists.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_follow_record_order() {
        let records = vec![vec![0, 2, 3], vec![1, 2], vec![0, 1, 3]];
        let arena = PostingArena::build(4, &records, &[2, 2, 1]);
        assert_eq!(arena.len(), 5);
        assert_eq!(
            arena.list(0),
            &[Posting { record: 0, position: 0 }, Posting { record: 2, position: 0 }]
        );
        assert_eq!(arena.list(1), &[Posting { record: 1, position: 0 }]);
        assert_eq!(
            arena.list(2),
            &[Posting { record: 0, position: 1 }, Posting { record: 1, position: 1 }]
        );
        assert!(arena.list(3).is_empty());
        assert!(arena.list(17).is_empty());
        assert!(arena.check(4, &records).is_ok());
    }

    #[test]
    fn check_rejects_inconsistent_arenas() {
        let records = vec![vec![0, 2, 3], vec![1, 2], vec![0, 1, 3]];
        let arena = PostingArena::build(4, &records, &[2, 2, 1]);
        assert!(arena.check(5, &records).is_err());

        let mut bad = arena.clone();
        bad.entries[0].record = 999;
        assert!(bad.check(4, &records).is_err());

        let mut bad = arena.clone();
        bad.entries[0].position = 7;
        assert!(bad.check(4, &records).is_err());

        let mut bad = arena.clone();
        bad.offsets.swap(1, 2);
        assert!(bad.check(4, &records).is_err());

        let mut bad = arena;
        bad.entries.pop();
        assert!(bad.check(4, &records).is_err());
    }

    #[test]
    fn empty_prefixes_post_nothing() {
        let records = vec![vec![0, 1], vec![]];
        let arena = PostingArena::build(2, &records, &[0, 0]);
        assert!(arena.is_empty());
        assert_eq!(arena.num_ranks(), 2);
        assert!(arena.list(0).is_empty());
    }
}
