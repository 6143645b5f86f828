//! Global token frequency ranking.
//!
//! Tokens are ranked by ascending occurrence count over the indexed
//! collection, ties broken by ascending token id, so rare tokens lead every
//! sorted record and the ranking is identical across builds of the same input.

use crate::error::{Error, RecordLocation};
use crate::{Rank, Token};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrequencyTable {
    ranks: HashMap<Token, Rank>,
    /// rank -> token
    tokens: Vec<Token>,
    /// rank -> number of records containing the token
    counts: Vec<u32>,
}

/// A record rewritten as ascending ranks.
///
/// Tokens unknown to the table cannot appear in any posting list; only their
/// number is kept, since they still count toward the record's size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedRecord {
    pub ranks: Vec<Rank>,
    pub unseen: usize,
}

impl RankedRecord {
    /// Total size including unseen tokens.
    pub fn len(&self) -> usize {
        self.ranks.len() + self.unseen
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FrequencyTable {
    pub fn from_records<R: AsRef<[Token]>>(records: &[R]) -> Self {
        let mut freq: HashMap<Token, u32> = HashMap::new();
        for record in records {
            for &token in record.as_ref() {
                *freq.entry(token).or_insert(0) += 1;
            }
        }

        let mut order: Vec<(u32, Token)> = freq.into_iter().map(|(t, c)| (c, t)).collect();
        order.sort_unstable();

        let mut ranks = HashMap::with_capacity(order.len());
        let mut tokens = Vec::with_capacity(order.len());
        let mut counts = Vec::with_capacity(order.len());
        for (rank, (count, token)) in order.into_iter().enumerate() {
            ranks.insert(token, rank as Rank);
            tokens.push(token);
            counts.push(count);
        }
        Self { ranks, tokens, counts }
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn rank(&self, token: Token) -> Option<Rank> {
        self.ranks.get(&token).copied()
    }

    pub fn token(&self, rank: Rank) -> Option<Token> {
        self.tokens.get(rank as usize).copied()
    }

    /// Occurrences of the most common token.
    pub fn max_count(&self) -> u32 {
        self.counts.last().copied().unwrap_or(0)
    }

    /// Both directions of the mapping must agree.
    pub(crate) fn check(&self) -> anyhow::Result<()> {
        if self.ranks.len() != self.tokens.len() || self.counts.len() != self.tokens.len() {
            bail!(
                "frequency table sizes disagree: {} ranks, {} tokens, {} counts",
                self.ranks.len(),
                self.tokens.len(),
                self.counts.len()
            );
        }
        for (&token, &rank) in &self.ranks {
            if self.token(rank) != Some(token) {
                bail!("token {token} maps to rank {rank} which does not map back");
            }
        }
        Ok(())
    }

    /// Sort `record` into rank order, rejecting repeated tokens.
    pub fn rank_record(&self, record: &[Token], location: RecordLocation) -> Result<RankedRecord, Error> {
        let mut ranks = Vec::with_capacity(record.len());
        let mut unseen = Vec::new();
        for &token in record {
            match self.rank(token) {
                Some(rank) => ranks.push(rank),
                None => unseen.push(token),
            }
        }

        ranks.sort_unstable();
        if let Some(w) = ranks.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::DuplicateToken { location, token: self.tokens[w[0] as usize] });
        }
        if !unseen.is_empty() {
            unseen.sort_unstable();
            if let Some(w) = unseen.windows(2).find(|w| w[0] == w[1]) {
                return Err(Error::DuplicateToken { location, token: w[0] });
            }
        }

        Ok(RankedRecord { ranks, unseen: unseen.len() })
    }
}
