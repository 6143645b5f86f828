use crate::config::IndexConfig;
use crate::error::{Error, RecordLocation};
use crate::frequency::FrequencyTable;
use crate::postings::PostingArena;
use crate::similarity::{Measure, SimilarityKind};
use crate::{Rank, RecordId, Token};
use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Size figures gathered while building an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub num_records: usize,
    pub num_tokens: usize,
    pub num_postings: usize,
    /// Records too small to ever reach the threshold; they post nothing.
    pub empty_prefix_records: usize,
    pub max_record_len: usize,
    /// Number of records holding the most common token.
    pub max_token_frequency: u32,
}

/// Build-once, query-many prefix filtering index.
///
/// Immutable after construction, so a shared reference can serve queries
/// from any number of threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndex {
    pub(crate) config: IndexConfig,
    pub(crate) table: FrequencyTable,
    /// Indexed records as ascending ranks, by record id.
    pub(crate) records: Vec<Vec<Rank>>,
    pub(crate) postings: PostingArena,
    pub(crate) stats: IndexStats,
}

impl SearchIndex {
    /// Index `records`; record ids are their positions in the slice.
    pub fn build<R: AsRef<[Token]>>(records: &[R], similarity: SimilarityKind, threshold: f64) -> Result<Self, Error> {
        Self::with_config(records, IndexConfig::new(similarity, threshold)?)
    }

    /// Like [`SearchIndex::build`] with the measure given by name
    /// (`jaccard`, `cosine` or `containment`).
    pub fn build_named<R: AsRef<[Token]>>(records: &[R], similarity: &str, threshold: f64) -> Result<Self, Error> {
        Self::with_config(records, IndexConfig::named(similarity, threshold)?)
    }

    pub fn with_config<R: AsRef<[Token]>>(records: &[R], config: IndexConfig) -> Result<Self, Error> {
        config.validate()?;
        if records.is_empty() {
            return Err(Error::EmptyCollection);
        }

        let table = FrequencyTable::from_records(records);
        tracing::debug!(records = records.len(), tokens = table.len(), "ranked tokens by frequency");

        let mut ranked = Vec::with_capacity(records.len());
        for (id, record) in records.iter().enumerate() {
            let r = table.rank_record(record.as_ref(), RecordLocation::Indexed(id as RecordId))?;
            ranked.push(r.ranks);
        }

        let IndexConfig { similarity, threshold } = config;
        let prefix_lens: Vec<usize> = ranked
            .iter()
            .map(|r| similarity.indexing_prefix_len(r.len(), threshold))
            .collect();
        let postings = PostingArena::build(table.len(), &ranked, &prefix_lens);
        tracing::debug!(postings = postings.len(), "laid out posting lists");

        let stats = IndexStats {
            num_records: ranked.len(),
            num_tokens: table.len(),
            num_postings: postings.len(),
            empty_prefix_records: prefix_lens.iter().filter(|&&k| k == 0).count(),
            max_record_len: ranked.iter().map(Vec::len).max().unwrap_or(0),
            max_token_frequency: table.max_count(),
        };
        tracing::info!(
            %similarity,
            threshold,
            records = stats.num_records,
            tokens = stats.num_tokens,
            postings = stats.num_postings,
            empty_prefix = stats.empty_prefix_records,
            max_token_frequency = stats.max_token_frequency,
            "built search index"
        );

        Ok(Self { config, table, records: ranked, postings, stats })
    }

    pub fn config(&self) -> IndexConfig {
        self.config
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record_len(&self, id: RecordId) -> Option<usize> {
        self.records.get(id as usize).map(Vec::len)
    }

    /// The original tokens of record `id`, in rank order.
    pub fn record_tokens(&self, id: RecordId) -> Option<Vec<Token>> {
        let ranks = self.records.get(id as usize)?;
        ranks.iter().map(|&r| self.table.token(r)).collect()
    }

    /// Structural consistency of an index that did not come from
    /// [`SearchIndex::with_config`], such as one decoded from disk.
    pub(crate) fn check(&self) -> anyhow::Result<()> {
        self.config.validate()?;
        self.table.check()?;
        let num_ranks = self.table.len();
        for (id, ranks) in self.records.iter().enumerate() {
            if ranks.windows(2).any(|w| w[0] >= w[1]) {
                bail!("record {id} is not strictly rank-sorted");
            }
            if ranks.last().is_some_and(|&r| r as usize >= num_ranks) {
                bail!("record {id} holds a rank outside the frequency table");
            }
        }
        self.postings.check(num_ranks, &self.records)?;
        if self.stats.num_records != self.records.len() || self.stats.num_postings != self.postings.len() {
            bail!("index statistics do not match its contents");
        }
        Ok(())
    }
}
