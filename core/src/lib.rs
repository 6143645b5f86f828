//! Exact set similarity search with prefix filtering.
//!
//! Build a [`SearchIndex`] once over a collection of token sets, then query it
//! for every indexed set whose Jaccard, Cosine or Containment similarity to the
//! query reaches the index threshold.

pub mod config;
pub mod error;
pub mod frequency;
pub mod index;
pub mod persist;
pub mod postings;
pub mod query;
pub mod similarity;

pub use config::IndexConfig;
pub use error::{Error, ErrorKind, RecordLocation};
pub use index::{IndexStats, SearchIndex};
pub use query::SearchHit;
pub use similarity::{Containment, Cosine, Jaccard, Measure, SimilarityKind};

/// Opaque, caller-assigned token identifier.
pub type Token = u32;
/// Position of a record in the collection the index was built from.
pub type RecordId = u32;
/// Global frequency rank of a token; 0 is the rarest.
pub type Rank = u32;
