//! Corpus statistics for learning BPE merges and building vocabularies.
//!
//! Both consumers start from a [`TokenCounter`], the `(token, count)` table
//! with first-seen positions, so raw text never needs to stay in memory.

pub mod counter;
pub mod counts;
pub mod trainer;
pub mod vocab_builder;

pub use counter::PairCounter;
pub use counts::{FirstSeen, TokenCounter};
pub use trainer::{learn, BpeLearner, LearnConfig};
pub use vocab_builder::{build_vocabulary, VocabBuilder, VocabConfig};
