//! nmtprep-training - Corpus statistics for nmtprep
//!
//! This crate learns BPE merge rules and builds frequency-ranked
//! vocabularies from token counts.
//!
//! # Features
//!
//! - Token counting with parallel fold/reduce and first-seen tie-breaking
//! - Incremental pair counting with a pair -> words index
//! - Deterministic merge selection (count, then first-encountered order)
//! - Vocabulary building with reserved specials, size cap and frequency floor
//!
//! # Example
//!
//! ```rust
//! use nmtprep_training::{learn, TokenCounter};
//!
//! let mut counts = TokenCounter::new();
//! counts.add_line(0, ["low", "lower", "newest", "widest"]);
//!
//! let model = learn(&counts, 3)?;
//! assert_eq!(model.len(), 3);
//! # Ok::<(), nmtprep_training::PrepError>(())
//! ```

pub use nmtprep_core::{PrepError, Result};

pub mod training;
pub use training::{
    build_vocabulary, learn, BpeLearner, FirstSeen, LearnConfig, PairCounter, TokenCounter,
    VocabBuilder, VocabConfig,
};
