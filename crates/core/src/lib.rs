//! nmtprep-core - Core data structures for corpus preprocessing
//!
//! This crate provides the pieces every stage of the pipeline shares:
//!
//! - [`BpeModel`]: the ordered, immutable list of learned merge rules
//! - [`BpeEncoder`]: grapheme-level segmentation of a token with a model
//! - [`Vocabulary`]: the frozen symbol <-> id mapping with reserved specials
//! - [`PairPriorityQueue`]: the merge candidate heap used while learning
//! - line input with malformed-byte accounting and atomic artifact writes
//!
//! Models and vocabularies are built once and then only ever read, so they
//! can be shared across worker threads behind an `Arc` without locking.
//!
//! # Example
//!
//! ```rust
//! use nmtprep_core::{BpeEncoder, BpeModel};
//!
//! let model = BpeModel::from_pairs([("e", "s"), ("es", "t</w>")])?;
//! let encoder = BpeEncoder::new(&model);
//! assert_eq!(encoder.encode("test"), vec!["t", "est"]);
//! # Ok::<(), nmtprep_core::PrepError>(())
//! ```

pub mod error;
pub use error::{PrepError, Result};

pub mod core;
pub use self::core::vocab::{reserved_symbols, DEFAULT_JOINER, RESERVED_COUNT};
pub use self::core::{
    BpeModel, MergeCandidate, MergeMap, MergeRule, MergeStats, OovStats, Pair, PairPriorityQueue,
    SpecialTokens, Vocabulary, END_OF_WORD,
};

pub mod encoding;
pub use encoding::BpeEncoder;

pub mod fs;
pub use fs::AtomicFile;

pub mod input;
pub use input::{EncodingWarnings, LineReader, RawLine};
