//! Core BPE data structures.
//!
//! Merge rules, the merge priority queue used while learning, and the
//! frozen vocabulary shared by every consumer.

pub mod merges;
pub mod priority;
pub mod vocab;

pub use merges::{BpeModel, MergeMap, MergeRule, MergeStats, Pair, END_OF_WORD};
pub use priority::{MergeCandidate, PairPriorityQueue};
pub use vocab::{OovStats, SpecialTokens, Vocab, Vocabulary};
