//! Subword segmentation with a learned BPE model.

pub mod subword;

pub use subword::{decode, encode, BpeEncoder};
