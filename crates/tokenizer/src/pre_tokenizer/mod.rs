//! Pre-tokenization pipeline.
//!
//! Normalization, rule-based segmentation and digit-run splitting, applied
//! in that order before any BPE segmentation.

pub mod normalize;
pub mod numbers;
pub mod segment;

pub use normalize::{NormalizationForm, Normalizer};
pub use numbers::segment_numbers;
pub use segment::{is_digits, segment, SegmentRule};
