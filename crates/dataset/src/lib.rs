//! nmtprep-dataset - Training batches for parallel corpora
//!
//! Turns a line-aligned source/target corpus into padded batches of vocabulary
//! ids. Batches group examples of similar length, respect both an example
//! and a token limit, and remember the line index of every example.
//!
//! # Example
//!
//! ```rust
//! use nmtprep_core::{reserved_symbols, Vocabulary};
//! use nmtprep_dataset::{BatchBuilder, BatchConfig, SideEncoder};
//! use std::sync::Arc;
//!
//! let vocab = Arc::new(Vocabulary::from_symbols(
//!     reserved_symbols("￭").into_iter().chain(["hello", "world"]),
//! )?);
//! let builder = BatchBuilder::new(
//!     BatchConfig::default(),
//!     SideEncoder::pretokenized(Arc::clone(&vocab)),
//!     SideEncoder::pretokenized(vocab),
//! )?;
//! let output = builder.build_from_lines(&["hello world"], &["world"])?;
//! assert_eq!(output.batches[0].src[0], vec![2, 6, 7, 3]);
//! # Ok::<(), nmtprep_core::PrepError>(())
//! ```

pub mod batch;
pub mod builder;
pub mod encoder;
pub mod index;

pub use batch::{restore_order, Batch, BatchConfig, Example};
pub use builder::{BatchBuilder, BatchSink, BuildOutput, BuildStats};
pub use encoder::SideEncoder;
pub use index::{write_index, IndexReader, IndexWriter};
pub use nmtprep_core::{PrepError, Result};
