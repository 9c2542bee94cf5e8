//! nmtprep-tokenizer - Reversible rule-based tokenization
//!
//! This crate turns raw lines into tokens and back:
//!
//! - Segmentation modes (aggressive, conservative, space, none)
//! - Join flags on every split, optionally materialized as joiner tokens
//! - Digit-run segmentation into fixed-size groups
//! - Optional BPE segmentation with a shared, read-only model
//! - Unicode normalization, artifact IO and the network directory layout
//!
//! # Example
//!
//! ```rust
//! use nmtprep_tokenizer::{TokenizationMode, Tokenizer};
//!
//! let tokenizer = Tokenizer::builder()
//!     .mode(TokenizationMode::Aggressive { digit_groups: None })
//!     .joiner_annotate(true)
//!     .build()?;
//!
//! let tokens = tokenizer.tokenize("Hello, world!");
//! assert_eq!(tokenizer.to_strings(&tokens), vec!["Hello", "￭", ",", "world", "￭", "!"]);
//! assert_eq!(tokenizer.detokenize(&tokens), "Hello, world!");
//! # Ok::<(), nmtprep_tokenizer::PrepError>(())
//! ```

pub use nmtprep_core::{PrepError, Result};

// Tokenizer API
pub mod tokenizer;
pub use tokenizer::{
    detokenize, normalize_whitespace, Token, TokenizationMode, Tokenizer, TokenizerBuilder,
    TokenizerConfig,
};

// IO/Serialization
pub mod io;
pub use io::{
    load_bpe_model, load_vocabulary, save_bpe_model, save_vocabulary, NetworkDir, Side,
};

// Pre-tokenization
pub mod pre_tokenizer;
pub use pre_tokenizer::{NormalizationForm, Normalizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
