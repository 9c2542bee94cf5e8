//! CLI commands for nmtprep.

pub mod build_index;
pub mod build_vocab;
pub mod learn_bpe;
pub mod tokenize;

pub use build_index::BuildIndexCommand;
pub use build_vocab::BuildVocabCommand;
pub use learn_bpe::LearnBpeCommand;
pub use tokenize::{DetokenizeCommand, TokenizeCommand};

use nmtprep_core::input::LineChunks;
use nmtprep_core::LineReader;
use std::io::StdinLock;

/// Lines handed to the worker pool at a time.
pub const CHUNK_LINES: usize = 10_000;

/// Stdin as indexed chunks of raw lines.
pub fn stdin_chunks() -> LineChunks<StdinLock<'static>> {
    LineReader::new(std::io::stdin().lock(), "<stdin>").chunks(CHUNK_LINES)
}
