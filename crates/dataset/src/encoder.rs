//! Per-side text to id conversion.

use nmtprep_core::{OovStats, Vocabulary};
use nmtprep_tokenizer::Tokenizer;
use std::sync::Arc;

/// Turns one side's lines into id sequences.
///
/// With a tokenizer, raw lines are tokenized first; without one, lines are
/// taken as already tokenized and split on whitespace.
#[derive(Debug, Clone)]
pub struct SideEncoder {
    tokenizer: Option<Tokenizer>,
    vocab: Arc<Vocabulary>,
}

impl SideEncoder {
    pub fn new(vocab: Arc<Vocabulary>, tokenizer: Option<Tokenizer>) -> Self {
        Self { tokenizer, vocab }
    }

    /// Encoder for pre-tokenized text.
    pub fn pretokenized(vocab: Arc<Vocabulary>) -> Self {
        Self::new(vocab, None)
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    /// Id used for padding.
    pub fn pad_id(&self) -> u32 {
        self.vocab.special().pad
    }

    /// Encode one line, optionally wrapped in `<bos>` / `<eos>`.
    pub fn encode(&self, text: &str, add_bos_eos: bool, stats: &mut OovStats) -> Vec<u32> {
        let body = match &self.tokenizer {
            Some(tokenizer) => self.vocab.encode(&tokenizer.tokenize_to_strings(text), stats),
            None => {
                let tokens: Vec<&str> = text.split_whitespace().collect();
                self.vocab.encode(&tokens, stats)
            }
        };
        if !add_bos_eos {
            return body;
        }
        let special = self.vocab.special();
        let mut ids = Vec::with_capacity(body.len() + 2);
        ids.push(special.bos);
        ids.extend(body);
        ids.push(special.eos);
        ids
    }
}
