//! Vocabulary storage and lookup.
//!
//! A [`Vocabulary`] is a dense bijection between symbols and ids `0..len`.
//! The reserved specials always occupy the first six ids in a fixed order.
//! Once constructed the vocabulary never changes: unknown symbols map to
//! `<unk>` at lookup time instead of being inserted.

use crate::error::{PrepError, Result};
use ahash::AHashMap;
use compact_str::CompactString;

/// Padding symbol.
pub const PAD: &str = "<pad>";
/// Unknown-symbol placeholder.
pub const UNK: &str = "<unk>";
/// Beginning of sequence.
pub const BOS: &str = "<bos>";
/// End of sequence.
pub const EOS: &str = "<eos>";
/// Sequence separator.
pub const SEP: &str = "<sep>";
/// Default glue marker written between joined tokens.
pub const DEFAULT_JOINER: &str = "￭";

/// Number of reserved ids at the start of every vocabulary.
pub const RESERVED_COUNT: usize = 6;

/// Forward mapping: token string -> ID
pub type Vocab = AHashMap<CompactString, u32>;

/// Ids of the reserved specials.
///
/// These are fixed by position, so every vocabulary agrees on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub pad: u32,
    pub unk: u32,
    pub bos: u32,
    pub eos: u32,
    pub sep: u32,
    pub joiner: u32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            pad: 0,
            unk: 1,
            bos: 2,
            eos: 3,
            sep: 4,
            joiner: 5,
        }
    }
}

impl SpecialTokens {
    /// Check if an ID is a special token.
    #[inline]
    pub fn is_special(&self, id: u32) -> bool {
        (id as usize) < RESERVED_COUNT
    }
}

/// Reserved symbols in id order, given the joiner marker in use.
pub fn reserved_symbols(joiner: &str) -> [&str; RESERVED_COUNT] {
    [PAD, UNK, BOS, EOS, SEP, joiner]
}

/// Running count of lookups that fell back to `<unk>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OovStats {
    /// Symbols looked up
    pub tokens: u64,
    /// Symbols mapped to `<unk>`
    pub unknown: u64,
}

impl OovStats {
    /// Fraction of lookups that were out of vocabulary.
    pub fn rate(&self) -> f64 {
        if self.tokens == 0 {
            0.0
        } else {
            self.unknown as f64 / self.tokens as f64
        }
    }

    /// Fold another counter into this one.
    pub fn merge(&mut self, other: OovStats) {
        self.tokens += other.tokens;
        self.unknown += other.unknown;
    }
}

/// Frozen symbol <-> id mapping.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    /// Forward mapping: token string -> ID
    vocab: Vocab,
    /// Reverse mapping: ID -> token string
    tokens: Vec<CompactString>,
    /// Special token IDs
    special: SpecialTokens,
}

impl Vocabulary {
    /// A vocabulary holding only the reserved specials.
    pub fn with_specials(joiner: &str) -> Result<Self> {
        Self::from_symbols(reserved_symbols(joiner))
    }

    /// Build a vocabulary from symbols in id order.
    ///
    /// The first six symbols must be the reserved specials (`<pad>`, `<unk>`,
    /// `<bos>`, `<eos>`, `<sep>`, joiner). Every symbol must be non-empty,
    /// free of whitespace, and unique.
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Vocab::new();
        let mut tokens = Vec::new();

        for symbol in symbols {
            let symbol = symbol.as_ref();
            let id = tokens.len() as u32;
            if symbol.is_empty() || symbol.chars().any(char::is_whitespace) {
                return Err(PrepError::Load(format!(
                    "bad vocabulary entry {:?} at id {}",
                    symbol, id
                )));
            }
            let symbol = CompactString::new(symbol);
            if vocab.insert(symbol.clone(), id).is_some() {
                return Err(PrepError::Load(format!(
                    "repeated vocabulary entry {:?} at id {}",
                    symbol, id
                )));
            }
            tokens.push(symbol);
        }

        if tokens.len() < RESERVED_COUNT {
            return Err(PrepError::Load(format!(
                "vocabulary has {} entries, fewer than the {} reserved specials",
                tokens.len(),
                RESERVED_COUNT
            )));
        }
        for (id, expected) in [PAD, UNK, BOS, EOS, SEP].iter().enumerate() {
            if tokens[id] != *expected {
                return Err(PrepError::Load(format!(
                    "vocabulary id {} is reserved for {}, found {:?}",
                    id, expected, tokens[id]
                )));
            }
        }

        Ok(Self {
            vocab,
            tokens,
            special: SpecialTokens::default(),
        })
    }

    /// Get the ID for a token string.
    #[inline]
    pub fn get_id(&self, token: &str) -> Option<u32> {
        self.vocab.get(token).copied()
    }

    /// Get the ID for a token string, or `<unk>` if absent.
    #[inline]
    pub fn id_or_unk(&self, token: &str) -> u32 {
        self.get_id(token).unwrap_or(self.special.unk)
    }

    /// Get the token string for an ID.
    #[inline]
    pub fn get_token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(|s| s.as_str())
    }

    /// The joiner marker this vocabulary reserves.
    pub fn joiner(&self) -> &str {
        &self.tokens[self.special.joiner as usize]
    }

    /// Map symbols to ids, counting out-of-vocabulary lookups.
    pub fn encode<S: AsRef<str>>(&self, symbols: &[S], stats: &mut OovStats) -> Vec<u32> {
        symbols
            .iter()
            .map(|symbol| {
                let id = self.id_or_unk(symbol.as_ref());
                stats.tokens += 1;
                if id == self.special.unk {
                    stats.unknown += 1;
                }
                id
            })
            .collect()
    }

    /// Map ids back to symbols.
    ///
    /// `<pad>`, `<bos>` and `<eos>` are dropped when `skip_special` is set;
    /// `<unk>`, `<sep>` and the joiner are always kept since they carry content.
    pub fn decode(&self, ids: &[u32], skip_special: bool) -> Result<Vec<&str>> {
        let sp = self.special;
        ids.iter()
            .filter(|&&id| !(skip_special && (id == sp.pad || id == sp.bos || id == sp.eos)))
            .map(|&id| self.get_token(id).ok_or(PrepError::UnknownTokenId(id)))
            .collect()
    }

    /// Symbols in id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }

    /// Special token IDs.
    #[inline]
    pub fn special(&self) -> &SpecialTokens {
        &self.special
    }

    /// Get the size of the vocabulary.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false: the reserved specials are present in every vocabulary.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
