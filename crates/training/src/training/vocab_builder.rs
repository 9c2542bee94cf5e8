//! Vocabulary building from tokenized text.
//!
//! Ids are assigned by frequency rank after the reserved specials: highest
//! count first, ties by first appearance in the corpus. Symbols cut by the
//! size cap or the frequency floor are simply absent and map to `<unk>` at
//! lookup time.

use super::counts::TokenCounter;
use nmtprep_core::{
    reserved_symbols, PrepError, Result, Vocabulary, DEFAULT_JOINER, RESERVED_COUNT,
};
use tracing::info;

/// Configuration for vocabulary building.
#[derive(Debug, Clone)]
pub struct VocabConfig {
    /// Total size cap, reserved specials included. `None` keeps every symbol.
    pub max_size: Option<usize>,
    /// Symbols seen fewer times than this are left out
    pub min_frequency: u64,
    /// Joiner symbol reserved at id 5
    pub joiner: String,
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            max_size: None,
            min_frequency: 1,
            joiner: DEFAULT_JOINER.to_string(),
        }
    }
}

/// Builds a frozen [`Vocabulary`] from token counts.
pub struct VocabBuilder {
    config: VocabConfig,
}

impl VocabBuilder {
    /// Create a builder; a size cap below the number of reserved specials
    /// leaves no room and is rejected.
    pub fn new(config: VocabConfig) -> Result<Self> {
        if let Some(max_size) = config.max_size {
            if max_size < RESERVED_COUNT {
                return Err(PrepError::Capacity(format!(
                    "max vocabulary size {} is smaller than the {} reserved specials",
                    max_size, RESERVED_COUNT
                )));
            }
        }
        Ok(Self { config })
    }

    /// Build the vocabulary. An empty table yields the specials only.
    pub fn build(&self, counts: &TokenCounter) -> Result<Vocabulary> {
        let reserved = reserved_symbols(&self.config.joiner);
        let room = self
            .config
            .max_size
            .map_or(usize::MAX, |max| max - RESERVED_COUNT);

        let mut skipped = 0usize;
        let symbols: Vec<&str> = counts
            .by_frequency()
            .into_iter()
            .filter(|(token, count)| {
                let keep = *count >= self.config.min_frequency && !reserved.contains(token);
                if !keep {
                    skipped += 1;
                }
                keep
            })
            .map(|(token, _)| token)
            .take(room)
            .collect();

        let vocab = Vocabulary::from_symbols(reserved.into_iter().chain(symbols))?;
        info!(
            "vocabulary: {} entries from {} distinct symbols ({} below frequency {} or reserved)",
            vocab.len(),
            counts.len(),
            skipped,
            self.config.min_frequency
        );
        Ok(vocab)
    }
}

/// Build a vocabulary capped at `max_size` entries with default settings.
pub fn build_vocabulary(counts: &TokenCounter, max_size: usize) -> Result<Vocabulary> {
    VocabBuilder::new(VocabConfig {
        max_size: Some(max_size),
        ..Default::default()
    })?
    .build(counts)
}
