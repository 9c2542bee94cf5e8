//! Main tokenizer implementation.
//!
//! A [`Tokenizer`] is an immutable value: mode, joiner settings, normalizer
//! and an optional BPE model behind an `Arc`. It is `Send + Sync` and is
//! shared by reference across worker threads; nothing in it changes after
//! construction.

pub mod config;
pub mod token;

pub use config::{validate_joiner, TokenizationMode, TokenizerConfig};
pub use token::{detokenize, from_strings, normalize_whitespace, to_strings, Token};

use crate::io::load_bpe_model;
use crate::pre_tokenizer::{segment, segment_numbers, NormalizationForm, Normalizer};
use compact_str::CompactString;
use nmtprep_core::{
    BpeEncoder, BpeModel, EncodingWarnings, RawLine, Result, DEFAULT_JOINER,
};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::info;

/// Builder for creating a tokenizer.
#[derive(Clone)]
pub struct TokenizerBuilder {
    mode: TokenizationMode,
    joiner_annotate: bool,
    joiner: CompactString,
    normalization: NormalizationForm,
    bpe: Option<Arc<BpeModel>>,
}

impl Default for TokenizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerBuilder {
    /// Create a new tokenizer builder with default configuration.
    pub fn new() -> Self {
        Self {
            mode: TokenizationMode::default(),
            joiner_annotate: false,
            joiner: CompactString::new(DEFAULT_JOINER),
            normalization: NormalizationForm::None,
            bpe: None,
        }
    }

    /// Take every option except the BPE model from a configuration.
    pub fn config(self, config: &TokenizerConfig) -> Result<Self> {
        Ok(self
            .mode(config.mode()?)
            .joiner_annotate(config.joiner_annotate)
            .joiner(&config.joiner)
            .normalization(config.normalization()?))
    }

    /// Set the segmentation mode.
    pub fn mode(mut self, mode: TokenizationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Emit joiner tokens in string output.
    pub fn joiner_annotate(mut self, annotate: bool) -> Self {
        self.joiner_annotate = annotate;
        self
    }

    /// Set the joiner symbol.
    pub fn joiner(mut self, joiner: &str) -> Self {
        self.joiner = CompactString::new(joiner);
        self
    }

    /// Set the normalization form.
    pub fn normalization(mut self, form: NormalizationForm) -> Self {
        self.normalization = form;
        self
    }

    /// Apply a BPE model after segmentation.
    pub fn bpe_model(mut self, model: Arc<BpeModel>) -> Self {
        self.bpe = Some(model);
        self
    }

    /// Build the tokenizer.
    pub fn build(self) -> Result<Tokenizer> {
        validate_joiner(&self.joiner)?;
        Ok(Tokenizer {
            mode: self.mode,
            joiner_annotate: self.joiner_annotate,
            joiner: self.joiner,
            normalizer: Normalizer::new(self.normalization),
            bpe: self.bpe,
        })
    }
}

/// Rule-based, reversible tokenizer.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    mode: TokenizationMode,
    joiner_annotate: bool,
    joiner: CompactString,
    normalizer: Normalizer,
    bpe: Option<Arc<BpeModel>>,
}

impl Tokenizer {
    /// Create a tokenizer builder.
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::new()
    }

    /// Validate a configuration and build the tokenizer, loading its BPE
    /// model if one is named.
    pub fn from_config(config: &TokenizerConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = Self::builder().config(config)?;
        if let Some(path) = &config.bpe_model_path {
            let model = load_bpe_model(path)?;
            info!("loaded {} BPE merges from {}", model.len(), path.display());
            builder = builder.bpe_model(Arc::new(model));
        }
        let tokenizer = builder.build()?;
        info!(
            mode = tokenizer.mode.name(),
            joiner_annotate = tokenizer.joiner_annotate,
            "built tokenizer"
        );
        Ok(tokenizer)
    }

    pub fn mode(&self) -> TokenizationMode {
        self.mode
    }

    pub fn joiner(&self) -> &str {
        &self.joiner
    }

    pub fn joiner_annotate(&self) -> bool {
        self.joiner_annotate
    }

    pub fn bpe_model(&self) -> Option<&Arc<BpeModel>> {
        self.bpe.as_ref()
    }

    /// Tokenize one line. Empty input gives no tokens.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let text = self.normalizer.normalize(text);

        let mut tokens = match self.mode.rule() {
            Some(rule) => segment(&text, rule),
            // Whitespace split, nothing joined.
            None => text.split_whitespace().map(Token::new).collect(),
        };

        if let Some(group_size) = self.mode.digit_groups() {
            tokens = segment_numbers(tokens, group_size);
        }
        if let Some(model) = &self.bpe {
            tokens = apply_bpe(tokens, model);
        }
        tokens
    }

    /// String form of tokens, with joiner tokens when annotating.
    pub fn to_strings(&self, tokens: &[Token]) -> Vec<CompactString> {
        to_strings(tokens, &self.joiner, self.joiner_annotate)
    }

    /// Tokenize one line straight to strings.
    pub fn tokenize_to_strings(&self, text: &str) -> Vec<CompactString> {
        self.to_strings(&self.tokenize(text))
    }

    /// Restore text from tokens.
    pub fn detokenize(&self, tokens: &[Token]) -> String {
        detokenize(tokens)
    }

    /// Restore text from the string form of tokens.
    pub fn detokenize_strings<S: AsRef<str>>(&self, strings: &[S]) -> String {
        detokenize(&from_strings(strings, &self.joiner))
    }

    /// Tokenize lines in parallel; output order follows input order.
    pub fn tokenize_batch<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Vec<Vec<Token>> {
        lines
            .par_iter()
            .map(|line| self.tokenize(line.as_ref()))
            .collect()
    }

    /// Tokenize a raw input line to its output text.
    ///
    /// A line that is not valid UTF-8 is returned unchanged and recorded.
    pub fn tokenize_line(&self, line: &RawLine, warnings: &EncodingWarnings) -> Vec<u8> {
        match line.text() {
            Ok(text) => self.tokenize_to_strings(text).join(" ").into_bytes(),
            Err(_) => {
                warnings.record(line.index, "tokenize");
                line.bytes.clone()
            }
        }
    }

    /// Detokenize a raw line of space-separated tokens.
    ///
    /// A line that is not valid UTF-8 is returned unchanged and recorded.
    pub fn detokenize_line(&self, line: &RawLine, warnings: &EncodingWarnings) -> Vec<u8> {
        match line.text() {
            Ok(text) => {
                let strings: Vec<&str> = text.split_whitespace().collect();
                self.detokenize_strings(&strings).into_bytes()
            }
            Err(_) => {
                warnings.record(line.index, "detokenize");
                line.bytes.clone()
            }
        }
    }
}

/// Segment every token with the model, keeping the outer join flags.
fn apply_bpe(tokens: Vec<Token>, model: &BpeModel) -> Vec<Token> {
    let encoder = BpeEncoder::new(model);
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let spans = encoder.encode_spans(&token.surface);
        out.extend(token.split_spans(&spans));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn aggressive() -> TokenizationMode {
        TokenizationMode::Aggressive { digit_groups: None }
    }

    fn surfaces(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    #[test]
    fn test_builder_defaults_to_space_mode() {
        let tokenizer = Tokenizer::builder().build().unwrap();
        assert_eq!(surfaces(&tokenizer.tokenize("a,b c")), vec!["a,b", "c"]);
        assert_eq!(tokenizer.joiner(), "￭");
    }

    #[test]
    fn test_segment_numbers_scenario() {
        let tokenizer = Tokenizer::builder()
            .mode(TokenizationMode::Aggressive {
                digit_groups: NonZeroUsize::new(1),
            })
            .joiner_annotate(true)
            .build()
            .unwrap();

        let tokens = tokenizer.tokenize("It's 1234.");
        assert_eq!(surfaces(&tokens), vec!["It", "'", "s", "1", "2", "3", "4", "."]);
        assert_eq!(tokenizer.detokenize(&tokens), "It's 1234.");

        let strings = tokenizer.to_strings(&tokens);
        assert_eq!(
            strings,
            vec!["It", "￭", "'", "￭", "s", "1", "￭", "2", "￭", "3", "￭", "4", "￭", "."]
        );
        assert_eq!(tokenizer.detokenize_strings(&strings), "It's 1234.");
    }

    #[test]
    fn test_bpe_fragments_are_joined() {
        let model =
            BpeModel::from_pairs([("l", "o"), ("lo", "w"), ("e", "r</w>"), ("lo", "w</w>")])
                .unwrap();
        let tokenizer = Tokenizer::builder()
            .mode(aggressive())
            .joiner_annotate(true)
            .bpe_model(Arc::new(model))
            .build()
            .unwrap();

        let tokens = tokenizer.tokenize("lower, low");
        assert_eq!(surfaces(&tokens), vec!["low", "er", ",", "low"]);
        assert!(tokens[0].join_right && tokens[1].join_left && tokens[1].join_right);
        assert!(!tokens[3].join_left);
        assert_eq!(
            tokenizer.tokenize_to_strings("lower, low"),
            vec!["low", "￭", "er", "￭", ",", "low"]
        );
        assert_eq!(tokenizer.detokenize(&tokens), "lower, low");
    }

    #[test]
    fn test_none_mode_splits_on_whitespace_only() {
        let tokenizer = Tokenizer::builder()
            .mode(TokenizationMode::None)
            .joiner_annotate(true)
            .build()
            .unwrap();
        let tokens = tokenizer.tokenize("a  b\tc,d ");
        assert_eq!(surfaces(&tokens), vec!["a", "b", "c,d"]);
        assert!(tokens.iter().all(|t| !t.join_left && !t.join_right));
        assert_eq!(tokenizer.detokenize(&tokens), "a b c,d");
        assert_eq!(tokenizer.detokenize_strings(&tokenizer.to_strings(&tokens)), "a b c,d");
        assert!(tokenizer.tokenize("   ").is_empty());
    }

    #[test]
    fn test_none_mode_with_bpe_joins_fragments() {
        let model = BpeModel::from_pairs([("l", "o"), ("lo", "w</w>")]).unwrap();
        let tokenizer = Tokenizer::builder()
            .mode(TokenizationMode::None)
            .joiner_annotate(true)
            .bpe_model(Arc::new(model))
            .build()
            .unwrap();
        assert_eq!(
            tokenizer.tokenize_to_strings("lower, low"),
            vec!["lo", "￭", "w", "￭", "e", "￭", "r", "￭", ",", "low"]
        );
        assert_eq!(
            tokenizer.detokenize(&tokenizer.tokenize("lower,  low")),
            "lower, low"
        );
    }

    #[test]
    fn test_normalization_applies_before_segmentation() {
        let tokenizer = Tokenizer::builder()
            .mode(aggressive())
            .normalization(NormalizationForm::Nfkc)
            .build()
            .unwrap();
        assert_eq!(surfaces(&tokenizer.tokenize("\u{FB01}ne!")), vec!["fine", "!"]);
    }

    #[test]
    fn test_tokenize_batch_keeps_order() {
        let tokenizer = Tokenizer::builder().mode(aggressive()).build().unwrap();
        let lines: Vec<String> = (0..100).map(|i| format!("line {}.", i)).collect();
        let batch = tokenizer.tokenize_batch(&lines);
        for (i, tokens) in batch.iter().enumerate() {
            assert_eq!(tokens[1].surface, i.to_string());
        }
    }

    #[test]
    fn test_malformed_line_passes_through() {
        let tokenizer = Tokenizer::builder().mode(aggressive()).build().unwrap();
        let warnings = EncodingWarnings::new();

        let bad = RawLine {
            index: 3,
            bytes: vec![b'a', b'!', 0xfe],
        };
        assert_eq!(tokenizer.tokenize_line(&bad, &warnings), bad.bytes);
        assert_eq!(warnings.count(), 1);

        let good = RawLine {
            index: 4,
            bytes: b"hi!".to_vec(),
        };
        assert_eq!(tokenizer.tokenize_line(&good, &warnings), b"hi !".to_vec());
        assert_eq!(warnings.count(), 1);
    }

    #[test]
    fn test_detokenize_line() {
        let tokenizer = Tokenizer::builder().mode(aggressive()).build().unwrap();
        let warnings = EncodingWarnings::new();
        let line = RawLine {
            index: 0,
            bytes: "hi ￭ ! you".as_bytes().to_vec(),
        };
        assert_eq!(tokenizer.detokenize_line(&line, &warnings), b"hi! you".to_vec());
    }
}
