//! Tokenization configuration.
//!
//! The JSON document is kept close to what users write; [`TokenizerConfig::mode`]
//! turns it into a closed [`TokenizationMode`] so every option combination is
//! checked once, before any line is processed.

use super::token::ESCAPE;
use crate::pre_tokenizer::{NormalizationForm, SegmentRule};
use nmtprep_core::{PrepError, Result, DEFAULT_JOINER};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Segmentation mode with the options it supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizationMode {
    /// Split on whitespace and punctuation, letters from digits
    Aggressive { digit_groups: Option<NonZeroUsize> },
    /// Split on whitespace and punctuation not inside numbers or words
    Conservative { digit_groups: Option<NonZeroUsize> },
    /// Split on whitespace only
    Space { digit_groups: Option<NonZeroUsize> },
    /// Split on whitespace only, without number segmentation
    None,
}

impl TokenizationMode {
    /// Word-internal rule, if the mode segments at all.
    pub fn rule(&self) -> Option<SegmentRule> {
        match self {
            Self::Aggressive { .. } => Some(SegmentRule::Aggressive),
            Self::Conservative { .. } => Some(SegmentRule::Conservative),
            Self::Space { .. } => Some(SegmentRule::Space),
            Self::None => None,
        }
    }

    /// Digit group size when number segmentation is on.
    pub fn digit_groups(&self) -> Option<NonZeroUsize> {
        match self {
            Self::Aggressive { digit_groups }
            | Self::Conservative { digit_groups }
            | Self::Space { digit_groups } => *digit_groups,
            Self::None => None,
        }
    }

    /// Configuration name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aggressive { .. } => "aggressive",
            Self::Conservative { .. } => "conservative",
            Self::Space { .. } => "space",
            Self::None => "none",
        }
    }
}

impl Default for TokenizationMode {
    fn default() -> Self {
        Self::Space { digit_groups: None }
    }
}

/// Tokenization configuration as read from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TokenizerConfig {
    /// `aggressive`, `conservative`, `space` or `none`
    pub mode: String,
    /// Emit joiner tokens between joined tokens
    pub joiner_annotate: bool,
    /// Joiner symbol
    pub joiner: String,
    /// Split digit runs into groups
    pub segment_numbers: bool,
    /// Digits per group when `segment_numbers` is set
    pub digit_group_size: usize,
    /// `none`, `nfc` or `nfkc`
    pub normalization: String,
    /// BPE model applied after segmentation
    pub bpe_model_path: Option<PathBuf>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            mode: "space".to_string(),
            joiner_annotate: false,
            joiner: DEFAULT_JOINER.to_string(),
            segment_numbers: false,
            digit_group_size: 1,
            normalization: "none".to_string(),
            bpe_model_path: None,
        }
    }
}

impl TokenizerConfig {
    /// Configuration with the given mode and defaults elsewhere.
    pub fn with_mode(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            ..Default::default()
        }
    }

    /// Parse a JSON document. Unknown keys are configuration errors.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PrepError::Config(format!("tokenization config: {}", e)))
    }

    /// Read a JSON file. A relative `bpe_model_path` is taken relative to
    /// the directory holding the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PrepError::io(path, e))?;
        let mut config: Self = serde_json::from_str(&json)
            .map_err(|e| PrepError::Config(format!("{}: {}", path.display(), e)))?;

        if let Some(bpe) = config.bpe_model_path.as_mut() {
            if bpe.is_relative() {
                if let Some(dir) = path.parent() {
                    *bpe = dir.join(&*bpe);
                }
            }
        }
        Ok(config)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve the mode and its number segmentation option.
    pub fn mode(&self) -> Result<TokenizationMode> {
        let digit_groups = if self.segment_numbers {
            Some(NonZeroUsize::new(self.digit_group_size).ok_or_else(|| {
                PrepError::Config("digit_group_size must be at least 1".to_string())
            })?)
        } else {
            None
        };

        match self.mode.as_str() {
            "aggressive" => Ok(TokenizationMode::Aggressive { digit_groups }),
            "conservative" => Ok(TokenizationMode::Conservative { digit_groups }),
            "space" => Ok(TokenizationMode::Space { digit_groups }),
            "none" if digit_groups.is_some() => Err(PrepError::Config(
                "segment_numbers requires a segmenting mode".to_string(),
            )),
            "none" => Ok(TokenizationMode::None),
            other => Err(PrepError::Config(format!(
                "unknown tokenization mode {:?} (expected aggressive, conservative, space or none)",
                other
            ))),
        }
    }

    /// Resolve the normalization form.
    pub fn normalization(&self) -> Result<NormalizationForm> {
        NormalizationForm::from_name(&self.normalization)
    }

    /// Check every option without loading anything.
    pub fn validate(&self) -> Result<()> {
        self.mode()?;
        self.normalization()?;
        validate_joiner(&self.joiner)?;
        if let Some(path) = &self.bpe_model_path {
            if !path.is_file() {
                return Err(PrepError::Config(format!(
                    "BPE model {} does not exist",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// A joiner must be non-empty and free of whitespace, ASCII letters and
/// digits, and the surface escape character.
pub fn validate_joiner(joiner: &str) -> Result<()> {
    let bad = |c: char| c.is_whitespace() || c.is_ascii_alphanumeric() || c == ESCAPE;
    if joiner.is_empty() || joiner.chars().any(bad) {
        return Err(PrepError::Config(format!("invalid joiner {:?}", joiner)));
    }
    Ok(())
}
