//! Network directory layout.
//!
//! Every artifact a translation network needs lives in one directory under
//! fixed names:
//!
//! ```text
//! bpe_model            joint BPE model (or src_bpe_model / tgt_bpe_model)
//! src_vocab            source vocabulary
//! tgt_vocab            target vocabulary
//! src_token.json       source tokenization config
//! tgt_token.json       target tokenization config
//! ```

use super::load::{load_bpe_model, load_vocabulary};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use nmtprep_core::{BpeModel, PrepError, Result, Vocabulary};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Side of a parallel corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Src,
    Tgt,
}

impl Side {
    /// File name prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Src => "src",
            Side::Tgt => "tgt",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "src" => Ok(Side::Src),
            "tgt" => Ok(Side::Tgt),
            other => Err(PrepError::Config(format!(
                "unknown side {:?} (expected src or tgt)",
                other
            ))),
        }
    }
}

/// Paths of the artifacts in a network directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDir {
    root: PathBuf,
}

impl NetworkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let dir = Self::new(root);
        std::fs::create_dir_all(&dir.root).map_err(|e| PrepError::io(&dir.root, e))?;
        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// BPE model shared by both sides.
    pub fn joint_bpe_model(&self) -> PathBuf {
        self.root.join("bpe_model")
    }

    /// BPE model for one side, or the joint one when `side` is `None`.
    pub fn bpe_model(&self, side: Option<Side>) -> PathBuf {
        match side {
            Some(side) => self.root.join(format!("{}_bpe_model", side)),
            None => self.joint_bpe_model(),
        }
    }

    /// The side's own BPE model if present, else the joint one if present.
    pub fn find_bpe_model(&self, side: Side) -> Option<PathBuf> {
        [self.bpe_model(Some(side)), self.joint_bpe_model()]
            .into_iter()
            .find(|p| p.is_file())
    }

    pub fn vocab(&self, side: Side) -> PathBuf {
        self.root.join(format!("{}_vocab", side))
    }

    pub fn token_config(&self, side: Side) -> PathBuf {
        self.root.join(format!("{}_token.json", side))
    }

    /// Load the side's vocabulary.
    pub fn load_vocabulary(&self, side: Side) -> Result<Vocabulary> {
        load_vocabulary(self.vocab(side))
    }

    /// Load the side's BPE model, if one exists.
    pub fn load_bpe_model(&self, side: Side) -> Result<Option<BpeModel>> {
        self.find_bpe_model(side).map(load_bpe_model).transpose()
    }

    /// Build the side's tokenizer from its config file, if there is one.
    pub fn load_tokenizer(&self, side: Side) -> Result<Option<Tokenizer>> {
        let path = self.token_config(side);
        if !path.is_file() {
            return Ok(None);
        }
        let config = TokenizerConfig::from_file(&path)?;
        Tokenizer::from_config(&config).map(Some)
    }
}
