//! Unicode normalization applied before segmentation.
//!
//! Normalization changes the text, so a tokenizer configured with a form
//! other than `None` round-trips to the normalized input rather than the
//! raw one.

use nmtprep_core::{PrepError, Result};
use std::borrow::Cow;
use unicode_normalization::{is_nfc_quick, is_nfkc_quick, IsNormalized, UnicodeNormalization};

/// Normalization form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationForm {
    /// No normalization
    #[default]
    None,
    /// Canonical composition
    Nfc,
    /// Compatibility composition
    Nfkc,
}

impl NormalizationForm {
    /// Parse the configuration name (`none`, `nfc`, `nfkc`).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "nfc" => Ok(Self::Nfc),
            "nfkc" => Ok(Self::Nfkc),
            other => Err(PrepError::Config(format!(
                "unknown normalization {:?} (expected none, nfc or nfkc)",
                other
            ))),
        }
    }

    /// Configuration name of the form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Nfc => "nfc",
            Self::Nfkc => "nfkc",
        }
    }
}

/// Unicode normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    form: NormalizationForm,
}

impl Normalizer {
    /// Create a new normalizer.
    pub fn new(form: NormalizationForm) -> Self {
        Self { form }
    }

    /// Normalize text, borrowing when it is already in the target form.
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self.form {
            NormalizationForm::None => Cow::Borrowed(text),
            NormalizationForm::Nfc => {
                if is_nfc_quick(text.chars()) == IsNormalized::Yes {
                    Cow::Borrowed(text)
                } else {
                    Cow::Owned(text.nfc().collect())
                }
            }
            NormalizationForm::Nfkc => {
                if is_nfkc_quick(text.chars()) == IsNormalized::Yes {
                    Cow::Borrowed(text)
                } else {
                    Cow::Owned(text.nfkc().collect())
                }
            }
        }
    }

    /// Form in use.
    pub fn form(&self) -> NormalizationForm {
        self.form
    }

    /// Check if normalization is enabled.
    pub fn is_enabled(&self) -> bool {
        self.form != NormalizationForm::None
    }
}
