//! Saving of model and vocabulary artifacts.
//!
//! Both go through [`AtomicFile`], so a failed save leaves any previous
//! artifact untouched.

use nmtprep_core::{AtomicFile, BpeModel, PrepError, Result, Vocabulary};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Save a BPE model, one `left right` rule per line in rank order.
pub fn save_bpe_model(model: &BpeModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = AtomicFile::create(path)?;
    for rule in model.rules() {
        writeln!(file, "{} {}", rule.left, rule.right).map_err(|e| PrepError::io(path, e))?;
    }
    file.commit()?;
    info!("wrote {} merges to {}", model.len(), path.display());
    Ok(())
}

/// Save a vocabulary, one symbol per line in id order.
pub fn save_vocabulary(vocab: &Vocabulary, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut file = AtomicFile::create(path)?;
    for symbol in vocab.iter() {
        writeln!(file, "{}", symbol).map_err(|e| PrepError::io(path, e))?;
    }
    file.commit()?;
    info!("wrote {} vocabulary entries to {}", vocab.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{load_bpe_model, load_vocabulary};

    #[test]
    fn test_model_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bpe_model");
        let model = BpeModel::from_pairs([("l", "o"), ("w", "e"), ("s", "t</w>")]).unwrap();

        save_bpe_model(&model, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "l o\nw e\ns t</w>\n");
        assert_eq!(load_bpe_model(&path).unwrap().rules(), model.rules());
    }

    #[test]
    fn test_vocabulary_line_is_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tgt_vocab");
        let vocab = Vocabulary::from_symbols([
            "<pad>", "<unk>", "<bos>", "<eos>", "<sep>", "￭", "the", "cat",
        ])
        .unwrap();

        save_vocabulary(&vocab, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().nth(7), Some("cat"));

        let loaded = load_vocabulary(&path).unwrap();
        assert_eq!(loaded.get_id("cat"), vocab.get_id("cat"));
        assert_eq!(loaded.len(), vocab.len());
    }
}
