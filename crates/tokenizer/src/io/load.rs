//! Loading of model and vocabulary artifacts.

use nmtprep_core::{BpeModel, PrepError, Result, Vocabulary};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Header written by some BPE tools on the first line of a model file.
const VERSION_HEADER: &str = "#version:";

/// Load a BPE model: one `left right` rule per line, line 1 = rank 0.
///
/// Every line must have exactly two fields. A first line of the form
/// `#version: <number>` is a header and is skipped.
pub fn load_bpe_model(path: impl AsRef<Path>) -> Result<BpeModel> {
    let path = path.as_ref();
    let pairs = read_lines(path)?
        .into_iter()
        .enumerate()
        .filter(|(i, line)| !(*i == 0 && is_version_header(line)))
        .map(|(i, line)| {
            let mut fields = line.split(' ');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(left), Some(right), None) if !left.is_empty() && !right.is_empty() => {
                    Ok((left.to_string(), right.to_string()))
                }
                _ => Err(PrepError::Load(format!(
                    "{}:{}: expected two symbols, found {:?}",
                    path.display(),
                    i + 1,
                    line
                ))),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    BpeModel::from_pairs(pairs).map_err(|e| match e {
        PrepError::InvalidMerge(msg) => PrepError::Load(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// `#version:` followed by a dotted version number and nothing else.
fn is_version_header(line: &str) -> bool {
    let Some(version) = line.strip_prefix(VERSION_HEADER) else {
        return false;
    };
    let version = version.trim();
    version.starts_with(|c: char| c.is_ascii_digit())
        && version.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Load a vocabulary: one symbol per line, id = line number - 1.
pub fn load_vocabulary(path: impl AsRef<Path>) -> Result<Vocabulary> {
    let path = path.as_ref();
    let symbols = read_lines(path)?;
    Vocabulary::from_symbols(&symbols).map_err(|e| match e {
        PrepError::Load(msg) => PrepError::Load(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    BufReader::new(file)
        .lines()
        .map(|line| {
            line.map(|l| l.trim_end_matches('\r').to_string())
                .map_err(|e| PrepError::io(path, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_bpe_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bpe_model");
        std::fs::write(&path, "#version: 0.2\ne s\nes t</w>\n").unwrap();

        let model = load_bpe_model(&path).unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.rank_of("es", "t</w>"), Some(1));
    }

    #[test]
    fn test_rule_resembling_header_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bpe_model");
        std::fs::write(&path, "#version:x y\ne s\n").unwrap();

        let model = load_bpe_model(&path).unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.rank_of("#version:x", "y"), Some(0));
        assert_eq!(model.rank_of("e", "s"), Some(1));

        assert!(is_version_header("#version: 0.2"));
        assert!(!is_version_header("#version: v2"));
        assert!(!is_version_header("#version:a b"));
    }

    #[test]
    fn test_malformed_model_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bpe_model");
        std::fs::write(&path, "e s\nnot-a-pair\n").unwrap();
        assert!(matches!(load_bpe_model(&path), Err(PrepError::Load(_))));

        std::fs::write(&path, "e s\ne s\n").unwrap();
        assert!(matches!(load_bpe_model(&path), Err(PrepError::Load(_))));
    }

    #[test]
    fn test_load_vocabulary_validates_specials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("src_vocab");
        std::fs::write(&path, "<pad>\n<unk>\n<bos>\n<eos>\n<sep>\n￭\nhello\n").unwrap();
        let vocab = load_vocabulary(&path).unwrap();
        assert_eq!(vocab.get_id("hello"), Some(6));

        std::fs::write(&path, "<unk>\n<pad>\n<bos>\n<eos>\n<sep>\n￭\n").unwrap();
        assert!(matches!(load_vocabulary(&path), Err(PrepError::Load(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_vocabulary("/nonexistent/nmtprep/vocab");
        assert!(matches!(result, Err(PrepError::Io { .. })));
    }
}
