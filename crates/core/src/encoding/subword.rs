//! Grapheme-level BPE encoding.
//!
//! A token starts out as its grapheme clusters, the last one carrying the
//! end-of-word marker. The encoder then repeatedly merges the adjacent pair
//! with the lowest rank until no present pair has a rule. Graphemes the model
//! has never seen are kept as-is and simply never merge.

use crate::core::{BpeModel, Pair, END_OF_WORD};
use compact_str::CompactString;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// A contiguous byte span of the token and its model symbol, if any.
#[derive(Debug, Clone, Copy)]
struct Piece {
    id: Option<u32>,
    start: usize,
    end: usize,
}

/// BPE encoder bound to a model by reference.
///
/// Holds no mutable state, so one encoder (or many) can be used from any
/// number of threads at once.
#[derive(Debug, Clone, Copy)]
pub struct BpeEncoder<'m> {
    model: &'m BpeModel,
}

impl<'m> BpeEncoder<'m> {
    /// Create an encoder for a learned model.
    pub fn new(model: &'m BpeModel) -> Self {
        Self { model }
    }

    /// The model this encoder applies.
    pub fn model(&self) -> &'m BpeModel {
        self.model
    }

    /// Segment a token into subword strings.
    ///
    /// Concatenating the result gives back `token` exactly.
    pub fn encode(&self, token: &str) -> Vec<CompactString> {
        self.encode_spans(token)
            .into_iter()
            .map(|span| CompactString::new(&token[span]))
            .collect()
    }

    /// Segment a token into byte ranges of the original text.
    pub fn encode_spans(&self, token: &str) -> Vec<Range<usize>> {
        let mut pieces = self.initial_pieces(token);
        self.apply_bpe_merges(&mut pieces);
        pieces.into_iter().map(|p| p.start..p.end).collect()
    }

    fn initial_pieces(&self, token: &str) -> Vec<Piece> {
        let graphemes: Vec<(usize, &str)> = token.grapheme_indices(true).collect();
        let last = graphemes.len().saturating_sub(1);
        let mut key = String::new();

        graphemes
            .iter()
            .enumerate()
            .map(|(i, &(start, g))| {
                let id = if i == last {
                    key.clear();
                    key.push_str(g);
                    key.push_str(END_OF_WORD);
                    self.model.symbol_id(&key)
                } else {
                    self.model.symbol_id(g)
                };
                Piece {
                    id,
                    start,
                    end: start + g.len(),
                }
            })
            .collect()
    }

    /// Find the present pair with the lowest rank.
    fn best_pair(&self, pieces: &[Piece]) -> Option<(Pair, u32)> {
        let mut best: Option<(Pair, u32, u32)> = None;
        for window in pieces.windows(2) {
            let (Some(a), Some(b)) = (window[0].id, window[1].id) else {
                continue;
            };
            if let Some((rank, merged)) = self.model.get((a, b)) {
                if best.map_or(true, |(_, best_rank, _)| rank < best_rank) {
                    best = Some(((a, b), rank, merged));
                }
            }
        }
        best.map(|(pair, _, merged)| (pair, merged))
    }

    /// Apply BPE merge rules until no present pair has one.
    fn apply_bpe_merges(&self, pieces: &mut Vec<Piece>) {
        while pieces.len() > 1 {
            let Some((pair, merged)) = self.best_pair(pieces) else {
                break;
            };

            // Merge every non-overlapping occurrence, left to right.
            let mut out = Vec::with_capacity(pieces.len());
            let mut i = 0;
            while i < pieces.len() {
                if i + 1 < pieces.len()
                    && pieces[i].id == Some(pair.0)
                    && pieces[i + 1].id == Some(pair.1)
                {
                    out.push(Piece {
                        id: Some(merged),
                        start: pieces[i].start,
                        end: pieces[i + 1].end,
                    });
                    i += 2;
                } else {
                    out.push(pieces[i]);
                    i += 1;
                }
            }
            *pieces = out;
        }
    }
}

/// Segment `token` with `model`.
pub fn encode(token: &str, model: &BpeModel) -> Vec<CompactString> {
    BpeEncoder::new(model).encode(token)
}

/// Reassemble a token from its subwords.
///
/// Subwords carry no boundary markers, so this is plain concatenation;
/// whether a space belongs between tokens is decided by joiner annotation.
pub fn decode<S: AsRef<str>>(subwords: &[S]) -> String {
    subwords.iter().map(|s| s.as_ref()).collect()
}
