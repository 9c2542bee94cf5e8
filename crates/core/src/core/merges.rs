//! Merge rule management for BPE.
//!
//! A [`BpeModel`] is the ordered list of merge rules produced by the learner.
//! Symbols are interned to ids so that pair lookups during encoding compare
//! integers instead of strings. The model is immutable once built and is
//! shared by reference (usually behind an `Arc`) by every encoder.

use crate::error::{PrepError, Result};
use ahash::AHashMap;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Marker appended to the last symbol of every token.
pub const END_OF_WORD: &str = "</w>";

/// A pair of symbol IDs that can be merged.
pub type Pair = (u32, u32);

/// Merge rule mapping: pair -> (rank, merged_symbol_id).
///
/// The rank indicates the priority of this merge rule (lower rank = higher priority).
pub type MergeMap = AHashMap<Pair, (u32, u32)>;

/// One learned merge: `left` followed by `right` becomes `left + right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRule {
    pub left: CompactString,
    pub right: CompactString,
    /// Learning iteration; line 1 of a model file is rank 0.
    pub rank: u32,
}

impl MergeRule {
    /// The symbol produced by applying this rule.
    pub fn merged(&self) -> CompactString {
        let mut merged = self.left.clone();
        merged.push_str(&self.right);
        merged
    }
}

/// Ordered, immutable collection of BPE merge rules with fast pair lookup.
#[derive(Debug, Clone, Default)]
pub struct BpeModel {
    /// Rules in rank order
    rules: Vec<MergeRule>,
    /// Symbol id -> text
    symbols: Vec<CompactString>,
    /// Symbol text -> id
    symbol_ids: AHashMap<CompactString, u32>,
    /// Pair -> (rank, merged id)
    merges: MergeMap,
}

impl BpeModel {
    /// Create an empty model (no merges; every token stays split into graphemes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from merge pairs in learning order.
    ///
    /// Pairs are assigned ranks in order (0, 1, 2, ...). A pair listed twice,
    /// an empty symbol, a symbol containing whitespace, or a left symbol that
    /// already carries the end-of-word marker is rejected.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut model = Self::new();
        for (rank, (left, right)) in pairs.into_iter().enumerate() {
            model.push_rule(left.as_ref(), right.as_ref(), rank as u32)?;
        }
        Ok(model)
    }

    fn push_rule(&mut self, left: &str, right: &str, rank: u32) -> Result<()> {
        for symbol in [left, right] {
            if symbol.is_empty() || symbol.chars().any(char::is_whitespace) {
                return Err(PrepError::InvalidMerge(format!(
                    "rank {}: bad symbol {:?}",
                    rank, symbol
                )));
            }
        }
        if left.ends_with(END_OF_WORD) {
            return Err(PrepError::InvalidMerge(format!(
                "rank {}: left symbol {:?} ends a word",
                rank, left
            )));
        }

        let rule = MergeRule {
            left: CompactString::new(left),
            right: CompactString::new(right),
            rank,
        };
        let pair = (self.intern(left), self.intern(right));
        let merged = self.intern(&rule.merged());

        if self.merges.insert(pair, (rank, merged)).is_some() {
            return Err(PrepError::InvalidMerge(format!(
                "rank {}: duplicate pair {:?} {:?}",
                rank, left, right
            )));
        }
        self.rules.push(rule);
        Ok(())
    }

    fn intern(&mut self, symbol: &str) -> u32 {
        if let Some(&id) = self.symbol_ids.get(symbol) {
            return id;
        }
        let id = self.symbols.len() as u32;
        let symbol = CompactString::new(symbol);
        self.symbols.push(symbol.clone());
        self.symbol_ids.insert(symbol, id);
        id
    }

    /// Rules in rank order.
    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    /// Get the id of a symbol that appears in some rule.
    #[inline]
    pub fn symbol_id(&self, symbol: &str) -> Option<u32> {
        self.symbol_ids.get(symbol).copied()
    }

    /// Get the text of a symbol id.
    #[inline]
    pub fn symbol(&self, id: u32) -> Option<&str> {
        self.symbols.get(id as usize).map(|s| s.as_str())
    }

    /// Get the merge rule for a pair.
    ///
    /// Returns Some((rank, merged_id)) if this pair should be merged,
    /// None otherwise.
    #[inline]
    pub fn get(&self, pair: Pair) -> Option<(u32, u32)> {
        self.merges.get(&pair).copied()
    }

    /// Rank of the rule merging `left` and `right`, by symbol text.
    pub fn rank_of(&self, left: &str, right: &str) -> Option<u32> {
        let pair = (self.symbol_id(left)?, self.symbol_id(right)?);
        self.get(pair).map(|(rank, _)| rank)
    }

    /// Get the number of merge rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no merge rules.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Get statistics about the merge rules.
    pub fn stats(&self) -> MergeStats {
        MergeStats {
            count: self.len(),
            symbols: self.symbols.len(),
            longest_symbol: self
                .symbols
                .iter()
                .map(|s| s.trim_end_matches(END_OF_WORD).chars().count())
                .max()
                .unwrap_or(0),
        }
    }
}

/// Statistics about a BPE model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Number of merge rules
    pub count: usize,
    /// Number of distinct symbols mentioned by the rules
    pub symbols: usize,
    /// Length in characters of the longest symbol, marker excluded
    pub longest_symbol: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> BpeModel {
        BpeModel::from_pairs([("e", "s"), ("es", "t</w>"), ("l", "o")]).unwrap()
    }

    #[test]
    fn test_from_pairs_assigns_ranks() {
        let rules = model();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.rules()[0].rank, 0);
        assert_eq!(rules.rules()[2].rank, 2);
        assert_eq!(rules.rank_of("es", "t</w>"), Some(1));
        assert_eq!(rules.rank_of("l", "o"), Some(2));
        assert_eq!(rules.rank_of("o", "l"), None);
    }

    #[test]
    fn test_merged_symbol_is_interned() {
        let rules = model();
        let e = rules.symbol_id("e").unwrap();
        let s = rules.symbol_id("s").unwrap();
        let (rank, merged) = rules.get((e, s)).unwrap();
        assert_eq!(rank, 0);
        assert_eq!(rules.symbol(merged), Some("es"));
    }

    #[test]
    fn test_rejects_duplicates_and_bad_symbols() {
        assert!(matches!(
            BpeModel::from_pairs([("a", "b"), ("a", "b")]),
            Err(PrepError::InvalidMerge(_))
        ));
        assert!(BpeModel::from_pairs([("a b", "c")]).is_err());
        assert!(BpeModel::from_pairs([("", "c")]).is_err());
        assert!(BpeModel::from_pairs([("a</w>", "c")]).is_err());
    }

    #[test]
    fn test_stats() {
        let stats = model().stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.longest_symbol, 3);
    }
}
