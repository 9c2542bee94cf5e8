//! Pair counting for BPE training.
//!
//! Each distinct corpus token becomes a "word": its grapheme symbols, the
//! last one carrying the end-of-word marker, weighted by the token's corpus
//! count. The counter keeps the aggregate count of every adjacent symbol pair
//! together with the order in which the pair first entered the table, and an
//! index from pair to the words containing it so that a merge only revisits
//! the words it touches.

use super::counts::TokenCounter;
use ahash::AHashMap;
use compact_str::CompactString;
use nmtprep_core::{Pair, END_OF_WORD};
use rayon::prelude::*;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Counter for BPE pair frequencies.
pub struct PairCounter {
    /// Symbol id -> text
    symbols: Vec<CompactString>,
    /// Symbol text -> id
    symbol_ids: AHashMap<CompactString, u32>,
    /// Word -> symbol ids
    words: Vec<Vec<u32>>,
    /// Word -> corpus frequency
    word_counts: Vec<u64>,
    /// Pair -> aggregate frequency
    pair_counts: AHashMap<Pair, u64>,
    /// Pair -> first-encountered position in the table
    pair_order: AHashMap<Pair, u64>,
    /// Pair -> words that contain (or once contained) it
    pair_words: AHashMap<Pair, Vec<usize>>,
    next_order: u64,
}

impl PairCounter {
    /// Split every counted token into symbols and index its pairs.
    ///
    /// Tokens are visited in first-seen order, pairs left to right, which
    /// fixes the tie-break order of the table.
    pub fn from_token_counts(counts: &TokenCounter, parallel: bool) -> Self {
        let mut counter = Self {
            symbols: Vec::new(),
            symbol_ids: AHashMap::new(),
            words: Vec::with_capacity(counts.len()),
            word_counts: Vec::with_capacity(counts.len()),
            pair_counts: AHashMap::new(),
            pair_order: AHashMap::new(),
            pair_words: AHashMap::new(),
            next_order: 0,
        };

        let mut skipped = 0usize;
        for (token, count) in counts.in_first_seen_order() {
            if token.contains(END_OF_WORD) {
                skipped += 1;
                continue;
            }
            counter.add_word(token, count);
        }
        if skipped > 0 {
            warn!(
                "skipped {} token(s) containing the reserved marker {}",
                skipped, END_OF_WORD
            );
        }

        if parallel {
            counter.count_pairs_parallel();
        } else {
            counter.count_pairs_sequential();
        }
        counter
    }

    fn add_word(&mut self, token: &str, count: u64) {
        let graphemes: Vec<&str> = token.graphemes(true).collect();
        let last = graphemes.len().saturating_sub(1);
        let mut word = Vec::with_capacity(graphemes.len());
        for (i, g) in graphemes.iter().enumerate() {
            let id = if i == last {
                let mut symbol = CompactString::new(g);
                symbol.push_str(END_OF_WORD);
                self.intern(&symbol)
            } else {
                self.intern(g)
            };
            word.push(id);
        }
        self.words.push(word);
        self.word_counts.push(count);
    }

    /// Get or assign the id of a symbol.
    pub fn intern(&mut self, symbol: &str) -> u32 {
        if let Some(&id) = self.symbol_ids.get(symbol) {
            return id;
        }
        let id = self.symbols.len() as u32;
        let symbol = CompactString::new(symbol);
        self.symbols.push(symbol.clone());
        self.symbol_ids.insert(symbol, id);
        id
    }

    /// Text of a symbol id.
    pub fn symbol(&self, id: u32) -> &str {
        &self.symbols[id as usize]
    }

    fn count_pairs_sequential(&mut self) {
        for (w, word) in self.words.iter().enumerate() {
            let count = self.word_counts[w];
            for window in word.windows(2) {
                let pair = (window[0], window[1]);
                *self.pair_counts.entry(pair).or_insert(0) += count;
                if !self.pair_order.contains_key(&pair) {
                    self.pair_order.insert(pair, self.next_order);
                    self.next_order += 1;
                }
                push_word(self.pair_words.entry(pair).or_default(), w);
            }
        }
    }

    /// Parallel map over words, then one sequential pass to assign orders.
    fn count_pairs_parallel(&mut self) {
        type Stats = AHashMap<Pair, (u64, (usize, usize), Vec<usize>)>;

        let stats: Stats = self
            .words
            .par_iter()
            .zip(self.word_counts.par_iter())
            .enumerate()
            .fold(Stats::new, |mut acc, (w, (word, &count))| {
                for (pos, window) in word.windows(2).enumerate() {
                    let entry = acc
                        .entry((window[0], window[1]))
                        .or_insert_with(|| (0, (w, pos), Vec::new()));
                    entry.0 += count;
                    entry.1 = entry.1.min((w, pos));
                    push_word(&mut entry.2, w);
                }
                acc
            })
            .reduce(Stats::new, |mut a, b| {
                for (pair, (count, first, words)) in b {
                    let entry = a
                        .entry(pair)
                        .or_insert_with(|| (0, first, Vec::new()));
                    entry.0 += count;
                    entry.1 = entry.1.min(first);
                    entry.2.extend(words);
                }
                a
            });

        let mut ordered: Vec<(Pair, (u64, (usize, usize), Vec<usize>))> =
            stats.into_iter().collect();
        ordered.sort_by_key(|(_, (_, first, _))| *first);

        for (pair, (count, _, mut words)) in ordered {
            words.sort_unstable();
            words.dedup();
            self.pair_counts.insert(pair, count);
            self.pair_order.insert(pair, self.next_order);
            self.next_order += 1;
            self.pair_words.insert(pair, words);
        }
    }

    /// Current aggregate count of a pair.
    pub fn pair_count(&self, pair: Pair) -> u64 {
        self.pair_counts.get(&pair).copied().unwrap_or(0)
    }

    /// First-encountered position of a pair, if it was ever counted.
    pub fn pair_order(&self, pair: Pair) -> Option<u64> {
        self.pair_order.get(&pair).copied()
    }

    /// All pairs with a positive count, as (pair, count, order).
    pub fn pairs(&self) -> impl Iterator<Item = (Pair, u64, u64)> + '_ {
        self.pair_counts
            .iter()
            .map(|(&pair, &count)| (pair, count, self.pair_order[&pair]))
    }

    /// Get the number of unique words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Get a reference to the words.
    pub fn words(&self) -> &[Vec<u32>] {
        &self.words
    }

    /// Merge a pair in every word that contains it.
    ///
    /// Pair counts, orders and the word index are updated in place. Returns
    /// the pairs whose counts changed, in the order their changes were first
    /// seen, with their new counts.
    pub fn merge_pair(&mut self, pair: Pair, merged: u32) -> Vec<(Pair, u64)> {
        let mut word_ids = self.pair_words.remove(&pair).unwrap_or_default();
        word_ids.sort_unstable();
        word_ids.dedup();

        let mut deltas: AHashMap<Pair, i64> = AHashMap::new();
        let mut touched: Vec<Pair> = Vec::new();
        let mut record = |p: Pair, d: i64, deltas: &mut AHashMap<Pair, i64>| {
            let slot = deltas.entry(p).or_insert_with(|| {
                touched.push(p);
                0
            });
            *slot += d;
        };

        for w in word_ids {
            let word = &self.words[w];
            if !word.windows(2).any(|win| (win[0], win[1]) == pair) {
                continue;
            }
            let count = self.word_counts[w] as i64;

            let mut merged_word = Vec::with_capacity(word.len());
            let mut i = 0;
            while i < word.len() {
                if i + 1 < word.len() && (word[i], word[i + 1]) == pair {
                    merged_word.push(merged);
                    i += 2;
                } else {
                    merged_word.push(word[i]);
                    i += 1;
                }
            }

            for win in word.windows(2) {
                record((win[0], win[1]), -count, &mut deltas);
            }
            for win in merged_word.windows(2) {
                let p = (win[0], win[1]);
                record(p, count, &mut deltas);
                if !word.windows(2).any(|old| (old[0], old[1]) == p) {
                    push_word(self.pair_words.entry(p).or_default(), w);
                }
            }

            self.words[w] = merged_word;
        }

        let mut changed = Vec::new();
        for p in touched {
            let delta = deltas[&p];
            if delta == 0 {
                continue;
            }
            let current = self.pair_counts.get(&p).copied().unwrap_or(0) as i64;
            let new_count = (current + delta).max(0) as u64;
            if new_count > 0 {
                self.pair_counts.insert(p, new_count);
                if !self.pair_order.contains_key(&p) {
                    self.pair_order.insert(p, self.next_order);
                    self.next_order += 1;
                }
            } else {
                self.pair_counts.remove(&p);
            }
            changed.push((p, new_count));
        }
        changed
    }
}

fn push_word(words: &mut Vec<usize>, w: usize) {
    if words.last() != Some(&w) {
        words.push(w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(tokens: &[(&str, u64)], parallel: bool) -> PairCounter {
        PairCounter::from_token_counts(&TokenCounter::from_counts(tokens.iter().copied()), parallel)
    }

    fn pair(counter: &PairCounter, a: &str, b: &str) -> Pair {
        (counter.symbol_ids[a], counter.symbol_ids[b])
    }

    #[test]
    fn test_words_carry_end_marker() {
        let counter = counter(&[("abc", 1)], false);
        assert_eq!(counter.word_count(), 1);
        let word: Vec<&str> = counter.words()[0].iter().map(|&id| counter.symbol(id)).collect();
        assert_eq!(word, vec!["a", "b", "c</w>"]);
    }

    #[test]
    fn test_counts_weighted_by_frequency() {
        let counter = counter(&[("ab", 3), ("abc", 2)], false);
        assert_eq!(counter.pair_count(pair(&counter, "a", "b</w>")), 3);
        assert_eq!(counter.pair_count(pair(&counter, "a", "b")), 2);
        assert_eq!(counter.pair_count(pair(&counter, "b", "c</w>")), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let tokens = [("lower", 2), ("newest", 6), ("widest", 3), ("low", 5)];
        let seq = counter(&tokens, false);
        let par = counter(&tokens, true);

        let mut a: Vec<_> = seq
            .pairs()
            .map(|(p, c, o)| (seq.symbol(p.0).to_string(), seq.symbol(p.1).to_string(), c, o))
            .collect();
        let mut b: Vec<_> = par
            .pairs()
            .map(|(p, c, o)| (par.symbol(p.0).to_string(), par.symbol(p.1).to_string(), c, o))
            .collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_pair_updates_neighbours() {
        let mut counter = counter(&[("aaab", 1), ("ab", 4)], false);
        let aa = pair(&counter, "a", "a");
        let merged = counter.intern("aa");
        counter.merge_pair(aa, merged);

        // "aaab" -> aa a b</w>
        assert_eq!(counter.pair_count(aa), 0);
        assert_eq!(counter.pair_count(pair(&counter, "aa", "a")), 1);
        assert_eq!(counter.pair_count(pair(&counter, "a", "b</w>")), 5);
        let order = counter.pair_order(pair(&counter, "aa", "a")).unwrap();
        assert!(order > counter.pair_order(pair(&counter, "a", "b</w>")).unwrap());
    }
}
