//! Corpus token frequencies with first-seen order.
//!
//! Both the BPE learner and the vocabulary builder break frequency ties by
//! the order in which tokens first appear in the corpus. Each entry therefore
//! keeps the `(line, position)` of its first occurrence. Counting shards in
//! parallel and merging them in any order gives the same table, since merge
//! sums counts and keeps the minimum first-seen position.

use ahash::AHashMap;
use compact_str::CompactString;
use rayon::prelude::*;

/// Position of a token's first occurrence: (line index, token index in line).
pub type FirstSeen = (u64, u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    count: u64,
    first_seen: FirstSeen,
}

/// Token -> (count, first occurrence) table.
#[derive(Debug, Clone, Default)]
pub struct TokenCounter {
    entries: AHashMap<CompactString, Entry>,
    lines: u64,
}

impl TokenCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a counter from `(token, count)` pairs; input order is first-seen order.
    pub fn from_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut counter = Self::new();
        for (i, (token, count)) in counts.into_iter().enumerate() {
            counter.add_occurrences(token.as_ref(), count, (i as u64, 0));
        }
        counter
    }

    /// Count the tokens of one corpus line.
    pub fn add_line<I, S>(&mut self, line: u64, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (pos, token) in tokens.into_iter().enumerate() {
            self.add_occurrences(token.as_ref(), 1, (line, pos as u32));
        }
        self.lines += 1;
    }

    fn add_occurrences(&mut self, token: &str, count: u64, first_seen: FirstSeen) {
        if token.is_empty() || count == 0 {
            return;
        }
        match self.entries.get_mut(token) {
            Some(entry) => {
                entry.count += count;
                entry.first_seen = entry.first_seen.min(first_seen);
            }
            None => {
                self.entries
                    .insert(CompactString::new(token), Entry { count, first_seen });
            }
        }
    }

    /// Fold another counter into this one.
    pub fn merge(&mut self, other: TokenCounter) {
        for (token, entry) in other.entries {
            match self.entries.get_mut(&token) {
                Some(mine) => {
                    mine.count += entry.count;
                    mine.first_seen = mine.first_seen.min(entry.first_seen);
                }
                None => {
                    self.entries.insert(token, entry);
                }
            }
        }
        self.lines += other.lines;
    }

    /// Count a shard of lines in parallel.
    ///
    /// `split` maps an item to its global line index and tokens. Per-thread
    /// tables are reduced into one; the result does not depend on scheduling.
    pub fn count_parallel<'a, T, F, S>(items: &'a [T], split: F) -> Self
    where
        T: Sync,
        F: Fn(&'a T) -> Option<(u64, Vec<S>)> + Sync + Send,
        S: AsRef<str>,
    {
        items
            .par_iter()
            .fold(TokenCounter::new, |mut counter, item| {
                if let Some((line, tokens)) = split(item) {
                    counter.add_line(line, tokens);
                }
                counter
            })
            .reduce(TokenCounter::new, |mut a, b| {
                a.merge(b);
                a
            })
    }

    /// Occurrences of a token.
    pub fn get(&self, token: &str) -> u64 {
        self.entries.get(token).map_or(0, |e| e.count)
    }

    /// Tokens ordered by their first occurrence.
    pub fn in_first_seen_order(&self) -> Vec<(&str, u64)> {
        let mut items: Vec<(&str, Entry)> = self
            .entries
            .iter()
            .map(|(token, entry)| (token.as_str(), *entry))
            .collect();
        items.sort_by_key(|(_, entry)| entry.first_seen);
        items.into_iter().map(|(t, e)| (t, e.count)).collect()
    }

    /// Tokens by descending count, ties broken by first occurrence.
    pub fn by_frequency(&self) -> Vec<(&str, u64)> {
        let mut items: Vec<(&str, Entry)> = self
            .entries
            .iter()
            .map(|(token, entry)| (token.as_str(), *entry))
            .collect();
        items.sort_by(|(_, a), (_, b)| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        items.into_iter().map(|(t, e)| (t, e.count)).collect()
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no token has been counted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total token occurrences.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    /// Number of lines counted through [`TokenCounter::add_line`].
    pub fn lines(&self) -> u64 {
        self.lines
    }
}
