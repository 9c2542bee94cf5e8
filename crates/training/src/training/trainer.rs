//! BPE merge learning.
//!
//! The learner repeatedly merges the most frequent adjacent symbol pair
//! across the counted corpus tokens. Equal counts are broken by the pair's
//! first-encountered order in the frequency table, so the same counts always
//! yield the same model file.

use super::counter::PairCounter;
use super::counts::TokenCounter;
use ahash::AHashSet;
use compact_str::CompactString;
use nmtprep_core::{BpeModel, MergeCandidate, PairPriorityQueue, Result};
use tracing::{debug, info};

/// Configuration for BPE learning.
#[derive(Debug, Clone)]
pub struct LearnConfig {
    /// Maximum number of merge rules to learn
    pub num_merges: usize,
    /// Stop once the best pair occurs fewer times than this
    pub min_frequency: u64,
    /// Whether to count the initial pairs in parallel
    pub parallel: bool,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            num_merges: 32_000,
            min_frequency: 2,
            parallel: true,
        }
    }
}

impl LearnConfig {
    /// Default configuration with the given merge count.
    pub fn with_merges(num_merges: usize) -> Self {
        Self {
            num_merges,
            ..Default::default()
        }
    }
}

/// BPE learner.
///
/// Learns an ordered list of merge rules from token counts. The learner
/// never sees raw text, only the `(token, count)` table, so memory is
/// bounded by the number of distinct tokens.
pub struct BpeLearner {
    config: LearnConfig,
}

impl BpeLearner {
    /// Create a learner with the given configuration.
    pub fn new(config: LearnConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &LearnConfig {
        &self.config
    }

    /// Learn merge rules from token counts.
    ///
    /// A corpus without any adjacent pair yields an empty model.
    pub fn learn(&self, counts: &TokenCounter) -> Result<BpeModel> {
        let mut counter = PairCounter::from_token_counts(counts, self.config.parallel);
        info!(
            "learning up to {} merges from {} distinct tokens",
            self.config.num_merges,
            counter.word_count()
        );

        let initial: Vec<_> = counter.pairs().collect();
        let mut queue = PairPriorityQueue::with_capacity(initial.len());
        for (pair, count, order) in initial {
            queue.push(MergeCandidate::new(pair, count, order));
        }

        let mut rules: Vec<(CompactString, CompactString)> = Vec::new();
        let mut learned = AHashSet::new();

        while rules.len() < self.config.num_merges {
            let Some(candidate) = queue.pop() else {
                break;
            };
            if candidate.count < self.config.min_frequency {
                break;
            }

            let left = CompactString::new(counter.symbol(candidate.pair.0));
            let right = CompactString::new(counter.symbol(candidate.pair.1));
            let mut merged = left.clone();
            merged.push_str(&right);
            let merged_id = counter.intern(&merged);

            for (pair, count) in counter.merge_pair(candidate.pair, merged_id) {
                let order = counter.pair_order(pair).unwrap_or(u64::MAX);
                queue.update(pair, count, order);
            }

            // Two distinct symbol pairs can spell the same text pair only if
            // a merged symbol equals an atomic one; keep the first.
            if !learned.insert((left.clone(), right.clone())) {
                continue;
            }

            debug!(
                rank = rules.len(),
                count = candidate.count,
                "merge {} {} -> {}",
                left,
                right,
                merged
            );
            rules.push((left, right));

            if rules.len() % 1000 == 0 {
                info!("learned {} merges", rules.len());
            }
        }

        let model = BpeModel::from_pairs(rules)?;
        let stats = model.stats();
        info!(
            "learned {} merges ({} symbols, longest {} chars)",
            stats.count, stats.symbols, stats.longest_symbol
        );
        Ok(model)
    }
}

/// Learn `num_merges` rules with the default configuration.
pub fn learn(counts: &TokenCounter, num_merges: usize) -> Result<BpeModel> {
    BpeLearner::new(LearnConfig::with_merges(num_merges)).learn(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmtprep_core::BpeEncoder;

    fn corpus(words: &[&str]) -> TokenCounter {
        let mut counts = TokenCounter::new();
        for (i, word) in words.iter().enumerate() {
            counts.add_line(i as u64, word.split_whitespace());
        }
        counts
    }

    fn rules(model: &BpeModel) -> Vec<(&str, &str)> {
        model
            .rules()
            .iter()
            .map(|r| (r.left.as_str(), r.right.as_str()))
            .collect()
    }

    #[test]
    fn test_low_lower_newest_widest() {
        let counts = corpus(&["low", "lower", "newest", "widest"]);
        let model = learn(&counts, 3).unwrap();

        assert_eq!(rules(&model), vec![("l", "o"), ("w", "e"), ("s", "t</w>")]);
        assert_eq!(BpeEncoder::new(&model).encode("lowest"), vec!["lo", "we", "st"]);
    }

    #[test]
    fn test_most_frequent_pair_first() {
        let counts = TokenCounter::from_counts([("low", 5), ("lower", 2), ("newest", 6), ("widest", 3)]);
        let model = learn(&counts, 10).unwrap();

        // e s: 6 + 3, s t</w>: 6 + 3, then es t</w> after the first merge.
        assert_eq!(rules(&model)[0], ("e", "s"));
        assert_eq!(rules(&model)[1], ("es", "t</w>"));
        assert_eq!(model.rules()[0].rank, 0);
    }

    #[test]
    fn test_stops_when_no_pair_repeats() {
        let counts = corpus(&["abc", "xyz"]);
        let model = learn(&counts, 10).unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn test_empty_corpus_gives_empty_model() {
        let model = learn(&TokenCounter::new(), 5).unwrap();
        assert!(model.is_empty());

        let single = corpus(&["a a a"]);
        assert!(learn(&single, 5).unwrap().is_empty());
    }

    #[test]
    fn test_min_frequency() {
        let counts = TokenCounter::from_counts([("ab", 3), ("cd", 2)]);
        let learner = BpeLearner::new(LearnConfig {
            num_merges: 10,
            min_frequency: 3,
            parallel: false,
        });
        let model = learner.learn(&counts).unwrap();
        assert_eq!(rules(&model), vec![("a", "b</w>")]);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let text = "the quick brown fox jumps over the lazy dog \
                    the dog barks and the fox runs over the hill";
        let counts = corpus(&[text, text, "brown brown foxes"]);

        let mut config = LearnConfig::with_merges(40);
        config.parallel = false;
        let sequential = BpeLearner::new(config.clone()).learn(&counts).unwrap();
        config.parallel = true;
        let parallel = BpeLearner::new(config).learn(&counts).unwrap();

        assert_eq!(sequential.rules(), parallel.rules());
    }

    #[test]
    fn test_learned_model_round_trips() {
        let counts = corpus(&["unbelievable believable unbelief", "relief belief"]);
        let model = learn(&counts, 20).unwrap();
        let encoder = BpeEncoder::new(&model);

        for word in ["unbelievable", "believer", "reliefs", "x"] {
            let pieces = encoder.encode(word);
            assert_eq!(nmtprep_core::encoding::decode(&pieces), word);
        }
    }
}
