//! Batches and their configuration.

use nmtprep_core::{PrepError, Result};
use serde::{Deserialize, Serialize};

/// Limits and ordering options for batch building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BatchConfig {
    /// Maximum number of examples per batch
    pub max_batch_examples: usize,
    /// Maximum number of non-pad tokens (both sides) per batch
    pub max_batch_tokens: usize,
    /// Examples per shard, the unit held in memory; 0 makes the whole
    /// corpus one shard
    pub shard_size: usize,
    /// Shuffle examples and batches within each shard
    pub shuffle: bool,
    /// Seed for both shuffles
    pub seed: u64,
    /// Wrap every sequence in `<bos>` / `<eos>`
    pub add_bos_eos: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_examples: 64,
            max_batch_tokens: 4096,
            shard_size: 500_000,
            shuffle: true,
            seed: 1234,
            add_bos_eos: true,
        }
    }
}

impl BatchConfig {
    /// Reject limits that leave no room for any example.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_examples == 0 {
            return Err(PrepError::Capacity(
                "max_batch_examples must be at least 1".to_string(),
            ));
        }
        if self.max_batch_tokens == 0 {
            return Err(PrepError::Capacity(
                "max_batch_tokens must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One aligned example with its original line index, unpadded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub index: u64,
    pub src: Vec<u32>,
    pub tgt: Vec<u32>,
}

impl Example {
    /// Non-pad tokens on both sides.
    pub fn token_count(&self) -> usize {
        self.src.len() + self.tgt.len()
    }
}

/// A padded batch of examples.
///
/// Sequences on each side are right-padded to the longest sequence of that
/// side in this batch; `*_lengths` keep the unpadded lengths and `indices`
/// the original line numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub indices: Vec<u64>,
    pub src: Vec<Vec<u32>>,
    pub tgt: Vec<Vec<u32>>,
    pub src_lengths: Vec<usize>,
    pub tgt_lengths: Vec<usize>,
}

impl Batch {
    /// Pad examples into a batch.
    pub fn from_examples(examples: &[&Example], src_pad: u32, tgt_pad: u32) -> Self {
        let src_width = examples.iter().map(|e| e.src.len()).max().unwrap_or(0);
        let tgt_width = examples.iter().map(|e| e.tgt.len()).max().unwrap_or(0);

        let mut batch = Batch {
            indices: Vec::with_capacity(examples.len()),
            src: Vec::with_capacity(examples.len()),
            tgt: Vec::with_capacity(examples.len()),
            src_lengths: Vec::with_capacity(examples.len()),
            tgt_lengths: Vec::with_capacity(examples.len()),
        };
        for example in examples {
            batch.indices.push(example.index);
            batch.src.push(padded(&example.src, src_width, src_pad));
            batch.tgt.push(padded(&example.tgt, tgt_width, tgt_pad));
            batch.src_lengths.push(example.src.len());
            batch.tgt_lengths.push(example.tgt.len());
        }
        batch
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Non-pad tokens on both sides.
    pub fn token_count(&self) -> usize {
        self.src_lengths.iter().sum::<usize>() + self.tgt_lengths.iter().sum::<usize>()
    }

    /// The unpadded examples, in batch order.
    pub fn examples(&self) -> impl Iterator<Item = Example> + '_ {
        (0..self.len()).map(move |i| Example {
            index: self.indices[i],
            src: self.src[i][..self.src_lengths[i]].to_vec(),
            tgt: self.tgt[i][..self.tgt_lengths[i]].to_vec(),
        })
    }
}

fn padded(ids: &[u32], width: usize, pad: u32) -> Vec<u32> {
    let mut row = Vec::with_capacity(width);
    row.extend_from_slice(ids);
    row.resize(width, pad);
    row
}

/// Put examples from any number of batches back into corpus order.
pub fn restore_order<I>(batches: I) -> Vec<Example>
where
    I: IntoIterator<Item = Batch>,
{
    let mut examples: Vec<Example> = batches
        .into_iter()
        .flat_map(|batch| batch.examples().collect::<Vec<_>>())
        .collect();
    examples.sort_by_key(|e| e.index);
    examples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(index: u64, src: &[u32], tgt: &[u32]) -> Example {
        Example {
            index,
            src: src.to_vec(),
            tgt: tgt.to_vec(),
        }
    }

    #[test]
    fn test_padding_to_batch_max() {
        let a = example(4, &[2, 7, 3], &[2, 9, 9, 9, 3]);
        let b = example(1, &[2, 3], &[2, 8, 3]);
        let batch = Batch::from_examples(&[&a, &b], 0, 0);

        assert_eq!(batch.src, vec![vec![2, 7, 3], vec![2, 3, 0]]);
        assert_eq!(batch.tgt[1], vec![2, 8, 3, 0, 0]);
        assert_eq!(batch.src_lengths, vec![3, 2]);
        assert_eq!(batch.token_count(), 13);
    }

    #[test]
    fn test_examples_strip_padding() {
        let a = example(0, &[5], &[6, 6]);
        let b = example(1, &[5, 5, 5], &[6]);
        let batch = Batch::from_examples(&[&a, &b], 0, 0);
        let back: Vec<Example> = batch.examples().collect();
        assert_eq!(back, vec![a, b]);
    }

    #[test]
    fn test_restore_order() {
        let a = example(2, &[1], &[1]);
        let b = example(0, &[2], &[2]);
        let c = example(1, &[3], &[3]);
        let batches = vec![
            Batch::from_examples(&[&a, &b], 0, 0),
            Batch::from_examples(&[&c], 0, 0),
        ];
        let indices: Vec<u64> = restore_order(batches).iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_zero_limits_are_capacity_errors() {
        let config = BatchConfig {
            max_batch_tokens: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PrepError::Capacity(_))));

        let config = BatchConfig {
            max_batch_examples: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PrepError::Capacity(_))));
    }
}
