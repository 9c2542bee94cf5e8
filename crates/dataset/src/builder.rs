//! Batch building for aligned corpora.
//!
//! The corpus is processed one shard at a time, so memory holds one read
//! chunk and one shard of encoded examples, never the whole corpus:
//!
//! 1. encode both sides chunk by chunk (parallel within each chunk),
//!    checking that the two sides have the same number of lines
//! 2. collect `shard_size` examples and shuffle them (seeded)
//! 3. sort the shard by (src, tgt) length
//! 4. fill batches greedily under the example and token limits
//! 5. shuffle the shard's batches with the same generator and hand them
//!    to a [`BatchSink`]
//!
//! Examples keep their line index throughout, so corpus order can be
//! restored from the batches with [`crate::restore_order`].

use crate::batch::{Batch, BatchConfig, Example};
use crate::encoder::SideEncoder;
use crate::index::IndexWriter;
use nmtprep_core::{EncodingWarnings, LineReader, OovStats, PrepError, RawLine, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info};

/// Lines encoded per parallel chunk.
const CHUNK_LINES: usize = 10_000;

/// Receives batches as soon as their shard is finished.
pub trait BatchSink {
    fn push_batch(&mut self, batch: Batch) -> Result<()>;
}

impl BatchSink for Vec<Batch> {
    fn push_batch(&mut self, batch: Batch) -> Result<()> {
        self.push(batch);
        Ok(())
    }
}

/// Counters collected while building.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    /// Aligned lines read
    pub lines: u64,
    /// Examples placed in batches
    pub examples: u64,
    /// Batches handed to the sink
    pub batches: u64,
    /// Lines that were not valid UTF-8 (decoded lossily)
    pub malformed: u64,
    pub src_oov: OovStats,
    pub tgt_oov: OovStats,
}

/// Result of an in-memory build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub batches: Vec<Batch>,
    pub stats: BuildStats,
}

/// Builds batches from an aligned corpus pair.
pub struct BatchBuilder {
    config: BatchConfig,
    src: SideEncoder,
    tgt: SideEncoder,
}

impl BatchBuilder {
    /// Create a builder; zero batch limits are rejected here.
    pub fn new(config: BatchConfig, src: SideEncoder, tgt: SideEncoder) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, src, tgt })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Build from in-memory lines.
    ///
    /// Alignment and example sizes are checked before any batch is formed.
    pub fn build_from_lines<S: AsRef<str> + Sync>(&self, src: &[S], tgt: &[S]) -> Result<BuildOutput> {
        if src.len() != tgt.len() {
            return Err(PrepError::Alignment {
                src_lines: src.len(),
                tgt_lines: tgt.len(),
            });
        }

        let mut stats = BuildStats::default();
        let pairs: Vec<(u64, &str, &str)> = src
            .iter()
            .zip(tgt)
            .enumerate()
            .map(|(i, (s, t))| (i as u64, s.as_ref(), t.as_ref()))
            .collect();
        let examples = self.encode_pairs(&pairs, &mut stats)?;
        stats.lines = examples.len() as u64;

        let mut batches = Vec::new();
        let mut shards = Sharder::new(self, &mut batches);
        shards.extend(examples)?;
        shards.finish(&mut stats)?;
        self.log_stats(&stats);
        Ok(BuildOutput { batches, stats })
    }

    /// Build from two line-aligned files, streaming them in chunks and
    /// sending each finished shard's batches to `sink`.
    ///
    /// Lines that are not valid UTF-8 are decoded lossily and counted. On
    /// error the sink may already hold batches from earlier shards; an
    /// [`IndexWriter`] sink must then be dropped without committing.
    pub fn build_from_files<K: BatchSink>(
        &self,
        src_path: impl AsRef<Path>,
        tgt_path: impl AsRef<Path>,
        sink: &mut K,
    ) -> Result<BuildStats> {
        let src_path = src_path.as_ref();
        let tgt_path = tgt_path.as_ref();
        let mut src_chunks = LineReader::open(src_path)?.chunks(CHUNK_LINES);
        let mut tgt_chunks = LineReader::open(tgt_path)?.chunks(CHUNK_LINES);

        let warnings = EncodingWarnings::new();
        let mut stats = BuildStats::default();
        let mut shards = Sharder::new(self, sink);
        let mut read = 0usize;

        loop {
            let src_chunk = src_chunks.next().transpose()?;
            let tgt_chunk = tgt_chunks.next().transpose()?;
            match (src_chunk, tgt_chunk) {
                (None, None) => break,
                (Some(s), Some(t)) if s.len() == t.len() => {
                    read += s.len();
                    let src_text = decode_chunk(&s, &warnings, "source");
                    let tgt_text = decode_chunk(&t, &warnings, "target");
                    let pairs: Vec<(u64, &str, &str)> = s
                        .iter()
                        .zip(src_text.iter().zip(&tgt_text))
                        .map(|(line, (a, b))| (line.index, &**a, &**b))
                        .collect();
                    shards.extend(self.encode_pairs(&pairs, &mut stats)?)?;
                }
                (s, t) => {
                    let src_lines = read + s.map_or(0, |c| c.len()) + count_rest(src_chunks)?;
                    let tgt_lines = read + t.map_or(0, |c| c.len()) + count_rest(tgt_chunks)?;
                    return Err(PrepError::Alignment {
                        src_lines,
                        tgt_lines,
                    });
                }
            }
        }
        shards.finish(&mut stats)?;

        stats.lines = read as u64;
        stats.malformed = warnings.count();
        warnings.report("build-index");
        info!(
            "read {} aligned lines from {} and {}",
            read,
            src_path.display(),
            tgt_path.display()
        );
        self.log_stats(&stats);
        Ok(stats)
    }

    /// Build from two line-aligned files straight into an index file.
    ///
    /// The index only appears at `index_path` if the whole corpus was
    /// built; any error leaves no file behind.
    pub fn build_index_file(
        &self,
        src_path: impl AsRef<Path>,
        tgt_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
    ) -> Result<BuildStats> {
        let mut writer = IndexWriter::create(index_path)?;
        let stats = self.build_from_files(src_path, tgt_path, &mut writer)?;
        writer.commit()?;
        Ok(stats)
    }

    /// Encode pairs in parallel; output order follows input order.
    ///
    /// An example that cannot fit in a batch on its own is a capacity
    /// error naming the first such line.
    fn encode_pairs(&self, pairs: &[(u64, &str, &str)], stats: &mut BuildStats) -> Result<Vec<Example>> {
        let add = self.config.add_bos_eos;
        let encoded: Vec<(Example, OovStats, OovStats)> = pairs
            .par_iter()
            .map(|&(index, src, tgt)| {
                let mut src_oov = OovStats::default();
                let mut tgt_oov = OovStats::default();
                let example = Example {
                    index,
                    src: self.src.encode(src, add, &mut src_oov),
                    tgt: self.tgt.encode(tgt, add, &mut tgt_oov),
                };
                (example, src_oov, tgt_oov)
            })
            .collect();

        let max_tokens = self.config.max_batch_tokens;
        if let Some((example, _, _)) = encoded.iter().find(|(e, _, _)| e.token_count() > max_tokens) {
            return Err(PrepError::Capacity(format!(
                "line {}: {} tokens exceed max_batch_tokens {}",
                example.index + 1,
                example.token_count(),
                max_tokens
            )));
        }

        Ok(encoded
            .into_iter()
            .map(|(example, src_oov, tgt_oov)| {
                stats.src_oov.merge(src_oov);
                stats.tgt_oov.merge(tgt_oov);
                example
            })
            .collect())
    }

    /// Greedily group a sorted shard under both limits.
    fn fill_batches(&self, shard: &[Example]) -> Vec<Batch> {
        let src_pad = self.src.pad_id();
        let tgt_pad = self.tgt.pad_id();
        let mut batches = Vec::new();
        let mut current: Vec<&Example> = Vec::new();
        let mut tokens = 0usize;

        for example in shard {
            let full = current.len() >= self.config.max_batch_examples
                || tokens + example.token_count() > self.config.max_batch_tokens;
            if full && !current.is_empty() {
                batches.push(Batch::from_examples(&current, src_pad, tgt_pad));
                current.clear();
                tokens = 0;
            }
            tokens += example.token_count();
            current.push(example);
        }
        if !current.is_empty() {
            batches.push(Batch::from_examples(&current, src_pad, tgt_pad));
        }
        batches
    }

    fn log_stats(&self, stats: &BuildStats) {
        info!(
            "built {} batches from {} examples (src <unk> {:.2}%, tgt <unk> {:.2}%)",
            stats.batches,
            stats.examples,
            100.0 * stats.src_oov.rate(),
            100.0 * stats.tgt_oov.rate()
        );
    }
}

/// Collects examples into shards and batches each one as it fills.
struct Sharder<'a, K> {
    builder: &'a BatchBuilder,
    sink: &'a mut K,
    rng: StdRng,
    pending: Vec<Example>,
    examples: u64,
    batches: u64,
}

impl<'a, K: BatchSink> Sharder<'a, K> {
    fn new(builder: &'a BatchBuilder, sink: &'a mut K) -> Self {
        Self {
            rng: StdRng::seed_from_u64(builder.config.seed),
            builder,
            sink,
            pending: Vec::new(),
            examples: 0,
            batches: 0,
        }
    }

    fn extend(&mut self, examples: Vec<Example>) -> Result<()> {
        let shard_size = self.builder.config.shard_size;
        for example in examples {
            self.pending.push(example);
            if shard_size > 0 && self.pending.len() >= shard_size {
                self.flush()?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let shuffle = self.builder.config.shuffle;
        let mut shard = std::mem::take(&mut self.pending);
        if shuffle {
            shard.shuffle(&mut self.rng);
        }
        // Stable, so shuffled ties stay shuffled.
        shard.sort_by_key(|e| (e.src.len(), e.tgt.len()));

        let mut batches = self.builder.fill_batches(&shard);
        if shuffle {
            batches.shuffle(&mut self.rng);
        }
        debug!(examples = shard.len(), batches = batches.len(), "shard done");

        self.examples += shard.len() as u64;
        self.batches += batches.len() as u64;
        for batch in batches {
            self.sink.push_batch(batch)?;
        }
        Ok(())
    }

    fn finish(mut self, stats: &mut BuildStats) -> Result<()> {
        self.flush()?;
        stats.examples = self.examples;
        stats.batches = self.batches;
        Ok(())
    }
}

fn decode_chunk<'a>(
    lines: &'a [RawLine],
    warnings: &EncodingWarnings,
    side: &str,
) -> Vec<std::borrow::Cow<'a, str>> {
    lines
        .iter()
        .map(|line| {
            if line.text().is_err() {
                warnings.record(line.index, side);
            }
            line.text_lossy()
        })
        .collect()
}

fn count_rest<R: BufRead>(chunks: nmtprep_core::input::LineChunks<R>) -> Result<usize> {
    let mut count = 0;
    for chunk in chunks {
        count += chunk?.len();
    }
    Ok(count)
}
