use std::sync::Arc;

use nmtprep_core::Vocabulary;
use nmtprep_dataset::{
    restore_order, write_index, BatchBuilder, BatchConfig, IndexReader, PrepError, Result,
    SideEncoder,
};
use std::path::{Path, PathBuf};
use nmtprep_tokenizer::{
    normalize_whitespace, save_bpe_model, save_vocabulary, NetworkDir, Side, TokenizationMode,
    Tokenizer, TokenizerConfig,
};
use nmtprep_training::{build_vocabulary, learn, TokenCounter};

const SRC_LINES: [&str; 9] = [
    "The cat sat on the mat.",
    "A dog barked at 1234 cats!",
    "the mat is red",
    "Cats, dogs, and birds.",
    "It's 3.14 or so",
    "",
    "the the the cat",
    "Naïve café owners",
    "the joiner ￭ and 100％ stay",
];

const TGT_LINES: [&str; 9] = [
    "Le chat était sur le tapis.",
    "Un chien a aboyé sur 1234 chats !",
    "le tapis est rouge",
    "Chats, chiens et oiseaux.",
    "C'est 3,14 environ",
    "",
    "le le le chat",
    "Propriétaires de café naïfs",
    "le joint ￭ et 100％ restent",
];

fn corpus(lines: &[&str], copies: usize) -> Vec<String> {
    (0..copies)
        .flat_map(|_| lines.iter().map(|l| l.to_string()))
        .collect()
}

fn counts(tokenizer: &Tokenizer, lines: &[String]) -> TokenCounter {
    let mut counts = TokenCounter::new();
    for (i, line) in lines.iter().enumerate() {
        counts.add_line(i as u64, tokenizer.tokenize_to_strings(line));
    }
    counts
}

fn side(lines: &[String], network: &NetworkDir, side: Side) -> Result<SideEncoder> {
    let mut config = TokenizerConfig::with_mode("conservative");
    config.joiner_annotate = true;
    let pre = Tokenizer::from_config(&config)?;

    let model = learn(&counts(&pre, lines), 50)?;
    save_bpe_model(&model, network.bpe_model(Some(side)))?;
    config.bpe_model_path = Some(network.bpe_model(Some(side)));
    std::fs::write(network.token_config(side), config.to_json()?)
        .map_err(|e| PrepError::io(network.token_config(side), e))?;

    let tokenizer = network
        .load_tokenizer(side)?
        .expect("token config was just written");
    let vocab = build_vocabulary(&counts(&tokenizer, lines), 10_000)?;
    save_vocabulary(&vocab, network.vocab(side))?;

    Ok(SideEncoder::new(
        Arc::new(network.load_vocabulary(side)?),
        Some(tokenizer),
    ))
}

fn decode_line(encoder: &SideEncoder, ids: &[u32]) -> Result<String> {
    let vocab: &Vocabulary = encoder.vocab();
    let symbols = vocab.decode(ids, true)?;
    let tokenizer = encoder.tokenizer().expect("side has a tokenizer");
    Ok(tokenizer.detokenize_strings(&symbols))
}

fn write_corpus(dir: &Path, src: &[String], tgt: &[String]) -> (PathBuf, PathBuf) {
    let src_path = dir.join("train.src");
    let tgt_path = dir.join("train.tgt");
    std::fs::write(&src_path, src.join("\n")).expect("write src");
    std::fs::write(&tgt_path, tgt.join("\n")).expect("write tgt");
    (src_path, tgt_path)
}

fn pretokenized_builder(config: BatchConfig) -> Result<BatchBuilder> {
    let symbols = nmtprep_core::reserved_symbols("￭")
        .into_iter()
        .map(String::from)
        .chain((0..50).map(|i| format!("w{}", i)));
    let vocab = Arc::new(Vocabulary::from_symbols(symbols)?);
    BatchBuilder::new(
        config,
        SideEncoder::pretokenized(Arc::clone(&vocab)),
        SideEncoder::pretokenized(vocab),
    )
}

fn numbered(n: usize, width: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            (0..1 + i % width)
                .map(|j| format!("w{}", (i + j) % 50))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[test]
fn misaligned_corpus_writes_nothing() -> Result<()> {
    let tmp = tempfile::tempdir().expect("temp dir");
    // Long enough that shards are written before the mismatch shows up.
    let src = numbered(10_050, 4);
    let tgt = src[..10_049].to_vec();
    let (src_path, tgt_path) = write_corpus(tmp.path(), &src, &tgt);

    let builder = pretokenized_builder(BatchConfig {
        shard_size: 100,
        ..Default::default()
    })?;
    let index = tmp.path().join("train.index");
    let result = builder.build_index_file(&src_path, &tgt_path, &index);
    assert!(matches!(
        result,
        Err(PrepError::Alignment {
            src_lines: 10_050,
            tgt_lines: 10_049
        })
    ));
    assert!(!index.exists());
    assert_eq!(std::fs::read_dir(tmp.path()).expect("read dir").count(), 2);
    Ok(())
}

#[test]
fn multi_shard_index_is_written_incrementally() -> Result<()> {
    let tmp = tempfile::tempdir().expect("temp dir");
    let src = numbered(500, 9);
    let tgt = numbered(500, 5);
    let (src_path, tgt_path) = write_corpus(tmp.path(), &src, &tgt);

    let builder = pretokenized_builder(BatchConfig {
        max_batch_examples: 6,
        max_batch_tokens: 60,
        shard_size: 37,
        seed: 5,
        ..Default::default()
    })?;
    let index = tmp.path().join("out").join("train.index");
    let stats = builder.build_index_file(&src_path, &tgt_path, &index)?;
    assert_eq!(stats.lines, 500);
    assert_eq!(stats.examples, 500);

    let batches = IndexReader::open(&index)?.collect::<Result<Vec<_>>>()?;
    assert_eq!(batches.len() as u64, stats.batches);

    // Batches arrive shard by shard.
    let shards: Vec<u64> = batches.iter().map(|b| b.indices[0] / 37).collect();
    for (batch, &shard) in batches.iter().zip(&shards) {
        assert!(batch.indices.iter().all(|&i| i / 37 == shard));
        assert!(batch.len() <= 6 && batch.token_count() <= 60);
    }
    assert!(shards.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(shards.last(), Some(&13));

    let in_memory = builder.build_from_lines(&src, &tgt)?;
    assert_eq!(batches, in_memory.batches);

    let examples = restore_order(batches);
    let indices: Vec<u64> = examples.iter().map(|e| e.index).collect();
    assert_eq!(indices, (0..500).collect::<Vec<u64>>());
    Ok(())
}

#[test]
fn end_to_end_batches_decode_to_the_corpus() -> Result<()> {
    let tmp = tempfile::tempdir().expect("temp dir");
    let network = NetworkDir::create(tmp.path().join("net"))?;
    let src = corpus(&SRC_LINES, 4);
    let tgt = corpus(&TGT_LINES, 4);

    let src_side = side(&src, &network, Side::Src)?;
    let tgt_side = side(&tgt, &network, Side::Tgt)?;

    let config = BatchConfig {
        max_batch_examples: 5,
        max_batch_tokens: 200,
        shard_size: 10,
        seed: 42,
        ..Default::default()
    };
    let builder = BatchBuilder::new(config, src_side.clone(), tgt_side.clone())?;
    let output = builder.build_from_lines(&src, &tgt)?;
    assert_eq!(output.stats.examples, src.len() as u64);
    assert_eq!(output.stats.src_oov.unknown, 0);
    assert_eq!(output.stats.tgt_oov.unknown, 0);

    let index = tmp.path().join("train.index");
    write_index(&index, &output.batches)?;
    let batches = IndexReader::open(&index)?.collect::<Result<Vec<_>>>()?;
    assert_eq!(batches, output.batches);

    for batch in &batches {
        assert!(batch.len() <= 5);
        assert!(batch.token_count() <= 200);
    }

    let examples = restore_order(batches);
    assert_eq!(examples.len(), src.len());
    for (i, example) in examples.iter().enumerate() {
        assert_eq!(example.index, i as u64);
        assert_eq!(decode_line(&src_side, &example.src)?, normalize_whitespace(&src[i]));
        assert_eq!(decode_line(&tgt_side, &example.tgt)?, normalize_whitespace(&tgt[i]));
    }
    Ok(())
}

#[test]
fn rebuilding_with_the_same_seed_is_identical() -> Result<()> {
    let tokenizer = Tokenizer::builder()
        .mode(TokenizationMode::Aggressive { digit_groups: None })
        .joiner_annotate(true)
        .build()?;
    let src = corpus(&SRC_LINES, 10);
    let tgt = corpus(&TGT_LINES, 10);
    let src_vocab = Arc::new(build_vocabulary(&counts(&tokenizer, &src), 30)?);
    let tgt_vocab = Arc::new(build_vocabulary(&counts(&tokenizer, &tgt), 30)?);

    let build = || -> Result<_> {
        let builder = BatchBuilder::new(
            BatchConfig {
                max_batch_examples: 8,
                seed: 99,
                ..Default::default()
            },
            SideEncoder::new(Arc::clone(&src_vocab), Some(tokenizer.clone())),
            SideEncoder::new(Arc::clone(&tgt_vocab), Some(tokenizer.clone())),
        )?;
        builder.build_from_lines(&src, &tgt)
    };

    let first = build()?;
    let second = build()?;
    assert_eq!(first.batches, second.batches);
    assert_eq!(first.stats, second.stats);
    // A 30-symbol cap leaves plenty of <unk>.
    assert!(first.stats.src_oov.unknown > 0);
    Ok(())
}
