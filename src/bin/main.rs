use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use virast_core::core::types::Correction;
use virast_core::{
    persistence, ConfusionModel, CorpusIndexer, CorrectorConfig, Dictionary, WordCorrector,
};

#[derive(Parser)]
#[command(name = "virast", version, about = "Post-correction for Perso-Arabic OCR output")]
struct Cli {
    /// Verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build (or extend) a context-model snapshot from a corpus directory.
    BuildModel {
        /// Directory containing corpus text files.
        corpus_dir: PathBuf,
        /// File-name pattern to match.
        #[arg(long, default_value = "*.txt")]
        pattern: String,
        /// Do not descend into subdirectories.
        #[arg(long)]
        no_recursive: bool,
        /// Merge into an existing snapshot at the output path, if present.
        #[arg(long)]
        merge: bool,
        /// Snapshot output path.
        #[arg(short, long, default_value = "context_model.bin")]
        output: PathBuf,
        /// Also write the corpus vocabulary, most frequent first.
        #[arg(long)]
        save_vocab: Option<PathBuf>,
        /// Minimum corpus frequency for a vocabulary entry.
        #[arg(long, default_value_t = 2)]
        min_freq: u64,
        /// Minimum word length to index.
        #[arg(long, default_value_t = 2)]
        min_word_length: usize,
    },
    /// Build a dictionary word list from a corpus directory.
    BuildDict {
        /// Directory containing corpus text files.
        corpus_dir: PathBuf,
        /// Word-list output path, most frequent words first.
        #[arg(short, long, default_value = "dictionary.txt")]
        output: PathBuf,
        /// Minimum word length to keep.
        #[arg(long, default_value_t = 2)]
        min_word_length: usize,
    },
    /// Correct OCR output text.
    Correct {
        /// Input text file (mutually exclusive with --text).
        #[arg(short, long, conflicts_with = "text")]
        input: Option<PathBuf>,
        /// Text given directly on the command line.
        #[arg(short, long)]
        text: Option<String>,
        /// Dictionary word list, one word per line.
        #[arg(short, long)]
        dict: PathBuf,
        /// Context-model snapshot; omitted means neutral context scoring.
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Acceptance threshold in [0, 100].
        #[arg(long, default_value_t = 65.0)]
        threshold: f64,
        /// Weight of context scoring in [0, 1].
        #[arg(long, default_value_t = 0.2)]
        context_weight: f64,
        /// Write the corrected text here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Emit a JSON report (corrected text plus the correction log).
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct CorrectionReport<'a> {
    corrected: &'a str,
    corrections: &'a [Correction],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::BuildModel {
            corpus_dir,
            pattern,
            no_recursive,
            merge,
            output,
            save_vocab,
            min_freq,
            min_word_length,
        } => build_model(
            corpus_dir,
            &pattern,
            !no_recursive,
            merge,
            output,
            save_vocab,
            min_freq,
            min_word_length,
        ),
        Command::BuildDict { corpus_dir, output, min_word_length } => {
            build_dict(corpus_dir, output, min_word_length)
        }
        Command::Correct {
            input,
            text,
            dict,
            model,
            threshold,
            context_weight,
            output,
            json,
        } => correct(input, text, dict, model, threshold, context_weight, output, json),
    }
}

fn build_dict(corpus_dir: PathBuf, output: PathBuf, min_word_length: usize) -> anyhow::Result<()> {
    let dictionary = Dictionary::from_corpus_dir(&corpus_dir, min_word_length)
        .with_context(|| format!("scanning corpus at {}", corpus_dir.display()))?;
    dictionary
        .save(&output)
        .with_context(|| format!("writing dictionary to {}", output.display()))?;
    eprintln!("Saved {} words to {}", dictionary.len(), output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_model(
    corpus_dir: PathBuf,
    pattern: &str,
    recursive: bool,
    merge: bool,
    output: PathBuf,
    save_vocab: Option<PathBuf>,
    min_freq: u64,
    min_word_length: usize,
) -> anyhow::Result<()> {
    let base = if merge {
        persistence::load_model_or_default(&output)
    } else {
        Default::default()
    };

    let mut indexer = CorpusIndexer::with_model(base, min_word_length);
    let stats = indexer
        .process_directory(&corpus_dir, pattern, recursive)
        .with_context(|| format!("indexing corpus at {}", corpus_dir.display()))?;

    eprintln!("Files processed:   {}", stats.files_processed);
    eprintln!("Files skipped:     {}", stats.files_failed);
    eprintln!("Total words:       {}", stats.total_words);
    eprintln!("Unique words:      {}", stats.unique_words);
    eprintln!("Total bigrams:     {}", stats.total_bigrams);
    eprintln!("Total trigrams:    {}", stats.total_trigrams);

    if let Some(vocab_path) = save_vocab {
        let written = indexer
            .save_vocabulary(&vocab_path, min_freq)
            .with_context(|| format!("writing vocabulary to {}", vocab_path.display()))?;
        eprintln!("Vocabulary:        {} words -> {}", written, vocab_path.display());
    }

    persistence::save_model(indexer.model(), &output)
        .with_context(|| format!("saving snapshot to {}", output.display()))?;
    eprintln!("Saved context model to {}", output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn correct(
    input: Option<PathBuf>,
    text: Option<String>,
    dict: PathBuf,
    model: Option<PathBuf>,
    threshold: f64,
    context_weight: f64,
    output: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let text = match (input, text) {
        (Some(path), _) => fs::read_to_string(&path)
            .with_context(|| format!("reading input file {}", path.display()))?,
        (None, Some(text)) => text,
        (None, None) => anyhow::bail!("either --input or --text is required"),
    };

    let config = CorrectorConfig {
        confusion_threshold: threshold,
        context_weight,
        ..CorrectorConfig::default()
    };
    let dictionary = Dictionary::from_file(&dict, config.min_word_length)
        .with_context(|| format!("loading dictionary {}", dict.display()))?;
    let context = match &model {
        Some(path) => persistence::load_model(path)
            .with_context(|| format!("loading context model {}", path.display()))?,
        None => Default::default(),
    };

    let corrector = WordCorrector::new(dictionary, ConfusionModel::perso_arabic(), context, config);
    let (corrected, corrections) = corrector.process_text(&text);
    eprintln!("{} corrections over {} words", corrections.len(), text.split_whitespace().count());

    let rendered = if json {
        let report = CorrectionReport { corrected: &corrected, corrections: &corrections };
        let mut body = serde_json::to_string_pretty(&report)?;
        body.push('\n');
        body
    } else {
        let mut body = corrected;
        body.push('\n');
        body
    };

    match output {
        Some(path) => fs::write(&path, rendered)
            .with_context(|| format!("writing output to {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}
