#![forbid(unsafe_code)]
//! # Word Frequency Comparison CLI
//!
//! Command-line interface for the `wordfreq_compare` crate. It compares how
//! often words occur in two categories of documents drawn from one
//! bag-of-words collection and runs a Wilcoxon rank-sum test per word.
//!
//! ## Commands
//! - `run`: the whole pipeline from a JSON configuration.
//! - `compare`: only the final test, against tables an earlier `run` saved.
//! - `select`: only the corpus selection step.
//!
//! ## Example
//! ```bash
//! RUST_LOG=info cargo run --release -- run hum-sci.json --threshold 5 --sample 500
//! ```
//!
//! See `--help` for all available options.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use log::error;
use wordfreq_compare::{
    ComparisonConfig, run_comparison, run_pipeline, select_random_subset, select_subset,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Select, count, restrict, merge and compare in one go
    Run {
        /// JSON comparison configuration
        config: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Compare using the tables and vocabulary list of an earlier run
    Compare {
        /// JSON comparison configuration
        config: PathBuf,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Copy the rows of two filename lists out of a collection file
    Select {
        /// Bag-of-words collection (one `filename index terms...` line per document)
        collection: PathBuf,
        /// Filename list of category 1
        c1_filenames: PathBuf,
        /// Filename list of category 2
        c2_filenames: PathBuf,
        /// Output bag-of-words file for category 1
        c1_out: PathBuf,
        /// Output bag-of-words file for category 2
        c2_out: PathBuf,
        /// Randomly sample this many filenames from each list first
        #[arg(long)]
        sample: Option<usize>,
        /// Seed for the random sample
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Settings that override the configuration file.
#[derive(Args)]
struct Overrides {
    /// Minimum total count a word needs in a category to be kept
    #[arg(long)]
    threshold: Option<u64>,

    /// Randomly sample this many documents per category
    #[arg(long)]
    sample: Option<usize>,

    /// Seed for the random sample
    #[arg(long)]
    seed: Option<u64>,

    /// Results CSV path (default: timestamped file in the output directory)
    #[arg(long)]
    results: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut ComparisonConfig) {
        if self.threshold.is_some() {
            config.threshold = self.threshold;
        }
        if self.sample.is_some() {
            config.sample_size = self.sample;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.results.is_some() {
            config.results = self.results;
        }
    }
}

fn load(path: PathBuf, overrides: Overrides) -> wordfreq_compare::Result<ComparisonConfig> {
    let mut config = ComparisonConfig::from_path(&path)?;
    overrides.apply(&mut config);
    Ok(config)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Run { config, overrides } => load(config, overrides)
            .and_then(|config| run_pipeline(&config))
            .map(|report| {
                println!(
                    "Compared {} words ({} + {} after restriction); results written to {}",
                    report.vocabulary,
                    report.words[0],
                    report.words[1],
                    report.results.display()
                );
            }),
        Command::Compare { config, overrides } => load(config, overrides)
            .and_then(|config| run_comparison(&config))
            .map(|(results, summary)| {
                println!(
                    "Compared {} words; results written to {}",
                    summary.words,
                    results.display()
                );
            }),
        Command::Select {
            collection,
            c1_filenames,
            c2_filenames,
            c1_out,
            c2_out,
            sample,
            seed,
        } => {
            let selected = match sample {
                Some(k) => select_random_subset(
                    &c1_filenames,
                    &c2_filenames,
                    &collection,
                    &c1_out,
                    &c2_out,
                    k,
                    seed,
                ),
                None => select_subset(&c1_filenames, &c2_filenames, &collection, &c1_out, &c2_out),
            };
            selected.map(|summary| {
                println!(
                    "Selected {} rows for category 1 and {} rows for category 2",
                    summary.selected[0], summary.selected[1]
                );
            })
        }
    };

    if let Err(e) = outcome {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
