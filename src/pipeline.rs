//! End-to-end runs: selection, extraction, conditioning, restriction,
//! vocabulary merge and comparison, each stage writing its files before the
//! next one starts.
//!
//! Runs are not coordinated with each other. Two runs sharing output paths
//! overwrite each other's files and the last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::compare::{CompareSummary, Side, TablePaths, compare_files, compare_to_path};
use crate::config::{Category, ComparisonConfig};
use crate::error::{Error, Result};
use crate::frequency::{condition, extract_frequencies_from_path};
use crate::select::{SelectionSummary, select_random_subset, select_subset};
use crate::vocabulary::{Restricted, merge_vocabulary, restrict_and_save, write_vocabulary};

/// What a full run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub selection: SelectionSummary,
    /// Mean `total_count` per category before restriction.
    pub mean_totals: [Option<f64>; 2],
    /// Words surviving restriction per category.
    pub words: [usize; 2],
    pub vocabulary: usize,
    pub comparison: CompareSummary,
    pub results: PathBuf,
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Runs every stage for `config`.
pub fn run_pipeline(config: &ComparisonConfig) -> Result<PipelineReport> {
    fs::create_dir_all(&config.output_dir).map_err(|e| Error::io(&config.output_dir, e))?;
    ensure_parent(&config.c1.doc_terms)?;
    ensure_parent(&config.c2.doc_terms)?;

    let selection = match config.sample_size {
        Some(k) => select_random_subset(
            &config.c1.filenames,
            &config.c2.filenames,
            &config.collection,
            &config.c1.doc_terms,
            &config.c2.doc_terms,
            k,
            config.seed,
        )?,
        None => select_subset(
            &config.c1.filenames,
            &config.c2.filenames,
            &config.collection,
            &config.c1.doc_terms,
            &config.c2.doc_terms,
        )?,
    };

    let mut restricted: Vec<Restricted> = Vec::with_capacity(2);
    let mut mean_totals = [None; 2];
    for (i, category) in [Category::C1, Category::C2].into_iter().enumerate() {
        let bags = &config.category(category).doc_terms;
        let (relative, raw) = extract_frequencies_from_path(bags)?;
        let conditioned = condition(relative, raw);
        mean_totals[i] = conditioned.mean_total;
        if let Some(mean) = conditioned.mean_total {
            info!("Average total word count for dataset {}: {}", i + 1, mean);
        }

        let r = restrict_and_save(
            &conditioned.raw,
            &conditioned.relative,
            config.threshold,
            &config.raw_table_path(category),
            &config.relative_table_path(category),
        )?;
        info!("Words in dataset {}: {}", i + 1, r.terms.len());
        restricted.push(r);
    }
    let (r1, r2) = (&restricted[0], &restricted[1]);

    let vocabulary = merge_vocabulary(&r1.terms, &r2.terms);
    let vocabulary_path = config.vocabulary_path();
    write_vocabulary(&vocabulary_path, &vocabulary)?;
    info!(
        "Wrote {} unique words to {}",
        vocabulary.len(),
        vocabulary_path.display()
    );

    let raw_path_1 = config.raw_table_path(Category::C1);
    let raw_path_2 = config.raw_table_path(Category::C2);
    let side_1 = Side {
        relative: &r1.relative,
        raw: &r1.raw,
        raw_path: &raw_path_1,
    };
    let side_2 = Side {
        relative: &r2.relative,
        raw: &r2.raw,
        raw_path: &raw_path_2,
    };
    let results = config.results_path();
    ensure_parent(&results)?;
    let comparison = compare_to_path(&vocabulary_path, &side_1, &side_2, &results)?;

    Ok(PipelineReport {
        selection,
        mean_totals,
        words: [r1.terms.len(), r2.terms.len()],
        vocabulary: vocabulary.len(),
        comparison,
        results,
    })
}

/// Re-runs only the comparison against the tables and vocabulary an earlier
/// [`run_pipeline`] with the same configuration persisted. Returns the
/// results path together with the summary.
pub fn run_comparison(config: &ComparisonConfig) -> Result<(PathBuf, CompareSummary)> {
    let relative_1 = config.relative_table_path(Category::C1);
    let raw_1 = config.raw_table_path(Category::C1);
    let relative_2 = config.relative_table_path(Category::C2);
    let raw_2 = config.raw_table_path(Category::C2);
    let results = config.results_path();
    ensure_parent(&results)?;

    let summary = compare_files(
        TablePaths {
            relative: &relative_1,
            raw: &raw_1,
        },
        TablePaths {
            relative: &relative_2,
            raw: &raw_2,
        },
        &config.vocabulary_path(),
        &results,
    )?;
    Ok((results, summary))
}
