//! Per-word rank-sum comparison of two categories.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use csv::{Writer, WriterBuilder};
use log::{debug, info};

use crate::error::{Error, Result};
use crate::frequency::RelativeTable;
use crate::ranksum::{RankSum, rank_sum};
use crate::table::CountTable;

/// Header of the results file.
pub const RESULTS_HEADER: [&str; 7] = [
    "word",
    "c1 total count",
    "c2 total count",
    "difference c1 - c2",
    "% change",
    "wilcoxon statistic",
    "wilcoxon p-value",
];

/// Written for `% change` when category 2 never uses the word.
pub const UNDEFINED_CHANGE: &str = "NaN";
/// Written for statistic and p-value when the test cannot be computed.
pub const TEST_FAILED: &str = "-1";

/// The restricted tables of one category.
#[derive(Debug, Clone, Copy)]
pub struct Side<'a> {
    pub relative: &'a RelativeTable,
    pub raw: &'a CountTable,
    /// Where `raw` came from, for error reporting.
    pub raw_path: &'a Path,
}

impl Side<'_> {
    /// Relative-frequency vector and total count of `term`. An unknown term
    /// gets a zero vector as wide as the table and a count of zero.
    fn lookup(&self, term: &str) -> Result<(Vec<f64>, u64)> {
        match self.relative.row(term) {
            Some(values) => {
                let total = self.raw.total_count(term).ok_or_else(|| Error::MissingTotal {
                    path: self.raw_path.to_path_buf(),
                    term: term.to_string(),
                })?;
                Ok((values, total))
            }
            None => Ok((vec![0.0; self.relative.documents().len()], 0)),
        }
    }
}

/// One line of the results file.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub term: String,
    pub c1_total: u64,
    pub c2_total: u64,
    pub difference: i64,
    /// `None` when `c2_total` is zero.
    pub percent_change: Option<f64>,
    /// `None` when the rank-sum test could not be computed.
    pub test: Option<RankSum>,
}

impl ComparisonRow {
    pub fn to_record(&self) -> [String; 7] {
        let (statistic, p_value) = match self.test {
            Some(t) => (t.statistic.to_string(), t.p_value.to_string()),
            None => (TEST_FAILED.to_string(), TEST_FAILED.to_string()),
        };
        [
            self.term.clone(),
            self.c1_total.to_string(),
            self.c2_total.to_string(),
            self.difference.to_string(),
            self.percent_change
                .map_or_else(|| UNDEFINED_CHANGE.to_string(), |c| c.to_string()),
            statistic,
            p_value,
        ]
    }
}

/// Compares one word across both categories. A test failure is recorded
/// as `test: None`, never returned as an error.
pub fn compare_term(term: &str, c1: &Side<'_>, c2: &Side<'_>) -> Result<ComparisonRow> {
    let (x, c1_total) = c1.lookup(term)?;
    let (y, c2_total) = c2.lookup(term)?;

    let test = match rank_sum(&x, &y) {
        Ok(test) => Some(test),
        Err(e) => {
            debug!("rank-sum test skipped for `{}`: {}", term, e);
            None
        }
    };

    let difference = c1_total as i64 - c2_total as i64;
    let percent_change = (c2_total != 0).then(|| difference as f64 / c2_total as f64 * 100.0);

    Ok(ComparisonRow {
        term: term.to_string(),
        c1_total,
        c2_total,
        difference,
        percent_change,
        test,
    })
}

/// Counts from one comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareSummary {
    pub words: usize,
    /// Rows written with the `-1` test sentinel.
    pub failed_tests: usize,
}

/// Streams `vocabulary` (one word per line, blank lines skipped) and
/// writes a results row per word, in input order, as soon as it is
/// computed.
pub fn compare<R: BufRead, W: Write>(
    vocabulary: R,
    vocabulary_path: &Path,
    c1: &Side<'_>,
    c2: &Side<'_>,
    out: &mut Writer<W>,
    out_path: &Path,
) -> Result<CompareSummary> {
    out.write_record(RESULTS_HEADER)
        .map_err(|e| Error::csv(out_path, e))?;

    let mut summary = CompareSummary::default();
    for line in vocabulary.lines() {
        let line = line.map_err(|e| Error::io(vocabulary_path, e))?;
        let term = line.trim();
        if term.is_empty() {
            continue;
        }
        let row = compare_term(term, c1, c2)?;
        out.write_record(row.to_record())
            .map_err(|e| Error::csv(out_path, e))?;
        summary.words += 1;
        if row.test.is_none() {
            summary.failed_tests += 1;
        }
    }
    out.flush().map_err(|e| Error::io(out_path, e))?;
    Ok(summary)
}

/// Paths of the persisted artefacts of one category.
#[derive(Debug, Clone, Copy)]
pub struct TablePaths<'a> {
    pub relative: &'a Path,
    pub raw: &'a Path,
}

/// Runs the comparison from files written by an earlier run: both
/// categories' relative and raw tables plus the vocabulary list.
pub fn compare_files(
    c1: TablePaths<'_>,
    c2: TablePaths<'_>,
    vocabulary: &Path,
    results: &Path,
) -> Result<CompareSummary> {
    let relative_1 = RelativeTable::read_csv(c1.relative)?;
    let raw_1 = CountTable::read_csv(c1.raw)?;
    let relative_2 = RelativeTable::read_csv(c2.relative)?;
    let raw_2 = CountTable::read_csv(c2.raw)?;

    let side_1 = Side {
        relative: &relative_1,
        raw: &raw_1,
        raw_path: c1.raw,
    };
    let side_2 = Side {
        relative: &relative_2,
        raw: &raw_2,
        raw_path: c2.raw,
    };
    compare_to_path(vocabulary, &side_1, &side_2, results)
}

/// [`compare`] reading the vocabulary from and writing the results to files.
pub fn compare_to_path(
    vocabulary: &Path,
    c1: &Side<'_>,
    c2: &Side<'_>,
    results: &Path,
) -> Result<CompareSummary> {
    let reader = File::open(vocabulary)
        .map(BufReader::new)
        .map_err(|e| Error::io(vocabulary, e))?;
    let file = File::create(results).map_err(|e| Error::io(results, e))?;
    let mut wtr = WriterBuilder::new().from_writer(file);
    let summary = compare(reader, vocabulary, c1, c2, &mut wtr, results)?;
    info!(
        "Compared {} words ({} without a test result), results in {}",
        summary.words,
        summary.failed_tests,
        results.display()
    );
    Ok(summary)
}
