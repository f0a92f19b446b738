//! Per-document word frequencies from a bag-of-words file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::error::{Error, Result};
use crate::table::{CountTable, FrequencyTable};

/// Relative frequencies: count / document term total.
pub type RelativeTable = FrequencyTable<f64>;
/// Raw occurrence counts.
pub type RawTable = FrequencyTable<u64>;

/// One line of a bag-of-words file: `filename index term term ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord<'a> {
    pub filename: &'a str,
    pub index: u64,
    /// One entry per occurrence.
    pub terms: Vec<&'a str>,
}

/// Splits a bag-of-words line. Returns `Ok(None)` for blank lines and an
/// error message when the filename or numeric index is missing.
pub fn parse_record(line: &str) -> std::result::Result<Option<DocumentRecord<'_>>, String> {
    let mut tokens = line.split_whitespace();
    let Some(filename) = tokens.next() else {
        return Ok(None);
    };
    let index = tokens
        .next()
        .ok_or_else(|| format!("record for `{filename}` has no document index"))?;
    let index = index
        .parse::<u64>()
        .map_err(|_| format!("document index `{index}` of `{filename}` is not a number"))?;
    Ok(Some(DocumentRecord {
        filename,
        index,
        terms: tokens.collect(),
    }))
}

/// Counts the occurrences of each word in one document.
pub fn count_words<'a>(words: &[&'a str]) -> HashMap<&'a str, u64> {
    let mut frequency: HashMap<&str, u64> = HashMap::new();
    for word in words {
        *frequency.entry(*word).or_insert(0) += 1;
    }
    frequency
}

/// Builds the relative and raw frequency tables of a bag-of-words stream.
///
/// Counts are taken strictly per document. A term missing from a document
/// stays unset in that document's column. A document without terms still
/// gets a column, which reads as all zeros. `source` is only used for error
/// reporting.
pub fn extract_frequencies<R: BufRead>(
    reader: R,
    source: &Path,
) -> Result<(RelativeTable, RawTable)> {
    let mut relative = RelativeTable::new();
    let mut raw = RawTable::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io(source, e))?;
        let record = parse_record(&line).map_err(|reason| Error::MalformedRecord {
            path: source.to_path_buf(),
            line: i + 1,
            reason,
        })?;
        let Some(record) = record else {
            continue;
        };

        if raw.contains_document(record.filename) {
            return Err(Error::DuplicateDocument {
                path: source.to_path_buf(),
                filename: record.filename.to_string(),
            });
        }
        let column = raw.add_document(record.filename);
        relative.add_document(record.filename);

        let total = record.terms.len() as f64;
        // Keep first-occurrence order so term rows come out deterministic.
        let mut counts = count_words(&record.terms);
        for term in &record.terms {
            if let Some(count) = counts.remove(term) {
                raw.set(term, column, count);
                relative.set(term, column, count as f64 / total);
            }
        }
    }
    Ok((relative, raw))
}

/// [`extract_frequencies`] over a file.
pub fn extract_frequencies_from_path(path: &Path) -> Result<(RelativeTable, RawTable)> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let (relative, raw) = extract_frequencies(BufReader::new(file), path)?;
    info!(
        "Extracted {} terms across {} documents from {}",
        raw.len(),
        raw.documents().len(),
        path.display()
    );
    Ok((relative, raw))
}

/// Output of [`condition`].
#[derive(Debug, Clone)]
pub struct ConditionedTables {
    pub relative: RelativeTable,
    /// Raw counts with `total_count`, sorted by it descending.
    pub raw: CountTable,
    /// Mean `total_count` across terms, diagnostic only.
    pub mean_total: Option<f64>,
}

/// Zero-fills both tables, derives `total_count`, sorts the raw table by it
/// (descending, ties in first-seen order) and reports the mean total.
///
/// Zero-filling is implicit: unset cells of [`FrequencyTable`] already read
/// as zero everywhere downstream.
pub fn condition(relative: RelativeTable, raw: RawTable) -> ConditionedTables {
    let raw = CountTable::from_table(raw);
    let mean_total = raw.mean_total();
    ConditionedTables {
        relative,
        raw,
        mean_total,
    }
}
