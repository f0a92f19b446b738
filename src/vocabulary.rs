//! Threshold-based vocabulary restriction and the merged vocabulary list.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::error::{Error, Result};
use crate::frequency::RelativeTable;
use crate::table::CountTable;

/// One category's tables after restriction.
#[derive(Debug, Clone)]
pub struct Restricted {
    pub raw: CountTable,
    /// Relative table projected onto the surviving terms.
    pub relative: RelativeTable,
    /// Surviving terms, in raw-table order.
    pub terms: Vec<String>,
}

/// Keeps the terms whose `total_count` is at least `threshold` and projects
/// the relative table onto them. `None` keeps the raw table as is.
///
/// The relative table is cut down as well even though its values do not
/// depend on the threshold: the comparator must only test terms that made
/// it through.
pub fn restrict(raw: &CountTable, relative: &RelativeTable, threshold: Option<u64>) -> Restricted {
    let raw = match threshold {
        Some(threshold) => raw.with_min_total(threshold),
        None => raw.clone(),
    };
    let relative = relative.retain_terms(|term| raw.table().contains_term(term));
    let terms = raw.terms().to_vec();
    Restricted {
        raw,
        relative,
        terms,
    }
}

/// [`restrict`], then persist the restricted raw table and the projected
/// relative table.
pub fn restrict_and_save(
    raw: &CountTable,
    relative: &RelativeTable,
    threshold: Option<u64>,
    raw_path: &Path,
    relative_path: &Path,
) -> Result<Restricted> {
    let restricted = restrict(raw, relative, threshold);
    restricted.relative.write_csv(relative_path)?;
    restricted.raw.write_csv(raw_path)?;
    info!(
        "Kept {} of {} words; wrote {} and {}",
        restricted.terms.len(),
        raw.len(),
        raw_path.display(),
        relative_path.display()
    );
    Ok(restricted)
}

/// Union of both term lists without duplicates. Terms of `terms_1` come
/// first, then the terms only `terms_2` has; callers should treat the
/// result as a set.
pub fn merge_vocabulary(terms_1: &[String], terms_2: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(terms_1.len() + terms_2.len());
    let mut merged = Vec::new();
    for term in terms_1.iter().chain(terms_2) {
        if seen.insert(term.as_str()) {
            merged.push(term.clone());
        }
    }
    merged
}

/// Writes one term per line.
pub fn write_vocabulary(path: &Path, terms: &[String]) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    for term in terms {
        writeln!(out, "{term}").map_err(|e| Error::io(path, e))?;
    }
    out.flush().map_err(|e| Error::io(path, e))
}
