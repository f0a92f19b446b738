//! Corpus selection: pull the bag-of-words rows of two categories out of a
//! combined collection file.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};

/// Where the rows of one category go.
pub struct Target<'a, W> {
    /// Filenames whose rows belong to this category.
    pub wanted: &'a HashSet<String>,
    pub out: W,
    /// Path reported when writing to `out` fails.
    pub path: &'a Path,
}

/// Row counts from one pass over the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionSummary {
    /// Lines read from the collection.
    pub scanned: usize,
    /// Lines written for category 1 and category 2.
    pub selected: [usize; 2],
}

/// Reads a filename list: one name per line, surrounding whitespace
/// trimmed, blank lines skipped.
pub fn read_filename_list(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut names = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::io(path, e))?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Draws `k` distinct positions of `names` without replacement.
///
/// Fails when `k` exceeds the list length; `path` names the list in the
/// error.
pub fn sample_filenames<R: Rng + ?Sized>(
    names: &[String],
    k: usize,
    path: &Path,
    rng: &mut R,
) -> Result<Vec<String>> {
    if k > names.len() {
        return Err(Error::SampleTooLarge {
            path: path.to_path_buf(),
            requested: k,
            available: names.len(),
        });
    }
    Ok(names.choose_multiple(rng, k).cloned().collect())
}

/// Streams `collection` and copies every line whose leading filename token
/// is wanted by a target into that target.
///
/// Membership is exact string equality. A filename wanted by both targets
/// is written to both: no mutual exclusion is enforced between the
/// categories. Lines are re-emitted trimmed of trailing whitespace and
/// terminated with a newline.
pub fn select_rows<R: BufRead, W: Write>(
    collection: R,
    collection_path: &Path,
    targets: &mut [Target<'_, W>; 2],
) -> Result<SelectionSummary> {
    let mut summary = SelectionSummary::default();
    for line in collection.lines() {
        let line = line.map_err(|e| Error::io(collection_path, e))?;
        summary.scanned += 1;
        let Some(filename) = line.split_whitespace().next() else {
            continue;
        };
        for (i, target) in targets.iter_mut().enumerate() {
            if target.wanted.contains(filename) {
                writeln!(target.out, "{}", line.trim_end())
                    .map_err(|e| Error::io(target.path, e))?;
                summary.selected[i] += 1;
            }
        }
    }
    for target in targets.iter_mut() {
        target.out.flush().map_err(|e| Error::io(target.path, e))?;
    }
    Ok(summary)
}

/// Selects the rows of both filename lists from `collection` into
/// `out_c1` and `out_c2`.
pub fn select_subset(
    filenames_c1: &Path,
    filenames_c2: &Path,
    collection: &Path,
    out_c1: &Path,
    out_c2: &Path,
) -> Result<SelectionSummary> {
    let c1 = read_filename_list(filenames_c1)?;
    let c2 = read_filename_list(filenames_c2)?;
    write_selection(c1, c2, collection, out_c1, out_c2)
}

/// Like [`select_subset`], but each list is first reduced to a random
/// sample of exactly `k` filenames. With `seed` set the draw is
/// reproducible. An oversized `k` fails before any output file exists.
pub fn select_random_subset(
    filenames_c1: &Path,
    filenames_c2: &Path,
    collection: &Path,
    out_c1: &Path,
    out_c2: &Path,
    k: usize,
    seed: Option<u64>,
) -> Result<SelectionSummary> {
    let c1 = read_filename_list(filenames_c1)?;
    let c2 = read_filename_list(filenames_c2)?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let c1 = sample_filenames(&c1, k, filenames_c1, &mut rng)?;
    let c2 = sample_filenames(&c2, k, filenames_c2, &mut rng)?;
    info!("Sampled {} filenames per category", k);

    write_selection(c1, c2, collection, out_c1, out_c2)
}

fn write_selection(
    c1: Vec<String>,
    c2: Vec<String>,
    collection: &Path,
    out_c1: &Path,
    out_c2: &Path,
) -> Result<SelectionSummary> {
    let wanted_c1: HashSet<String> = c1.into_iter().collect();
    let wanted_c2: HashSet<String> = c2.into_iter().collect();

    // Open the collection first so a missing input leaves no outputs behind.
    let reader = File::open(collection)
        .map(BufReader::new)
        .map_err(|e| Error::io(collection, e))?;
    let w1 = File::create(out_c1).map_err(|e| Error::io(out_c1, e))?;
    let w2 = File::create(out_c2).map_err(|e| Error::io(out_c2, e))?;

    let mut targets = [
        Target {
            wanted: &wanted_c1,
            out: BufWriter::new(w1),
            path: out_c1,
        },
        Target {
            wanted: &wanted_c2,
            out: BufWriter::new(w2),
            path: out_c2,
        },
    ];
    let summary = select_rows(reader, collection, &mut targets)?;
    info!(
        "Selected {} rows into {} and {} rows into {} ({} scanned)",
        summary.selected[0],
        out_c1.display(),
        summary.selected[1],
        out_c2.display(),
        summary.scanned
    );
    Ok(summary)
}
