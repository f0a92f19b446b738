//! Comparison configuration: which collection, which two categories, and
//! where every artefact of a run is written.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use serde::Deserialize;

use crate::error::{Error, Result};

/// One of the two categories being compared.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    /// Short label used in output file names, e.g. `hum`.
    pub name: String,
    /// Filename list selecting this category's documents.
    pub filenames: PathBuf,
    /// Bag-of-words file the selector writes for this category.
    pub doc_terms: PathBuf,
}

/// Everything a run needs, loaded from a JSON file.
///
/// ```json
/// {
///   "collection": "input/hum-sci/hum-sci-doc-terms.txt",
///   "c1": { "name": "hum", "filenames": "input/hum-sci/hum-files.txt",
///           "doc_terms": "output/hum-doc-terms.txt" },
///   "c2": { "name": "sci", "filenames": "input/hum-sci/sci-files.txt",
///           "doc_terms": "output/sci-doc-terms.txt" },
///   "output_dir": "output",
///   "threshold": 5,
///   "sample_size": 500
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonConfig {
    /// Combined bag-of-words file both categories are selected from.
    pub collection: PathBuf,
    pub c1: CategoryConfig,
    pub c2: CategoryConfig,
    /// Directory for tables, vocabulary list and results.
    pub output_dir: PathBuf,
    /// Minimum `total_count` a word needs to be compared; unset compares
    /// every word.
    #[serde(default)]
    pub threshold: Option<u64>,
    /// Random sample size per category; unset selects every listed file.
    #[serde(default)]
    pub sample_size: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Results file; defaults to a timestamped name in `output_dir`.
    #[serde(default)]
    pub results: Option<PathBuf>,
}

/// Which category an output path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    C1,
    C2,
}

impl ComparisonConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn category(&self, category: Category) -> &CategoryConfig {
        match category {
            Category::C1 => &self.c1,
            Category::C2 => &self.c2,
        }
    }

    /// `min{threshold}`, or `unrestricted` without a threshold.
    fn threshold_tag(&self) -> String {
        match self.threshold {
            Some(t) => format!("min{t}"),
            None => "unrestricted".to_string(),
        }
    }

    /// `{output_dir}/{name}-{tag}-df-relative.csv`
    pub fn relative_table_path(&self, category: Category) -> PathBuf {
        self.output_dir.join(format!(
            "{}-{}-df-relative.csv",
            self.category(category).name,
            self.threshold_tag()
        ))
    }

    /// `{output_dir}/{name}-{tag}-df-raw.csv`
    pub fn raw_table_path(&self, category: Category) -> PathBuf {
        self.output_dir.join(format!(
            "{}-{}-df-raw.csv",
            self.category(category).name,
            self.threshold_tag()
        ))
    }

    /// `{output_dir}/{c1}-{c2}-{tag}-vocablist.txt`
    pub fn vocabulary_path(&self) -> PathBuf {
        self.output_dir.join(format!(
            "{}-{}-{}-vocablist.txt",
            self.c1.name,
            self.c2.name,
            self.threshold_tag()
        ))
    }

    /// The configured results path, or a name stamped with the local time.
    pub fn results_path(&self) -> PathBuf {
        match &self.results {
            Some(path) => path.clone(),
            None => {
                let local: DateTime<Local> = Local::now();
                let stamp = local.format("%Y_%m_%d_%H_%M_%S").to_string();
                self.output_dir.join(format!(
                    "{}_{}-{}-wilcoxon-results.csv",
                    stamp, self.c1.name, self.c2.name
                ))
            }
        }
    }
}
