//! Word-frequency comparison of two bag-of-words corpora.
//!
//! The stages run strictly in order, each reading the files the previous
//! one wrote: [`select`] pulls both categories out of a collection,
//! [`frequency`] builds raw and relative frequency tables, [`vocabulary`]
//! restricts them to frequent words and merges the vocabularies, and
//! [`compare`] runs a Wilcoxon rank-sum test per word. [`pipeline`] chains
//! them from a [`ComparisonConfig`].

pub mod compare;
pub mod config;
pub mod error;
pub mod frequency;
pub mod pipeline;
pub mod ranksum;
pub mod select;
pub mod table;
pub mod vocabulary;

pub use compare::{
    CompareSummary, ComparisonRow, RESULTS_HEADER, Side, TablePaths, compare, compare_files,
    compare_term, compare_to_path,
};
pub use config::{Category, CategoryConfig, ComparisonConfig};
pub use error::{Error, Result};
pub use frequency::{
    ConditionedTables, DocumentRecord, RawTable, RelativeTable, condition, count_words,
    extract_frequencies, extract_frequencies_from_path, parse_record,
};
pub use pipeline::{PipelineReport, run_comparison, run_pipeline};
pub use ranksum::{RankSum, RankSumError, rank_sum};
pub use select::{
    SelectionSummary, read_filename_list, sample_filenames, select_random_subset, select_rows,
    select_subset,
};
pub use table::{CountTable, FrequencyTable, TOTAL_COUNT};
pub use vocabulary::{Restricted, merge_vocabulary, restrict, restrict_and_save, write_vocabulary};
