//! Integration tests for `wordfreq_compare`.
//
// This suite verifies:
// - Library behavior (selection, sampling, extraction, restriction, vocabulary, comparison)
// - Table persistence and the compare-only rerun against saved tables
// - CLI behavior for the run, compare and select commands
//
// Notes:
// - CLI tests run the binary with a per-process working directory (no global CWD change).
// - Tests that change global CWD (relative configuration paths) are marked #[serial].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use predicates::prelude::*;
use regex::Regex;
use serde_json::json;
use serial_test::serial;
use tempfile::tempdir;

use wordfreq_compare::{
    Category, ComparisonConfig, CountTable, Error, RESULTS_HEADER, RelativeTable,
    TOTAL_COUNT, read_filename_list, run_comparison, run_pipeline, select_random_subset,
    select_subset,
};

// --------------------- helpers ---------------------

const COLLECTION: &str = "\
docA 0 cat dog cat
docB 1 dog dog fish
docC 2 cat cat cat bird
docD 3 fish fish dog
docE 4 unlisted words
";

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// Read file to string.
fn read_to_string<P: AsRef<Path>>(p: P) -> String {
    fs::read_to_string(p).unwrap()
}

/// Collection plus both filename lists, returned as a config JSON value
/// rooted at `dir`.
fn setup_corpus(dir: &assert_fs::TempDir) -> serde_json::Value {
    let collection = write_file(dir, "all-doc-terms.txt", COLLECTION);
    let c1 = write_file(dir, "hum-files.txt", "docA\ndocC\n");
    let c2 = write_file(dir, "sci-files.txt", "docB\ndocD\n");
    let out = dir.path().join("out");
    json!({
        "collection": collection,
        "c1": {"name": "hum", "filenames": c1, "doc_terms": out.join("hum-doc-terms.txt")},
        "c2": {"name": "sci", "filenames": c2, "doc_terms": out.join("sci-doc-terms.txt")},
        "output_dir": out,
        "threshold": 2
    })
}

fn config_from(value: serde_json::Value) -> ComparisonConfig {
    serde_json::from_value(value).unwrap()
}

/// Parse the results CSV into rows, checking the header.
fn results_rows(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, RESULTS_HEADER);
    rdr.records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

/// Run CLI successfully with a specific working directory.
fn run_cli_ok_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("wordfreq_compare").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().success()
}

/// Run CLI expecting failure with a specific working directory.
fn run_cli_fail_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("wordfreq_compare").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().failure()
}

// --------------------- library tests ---------------------

#[test]
fn lib_select_subset_scenario() {
    let td = assert_fs::TempDir::new().unwrap();
    let collection = write_file(&td, "all.txt", "docA 0 cat dog cat\ndocB 1 dog dog fish\n");
    let l1 = write_file(&td, "c1.txt", "docA\n");
    let l2 = write_file(&td, "c2.txt", "  docB  \n\n");
    let o1 = td.path().join("c1-bags.txt");
    let o2 = td.path().join("c2-bags.txt");

    let summary = select_subset(&l1, &l2, &collection, &o1, &o2).unwrap();
    assert_eq!(summary.selected, [1, 1]);
    assert_eq!(read_to_string(&o1), "docA 0 cat dog cat\n");
    assert_eq!(read_to_string(&o2), "docB 1 dog dog fish\n");
}

#[test]
fn lib_filename_list_trims_and_skips_blanks() {
    let td = assert_fs::TempDir::new().unwrap();
    let list = write_file(&td, "list.txt", "a\n  b \n\n\tc\n");
    assert_eq!(read_filename_list(&list).unwrap(), ["a", "b", "c"]);
}

#[test]
fn lib_random_sample_too_large_creates_no_outputs() {
    let td = assert_fs::TempDir::new().unwrap();
    let collection = write_file(&td, "all.txt", COLLECTION);
    let l1 = write_file(&td, "c1.txt", "docA\ndocC\n");
    let l2 = write_file(&td, "c2.txt", "docB\ndocD\n");
    let o1 = td.path().join("o1.txt");
    let o2 = td.path().join("o2.txt");

    let err = select_random_subset(&l1, &l2, &collection, &o1, &o2, 3, Some(1)).unwrap_err();
    assert!(matches!(
        err,
        Error::SampleTooLarge {
            requested: 3,
            available: 2,
            ..
        }
    ));
    assert!(!o1.exists());
    assert!(!o2.exists());
}

#[test]
fn lib_random_sample_is_reproducible_with_seed() {
    let td = assert_fs::TempDir::new().unwrap();
    let names: Vec<String> = (0..30).map(|i| format!("doc{i}")).collect();
    let collection: String = names.iter().enumerate().map(|(i, n)| format!("{n} {i} w\n")).collect();
    let collection = write_file(&td, "all.txt", &collection);
    let list = write_file(&td, "list.txt", &names.join("\n"));

    let run = |tag: &str| {
        let o1 = td.path().join(format!("{tag}-1.txt"));
        let o2 = td.path().join(format!("{tag}-2.txt"));
        let summary =
            select_random_subset(&list, &list, &collection, &o1, &o2, 4, Some(42)).unwrap();
        assert_eq!(summary.selected, [4, 4]);
        (read_to_string(o1), read_to_string(o2))
    };
    assert_eq!(run("first"), run("second"));

    let (picked, _) = run("third");
    let lines: HashSet<&str> = picked.lines().collect();
    assert_eq!(lines.len(), 4, "sample must not repeat a document");
}

#[test]
fn lib_missing_collection_fails_without_outputs() {
    let td = assert_fs::TempDir::new().unwrap();
    let l1 = write_file(&td, "c1.txt", "docA\n");
    let o1 = td.path().join("o1.txt");
    let o2 = td.path().join("o2.txt");
    let missing = td.path().join("nope.txt");

    let err = select_subset(&l1, &l1, &missing, &o1, &o2).unwrap_err();
    match err {
        Error::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!o1.exists());
}

#[test]
fn lib_pipeline_end_to_end() {
    let td = assert_fs::TempDir::new().unwrap();
    let mut value = setup_corpus(&td);
    value["results"] = json!(td.path().join("out").join("results.csv"));
    let config = config_from(value);

    let report = run_pipeline(&config).unwrap();
    assert_eq!(report.selection.selected, [2, 2]);
    assert_eq!(report.words, [1, 2]);
    assert_eq!(report.vocabulary, 3);
    assert_eq!(report.comparison.words, 3);
    assert_eq!(report.mean_totals[0], Some(7.0 / 3.0));
    assert_eq!(report.mean_totals[1], Some(3.0));

    // Restricted tables persisted under the templated names.
    let raw_1 = CountTable::read_csv(&config.raw_table_path(Category::C1)).unwrap();
    assert_eq!(raw_1.terms(), ["cat"]);
    assert_eq!(raw_1.total_count("cat"), Some(5));
    let raw_2 = CountTable::read_csv(&config.raw_table_path(Category::C2)).unwrap();
    assert_eq!(raw_2.terms(), ["dog", "fish"]);

    let raw_text = read_to_string(config.raw_table_path(Category::C1));
    assert_eq!(
        raw_text.lines().next().unwrap(),
        format!(",docA,docC,{TOTAL_COUNT}")
    );

    let relative_1 = RelativeTable::read_csv(&config.relative_table_path(Category::C1)).unwrap();
    assert_eq!(relative_1.terms(), ["cat"]);
    assert!((relative_1.value("cat", "docA") - 2.0 / 3.0).abs() < 1e-12);
    assert!((relative_1.value("cat", "docC") - 0.75).abs() < 1e-12);

    // Vocabulary: a set, order not asserted.
    let vocab = read_to_string(config.vocabulary_path());
    let vocab: HashSet<&str> = vocab.lines().collect();
    assert_eq!(vocab, HashSet::from(["cat", "dog", "fish"]));

    let rows = results_rows(&report.results);
    assert_eq!(rows.len(), 3);
    let cat = rows.iter().find(|r| r[0] == "cat").unwrap();
    assert_eq!(&cat[1..5], ["5", "0", "5", "NaN"]);
    assert_ne!(cat[5], "-1");
    let p: f64 = cat[6].parse().unwrap();
    assert!(p > 0.0 && p < 1.0);

    let dog = rows.iter().find(|r| r[0] == "dog").unwrap();
    assert_eq!(&dog[1..5], ["0", "3", "-3", "-100"]);
}

#[test]
fn lib_compare_rerun_matches_pipeline_results() {
    let td = assert_fs::TempDir::new().unwrap();
    let mut value = setup_corpus(&td);
    value["results"] = json!(td.path().join("first.csv"));
    let mut config = config_from(value);
    let report = run_pipeline(&config).unwrap();

    config.results = Some(td.path().join("second.csv"));
    let (results, summary) = run_comparison(&config).unwrap();
    assert_eq!(summary.words, report.comparison.words);
    assert_eq!(read_to_string(&report.results), read_to_string(results));
}

#[test]
fn lib_reads_tables_written_by_dataframe_tools() {
    let td = assert_fs::TempDir::new().unwrap();
    let raw = write_file(
        &td,
        "raw.csv",
        ",d1,d2,total_count\nword,2.0,,2.0\nother,1.0,3.0,4.0\n",
    );
    let relative = write_file(&td, "rel.csv", ",d1,d2\nword,0.5,\nother,0.25,1.0\n");

    let raw = CountTable::read_csv(&raw).unwrap();
    assert_eq!(raw.total_count("word"), Some(2));
    assert_eq!(raw.table().row("word"), Some(vec![2, 0]));
    // File order is kept as found.
    assert_eq!(raw.terms(), ["word", "other"]);

    let relative = RelativeTable::read_csv(&relative).unwrap();
    assert_eq!(relative.row("word"), Some(vec![0.5, 0.0]));
}

#[test]
fn lib_relative_table_with_totals_is_rejected() {
    let td = assert_fs::TempDir::new().unwrap();
    let raw = write_file(&td, "raw.csv", ",d1,total_count\nword,2,2\n");
    let err = RelativeTable::read_csv(&raw).unwrap_err();
    assert!(matches!(err, Error::MalformedTable { .. }));
}

#[test]
fn lib_malformed_bag_file_aborts_run() {
    let td = assert_fs::TempDir::new().unwrap();
    let mut value = setup_corpus(&td);
    let collection = write_file(&td, "all-doc-terms.txt", "docA 0 cat\ndocB\n");
    value["collection"] = json!(collection);
    let config = config_from(value);

    let err = run_pipeline(&config).unwrap_err();
    match err {
        Error::MalformedRecord { path, line, .. } => {
            assert_eq!(path, config.c2.doc_terms);
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
#[serial]
fn lib_relative_config_paths_resolve_against_working_dir() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "all.txt", COLLECTION);
    write_file(&td, "c1.txt", "docA\ndocC\n");
    write_file(&td, "c2.txt", "docB\ndocD\n");
    let config = config_from(json!({
        "collection": "all.txt",
        "c1": {"name": "a", "filenames": "c1.txt", "doc_terms": "bags/a.txt"},
        "c2": {"name": "b", "filenames": "c2.txt", "doc_terms": "bags/b.txt"},
        "output_dir": "tables",
        "results": "results.csv"
    }));

    std::env::set_current_dir(td.path()).unwrap();
    let report = run_pipeline(&config).unwrap();
    assert_eq!(report.results, Path::new("results.csv"));
    assert!(td.path().join("bags/a.txt").exists());
    assert!(td.path().join("tables/a-unrestricted-df-raw.csv").exists());
    assert!(td.path().join("tables/a-b-unrestricted-vocablist.txt").exists());
    // Without a threshold every word of both categories is compared.
    assert_eq!(results_rows(&td.path().join("results.csv")).len(), 4);
}

// --------------------- CLI tests ---------------------

#[test]
fn cli_missing_config_fails() {
    let td = tempdir().unwrap();
    let bad = td.path().join("does_not_exist.json");
    run_cli_fail_in(td.path(), &["run", bad.to_string_lossy().as_ref()])
        .stderr(predicate::str::contains("does_not_exist.json"));
}

#[test]
fn cli_select_writes_both_outputs() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "all.txt", COLLECTION);
    write_file(&td, "c1.txt", "docA\ndocE\n");
    write_file(&td, "c2.txt", "docB\n");

    run_cli_ok_in(
        td.path(),
        &["select", "all.txt", "c1.txt", "c2.txt", "o1.txt", "o2.txt"],
    )
    .stdout(predicate::str::contains("Selected 2 rows for category 1"));

    td.child("o1.txt")
        .assert("docA 0 cat dog cat\ndocE 4 unlisted words\n");
    td.child("o2.txt").assert("docB 1 dog dog fish\n");
}

#[test]
fn cli_select_sample_too_large_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "all.txt", COLLECTION);
    write_file(&td, "c1.txt", "docA\ndocC\n");
    write_file(&td, "c2.txt", "docB\ndocD\n");

    run_cli_fail_in(
        td.path(),
        &[
            "select", "all.txt", "c1.txt", "c2.txt", "o1.txt", "o2.txt", "--sample", "3",
        ],
    )
    .stderr(predicate::str::contains("cannot sample 3"));
    td.child("o1.txt").assert(predicate::path::missing());
    td.child("o2.txt").assert(predicate::path::missing());
}

#[test]
fn cli_run_then_compare() {
    let td = assert_fs::TempDir::new().unwrap();
    let value = setup_corpus(&td);
    let config = write_file(&td, "hum-sci.json", &value.to_string());

    run_cli_ok_in(td.path(), &["run", config.to_str().unwrap(), "--threshold", "1"])
        .stdout(predicate::str::contains("results written to"));

    // Default results name carries a timestamp.
    let re = Regex::new(r"^\d{4}_\d{2}_\d{2}_\d{2}_\d{2}_\d{2}_hum-sci-wilcoxon-results\.csv$")
        .unwrap();
    let out = td.path().join("out");
    let results: Vec<PathBuf> = fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| re.is_match(e.file_name().to_string_lossy().as_ref()))
        .map(|e| e.path())
        .collect();
    assert_eq!(results.len(), 1, "expected one timestamped results file");
    td.child("out/hum-sci-min1-vocablist.txt")
        .assert(predicate::path::exists());

    // --threshold 1 keeps every word: cat dog bird fish
    assert_eq!(results_rows(&results[0]).len(), 4);

    let rerun = td.path().join("rerun.csv");
    run_cli_ok_in(
        td.path(),
        &[
            "compare",
            config.to_str().unwrap(),
            "--threshold",
            "1",
            "--results",
            rerun.to_str().unwrap(),
        ],
    );
    assert_eq!(read_to_string(&results[0]), read_to_string(&rerun));
}

#[test]
fn cli_compare_without_saved_tables_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    let value = setup_corpus(&td);
    let config = write_file(&td, "cfg.json", &value.to_string());
    run_cli_fail_in(td.path(), &["compare", config.to_str().unwrap()])
        .stderr(predicate::str::contains("hum-min2-df-relative.csv"));
}
