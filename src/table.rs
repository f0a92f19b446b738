use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{ReaderBuilder, Writer, WriterBuilder};

use crate::error::{Error, Result};

/// Name of the reserved column carrying the row-wise sum of a raw table.
pub const TOTAL_COUNT: &str = "total_count";

/// A value that can live in a frequency table cell.
///
/// `Default` is the zero every unset cell reads as.
pub trait CellValue: Copy + Default + PartialEq + Display {
    fn parse_cell(s: &str) -> Option<Self>;
}

impl CellValue for u64 {
    fn parse_cell(s: &str) -> Option<Self> {
        if let Ok(v) = s.parse::<u64>() {
            return Some(v);
        }
        // Tables written by dataframe tools store counts as `2.0`.
        let f = s.parse::<f64>().ok()?;
        if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
            Some(f as u64)
        } else {
            None
        }
    }
}

impl CellValue for f64 {
    fn parse_cell(s: &str) -> Option<Self> {
        s.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Term x document table with sparse storage and dense semantics.
///
/// Rows are terms in first-insertion order, columns are documents in
/// insertion order. Only set cells are stored; any `(term, document)` pair
/// that was never set reads as zero through [`FrequencyTable::value`] and
/// [`FrequencyTable::row`], so callers always see the full dense matrix
/// without paying for it in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable<T> {
    documents: Vec<String>,
    document_index: HashMap<String, usize>,
    terms: Vec<String>,
    term_index: HashMap<String, usize>,
    rows: Vec<HashMap<usize, T>>,
}

impl<T: CellValue> Default for FrequencyTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CellValue> FrequencyTable<T> {
    pub fn new() -> Self {
        FrequencyTable {
            documents: Vec::new(),
            document_index: HashMap::new(),
            terms: Vec::new(),
            term_index: HashMap::new(),
            rows: Vec::new(),
        }
    }

    /// Adds a document column and returns its index. Adding a name that is
    /// already present returns the existing column.
    pub fn add_document(&mut self, name: &str) -> usize {
        if let Some(&column) = self.document_index.get(name) {
            return column;
        }
        let column = self.documents.len();
        self.documents.push(name.to_string());
        self.document_index.insert(name.to_string(), column);
        column
    }

    /// Stores `value` at `(term, column)`, creating the term row on first use.
    pub fn set(&mut self, term: &str, column: usize, value: T) {
        let row = match self.term_index.get(term) {
            Some(&row) => row,
            None => {
                let row = self.terms.len();
                self.terms.push(term.to_string());
                self.term_index.insert(term.to_string(), row);
                self.rows.push(HashMap::new());
                row
            }
        };
        self.rows[row].insert(column, value);
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of terms (rows).
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains_document(&self, name: &str) -> bool {
        self.document_index.contains_key(name)
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.term_index.contains_key(term)
    }

    /// The stored cell, `None` when it was never set.
    pub fn cell(&self, term: &str, document: &str) -> Option<T> {
        let row = *self.term_index.get(term)?;
        let column = *self.document_index.get(document)?;
        self.rows[row].get(&column).copied()
    }

    /// The cell with unset entries read as zero.
    pub fn value(&self, term: &str, document: &str) -> T {
        self.cell(term, document).unwrap_or_default()
    }

    /// Dense row for `term`, one value per document column in column order.
    pub fn row(&self, term: &str) -> Option<Vec<T>> {
        let row = *self.term_index.get(term)?;
        Some(self.dense_row(row))
    }

    fn dense_row(&self, row: usize) -> Vec<T> {
        let mut values = vec![T::default(); self.documents.len()];
        for (&column, &value) in &self.rows[row] {
            values[column] = value;
        }
        values
    }

    /// Copy of the table restricted to the terms for which `keep` holds.
    /// Term order and the full document column set are preserved.
    pub fn retain_terms<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        let mut out = FrequencyTable {
            documents: self.documents.clone(),
            document_index: self.document_index.clone(),
            terms: Vec::new(),
            term_index: HashMap::new(),
            rows: Vec::new(),
        };
        for (row, term) in self.terms.iter().enumerate() {
            if keep(term) {
                out.term_index.insert(term.clone(), out.terms.len());
                out.terms.push(term.clone());
                out.rows.push(self.rows[row].clone());
            }
        }
        out
    }

    /// Rearranges rows so that new row `i` is old row `order[i]`.
    fn permute_rows(&mut self, order: &[usize]) {
        let mut rows = std::mem::take(&mut self.rows);
        let terms = std::mem::take(&mut self.terms);
        self.term_index.clear();
        for &old in order {
            self.term_index.insert(terms[old].clone(), self.terms.len());
            self.terms.push(terms[old].clone());
            self.rows.push(std::mem::take(&mut rows[old]));
        }
    }

    /// Writes the dense table: an unnamed leading header cell, one column
    /// per document, one line per term.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        self.write_with_trailer(path, None, |_| String::new())
    }

    fn write_with_trailer<F>(&self, path: &Path, trailer: Option<&str>, cell: F) -> Result<()>
    where
        F: Fn(usize) -> String,
    {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut wtr = WriterBuilder::new().from_writer(file);
        self.write_records(&mut wtr, trailer, cell)
            .map_err(|e| Error::csv(path, e))?;
        wtr.flush().map_err(|e| Error::io(path, e))
    }

    fn write_records<W: Write, F>(
        &self,
        wtr: &mut Writer<W>,
        trailer: Option<&str>,
        cell: F,
    ) -> csv::Result<()>
    where
        F: Fn(usize) -> String,
    {
        let mut header: Vec<&str> = Vec::with_capacity(self.documents.len() + 2);
        header.push("");
        header.extend(self.documents.iter().map(String::as_str));
        header.extend(trailer);
        wtr.write_record(&header)?;

        for (row, term) in self.terms.iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(header.len());
            record.push(term.clone());
            record.extend(self.dense_row(row).into_iter().map(|v| v.to_string()));
            if trailer.is_some() {
                record.push(cell(row));
            }
            wtr.write_record(&record)?;
        }
        Ok(())
    }

    /// Reads a table written by [`FrequencyTable::write_csv`] (or any CSV
    /// with terms as the leading column). Empty cells read as zero. A
    /// trailing `total_count` column is rejected here; raw tables go through
    /// [`CountTable::read_csv`].
    pub fn read_csv(path: &Path) -> Result<Self> {
        let (table, totals) = read_table(path)?;
        if totals.is_some() {
            return Err(Error::MalformedTable {
                path: path.to_path_buf(),
                reason: format!("unexpected `{TOTAL_COUNT}` column in a relative table"),
            });
        }
        Ok(table)
    }
}

fn read_table<T: CellValue>(path: &Path) -> Result<(FrequencyTable<T>, Option<Vec<u64>>)> {
    let malformed = |reason: String| Error::MalformedTable {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(file);
    let header = rdr.headers().map_err(|e| Error::csv(path, e))?.clone();
    if header.is_empty() {
        return Err(malformed("missing header row".to_string()));
    }

    let mut columns: Vec<&str> = header.iter().skip(1).collect();
    let has_totals = columns.last() == Some(&TOTAL_COUNT);
    if has_totals {
        columns.pop();
    }

    let mut table = FrequencyTable::new();
    for name in &columns {
        if table.document_index.contains_key(*name) {
            return Err(malformed(format!("duplicate document column `{name}`")));
        }
        table.add_document(name);
    }
    let mut totals = has_totals.then(Vec::new);

    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| Error::csv(path, e))?;
        let line = i + 2;
        let term = record
            .get(0)
            .ok_or_else(|| malformed(format!("line {line}: empty record")))?;
        if table.contains_term(term) {
            return Err(malformed(format!("line {line}: duplicate term `{term}`")));
        }

        // Register the row even when every cell is zero.
        let row = table.terms.len();
        table.terms.push(term.to_string());
        table.term_index.insert(term.to_string(), row);
        table.rows.push(HashMap::new());

        for (column, raw) in record.iter().skip(1).take(columns.len()).enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let value = T::parse_cell(raw).ok_or_else(|| {
                malformed(format!("line {line}: invalid value `{raw}` for `{term}`"))
            })?;
            if value != T::default() {
                table.rows[row].insert(column, value);
            }
        }

        if let Some(totals) = totals.as_mut() {
            let raw = record.get(columns.len() + 1).unwrap_or("").trim();
            let total = if raw.is_empty() {
                0
            } else {
                u64::parse_cell(raw).ok_or_else(|| {
                    malformed(format!("line {line}: invalid {TOTAL_COUNT} `{raw}` for `{term}`"))
                })?
            };
            totals.push(total);
        }
    }
    Ok((table, totals))
}

/// Raw count table carrying the derived `total_count` column.
#[derive(Debug, Clone, PartialEq)]
pub struct CountTable {
    table: FrequencyTable<u64>,
    totals: Vec<u64>,
}

impl CountTable {
    /// Derives `total_count` for every term and sorts rows by it,
    /// descending. The sort is stable: terms with equal totals keep the
    /// order in which they were first seen.
    pub fn from_table(table: FrequencyTable<u64>) -> Self {
        let totals: Vec<u64> = table.rows.iter().map(|r| r.values().sum()).collect();
        let mut order: Vec<usize> = (0..totals.len()).collect();
        order.sort_by(|&a, &b| totals[b].cmp(&totals[a]));

        let mut table = table;
        table.permute_rows(&order);
        let totals = order.iter().map(|&i| totals[i]).collect();
        CountTable { table, totals }
    }

    pub fn table(&self) -> &FrequencyTable<u64> {
        &self.table
    }

    pub fn terms(&self) -> &[String] {
        self.table.terms()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn total_count(&self, term: &str) -> Option<u64> {
        self.table.term_index.get(term).map(|&row| self.totals[row])
    }

    /// `(term, total_count)` pairs in row order.
    pub fn totals(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.table
            .terms
            .iter()
            .map(String::as_str)
            .zip(self.totals.iter().copied())
    }

    /// Arithmetic mean of `total_count` over all terms; `None` for an empty
    /// table.
    pub fn mean_total(&self) -> Option<f64> {
        if self.totals.is_empty() {
            return None;
        }
        let sum: f64 = self.totals.iter().map(|&t| t as f64).sum();
        Some(sum / self.totals.len() as f64)
    }

    /// Rows whose `total_count` is at least `threshold`, order preserved.
    pub fn with_min_total(&self, threshold: u64) -> Self {
        let mut totals = Vec::new();
        let table = self.table.retain_terms(|term| {
            let total = self.total_count(term).unwrap_or(0);
            if total >= threshold {
                totals.push(total);
                true
            } else {
                false
            }
        });
        CountTable { table, totals }
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        self.table
            .write_with_trailer(path, Some(TOTAL_COUNT), |row| self.totals[row].to_string())
    }

    /// Reads a persisted raw table. Row order is kept as found in the file;
    /// a missing `total_count` column is recomputed from the cells.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let (table, totals) = read_table::<u64>(path)?;
        let totals = match totals {
            Some(totals) => totals,
            None => table.rows.iter().map(|r| r.values().sum()).collect(),
        };
        Ok(CountTable { table, totals })
    }
}
