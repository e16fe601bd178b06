//! Historical per-DUT test results
//!
//! The on-disk format is a semicolon-separated table with a header row.
//! Column 0 holds the condition label, columns 1..=7 carry metadata the
//! environment never reads, and every column from 8 onwards is one test
//! result in test order.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::path::{Path, PathBuf};
use thiserror::Error;

use ictest_rl_core::RLError;

use crate::condition::Condition;

/// Field separator of the table file
pub const DELIMITER: char = ';';
/// Column holding the condition label
pub const LABEL_COLUMN: usize = 0;
/// First column holding a test result
pub const FIRST_TEST_COLUMN: usize = 8;

/// Errors raised while building a [`TestTable`]
#[derive(Error, Debug)]
pub enum TableError {
    /// The table file could not be read
    #[error("failed to read test table {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// No header row
    #[error("test table has no header row")]
    MissingHeader,

    /// Header present but no DUT rows
    #[error("test table has no DUT rows")]
    Empty,

    /// Not a single test-result column
    #[error("test table needs at least {required} columns, found {found}")]
    TooFewColumns {
        /// Columns present
        found: usize,
        /// Columns required
        required: usize,
    },

    /// A row whose width differs from the header
    #[error("line {line}: expected {expected} columns, found {found}")]
    RaggedRow {
        /// 1-based line number
        line: usize,
        /// Header width
        expected: usize,
        /// Row width
        found: usize,
    },

    /// A label or result cell that is not a number
    #[error("line {line}, column {column}: cannot parse {value:?} as a number")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// 0-based column index
        column: usize,
        /// Raw cell text
        value: String,
    },

    /// Labels and results disagree on the number of DUTs
    #[error("{labels} labels for {rows} rows of test results")]
    LabelCountMismatch {
        /// Number of labels
        labels: usize,
        /// Number of result rows
        rows: usize,
    },

    /// Array construction failed
    #[error("invalid table shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl From<TableError> for RLError {
    fn from(err: TableError) -> Self {
        RLError::Other(err.into())
    }
}

/// Immutable table of labels and test results, one row per DUT
#[derive(Debug, Clone, PartialEq)]
pub struct TestTable {
    labels: Array1<f64>,
    results: Array2<f64>,
}

impl TestTable {
    /// Build a table from labels and a `duts x tests` result matrix
    pub fn new(labels: Array1<f64>, results: Array2<f64>) -> Result<Self, TableError> {
        let (rows, tests) = results.dim();
        if rows == 0 {
            return Err(TableError::Empty);
        }
        if tests == 0 {
            return Err(TableError::TooFewColumns {
                found: FIRST_TEST_COLUMN,
                required: FIRST_TEST_COLUMN + 1,
            });
        }
        if labels.len() != rows {
            return Err(TableError::LabelCountMismatch {
                labels: labels.len(),
                rows,
            });
        }
        Ok(Self { labels, results })
    }

    /// Parse the semicolon-separated text format
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(TableError::MissingHeader)?;
        let width = header.split(DELIMITER).count();
        if width <= FIRST_TEST_COLUMN {
            return Err(TableError::TooFewColumns {
                found: width,
                required: FIRST_TEST_COLUMN + 1,
            });
        }

        let tests = width - FIRST_TEST_COLUMN;
        let mut labels = Vec::new();
        let mut results = Vec::new();

        for (line, row) in lines {
            let cells: Vec<&str> = row.split(DELIMITER).collect();
            if cells.len() != width {
                return Err(TableError::RaggedRow {
                    line,
                    expected: width,
                    found: cells.len(),
                });
            }
            labels.push(parse_cell(cells[LABEL_COLUMN], line, LABEL_COLUMN)?);
            for (offset, cell) in cells[FIRST_TEST_COLUMN..].iter().enumerate() {
                results.push(parse_cell(cell, line, FIRST_TEST_COLUMN + offset)?);
            }
        }

        if labels.is_empty() {
            return Err(TableError::Empty);
        }

        let rows = labels.len();
        let results = Array2::from_shape_vec((rows, tests), results)?;
        Self::new(Array1::from(labels), results)
    }

    /// Read and parse a table file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text)?;
        tracing::info!(
            path = %path.display(),
            duts = table.number_of_duts(),
            tests = table.number_of_tests(),
            "loaded test table"
        );
        Ok(table)
    }

    /// Number of DUT rows
    #[must_use]
    pub fn number_of_duts(&self) -> usize {
        self.results.nrows()
    }

    /// Number of sequential test results per DUT
    #[must_use]
    pub fn number_of_tests(&self) -> usize {
        self.results.ncols()
    }

    /// Result of test `test` for DUT `dut`, if both are in range
    #[must_use]
    pub fn result(&self, dut: usize, test: usize) -> Option<f64> {
        self.results.get((dut, test)).copied()
    }

    /// Raw label of DUT `dut`
    #[must_use]
    pub fn label(&self, dut: usize) -> Option<f64> {
        self.labels.get(dut).copied()
    }

    /// Ground-truth condition of DUT `dut`
    #[must_use]
    pub fn true_condition(&self, dut: usize) -> Condition {
        self.label(dut).map_or(Condition::Unknown, Condition::from_label)
    }

    /// All labels
    #[must_use]
    pub fn labels(&self) -> ArrayView1<'_, f64> {
        self.labels.view()
    }

    /// All test results, `duts x tests`
    #[must_use]
    pub fn results(&self) -> ArrayView2<'_, f64> {
        self.results.view()
    }

    /// Number of DUTs labelled good
    #[must_use]
    pub fn good_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&label| Condition::from_label(label) == Condition::Good)
            .count()
    }
}

fn parse_cell(raw: &str, line: usize, column: usize) -> Result<f64, TableError> {
    let cell = raw.trim().trim_matches('"').trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| TableError::InvalidNumber {
        line,
        column,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const SAMPLE: &str = "\
label;lot;wafer;x;y;site;bin;date;t0;t1;t2
1;L1;W1;3;4;0;1;2023-01-01;0.5;1.25;-3
0;L1;W1;3;5;1;7;2023-01-01;0.7;;42
";

    #[test]
    fn parses_labels_and_results_and_skips_metadata() {
        let table = TestTable::parse(SAMPLE).unwrap();
        assert_eq!(table.number_of_duts(), 2);
        assert_eq!(table.number_of_tests(), 3);
        assert_eq!(table.labels(), array![1.0, 0.0]);
        assert_eq!(table.results().row(0), array![0.5, 1.25, -3.0]);
        assert_eq!(table.result(0, 1), Some(1.25));
        assert_eq!(table.result(1, 2), Some(42.0));
        assert!(table.result(1, 1).unwrap().is_nan());
        assert_eq!(table.result(0, 3), None);
        assert_eq!(table.result(2, 0), None);
        assert_eq!(table.true_condition(0), Condition::Good);
        assert_eq!(table.true_condition(1), Condition::Bad);
        assert_eq!(table.good_count(), 1);
    }

    #[test]
    fn tolerates_crlf_and_blank_lines() {
        let text = "h0;h1;h2;h3;h4;h5;h6;h7;t0\r\n\r\n1;a;b;c;d;e;f;g;9.5\r\n";
        let table = TestTable::parse(text).unwrap();
        assert_eq!(table.number_of_duts(), 1);
        assert_eq!(table.result(0, 0), Some(9.5));
    }

    #[test]
    fn rejects_missing_header_and_empty_tables() {
        assert!(matches!(TestTable::parse(""), Err(TableError::MissingHeader)));
        assert!(matches!(
            TestTable::parse("h0;h1;h2;h3;h4;h5;h6;h7;t0\n"),
            Err(TableError::Empty)
        ));
    }

    #[test]
    fn rejects_tables_without_test_columns() {
        let err = TestTable::parse("h0;h1;h2;h3;h4;h5;h6;h7\n1;a;b;c;d;e;f;g\n").unwrap_err();
        assert!(matches!(
            err,
            TableError::TooFewColumns { found: 8, required: 9 }
        ));
    }

    #[test]
    fn rejects_ragged_rows_with_line_number() {
        let text = "h0;h1;h2;h3;h4;h5;h6;h7;t0;t1\n1;a;b;c;d;e;f;g;1;2\n0;a;b;c;d;e;f;g;1\n";
        let err = TestTable::parse(text).unwrap_err();
        assert!(matches!(
            err,
            TableError::RaggedRow { line: 3, expected: 10, found: 9 }
        ));
    }

    #[test]
    fn rejects_non_numeric_results() {
        let text = "h0;h1;h2;h3;h4;h5;h6;h7;t0\n1;a;b;c;d;e;f;g;fail\n";
        let err = TestTable::parse(text).unwrap_err();
        assert!(matches!(
            err,
            TableError::InvalidNumber { line: 2, column: 8, .. }
        ));
    }

    #[test]
    fn new_checks_label_count() {
        let err = TestTable::new(array![1.0], array![[1.0], [2.0]]).unwrap_err();
        assert!(matches!(
            err,
            TableError::LabelCountMismatch { labels: 1, rows: 2 }
        ));
    }

    #[test]
    fn table_errors_convert_into_rl_errors() {
        let err: RLError = TableError::Empty.into();
        match err {
            RLError::Other(inner) => assert!(inner.downcast_ref::<TableError>().is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
