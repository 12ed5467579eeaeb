//! Sample loading (whitespace-delimited text → labeled tables)
//!
//! Input files hold one event per line, fields separated by whitespace, in
//! the fixed variable order `mt2 mbl mbbll`, no header line. A malformed line
//! (wrong token count, non-numeric token) is a load-time error, never
//! silently skipped. Output order equals input line order, which keeps
//! downstream splits reproducible.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Name of the signal table in the dataset container
pub const SIGNAL_TREE: &str = "TreeS";

/// Name of the background table in the dataset container
pub const BACKGROUND_TREE: &str = "TreeB";

/// Class label assigned to signal events
pub const SIGNAL_LABEL: i32 = 1;

/// Class label assigned to background events
pub const BACKGROUND_LABEL: i32 = 0;

/// The fixed kinematic variable schema of the study.
#[must_use]
pub fn default_variables() -> Vec<String> {
    ["mt2", "mbl", "mbbll"].map(String::from).to_vec()
}

/// One event: an ordered tuple of numeric fields, positionally mapped to the
/// bundle's variable schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: Vec<f32>,
}

impl Record {
    /// Create a record from its field values (schema order).
    #[must_use]
    pub const fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Field values in schema order.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of fields.
    #[must_use]
    pub fn width(&self) -> usize {
        self.values.len()
    }
}

/// A named table of records carrying one class label and a per-event weight.
///
/// Created once by the loader and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledDataset {
    name: String,
    label: i32,
    weight: f32,
    records: Vec<Record>,
}

impl LabeledDataset {
    /// Create a labeled dataset with the default weight of 1.0.
    ///
    /// Sample weights are fixed at 1.0 across the study; the source analysis
    /// never varies them.
    #[must_use]
    pub fn new(name: impl Into<String>, label: i32, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            label,
            weight: 1.0,
            records,
        }
    }

    /// Table name (`TreeS` or `TreeB`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class label (`1` signal, `0` background).
    #[must_use]
    pub const fn label(&self) -> i32 {
        self.label
    }

    /// Per-event weight.
    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }

    /// Records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The signal and background tables sharing one ordered variable schema.
///
/// Built once, persisted via [`crate::store::DatasetStore`], read many times
/// by the runners; rebuilt wholesale if the inputs change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetBundle {
    variables: Vec<String>,
    signal: LabeledDataset,
    background: LabeledDataset,
}

impl DatasetBundle {
    /// Assemble a bundle, checking every record against the variable schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if any record's width disagrees with the
    /// variable list.
    pub fn new(
        variables: Vec<String>,
        signal: LabeledDataset,
        background: LabeledDataset,
    ) -> Result<Self> {
        for dataset in [&signal, &background] {
            if let Some(record) = dataset.records().iter().find(|r| r.width() != variables.len()) {
                return Err(Error::Schema {
                    context: dataset.name().to_string(),
                    expected: variables.join(":"),
                    found: format!("record with {} fields", record.width()),
                });
            }
        }
        Ok(Self {
            variables,
            signal,
            background,
        })
    }

    /// Ordered variable names shared by both tables.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The signal table.
    #[must_use]
    pub const fn signal(&self) -> &LabeledDataset {
        &self.signal
    }

    /// The background table.
    #[must_use]
    pub const fn background(&self) -> &LabeledDataset {
        &self.background
    }

    /// Total number of rows across both tables.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.signal.len() + self.background.len()
    }
}

/// Parse a sample file into records.
///
/// Each non-empty line must hold exactly `variables.len()` whitespace
/// separated numeric tokens, columns positionally mapped to `variables` in
/// declaration order. Empty lines are permitted and skipped.
///
/// # Errors
///
/// Returns [`Error::Format`] (naming the path and 1-based line number) on a
/// token-count mismatch or a non-numeric token, and [`Error::Io`] if the file
/// cannot be read.
pub fn load<P: AsRef<Path>>(path: P, variables: &[String]) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() != variables.len() {
            return Err(Error::Format {
                path: path.display().to_string(),
                line: idx + 1,
                message: format!(
                    "expected {} fields ({}), found {}",
                    variables.len(),
                    variables.join(":"),
                    tokens.len()
                ),
            });
        }

        let mut values = Vec::with_capacity(tokens.len());
        for (token, variable) in tokens.iter().zip(variables) {
            let value: f32 = token.parse().map_err(|_| Error::Format {
                path: path.display().to_string(),
                line: idx + 1,
                message: format!("non-numeric token '{token}' for variable '{variable}'"),
            })?;
            values.push(value);
        }
        records.push(Record::new(values));
    }

    Ok(records)
}

/// Load the signal and background sample files into one bundle.
///
/// # Errors
///
/// Propagates [`Error::Format`] / [`Error::Io`] from either file.
pub fn load_bundle<P: AsRef<Path>>(
    signal_path: P,
    background_path: P,
    variables: &[String],
) -> Result<DatasetBundle> {
    let signal = load(&signal_path, variables)?;
    tracing::info!(
        path = %signal_path.as_ref().display(),
        rows = signal.len(),
        "loaded signal sample"
    );
    let background = load(&background_path, variables)?;
    tracing::info!(
        path = %background_path.as_ref().display(),
        rows = background.len(),
        "loaded background sample"
    );

    DatasetBundle::new(
        variables.to_vec(),
        LabeledDataset::new(SIGNAL_TREE, SIGNAL_LABEL, signal),
        LabeledDataset::new(BACKGROUND_TREE, BACKGROUND_LABEL, background),
    )
}
