//! Dataset container (Arrow/Parquet)
//!
//! Persists both labeled tables plus the shared variable schema into one
//! Parquet file so raw text is parsed once. The container carries one
//! `Float32` column per variable plus `label` (Int32), `weight` (Float32) and
//! `sample` (Utf8, the table name) columns; the table-name → role mapping is
//! kept in the Arrow schema metadata so either table can be retrieved
//! independently.
//!
//! `save` recreates the file unconditionally (overwrite, never append);
//! concurrent runs against the same path are not supported and must use
//! distinct paths.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use crate::sample::{
    DatasetBundle, LabeledDataset, Record, BACKGROUND_LABEL, SIGNAL_LABEL,
};
use crate::{Error, Result};

/// Class-label column name
const LABEL_COLUMN: &str = "label";
/// Per-event weight column name
const WEIGHT_COLUMN: &str = "weight";
/// Table-name column name
const SAMPLE_COLUMN: &str = "sample";

/// Schema metadata key holding the signal table name
const META_SIGNAL: &str = "signal_table";
/// Schema metadata key holding the background table name
const META_BACKGROUND: &str = "background_table";

/// Reader/writer for the dataset container file.
pub struct DatasetStore;

impl DatasetStore {
    /// Persist a bundle, overwriting any existing container at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created and
    /// [`Error::Parquet`] / [`Error::Arrow`] on write failure.
    pub fn save<P: AsRef<Path>>(bundle: &DatasetBundle, path: P) -> Result<()> {
        let schema = Arc::new(container_schema(bundle));
        let batch = bundle_to_batch(bundle, &schema)?;

        // File::create truncates: the source's "recreate" semantics.
        let file = File::create(path.as_ref())?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;

        tracing::info!(
            path = %path.as_ref().display(),
            signal_rows = bundle.signal().len(),
            background_rows = bundle.background().len(),
            "wrote dataset container"
        );
        Ok(())
    }

    /// Load the full bundle, checking the stored variable schema against the
    /// caller's expected list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the stored variable names disagree with
    /// `expected_variables`, and the usual IO/Parquet errors on read failure.
    pub fn load<P: AsRef<Path>>(
        path: P,
        expected_variables: &[String],
    ) -> Result<DatasetBundle> {
        let container = read_container(path.as_ref())?;
        if container.variables != expected_variables {
            return Err(Error::Schema {
                context: path.as_ref().display().to_string(),
                expected: expected_variables.join(":"),
                found: container.variables.join(":"),
            });
        }

        DatasetBundle::new(
            container.variables,
            LabeledDataset::new(container.signal_name, SIGNAL_LABEL, container.signal),
            LabeledDataset::new(container.background_name, BACKGROUND_LABEL, container.background),
        )
    }

    /// Retrieve a single named table from the container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the container holds no table of that
    /// name.
    pub fn load_table<P: AsRef<Path>>(path: P, name: &str) -> Result<LabeledDataset> {
        let container = read_container(path.as_ref())?;
        if name == container.signal_name {
            Ok(LabeledDataset::new(container.signal_name, SIGNAL_LABEL, container.signal))
        } else if name == container.background_name {
            Ok(LabeledDataset::new(
                container.background_name,
                BACKGROUND_LABEL,
                container.background,
            ))
        } else {
            Err(Error::NotFound {
                table: name.to_string(),
                path: path.as_ref().display().to_string(),
            })
        }
    }
}

/// Decoded container contents, rows split back into their tables.
struct Container {
    variables: Vec<String>,
    signal_name: String,
    background_name: String,
    signal: Vec<Record>,
    background: Vec<Record>,
}

fn container_schema(bundle: &DatasetBundle) -> Schema {
    let mut fields: Vec<Field> = bundle
        .variables()
        .iter()
        .map(|name| Field::new(name.as_str(), DataType::Float32, false))
        .collect();
    fields.push(Field::new(LABEL_COLUMN, DataType::Int32, false));
    fields.push(Field::new(WEIGHT_COLUMN, DataType::Float32, false));
    fields.push(Field::new(SAMPLE_COLUMN, DataType::Utf8, false));

    let metadata = HashMap::from([
        (META_SIGNAL.to_string(), bundle.signal().name().to_string()),
        (META_BACKGROUND.to_string(), bundle.background().name().to_string()),
    ]);
    Schema::new_with_metadata(fields, metadata)
}

fn bundle_to_batch(bundle: &DatasetBundle, schema: &Arc<Schema>) -> Result<RecordBatch> {
    let tables = [bundle.signal(), bundle.background()];
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(bundle.variables().len() + 3);

    for var_idx in 0..bundle.variables().len() {
        let values = tables
            .iter()
            .flat_map(|t| t.records().iter().map(move |r| r.values()[var_idx]));
        columns.push(Arc::new(Float32Array::from_iter_values(values)));
    }

    let labels = tables
        .iter()
        .flat_map(|t| std::iter::repeat(t.label()).take(t.len()));
    columns.push(Arc::new(Int32Array::from_iter_values(labels)));

    let weights = tables
        .iter()
        .flat_map(|t| std::iter::repeat(t.weight()).take(t.len()));
    columns.push(Arc::new(Float32Array::from_iter_values(weights)));

    // StringArray::from_iter_values panics on iterators without an exact
    // size_hint, which flat_map cannot provide, so materialize first.
    let samples: Vec<String> = tables
        .iter()
        .flat_map(|t| std::iter::repeat(t.name().to_string()).take(t.len()))
        .collect();
    columns.push(Arc::new(StringArray::from_iter_values(samples)));

    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

fn read_container(path: &Path) -> Result<Container> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = Arc::clone(builder.schema());

    let variables: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .take_while(|name| name != LABEL_COLUMN)
        .collect();
    let n_vars = variables.len();
    if n_vars + 3 != schema.fields().len() {
        return Err(Error::Schema {
            context: path.display().to_string(),
            expected: format!("variable columns followed by {LABEL_COLUMN}/{WEIGHT_COLUMN}/{SAMPLE_COLUMN}"),
            found: schema
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect::<Vec<_>>()
                .join(":"),
        });
    }

    let signal_name = schema_metadata(&schema, META_SIGNAL, path)?;
    let background_name = schema_metadata(&schema, META_BACKGROUND, path)?;

    let mut signal = Vec::new();
    let mut background = Vec::new();

    let reader = builder.build()?;
    for batch in reader {
        let batch = batch?;
        let var_columns: Vec<&Float32Array> = (0..n_vars)
            .map(|i| downcast_f32(&batch, i, path))
            .collect::<Result<_>>()?;
        let sample_column = batch
            .column(n_vars + 2)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| column_type_error(path, SAMPLE_COLUMN, "Utf8"))?;

        for row in 0..batch.num_rows() {
            let values: Vec<f32> = var_columns.iter().map(|c| c.value(row)).collect();
            let record = Record::new(values);
            let sample = sample_column.value(row);
            if sample == signal_name {
                signal.push(record);
            } else if sample == background_name {
                background.push(record);
            } else {
                // A row belonging to neither table means the container is
                // corrupt; fail instead of mislabeling the row.
                return Err(Error::Schema {
                    context: path.display().to_string(),
                    expected: format!("sample value '{signal_name}' or '{background_name}'"),
                    found: sample.to_string(),
                });
            }
        }
    }

    Ok(Container {
        variables,
        signal_name,
        background_name,
        signal,
        background,
    })
}

fn schema_metadata(schema: &Schema, key: &str, path: &Path) -> Result<String> {
    schema.metadata().get(key).cloned().ok_or_else(|| Error::Schema {
        context: path.display().to_string(),
        expected: format!("schema metadata key '{key}'"),
        found: "no such key".to_string(),
    })
}

fn downcast_f32<'a>(batch: &'a RecordBatch, idx: usize, path: &Path) -> Result<&'a Float32Array> {
    let name = batch.schema().field(idx).name().clone();
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| column_type_error(path, &name, "Float32"))
}

fn column_type_error(path: &Path, column: &str, expected: &str) -> Error {
    Error::Schema {
        context: path.display().to_string(),
        expected: format!("{expected} column '{column}'"),
        found: "different column type".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{default_variables, BACKGROUND_TREE, SIGNAL_TREE};

    fn tiny_bundle() -> DatasetBundle {
        let signal = LabeledDataset::new(
            SIGNAL_TREE,
            SIGNAL_LABEL,
            vec![
                Record::new(vec![1.0, 2.0, 3.0]),
                Record::new(vec![4.0, 5.0, 6.0]),
            ],
        );
        let background = LabeledDataset::new(
            BACKGROUND_TREE,
            BACKGROUND_LABEL,
            vec![Record::new(vec![0.1, 0.2, 0.3])],
        );
        DatasetBundle::new(default_variables(), signal, background).unwrap()
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.parquet");

        let bundle = tiny_bundle();
        DatasetStore::save(&bundle, &path).unwrap();
        let reloaded = DatasetStore::load(&path, &default_variables()).unwrap();

        assert_eq!(reloaded, bundle);
    }

    #[test]
    fn test_save_overwrites_existing_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.parquet");

        let bundle = tiny_bundle();
        DatasetStore::save(&bundle, &path).unwrap();
        // Second save must recreate, not append.
        DatasetStore::save(&bundle, &path).unwrap();

        let reloaded = DatasetStore::load(&path, &default_variables()).unwrap();
        assert_eq!(reloaded.signal().len(), 2);
        assert_eq!(reloaded.background().len(), 1);
    }

    #[test]
    fn test_load_rejects_wrong_variable_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.parquet");
        DatasetStore::save(&tiny_bundle(), &path).unwrap();

        let wrong = ["mt2", "mbl", "mxx"].map(String::from).to_vec();
        let err = DatasetStore::load(&path, &wrong).unwrap_err();
        assert!(matches!(err, Error::Schema { .. }));
    }

    #[test]
    fn test_load_table_unknown_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.parquet");
        DatasetStore::save(&tiny_bundle(), &path).unwrap();

        let err = DatasetStore::load_table(&path, "TreeX").unwrap_err();
        match err {
            Error::NotFound { ref table, .. } => assert_eq!(table, "TreeX"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_sample_value_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.parquet");

        // Hand-write a container whose sample column names neither table.
        let schema = Arc::new(container_schema(&tiny_bundle()));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Float32Array::from(vec![1.0_f32])),
            Arc::new(Float32Array::from(vec![2.0_f32])),
            Arc::new(Float32Array::from(vec![3.0_f32])),
            Arc::new(Int32Array::from(vec![1])),
            Arc::new(Float32Array::from(vec![1.0_f32])),
            Arc::new(StringArray::from(vec!["TreeZ"])),
        ];
        let batch = RecordBatch::try_new(Arc::clone(&schema), columns).unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = DatasetStore::load(&path, &default_variables()).unwrap_err();
        match err {
            Error::Schema { ref found, .. } => assert_eq!(found, "TreeZ"),
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_table_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.parquet");
        DatasetStore::save(&tiny_bundle(), &path).unwrap();

        let signal = DatasetStore::load_table(&path, SIGNAL_TREE).unwrap();
        assert_eq!(signal.len(), 2);
        assert_eq!(signal.label(), SIGNAL_LABEL);

        let background = DatasetStore::load_table(&path, BACKGROUND_TREE).unwrap();
        assert_eq!(background.len(), 1);
        assert_eq!(background.label(), BACKGROUND_LABEL);
    }
}
