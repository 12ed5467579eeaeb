//! Integration test for the materialization stage: sample files → bundle →
//! Parquet container → bundle, covering the scenarios the study relies on.

use std::fs;

use ttbar_mva::sample::{self, BACKGROUND_TREE, SIGNAL_TREE};
use ttbar_mva::store::DatasetStore;
use ttbar_mva::Error;

fn default_variables() -> Vec<String> {
    sample::default_variables()
}

#[test]
fn test_materialize_and_reload_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let signal_path = dir.path().join("signal.dat");
    let background_path = dir.path().join("background.dat");
    let container = dir.path().join("ttbar_analysis.parquet");

    fs::write(&signal_path, "1.0 2.0 3.0\n4.0 5.0 6.0\n").unwrap();
    fs::write(&background_path, "0.1 0.2 0.3\n").unwrap();

    let bundle =
        sample::load_bundle(&signal_path, &background_path, &default_variables()).unwrap();
    DatasetStore::save(&bundle, &container).unwrap();

    let reloaded = DatasetStore::load(&container, &default_variables()).unwrap();
    assert_eq!(reloaded, bundle, "round-trip must preserve records, order and schema");
    assert_eq!(reloaded.signal().name(), SIGNAL_TREE);
    assert_eq!(reloaded.signal().len(), 2);
    assert_eq!(reloaded.background().name(), BACKGROUND_TREE);
    assert_eq!(reloaded.background().len(), 1);
    assert_eq!(reloaded.variables(), default_variables());

    // Record order equals input line order.
    assert_eq!(reloaded.signal().records()[0].values(), &[1.0, 2.0, 3.0]);
    assert_eq!(reloaded.signal().records()[1].values(), &[4.0, 5.0, 6.0]);
}

#[test]
fn test_unknown_table_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let signal_path = dir.path().join("signal.dat");
    let background_path = dir.path().join("background.dat");
    let container = dir.path().join("ttbar_analysis.parquet");

    fs::write(&signal_path, "1.0 2.0 3.0\n").unwrap();
    fs::write(&background_path, "0.1 0.2 0.3\n").unwrap();
    let bundle =
        sample::load_bundle(&signal_path, &background_path, &default_variables()).unwrap();
    DatasetStore::save(&bundle, &container).unwrap();

    let err = DatasetStore::load_table(&container, "TreeX").unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    // The two real tables remain retrievable independently.
    assert_eq!(DatasetStore::load_table(&container, SIGNAL_TREE).unwrap().len(), 1);
    assert_eq!(DatasetStore::load_table(&container, BACKGROUND_TREE).unwrap().len(), 1);
}

#[test]
fn test_variable_mismatch_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let signal_path = dir.path().join("signal.dat");
    let background_path = dir.path().join("background.dat");
    let container = dir.path().join("ttbar_analysis.parquet");

    fs::write(&signal_path, "1.0 2.0 3.0\n").unwrap();
    fs::write(&background_path, "0.1 0.2 0.3\n").unwrap();
    let bundle =
        sample::load_bundle(&signal_path, &background_path, &default_variables()).unwrap();
    DatasetStore::save(&bundle, &container).unwrap();

    let wrong = ["mt2", "mbl", "mxx"].map(String::from).to_vec();
    let err = DatasetStore::load(&container, &wrong).unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
}

#[test]
fn test_malformed_sample_leaves_no_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let signal_path = dir.path().join("signal.dat");
    let background_path = dir.path().join("background.dat");

    fs::write(&signal_path, "1.0 2.0 3.0\n4.0 five 6.0\n").unwrap();
    fs::write(&background_path, "0.1 0.2 0.3\n").unwrap();

    let err = sample::load_bundle(&signal_path, &background_path, &default_variables())
        .unwrap_err();
    assert!(matches!(err, Error::Format { line: 2, .. }));
}
