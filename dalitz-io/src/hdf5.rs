//! HDF5 event trees and feature matrices.
//!
//! An event tree is a group whose one-dimensional numeric datasets are the
//! event columns. Datasets of another rank or type are skipped.

use crate::{Error, Result};
use dalitz_core::{EventColumns, ObservableTriple, FEATURE_COLUMNS};
use hdf5::types::VarLenUnicode;
use hdf5::File;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::path::Path;
use std::str::FromStr;

/// Name of the feature dataset.
pub const FEATURES_DATASET: &str = "features";

/// Loads the event tree `tree` of `path` into memory.
///
/// # Errors
/// Returns an error if the file or group cannot be opened, or the columns
/// have different lengths.
pub fn read_event_tree<P: AsRef<Path>>(path: P, tree: &str) -> Result<EventColumns> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let group = file.group(tree).map_err(|e| {
        Error::InvalidFormat(format!("{}: no tree `{tree}`: {e}", path.display()))
    })?;

    let mut table = EventColumns::new();
    for name in group.member_names()? {
        let Ok(dataset) = group.dataset(&name) else {
            log::debug!("{tree}/{name}: not a dataset, skipped");
            continue;
        };
        if dataset.ndim() != 1 {
            log::debug!("{tree}/{name}: rank {} dataset skipped", dataset.ndim());
            continue;
        }
        match dataset.read_raw::<f64>() {
            Ok(values) => table.push_column(name, values)?,
            Err(e) => log::debug!("{tree}/{name}: not numeric ({e}), skipped"),
        }
    }

    log::debug!(
        "loaded {}:{tree} ({} events, {} columns)",
        path.display(),
        table.len(),
        table.column_names().len()
    );
    Ok(table)
}

/// Writes `table` as the event tree `tree` of a new file at `path`.
///
/// # Errors
/// Returns an error if HDF5 I/O fails.
pub fn write_event_tree<P: AsRef<Path>>(path: P, tree: &str, table: &EventColumns) -> Result<()> {
    let file = File::create(path)?;
    let group = file.create_group(tree)?;
    for name in table.column_names() {
        let Some(values) = table.column(name) else {
            continue;
        };
        group
            .new_dataset::<f64>()
            .shape((values.len(),))
            .create(name.as_str())?
            .write(ArrayView1::from(values))?;
    }
    Ok(())
}

/// Writes the `(N, 3)` feature matrix to a new file at `path`.
///
/// # Errors
/// Returns an error if the matrix is not three columns wide or HDF5 I/O fails.
pub fn write_features_hdf5<P: AsRef<Path>>(path: P, features: ArrayView2<'_, f64>) -> Result<()> {
    if features.ncols() != FEATURE_COLUMNS {
        return Err(Error::InvalidFormat(format!(
            "feature matrix has {} columns, expected {FEATURE_COLUMNS}",
            features.ncols()
        )));
    }

    let file = File::create(path)?;
    let standard = features.as_standard_layout();
    let dataset = file
        .new_dataset::<f64>()
        .shape((features.nrows(), FEATURE_COLUMNS))
        .create(FEATURES_DATASET)?;
    dataset.write(standard.view())?;

    let names: Vec<VarLenUnicode> = ObservableTriple::COLUMNS
        .iter()
        .map(|name| to_var_len_unicode(name))
        .collect::<Result<Vec<_>>>()?;
    dataset
        .new_attr::<VarLenUnicode>()
        .shape((names.len(),))
        .create("columns")?
        .write(ArrayView1::from(names.as_slice()))?;
    Ok(())
}

/// Reads a feature matrix written by [`write_features_hdf5`].
///
/// # Errors
/// Returns an error if the dataset is missing or not `(N, 3)`.
pub fn read_features_hdf5<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let file = File::open(path)?;
    let dataset = file.dataset(FEATURES_DATASET)?;
    let features = dataset.read_2d::<f64>()?;
    if features.ncols() != FEATURE_COLUMNS {
        return Err(Error::InvalidFormat(format!(
            "features dataset has {} columns, expected {FEATURE_COLUMNS}",
            features.ncols()
        )));
    }
    Ok(features)
}

/// Names of the groups at the top level of `path`.
///
/// # Errors
/// Returns an error if the file cannot be opened.
pub fn list_trees<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let names = file.member_names()?;
    Ok(names
        .into_iter()
        .filter(|name| file.group(name).is_ok())
        .collect())
}

fn to_var_len_unicode(value: &str) -> Result<VarLenUnicode> {
    VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 attribute: {e}")))
}
