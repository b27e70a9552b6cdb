//! dalitz-io: Event file I/O for dalitz.
//!
//! This crate provides event sources backed by memory-mapped flat files
//! (via memmap2), HDF5 event trees (`hdf5` feature) and ROOT `TTree`s
//! (`root` feature), plus writers for the feature matrix and batched
//! four-vector export.
//!

mod error;
pub mod export;
pub mod format;
#[cfg(feature = "hdf5")]
pub mod hdf5;
mod reader;
#[cfg(feature = "root")]
pub mod root;
mod writer;

use dalitz_core::{ColumnRow, EventColumns, EventRecord, EventSource, FieldAccessError};
use std::path::Path;

pub use error::{Error, Result};
pub use export::{export_source, FourVectorBatchWriter, StreamingStats};
pub use reader::{MappedEventFile, MappedFileReader, MappedRecord};
pub use writer::{
    write_event_file, write_features, EventFileWriter, FeatureFileWriter, FeatureFormat,
};

/// An event source opened from disk.
pub enum AnyEventSource {
    /// Flat event file read through a memory map.
    Mapped(MappedEventFile),
    /// Table loaded into memory from an HDF5 or ROOT tree.
    Table(EventColumns),
}

impl AnyEventSource {
    /// Column names available in this source.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        match self {
            Self::Mapped(file) => file.field_names().to_vec(),
            Self::Table(table) => table.column_names().to_vec(),
        }
    }
}

/// Record of an [`AnyEventSource`].
pub enum AnyRecord<'a> {
    /// Row of a mapped file.
    Mapped(MappedRecord<'a>),
    /// Row of an in-memory table.
    Table(ColumnRow<'a>),
}

impl EventRecord for AnyRecord<'_> {
    fn field(&self, name: &str) -> std::result::Result<f64, FieldAccessError> {
        match self {
            Self::Mapped(record) => record.field(name),
            Self::Table(record) => record.field(name),
        }
    }
}

impl EventSource for AnyEventSource {
    type Record<'a> = AnyRecord<'a>;

    fn len(&self) -> usize {
        match self {
            Self::Mapped(file) => file.len(),
            Self::Table(table) => EventSource::len(table),
        }
    }

    fn record(&self, index: usize) -> dalitz_core::Result<AnyRecord<'_>> {
        match self {
            Self::Mapped(file) => file.record(index).map(AnyRecord::Mapped),
            Self::Table(table) => table.record(index).map(AnyRecord::Table),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Mapped(file) => file.describe(),
            Self::Table(table) => table.describe(),
        }
    }
}

/// Returns true if `path` has an HDF5 extension.
#[must_use]
pub fn is_hdf5_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("h5") || e.eq_ignore_ascii_case("hdf5"))
}

/// Returns true if `path` has a ROOT extension.
#[must_use]
pub fn is_root_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("root"))
}

/// Opens `path` as an event source, picking the reader from the extension.
///
/// `.h5`/`.hdf5` files are read as the HDF5 event tree `tree` and `.root`
/// files as the ROOT `TTree` `tree`; anything else is opened as a flat event
/// file and `tree` is ignored.
///
/// # Errors
/// Returns an error if the file cannot be opened or parsed, or an HDF5 or
/// ROOT path is given without the matching feature.
pub fn open_event_source<P: AsRef<Path>>(path: P, tree: &str) -> Result<AnyEventSource> {
    let path = path.as_ref();
    if is_hdf5_path(path) {
        return open_hdf5(path, tree);
    }
    if is_root_path(path) {
        return open_root(path, tree);
    }
    MappedEventFile::open(path).map(AnyEventSource::Mapped)
}

#[cfg(feature = "hdf5")]
fn open_hdf5(path: &Path, tree: &str) -> Result<AnyEventSource> {
    hdf5::read_event_tree(path, tree).map(AnyEventSource::Table)
}

#[cfg(not(feature = "hdf5"))]
fn open_hdf5(path: &Path, _tree: &str) -> Result<AnyEventSource> {
    Err(Error::Config(format!(
        "{}: HDF5 input requires the `hdf5` feature",
        path.display()
    )))
}

#[cfg(feature = "root")]
fn open_root(path: &Path, tree: &str) -> Result<AnyEventSource> {
    root::read_root_tree(path, tree).map(AnyEventSource::Table)
}

#[cfg(not(feature = "root"))]
fn open_root(path: &Path, _tree: &str) -> Result<AnyEventSource> {
    Err(Error::Config(format!(
        "{}: ROOT input requires the `root` feature",
        path.display()
    )))
}
