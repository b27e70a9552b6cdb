//! File writers for event tables and feature matrices.

use crate::format::encode_header;
use crate::{Error, Result};
use dalitz_core::{EventColumns, ObservableTriple, FEATURE_COLUMNS};
use ndarray::ArrayView2;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for flat event files readable by [`crate::MappedEventFile`].
pub struct EventFileWriter {
    writer: BufWriter<File>,
}

impl EventFileWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes the header followed by every row of `table`.
    ///
    /// # Errors
    /// Returns an error if the header cannot be encoded or the write fails.
    pub fn write_columns(&mut self, table: &EventColumns) -> Result<()> {
        let names = table.column_names();
        self.writer.write_all(&encode_header(names, table.len())?)?;

        let columns: Vec<&[f64]> = names
            .iter()
            .filter_map(|name| table.column(name))
            .collect();
        for row in 0..table.len() {
            for column in &columns {
                self.writer.write_all(&column[row].to_le_bytes())?;
            }
        }

        self.writer.flush()?;
        Ok(())
    }
}

/// Writes `table` to `path` as a flat event file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_event_file<P: AsRef<Path>>(path: P, table: &EventColumns) -> Result<()> {
    EventFileWriter::create(path)?.write_columns(table)
}

/// Output format of a finalized feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureFormat {
    /// Comma separated text with a header line.
    Csv,
    /// Raw little-endian `f64`, 24 bytes per row.
    Binary,
    /// HDF5 `features` dataset.
    Hdf5,
}

impl FeatureFormat {
    /// Picks the format from the file extension.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for an unknown or missing extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("bin" | "dat") => Ok(Self::Binary),
            Some("h5" | "hdf5") => Ok(Self::Hdf5),
            _ => Err(Error::Config(format!(
                "cannot infer output format of {} (expected .csv, .bin, .dat, .h5)",
                path.display()
            ))),
        }
    }
}

/// Writer for the `(N, 3)` feature matrix.
pub struct FeatureFileWriter {
    writer: BufWriter<File>,
}

impl FeatureFileWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes the matrix as CSV.
    ///
    /// # Errors
    /// Returns an error if the matrix is not three columns wide or the write fails.
    pub fn write_csv(&mut self, features: ArrayView2<'_, f64>) -> Result<()> {
        check_width(features)?;
        writeln!(self.writer, "{}", ObservableTriple::COLUMNS.join(","))?;

        for row in features.rows() {
            writeln!(self.writer, "{},{},{}", row[0], row[1], row[2])?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes the matrix as binary data.
    ///
    /// Format: for each row, three `f64` (`s_pos_neg`, `s_pos_pi0`, `s_neg_pi0`).
    /// Total: 24 bytes per row
    ///
    /// # Errors
    /// Returns an error if the matrix is not three columns wide or the write fails.
    pub fn write_binary(&mut self, features: ArrayView2<'_, f64>) -> Result<()> {
        check_width(features)?;
        for value in features.iter() {
            self.writer.write_all(&value.to_le_bytes())?;
        }

        self.writer.flush()?;
        Ok(())
    }
}

/// Writes `features` to `path`, choosing the format from the extension.
///
/// # Errors
/// Returns an error for an unsupported extension, an HDF5 path when the
/// `hdf5` feature is disabled, or a failed write.
pub fn write_features<P: AsRef<Path>>(path: P, features: ArrayView2<'_, f64>) -> Result<()> {
    let path = path.as_ref();
    match FeatureFormat::from_path(path)? {
        FeatureFormat::Csv => FeatureFileWriter::create(path)?.write_csv(features)?,
        FeatureFormat::Binary => FeatureFileWriter::create(path)?.write_binary(features)?,
        #[cfg(feature = "hdf5")]
        FeatureFormat::Hdf5 => crate::hdf5::write_features_hdf5(path, features)?,
        #[cfg(not(feature = "hdf5"))]
        FeatureFormat::Hdf5 => {
            return Err(Error::Config(format!(
                "{}: HDF5 output requires the `hdf5` feature",
                path.display()
            )))
        }
    }
    log::debug!("wrote {} feature rows to {}", features.nrows(), path.display());
    Ok(())
}

fn check_width(features: ArrayView2<'_, f64>) -> Result<()> {
    if features.ncols() == FEATURE_COLUMNS {
        Ok(())
    } else {
        Err(Error::InvalidFormat(format!(
            "feature matrix has {} columns, expected {FEATURE_COLUMNS}",
            features.ncols()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_features_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = FeatureFileWriter::create(file.path()).unwrap();

        let features = array![[0.5, 0.25, 0.125], [1.5, 2.5, 3.5]];
        writer.write_csv(features.view()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "s_pos_neg,s_pos_pi0,s_neg_pi0");
        assert_eq!(lines[1], "0.5,0.25,0.125");
        assert_eq!(lines[2], "1.5,2.5,3.5");
    }

    #[test]
    fn test_write_features_binary() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = FeatureFileWriter::create(file.path()).unwrap();

        let features = array![[0.5, 0.25, 0.125]];
        writer.write_binary(features.view()).unwrap();

        let data = std::fs::read(file.path()).unwrap();
        assert_eq!(data.len(), 24);
        assert_eq!(&data[8..16], &0.25_f64.to_le_bytes());
    }

    #[test]
    fn test_wrong_width_rejected() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = FeatureFileWriter::create(file.path()).unwrap();
        let features = array![[0.5, 0.25]];
        assert!(matches!(
            writer.write_csv(features.view()),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FeatureFormat::from_path(Path::new("out.CSV")).unwrap(),
            FeatureFormat::Csv
        );
        assert_eq!(
            FeatureFormat::from_path(Path::new("out.dat")).unwrap(),
            FeatureFormat::Binary
        );
        assert_eq!(
            FeatureFormat::from_path(Path::new("out.hdf5")).unwrap(),
            FeatureFormat::Hdf5
        );
        assert!(FeatureFormat::from_path(Path::new("out")).is_err());
    }
}
