//! Memory-mapped file readers.
//!

use crate::format::{decode_header, read_f64, Header};
use crate::{Error, Result};
use dalitz_core::{EventRecord, EventSource, FieldAccessError};
use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped file reader.
///
/// Uses memmap2 to efficiently access file contents without
/// loading the entire file into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A flat event file opened through a memory map.
///
/// Values are decoded on access, so opening is O(header) regardless of
/// the number of events.
pub struct MappedEventFile {
    reader: MappedFileReader,
    header: Header,
    columns: HashMap<String, usize>,
}

impl MappedEventFile {
    /// Opens and validates a flat event file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be mapped, the header is invalid,
    /// or the file size does not match the header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        let header = decode_header(reader.as_bytes())?;
        let expected = header.file_len()?;
        if expected != reader.len() {
            return Err(Error::InvalidFormat(format!(
                "{}: expected {} bytes for {} events x {} fields, found {}",
                reader.path().display(),
                expected,
                header.rows,
                header.names.len(),
                reader.len()
            )));
        }

        let columns = header
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        log::debug!(
            "mapped {} ({} events, {} fields)",
            reader.path().display(),
            header.rows,
            header.names.len()
        );
        Ok(Self {
            reader,
            header,
            columns,
        })
    }

    /// Field names in file order.
    #[must_use]
    pub fn field_names(&self) -> &[String] {
        &self.header.names
    }

    /// File size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    fn value(&self, index: usize, column: usize) -> f64 {
        let offset = self.header.data_offset + (index * self.header.names.len() + column) * 8;
        read_f64(self.reader.as_bytes(), offset)
    }
}

/// One event of a [`MappedEventFile`].
#[derive(Clone, Copy)]
pub struct MappedRecord<'a> {
    file: &'a MappedEventFile,
    index: usize,
}

impl EventRecord for MappedRecord<'_> {
    fn field(&self, name: &str) -> std::result::Result<f64, FieldAccessError> {
        let column = *self
            .file
            .columns
            .get(name)
            .ok_or_else(|| FieldAccessError::Missing {
                name: name.to_string(),
            })?;
        let value = self.file.value(self.index, column);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FieldAccessError::Malformed {
                name: name.to_string(),
                value,
            })
        }
    }
}

impl EventSource for MappedEventFile {
    type Record<'a> = MappedRecord<'a>;

    fn len(&self) -> usize {
        self.header.rows
    }

    fn record(&self, index: usize) -> dalitz_core::Result<MappedRecord<'_>> {
        if index >= self.header.rows {
            return Err(dalitz_core::Error::RecordOutOfRange {
                index,
                len: self.header.rows,
            });
        }
        Ok(MappedRecord { file: self, index })
    }

    fn describe(&self) -> String {
        format!("{} ({} events)", self.path().display(), self.header.rows)
    }
}
