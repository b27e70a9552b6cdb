//! I/O error types.

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Invalid writer or reader configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// ROOT file error.
    #[cfg(feature = "root")]
    #[error("ROOT error: {0}")]
    Root(String),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] dalitz_core::Error),
}
