//! Flat event file layout.
//!
//! ```text
//! magic      8 bytes   b"DALITZ01"
//! n_fields   u32 LE
//! fields     n_fields × (u16 LE length, UTF-8 name)
//! padding    zero bytes up to the next multiple of 8
//! n_rows     u64 LE
//! data       n_rows × n_fields × f64 LE, row-major
//! ```

use crate::{Error, Result};

/// File magic, including the layout version.
pub const MAGIC: &[u8; 8] = b"DALITZ01";

/// Parsed header of a flat event file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub names: Vec<String>,
    pub rows: usize,
    /// Byte offset of the first value.
    pub data_offset: usize,
}

impl Header {
    /// Expected total file size for this header.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the size does not fit in `usize`.
    pub fn file_len(&self) -> Result<usize> {
        self.rows
            .checked_mul(self.names.len())
            .and_then(|values| values.checked_mul(8))
            .and_then(|data| data.checked_add(self.data_offset))
            .ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "{} events x {} fields overflows the address space",
                    self.rows,
                    self.names.len()
                ))
            })
    }
}

/// Serializes the header for `names` and `rows`.
///
/// # Errors
/// Returns an error if a name is longer than `u16::MAX` bytes or there are
/// more than `u32::MAX` fields.
pub fn encode_header(names: &[String], rows: usize) -> Result<Vec<u8>> {
    let n_fields = u32::try_from(names.len())
        .map_err(|_| Error::InvalidFormat("too many fields".to_string()))?;

    let mut out = Vec::with_capacity(64 + names.iter().map(String::len).sum::<usize>());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&n_fields.to_le_bytes());
    for name in names {
        let len = u16::try_from(name.len())
            .map_err(|_| Error::InvalidFormat(format!("field name too long: {name}")))?;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
    }
    out.resize(out.len().next_multiple_of(8), 0);
    out.extend_from_slice(&(rows as u64).to_le_bytes());
    Ok(out)
}

/// Parses the header at the start of `bytes`.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] for a bad magic, truncated header or
/// non UTF-8 field name.
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    let mut pos = 0usize;
    if take(bytes, &mut pos, MAGIC.len())? != MAGIC {
        return Err(Error::InvalidFormat("not a dalitz event file (bad magic)".to_string()));
    }

    let n_fields = u32::from_le_bytes(array(take(bytes, &mut pos, 4)?)) as usize;
    // Every field needs at least its two length bytes.
    if n_fields > (bytes.len() - pos) / 2 {
        return Err(Error::InvalidFormat(format!(
            "header declares {n_fields} fields but only {} bytes follow",
            bytes.len() - pos
        )));
    }
    let mut names = Vec::with_capacity(n_fields);
    for _ in 0..n_fields {
        let len = usize::from(u16::from_le_bytes(array(take(bytes, &mut pos, 2)?)));
        let raw = take(bytes, &mut pos, len)?;
        let name = std::str::from_utf8(raw)
            .map_err(|e| Error::InvalidFormat(format!("field name is not UTF-8: {e}")))?;
        names.push(name.to_string());
    }

    pos = pos.next_multiple_of(8);
    let rows = u64::from_le_bytes(array(take(bytes, &mut pos, 8)?));
    let rows = usize::try_from(rows)
        .map_err(|_| Error::InvalidFormat(format!("row count {rows} exceeds address space")))?;

    Ok(Header {
        names,
        rows,
        data_offset: pos,
    })
}

/// Reads the little-endian `f64` at byte `offset`.
#[inline]
pub(crate) fn read_f64(bytes: &[u8], offset: usize) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    f64::from_le_bytes(buf)
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8]> {
    let end = pos
        .checked_add(n)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| Error::InvalidFormat("truncated header".to_string()))?;
    let out = &bytes[*pos..end];
    *pos = end;
    Ok(out)
}

fn array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(slice);
    buf
}
