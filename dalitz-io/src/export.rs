//! Batched four-vector export.
//!
//! Every event is serialized as sixteen little-endian `f64` values,
//! `(E, px, py, pz)` for the positive track, negative track and both
//! neutrals. Events are grouped into batches of at most `bufsize_mb`
//! mebibytes; a batch is written to the sink as soon as it is full.

use crate::{Error, Result};
use dalitz_core::{EventCandidates, EventSource};
use std::io::Write;

/// Serialized size of one event: 16 doubles.
pub const EVENT_BYTES: usize = 16 * std::mem::size_of::<f64>();

/// Counters for a streaming export.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamingStats {
    pub events: u64,
    pub batches: u64,
    pub bytes: u64,
}

impl StreamingStats {
    fn add_batch(&mut self, events: usize, bytes: usize) {
        self.events += events as u64;
        self.batches += 1;
        self.bytes += bytes as u64;
    }

    /// Bytes written, in mebibytes.
    #[must_use]
    pub fn megabytes(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let mb = self.bytes as f64 / (1024.0 * 1024.0);
        mb
    }
}

/// Buffers event four-vectors and flushes them to `W` in fixed-size batches.
pub struct FourVectorBatchWriter<W: Write> {
    sink: W,
    batch: Vec<u8>,
    batch_events: usize,
    events_in_batch: usize,
    stats: StreamingStats,
}

impl<W: Write> FourVectorBatchWriter<W> {
    /// Creates a writer with batches of `bufsize_mb` MiB.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when `bufsize_mb` is zero.
    pub fn new(sink: W, bufsize_mb: usize) -> Result<Self> {
        if bufsize_mb == 0 {
            return Err(Error::Config(
                "batch size must be greater than 0 MB".to_string(),
            ));
        }
        let batch_events = (bufsize_mb * 1024 * 1024 / EVENT_BYTES).max(1);
        Ok(Self::with_batch_events(sink, batch_events))
    }

    /// Creates a writer with an explicit number of events per batch.
    #[must_use]
    pub fn with_batch_events(sink: W, batch_events: usize) -> Self {
        let batch_events = batch_events.max(1);
        Self {
            sink,
            batch: Vec::with_capacity(batch_events.min(1 << 16) * EVENT_BYTES),
            batch_events,
            events_in_batch: 0,
            stats: StreamingStats::default(),
        }
    }

    /// Events per batch.
    #[must_use]
    pub fn batch_events(&self) -> usize {
        self.batch_events
    }

    /// Appends one event, flushing the batch when it is full.
    ///
    /// # Errors
    /// Returns an error if writing a full batch fails.
    pub fn push(&mut self, candidates: &EventCandidates) -> Result<()> {
        for value in candidates.to_array() {
            self.batch.extend_from_slice(&value.to_le_bytes());
        }
        self.events_in_batch += 1;
        if self.events_in_batch >= self.batch_events {
            self.flush_batch()?;
        }
        Ok(())
    }

    /// Writes the pending partial batch, if any.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn flush_batch(&mut self) -> Result<()> {
        if self.events_in_batch == 0 {
            return Ok(());
        }
        self.sink.write_all(&self.batch)?;
        self.stats.add_batch(self.events_in_batch, self.batch.len());
        if self.stats.batches % 10 == 0 {
            log::debug!(
                "batches: {} | events: {} | MB: {:.2}",
                self.stats.batches,
                self.stats.events,
                self.stats.megabytes()
            );
        }
        self.batch.clear();
        self.events_in_batch = 0;
        Ok(())
    }

    /// Statistics so far, excluding the pending partial batch.
    #[must_use]
    pub fn stats(&self) -> StreamingStats {
        self.stats
    }

    /// Writes the pending partial batch and returns the sink and totals.
    ///
    /// # Errors
    /// Returns an error if the final write or flush fails.
    pub fn finish(mut self) -> Result<(W, StreamingStats)> {
        self.flush_batch()?;
        self.sink.flush()?;
        Ok((self.sink, self.stats))
    }
}

/// Pushes every event of `source` through `writer`.
///
/// Unlike the selection pipeline, no cut is applied: all events are exported.
/// The last partial batch is flushed, so batches never span two sources.
///
/// # Errors
/// Returns the first field access error, tagged with the event index, or an
/// I/O error from the writer.
pub fn export_source<S, W>(source: &S, writer: &mut FourVectorBatchWriter<W>) -> Result<usize>
where
    S: EventSource + ?Sized,
    W: Write,
{
    for index in 0..source.len() {
        let record = source.record(index)?;
        let candidates = EventCandidates::from_record(&record)
            .map_err(|err| dalitz_core::Error::FieldAccess { index, source: err })?;
        writer.push(&candidates)?;
        if (index + 1) % 500_000 == 0 {
            log::info!("processed {} / {} events", index + 1, source.len());
        }
    }
    writer.flush_batch()?;
    Ok(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dalitz_core::{EventColumns, FourVector, Particle};
    use std::f64::consts::FRAC_PI_2;

    fn rows(n: usize) -> Vec<[f64; 12]> {
        (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let mag = 0.1 + i as f64 * 0.01;
                [
                    mag, FRAC_PI_2, 0.0, mag, FRAC_PI_2, 1.0, mag, 0.5, 0.0, mag, 0.5, 2.0,
                ]
            })
            .collect()
    }

    #[test]
    fn test_zero_bufsize_rejected() {
        assert!(matches!(
            FourVectorBatchWriter::new(Vec::<u8>::new(), 0),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_batch_size_from_megabytes() {
        let writer = FourVectorBatchWriter::new(Vec::<u8>::new(), 1).unwrap();
        assert_eq!(writer.batch_events(), 8192);
    }

    #[test]
    fn test_batches_and_layout() {
        let table = EventColumns::from_rows(&rows(5));
        let mut writer = FourVectorBatchWriter::with_batch_events(Vec::<u8>::new(), 2);
        let exported = export_source(&table, &mut writer).unwrap();
        assert_eq!(exported, 5);
        assert_eq!(writer.stats().batches, 3);

        let (bytes, stats) = writer.finish().unwrap();
        assert_eq!(stats.events, 5);
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.bytes, 5 * EVENT_BYTES as u64);
        assert_eq!(bytes.len(), 5 * EVENT_BYTES);

        // Third event, first neutral: values 8..12 of the event.
        let row = rows(5)[2];
        let expected = FourVector::from_mag_theta_phi(row[6], row[7], row[8], Particle::Neutral1.mass());
        let base = 2 * EVENT_BYTES + 8 * 8;
        let decoded: Vec<f64> = bytes[base..base + 32]
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(decoded, expected.to_array().to_vec());
    }

    #[test]
    fn test_batches_do_not_span_sources() {
        let first = EventColumns::from_rows(&rows(4));
        let second = EventColumns::from_rows(&rows(4));
        let mut writer = FourVectorBatchWriter::with_batch_events(Vec::<u8>::new(), 3);
        export_source(&first, &mut writer).unwrap();
        assert_eq!(writer.stats().batches, 2);
        assert_eq!(writer.stats().events, 4);
        export_source(&second, &mut writer).unwrap();

        let (bytes, stats) = writer.finish().unwrap();
        assert_eq!(stats.batches, 4);
        assert_eq!(stats.events, 8);
        assert_eq!(bytes.len(), 8 * EVENT_BYTES);
    }

    #[test]
    fn test_missing_field_tagged_with_index() {
        let mut table = EventColumns::from_rows(&rows(3));
        table.remove_column("phi_neg_rec");
        let mut writer = FourVectorBatchWriter::with_batch_events(Vec::<u8>::new(), 2);
        let err = export_source(&table, &mut writer).unwrap_err();
        assert!(matches!(
            err,
            Error::CoreError(dalitz_core::Error::FieldAccess { index: 0, .. })
        ));
    }
}
