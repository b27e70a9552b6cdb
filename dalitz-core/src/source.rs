//! Event source capability.

use crate::error::Result;
use crate::record::EventRecord;

/// A finite, ordered, randomly addressable sequence of event records.
///
/// Sources know their length up front so progress can be reported, and
/// hand out borrowed record views that live no longer than the source.
pub trait EventSource {
    /// Record view type.
    type Record<'a>: EventRecord
    where
        Self: 'a;

    /// Number of records.
    fn len(&self) -> usize;

    /// Returns true if the source holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the record at `index`.
    ///
    /// # Errors
    /// Returns an error if `index` is out of range or the source cannot
    /// produce the record.
    fn record(&self, index: usize) -> Result<Self::Record<'_>>;

    /// Human readable label for logs.
    fn describe(&self) -> String {
        format!("{} events", self.len())
    }
}
