//! FrameStore trait - durable store-and-forward buffer interface
//!
//! Rows are opaque payloads ordered by a monotonically increasing id.

use bytes::Bytes;

use crate::BufferError;

/// One persisted frame
#[derive(Debug, Clone, PartialEq)]
pub struct BufferRow {
    /// Auto-increment id, strictly greater than every earlier row
    pub id: i64,

    /// Record timestamp (device-local epoch ms)
    pub timestamp: i64,

    /// Encoded resync `SparseFrame`
    pub payload: Bytes,
}

/// Durable ordered queue of encoded frames
///
/// Single writer, single reader. Implementations must make each successful
/// `append` survive a process crash.
pub trait FrameStore {
    /// Persist one row and return its id
    fn append(&self, timestamp: u64, payload: &[u8]) -> Result<i64, BufferError>;

    /// Lowest-id row with `id > after` (or the first row when `after` is `None`)
    fn first_after(&self, after: Option<i64>) -> Result<Option<BufferRow>, BufferError>;

    /// Delete a row. Removing an unknown id is not an error.
    fn remove(&self, id: i64) -> Result<(), BufferError>;

    /// Number of rows currently stored
    fn len(&self) -> Result<u64, BufferError>;

    fn is_empty(&self) -> Result<bool, BufferError> {
        Ok(self.len()? == 0)
    }

    /// Lazy ascending-id scan
    ///
    /// Each step re-queries from the last yielded id, so removing the row that
    /// was just yielded never disturbs the rest of the scan.
    fn scan(&self) -> Scan<'_, Self> {
        Scan {
            store: self,
            cursor: None,
            finished: false,
        }
    }
}

/// Iterator returned by [`FrameStore::scan`]
pub struct Scan<'a, S: ?Sized> {
    store: &'a S,
    cursor: Option<i64>,
    finished: bool,
}

impl<S: FrameStore + ?Sized> Iterator for Scan<'_, S> {
    type Item = Result<BufferRow, BufferError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.store.first_after(self.cursor) {
            Ok(Some(row)) => {
                self.cursor = Some(row.id);
                Some(Ok(row))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
