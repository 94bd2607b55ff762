//! Chunked persistence.

use thiserror::Error;
use tracing::debug;

use crate::error::DatabaseError;
use crate::storage::{Upsert, UpsertSink};

/// A chunk failed after `written` records had already been committed.
#[derive(Error, Debug)]
#[error("{source} ({written} records committed before the failing batch)")]
pub struct BatchError {
    pub written: usize,
    #[source]
    pub source: DatabaseError,
}

/// Write `records` to `sink` in chunks of `batch_size`, in order.
///
/// Stops at the first failing chunk; earlier chunks stay committed and their
/// size is reported in the [`BatchError`]. Returns the number of records
/// written.
pub fn upsert_in_batches<S, R>(
    sink: &mut S,
    records: &[R],
    batch_size: usize,
) -> Result<usize, BatchError>
where
    S: UpsertSink,
    R: Upsert,
{
    let mut written = 0;
    for (i, chunk) in records.chunks(batch_size.max(1)).enumerate() {
        sink.upsert_batch(chunk).map_err(|source| BatchError { written, source })?;
        written += chunk.len();
        debug!(table = R::TABLE, batch = i + 1, written, "batch saved");
    }
    Ok(written)
}
