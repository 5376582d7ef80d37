//! Reading store port: the durable, append-only reading log.

use std::future::Future;

use homelog_domain::error::HomelogError;
use homelog_domain::reading::Reading;

/// Single-writer durable storage for [`Reading`]s.
///
/// Writes are batched: [`append`](Self::append) makes a row visible on the
/// store's own connection, [`flush`](Self::flush) makes everything appended so
/// far durable. Once [`close`](Self::close) has been called every method
/// returns [`HomelogError::StorageClosed`].
pub trait ReadingStore: Send {
    /// Append one reading without forcing a durable flush.
    fn append(
        &mut self,
        reading: &Reading,
    ) -> impl Future<Output = Result<(), HomelogError>> + Send;

    /// Make every appended reading durable. No-op when nothing is pending.
    fn flush(&mut self) -> impl Future<Output = Result<(), HomelogError>> + Send;

    /// Flush, then release the underlying connection.
    fn close(&mut self) -> impl Future<Output = Result<(), HomelogError>> + Send;
}
