//! Error taxonomy of the lookup, packing, and collection surfaces.
//!
//! "Not found" and "end of data" are not errors and are modeled as
//! `Option::None` by the APIs that can produce them.

use thiserror::Error;

/// Boxed backend failure carried by [`Unavailable`].
type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The backing record source could not be reached or failed mid-operation.
///
/// Fatal for the current call. An enumeration session that observes this
/// releases its cursor and resets to the closed state; the next fetch
/// reopens from the start.
#[derive(Debug, Error)]
#[error("record source unavailable: {cause}")]
pub struct Unavailable {
    #[source]
    cause: Cause,
}

impl Unavailable {
    /// Wraps a backend failure.
    #[inline]
    #[must_use]
    pub fn new(cause: impl Into<Cause>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

/// A caller-supplied buffer is too small for the packed layout.
///
/// Recoverable: retry the same operation with at least [`required`] bytes
/// (or grow by doubling, as enumeration callers conventionally do). The
/// caller's buffer is left byte-for-byte untouched.
///
/// [`required`]: InsufficientCapacity::required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("buffer of {capacity} bytes cannot hold a {required}-byte layout")]
pub struct InsufficientCapacity {
    /// Bytes the packed layout needs.
    pub required: usize,
    /// Bytes the caller provided.
    pub capacity: usize,
}

/// A growable id list is full and its ceiling forbids further growth.
///
/// Recoverable: retry the whole collection with a larger ceiling. The
/// overflowing id has not been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("id list ceiling of {limit} reached")]
pub struct InsufficientLimit {
    /// The capacity ceiling in effect when the overflowing write arrived.
    pub limit: usize,
}

/// Failure surface of the one-shot lookups and of [`fetch_next`].
///
/// [`fetch_next`]: crate::GroupEnumerator::fetch_next
#[derive(Debug, Error)]
pub enum LookupError {
    /// The backing source failed; see [`Unavailable`].
    #[error(transparent)]
    Unavailable(#[from] Unavailable),
    /// The caller's buffer is too small; see [`InsufficientCapacity`].
    #[error(transparent)]
    Capacity(#[from] InsufficientCapacity),
}

/// Failure surface of [`groups_for_user`].
///
/// [`groups_for_user`]: crate::groups_for_user
#[derive(Debug, Error)]
pub enum CollectError {
    /// The backing source failed; see [`Unavailable`].
    #[error(transparent)]
    Unavailable(#[from] Unavailable),
    /// The id list hit its ceiling; see [`InsufficientLimit`].
    #[error(transparent)]
    Limit(#[from] InsufficientLimit),
}
