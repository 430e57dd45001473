//! The serial enumeration session over all group records.
//!
//! One session instance is meant to exist per process; every operation runs
//! under a single reentrant lock, so any number of threads can share it.
//! The session is the only stateful part of this crate: it keeps the record
//! cursor alive between `fetch_next` calls, and it caches the one record
//! that did not fit the caller's buffer so a retry with a larger buffer
//! re-offers the same row instead of skipping it.

use std::cell::RefCell;

use parking_lot::ReentrantMutex;
use tracing::{debug, error};

use crate::error::{LookupError, Unavailable};
use crate::group_record::GroupRecord;
use crate::packed::PackedGroup;
use crate::source::{Connect, RecordCursor, RecordSource};

type RowsOf<C> = <<C as Connect>::Source as RecordSource>::Rows;

enum State<R> {
    Closed,
    Open(R),
    /// The last fetched record did not fit the caller's buffer; it is
    /// re-offered, unmodified, before the cursor advances again.
    Pending {
        rows: R,
        record: GroupRecord,
    },
}

impl<R> Default for State<R> {
    fn default() -> Self {
        Self::Closed
    }
}

/// Stateful open/fetch-next/close access to all group records.
///
/// State machine: `Closed` → [`open`] → `Open` → [`fetch_next`] either
/// stays `Open` (row delivered, or end-of-data), parks the row as pending
/// (buffer too small, cursor not advanced), or drops back to `Closed`
/// (source failure). [`close`] always returns to `Closed` and discards any
/// pending record. `fetch_next` on a closed session opens it first, so the
/// reentrant lock is acquired twice on behalf of the same call.
///
/// Rows are delivered in the source's native cursor order; a too-small
/// buffer retry sees the same row again, never a skipped or duplicated one.
///
/// # Examples
/// ```no_run
/// # #[cfg(feature = "sqlite")]
/// # fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// use group_identity::GroupEnumerator;
/// use group_identity::sqlite::SqliteConnector;
///
/// let sessions = GroupEnumerator::new(SqliteConnector::new("/var/db/group.db"));
/// let mut buf = vec![0u8; 1024];
/// sessions.open()?;
/// while let Some(group) = sessions.fetch_next(&mut buf)? {
///     println!("{} ({})", group.name(), group.gid());
/// }
/// sessions.close();
/// # Ok(())
/// # }
/// ```
///
/// [`open`]: GroupEnumerator::open
/// [`fetch_next`]: GroupEnumerator::fetch_next
/// [`close`]: GroupEnumerator::close
pub struct GroupEnumerator<C: Connect> {
    connector: C,
    state: ReentrantMutex<RefCell<State<RowsOf<C>>>>,
}

impl<C: Connect> GroupEnumerator<C> {
    /// New session in the closed state. No connection is made until
    /// [`open`](Self::open) or the first fetch.
    #[inline]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            state: ReentrantMutex::new(RefCell::new(State::Closed)),
        }
    }

    /// Acquires the enumeration cursor. A no-op on an already-open session.
    ///
    /// # Errors
    /// [`Unavailable`] when the source cannot be reached; the session stays
    /// closed.
    pub fn open(&self) -> Result<(), Unavailable> {
        let guard = self.state.lock();
        if matches!(&*guard.borrow(), State::Closed) {
            debug!("opening group enumeration cursor");
            let rows = self.connector.connect()?.into_rows()?;
            *guard.borrow_mut() = State::Open(rows);
        }
        Ok(())
    }

    /// Packs the next record into `buf`. `Ok(None)` is end-of-data, which
    /// leaves the session open — closing is the caller's decision.
    ///
    /// A closed session is opened first. When the record does not fit, it is
    /// kept as pending and the cursor does not advance: the call is
    /// idempotent under retries with growing buffers.
    ///
    /// # Errors
    /// - [`LookupError::Capacity`]: `buf` is too small and untouched; retry
    ///   with a larger buffer to receive the same record.
    /// - [`LookupError::Unavailable`]: the source failed; the session has
    ///   been reset to closed and the next fetch starts over.
    pub fn fetch_next<'buf>(
        &self,
        buf: &'buf mut [u8],
    ) -> Result<Option<PackedGroup<'buf>>, LookupError> {
        let guard = self.state.lock();
        if matches!(&*guard.borrow(), State::Closed) {
            // Reentrant acquire on behalf of this same call.
            self.open()?;
        }
        match guard.take() {
            State::Pending { rows, record } => match PackedGroup::pack(&record, buf) {
                Ok(view) => {
                    guard.replace(State::Open(rows));
                    Ok(Some(view))
                }
                Err(short) => {
                    guard.replace(State::Pending { rows, record });
                    Err(short.into())
                }
            },
            State::Open(mut rows) => match rows.step() {
                Ok(Some(record)) => {
                    debug!(gid = record.gid(), name = record.name(), "fetched group row");
                    match PackedGroup::pack(&record, buf) {
                        Ok(view) => {
                            guard.replace(State::Open(rows));
                            Ok(Some(view))
                        }
                        Err(short) => {
                            guard.replace(State::Pending { rows, record });
                            Err(short.into())
                        }
                    }
                }
                Ok(None) => {
                    guard.replace(State::Open(rows));
                    Ok(None)
                }
                Err(cause) => {
                    // The cursor is gone; the take() above already left the
                    // session closed.
                    error!(%cause, "group enumeration step failed");
                    Err(cause.into())
                }
            },
            State::Closed => unreachable!("open() left the session open while the lock is held"),
        }
    }

    /// Releases the cursor and discards any pending record. Idempotent.
    pub fn close(&self) {
        let guard = self.state.lock();
        if !matches!(&*guard.borrow(), State::Closed) {
            debug!("closing group enumeration cursor");
        }
        *guard.borrow_mut() = State::Closed;
    }
}
