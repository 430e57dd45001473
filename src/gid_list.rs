//! Bounded, grow-on-demand accumulation of numeric group ids.

use crate::error::InsufficientLimit;
use crate::group_record::Gid;

/// Next allocation size under the doubling-with-ceiling policy.
///
/// Unbounded lists double; bounded lists double but clamp to the ceiling.
/// `None` means the ceiling has been reached and no further growth is
/// possible. Callers depend on this exact capacity sequence, so the policy
/// lives in one pure function.
///
/// # Examples
/// ```rust
/// use group_identity::next_capacity;
///
/// assert_eq!(next_capacity(4, None), Some(8));
/// assert_eq!(next_capacity(4, Some(6)), Some(6));
/// assert_eq!(next_capacity(6, Some(6)), None);
/// ```
#[inline]
#[must_use]
pub const fn next_capacity(current: usize, ceiling: Option<usize>) -> Option<usize> {
    let doubled = current.saturating_mul(2);
    match ceiling {
        None => Some(doubled),
        Some(limit) if current < limit => Some(if doubled < limit { doubled } else { limit }),
        Some(_) => None,
    }
}

/// Grow-on-demand id list with an explicit capacity and an optional ceiling.
///
/// Unlike `Vec`, the allocated size is part of the contract: it starts at
/// the caller's chosen capacity, grows by [`next_capacity`] exactly when a
/// write finds the array full, and shrinks to the logical length when the
/// collection is [`compact`]ed. The ceiling is checked only when a write
/// would exceed it — a list whose capacity lands exactly on the ceiling
/// with no further ids to store completes normally.
///
/// # Examples
/// ```rust
/// use group_identity::GidList;
///
/// let mut list = GidList::new(2, Some(4));
/// for gid in [10, 20, 30, 40] {
///     list.push(gid).unwrap();
/// }
/// assert_eq!(list.capacity(), 4);
/// assert!(list.push(50).is_err()); // ceiling reached, nothing written
/// assert_eq!(list.as_slice(), [10, 20, 30, 40]);
/// ```
///
/// [`compact`]: GidList::compact
#[derive(Debug, Clone)]
pub struct GidList {
    ids: Vec<Gid>,
    len: usize,
    ceiling: Option<usize>,
}

impl GidList {
    /// Empty list with `capacity` allocated slots (at least one — a
    /// zero-slot array could never grow by doubling).
    #[inline]
    #[must_use]
    pub fn new(capacity: usize, ceiling: Option<usize>) -> Self {
        Self::resume(vec![0; capacity.max(1)], 0, ceiling)
    }

    /// Adopts a partially filled array whose first `len` slots were
    /// populated by an earlier collector (initgroups-style chaining).
    #[must_use]
    pub fn resume(mut ids: Vec<Gid>, len: usize, ceiling: Option<usize>) -> Self {
        if ids.is_empty() {
            ids.push(0);
        }
        let len = len.min(ids.len());
        Self { ids, len, ceiling }
    }

    /// Appends `gid`, growing the array first when it is full.
    ///
    /// # Errors
    /// [`InsufficientLimit`] when the array is full and already at its
    /// ceiling; `gid` is not written and the list is unchanged.
    pub fn push(&mut self, gid: Gid) -> Result<(), InsufficientLimit> {
        if self.len == self.ids.len() {
            // A compacted-empty list regrows from one slot.
            match next_capacity(self.ids.len().max(1), self.ceiling) {
                Some(grown) => self.ids.resize(grown, 0),
                None => {
                    return Err(InsufficientLimit {
                        limit: self.ceiling.unwrap_or_else(|| self.ids.len()),
                    });
                }
            }
        }
        #[expect(
            clippy::indexing_slicing,
            reason = "growth above guarantees a free slot at len"
        )]
        {
            self.ids[self.len] = gid;
        }
        self.len += 1;
        Ok(())
    }

    /// Number of ids stored.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// `true` when no ids are stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated slots, occupied or not.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ids.len()
    }

    /// The ceiling, when one is set.
    #[inline]
    #[must_use]
    pub const fn ceiling(&self) -> Option<usize> {
        self.ceiling
    }

    /// The stored ids, in arrival order.
    #[inline]
    #[must_use]
    #[expect(
        clippy::indexing_slicing,
        reason = "len never exceeds the allocated slots"
    )]
    pub fn as_slice(&self) -> &[Gid] {
        &self.ids[..self.len]
    }

    /// Drops the trailing slack so the capacity equals the logical length.
    #[inline]
    pub fn compact(&mut self) {
        self.ids.truncate(self.len);
        self.ids.shrink_to_fit();
    }

    /// Consumes the list, returning the ids with no trailing slack.
    #[inline]
    #[must_use]
    pub fn into_ids(mut self) -> Vec<Gid> {
        self.compact();
        self.ids
    }
}
