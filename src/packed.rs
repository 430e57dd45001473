//! Packed group layouts inside caller-owned buffers.
//!
//! A packed member list is an offset table followed by a string region, all
//! inside one contiguous caller buffer:
//!
//! ```text
//! | off(m0) | off(m1) | ... | 0 | m0 NUL m1 NUL ... |
//! ```
//!
//! The table has one native-word slot per member plus a final zero slot, the
//! list terminator. Each populated slot holds the byte offset of its string
//! within the buffer; the strings sit back-to-back, each NUL-terminated. A
//! whole-record layout prepends three header slots (gid, name offset,
//! password offset — zero when the source stores no password) and lays the
//! name and password strings out before the member strings.
//!
//! Packing is all-or-nothing. The required capacity comes from
//! [`crate::size_info`] before the first write; a buffer that cannot hold
//! the complete layout is returned byte-for-byte untouched together with
//! [`InsufficientCapacity`].
//!
//! Read-back decodes the layout bytes rather than trusting cached fields, so
//! a view recovered from a packed buffer is exactly what the buffer says.
//! Offsets, not addresses, keep the layout position-independent: slot `i`
//! bounds string `i`, and the next offset in layout order (or the end of the
//! packed region) bounds its terminator.

use crate::error::InsufficientCapacity;
use crate::group_record::{Gid, GroupRecord};
use crate::size_info::{GroupRecordSize, HEADER_SLOTS, MemberListSize, SLOT_SIZE};

#[expect(
    clippy::indexing_slicing,
    reason = "callers establish the full layout capacity before any slot write"
)]
fn write_slot(buf: &mut [u8], slot: usize, value: usize) {
    let at = slot * SLOT_SIZE;
    buf[at..at + SLOT_SIZE].copy_from_slice(&value.to_ne_bytes());
}

#[expect(
    clippy::indexing_slicing,
    reason = "views only read slots inside the packed region they were built over"
)]
fn read_slot(buf: &[u8], slot: usize) -> usize {
    let at = slot * SLOT_SIZE;
    let mut raw = [0u8; SLOT_SIZE];
    raw.copy_from_slice(&buf[at..at + SLOT_SIZE]);
    usize::from_ne_bytes(raw)
}

#[expect(
    clippy::indexing_slicing,
    reason = "callers establish the full layout capacity before any string write"
)]
fn write_str(buf: &mut [u8], at: usize, s: &str) -> usize {
    let end = at + s.len();
    buf[at..end].copy_from_slice(s.as_bytes());
    buf[end] = 0;
    end + 1
}

/// Writes the offset table starting at `first_slot` and the member strings
/// starting at `cursor`; returns the byte offset past the last terminator.
fn write_table<S: AsRef<str>>(
    buf: &mut [u8],
    first_slot: usize,
    strings: &[S],
    mut cursor: usize,
) -> usize {
    for (index, string) in strings.iter().enumerate() {
        write_slot(buf, first_slot + index, cursor);
        cursor = write_str(buf, cursor, string.as_ref());
    }
    write_slot(buf, first_slot + strings.len(), 0);
    cursor
}

/// Decodes the string occupying `[start, end)` of the packed region.
fn str_between(buf: &[u8], start: usize, end: usize) -> &str {
    // The packer wrote these exact bounds; anything else decodes as empty
    // and fails the caller's comparison instead of panicking.
    buf.get(start..end)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .unwrap_or_default()
}

/// Read view of a packed member list.
///
/// Produced by [`PackedMembers::pack`] over a member-only layout, or by
/// [`PackedGroup::members`] over the member table embedded in a whole-record
/// layout. Borrows the packed region of the caller's buffer; every accessor
/// decodes the layout bytes.
///
/// # Examples
/// ```rust
/// use group_identity::PackedMembers;
///
/// let mut buf = vec![0u8; 256];
/// let packed = PackedMembers::pack(&["alice", "bob"], &mut buf).unwrap();
/// assert_eq!(packed.len(), 2);
/// assert_eq!(packed.get(0), Some("alice"));
/// assert_eq!(packed.iter().collect::<Vec<_>>(), ["alice", "bob"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PackedMembers<'buf> {
    buf: &'buf [u8],
    first_slot: usize,
    count: usize,
}

impl<'buf> PackedMembers<'buf> {
    /// Packs `members` into `buf` as an offset table plus string region.
    ///
    /// # Errors
    /// [`InsufficientCapacity`] when `buf` cannot hold the complete layout;
    /// `buf` is left untouched.
    pub fn pack<S: AsRef<str>>(
        members: &[S],
        buf: &'buf mut [u8],
    ) -> Result<Self, InsufficientCapacity> {
        let Some(size) = MemberListSize::from_members(members) else {
            // A list whose byte total overflows usize can never fit.
            return Err(InsufficientCapacity {
                required: usize::MAX,
                capacity: buf.len(),
            });
        };
        let required = size.required_capacity();
        if buf.len() < required {
            return Err(InsufficientCapacity {
                required,
                capacity: buf.len(),
            });
        }
        let end = write_table(buf, 0, members, size.table_size());
        debug_assert_eq!(end, required, "size accounting must match bytes written");
        let packed: &'buf [u8] = buf;
        Ok(Self {
            buf: &packed[..required],
            first_slot: 0,
            count: members.len(),
        })
    }

    /// Number of members in the table (the terminator slot excluded).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// `true` when the table holds only the terminator slot.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Length in bytes of the packed region backing this view.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.buf.len()
    }

    /// The member at `index`, decoded from the layout; `None` past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'buf str> {
        if index >= self.count {
            return None;
        }
        let start = read_slot(self.buf, self.first_slot + index);
        // The next string's offset (or the end of the packed region) bounds
        // this one; the byte before it is the terminator.
        let after = if index + 1 < self.count {
            read_slot(self.buf, self.first_slot + index + 1)
        } else {
            self.buf.len()
        };
        Some(str_between(self.buf, start, after.saturating_sub(1)))
    }

    /// Iterates the members in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'buf str> {
        let view = *self;
        (0..view.count).filter_map(move |index| view.get(index))
    }
}

/// Read view of a whole packed group record.
///
/// Layout order: gid slot, name-offset slot, password-offset slot, member
/// table, then the string region (name, password, members).
///
/// # Examples
/// ```rust
/// use group_identity::{GroupRecord, PackedGroup};
///
/// let record = GroupRecord::new("dev", 100, None, ["alice", "bob"]);
/// let mut buf = vec![0u8; 256];
/// let packed = PackedGroup::pack(&record, &mut buf).unwrap();
/// assert_eq!(packed.gid(), 100);
/// assert_eq!(packed.name(), "dev");
/// assert_eq!(packed.members().iter().collect::<Vec<_>>(), ["alice", "bob"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PackedGroup<'buf> {
    buf: &'buf [u8],
    member_count: usize,
}

impl<'buf> PackedGroup<'buf> {
    const GID_SLOT: usize = 0;
    const NAME_SLOT: usize = 1;
    const PASSWD_SLOT: usize = 2;

    /// Packs the whole record into `buf`.
    ///
    /// # Errors
    /// [`InsufficientCapacity`] when `buf` cannot hold the complete layout;
    /// `buf` is left untouched.
    pub fn pack(
        record: &GroupRecord,
        buf: &'buf mut [u8],
    ) -> Result<Self, InsufficientCapacity> {
        let Some(size) = GroupRecordSize::from_record(record) else {
            return Err(InsufficientCapacity {
                required: usize::MAX,
                capacity: buf.len(),
            });
        };
        let required = size.required_capacity();
        if buf.len() < required {
            return Err(InsufficientCapacity {
                required,
                capacity: buf.len(),
            });
        }
        let count = record.members().len();
        write_slot(buf, Self::GID_SLOT, record.gid() as usize);
        let mut cursor = HEADER_SLOTS * SLOT_SIZE + size.members().table_size();
        write_slot(buf, Self::NAME_SLOT, cursor);
        cursor = write_str(buf, cursor, record.name());
        match record.passwd() {
            Some(passwd) => {
                write_slot(buf, Self::PASSWD_SLOT, cursor);
                cursor = write_str(buf, cursor, passwd);
            }
            None => write_slot(buf, Self::PASSWD_SLOT, 0),
        }
        let end = write_table(buf, HEADER_SLOTS, record.members(), cursor);
        debug_assert_eq!(end, required, "size accounting must match bytes written");
        let packed: &'buf [u8] = buf;
        Ok(Self {
            buf: &packed[..required],
            member_count: count,
        })
    }

    /// Length in bytes of the packed region.
    #[inline]
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.buf.len()
    }

    /// The numeric group id, decoded from its header slot.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the slot was written from a Gid"
    )]
    pub fn gid(&self) -> Gid {
        read_slot(self.buf, Self::GID_SLOT) as Gid
    }

    /// The group name, decoded from the string region.
    #[must_use]
    pub fn name(&self) -> &'buf str {
        let start = read_slot(self.buf, Self::NAME_SLOT);
        str_between(self.buf, start, self.after_name().saturating_sub(1))
    }

    /// The password field, or `None` when its offset slot is null.
    #[must_use]
    pub fn passwd(&self) -> Option<&'buf str> {
        let start = read_slot(self.buf, Self::PASSWD_SLOT);
        if start == 0 {
            return None;
        }
        let after = if self.member_count > 0 {
            read_slot(self.buf, HEADER_SLOTS)
        } else {
            self.buf.len()
        };
        Some(str_between(self.buf, start, after.saturating_sub(1)))
    }

    /// View of the embedded member table.
    #[inline]
    #[must_use]
    pub const fn members(&self) -> PackedMembers<'buf> {
        PackedMembers {
            buf: self.buf,
            first_slot: HEADER_SLOTS,
            count: self.member_count,
        }
    }

    /// Offset one past the name's terminator: the password offset when a
    /// password follows, else the first member offset, else the region end.
    fn after_name(&self) -> usize {
        let passwd = read_slot(self.buf, Self::PASSWD_SLOT);
        if passwd != 0 {
            return passwd;
        }
        if self.member_count > 0 {
            return read_slot(self.buf, HEADER_SLOTS);
        }
        self.buf.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
#[allow(clippy::expect_used, reason = "Expect is not an issue in test")]
pub(crate) mod test {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn arb_record() -> impl Strategy<Value = GroupRecord> {
        (
            "[a-z][a-z0-9]{0,11}",
            any::<Gid>(),
            proptest::option::of("[a-z!*]{0,8}"),
            proptest::collection::vec("[a-z][a-z0-9]{0,11}", 0..6),
        )
            .prop_map(|(name, gid, passwd, members)| GroupRecord::new(name, gid, passwd, members))
    }

    fn sentinel_buf(len: usize) -> Vec<u8> {
        vec![0xAB; len]
    }

    #[test]
    fn zero_members_packs_into_one_slot() {
        let mut buf = sentinel_buf(SLOT_SIZE);
        let packed = PackedMembers::pack::<&str>(&[], &mut buf).expect("terminator slot fits");
        assert_eq!(packed.len(), 0);
        assert!(packed.is_empty());
        assert_eq!(packed.byte_len(), SLOT_SIZE);
        assert_eq!(packed.get(0), None);
        // The terminator slot is null.
        assert_eq!(read_slot(&buf, 0), 0);
    }

    #[test]
    fn two_members_pack_at_exact_capacity() {
        let required = 3 * SLOT_SIZE + "alice".len() + 1 + "bob".len() + 1;
        let mut buf = sentinel_buf(required);
        let packed = PackedMembers::pack(&["alice", "bob"], &mut buf).expect("exact fit");
        assert_eq!(packed.get(0), Some("alice"));
        assert_eq!(packed.get(1), Some("bob"));
        assert_eq!(packed.get(2), None);
        assert_eq!(packed.byte_len(), required);
        assert_eq!(read_slot(&buf, 2), 0);
    }

    #[test]
    fn one_byte_short_leaves_buffer_untouched() {
        let required = 3 * SLOT_SIZE + "alice".len() + 1 + "bob".len() + 1;
        let mut buf = sentinel_buf(required - 1);
        let err = PackedMembers::pack(&["alice", "bob"], &mut buf).unwrap_err();
        assert_eq!(err.required, required);
        assert_eq!(err.capacity, required - 1);
        assert!(buf.iter().all(|&b| b == 0xAB), "no partial write may remain");
    }

    #[test]
    fn whole_record_capacity_error_reports_required() {
        let record = GroupRecord::new("dev", 100, Some("x".to_owned()), ["alice"]);
        let required = GroupRecordSize::from_record(&record)
            .unwrap()
            .required_capacity();
        let mut buf = sentinel_buf(required - 1);
        let err = PackedGroup::pack(&record, &mut buf).unwrap_err();
        assert_eq!(err.required, required);
        assert!(buf.iter().all(|&b| b == 0xAB), "no partial write may remain");
    }

    proptest! {
        #[test]
        fn round_trips_at_exact_capacity(record in arb_record()) {
            let required = GroupRecordSize::from_record(&record)
                .unwrap()
                .required_capacity();
            let mut buf = sentinel_buf(required);
            let packed = PackedGroup::pack(&record, &mut buf).unwrap();
            prop_assert_eq!(packed.byte_len(), required);
            prop_assert_eq!(packed.gid(), record.gid());
            prop_assert_eq!(packed.name(), record.name());
            prop_assert_eq!(packed.passwd(), record.passwd());
            let members: Vec<&str> = packed.members().iter().collect();
            prop_assert_eq!(members, record.members().iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn round_trips_with_slack(record in arb_record(), slack in 1usize..64) {
            let required = GroupRecordSize::from_record(&record)
                .unwrap()
                .required_capacity();
            let mut buf = sentinel_buf(required + slack);
            let packed = PackedGroup::pack(&record, &mut buf).unwrap();
            prop_assert_eq!(packed.byte_len(), required);
            prop_assert_eq!(packed.name(), record.name());
        }

        #[test]
        fn short_buffers_stay_byte_identical(record in arb_record(), shortfall in 1usize..32) {
            let required = GroupRecordSize::from_record(&record)
                .unwrap()
                .required_capacity();
            let capacity = required.saturating_sub(shortfall);
            let mut buf = sentinel_buf(capacity);
            prop_assert!(PackedGroup::pack(&record, &mut buf).is_err());
            prop_assert!(buf.iter().all(|&b| b == 0xAB));
        }

        #[test]
        fn member_order_is_preserved(members in proptest::collection::vec("[a-z]{1,10}", 0..8)) {
            let size = MemberListSize::from_members(&members).unwrap();
            let mut buf = sentinel_buf(size.required_capacity());
            let packed = PackedMembers::pack(&members, &mut buf).unwrap();
            let back: Vec<&str> = packed.iter().collect();
            prop_assert_eq!(back, members.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }
}
