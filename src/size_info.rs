//! Size accounting for the packed layouts.
//!
//! Every capacity decision happens here, before a single byte is written:
//! the packer compares [`required_capacity`] against the caller's buffer and
//! refuses whole layouts that do not fit. Discovering a shortfall mid-copy
//! would leave earlier entries behind, which the packing contract forbids.
//!
//! [`required_capacity`]: MemberListSize::required_capacity

/// Width in bytes of one offset-table slot (one native word).
pub const SLOT_SIZE: usize = size_of::<usize>();

/// Slots preceding the member table in a whole-record layout:
/// gid, name offset, password offset.
pub(crate) const HEADER_SLOTS: usize = 3;

/// Size accounting for a packed member list: the offset table (member count
/// plus the terminator slot) and the NUL-terminated string region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberListSize {
    count: usize,
    string_bytes: usize,
}

impl MemberListSize {
    /// Totals the layout for `members`. `None` on arithmetic overflow, which
    /// no list that fits in memory can trigger.
    #[must_use]
    pub fn from_members<S: AsRef<str>>(members: &[S]) -> Option<Self> {
        let mut string_bytes = 0usize;
        for member in members {
            string_bytes = string_bytes
                .checked_add(member.as_ref().len())?
                .checked_add(1)?;
        }
        Some(Self {
            count: members.len(),
            string_bytes,
        })
    }

    /// Number of member strings.
    #[inline]
    #[must_use]
    pub const fn member_count(self) -> usize {
        self.count
    }

    /// Bytes of the string region, one terminator per member included.
    #[inline]
    #[must_use]
    pub const fn string_bytes(self) -> usize {
        self.string_bytes
    }

    /// Bytes of the offset table, terminator slot included.
    #[inline]
    #[must_use]
    pub const fn table_size(self) -> usize {
        (self.count + 1) * SLOT_SIZE
    }

    /// Total buffer capacity a member-list layout needs.
    ///
    /// # Examples
    /// ```rust
    /// use group_identity::{MemberListSize, SLOT_SIZE};
    ///
    /// let size = MemberListSize::from_members(&["alice", "bob"]).unwrap();
    /// assert_eq!(size.required_capacity(), 3 * SLOT_SIZE + 6 + 4);
    ///
    /// // The empty list still needs its terminator slot.
    /// let empty = MemberListSize::from_members::<&str>(&[]).unwrap();
    /// assert_eq!(empty.required_capacity(), SLOT_SIZE);
    /// ```
    #[inline]
    #[must_use]
    pub const fn required_capacity(self) -> usize {
        self.table_size() + self.string_bytes
    }
}

/// Size accounting for a whole packed group record: header slots, member
/// table, and the string region holding name, password, and members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRecordSize {
    members: MemberListSize,
    name_bytes: usize,
    passwd_bytes: usize,
}

impl GroupRecordSize {
    /// Totals the layout for `record`. `None` on arithmetic overflow.
    #[must_use]
    pub fn from_record(record: &crate::GroupRecord) -> Option<Self> {
        let members = MemberListSize::from_members(record.members())?;
        let name_bytes = record.name().len().checked_add(1)?;
        let passwd_bytes = match record.passwd() {
            Some(passwd) => passwd.len().checked_add(1)?,
            None => 0,
        };
        Some(Self {
            members,
            name_bytes,
            passwd_bytes,
        })
    }

    /// Size accounting of the embedded member list.
    #[inline]
    #[must_use]
    pub const fn members(self) -> MemberListSize {
        self.members
    }

    /// Total buffer capacity a whole-record layout needs.
    #[inline]
    #[must_use]
    pub const fn required_capacity(self) -> usize {
        HEADER_SLOTS * SLOT_SIZE
            + self.members.required_capacity()
            + self.name_bytes
            + self.passwd_bytes
    }
}
