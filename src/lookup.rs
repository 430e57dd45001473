//! One-shot, stateless lookups.
//!
//! Each operation opens its own record-source connection, fetches, packs
//! into the caller's buffer, and drops the connection on every exit path.
//! Nothing here touches the enumeration session's shared state.

use std::ops::ControlFlow;

use tracing::debug;

use crate::error::{CollectError, LookupError};
use crate::gid_list::GidList;
use crate::group_record::Gid;
use crate::packed::{PackedGroup, PackedMembers};
use crate::source::{Connect, RecordSource};

/// Looks up a group by name and packs it into `buf`.
///
/// `Ok(None)` when no group has that name — not an error.
///
/// # Errors
/// - [`LookupError::Unavailable`]: the source could not be reached or the
///   query failed.
/// - [`LookupError::Capacity`]: `buf` is too small and untouched; retry with
///   a larger buffer.
///
/// # Examples
/// ```no_run
/// # #[cfg(feature = "sqlite")]
/// # fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// use group_identity::{group_by_name, sqlite::SqliteConnector};
///
/// let connector = SqliteConnector::new("/var/db/group.db");
/// let mut buf = vec![0u8; 1024];
/// if let Some(group) = group_by_name(&connector, "wheel", &mut buf)? {
///     println!("wheel has gid {}", group.gid());
/// }
/// # Ok(())
/// # }
/// ```
pub fn group_by_name<'buf, C: Connect>(
    connector: &C,
    name: &str,
    buf: &'buf mut [u8],
) -> Result<Option<PackedGroup<'buf>>, LookupError> {
    debug!(name, "looking up group by name");
    let mut source = connector.connect()?;
    match source.group_by_name(name)? {
        Some(record) => Ok(Some(PackedGroup::pack(&record, buf)?)),
        None => Ok(None),
    }
}

/// Looks up a group by numeric id and packs it into `buf`.
///
/// `Ok(None)` when no group has that id.
///
/// # Errors
/// As [`group_by_name`].
pub fn group_by_gid<'buf, C: Connect>(
    connector: &C,
    gid: Gid,
    buf: &'buf mut [u8],
) -> Result<Option<PackedGroup<'buf>>, LookupError> {
    debug!(gid, "looking up group by gid");
    let mut source = connector.connect()?;
    match source.group_by_gid(gid)? {
        Some(record) => Ok(Some(PackedGroup::pack(&record, buf)?)),
        None => Ok(None),
    }
}

/// Packs the member list of group `gid` into `buf`.
///
/// A group with no rows packs as the zero-member table (one null slot) —
/// an unknown gid is indistinguishable from an empty group here, matching
/// the member-list contract.
///
/// # Errors
/// As [`group_by_name`].
pub fn group_members<'buf, C: Connect>(
    connector: &C,
    gid: Gid,
    buf: &'buf mut [u8],
) -> Result<PackedMembers<'buf>, LookupError> {
    debug!(gid, "looking up group members");
    let mut source = connector.connect()?;
    let members = source.members_of(gid)?;
    Ok(PackedMembers::pack(&members, buf)?)
}

/// Collects the supplementary group ids of `user` into `list`,
/// initgroups-style. The user's primary gid is excluded at the query. On
/// success the list is compacted to its logical length.
///
/// # Errors
/// - [`CollectError::Unavailable`]: the source could not be reached.
/// - [`CollectError::Limit`]: the list hit its ceiling; ids collected so far
///   remain in the list, and the caller retries the whole call with a
///   larger ceiling.
pub fn groups_for_user<C: Connect>(
    connector: &C,
    user: &str,
    primary: Gid,
    list: &mut GidList,
) -> Result<(), CollectError> {
    debug!(user, primary, "collecting supplementary groups");
    let mut source = connector.connect()?;
    let mut hit_limit = None;
    source.for_each_gid_of_user(user, primary, &mut |gid| match list.push(gid) {
        Ok(()) => ControlFlow::Continue(()),
        Err(limit) => {
            hit_limit = Some(limit);
            ControlFlow::Break(())
        }
    })?;
    match hit_limit {
        Some(limit) => Err(limit.into()),
        None => {
            list.compact();
            Ok(())
        }
    }
}
