//! The record-source collaborator seam.
//!
//! The backing store owns query execution and cursor mechanics; this crate
//! only consumes rows through these traits. One connection serves either a
//! handful of one-shot fetches or, via [`RecordSource::into_rows`], becomes
//! an enumerate-all cursor that owns the connection until dropped — the
//! enumeration session stores that cursor across calls.

use std::ops::ControlFlow;

use crate::error::Unavailable;
use crate::group_record::{Gid, GroupRecord};

/// Opens private connections to the backing record store.
///
/// Each one-shot lookup and each enumeration cursor gets its own connection;
/// nothing is shared between calls.
pub trait Connect {
    /// The connected source type.
    type Source: RecordSource;

    /// Opens one connection.
    ///
    /// # Errors
    /// [`Unavailable`] when the store cannot be reached.
    fn connect(&self) -> Result<Self::Source, Unavailable>;
}

/// One open connection to the backing record store.
///
/// All errors are [`Unavailable`]; "no matching row" is `Ok(None)` or an
/// empty list, never an error.
pub trait RecordSource {
    /// Cursor over all group records, in the source's native order.
    type Rows: RecordCursor;

    /// Fetches the group named `name`.
    ///
    /// # Errors
    /// [`Unavailable`] on backend failure.
    fn group_by_name(&mut self, name: &str) -> Result<Option<GroupRecord>, Unavailable>;

    /// Fetches the group with id `gid`.
    ///
    /// # Errors
    /// [`Unavailable`] on backend failure.
    fn group_by_gid(&mut self, gid: Gid) -> Result<Option<GroupRecord>, Unavailable>;

    /// Member names of group `gid` in source order; empty when the group is
    /// unknown or has no members.
    ///
    /// # Errors
    /// [`Unavailable`] on backend failure.
    fn members_of(&mut self, gid: Gid) -> Result<Vec<String>, Unavailable>;

    /// Streams the supplementary group ids of `user`, excluding `primary`.
    /// The visitor may break to stop the scan early.
    ///
    /// # Errors
    /// [`Unavailable`] on backend failure.
    fn for_each_gid_of_user(
        &mut self,
        user: &str,
        primary: Gid,
        visit: &mut dyn FnMut(Gid) -> ControlFlow<()>,
    ) -> Result<(), Unavailable>;

    /// Turns the connection into an enumerate-all cursor.
    ///
    /// # Errors
    /// [`Unavailable`] when the cursor cannot be prepared.
    fn into_rows(self) -> Result<Self::Rows, Unavailable>
    where
        Self: Sized;
}

/// Stepping cursor over group records.
pub trait RecordCursor {
    /// Advances one row. `Ok(None)` is end-of-data.
    ///
    /// # Errors
    /// [`Unavailable`] on backend failure; the cursor should be discarded.
    fn step(&mut self) -> Result<Option<GroupRecord>, Unavailable>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory record source used by the session and façade tests.

    use std::ops::ControlFlow;
    use std::sync::Arc;

    use super::{Connect, RecordCursor, RecordSource};
    use crate::error::Unavailable;
    use crate::group_record::{Gid, GroupRecord};

    #[derive(Clone, Default)]
    pub(crate) struct MemoryConnector {
        pub(crate) groups: Arc<Vec<GroupRecord>>,
        pub(crate) user_gids: Arc<Vec<(String, Gid)>>,
        pub(crate) refuse_connections: bool,
        pub(crate) fail_step_at: Option<usize>,
    }

    impl MemoryConnector {
        pub(crate) fn with_groups(groups: Vec<GroupRecord>) -> Self {
            Self {
                groups: Arc::new(groups),
                ..Self::default()
            }
        }
    }

    impl Connect for MemoryConnector {
        type Source = MemorySource;

        fn connect(&self) -> Result<MemorySource, Unavailable> {
            if self.refuse_connections {
                return Err(Unavailable::new("connection refused"));
            }
            Ok(MemorySource {
                groups: Arc::clone(&self.groups),
                user_gids: Arc::clone(&self.user_gids),
                fail_step_at: self.fail_step_at,
            })
        }
    }

    pub(crate) struct MemorySource {
        groups: Arc<Vec<GroupRecord>>,
        user_gids: Arc<Vec<(String, Gid)>>,
        fail_step_at: Option<usize>,
    }

    impl RecordSource for MemorySource {
        type Rows = MemoryRows;

        fn group_by_name(&mut self, name: &str) -> Result<Option<GroupRecord>, Unavailable> {
            Ok(self.groups.iter().find(|g| g.name() == name).cloned())
        }

        fn group_by_gid(&mut self, gid: Gid) -> Result<Option<GroupRecord>, Unavailable> {
            Ok(self.groups.iter().find(|g| g.gid() == gid).cloned())
        }

        fn members_of(&mut self, gid: Gid) -> Result<Vec<String>, Unavailable> {
            Ok(self
                .groups
                .iter()
                .find(|g| g.gid() == gid)
                .map(|g| g.members().to_vec())
                .unwrap_or_default())
        }

        fn for_each_gid_of_user(
            &mut self,
            user: &str,
            primary: Gid,
            visit: &mut dyn FnMut(Gid) -> ControlFlow<()>,
        ) -> Result<(), Unavailable> {
            for (candidate, gid) in self.user_gids.iter() {
                if candidate == user && *gid != primary && visit(*gid).is_break() {
                    break;
                }
            }
            Ok(())
        }

        fn into_rows(self) -> Result<MemoryRows, Unavailable> {
            Ok(MemoryRows {
                groups: self.groups,
                at: 0,
                fail_step_at: self.fail_step_at,
            })
        }
    }

    pub(crate) struct MemoryRows {
        groups: Arc<Vec<GroupRecord>>,
        at: usize,
        fail_step_at: Option<usize>,
    }

    impl RecordCursor for MemoryRows {
        fn step(&mut self) -> Result<Option<GroupRecord>, Unavailable> {
            if self.fail_step_at == Some(self.at) {
                return Err(Unavailable::new("cursor lost"));
            }
            let row = self.groups.get(self.at).cloned();
            if row.is_some() {
                self.at += 1;
            }
            Ok(row)
        }
    }
}
