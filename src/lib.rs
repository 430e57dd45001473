//! # Group identity lookups over caller-owned buffers
//!
//! Building blocks for resolving group identity records (name, numeric id,
//! member list) from a queryable backing store on behalf of OS-level
//! identity lookups — the kind of caller that hands over a fixed-capacity
//! buffer and retries with a bigger one when told to. The crate provides:
//! - [`GroupRecord`]: an owned record as fetched from the store.
//! - [`PackedMembers`] / [`PackedGroup`]: a member list (or a whole record)
//!   laid out inside one caller buffer as an offset table plus NUL-terminated
//!   strings, written all-or-nothing.
//! - [`GidList`]: grow-on-demand id accumulation with an explicit capacity
//!   sequence and an optional ceiling (initgroups-style).
//! - [`GroupEnumerator`]: the process-wide open/fetch-next/close session,
//!   serialized by a reentrant lock, that survives "buffer too small"
//!   retries without losing its place.
//! - [`group_by_name`], [`group_by_gid`], [`group_members`],
//!   [`groups_for_user`]: stateless one-shot lookups.
//!
//! ## Buffer protocol
//!
//! Every packing operation either fills the caller's buffer completely or
//! reports [`InsufficientCapacity`] and leaves the buffer byte-for-byte
//! untouched. The error carries the exact requirement, but callers may just
//! as well grow by doubling:
//!
//! ```rust
//! use group_identity::{GroupRecord, PackedGroup};
//!
//! let record = GroupRecord::new("dev", 100, None, ["alice", "bob"]);
//! let mut buf = vec![0u8; 16];
//! let needed = match PackedGroup::pack(&record, &mut buf) {
//!     Err(short) => short.required,
//!     Ok(_) => unreachable!("16 bytes cannot hold this record"),
//! };
//! buf.resize(needed, 0);
//! let packed = PackedGroup::pack(&record, &mut buf).expect("exact fit");
//! assert_eq!(packed.name(), "dev");
//! assert_eq!(packed.members().iter().collect::<Vec<_>>(), ["alice", "bob"]);
//! ```
//!
//! ## Record sources
//!
//! The backing store sits behind the [`Connect`] / [`RecordSource`] /
//! [`RecordCursor`] traits; query execution, transport, and authentication
//! are its business, not this crate's. An SQLite implementation ships in
//! [`sqlite`] behind the `sqlite` feature (on by default).
//!
//! ## Concurrency
//!
//! Lookups are stateless and lock-free: each call owns a private connection
//! from open to drop. The enumeration session is the one shared resource;
//! all of its operations run under a single reentrant mutex, so it can be
//! stored in a `static` and used from any thread.
//!
//! ## Features
//! - `sqlite` *(default)*: the [`sqlite`] record source (rusqlite, bundled).
//! - `serde`: `Serialize`/`Deserialize` for [`GroupRecord`].

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]

mod enumerator;
mod error;
mod gid_list;
mod group_record;
mod lookup;
mod packed;
mod size_info;
mod source;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use enumerator::GroupEnumerator;
pub use error::{CollectError, InsufficientCapacity, InsufficientLimit, LookupError, Unavailable};
pub use gid_list::{GidList, next_capacity};
pub use group_record::{Gid, GroupRecord};
pub use lookup::{group_by_gid, group_by_name, group_members, groups_for_user};
pub use packed::{PackedGroup, PackedMembers};
pub use size_info::{GroupRecordSize, MemberListSize, SLOT_SIZE};
pub use source::{Connect, RecordCursor, RecordSource};
