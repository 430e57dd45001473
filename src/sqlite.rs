//! SQLite-backed record source.
//!
//! ## Schema
//!
//! Two tables, created by [`install_schema`]:
//! - `groups(gid INTEGER PRIMARY KEY, name TEXT UNIQUE, passwd TEXT)`
//! - `group_members(gid, username)` — member order is insertion (rowid)
//!   order, which is the order records come back in.
//!
//! ## Cursoring
//!
//! The enumerate-all cursor steps by rowid keyset: each [`step`] fetches the
//! first `groups` row past the last one delivered. That keeps the cursor an
//! owner of its connection — no prepared statement has to outlive a call —
//! while preserving a stable native order across the session's lifetime.
//!
//! Query-text and connection-string configuration beyond the database path
//! is out of scope here; callers that need a different schema own it.
//!
//! [`step`]: crate::RecordCursor::step

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, error};

use crate::error::Unavailable;
use crate::group_record::{Gid, GroupRecord};
use crate::source::{Connect, RecordCursor, RecordSource};

impl From<rusqlite::Error> for Unavailable {
    #[inline]
    fn from(cause: rusqlite::Error) -> Self {
        Self::new(cause)
    }
}

/// Statements run by [`install_schema`].
const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS groups (
    gid    INTEGER PRIMARY KEY,
    name   TEXT NOT NULL UNIQUE,
    passwd TEXT
);
CREATE TABLE IF NOT EXISTS group_members (
    gid      INTEGER NOT NULL REFERENCES groups(gid) ON DELETE CASCADE,
    username TEXT NOT NULL,
    UNIQUE (gid, username)
);
CREATE INDEX IF NOT EXISTS group_members_by_user ON group_members(username);
";

/// Creates the group tables if absent. Idempotent.
///
/// # Errors
/// Any SQLite failure executing the schema batch.
#[inline]
pub fn install_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Connection factory bound to a database file path.
///
/// # Examples
/// ```no_run
/// use group_identity::Connect;
/// use group_identity::sqlite::SqliteConnector;
///
/// let connector = SqliteConnector::new("/var/db/group.db");
/// let source = connector.connect().expect("database reachable");
/// ```
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    /// Connector for the database at `path`.
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The database path this connector opens.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Connect for SqliteConnector {
    type Source = SqliteSource;

    fn connect(&self) -> Result<SqliteSource, Unavailable> {
        debug!(path = %self.path.display(), "opening record database");
        let conn = Connection::open(&self.path).map_err(|cause| {
            error!(%cause, path = %self.path.display(), "failed to open record database");
            Unavailable::new(cause)
        })?;
        configure(&conn)?;
        Ok(SqliteSource { conn })
    }
}

fn configure(conn: &Connection) -> Result<(), Unavailable> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

/// One open connection to the group database.
pub struct SqliteSource {
    conn: Connection,
}

impl SqliteSource {
    fn fetch_group(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<GroupRecord>, Unavailable> {
        let head = self
            .conn
            .query_row(sql, params, |row| {
                Ok((
                    row.get::<_, Gid>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })
            .optional()?;
        match head {
            Some((gid, name, passwd)) => {
                let members = fetch_members(&self.conn, gid)?;
                Ok(Some(GroupRecord::new(name, gid, passwd, members)))
            }
            None => Ok(None),
        }
    }
}

fn fetch_members(conn: &Connection, gid: Gid) -> Result<Vec<String>, Unavailable> {
    let mut stmt =
        conn.prepare("SELECT username FROM group_members WHERE gid = ?1 ORDER BY rowid")?;
    let rows = stmt.query_map([gid], |row| row.get(0))?;
    let mut members = Vec::new();
    for row in rows {
        members.push(row?);
    }
    Ok(members)
}

impl RecordSource for SqliteSource {
    type Rows = SqliteRows;

    fn group_by_name(&mut self, name: &str) -> Result<Option<GroupRecord>, Unavailable> {
        self.fetch_group("SELECT gid, name, passwd FROM groups WHERE name = ?1", [name])
    }

    fn group_by_gid(&mut self, gid: Gid) -> Result<Option<GroupRecord>, Unavailable> {
        self.fetch_group("SELECT gid, name, passwd FROM groups WHERE gid = ?1", [gid])
    }

    fn members_of(&mut self, gid: Gid) -> Result<Vec<String>, Unavailable> {
        fetch_members(&self.conn, gid)
    }

    fn for_each_gid_of_user(
        &mut self,
        user: &str,
        primary: Gid,
        visit: &mut dyn FnMut(Gid) -> ControlFlow<()>,
    ) -> Result<(), Unavailable> {
        let mut stmt = self.conn.prepare(
            "SELECT gid FROM group_members WHERE username = ?1 AND gid <> ?2 ORDER BY gid",
        )?;
        let rows = stmt.query_map(params![user, primary], |row| row.get::<_, Gid>(0))?;
        for row in rows {
            if visit(row?).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn into_rows(self) -> Result<SqliteRows, Unavailable> {
        Ok(SqliteRows {
            conn: self.conn,
            last_rowid: 0,
        })
    }
}

/// Enumerate-all cursor; owns its connection.
pub struct SqliteRows {
    conn: Connection,
    last_rowid: i64,
}

impl RecordCursor for SqliteRows {
    fn step(&mut self) -> Result<Option<GroupRecord>, Unavailable> {
        let head = self
            .conn
            .query_row(
                "SELECT rowid, gid, name, passwd FROM groups WHERE rowid > ?1 \
                 ORDER BY rowid LIMIT 1",
                [self.last_rowid],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Gid>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;
        match head {
            Some((rowid, gid, name, passwd)) => {
                let members = fetch_members(&self.conn, gid)?;
                self.last_rowid = rowid;
                Ok(Some(GroupRecord::new(name, gid, passwd, members)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Unwrap is not an issue in test")]
#[allow(clippy::expect_used, reason = "Expect is not an issue in test")]
mod test {
    use super::*;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        install_schema(&conn).expect("install schema");
        conn.execute_batch(
            "INSERT INTO groups (gid, name, passwd) VALUES
                 (10, 'wheel', NULL),
                 (100, 'dev', 'x'),
                 (63, 'audio', NULL);
             INSERT INTO group_members (gid, username) VALUES
                 (100, 'carol'),
                 (100, 'alice'),
                 (100, 'bob'),
                 (10, 'root');",
        )
        .expect("seed rows");
        conn
    }

    #[test]
    fn install_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        install_schema(&conn).unwrap();
        install_schema(&conn).unwrap();
    }

    #[test]
    fn finds_groups_by_name_and_gid() {
        let mut source = SqliteSource { conn: seeded() };
        let dev = source.group_by_name("dev").unwrap().unwrap();
        assert_eq!(dev.gid(), 100);
        assert_eq!(dev.passwd(), Some("x"));
        let wheel = source.group_by_gid(10).unwrap().unwrap();
        assert_eq!(wheel.name(), "wheel");
        assert!(source.group_by_name("nosuch").unwrap().is_none());
    }

    #[test]
    fn members_come_back_in_insertion_order() {
        let mut source = SqliteSource { conn: seeded() };
        let members = source.members_of(100).unwrap();
        assert_eq!(members, ["carol", "alice", "bob"]);
        assert!(source.members_of(999).unwrap().is_empty());
    }

    #[test]
    fn user_gids_exclude_the_primary() {
        let conn = seeded();
        conn.execute_batch(
            "INSERT INTO group_members (gid, username) VALUES
                 (63, 'carol'), (10, 'carol');",
        )
        .unwrap();
        let mut source = SqliteSource { conn };
        let mut gids = Vec::new();
        source
            .for_each_gid_of_user("carol", 100, &mut |gid| {
                gids.push(gid);
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(gids, [10, 63]);
    }

    #[test]
    fn keyset_cursor_walks_rows_once_in_rowid_order() {
        let source = SqliteSource { conn: seeded() };
        let mut rows = source.into_rows().unwrap();
        let mut names = Vec::new();
        while let Some(record) = rows.step().unwrap() {
            names.push(record.name().to_owned());
        }
        assert_eq!(names, ["wheel", "dev", "audio"]);
        assert!(rows.step().unwrap().is_none(), "exhausted cursors stay exhausted");
    }

    #[test]
    fn cursor_rows_carry_their_members() {
        let source = SqliteSource { conn: seeded() };
        let mut rows = source.into_rows().unwrap();
        let wheel = rows.step().unwrap().unwrap();
        assert_eq!(wheel.members(), ["root"]);
        let dev = rows.step().unwrap().unwrap();
        assert_eq!(dev.members(), ["carol", "alice", "bob"]);
    }

    #[test]
    fn unreachable_database_is_unavailable() {
        let connector = SqliteConnector::new("/nonexistent/dir/group.db");
        assert!(connector.connect().is_err());
    }
}
