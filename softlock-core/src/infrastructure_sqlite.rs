//! SQLite-backed LeaseStore implementation.
//! Lets several processes share one lease table through a common file.
//!
//! Enable with the `sqlite` feature flag:
//! ```toml
//! softlock-core = { path = "../softlock-core", features = ["sqlite"] }
//! ```

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use crate::error::StoreError;
use crate::infrastructure::{check_constraints, LeaseFilter, LeaseStore};
use crate::types::*;

const SELECT_COLUMNS: &str =
    "SELECT id, holder_id, holder_address, resource_type, resource_id, created_at, updated_at FROM soft_locks";

/// A persistent lease store backed by SQLite.
///
/// Uses WAL mode for concurrent read performance.
pub struct SqliteLeaseStore {
    conn: Connection,
}

impl SqliteLeaseStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent read performance
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::with_connection(conn)
    }

    /// A private, non-persistent database. Mostly useful in tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS soft_locks (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                holder_id      TEXT NOT NULL,
                holder_address TEXT NOT NULL CHECK (holder_address <> ''),
                resource_type  TEXT NOT NULL,
                resource_id    TEXT NOT NULL,
                created_at     INTEGER NOT NULL,
                updated_at     INTEGER CHECK (updated_at IS NULL OR updated_at > created_at)
            );
            CREATE INDEX IF NOT EXISTS idx_soft_locks_resource ON soft_locks(resource_type, resource_id);
            CREATE INDEX IF NOT EXISTS idx_soft_locks_holder ON soft_locks(holder_id, holder_address);",
        )?;

        Ok(Self { conn })
    }

    fn row_to_lease(row: &rusqlite::Row) -> rusqlite::Result<Lease> {
        Ok(Lease {
            id: row.get(0)?,
            holder: Holder::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
            resource: ResourceRef::new(row.get::<_, String>(3)?, row.get::<_, String>(4)?),
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    /// Translate a filter into a WHERE clause plus its bound parameters.
    fn where_clause(filter: &LeaseFilter) -> (&'static str, Vec<Value>) {
        match filter {
            LeaseFilter::All => ("1 = 1", vec![]),
            LeaseFilter::Expired { threshold } => (
                "(updated_at IS NULL AND created_at <= ?1)
                 OR (updated_at IS NOT NULL AND updated_at <= ?1)",
                vec![Value::Integer(*threshold as i64)],
            ),
            LeaseFilter::LiveOn {
                resource,
                threshold,
            } => (
                "resource_type = ?1 AND resource_id = ?2 AND (
                    (updated_at IS NULL AND created_at > ?3)
                    OR (updated_at IS NOT NULL AND updated_at > ?3)
                 )",
                vec![
                    Value::Text(resource.resource_type.clone()),
                    Value::Text(resource.resource_id.clone()),
                    Value::Integer(*threshold as i64),
                ],
            ),
            LeaseFilter::HeldBy { holder } => (
                "holder_id = ?1 AND holder_address = ?2",
                vec![
                    Value::Text(holder.id.clone()),
                    Value::Text(holder.address.clone()),
                ],
            ),
        }
    }
}

impl LeaseStore for SqliteLeaseStore {
    fn insert(&mut self, lease: &NewLease) -> Result<LeaseId, StoreError> {
        check_constraints(&lease.holder, lease.created_at, lease.updated_at)?;

        self.conn.execute(
            "INSERT INTO soft_locks (holder_id, holder_address, resource_type, resource_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                lease.holder.id,
                lease.holder.address,
                lease.resource.resource_type,
                lease.resource.resource_id,
                lease.created_at,
                lease.updated_at,
            ],
        )?;

        Ok(self.conn.last_insert_rowid() as LeaseId)
    }

    fn update_existing(&mut self, lease: &Lease) -> Result<(), StoreError> {
        check_constraints(&lease.holder, lease.created_at, lease.updated_at)?;

        let rows = self.conn.execute(
            "UPDATE soft_locks
             SET holder_id = ?1, holder_address = ?2, resource_type = ?3, resource_id = ?4,
                 created_at = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                lease.holder.id,
                lease.holder.address,
                lease.resource.resource_type,
                lease.resource.resource_id,
                lease.created_at,
                lease.updated_at,
                lease.id,
            ],
        )?;

        if rows == 0 {
            return Err(StoreError::NotFound(lease.id));
        }
        Ok(())
    }

    fn delete_where(&mut self, filter: &LeaseFilter) -> Result<usize, StoreError> {
        let (clause, values) = Self::where_clause(filter);
        let sql = format!("DELETE FROM soft_locks WHERE {}", clause);
        Ok(self.conn.execute(&sql, params_from_iter(values))?)
    }

    fn query_where(&self, filter: &LeaseFilter) -> Result<Vec<Lease>, StoreError> {
        let (clause, values) = Self::where_clause(filter);
        let sql = format!("{} WHERE {} ORDER BY id ASC", SELECT_COLUMNS, clause);

        let mut stmt = self.conn.prepare(&sql)?;
        let leases = stmt
            .query_map(params_from_iter(values), Self::row_to_lease)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(leases)
    }
}
