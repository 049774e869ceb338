//! SQLite-backed record store.
//!
//! A single connection guarded by a mutex. Every mutating operation runs inside one
//! transaction, so a failed create/update/delete leaves no partial state behind.

use crate::{CareError, CareResult};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS identities (
    id            TEXT PRIMARY KEY NOT NULL,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL,
    first_name    TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    is_admin      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS patients (
    id         TEXT PRIMARY KEY NOT NULL,
    owner_id   TEXT NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    age        INTEGER NOT NULL CHECK (age >= 0),
    gender     TEXT NOT NULL,
    address    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS patients_owner_idx ON patients(owner_id);

CREATE TABLE IF NOT EXISTS doctors (
    id             TEXT PRIMARY KEY NOT NULL,
    name           TEXT NOT NULL,
    specialty      TEXT NOT NULL,
    contact_number TEXT NOT NULL,
    email          TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assignments (
    id          TEXT PRIMARY KEY NOT NULL,
    patient_id  TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    doctor_id   TEXT NOT NULL REFERENCES doctors(id) ON DELETE CASCADE,
    assigned_at TEXT NOT NULL,
    UNIQUE (patient_id, doctor_id)
);
CREATE INDEX IF NOT EXISTS assignments_patient_idx ON assignments(patient_id);
CREATE INDEX IF NOT EXISTS assignments_doctor_idx ON assignments(doctor_id);
"#;

/// Handle to the record store. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Opens (creating if needed) the database file at `path` and ensures the schema exists.
    pub fn open(path: &Path) -> CareResult<Self> {
        let conn = Connection::open(path)?;
        tracing::info!("opened record store at {}", path.display());
        Self::init(conn)
    }

    /// Opens a private in-memory database. Contents vanish with the last clone.
    pub fn open_in_memory() -> CareResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> CareResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs a read-only closure against the connection.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Connection) -> CareResult<T>) -> CareResult<T> {
        let conn = self.conn.lock().map_err(|_| CareError::StorePoisoned)?;
        f(&conn)
    }

    /// Runs `f` inside a transaction, committing only if it returns `Ok`.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> CareResult<T>,
    ) -> CareResult<T> {
        let mut conn = self.conn.lock().map_err(|_| CareError::StorePoisoned)?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Confirms the store answers a trivial query.
    pub fn ping(&self) -> CareResult<()> {
        self.read(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}
