//! Store handle: owns the backing SQLite file and its open/recovery lifecycle.
//!
//! Opening never fails outright. [`StoreHandle::load`] walks a fixed cascade:
//!
//! ```text
//! Opening ──ok──▶ Ready
//!    │ err
//!    ▼
//! Purging ──▶ Reopening ──ok──▶ Ready
//!                 │ err
//!                 ▼
//!             Degraded (in-memory, nothing persists)
//! ```
//!
//! Pending changes are batched: the first mutation after a save opens a
//! transaction, and [`StoreHandle::save`] commits it.

use super::schema;
use crate::error::StoreError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the backing store inside the data directory
pub const STORE_FILE_NAME: &str = "DiaryPayments.sqlite";

/// Suffixes SQLite appends for its side files
const SIDE_FILE_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

/// Position in the open/recovery cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Opening,
    Purging,
    Reopening,
    /// Terminal: backed by the durable file (or a requested in-memory store)
    Ready,
    /// Terminal: fallback in-memory store; writes are lost on exit
    Degraded,
}

/// Result of [`StoreHandle::load`]. Degraded must be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a degraded store does not persist anything and must be surfaced"]
pub enum RecoveryOutcome {
    Ready,
    Degraded(String),
}

impl RecoveryOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, RecoveryOutcome::Degraded(_))
    }
}

/// Where the store lives
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Memory,
    File(PathBuf),
}

/// Which candidate side files a purge managed to remove.
///
/// Only used for diagnostics; the cascade continues regardless.
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

/// Attempt to delete every path, never stopping on failure.
pub fn remove_best_effort(paths: &[PathBuf]) -> PurgeReport {
    let mut report = PurgeReport::default();
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => report.removed.push(path.clone()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                report.missing.push(path.clone())
            }
            Err(e) => report.failed.push((path.clone(), e)),
        }
    }
    report
}

/// The backing file plus the side files SQLite may leave next to it.
pub fn store_files(path: &Path) -> Vec<PathBuf> {
    let mut files = vec![path.to_path_buf()];
    for suffix in SIDE_FILE_SUFFIXES {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        files.push(PathBuf::from(name));
    }
    files
}

/// Handle to the record store.
///
/// Construct one at the application's composition point and pass it by
/// reference to whatever needs it.
pub struct StoreHandle {
    location: Location,
    state: StoreState,
    conn: Mutex<Option<Connection>>,
}

impl StoreHandle {
    /// Construct a handle. No I/O happens until [`load`](Self::load).
    ///
    /// With `in_memory` the store is transient. Otherwise the backing file is
    /// `storage_path/DiaryPayments.sqlite`.
    pub fn open(storage_path: &Path, in_memory: bool) -> Self {
        let location = if in_memory {
            Location::Memory
        } else {
            Location::File(storage_path.join(STORE_FILE_NAME))
        };
        Self {
            location,
            state: StoreState::Opening,
            conn: Mutex::new(None),
        }
    }

    /// Open a transient store (for testing)
    pub fn open_in_memory() -> Self {
        Self::open(Path::new(""), true)
    }

    /// Path of the backing file, if this store has one
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Whether committed changes survive a restart
    pub fn is_durable(&self) -> bool {
        self.state == StoreState::Ready && matches!(self.location, Location::File(_))
    }

    /// Open the store, running the recovery cascade on failure.
    ///
    /// Calling this again discards any unsaved changes and reopens.
    pub fn load(&mut self) -> RecoveryOutcome {
        *self.conn.lock().unwrap() = None;
        self.state = StoreState::Opening;

        let mut last_error: Option<StoreError> = None;

        loop {
            tracing::debug!(state = ?self.state, "Store open step");
            match self.state {
                StoreState::Opening => match self.try_open() {
                    Ok(conn) => self.become_ready(conn),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to open store, purging");
                        last_error = Some(e);
                        self.state = match self.location {
                            Location::File(_) => StoreState::Purging,
                            Location::Memory => StoreState::Degraded,
                        };
                    }
                },
                StoreState::Purging => {
                    if let Location::File(path) = &self.location {
                        let report = remove_best_effort(&store_files(path));
                        let failed: Vec<String> = report
                            .failed
                            .iter()
                            .map(|(p, e)| format!("{}: {}", p.display(), e))
                            .collect();
                        tracing::warn!(
                            removed = ?report.removed,
                            missing = report.missing.len(),
                            failed = ?failed,
                            "Purged store files"
                        );
                    }
                    self.state = StoreState::Reopening;
                }
                StoreState::Reopening => match self.try_open() {
                    Ok(conn) => self.become_ready(conn),
                    Err(e) => {
                        tracing::error!(error = %e, "Reopen after purge failed");
                        last_error = Some(e);
                        self.state = StoreState::Degraded;
                    }
                },
                StoreState::Ready => return RecoveryOutcome::Ready,
                StoreState::Degraded => {
                    let reason = last_error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "store could not be opened".to_string());
                    match Self::open_memory() {
                        Ok(conn) => *self.conn.lock().unwrap() = Some(conn),
                        Err(e) => {
                            tracing::error!(error = %e, "In-memory fallback failed");
                        }
                    }
                    tracing::error!(reason = %reason, "Store degraded: changes will not persist");
                    return RecoveryOutcome::Degraded(reason);
                }
            }
        }
    }

    fn become_ready(&mut self, conn: Connection) {
        *self.conn.lock().unwrap() = Some(conn);
        self.state = StoreState::Ready;
        tracing::info!(path = ?self.path(), "Store ready");
    }

    fn try_open(&self) -> Result<Connection, StoreError> {
        match &self.location {
            Location::Memory => Self::open_memory(),
            Location::File(path) => Self::open_file(path),
        }
    }

    fn open_file(path: &Path) -> Result<Connection, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        let check: String = conn.query_row("PRAGMA quick_check", [], |r| r.get(0))?;
        if check != "ok" {
            return Err(StoreError::Corrupt(check));
        }

        Self::prepare_schema(&conn)?;
        Ok(conn)
    }

    fn open_memory() -> Result<Connection, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Self::prepare_schema(&conn)?;
        Ok(conn)
    }

    fn prepare_schema(conn: &Connection) -> Result<(), StoreError> {
        schema::run_migrations(conn)?;
        schema::upgrade_records(conn)?;
        schema::verify(conn)
    }

    /// Whether there are changes not yet committed by [`save`](Self::save)
    pub fn is_dirty(&self) -> bool {
        self.conn
            .lock()
            .unwrap()
            .as_ref()
            .map(|c| !c.is_autocommit())
            .unwrap_or(false)
    }

    /// Commit pending changes. No-op when nothing is pending.
    pub fn save(&self) -> Result<(), StoreError> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(StoreError::NotLoaded)?;
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("COMMIT")
            .map_err(StoreError::WriteFailed)?;
        tracing::debug!(durable = self.is_durable(), "Store saved");
        Ok(())
    }

    /// Run a read against the current connection.
    ///
    /// Reads see pending changes. The lock is held for the whole closure, so
    /// no mutation can interleave with it.
    pub(crate) fn read<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.conn.lock().unwrap();
        let conn = guard.as_ref().ok_or(StoreError::NotLoaded)?;
        f(conn)
    }

    /// Run one mutation inside its own savepoint, opening the pending batch
    /// transaction first if needed.
    ///
    /// A failing mutation leaves no partial writes behind. SQLite errors are
    /// reported as [`StoreError::WriteFailed`]; other errors pass through.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.conn.lock().unwrap();
        let conn = guard.as_mut().ok_or(StoreError::NotLoaded)?;

        if conn.is_autocommit() {
            conn.execute_batch("BEGIN").map_err(StoreError::WriteFailed)?;
        }

        let sp = conn.savepoint().map_err(StoreError::WriteFailed)?;
        let value = f(&sp).map_err(|e| match e {
            StoreError::Database(e) => StoreError::WriteFailed(e),
            other => other,
        })?;
        sp.commit().map_err(StoreError::WriteFailed)?;
        Ok(value)
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("location", &self.location)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_load_is_ready() {
        let mut store = StoreHandle::open_in_memory();
        assert_eq!(store.state(), StoreState::Opening);
        assert_eq!(store.load(), RecoveryOutcome::Ready);
        assert_eq!(store.state(), StoreState::Ready);
        assert!(!store.is_durable());
    }

    #[test]
    fn test_file_load_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        let mut store = StoreHandle::open(&data_dir, false);

        assert_eq!(store.load(), RecoveryOutcome::Ready);
        assert!(store.is_durable());
        assert!(data_dir.join(STORE_FILE_NAME).exists());
    }

    #[test]
    fn test_garbage_file_is_purged_and_reopened() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        std::fs::write(&path, vec![0xAB_u8; 4096]).unwrap();
        std::fs::write(dir.path().join("DiaryPayments.sqlite-wal"), b"stale").unwrap();

        let mut store = StoreHandle::open(dir.path(), false);
        assert_eq!(store.load(), RecoveryOutcome::Ready);
        assert!(store.is_durable());

        let version = store.read(schema::get_schema_version).unwrap();
        assert_eq!(version, schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_file_is_purged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch("CREATE TABLE diaries (x TEXT); PRAGMA user_version = 42;")
                .unwrap();
        }

        let mut store = StoreHandle::open(dir.path(), false);
        let outcome = store.load();
        assert!(matches!(
            outcome,
            RecoveryOutcome::Ready | RecoveryOutcome::Degraded(_)
        ));
        assert_eq!(outcome, RecoveryOutcome::Ready);
    }

    #[test]
    fn test_unopenable_path_degrades_but_stays_usable() {
        let dir = TempDir::new().unwrap();
        // A regular file where the data directory should be
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let mut store = StoreHandle::open(&blocker, false);
        let outcome = store.load();
        assert!(outcome.is_degraded());
        assert_eq!(store.state(), StoreState::Degraded);
        assert!(!store.is_durable());

        // Writes still work, they just won't persist
        store
            .write(|conn| {
                conn.execute(
                    "INSERT INTO payments (id, record_version, date, amount, category)
                     VALUES ('p', 2, '2024-01-01T00:00:00.000000000Z', '1', 'Food')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        store.save().unwrap();
    }

    #[test]
    fn test_save_without_changes_is_noop() {
        let mut store = StoreHandle::open_in_memory();
        let _ = store.load();
        assert!(!store.is_dirty());
        store.save().unwrap();
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_use_before_load() {
        let store = StoreHandle::open_in_memory();
        assert!(matches!(store.save(), Err(StoreError::NotLoaded)));
    }

    #[test]
    fn test_failed_mutation_leaves_nothing_behind() {
        let mut store = StoreHandle::open_in_memory();
        let _ = store.load();

        let result: Result<(), StoreError> = store.write(|conn| {
            conn.execute(
                "INSERT INTO payments (id, record_version, date, amount, category)
                 VALUES ('p', 2, '2024-01-01T00:00:00.000000000Z', '1', 'Food')",
                [],
            )?;
            conn.execute("INSERT INTO no_such_table VALUES (1)", [])?;
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::WriteFailed(_))));

        let count: i64 = store
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM payments", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_rejected_commit_is_write_failed() {
        let mut store = StoreHandle::open_in_memory();
        let _ = store.load();

        // Deferred foreign keys are only checked when the batch commits
        store
            .write(|conn| {
                conn.execute_batch(
                    "CREATE TABLE owners (id INTEGER PRIMARY KEY);
                     CREATE TABLE pets (
                         owner INTEGER REFERENCES owners(id) DEFERRABLE INITIALLY DEFERRED
                     );
                     INSERT INTO pets (owner) VALUES (42);",
                )?;
                Ok(())
            })
            .unwrap();
        assert!(store.is_dirty());

        assert!(matches!(store.save(), Err(StoreError::WriteFailed(_))));
        assert!(store.is_dirty());
    }

    #[test]
    fn test_remove_best_effort_reports_each_path() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("a");
        std::fs::write(&present, b"x").unwrap();
        let absent = dir.path().join("b");

        let report = remove_best_effort(&[present.clone(), absent.clone()]);
        assert_eq!(report.removed, vec![present]);
        assert_eq!(report.missing, vec![absent]);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn test_store_files_lists_side_files() {
        let files = store_files(Path::new("/data/DiaryPayments.sqlite"));
        assert_eq!(files.len(), 4);
        assert!(files.contains(&PathBuf::from("/data/DiaryPayments.sqlite-wal")));
        assert!(files.contains(&PathBuf::from("/data/DiaryPayments.sqlite-shm")));
    }
}
