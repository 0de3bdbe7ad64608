//! Database schema and migrations
//!
//! Two layers of evolution:
//! - Table layout, tracked with `PRAGMA user_version` and applied as embedded SQL.
//! - Row contents, tracked per row in `record_version` and brought forward by
//!   deterministic field-level upgrades after the table layout is current.

use crate::error::StoreError;
use crate::types::{clamp_rating, normalize_category, normalize_title, parse_amount};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

/// Current schema (table layout) version
pub const SCHEMA_VERSION: i32 = 2;

/// Current per-row record version
pub const RECORD_VERSION: i64 = 2;

/// Column list every diary query selects, in row-mapping order
pub(crate) const DIARY_COLUMNS: &str =
    "id, date, title, body, rating, tags, place_name, attachment_key";

/// Column list every payment query selects, in row-mapping order
pub(crate) const PAYMENT_COLUMNS: &str = "id, date, amount, category, note";

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS diaries (
        seq              INTEGER PRIMARY KEY AUTOINCREMENT,  -- insertion order
        id               TEXT NOT NULL UNIQUE,
        record_version   INTEGER NOT NULL DEFAULT 1,
        date             TEXT NOT NULL,
        title            TEXT NOT NULL,
        body             TEXT,
        rating           INTEGER NOT NULL DEFAULT 0,
        tags             TEXT,               -- v1 rows: comma separated
        place_name       TEXT,
        image_path       TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_diaries_date ON diaries(date DESC);

    CREATE TABLE IF NOT EXISTS payments (
        seq              INTEGER PRIMARY KEY AUTOINCREMENT,
        id               TEXT NOT NULL UNIQUE,
        record_version   INTEGER NOT NULL DEFAULT 1,
        date             TEXT NOT NULL,
        amount           TEXT NOT NULL,      -- canonical decimal text
        category         TEXT NOT NULL,
        note             TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_payments_date ON payments(date DESC);
    "#,
    // Version 2: Attachments are keys into the attachment store, not paths
    r#"
    ALTER TABLE diaries RENAME COLUMN image_path TO attachment_key;

    CREATE INDEX IF NOT EXISTS idx_diaries_attachment
        ON diaries(attachment_key) WHERE attachment_key IS NOT NULL;
    "#,
];

/// Fixed-width UTC text with full nanosecond precision, so lexicographic
/// order matches time order and a stored instant reads back unchanged.
pub(crate) fn encode_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Re-encode stored date text in the current fixed width. Text that does not
/// parse is left alone.
fn reencode_date(text: &str) -> String {
    match DateTime::parse_from_rfc3339(text) {
        Ok(dt) => encode_date(&dt.with_timezone(&Utc)),
        Err(_) => text.to_string(),
    }
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    migrate_to(conn, SCHEMA_VERSION)
}

fn migrate_to(conn: &Connection, target: i32) -> Result<(), StoreError> {
    let current_version = get_schema_version(conn)?;

    tracing::info!(
        current_version,
        target_version = target,
        "Checking database migrations"
    );

    if current_version > SCHEMA_VERSION {
        return Err(StoreError::Incompatible(format!(
            "schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    for (i, migration) in MIGRATIONS.iter().enumerate().take(target as usize) {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration)?;
            tx.execute(&format!("PRAGMA user_version = {}", version), [])?;
            tx.commit()?;
        }
    }

    if current_version < target {
        tracing::info!(from = current_version, to = target, "Migrations complete");
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32, StoreError> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

/// Check that the tables have the layout this version reads and writes.
///
/// Catches files whose `user_version` claims compatibility but whose tables
/// were created by something else.
pub fn verify(conn: &Connection) -> Result<(), StoreError> {
    let version = get_schema_version(conn)?;
    if version != SCHEMA_VERSION {
        return Err(StoreError::Incompatible(format!(
            "schema version {} after migration, expected {}",
            version, SCHEMA_VERSION
        )));
    }

    for (table, columns) in [("diaries", DIARY_COLUMNS), ("payments", PAYMENT_COLUMNS)] {
        conn.prepare(&format!(
            "SELECT seq, record_version, {} FROM {} LIMIT 0",
            columns, table
        ))
        .map_err(|e| StoreError::Incompatible(format!("table {}: {}", table, e)))?;

        let newer: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE record_version > ?", table),
            [RECORD_VERSION],
            |r| r.get(0),
        )?;
        if newer > 0 {
            return Err(StoreError::Incompatible(format!(
                "{} rows in {} have a record version newer than {}",
                newer, table, RECORD_VERSION
            )));
        }
    }

    Ok(())
}

// ============================================
// Record upgrades
// ============================================

struct DiaryRow {
    seq: i64,
    version: i64,
    date: String,
    title: String,
    rating: i64,
    tags: Option<String>,
}

struct PaymentRow {
    seq: i64,
    version: i64,
    date: String,
    amount: String,
    category: String,
    note: Option<String>,
}

/// v1 -> v2: tags become a JSON array, ratings are clamped, blank titles get
/// the placeholder, dates are re-encoded at nanosecond width.
fn upgrade_diary_v1(row: &mut DiaryRow) {
    row.date = reencode_date(&row.date);
    row.title = normalize_title(&row.title);
    row.rating = clamp_rating(row.rating) as i64;
    row.tags = row.tags.take().and_then(|text| {
        let tags: Vec<&str> = text
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            None
        } else {
            serde_json::to_string(&tags).ok()
        }
    });
}

/// v1 -> v2: amounts written with separators or currency symbols become
/// canonical decimal text. Unparseable amounts become zero and the original
/// text is kept in the note. Dates are re-encoded at nanosecond width.
fn upgrade_payment_v1(row: &mut PaymentRow) {
    row.date = reencode_date(&row.date);
    row.category = normalize_category(&row.category);
    match parse_amount(&row.amount) {
        Ok(amount) => row.amount = amount.to_string(),
        Err(_) => {
            tracing::warn!(seq = row.seq, amount = %row.amount, "Unparseable legacy amount");
            let kept = format!("original amount: {}", row.amount);
            row.note = Some(match row.note.take() {
                Some(note) if !note.is_empty() => format!("{} ({})", note, kept),
                _ => kept,
            });
            row.amount = "0".to_string();
        }
    }
}

/// Bring every row with an older `record_version` up to [`RECORD_VERSION`].
///
/// Returns the number of rows rewritten.
pub fn upgrade_records(conn: &Connection) -> Result<usize, StoreError> {
    let tx = conn.unchecked_transaction()?;
    let mut upgraded = 0;

    let diaries: Vec<DiaryRow> = tx
        .prepare(
            "SELECT seq, record_version, date, title, rating, tags FROM diaries
             WHERE record_version < ? ORDER BY seq",
        )?
        .query_map([RECORD_VERSION], |row| {
            Ok(DiaryRow {
                seq: row.get(0)?,
                version: row.get(1)?,
                date: row.get(2)?,
                title: row.get(3)?,
                rating: row.get(4)?,
                tags: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;

    for mut row in diaries {
        while row.version < RECORD_VERSION {
            if row.version == 1 {
                upgrade_diary_v1(&mut row);
            }
            row.version += 1;
        }
        tx.execute(
            "UPDATE diaries SET record_version = ?1, date = ?2, title = ?3, rating = ?4, tags = ?5
             WHERE seq = ?6",
            params![row.version, row.date, row.title, row.rating, row.tags, row.seq],
        )?;
        upgraded += 1;
    }

    let payments: Vec<PaymentRow> = tx
        .prepare(
            "SELECT seq, record_version, date, amount, category, note FROM payments
             WHERE record_version < ? ORDER BY seq",
        )?
        .query_map([RECORD_VERSION], |row| {
            Ok(PaymentRow {
                seq: row.get(0)?,
                version: row.get(1)?,
                date: row.get(2)?,
                amount: row.get(3)?,
                category: row.get(4)?,
                note: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;

    for mut row in payments {
        while row.version < RECORD_VERSION {
            if row.version == 1 {
                upgrade_payment_v1(&mut row);
            }
            row.version += 1;
        }
        tx.execute(
            "UPDATE payments SET record_version = ?1, date = ?2, amount = ?3, category = ?4, note = ?5
             WHERE seq = ?6",
            params![row.version, row.date, row.amount, row.category, row.note, row.seq],
        )?;
        upgraded += 1;
    }

    tx.commit()?;

    if upgraded > 0 {
        tracing::info!(upgraded, to = RECORD_VERSION, "Upgraded stored records");
    }

    Ok(upgraded)
}
