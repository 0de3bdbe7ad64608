//! Database repository layer
//!
//! Typed CRUD over diary and payment records. Nothing is cached between calls:
//! every read returns an owned snapshot taken under the store lock.
//!
//! ## Overlapping edits
//!
//! Two edit forms may be open on the same record. Each keeps a [`RecordEdit`]
//! that remembers only the properties it changed. Committing an edit re-reads
//! the stored record and overwrites just those properties, so for every
//! property the most recently committed writer wins and untouched properties
//! keep whatever was committed last.

use super::schema::{encode_date, DIARY_COLUMNS, PAYMENT_COLUMNS, RECORD_VERSION};
use super::store::StoreHandle;
use crate::error::StoreError;
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::mem::discriminant;

/// Buffered property changes for one record.
#[derive(Debug, Clone)]
pub struct RecordEdit<F> {
    id: RecordId,
    changes: Vec<F>,
}

pub type DiaryEdit = RecordEdit<DiaryField>;
pub type PaymentEdit = RecordEdit<PaymentField>;

impl<F> RecordEdit<F> {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            changes: Vec::new(),
        }
    }

    /// Record a property change. Setting the same property twice keeps the
    /// later value.
    pub fn set(&mut self, field: F) -> &mut Self {
        match self
            .changes
            .iter_mut()
            .find(|c| discriminant(*c) == discriminant(&field))
        {
            Some(slot) => *slot = field,
            None => self.changes.push(field),
        }
        self
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn changes(&self) -> &[F] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Apply buffered property changes on top of the currently stored record.
pub fn merge_by_property<R: Record>(mut current: R, changes: &[R::Field]) -> R {
    for change in changes {
        current.apply(change.clone());
    }
    current
}

/// Typed record access backed by a [`StoreHandle`].
///
/// Mutations mark the store dirty; nothing is durable until
/// [`StoreHandle::save`] succeeds.
#[derive(Debug, Clone, Copy)]
pub struct RecordRepository<'a> {
    store: &'a StoreHandle,
}

impl<'a> RecordRepository<'a> {
    pub fn new(store: &'a StoreHandle) -> Self {
        Self { store }
    }

    // ============================================
    // Diary operations
    // ============================================

    /// Insert a diary entry. The rating is clamped into `0..=5` and a blank
    /// title becomes the placeholder.
    pub fn insert_diary(&self, new: NewDiary) -> Result<RecordId, StoreError> {
        let record = DiaryRecord {
            id: RecordId::new(),
            date: new.date.unwrap_or_else(Utc::now),
            title: normalize_title(&new.title),
            body: new.body,
            rating: clamp_rating(new.rating),
            tags: normalize_tags(new.tags),
            place_name: new.place_name,
            attachment: new.attachment,
        };
        let tags = encode_tags(&record.tags)?;

        self.store.write(|conn| {
            conn.execute(
                r#"
                INSERT INTO diaries (id, record_version, date, title, body, rating,
                                     tags, place_name, attachment_key)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    record.id.to_string(),
                    RECORD_VERSION,
                    encode_date(&record.date),
                    record.title,
                    record.body,
                    record.rating,
                    tags,
                    record.place_name,
                    record.attachment.as_ref().map(|k| k.as_str()),
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(id = %record.id, "Inserted diary");
        Ok(record.id)
    }

    /// Replace the stored diary with the same id.
    pub fn update_diary(&self, record: &DiaryRecord) -> Result<(), StoreError> {
        let record = record.clone().normalized();
        self.store.write(|conn| Self::write_diary(conn, &record))?;
        tracing::debug!(id = %record.id, "Updated diary");
        Ok(())
    }

    /// Get a diary by ID
    pub fn fetch_diary(&self, id: RecordId) -> Result<Option<DiaryRecord>, StoreError> {
        self.store.read(|conn| Self::query_diary(conn, id))
    }

    /// All diaries, newest first; equal dates keep insertion order.
    pub fn list_diaries(&self) -> Result<Vec<DiaryRecord>, StoreError> {
        self.store.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM diaries ORDER BY date DESC, seq ASC",
                DIARY_COLUMNS
            ))?;
            let diaries = stmt
                .query_map([], Self::row_to_diary)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(diaries)
        })
    }

    /// Commit an edit buffer using the property merge.
    pub fn commit_diary_edit(&self, edit: &DiaryEdit) -> Result<DiaryRecord, StoreError> {
        let merged = self.store.write(|conn| {
            let current =
                Self::query_diary(conn, edit.id())?.ok_or(StoreError::NotFound(edit.id()))?;
            let merged = merge_by_property(current, edit.changes());
            Self::write_diary(conn, &merged)?;
            Ok(merged)
        })?;
        tracing::debug!(id = %merged.id, fields = edit.changes().len(), "Committed diary edit");
        Ok(merged)
    }

    fn query_diary(conn: &Connection, id: RecordId) -> Result<Option<DiaryRecord>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM diaries WHERE id = ?", DIARY_COLUMNS),
            [id.to_string()],
            Self::row_to_diary,
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn write_diary(conn: &Connection, record: &DiaryRecord) -> Result<(), StoreError> {
        let changed = conn.execute(
            r#"
            UPDATE diaries SET
                record_version = ?2,
                date = ?3,
                title = ?4,
                body = ?5,
                rating = ?6,
                tags = ?7,
                place_name = ?8,
                attachment_key = ?9
            WHERE id = ?1
            "#,
            params![
                record.id.to_string(),
                RECORD_VERSION,
                encode_date(&record.date),
                record.title,
                record.body,
                record.rating,
                encode_tags(&record.tags)?,
                record.place_name,
                record.attachment.as_ref().map(|k| k.as_str()),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        Ok(())
    }

    fn row_to_diary(row: &Row) -> rusqlite::Result<DiaryRecord> {
        let rating: i64 = row.get("rating")?;
        let tags: Option<String> = row.get("tags")?;
        let attachment: Option<String> = row.get("attachment_key")?;

        Ok(DiaryRecord {
            id: parse_id(row, 0)?,
            date: parse_date(row, 1)?,
            title: row.get("title")?,
            body: row.get("body")?,
            rating: clamp_rating(rating),
            tags: tags
                .map(|s| serde_json::from_str::<Vec<String>>(&s))
                .transpose()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into()))?,
            place_name: row.get("place_name")?,
            attachment: attachment.as_deref().and_then(AttachmentKey::parse),
        })
    }

    // ============================================
    // Payment operations
    // ============================================

    /// Insert a payment. The amount is stored exactly as given.
    pub fn insert_payment(&self, new: NewPayment) -> Result<RecordId, StoreError> {
        let record = PaymentRecord {
            id: RecordId::new(),
            date: new.date.unwrap_or_else(Utc::now),
            amount: new.amount,
            category: normalize_category(&new.category),
            note: new.note,
        };

        self.store.write(|conn| {
            conn.execute(
                r#"
                INSERT INTO payments (id, record_version, date, amount, category, note)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    record.id.to_string(),
                    RECORD_VERSION,
                    encode_date(&record.date),
                    record.amount.to_string(),
                    record.category,
                    record.note,
                ],
            )?;
            Ok(())
        })?;

        tracing::debug!(id = %record.id, amount = %record.amount, "Inserted payment");
        Ok(record.id)
    }

    /// Replace the stored payment with the same id.
    pub fn update_payment(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        let record = record.clone().normalized();
        self.store.write(|conn| Self::write_payment(conn, &record))?;
        tracing::debug!(id = %record.id, "Updated payment");
        Ok(())
    }

    /// Get a payment by ID
    pub fn fetch_payment(&self, id: RecordId) -> Result<Option<PaymentRecord>, StoreError> {
        self.store.read(|conn| Self::query_payment(conn, id))
    }

    /// All payments, newest first; equal dates keep insertion order.
    pub fn list_payments(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        self.store.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM payments ORDER BY date DESC, seq ASC",
                PAYMENT_COLUMNS
            ))?;
            let payments = stmt
                .query_map([], Self::row_to_payment)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(payments)
        })
    }

    /// Commit an edit buffer using the property merge.
    pub fn commit_payment_edit(&self, edit: &PaymentEdit) -> Result<PaymentRecord, StoreError> {
        let merged = self.store.write(|conn| {
            let current =
                Self::query_payment(conn, edit.id())?.ok_or(StoreError::NotFound(edit.id()))?;
            let merged = merge_by_property(current, edit.changes());
            Self::write_payment(conn, &merged)?;
            Ok(merged)
        })?;
        tracing::debug!(id = %merged.id, fields = edit.changes().len(), "Committed payment edit");
        Ok(merged)
    }

    fn query_payment(
        conn: &Connection,
        id: RecordId,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        conn.query_row(
            &format!("SELECT {} FROM payments WHERE id = ?", PAYMENT_COLUMNS),
            [id.to_string()],
            Self::row_to_payment,
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn write_payment(conn: &Connection, record: &PaymentRecord) -> Result<(), StoreError> {
        let changed = conn.execute(
            r#"
            UPDATE payments SET
                record_version = ?2,
                date = ?3,
                amount = ?4,
                category = ?5,
                note = ?6
            WHERE id = ?1
            "#,
            params![
                record.id.to_string(),
                RECORD_VERSION,
                encode_date(&record.date),
                record.amount.to_string(),
                record.category,
                record.note,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(record.id));
        }
        Ok(())
    }

    fn row_to_payment(row: &Row) -> rusqlite::Result<PaymentRecord> {
        let amount_str: String = row.get("amount")?;

        Ok(PaymentRecord {
            id: parse_id(row, 0)?,
            date: parse_date(row, 1)?,
            amount: Decimal::from_str_exact(&amount_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
            })?,
            category: row.get("category")?,
            note: row.get("note")?,
        })
    }

    // ============================================
    // Kind-generic operations
    // ============================================

    /// Delete a record of either kind. Deleting an absent id succeeds.
    ///
    /// A referenced attachment is left in place; see
    /// [`AttachmentStore::sweep_orphans`](crate::attachments::AttachmentStore::sweep_orphans).
    pub fn delete(&self, id: RecordId) -> Result<(), StoreError> {
        let removed = self.store.write(|conn| {
            let key = id.to_string();
            let diaries = conn.execute("DELETE FROM diaries WHERE id = ?", [&key])?;
            let payments = conn.execute("DELETE FROM payments WHERE id = ?", [&key])?;
            Ok(diaries + payments)
        })?;
        tracing::debug!(id = %id, removed, "Deleted record");
        Ok(())
    }

    /// Get a record of either kind by ID
    pub fn fetch(&self, id: RecordId) -> Result<Option<AnyRecord>, StoreError> {
        self.store.read(|conn| {
            if let Some(diary) = Self::query_diary(conn, id)? {
                return Ok(Some(AnyRecord::Diary(diary)));
            }
            Ok(Self::query_payment(conn, id)?.map(AnyRecord::Payment))
        })
    }

    /// All records of one kind, newest first; equal dates keep insertion order.
    pub fn list(&self, kind: RecordKind) -> Result<Vec<AnyRecord>, StoreError> {
        Ok(match kind {
            RecordKind::Diary => self
                .list_diaries()?
                .into_iter()
                .map(AnyRecord::Diary)
                .collect(),
            RecordKind::Payment => self
                .list_payments()?
                .into_iter()
                .map(AnyRecord::Payment)
                .collect(),
        })
    }

    /// Number of stored records of one kind
    pub fn count(&self, kind: RecordKind) -> Result<i64, StoreError> {
        let table = match kind {
            RecordKind::Diary => "diaries",
            RecordKind::Payment => "payments",
        };
        self.store.read(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                r.get(0)
            })?)
        })
    }

    /// Attachment keys referenced by any stored diary (the live set for
    /// orphan sweeps).
    pub fn attachment_keys(&self) -> Result<BTreeSet<AttachmentKey>, StoreError> {
        self.store.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT attachment_key FROM diaries WHERE attachment_key IS NOT NULL",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names.iter().filter_map(|s| AttachmentKey::parse(s)).collect())
        })
    }
}

fn encode_tags(tags: &Option<Vec<String>>) -> Result<Option<String>, StoreError> {
    Ok(tags.as_ref().map(serde_json::to_string).transpose()?)
}

fn parse_id(row: &Row, idx: usize) -> rusqlite::Result<RecordId> {
    let s: String = row.get(idx)?;
    s.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn parse_date(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn loaded_store() -> StoreHandle {
        let mut store = StoreHandle::open_in_memory();
        assert_eq!(store.load(), crate::db::RecoveryOutcome::Ready);
        store
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn diary(title: &str, date: DateTime<Utc>) -> NewDiary {
        NewDiary {
            date: Some(date),
            title: title.to_string(),
            rating: 3,
            ..Default::default()
        }
    }

    fn payment(amount: Decimal, date: DateTime<Utc>) -> NewPayment {
        NewPayment {
            date: Some(date),
            amount,
            category: "Food".to_string(),
            note: None,
        }
    }

    #[test]
    fn test_diary_crud() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        // Insert
        let id = repo
            .insert_diary(NewDiary {
                body: Some("sunny".into()),
                tags: Some(vec!["walk".into(), "park".into()]),
                place_name: Some("Ueno".into()),
                ..diary("Morning", day(1))
            })
            .unwrap();
        assert!(store.is_dirty());

        // Read
        let mut fetched = repo.fetch_diary(id).unwrap().unwrap();
        assert_eq!(fetched.title, "Morning");
        assert_eq!(fetched.date, day(1));
        assert_eq!(fetched.tags.as_deref(), Some(&["walk".to_string(), "park".to_string()][..]));

        // Update
        fetched.body = None;
        fetched.rating = 9;
        repo.update_diary(&fetched).unwrap();
        let updated = repo.fetch_diary(id).unwrap().unwrap();
        assert_eq!(updated.body, None);
        assert_eq!(updated.rating, MAX_RATING);

        // Kind-generic read
        assert_eq!(repo.fetch(id).unwrap().unwrap().kind(), RecordKind::Diary);
        assert_eq!(repo.count(RecordKind::Diary).unwrap(), 1);
    }

    #[test]
    fn test_rating_is_clamped_on_insert() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        let high = repo
            .insert_diary(NewDiary { rating: 7, ..diary("high", day(1)) })
            .unwrap();
        let low = repo
            .insert_diary(NewDiary { rating: -1, ..diary("low", day(1)) })
            .unwrap();

        assert_eq!(repo.fetch_diary(high).unwrap().unwrap().rating, 5);
        assert_eq!(repo.fetch_diary(low).unwrap().unwrap().rating, 0);
    }

    #[test]
    fn test_blank_title_gets_placeholder() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        let id = repo.insert_diary(diary("  ", day(2))).unwrap();
        assert_eq!(repo.fetch_diary(id).unwrap().unwrap().title, UNTITLED);
    }

    #[test]
    fn test_insert_defaults_date_to_now() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        let before = Utc::now();
        let id = repo
            .insert_payment(NewPayment {
                amount: dec!(1),
                ..Default::default()
            })
            .unwrap();
        let stored = repo.fetch_payment(id).unwrap().unwrap();
        assert!(stored.date >= before - chrono::Duration::seconds(1));
        assert_eq!(stored.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn test_sub_microsecond_dates_read_back_unchanged() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);
        let date = day(1) + chrono::Duration::nanoseconds(123_456_789);

        let id = repo.insert_diary(diary("precise", date)).unwrap();
        assert_eq!(repo.fetch_diary(id).unwrap().unwrap().date, date);

        let id = repo.insert_payment(payment(dec!(1), date)).unwrap();
        assert_eq!(repo.fetch_payment(id).unwrap().unwrap().date, date);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        let ghost = PaymentRecord {
            id: RecordId::new(),
            date: day(1),
            amount: dec!(3),
            category: "Food".into(),
            note: None,
        };
        assert!(matches!(
            repo.update_payment(&ghost),
            Err(StoreError::NotFound(id)) if id == ghost.id
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        let id = repo.insert_payment(payment(dec!(5), day(3))).unwrap();
        repo.delete(id).unwrap();
        repo.delete(id).unwrap();
        repo.delete(RecordId::new()).unwrap();

        assert!(repo.fetch(id).unwrap().is_none());
    }

    #[test]
    fn test_list_orders_by_date_desc_then_insertion() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        let a = repo.insert_diary(diary("a", day(1))).unwrap();
        let b = repo.insert_diary(diary("b", day(5))).unwrap();
        let c = repo.insert_diary(diary("c", day(1))).unwrap();
        let d = repo.insert_diary(diary("d", day(3))).unwrap();

        let ids: Vec<RecordId> = repo.list_diaries().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b, d, a, c]);

        let kinds: Vec<RecordKind> = repo
            .list(RecordKind::Diary)
            .unwrap()
            .iter()
            .map(|r| r.kind())
            .collect();
        assert_eq!(kinds.len(), 4);
        assert!(repo.list(RecordKind::Payment).unwrap().is_empty());
    }

    #[test]
    fn test_amounts_are_stored_exactly() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        for amount in [dec!(19.99), dec!(5.01), dec!(0.003), dec!(-2.50)] {
            let id = repo.insert_payment(payment(amount, day(4))).unwrap();
            let stored = repo.fetch_payment(id).unwrap().unwrap();
            assert_eq!(stored.amount, amount);
            assert_eq!(stored.amount.scale(), amount.scale());
        }
    }

    #[test]
    fn test_overlapping_edits_merge_by_property() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);
        let id = repo.insert_diary(diary("original", day(1))).unwrap();

        // Two forms open on the same record
        let mut first = DiaryEdit::new(id);
        first.set(DiaryField::Title("from first".into()));
        first.set(DiaryField::Rating(1));

        let mut second = DiaryEdit::new(id);
        second.set(DiaryField::Body(Some("from second".into())));
        second.set(DiaryField::Rating(4));

        repo.commit_diary_edit(&first).unwrap();
        let merged = repo.commit_diary_edit(&second).unwrap();

        assert_eq!(merged.title, "from first");
        assert_eq!(merged.body.as_deref(), Some("from second"));
        assert_eq!(merged.rating, 4);
        assert_eq!(repo.fetch_diary(id).unwrap().unwrap(), merged);
    }

    #[test]
    fn test_edit_set_replaces_same_property() {
        let mut edit = PaymentEdit::new(RecordId::new());
        edit.set(PaymentField::Amount(dec!(1)));
        edit.set(PaymentField::Note(None));
        edit.set(PaymentField::Amount(dec!(2)));

        assert_eq!(edit.changes().len(), 2);
        assert_eq!(edit.changes()[0], PaymentField::Amount(dec!(2)));
    }

    #[test]
    fn test_commit_edit_on_deleted_record() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);
        let id = repo.insert_payment(payment(dec!(8), day(1))).unwrap();
        repo.delete(id).unwrap();

        let mut edit = PaymentEdit::new(id);
        edit.set(PaymentField::Category("Transport".into()));
        assert!(matches!(
            repo.commit_payment_edit(&edit),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_attachment_keys_are_the_live_set() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);
        let key = AttachmentKey::generate(AttachmentFormat::Jpeg);

        repo.insert_diary(NewDiary {
            attachment: Some(key.clone()),
            ..diary("photo", day(1))
        })
        .unwrap();
        repo.insert_diary(diary("no photo", day(1))).unwrap();

        let keys = repo.attachment_keys().unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&key));
    }

    #[test]
    fn test_attachment_keys_surface_unreadable_rows() {
        let store = loaded_store();
        let repo = RecordRepository::new(&store);

        store
            .write(|conn| {
                conn.execute(
                    "INSERT INTO diaries (id, record_version, date, title, rating, attachment_key)
                     VALUES ('d', 2, '2024-03-01T00:00:00.000000000Z', 't', 0, X'FF00')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        assert!(repo.attachment_keys().is_err());
    }

    #[test]
    fn test_saved_changes_survive_reopen() {
        let dir = TempDir::new().unwrap();

        let saved_id;
        {
            let mut store = StoreHandle::open(dir.path(), false);
            assert_eq!(store.load(), crate::db::RecoveryOutcome::Ready);
            let repo = RecordRepository::new(&store);
            saved_id = repo.insert_payment(payment(dec!(12.34), day(2))).unwrap();
            store.save().unwrap();
            assert!(!store.is_dirty());

            // Not saved: discarded when the handle goes away
            repo.insert_payment(payment(dec!(99), day(3))).unwrap();
        }

        let mut store = StoreHandle::open(dir.path(), false);
        assert_eq!(store.load(), crate::db::RecoveryOutcome::Ready);
        let repo = RecordRepository::new(&store);

        let payments = repo.list_payments().unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].id, saved_id);
        assert_eq!(payments[0].amount, dec!(12.34));
    }
}
