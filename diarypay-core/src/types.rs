//! Core domain types for diarypay
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Diary record** | A dated journal entry with a title, optional body, rating and tags |
//! | **Payment record** | A dated expense with an exact decimal amount and a category |
//! | **Attachment** | An image blob stored outside the record store, referenced by key |
//! | **Record version** | Per-row tag describing which field layout a stored row uses |
//!
//! Records handed out by the repository are owned snapshots. Nothing in this
//! module talks to storage.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Title stored when a diary entry is created without one.
pub const UNTITLED: &str = "Untitled";

/// Highest allowed diary rating. The lowest is 0.
pub const MAX_RATING: u8 = 5;

/// Category stored when a payment is created without one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Categories the payment form offers. Free text is accepted as well.
pub const SUGGESTED_CATEGORIES: [&str; 5] =
    ["Food", "Transport", "Entertainment", "Household", DEFAULT_CATEGORY];

// ============================================
// Identifiers
// ============================================

/// Opaque unique record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("invalid record id {:?}: {}", s, e))
    }
}

/// The two record kinds held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Diary,
    Payment,
}

impl RecordKind {
    /// Returns the identifier used in logs and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Diary => "diary",
            RecordKind::Payment => "payment",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diary" => Ok(RecordKind::Diary),
            "payment" => Ok(RecordKind::Payment),
            _ => Err(format!("unknown record kind: {}", s)),
        }
    }
}

// ============================================
// Attachments
// ============================================

/// Encoding an attachment is stored in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentFormat {
    #[default]
    Jpeg,
    Png,
}

impl AttachmentFormat {
    /// File extension used in keys, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            AttachmentFormat::Jpeg => "jpg",
            AttachmentFormat::Png => "png",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" => Some(AttachmentFormat::Jpeg),
            "png" => Some(AttachmentFormat::Png),
            _ => None,
        }
    }
}

/// Filesystem-safe name of a stored attachment: `<UUID>.<ext>`.
///
/// Only names of that exact shape can be constructed, so a key can never
/// point outside the attachment directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttachmentKey(String);

impl AttachmentKey {
    /// Generate a fresh random key for the given format
    pub fn generate(format: AttachmentFormat) -> Self {
        let stem = Uuid::new_v4().hyphenated().to_string().to_uppercase();
        Self(format!("{}.{}", stem, format.extension()))
    }

    /// Validate a stored name. Returns `None` for anything that is not a
    /// generated key.
    pub fn parse(name: &str) -> Option<Self> {
        let (stem, ext) = name.split_once('.')?;
        AttachmentFormat::from_extension(ext)?;
        Uuid::parse_str(stem).ok()?;
        if stem.len() != 36 {
            return None;
        }
        Some(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Format implied by the extension
    pub fn format(&self) -> AttachmentFormat {
        self.0
            .rsplit_once('.')
            .and_then(|(_, ext)| AttachmentFormat::from_extension(ext))
            .unwrap_or_default()
    }
}

impl fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AttachmentKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid attachment key: {}", value))
    }
}

impl From<AttachmentKey> for String {
    fn from(key: AttachmentKey) -> Self {
        key.0
    }
}

// ============================================
// Records
// ============================================

/// Behavior shared by both record kinds.
pub trait Record: Clone {
    /// Single-property change applied by an edit buffer
    type Field: Clone;

    const KIND: RecordKind;

    fn id(&self) -> RecordId;

    fn date(&self) -> DateTime<Utc>;

    /// Overwrite one property, normalizing it the same way inserts do.
    fn apply(&mut self, field: Self::Field);
}

/// A stored diary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryRecord {
    pub id: RecordId,
    /// Instant of the entry; grouped by calendar day for display
    pub date: DateTime<Utc>,
    /// Never empty; see [`normalize_title`]
    pub title: String,
    pub body: Option<String>,
    /// 0 to [`MAX_RATING`] inclusive
    pub rating: u8,
    /// Ordered tags; an empty list is stored as `None`
    pub tags: Option<Vec<String>>,
    pub place_name: Option<String>,
    pub attachment: Option<AttachmentKey>,
}

impl DiaryRecord {
    /// Re-apply the insert-time invariants to every field.
    pub fn normalized(mut self) -> Self {
        self.title = normalize_title(&self.title);
        self.rating = self.rating.min(MAX_RATING);
        self.tags = normalize_tags(self.tags);
        self
    }
}

/// Input for creating a diary entry. Unset fields get defaults on insert.
#[derive(Debug, Clone, Default)]
pub struct NewDiary {
    /// Defaults to the insertion instant
    pub date: Option<DateTime<Utc>>,
    pub title: String,
    pub body: Option<String>,
    /// Clamped into `0..=MAX_RATING`
    pub rating: i64,
    pub tags: Option<Vec<String>>,
    pub place_name: Option<String>,
    pub attachment: Option<AttachmentKey>,
}

/// Property-level change to a [`DiaryRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum DiaryField {
    Date(DateTime<Utc>),
    Title(String),
    Body(Option<String>),
    Rating(i64),
    Tags(Option<Vec<String>>),
    PlaceName(Option<String>),
    Attachment(Option<AttachmentKey>),
}

impl Record for DiaryRecord {
    type Field = DiaryField;

    const KIND: RecordKind = RecordKind::Diary;

    fn id(&self) -> RecordId {
        self.id
    }

    fn date(&self) -> DateTime<Utc> {
        self.date
    }

    fn apply(&mut self, field: DiaryField) {
        match field {
            DiaryField::Date(date) => self.date = date,
            DiaryField::Title(title) => self.title = normalize_title(&title),
            DiaryField::Body(body) => self.body = body,
            DiaryField::Rating(rating) => self.rating = clamp_rating(rating),
            DiaryField::Tags(tags) => self.tags = normalize_tags(tags),
            DiaryField::PlaceName(place) => self.place_name = place,
            DiaryField::Attachment(key) => self.attachment = key,
        }
    }
}

/// A stored payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: RecordId,
    pub date: DateTime<Utc>,
    /// Exact decimal; sign is not enforced
    pub amount: Decimal,
    pub category: String,
    pub note: Option<String>,
}

impl PaymentRecord {
    pub fn normalized(mut self) -> Self {
        self.category = normalize_category(&self.category);
        self
    }
}

/// Input for creating a payment. Unset fields get defaults on insert.
#[derive(Debug, Clone, Default)]
pub struct NewPayment {
    /// Defaults to the insertion instant
    pub date: Option<DateTime<Utc>>,
    pub amount: Decimal,
    pub category: String,
    pub note: Option<String>,
}

/// Property-level change to a [`PaymentRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentField {
    Date(DateTime<Utc>),
    Amount(Decimal),
    Category(String),
    Note(Option<String>),
}

impl Record for PaymentRecord {
    type Field = PaymentField;

    const KIND: RecordKind = RecordKind::Payment;

    fn id(&self) -> RecordId {
        self.id
    }

    fn date(&self) -> DateTime<Utc> {
        self.date
    }

    fn apply(&mut self, field: PaymentField) {
        match field {
            PaymentField::Date(date) => self.date = date,
            PaymentField::Amount(amount) => self.amount = amount,
            PaymentField::Category(category) => self.category = normalize_category(&category),
            PaymentField::Note(note) => self.note = note,
        }
    }
}

/// Either record kind, for kind-generic reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyRecord {
    Diary(DiaryRecord),
    Payment(PaymentRecord),
}

impl AnyRecord {
    pub fn id(&self) -> RecordId {
        match self {
            AnyRecord::Diary(d) => d.id,
            AnyRecord::Payment(p) => p.id,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            AnyRecord::Diary(_) => RecordKind::Diary,
            AnyRecord::Payment(_) => RecordKind::Payment,
        }
    }

    pub fn date(&self) -> DateTime<Utc> {
        match self {
            AnyRecord::Diary(d) => d.date,
            AnyRecord::Payment(p) => p.date,
        }
    }
}

// ============================================
// Normalization
// ============================================

/// Clamp a rating into `0..=MAX_RATING`. Out-of-range input is never rejected.
pub fn clamp_rating(rating: i64) -> u8 {
    rating.clamp(0, MAX_RATING as i64) as u8
}

/// Trim a title, falling back to [`UNTITLED`] when nothing is left.
pub fn normalize_title(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Trim tags and drop blank ones. An empty list becomes `None`.
pub fn normalize_tags(tags: Option<Vec<String>>) -> Option<Vec<String>> {
    let tags: Vec<String> = tags?
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags)
    }
}

/// Trim a category, falling back to [`DEFAULT_CATEGORY`].
pub fn normalize_category(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse amount text as typed by a person into an exact decimal.
///
/// Thousands separators, whitespace and currency symbols (`¥`, `￥`, `$`) are
/// stripped first. Text that would lose precision is rejected.
pub fn parse_amount(text: &str) -> crate::error::Result<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '¥' | '￥' | '$') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(crate::error::Error::InvalidAmount(text.to_string()));
    }

    Decimal::from_str_exact(&cleaned)
        .map_err(|_| crate::error::Error::InvalidAmount(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_amount_strips_separators_and_symbols() {
        assert_eq!(parse_amount("1,200").unwrap(), dec!(1200.00));
        assert_eq!(parse_amount("¥1,200").unwrap(), dec!(1200));
        assert_eq!(parse_amount(" $19.99 ").unwrap(), dec!(19.99));
        assert_eq!(parse_amount("-5.01").unwrap(), dec!(-5.01));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("¥").is_err());
        assert!(parse_amount("12a").is_err());
        assert!(parse_amount("1.2.3").is_err());
    }

    #[test]
    fn test_rating_clamp() {
        assert_eq!(clamp_rating(7), 5);
        assert_eq!(clamp_rating(-1), 0);
        assert_eq!(clamp_rating(3), 3);
    }

    #[test]
    fn test_title_and_tags_normalization() {
        assert_eq!(normalize_title("   "), UNTITLED);
        assert_eq!(normalize_title(" Walk "), "Walk");
        assert_eq!(normalize_tags(Some(vec![])), None);
        assert_eq!(
            normalize_tags(Some(vec![" a ".into(), "".into(), "b".into()])),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_attachment_key_shape() {
        let key = AttachmentKey::generate(AttachmentFormat::Png);
        assert!(key.as_str().ends_with(".png"));
        assert_eq!(AttachmentKey::parse(key.as_str()), Some(key.clone()));
        assert_eq!(key.format(), AttachmentFormat::Png);

        assert!(AttachmentKey::parse("../etc/passwd").is_none());
        assert!(AttachmentKey::parse("photo.jpg").is_none());
        assert!(AttachmentKey::parse("0B8E1E4C-5C3A-4C5B-9E0F-3A3F2B1C4D5E.gif").is_none());
        assert!(AttachmentKey::parse("0B8E1E4C-5C3A-4C5B-9E0F-3A3F2B1C4D5E.jpg").is_some());
    }

    #[test]
    fn test_field_apply_normalizes() {
        let mut diary = DiaryRecord {
            id: RecordId::new(),
            date: Utc::now(),
            title: "t".into(),
            body: None,
            rating: 1,
            tags: None,
            place_name: None,
            attachment: None,
        };
        diary.apply(DiaryField::Rating(9));
        diary.apply(DiaryField::Title(String::new()));
        assert_eq!(diary.rating, MAX_RATING);
        assert_eq!(diary.title, UNTITLED);
    }

    #[test]
    fn test_record_kind_roundtrip() {
        assert_eq!("diary".parse::<RecordKind>().unwrap(), RecordKind::Diary);
        assert!("note".parse::<RecordKind>().is_err());
    }
}
