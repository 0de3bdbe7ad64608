//! Database layer for diarypay
//!
//! This module provides the storage layer using SQLite with:
//! - An explicit open/recovery cascade ([`StoreHandle::load`])
//! - Schema migrations and per-row record upgrades
//! - Repository pattern for typed record access

pub mod repo;
pub mod schema;
pub mod store;

pub use repo::{merge_by_property, DiaryEdit, PaymentEdit, RecordEdit, RecordRepository};
pub use store::{RecoveryOutcome, StoreHandle, StoreState, STORE_FILE_NAME};
