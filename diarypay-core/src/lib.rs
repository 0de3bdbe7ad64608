//! # diarypay-core
//!
//! Storage core for a personal diary and payment log.
//!
//! This library provides:
//! - Record types for diary entries and payments
//! - A SQLite-backed store that recovers from unreadable files on open
//! - A repository with property-level merging of concurrent edits
//! - Pure aggregation: day grouping, monthly totals, text search
//! - An image attachment directory with orphan collection
//! - Configuration management and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use diarypay_core::{AppContext, Config, NewPayment};
//!
//! let config = Config::load().expect("failed to load config");
//! let ctx = AppContext::open(&config);
//! if ctx.outcome().is_degraded() {
//!     eprintln!("changes will not be saved");
//! }
//!
//! let amount = diarypay_core::parse_amount("¥1,200").expect("bad amount");
//! ctx.records()
//!     .insert_payment(NewPayment { amount, ..Default::default() })
//!     .expect("insert failed");
//! ctx.save().expect("save failed");
//! ```

// Re-export commonly used items at the crate root
pub use attachments::{AttachmentStore, SweepReport};
pub use config::{Config, Preferences};
pub use context::{AppContext, MonthlySpending};
pub use db::{RecordRepository, RecoveryOutcome, StoreHandle, StoreState};
pub use error::{AttachmentError, Error, Result, StoreError};
pub use types::*;

// Public modules
pub mod analytics;
pub mod attachments;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
