//! Composition root: builds the store and attachment directory from config.

use crate::analytics;
use crate::attachments::{AttachmentStore, SweepReport};
use crate::config::{Config, Preferences};
use crate::db::{RecordRepository, RecoveryOutcome, StoreHandle};
use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Spending for one calendar month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySpending {
    pub total: Decimal,
    /// Fraction of the budget used, when a budget is set
    pub progress: Option<f64>,
}

/// Everything the host application needs, opened once at startup.
#[derive(Debug)]
pub struct AppContext {
    store: StoreHandle,
    attachments: AttachmentStore,
    preferences: Preferences,
    outcome: RecoveryOutcome,
}

impl AppContext {
    /// Open the store (running recovery if needed) and the attachment directory.
    ///
    /// Never fails: a store that cannot be opened durably comes back degraded,
    /// which [`outcome`](Self::outcome) reports.
    pub fn open(config: &Config) -> Self {
        let mut store = StoreHandle::open(&config.storage_dir(), config.storage.in_memory);
        let outcome = store.load();
        if let RecoveryOutcome::Degraded(reason) = &outcome {
            tracing::error!(reason = %reason, "Running without durable storage");
        }

        let attachments = AttachmentStore::new(config.attachment_dir());
        tracing::info!(
            store = ?store.path(),
            attachments = %attachments.dir().display(),
            state = ?store.state(),
            "Application context ready"
        );

        Self {
            store,
            attachments,
            preferences: config.preferences.clone(),
            outcome,
        }
    }

    /// How the store came up
    pub fn outcome(&self) -> &RecoveryOutcome {
        &self.outcome
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn records(&self) -> RecordRepository<'_> {
        RecordRepository::new(&self.store)
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Commit pending record changes
    pub fn save(&self) -> std::result::Result<(), StoreError> {
        self.store.save()
    }

    /// Total spent in the local month containing `reference`, measured
    /// against the configured budget.
    pub fn monthly_spending(&self, reference: DateTime<Utc>) -> Result<MonthlySpending> {
        let payments = self.records().list_payments()?;
        let total = analytics::monthly_total(&payments, reference);
        let progress = self
            .preferences
            .budget()
            .and_then(|budget| analytics::budget_progress(total, budget));
        Ok(MonthlySpending { total, progress })
    }

    /// Delete attachment blobs that no record references.
    ///
    /// Skipped while the store is not durable or has unsaved changes. In
    /// both cases the visible record set is not what is on disk, and a blob
    /// referenced only by a committed record would look orphaned.
    pub fn collect_garbage(&self) -> Result<SweepReport> {
        if !self.store.is_durable() {
            tracing::warn!(state = ?self.store.state(), "Skipping attachment sweep on non-durable store");
            return Ok(SweepReport::default());
        }
        if self.store.is_dirty() {
            tracing::warn!("Skipping attachment sweep while changes are unsaved");
            return Ok(SweepReport::default());
        }

        let live = self.records().attachment_keys()?;
        Ok(self.attachments.sweep_orphans(&live)?)
    }
}
