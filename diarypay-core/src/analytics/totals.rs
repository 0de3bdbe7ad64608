//! Monthly spending totals and budget progress.

use crate::types::PaymentRecord;
use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// A calendar month, interpreted in some time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing `instant` as seen from `tz`
    pub fn containing<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> Self {
        let local = instant.with_timezone(tz);
        Self {
            year: local.year(),
            month: local.month(),
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Half-open `[start, end)` bounds of this month in `tz`, as UTC instants.
    pub fn bounds_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = start_of_day(self.first_day()?, tz)?;
        let end = start_of_day(self.next().first_day()?, tz)?;
        Some((start, end))
    }
}

/// First instant of `day` in `tz`.
///
/// Where midnight falls in a DST gap, the day starts at the first valid
/// local time after it.
fn start_of_day<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    let mut local = day.and_hms_opt(0, 0, 0)?;
    for _ in 0..4 {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
            LocalResult::None => local += Duration::minutes(30),
        }
    }
    None
}

/// Sum of payment amounts in the local calendar month containing `reference`.
pub fn monthly_total(payments: &[PaymentRecord], reference: DateTime<Utc>) -> Decimal {
    monthly_total_in(payments, reference, &Local)
}

/// Sum of payment amounts whose date falls in `[month start, next month start)`,
/// where the month is the one containing `reference` in `tz`.
///
/// The sum is exact; amounts are never routed through floating point. A sum
/// beyond the decimal range saturates at `Decimal::MAX` / `Decimal::MIN`.
pub fn monthly_total_in<Tz: TimeZone>(
    payments: &[PaymentRecord],
    reference: DateTime<Utc>,
    tz: &Tz,
) -> Decimal {
    let Some((start, end)) = Month::containing(reference, tz).bounds_in(tz) else {
        return Decimal::ZERO;
    };

    payments
        .iter()
        .filter(|p| p.date >= start && p.date < end)
        .fold(Decimal::ZERO, |total, p| match total.checked_add(p.amount) {
            Some(sum) => sum,
            None => {
                tracing::warn!(id = %p.id, amount = %p.amount, "Monthly total overflowed, saturating");
                total.saturating_add(p.amount)
            }
        })
}

/// Fraction of the monthly budget spent, clamped to `[0, 1]`.
///
/// Returns `None` when no positive budget is set.
pub fn budget_progress(total: Decimal, budget: i64) -> Option<f64> {
    if budget <= 0 {
        return None;
    }
    let ratio = (total / Decimal::from(budget)).clamp(Decimal::ZERO, Decimal::ONE);
    ratio.to_f64()
}
