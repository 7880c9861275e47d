//! Spending aggregation engine
//!
//! Summaries are computed on every call from the current store contents and
//! never cached. Bucketing always uses the receipt `date`, never `created_at`.
//!
//! Denominators differ on purpose:
//! - weekly `average_per_day` divides by days that had at least one receipt
//! - monthly `average_per_day` divides by the number of days in the month

use std::collections::BTreeMap;

use chrono::{Duration, Local, NaiveDate};
use tracing::debug;

use crate::error::Result;
use crate::models::{
    iso_week_label, CategoryReport, DailySummary, MonthlySummary, Pagination, Receipt,
    ReceiptDigest, ReceiptPage, Stats, StatsPeriod, WeekStart, WeeklySummary, YearMonth,
};
use crate::store::ReceiptStore;

/// Default page size for receipt listings
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Largest accepted page size
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Computes summaries for one user at a time over a receipt store
pub struct SummaryEngine<'a> {
    store: &'a dyn ReceiptStore,
    week_start: WeekStart,
}

impl<'a> SummaryEngine<'a> {
    pub fn new(store: &'a dyn ReceiptStore, week_start: WeekStart) -> Self {
        Self { store, week_start }
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    /// Spending on a single day
    pub fn daily(&self, user_id: &str, date: NaiveDate) -> Result<DailySummary> {
        let receipts = self.store.list_by_user_and_date(user_id, date)?;

        Ok(DailySummary {
            date,
            total_spent: total_of(&receipts),
            total_transactions: receipts.len(),
            category_totals: category_totals(&receipts),
            receipts: receipts.iter().map(ReceiptDigest::from).collect(),
        })
    }

    /// Spending for the week containing `date`
    pub fn weekly(&self, user_id: &str, date: NaiveDate) -> Result<WeeklySummary> {
        let week_start = self.week_start.week_start_for(date);
        let week_end = week_start + Duration::days(6);
        let receipts = self
            .store
            .list_by_user_and_date_range(user_id, week_start, week_end)?;

        let mut daily_totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for receipt in &receipts {
            *daily_totals.entry(receipt.date).or_insert(0.0) += receipt.total;
        }

        let total_spent = total_of(&receipts);
        let average_per_day = if daily_totals.is_empty() {
            0.0
        } else {
            total_spent / daily_totals.len() as f64
        };

        debug!(
            user_id,
            %week_start,
            receipts = receipts.len(),
            active_days = daily_totals.len(),
            "Computed weekly summary"
        );

        Ok(WeeklySummary {
            week_start,
            week_end,
            total_spent,
            daily_totals,
            average_per_day,
        })
    }

    /// Spending for a calendar month
    pub fn monthly(&self, user_id: &str, month: YearMonth) -> Result<MonthlySummary> {
        let receipts =
            self.store
                .list_by_user_and_date_range(user_id, month.first_day(), month.last_day())?;

        let mut weekly_totals: BTreeMap<String, f64> = BTreeMap::new();
        for receipt in &receipts {
            *weekly_totals
                .entry(iso_week_label(receipt.date))
                .or_insert(0.0) += receipt.total;
        }

        let total_spent = total_of(&receipts);

        Ok(MonthlySummary {
            month,
            total_spent,
            total_transactions: receipts.len(),
            category_totals: category_totals(&receipts),
            weekly_totals,
            average_per_day: total_spent / f64::from(month.days()),
        })
    }

    /// Category totals and percentage shares, optionally limited to a date range
    ///
    /// `total_spent` here is the sum of category totals, so receipts without
    /// categories do not count toward it.
    pub fn categories(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<CategoryReport> {
        let receipts = self.filtered(user_id, start, end)?;

        let category_totals = category_totals(&receipts);
        let mut category_items: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for receipt in &receipts {
            for cat in &receipt.categories {
                let names = category_items.entry(cat.category.clone()).or_default();
                for item in &cat.items {
                    if !names.contains(item) {
                        names.push(item.clone());
                    }
                }
            }
        }

        let total_spent: f64 = category_totals.values().sum();
        let category_percentages = category_totals
            .iter()
            .map(|(category, amount)| {
                let pct = if total_spent > 0.0 {
                    amount * 100.0 / total_spent
                } else {
                    0.0
                };
                (category.clone(), pct)
            })
            .collect();

        Ok(CategoryReport {
            category_totals,
            category_percentages,
            category_items,
            total_spent,
        })
    }

    /// One page of receipts, most recent first
    ///
    /// `page` is 1-based; zero values for page or limit are treated as 1.
    pub fn receipts_page(
        &self,
        user_id: &str,
        page: usize,
        limit: usize,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ReceiptPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let receipts = self.filtered(user_id, start, end)?;

        let total = receipts.len();
        let pages = total.div_ceil(limit);
        let receipts = receipts
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        Ok(ReceiptPage {
            receipts,
            pagination: Pagination {
                current: page,
                pages,
                total,
            },
        })
    }

    /// Summary for the period containing `today`
    pub fn stats(&self, user_id: &str, period: StatsPeriod, today: NaiveDate) -> Result<Stats> {
        Ok(match period {
            StatsPeriod::Daily => Stats::Daily(self.daily(user_id, today)?),
            StatsPeriod::Weekly => Stats::Weekly(self.weekly(user_id, today)?),
            StatsPeriod::Monthly => Stats::Monthly(self.monthly(user_id, YearMonth::of(today))?),
        })
    }

    fn filtered(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Receipt>> {
        match (start, end) {
            (None, None) => self.store.list_by_user(user_id),
            (start, end) => self.store.list_by_user_between(user_id, start, end),
        }
    }
}

fn total_of(receipts: &[Receipt]) -> f64 {
    receipts.iter().map(|r| r.total).sum()
}

/// Sum category totals across receipts; only observed categories appear
fn category_totals(receipts: &[Receipt]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for receipt in receipts {
        for cat in &receipt.categories {
            *totals.entry(cat.category.clone()).or_insert(0.0) += cat.total;
        }
    }
    totals
}
