//! Domain models for Struk

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A parsed and stored shopping receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub user_id: String,
    pub store_name: Option<String>,
    /// Transaction date; the only field used for date bucketing
    pub date: NaiveDate,
    /// Time of day as printed on the receipt (display only)
    pub time: Option<String>,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax: f64,
    /// Authoritative amount for aggregation
    pub total: f64,
    pub categories: Vec<CategoryBreakdown>,
    /// Ingestion timestamp, used only for recency ordering
    pub created_at: DateTime<Utc>,
}

/// A single purchased line on a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub line_total: f64,
}

/// Spending attributed to one category within a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: String,
    pub items: Vec<String>,
    pub total: f64,
}

/// Receipt fields produced by extraction, before id/user/categories are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDraft {
    pub store_name: Option<String>,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl ReceiptDraft {
    /// Promote a draft into a stored receipt
    pub fn into_receipt(
        self,
        id: String,
        user_id: &str,
        categories: Vec<CategoryBreakdown>,
        created_at: DateTime<Utc>,
    ) -> Receipt {
        Receipt {
            id,
            user_id: user_id.to_string(),
            store_name: self.store_name,
            date: self.date,
            time: self.time,
            items: self.items,
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
            categories,
            created_at,
        }
    }
}

// ========== Summaries ==========

/// Per-receipt line in a daily summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDigest {
    pub store_name: Option<String>,
    pub time: Option<String>,
    pub total: f64,
}

impl From<&Receipt> for ReceiptDigest {
    fn from(receipt: &Receipt) -> Self {
        Self {
            store_name: receipt.store_name.clone(),
            time: receipt.time.clone(),
            total: receipt.total,
        }
    }
}

/// Spending for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_spent: f64,
    pub total_transactions: usize,
    pub category_totals: BTreeMap<String, f64>,
    /// In store order (most recently ingested first)
    pub receipts: Vec<ReceiptDigest>,
}

/// Spending for a seven-day week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub total_spent: f64,
    /// Only days with at least one receipt appear
    pub daily_totals: BTreeMap<NaiveDate, f64>,
    /// Total divided by the number of active days
    pub average_per_day: f64,
}

/// Spending for a calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total_spent: f64,
    pub total_transactions: usize,
    pub category_totals: BTreeMap<String, f64>,
    /// Keyed by ISO week label, e.g. `2024-W09`
    pub weekly_totals: BTreeMap<String, f64>,
    /// Total divided by the number of days in the month
    pub average_per_day: f64,
}

/// Category totals and shares across a filtered set of receipts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    pub category_totals: BTreeMap<String, f64>,
    pub category_percentages: BTreeMap<String, f64>,
    /// Distinct item names per category, in first-seen order; repeat
    /// purchases of the same item appear once
    pub category_items: BTreeMap<String, Vec<String>>,
    /// Sum of category totals (receipts without categories do not count)
    pub total_spent: f64,
}

/// Page metadata for receipt listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub current: usize,
    pub pages: usize,
    pub total: usize,
}

/// One page of a user's receipts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptPage {
    pub receipts: Vec<Receipt>,
    pub pagination: Pagination,
}

/// Summary selected by a stats period
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "period", rename_all = "lowercase")]
pub enum Stats {
    Daily(DailySummary),
    Weekly(WeeklySummary),
    Monthly(MonthlySummary),
}

/// Period selector for stats queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parse a period, falling back to monthly for anything unrecognized
    pub fn parse_lenient(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl std::str::FromStr for StatsPeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(format!("Unknown stats period: {}", s)),
        }
    }
}

impl std::fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day a week is considered to begin on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    /// ISO 8601 weeks
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Sunday => "sunday",
        }
    }

    /// First day of the week containing `date`
    pub fn week_start_for(&self, date: NaiveDate) -> NaiveDate {
        let offset = match self {
            Self::Monday => date.weekday().num_days_from_monday(),
            Self::Sunday => date.weekday().num_days_from_sunday(),
        };
        date - chrono::Duration::days(i64::from(offset))
    }
}

impl std::str::FromStr for WeekStart {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" | "iso" => Ok(Self::Monday),
            "sunday" | "sun" => Ok(Self::Sunday),
            _ => Err(format!("Unknown week start: {}", s)),
        }
    }
}

impl std::fmt::Display for WeekStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A calendar month, serialized as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidRequest(format!("Invalid month: {}", month)));
        }
        Ok(Self { year, month })
    }

    /// Month containing the given date
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Month is validated at construction, so day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or_default()
    }

    pub fn days(&self) -> u32 {
        self.last_day().day()
    }
}

impl std::str::FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRequest(format!("Invalid month (expected YYYY-MM): {}", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// ISO week label (`YYYY-Www`) using the ISO week-based year
pub fn iso_week_label(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_month_parse_and_bounds() {
        let feb: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        assert_eq!(feb.days(), 29);

        let dec: YearMonth = "2023-12".parse().unwrap();
        assert_eq!(dec.last_day(), date(2023, 12, 31));
        assert_eq!(dec.to_string(), "2023-12");

        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("march".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_serializes_as_string() {
        let ym = YearMonth::new(2024, 3).unwrap();
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2024-03\"");
        let back: YearMonth = serde_json::from_str("\"2024-03\"").unwrap();
        assert_eq!(back, ym);
    }

    #[test]
    fn test_week_start_for() {
        // 2024-03-06 is a Wednesday
        let wed = date(2024, 3, 6);
        assert_eq!(WeekStart::Monday.week_start_for(wed), date(2024, 3, 4));
        assert_eq!(WeekStart::Sunday.week_start_for(wed), date(2024, 3, 3));

        // A Sunday belongs to the previous ISO week
        let sun = date(2024, 3, 10);
        assert_eq!(WeekStart::Monday.week_start_for(sun), date(2024, 3, 4));
        assert_eq!(WeekStart::Sunday.week_start_for(sun), sun);
    }

    #[test]
    fn test_iso_week_label_uses_week_based_year() {
        assert_eq!(iso_week_label(date(2024, 3, 1)), "2024-W09");
        // 2021-01-01 falls in the last ISO week of 2020
        assert_eq!(iso_week_label(date(2021, 1, 1)), "2020-W53");
        // 2024-12-30 is already ISO week 1 of 2025
        assert_eq!(iso_week_label(date(2024, 12, 30)), "2025-W01");
    }

    #[test]
    fn test_stats_period_lenient() {
        assert_eq!(StatsPeriod::parse_lenient(Some("daily")), StatsPeriod::Daily);
        assert_eq!(StatsPeriod::parse_lenient(Some("WEEKLY")), StatsPeriod::Weekly);
        assert_eq!(StatsPeriod::parse_lenient(Some("yearly")), StatsPeriod::Monthly);
        assert_eq!(StatsPeriod::parse_lenient(None), StatsPeriod::Monthly);
    }

    #[test]
    fn test_receipt_serializes_camel_case() {
        let receipt = Receipt {
            id: "r1".into(),
            user_id: "u1".into(),
            store_name: None,
            date: date(2024, 3, 1),
            time: Some("10:15".into()),
            items: vec![LineItem {
                name: "Roti".into(),
                quantity: 1.0,
                unit_price: 15000.0,
                line_total: 15000.0,
            }],
            subtotal: 15000.0,
            tax: 0.0,
            total: 15000.0,
            categories: vec![],
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["date"], "2024-03-01");
        assert!(json["storeName"].is_null());
        assert_eq!(json["items"][0]["lineTotal"], 15000.0);
    }
}
