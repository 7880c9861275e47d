//! Extraction adapter
//!
//! Turns raw model output into receipt drafts and categorizes line items.
//! Every model call runs under a timeout; a timeout is an extraction failure,
//! never an empty success.

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient, ExtractionResult, ParsedReceipt};
use crate::error::{Error, Result};
use crate::models::{CategoryBreakdown, LineItem, ReceiptDraft};

/// Canonical spending categories
pub const CATEGORY_VOCABULARY: [&str; 7] = [
    "Food",
    "Beverage",
    "Household",
    "Health",
    "Electronics",
    "Clothing",
    OTHER_CATEGORY,
];

/// Bucket for anything the model could not place
pub const OTHER_CATEGORY: &str = "Other";

/// Date layouts accepted from the model, most specific first
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
];

/// What the adapter made of an image
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Receipt(ReceiptDraft),
    NonReceipt(String),
}

/// Wraps an AI backend with timeouts and normalization
#[derive(Clone)]
pub struct ReceiptExtractor {
    ai: AIClient,
    timeout: Duration,
}

impl ReceiptExtractor {
    pub fn new(ai: AIClient, timeout: Duration) -> Self {
        Self { ai, timeout }
    }

    pub fn ai(&self) -> &AIClient {
        &self.ai
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask the model about an image and normalize its answer
    ///
    /// `ingested_on` is used when the receipt date is missing or unreadable.
    pub async fn extract(
        &self,
        image_data: &[u8],
        mime_type: &str,
        ingested_on: NaiveDate,
    ) -> Result<Extraction> {
        let analysis = tokio::time::timeout(
            self.timeout,
            self.ai.analyze_image(image_data, mime_type),
        )
        .await
        .map_err(|_| {
            Error::ExtractionFailed(format!(
                "Model did not answer within {}s",
                self.timeout.as_secs()
            ))
        })?
        .map_err(into_extraction_error)?;

        match analysis {
            ExtractionResult::NonReceipt(description) => Ok(Extraction::NonReceipt(description)),
            ExtractionResult::Receipt(parsed) => {
                Ok(Extraction::Receipt(normalize_receipt(parsed, ingested_on)?))
            }
        }
    }

    /// Partition line items into categories, summing each category's line totals
    ///
    /// Best effort: any failure yields an empty list and a warning.
    pub async fn classify(&self, items: &[LineItem]) -> Vec<CategoryBreakdown> {
        if items.is_empty() {
            return Vec::new();
        }

        let names: Vec<String> = items.iter().map(|i| i.name.clone()).collect();
        let assigned = match tokio::time::timeout(self.timeout, self.ai.categorize_items(&names))
            .await
        {
            Ok(Ok(categories)) => categories,
            Ok(Err(e)) => {
                warn!(error = %e, items = items.len(), "Item categorization failed");
                return Vec::new();
            }
            Err(_) => {
                warn!(items = items.len(), "Item categorization timed out");
                return Vec::new();
            }
        };

        let mut label_for: HashMap<String, &'static str> = HashMap::new();
        for category in &assigned {
            let label = canonical_category(&category.category);
            for name in &category.items {
                label_for.entry(name_key(name)).or_insert(label);
            }
        }

        let breakdown = group_by_label(items, |item| {
            label_for
                .get(&name_key(&item.name))
                .copied()
                .unwrap_or(OTHER_CATEGORY)
        });
        debug!(categories = breakdown.len(), "Classified receipt items");
        breakdown
    }
}

/// Map a model-provided label onto the canonical vocabulary
///
/// Case-insensitive; Indonesian labels are accepted. Unknown labels are `Other`.
pub fn canonical_category(label: &str) -> &'static str {
    match label.trim().to_lowercase().as_str() {
        "food" | "makanan" | "groceries" | "grocery" | "snack" | "snacks" => "Food",
        "beverage" | "beverages" | "drink" | "drinks" | "minuman" => "Beverage",
        "household" | "kebersihan" | "cleaning" | "rumah tangga" => "Household",
        "health" | "kesehatan" | "medicine" | "pharmacy" => "Health",
        "electronics" | "electronic" | "elektronik" => "Electronics",
        "clothing" | "clothes" | "apparel" | "pakaian" => "Clothing",
        _ => OTHER_CATEGORY,
    }
}

/// Parse a receipt date in any of the accepted layouts
pub fn parse_receipt_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Normalize model fields into a storable draft
///
/// Quantities default to 1, negative amounts clamp to 0, a missing total is
/// rebuilt from subtotal + tax or the line totals. Only a negative total is
/// rejected outright.
pub fn normalize_receipt(parsed: ParsedReceipt, ingested_on: NaiveDate) -> Result<ReceiptDraft> {
    if let Some(total) = parsed.total {
        if total < 0.0 || !total.is_finite() {
            return Err(Error::MalformedModelOutput(format!(
                "Receipt total must be non-negative, got {}",
                total
            )));
        }
    }

    let date = match parsed.date.as_deref().and_then(parse_receipt_date) {
        Some(date) => date,
        None => {
            warn!(
                raw_date = ?parsed.date,
                fallback = %ingested_on,
                "Receipt date missing or unreadable, using ingestion date"
            );
            ingested_on
        }
    };

    let items: Vec<LineItem> = parsed
        .items
        .into_iter()
        .map(|item| {
            let quantity = item
                .quantity
                .filter(|q| q.is_finite() && *q > 0.0)
                .unwrap_or(1.0);
            let unit_price = non_negative(item.price.unwrap_or(0.0));
            let line_total = non_negative(item.total.unwrap_or(unit_price * quantity));
            let name = item.name.trim();
            LineItem {
                name: if name.is_empty() {
                    "unknown".to_string()
                } else {
                    name.to_string()
                },
                quantity,
                unit_price,
                line_total,
            }
        })
        .collect();

    let items_sum: f64 = items.iter().map(|i| i.line_total).sum();
    let tax = non_negative(parsed.tax.unwrap_or(0.0));
    let subtotal = parsed.subtotal.map(non_negative);
    let total = parsed
        .total
        .or_else(|| subtotal.map(|s| s + tax))
        .unwrap_or(items_sum);

    Ok(ReceiptDraft {
        store_name: non_blank(parsed.store_name),
        date,
        time: non_blank(parsed.time),
        items,
        subtotal: subtotal.unwrap_or(items_sum),
        tax,
        total,
    })
}

/// Group line items by label, keeping first-seen order
fn group_by_label<'a, F>(items: &'a [LineItem], mut label: F) -> Vec<CategoryBreakdown>
where
    F: FnMut(&'a LineItem) -> &'static str,
{
    let mut groups: Vec<CategoryBreakdown> = Vec::new();
    for item in items {
        let category = label(item);
        let group = match groups.iter().position(|g| g.category == category) {
            Some(idx) => &mut groups[idx],
            None => {
                groups.push(CategoryBreakdown {
                    category: category.to_string(),
                    items: Vec::new(),
                    total: 0.0,
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        group.items.push(item.name.clone());
        group.total += item.line_total;
    }
    groups
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn non_negative(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

/// Everything that is not already a model-output error is a failed extraction
fn into_extraction_error(err: Error) -> Error {
    match err {
        Error::MalformedModelOutput(_) | Error::ExtractionFailed(_) => err,
        other => Error::ExtractionFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockBackend, ParsedReceiptItem};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extractor(mock: MockBackend) -> ReceiptExtractor {
        ReceiptExtractor::new(AIClient::Mock(mock), Duration::from_secs(5))
    }

    fn item(name: &str, total: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            quantity: 1.0,
            unit_price: total,
            line_total: total,
        }
    }

    #[test]
    fn test_parse_receipt_date_formats() {
        assert_eq!(parse_receipt_date("2024-03-01"), Some(day(2024, 3, 1)));
        assert_eq!(parse_receipt_date("01/03/2024"), Some(day(2024, 3, 1)));
        assert_eq!(parse_receipt_date("01-03-2024"), Some(day(2024, 3, 1)));
        assert_eq!(parse_receipt_date(" 2024/03/01 "), Some(day(2024, 3, 1)));
        assert_eq!(parse_receipt_date("01.03.2024"), Some(day(2024, 3, 1)));
        assert_eq!(parse_receipt_date("yesterday"), None);
    }

    #[test]
    fn test_canonical_category() {
        assert_eq!(canonical_category("Makanan"), "Food");
        assert_eq!(canonical_category("  MINUMAN "), "Beverage");
        assert_eq!(canonical_category("kebersihan"), "Household");
        assert_eq!(canonical_category("Electronics"), "Electronics");
        assert_eq!(canonical_category("Lainnya"), "Other");
        assert_eq!(canonical_category("Pet Supplies"), "Other");
        for label in CATEGORY_VOCABULARY {
            assert_eq!(canonical_category(label), label);
        }
    }

    #[test]
    fn test_normalize_defaults() {
        let parsed = ParsedReceipt {
            store_name: Some("  ".into()),
            date: Some("not a date".into()),
            time: Some("null".into()),
            items: vec![
                ParsedReceiptItem {
                    name: "Teh Botol".into(),
                    quantity: Some(0.0),
                    price: Some(5000.0),
                    total: None,
                },
                ParsedReceiptItem {
                    name: "Diskon".into(),
                    quantity: Some(1.0),
                    price: Some(-2000.0),
                    total: Some(-2000.0),
                },
            ],
            subtotal: None,
            tax: None,
            total: None,
        };

        let draft = normalize_receipt(parsed, day(2024, 3, 9)).unwrap();
        assert_eq!(draft.store_name, None);
        assert_eq!(draft.time, None);
        assert_eq!(draft.date, day(2024, 3, 9));
        assert_eq!(draft.items[0].quantity, 1.0);
        assert_eq!(draft.items[0].line_total, 5000.0);
        assert_eq!(draft.items[1].unit_price, 0.0);
        assert_eq!(draft.items[1].line_total, 0.0);
        assert_eq!(draft.subtotal, 5000.0);
        assert_eq!(draft.tax, 0.0);
        assert_eq!(draft.total, 5000.0);
    }

    #[test]
    fn test_normalize_total_fallback_to_subtotal_plus_tax() {
        let parsed = ParsedReceipt {
            date: Some("2024-03-01".into()),
            items: vec![ParsedReceiptItem {
                name: "Kopi".into(),
                quantity: Some(1.0),
                price: Some(18000.0),
                total: Some(18000.0),
            }],
            subtotal: Some(20000.0),
            tax: Some(2200.0),
            total: None,
            ..Default::default()
        };
        let draft = normalize_receipt(parsed, day(2024, 3, 9)).unwrap();
        // subtotal and line totals are not reconciled
        assert_eq!(draft.subtotal, 20000.0);
        assert_eq!(draft.total, 22200.0);
    }

    #[test]
    fn test_normalize_rejects_negative_total() {
        let parsed = ParsedReceipt {
            total: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            normalize_receipt(parsed, day(2024, 3, 9)),
            Err(Error::MalformedModelOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_receipt() {
        let ex = extractor(MockBackend::new());
        let Extraction::Receipt(draft) = ex.extract(b"img", "image/jpeg", day(2024, 3, 9)).await.unwrap() else {
            panic!("expected receipt");
        };
        assert_eq!(draft.store_name.as_deref(), Some("Mock Mart"));
        assert_eq!(draft.date, day(2024, 3, 1));
        assert_eq!(draft.total, 30000.0);
    }

    #[tokio::test]
    async fn test_extract_non_receipt() {
        let ex = extractor(
            MockBackend::new()
                .with_analysis_response(r#"{"is_receipt": false, "description": "a sunset photo"}"#),
        );
        let result = ex.extract(b"img", "image/jpeg", day(2024, 3, 9)).await.unwrap();
        assert_eq!(result, Extraction::NonReceipt("a sunset photo".into()));
    }

    #[tokio::test]
    async fn test_extract_malformed() {
        let ex = extractor(MockBackend::new().with_analysis_response("I can't help with that."));
        let err = ex.extract(b"img", "image/jpeg", day(2024, 3, 9)).await.unwrap_err();
        assert!(matches!(err, Error::MalformedModelOutput(_)));
    }

    #[tokio::test]
    async fn test_extract_timeout_is_failure() {
        let ex = ReceiptExtractor::new(
            AIClient::Mock(MockBackend::new().with_delay(Duration::from_millis(200))),
            Duration::from_millis(20),
        );
        let err = ex.extract(b"img", "image/jpeg", day(2024, 3, 9)).await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_extract_backend_error_is_failure() {
        let ex = extractor(MockBackend::new().failing("model overloaded"));
        let err = ex.extract(b"img", "image/jpeg", day(2024, 3, 9)).await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_classify_empty() {
        let ex = extractor(MockBackend::new());
        assert!(ex.classify(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_classify_sums_line_totals_and_keeps_unassigned() {
        let ex = extractor(MockBackend::new().with_categories_response(
            r#"{"categories": [
                {"category": "Makanan", "items": ["roti tawar"], "total": 1},
                {"category": "Minuman", "items": ["Aqua 600ml", "Teh Botol"]},
                {"category": "Furniture", "items": ["Kursi"]}
            ]}"#,
        ));
        let items = vec![
            item("Roti Tawar", 15000.0),
            item("Aqua 600ml", 7000.0),
            item("Teh Botol", 5000.0),
            item("Kursi", 250000.0),
            item("Mystery Item", 1000.0),
        ];

        let cats = ex.classify(&items).await;
        let names: Vec<_> = cats.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Food", "Beverage", "Other"]);

        assert_eq!(cats[0].total, 15000.0);
        assert_eq!(cats[1].total, 12000.0);
        assert_eq!(cats[1].items, vec!["Aqua 600ml", "Teh Botol"]);
        // unknown label and unassigned item both land in Other
        assert_eq!(cats[2].items, vec!["Kursi", "Mystery Item"]);
        assert_eq!(cats[2].total, 251000.0);

        let covered: f64 = cats.iter().map(|c| c.total).sum();
        let all: f64 = items.iter().map(|i| i.line_total).sum();
        assert_eq!(covered, all);
    }

    #[tokio::test]
    async fn test_classify_degrades_to_empty() {
        let ex = extractor(MockBackend::new().failing("down"));
        assert!(ex.classify(&[item("Roti", 1.0)]).await.is_empty());

        let ex = extractor(MockBackend::new().with_categories_response("no json here"));
        assert!(ex.classify(&[item("Roti", 1.0)]).await.is_empty());
    }
}
