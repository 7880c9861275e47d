//! Mock backend for testing
//!
//! Runs canned model output through the same parsers as the real backends,
//! so malformed-output paths can be exercised without a running model.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::parsing::{parse_categories, parse_extraction};
use super::types::{ExtractionResult, ItemCategory};
use super::AIBackend;

/// Raw reply used when no analysis response is configured
pub const MOCK_RECEIPT_RESPONSE: &str = r#"{
    "is_receipt": true,
    "store_name": "Mock Mart",
    "date": "2024-03-01",
    "time": "10:15",
    "items": [
        {"name": "Roti Tawar", "quantity": 1, "price": 15000, "total": 15000},
        {"name": "Aqua 600ml", "quantity": 2, "price": 3500, "total": 7000},
        {"name": "Sabun Mandi", "quantity": 1, "price": 8000, "total": 8000}
    ],
    "subtotal": 30000,
    "tax": 0,
    "total": 30000
}"#;

/// Mock AI backend for testing
///
/// Healthy by default; returns `MOCK_RECEIPT_RESPONSE` for images and a
/// keyword-based categorization for items.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    analysis_response: String,
    categories_response: Option<String>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            analysis_response: MOCK_RECEIPT_RESPONSE.to_string(),
            categories_response: None,
            failure: None,
            delay: None,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Create a new instance with a different model (no-op for mock)
    pub fn with_model(&self, _model: &str) -> Self {
        self.clone()
    }

    /// Raw model text returned for image analysis
    pub fn with_analysis_response(mut self, raw: impl Into<String>) -> Self {
        self.analysis_response = raw.into();
        self
    }

    /// Raw model text returned for categorization
    pub fn with_categories_response(mut self, raw: impl Into<String>) -> Self {
        self.categories_response = Some(raw.into());
        self
    }

    /// Every call fails as if the model were unreachable
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn simulate_call(&self) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(Error::ExtractionFailed(message.clone())),
            None => Ok(()),
        }
    }
}

/// Keyword guess used when no categories response is configured
pub(crate) fn guess_category(item: &str) -> &'static str {
    let name = item.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

    if has(&["aqua", "teh", "kopi", "coffee", "tea", "susu", "milk", "juice", "water"]) {
        "Beverage"
    } else if has(&["roti", "bread", "nasi", "rice", "mie", "noodle", "snack", "ayam"]) {
        "Food"
    } else if has(&["sabun", "soap", "deterjen", "detergent", "tissue", "shampoo"]) {
        "Household"
    } else if has(&["obat", "vitamin", "medicine", "masker"]) {
        "Health"
    } else if has(&["kabel", "cable", "charger", "battery", "baterai"]) {
        "Electronics"
    } else if has(&["kaos", "shirt", "sock", "kaus", "celana"]) {
        "Clothing"
    } else {
        "Other"
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn analyze_image(&self, _image_data: &[u8], _mime_type: &str) -> Result<ExtractionResult> {
        self.simulate_call().await?;
        parse_extraction(&self.analysis_response)
    }

    async fn categorize_items(&self, items: &[String]) -> Result<Vec<ItemCategory>> {
        self.simulate_call().await?;

        if let Some(ref raw) = self.categories_response {
            return parse_categories(raw);
        }

        let mut categories: Vec<ItemCategory> = Vec::new();
        for item in items {
            let label = guess_category(item);
            match categories.iter_mut().find(|c| c.category == label) {
                Some(existing) => existing.items.push(item.clone()),
                None => categories.push(ItemCategory {
                    category: label.to_string(),
                    items: vec![item.clone()],
                    total: None,
                }),
            }
        }
        Ok(categories)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
