//! AI backend response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Deserializer, Serialize};

/// Outcome of asking the model about an image
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    /// The image is a receipt; fields are as reported by the model
    Receipt(ParsedReceipt),
    /// Not a receipt; free-text description of what the image shows
    NonReceipt(String),
}

/// Receipt fields as returned by the model (unnormalized)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    #[serde(default)]
    pub store_name: Option<String>,
    /// Usually `YYYY-MM-DD`, but models are not always obedient
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub items: Vec<ParsedReceiptItem>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<f64>,
}

/// A line item extracted from a receipt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedReceiptItem {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub quantity: Option<f64>,
    /// Unit price
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: Option<f64>,
    /// Line total
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<f64>,
}

/// A category assignment returned by the categorization prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCategory {
    pub category: String,
    #[serde(default)]
    pub items: Vec<String>,
    /// Model's own total; informational only, totals are recomputed from line items
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total: Option<f64>,
}

/// Accept numbers, numeric strings, or null for amount fields
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<Amount>::deserialize(deserializer)? {
        Some(Amount::Number(n)) => Some(n),
        Some(Amount::Text(s)) => s.trim().parse().ok(),
        Some(Amount::Other(_)) | None => None,
    })
}
