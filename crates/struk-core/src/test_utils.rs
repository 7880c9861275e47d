//! Test utilities for struk-core
//!
//! Provides a mock Ollama server for integration tests plus receipt fixtures.
//!
//! The mock server answers `/api/generate` by looking at the prompt: receipt
//! analysis prompts get a canned receipt, categorization prompts get a keyword
//! grouping of the listed items. Image payloads starting with
//! [`NOT_A_RECEIPT_IMAGE`] or [`GARBLED_IMAGE`] select the non-receipt and
//! malformed-output replies.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use base64::Engine;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

use crate::ai::{guess_category, MOCK_RECEIPT_RESPONSE};
use crate::models::{CategoryBreakdown, LineItem, Receipt};

/// Image bytes the mock server describes as a non-receipt
pub const NOT_A_RECEIPT_IMAGE: &[u8] = b"NOT_A_RECEIPT";

/// Image bytes the mock server answers with unparseable text
pub const GARBLED_IMAGE: &[u8] = b"GARBLED";

/// Description returned for [`NOT_A_RECEIPT_IMAGE`]
pub const MOCK_DESCRIPTION: &str = "a cat sleeping on a keyboard";

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![
            ModelInfo {
                name: "llama3.2:latest".to_string(),
                modified_at: "2024-01-01T00:00:00Z".to_string(),
                size: 2_000_000_000,
            },
            ModelInfo {
                name: "llava:latest".to_string(),
                modified_at: "2024-01-01T00:00:00Z".to_string(),
                size: 4_700_000_000,
            },
        ],
    })
}

/// Ollama generate endpoint
async fn handle_generate(Json(request): Json<GenerateRequest>) -> Json<GenerateResponse> {
    // These patterns match the prompt files in prompts/*.md
    let response = if request.prompt.contains("decide whether it is a shopping receipt") {
        handle_analyze_mock(&request.images)
    } else if request.prompt.contains("Categorize these receipt items:") {
        handle_categorize_mock(&request.prompt)
    } else {
        "I don't understand the question.".to_string()
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
}

/// Handle image analysis, keyed on the decoded image bytes
fn handle_analyze_mock(images: &[String]) -> String {
    let image = images
        .first()
        .and_then(|b64| base64::engine::general_purpose::STANDARD.decode(b64).ok())
        .unwrap_or_default();

    if image.starts_with(NOT_A_RECEIPT_IMAGE) {
        format!(
            r#"Sure! {{"is_receipt": false, "description": "{}"}}"#,
            MOCK_DESCRIPTION
        )
    } else if image.starts_with(GARBLED_IMAGE) {
        "The picture is too dark to read anything.".to_string()
    } else {
        // Models often wrap JSON in a code fence
        format!("```json\n{}\n```", MOCK_RECEIPT_RESPONSE)
    }
}

/// Handle categorization by grouping the listed items on keywords
fn handle_categorize_mock(prompt: &str) -> String {
    let items = extract_items_from_prompt(prompt);

    let mut categories: Vec<MockCategory> = Vec::new();
    for item in items {
        let label = guess_category(&item);
        match categories.iter_mut().find(|c| c.category == label) {
            Some(existing) => existing.items.push(item),
            None => categories.push(MockCategory {
                category: label.to_string(),
                items: vec![item],
            }),
        }
    }

    serde_json::json!({ "categories": categories }).to_string()
}

/// Extract the JSON item list from: Categorize these receipt items: [...]
fn extract_items_from_prompt(prompt: &str) -> Vec<String> {
    let marker = "Categorize these receipt items: ";
    let Some(start) = prompt.find(marker) else {
        return Vec::new();
    };
    let after_start = &prompt[start + marker.len()..];
    let end = after_start.find('\n').unwrap_or(after_start.len());
    serde_json::from_str(after_start[..end].trim()).unwrap_or_default()
}

// Request/Response types for the mock server

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(default)]
    images: Vec<String>,
    #[allow(dead_code)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct MockCategory {
    category: String,
    items: Vec<String>,
}

// ========== Receipt fixtures ==========

/// Fixed ingestion clock: 2024-03-01T00:00:00Z plus `offset_secs`
pub fn created_at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
        + Duration::seconds(offset_secs)
}

/// Receipt with a single line item and no categories
///
/// `created_offset` orders receipts by recency: a higher offset is newer.
pub fn receipt(user_id: &str, id: &str, date: &str, total: f64, created_offset: i64) -> Receipt {
    Receipt {
        id: id.to_string(),
        user_id: user_id.to_string(),
        store_name: Some("Test Store".to_string()),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        time: Some("12:00".to_string()),
        items: vec![LineItem {
            name: "Item".to_string(),
            quantity: 1.0,
            unit_price: total,
            line_total: total,
        }],
        subtotal: total,
        tax: 0.0,
        total,
        categories: Vec::new(),
        created_at: created_at(created_offset),
    }
}

/// Receipt with one `"{category} item"` line per category
pub fn receipt_with_categories(
    user_id: &str,
    id: &str,
    date: &str,
    total: f64,
    created_offset: i64,
    categories: &[(&str, f64)],
) -> Receipt {
    let mut r = receipt(user_id, id, date, total, created_offset);
    r.items = categories
        .iter()
        .map(|(category, amount)| LineItem {
            name: format!("{} item", category),
            quantity: 1.0,
            unit_price: *amount,
            line_total: *amount,
        })
        .collect();
    r.categories = categories
        .iter()
        .map(|(category, amount)| CategoryBreakdown {
            category: category.to_string(),
            items: vec![format!("{} item", category)],
            total: *amount,
        })
        .collect();
    r
}
