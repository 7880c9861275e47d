//! Receipt handlers: upload, listing, lookup and deletion

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::parse_date_param;
use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use struk_core::models::{Receipt, ReceiptPage};
use struk_core::summary::DEFAULT_PAGE_LIMIT;
use struk_core::{IngestOutcome, ReceiptStore};

/// Accepted image extensions and their canonical MIME types
const ALLOWED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

fn mime_for_extension(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

fn is_allowed_mime(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|(ext, mime)| content_type == *mime || content_type == format!("image/{}", ext))
}

/// Resolve the MIME type of an uploaded file
///
/// Both the declared content type and the filename extension must name an
/// allowed image type when present; at least one of them must be present.
pub(crate) fn resolve_image_type(
    filename: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, AppError> {
    let reject = || AppError::bad_request("Only image files are allowed (jpeg, jpg, png, gif)");

    let from_extension = match filename.filter(|f| !f.is_empty()) {
        Some(name) => Some(mime_for_extension(name).ok_or_else(reject)?),
        None => None,
    };

    match content_type.filter(|c| !c.is_empty() && *c != "application/octet-stream") {
        Some(ct) if is_allowed_mime(ct) => Ok(ct.to_ascii_lowercase()),
        Some(_) => Err(reject()),
        None => from_extension.map(String::from).ok_or_else(reject),
    }
}

/// Response for receipt upload
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UploadResponse {
    Stored { message: String, receipt: Receipt },
    NotReceipt { message: String, description: String },
}

/// POST /upload - Analyze and store a receipt image
///
/// Expects multipart form with:
/// - receipt: image file (required, jpeg/jpg/png/gif, max 10MB)
/// - userId: owner of the receipt (required)
pub async fn upload_receipt(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut image: Option<(Vec<u8>, String)> = None;
    let mut user_id: Option<String> = None;

    // Extract fields from multipart form
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "receipt" => {
                let mime = resolve_image_type(field.file_name(), field.content_type())?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read file data"))?;

                // Check file size limit
                if bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(AppError::bad_request(&format!(
                        "File too large. Maximum size is {} MB",
                        MAX_UPLOAD_SIZE / 1024 / 1024
                    )));
                }
                if bytes.is_empty() {
                    return Err(AppError::bad_request("No file uploaded"));
                }

                image = Some((bytes.to_vec(), mime));
            }
            "userId" => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Failed to read userId"))?;
                let value = value.trim();
                if !value.is_empty() {
                    user_id = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    // Validate required fields
    let (image_data, mime_type) = image.ok_or_else(|| AppError::bad_request("No file uploaded"))?;
    let user_id = user_id.ok_or_else(|| AppError::bad_request("userId is required"))?;

    let ingestor = state
        .ingestor
        .as_ref()
        .ok_or_else(|| AppError::unavailable("Receipt analysis is not configured"))?;

    info!(user_id = %user_id, bytes = image_data.len(), mime = %mime_type, "Receipt upload");

    // The image buffer is dropped when this handler returns, on every path
    let response = match ingestor.ingest(&image_data, &mime_type, &user_id).await? {
        IngestOutcome::Stored(receipt) => UploadResponse::Stored {
            message: "Receipt analyzed successfully".to_string(),
            receipt,
        },
        IngestOutcome::Description(description) => UploadResponse::NotReceipt {
            message: "Image is not a receipt".to_string(),
            description,
        },
    };

    Ok(Json(response))
}

/// Query parameters for receipt listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReceiptsQuery {
    /// 1-based page number (default 1)
    pub page: Option<usize>,
    /// Page size (default 10, max 1000)
    pub limit: Option<usize>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /receipts/:userId - List a user's receipts, most recent first
pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<ListReceiptsQuery>,
) -> Result<Json<ReceiptPage>, AppError> {
    let start = parse_date_param(params.start_date.as_deref(), "startDate")?;
    let end = parse_date_param(params.end_date.as_deref(), "endDate")?;

    let page = state.summaries().receipts_page(
        &user_id,
        params.page.unwrap_or(1),
        params.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        start,
        end,
    )?;

    Ok(Json(page))
}

/// GET /receipts/:userId/:receiptId - Get a specific receipt
pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    Path((user_id, receipt_id)): Path<(String, String)>,
) -> Result<Json<Receipt>, AppError> {
    let receipt = state
        .db
        .get_by_id(&user_id, &receipt_id)?
        .ok_or_else(|| AppError::not_found("Receipt not found"))?;

    Ok(Json(receipt))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// DELETE /receipts/:userId/:receiptId - Delete a receipt
pub async fn delete_receipt(
    State(state): State<Arc<AppState>>,
    Path((user_id, receipt_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, AppError> {
    if !state.db.delete_by_id(&user_id, &receipt_id)? {
        return Err(AppError::not_found("Receipt not found"));
    }

    info!(user_id = %user_id, receipt_id = %receipt_id, "Deleted receipt");
    Ok(Json(DeleteResponse { deleted: true }))
}
