//! Ingestion orchestrator: image in, stored receipt (or description) out

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::extract::{Extraction, ReceiptExtractor};
use crate::models::Receipt;
use crate::store::ReceiptStore;

/// Result of ingesting one image
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The image was a receipt and has been persisted
    Stored(Receipt),
    /// The image was not a receipt; nothing was persisted
    Description(String),
}

#[derive(Clone)]
pub struct ReceiptIngestor {
    extractor: ReceiptExtractor,
    store: Arc<dyn ReceiptStore>,
}

impl ReceiptIngestor {
    pub fn new(extractor: ReceiptExtractor, store: Arc<dyn ReceiptStore>) -> Self {
        Self { extractor, store }
    }

    pub fn store(&self) -> &dyn ReceiptStore {
        self.store.as_ref()
    }

    pub fn extractor(&self) -> &ReceiptExtractor {
        &self.extractor
    }

    /// Extract, categorize and persist a receipt image
    ///
    /// Extraction errors propagate and leave the store untouched.
    #[instrument(skip(self, image_data), fields(bytes = image_data.len()))]
    pub async fn ingest(
        &self,
        image_data: &[u8],
        mime_type: &str,
        user_id: &str,
    ) -> Result<IngestOutcome> {
        // Microsecond precision matches what the database stores
        let now = Utc::now().trunc_subsecs(6);
        let draft = match self
            .extractor
            .extract(image_data, mime_type, now.date_naive())
            .await?
        {
            Extraction::NonReceipt(description) => {
                info!("Image is not a receipt");
                return Ok(IngestOutcome::Description(description));
            }
            Extraction::Receipt(draft) => draft,
        };

        let categories = self.extractor.classify(&draft.items).await;
        let receipt = draft.into_receipt(Uuid::new_v4().to_string(), user_id, categories, now);
        self.store.put(&receipt)?;

        info!(
            receipt_id = %receipt.id,
            date = %receipt.date,
            items = receipt.items.len(),
            total = receipt.total,
            "Stored receipt"
        );

        Ok(IngestOutcome::Stored(receipt))
    }
}
