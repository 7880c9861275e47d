//! Chat command surface
//!
//! Every inbound message produces exactly one text reply. Receipt photos are
//! ingested; slash commands return formatted summaries for the sender.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::format;
use crate::ingest::{IngestOutcome, ReceiptIngestor};
use crate::models::{WeekStart, YearMonth};
use crate::store::ReceiptStore;
use crate::summary::{self, SummaryEngine};

pub const ANALYSIS_FAILED_REPLY: &str =
    "❌ Sorry, I could not analyze that image. Please try again with a clearer photo of the receipt.";
pub const INVALID_MEDIA_REPLY: &str = "📷 Please send a valid receipt image.";
pub const INTERNAL_ERROR_REPLY: &str = "⚠️ Sorry, something went wrong. Please try again later.";
pub const ANALYSIS_UNAVAILABLE_REPLY: &str =
    "⚠️ Receipt analysis is not available right now. Please try again later.";

/// Attached media as delivered by the messaging channel
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub mimetype: String,
    pub data: Vec<u8>,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.mimetype.to_ascii_lowercase().starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub user_id: String,
    pub text: String,
    pub media: Option<Media>,
}

impl IncomingMessage {
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            media: None,
        }
    }

    pub fn media(user_id: impl Into<String>, mimetype: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            user_id: user_id.into(),
            text: String::new(),
            media: Some(Media {
                mimetype: mimetype.into(),
                data,
            }),
        }
    }
}

/// Recognized text commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatCommand {
    Help,
    Summary,
    Weekly,
    Monthly,
    Unrecognized,
}

impl ChatCommand {
    /// Match trimmed, lowercased text exactly against the command set
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "/help" => Self::Help,
            "/summary" => Self::Summary,
            "/weekly" => Self::Weekly,
            "/monthly" => Self::Monthly,
            _ => Self::Unrecognized,
        }
    }
}

/// Routes inbound messages to ingestion or summaries
///
/// Without an ingestor the bot still answers text commands; photos get
/// `ANALYSIS_UNAVAILABLE_REPLY`.
#[derive(Clone)]
pub struct ChatBot {
    store: Arc<dyn ReceiptStore>,
    ingestor: Option<ReceiptIngestor>,
    week_start: WeekStart,
}

impl ChatBot {
    pub fn new(store: Arc<dyn ReceiptStore>, week_start: WeekStart) -> Self {
        Self {
            store,
            ingestor: None,
            week_start,
        }
    }

    /// Enable receipt ingestion for image messages
    pub fn with_ingestor(mut self, ingestor: ReceiptIngestor) -> Self {
        self.ingestor = Some(ingestor);
        self
    }

    /// Handle a message relative to the local current date
    pub async fn handle(&self, message: &IncomingMessage) -> String {
        self.handle_on(message, summary::today()).await
    }

    /// Handle a message with an explicit "today" for summary commands
    pub async fn handle_on(&self, message: &IncomingMessage, today: NaiveDate) -> String {
        if let Some(media) = &message.media {
            return self.handle_media(&message.user_id, media).await;
        }

        let command = ChatCommand::parse(&message.text);
        info!(user_id = %message.user_id, ?command, "Chat command");

        match self.reply_for(command, &message.user_id, today) {
            Ok(reply) => reply,
            Err(e) => {
                error!(user_id = %message.user_id, error = %e, "Failed to answer chat command");
                INTERNAL_ERROR_REPLY.to_string()
            }
        }
    }

    async fn handle_media(&self, user_id: &str, media: &Media) -> String {
        if !media.is_image() {
            info!(user_id, mimetype = %media.mimetype, "Ignoring non-image media");
            return INVALID_MEDIA_REPLY.to_string();
        }

        let Some(ingestor) = &self.ingestor else {
            warn!(user_id, "Receipt photo received but no AI backend is configured");
            return ANALYSIS_UNAVAILABLE_REPLY.to_string();
        };

        match ingestor.ingest(&media.data, &media.mimetype, user_id).await {
            Ok(IngestOutcome::Stored(receipt)) => format::render_receipt(&receipt),
            Ok(IngestOutcome::Description(description)) => format!("I can see: {}", description),
            Err(e) if e.is_extraction_error() => {
                warn!(user_id, error = %e, "Receipt analysis failed");
                ANALYSIS_FAILED_REPLY.to_string()
            }
            Err(e) => {
                error!(user_id, error = %e, "Receipt ingestion failed");
                INTERNAL_ERROR_REPLY.to_string()
            }
        }
    }

    fn reply_for(&self, command: ChatCommand, user_id: &str, today: NaiveDate) -> Result<String> {
        let engine = SummaryEngine::new(self.store.as_ref(), self.week_start);
        Ok(match command {
            ChatCommand::Help => format::help_message(),
            ChatCommand::Summary => format::render_daily(&engine.daily(user_id, today)?),
            ChatCommand::Weekly => format::render_weekly(&engine.weekly(user_id, today)?),
            ChatCommand::Monthly => {
                format::render_monthly(&engine.monthly(user_id, YearMonth::of(today))?)
            }
            ChatCommand::Unrecognized => format::unrecognized_message(),
        })
    }
}
