//! Struk Core Library
//!
//! Shared functionality for the Struk receipt tracker:
//! - Receipt store contract with SQLite (SQLCipher) and in-memory implementations
//! - Pluggable image-understanding backends (Ollama, OpenAI-compatible, mock)
//! - Extraction adapter that normalizes model output into receipts
//! - Aggregation engine for daily, weekly, monthly and category summaries
//! - Plain-text formatter and chat command surface
//! - Prompt library for customizable AI prompts

pub mod ai;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod format;
pub mod ingest;
pub mod models;
pub mod prompts;
pub mod store;
pub mod summary;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, ExtractionResult, ItemCategory, MockBackend, OllamaBackend,
    OpenAICompatibleBackend, ParsedReceipt, ParsedReceiptItem,
};
pub use chat::{ChatBot, ChatCommand, IncomingMessage, Media};
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use extract::{Extraction, ReceiptExtractor};
pub use ingest::{IngestOutcome, ReceiptIngestor};
pub use models::*;
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary, PromptSource, RenderedPrompt};
pub use store::{MemoryStore, ReceiptStore};
pub use summary::SummaryEngine;
