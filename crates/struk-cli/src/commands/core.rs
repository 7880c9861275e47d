//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - argument helpers shared by the other commands

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use struk_core::ai::AIClient;
use struk_core::{db::Database, Config, ReceiptExtractor, ReceiptIngestor};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {}", db_path.display()))?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Analyze a receipt: struk analyze photo.jpg --user <id>");
    println!("  2. Start the API: struk serve");

    Ok(())
}

/// Ingestor over the database, using the AI backend from the environment
pub fn ingestor_from_env(db: &Database, settings: &Config) -> Option<ReceiptIngestor> {
    AIClient::from_env().map(|ai| ingestor_with(db, settings, ai))
}

pub fn ingestor_with(db: &Database, settings: &Config, ai: AIClient) -> ReceiptIngestor {
    let extractor = ReceiptExtractor::new(ai, settings.extraction_timeout);
    ReceiptIngestor::new(extractor, Arc::new(db.clone()))
}

/// MIME type for a receipt image, from its extension
pub fn image_mime_type(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "gif" => Ok("image/gif"),
        _ => bail!(
            "Unsupported image type for {} (use jpeg, jpg, png or gif)",
            path.display()
        ),
    }
}

/// Read a receipt image, checking type and existence
pub fn read_image(path: &Path) -> Result<(Vec<u8>, &'static str)> {
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    let mime = image_mime_type(path)?;
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok((data, mime))
}

/// Parse an optional YYYY-MM-DD argument
pub fn parse_date_arg(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD)", v))
        })
        .transpose()
}
