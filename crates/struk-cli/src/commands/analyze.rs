//! Receipt analysis command

use std::path::Path;

use anyhow::{bail, Result};
use struk_core::ai::{AIBackend, AIClient};
use struk_core::{db::Database, format, Config, IngestOutcome};

use super::{ingestor_with, read_image};

pub async fn cmd_analyze(db: &Database, settings: &Config, image: &Path, user: &str) -> Result<()> {
    let Some(ai) = AIClient::from_env() else {
        bail!("No AI backend configured. Set OLLAMA_HOST (or AI_BACKEND=openai_compatible with OPENAI_COMPATIBLE_HOST)");
    };
    analyze_with(db, settings, ai, image, user).await
}

/// Analyze with an explicit backend
pub async fn analyze_with(
    db: &Database,
    settings: &Config,
    ai: AIClient,
    image: &Path,
    user: &str,
) -> Result<()> {
    let (data, mime) = read_image(image)?;

    println!("🔍 Analyzing {} with {}...", image.display(), ai.model());

    let ingestor = ingestor_with(db, settings, ai);
    match ingestor.ingest(&data, mime, user).await? {
        IngestOutcome::Stored(receipt) => {
            println!();
            println!("{}", format::render_receipt(&receipt));
            println!();
            println!("   Receipt id: {}", receipt.id);
            println!("   {} now has {} receipt(s)", user, db.count_receipts(user)?);
        }
        IngestOutcome::Description(description) => {
            println!("ℹ️  Not a receipt. I can see: {}", description);
        }
    }

    Ok(())
}
