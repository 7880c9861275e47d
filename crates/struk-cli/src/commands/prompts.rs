//! Prompt inspection commands

use anyhow::Result;
use struk_core::prompts::{PromptId, PromptLibrary, PromptSource};

fn source_label(source: &PromptSource) -> &'static str {
    match source {
        PromptSource::Embedded => "Default",
        PromptSource::Override(_) => "✓ Custom",
    }
}

/// List the prompts sent to the model and where each one is loaded from
pub fn cmd_prompts_list(library: &mut PromptLibrary) -> Result<()> {
    let prompts = library.list()?;

    println!("Model Prompts:\n");
    println!("{:<20} {:>7}  {:<20}  SOURCE", "ID", "VERSION", "TASK TYPE");
    println!("{}", "-".repeat(60));

    for info in &prompts {
        println!(
            "{:<20} {:>7}  {:<20}  {}",
            info.id.as_str(),
            info.version,
            info.task_type,
            source_label(&info.source)
        );
    }

    println!();
    match library.override_dir() {
        Some(dir) => println!("Override directory: {}", dir.display()),
        None => println!("Override directory: (not available)"),
    }
    println!("Copy a prompt there as <id>.md to customize it (or set STRUK_PROMPTS_DIR).");

    Ok(())
}

/// Print one prompt's metadata and full content
pub fn cmd_prompts_show(library: &mut PromptLibrary, prompt_id: &str) -> Result<()> {
    let id: PromptId = prompt_id.parse()?;
    let prompt = library.get(id)?;

    println!("Prompt: {}", prompt.metadata.id);
    println!("Version: {}", prompt.metadata.version);
    println!("Task Type: {}", prompt.metadata.task_type);
    match &prompt.source {
        PromptSource::Embedded => println!("Source: Default"),
        PromptSource::Override(path) => println!("Source: Override ({})", path.display()),
    }

    println!();
    println!("--- Content ---");
    println!("{}", prompt.content);

    Ok(())
}
