//! Struk CLI - Receipt-photo expense tracker
//!
//! Usage:
//!   struk init                            Initialize database
//!   struk analyze photo.jpg --user 62812  Analyze and store a receipt
//!   struk summary monthly --user 62812    Show spending for this month
//!   struk prompts list                    Show model prompts and overrides
//!   struk serve --port 3000               Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use struk_core::{Config, PromptLibrary};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let settings = Config::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Analyze { image, user } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_analyze(&db, &settings, &image, &user).await
        }
        Commands::Receipts { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                ReceiptsAction::List {
                    user,
                    page,
                    limit,
                    from,
                    to,
                } => commands::cmd_receipts_list(
                    &db,
                    &settings,
                    &user,
                    page,
                    limit,
                    from.as_deref(),
                    to.as_deref(),
                ),
                ReceiptsAction::Show { user, id, json } => {
                    commands::cmd_receipts_show(&db, &user, &id, json)
                }
                ReceiptsAction::Delete { user, id } => {
                    commands::cmd_receipts_delete(&db, &user, &id)
                }
            }
        }
        Commands::Summary { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                SummaryAction::Daily { user, date, json } => {
                    commands::cmd_summary_daily(&db, &settings, &user, date.as_deref(), json)
                }
                SummaryAction::Weekly { user, date, json } => {
                    commands::cmd_summary_weekly(&db, &settings, &user, date.as_deref(), json)
                }
                SummaryAction::Monthly { user, month, json } => {
                    commands::cmd_summary_monthly(&db, &settings, &user, month.as_deref(), json)
                }
                SummaryAction::Categories {
                    user,
                    from,
                    to,
                    json,
                } => commands::cmd_summary_categories(
                    &db,
                    &settings,
                    &user,
                    from.as_deref(),
                    to.as_deref(),
                    json,
                ),
            }
        }
        Commands::Chat { user, text, image } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_chat(&db, &settings, &user, &text, image.as_deref()).await
        }
        Commands::Prompts { action } => {
            let mut library = PromptLibrary::new();
            match action {
                None | Some(PromptsAction::List) => commands::cmd_prompts_list(&mut library),
                Some(PromptsAction::Show { prompt_id }) => {
                    commands::cmd_prompts_show(&mut library, &prompt_id)
                }
            }
        }
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth, cli.no_encrypt, settings).await,
    }
}
