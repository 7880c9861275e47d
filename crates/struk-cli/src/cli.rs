//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Struk - Track spending from receipt photos
#[derive(Parser)]
#[command(name = "struk")]
#[command(about = "Receipt-photo expense tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "struk.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set STRUK_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Config file (default: ~/.local/share/struk/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Analyze a receipt photo and store it
    Analyze {
        /// Receipt image (jpeg, jpg, png or gif)
        image: PathBuf,

        /// Owner of the receipt
        #[arg(short, long)]
        user: String,
    },

    /// Browse stored receipts
    Receipts {
        #[command(subcommand)]
        action: ReceiptsAction,
    },

    /// Spending summaries
    Summary {
        #[command(subcommand)]
        action: SummaryAction,
    },

    /// Send one chat message and print the bot's reply
    Chat {
        /// Sender id
        #[arg(short, long)]
        user: String,

        /// Message text (e.g. /summary, /weekly, /monthly, /help)
        #[arg(default_value = "")]
        text: String,

        /// Attach a receipt photo instead of text
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Inspect the prompts sent to the image-understanding model
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
pub enum ReceiptsAction {
    /// List a user's receipts, most recent first
    List {
        #[arg(short, long)]
        user: String,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Receipts per page
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Only receipts dated on or after (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only receipts dated on or before (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Show one receipt
    Show {
        #[arg(short, long)]
        user: String,

        /// Receipt id
        id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete one receipt
    Delete {
        #[arg(short, long)]
        user: String,

        /// Receipt id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SummaryAction {
    /// Spending for one day
    Daily {
        #[arg(short, long)]
        user: String,

        /// Day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spending for the week containing a day
    Weekly {
        #[arg(short, long)]
        user: String,

        /// Any day in the week (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spending for a calendar month
    Monthly {
        #[arg(short, long)]
        user: String,

        /// Month (YYYY-MM, default current month)
        #[arg(long)]
        month: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Category totals and shares
    Categories {
        #[arg(short, long)]
        user: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List prompts with version and override status
    List,

    /// Show one prompt's content
    Show {
        /// Prompt ID (analyze_image, categorize_items)
        prompt_id: String,
    },
}
