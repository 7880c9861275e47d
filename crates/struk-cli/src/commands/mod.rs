//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Analyze and store a receipt photo
//! - `chat` - Simulate one chat message
//! - `core` - Core commands (init) and shared utilities (open_db, argument helpers)
//! - `prompts` - Inspect the model prompts and their overrides
//! - `receipts` - Receipt browsing (list, show, delete)
//! - `serve` - Web server command
//! - `summary` - Daily, weekly, monthly and category summaries

pub mod analyze;
pub mod chat;
pub mod core;
pub mod prompts;
pub mod receipts;
pub mod serve;
pub mod summary;

// Re-export command functions for main.rs
pub use analyze::*;
pub use chat::*;
pub use core::*;
pub use prompts::*;
pub use receipts::*;
pub use serve::*;
pub use summary::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
