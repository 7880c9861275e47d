//! Server command implementation

use std::path::Path;

use anyhow::Result;
use struk_core::Config;

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_auth: bool,
    no_encrypt: bool,
    settings: Config,
) -> Result<()> {
    println!("🚀 Starting Struk web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!("   Week starts: {}", settings.week_start.as_str());

    // Parse API keys from environment (comma-separated)
    let api_keys = struk_server::parse_comma_list(&std::env::var("STRUK_API_KEYS").unwrap_or_default());

    // Allowed CORS origins (comma-separated)
    let allowed_origins =
        struk_server::parse_comma_list(&std::env::var("STRUK_ALLOWED_ORIGINS").unwrap_or_default());

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else if api_keys.is_empty() {
        println!("   ❌ Authentication: no API keys configured (set STRUK_API_KEYS)");
    } else {
        println!(
            "   🔑 API keys: {} configured (STRUK_API_KEYS)",
            api_keys.len()
        );
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    let config = struk_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
    };

    struk_server::serve_with_config(db, host, port, config, settings).await?;

    Ok(())
}
