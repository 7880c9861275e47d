//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::PathBuf;

use struk_core::ai::{AIClient, MockBackend};
use struk_core::chat::{ANALYSIS_UNAVAILABLE_REPLY, INVALID_MEDIA_REPLY};
use struk_core::db::Database;
use struk_core::{Config, PromptLibrary, ReceiptStore};
use tempfile::TempDir;

use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

/// Write a fake image into a temp dir and return its path
fn write_image(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"fake image bytes").unwrap();
    path
}

// ========== Core Helpers ==========

#[test]
fn test_open_db_unencrypted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("struk.db");

    let db = commands::open_db(&path, true).unwrap();
    assert!(!db.is_encrypted().unwrap());
    assert!(path.exists());
}

#[test]
fn test_cmd_init() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("init.db");
    assert!(commands::cmd_init(&path, true).is_ok());
    assert!(path.exists());
}

#[test]
fn test_image_mime_type() {
    use std::path::Path;
    assert_eq!(commands::image_mime_type(Path::new("a.JPG")).unwrap(), "image/jpeg");
    assert_eq!(commands::image_mime_type(Path::new("a.jpeg")).unwrap(), "image/jpeg");
    assert_eq!(commands::image_mime_type(Path::new("a.png")).unwrap(), "image/png");
    assert_eq!(commands::image_mime_type(Path::new("a.gif")).unwrap(), "image/gif");
    assert!(commands::image_mime_type(Path::new("a.pdf")).is_err());
    assert!(commands::image_mime_type(Path::new("noext")).is_err());
}

#[test]
fn test_parse_date_arg() {
    assert!(commands::parse_date_arg(None).unwrap().is_none());
    assert_eq!(
        commands::parse_date_arg(Some("2024-03-01")).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
    );
    assert!(commands::parse_date_arg(Some("1 March")).is_err());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("Indomaret Point Sudirman", 10), "Indomar...");
    // Multi-byte characters are not split
    assert_eq!(truncate("Kopi Kenangan ☕☕☕", 16), "Kopi Kenangan...");
}

// ========== Analyze ==========

#[tokio::test]
async fn test_analyze_stores_receipt() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir, "struk.jpg");

    let ai = AIClient::Mock(MockBackend::new());
    commands::analyze_with(&db, &Config::default(), ai, &image, "u1")
        .await
        .unwrap();

    let receipts = db.list_by_user("u1").unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].store_name.as_deref(), Some("Mock Mart"));
}

#[tokio::test]
async fn test_analyze_rejects_bad_input() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.jpg");
    let ai = AIClient::Mock(MockBackend::new());
    assert!(
        commands::analyze_with(&db, &Config::default(), ai.clone(), &missing, "u1")
            .await
            .is_err()
    );

    let pdf = write_image(&dir, "statement.pdf");
    assert!(
        commands::analyze_with(&db, &Config::default(), ai, &pdf, "u1")
            .await
            .is_err()
    );

    assert_eq!(db.count_receipts("u1").unwrap(), 0);
}

#[tokio::test]
async fn test_analyze_model_failure_persists_nothing() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir, "struk.png");

    let ai = AIClient::Mock(MockBackend::new().failing("model offline"));
    let result = commands::analyze_with(&db, &Config::default(), ai, &image, "u1").await;
    assert!(result.is_err());
    assert_eq!(db.count_receipts("u1").unwrap(), 0);
}

// ========== Receipts Commands ==========

#[tokio::test]
async fn test_receipts_commands() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir, "struk.jpg");
    let ai = AIClient::Mock(MockBackend::new());
    commands::analyze_with(&db, &Config::default(), ai, &image, "u1")
        .await
        .unwrap();
    let id = db.list_by_user("u1").unwrap()[0].id.clone();

    let settings = Config::default();
    assert!(commands::cmd_receipts_list(&db, &settings, "u1", 1, 10, None, None).is_ok());
    assert!(commands::cmd_receipts_list(&db, &settings, "nobody", 1, 10, None, None).is_ok());
    assert!(
        commands::cmd_receipts_list(&db, &settings, "u1", 1, 10, Some("bad-date"), None).is_err()
    );

    assert!(commands::cmd_receipts_show(&db, "u1", &id, false).is_ok());
    assert!(commands::cmd_receipts_show(&db, "u1", &id, true).is_ok());
    assert!(commands::cmd_receipts_show(&db, "u2", &id, false).is_err());

    assert!(commands::cmd_receipts_delete(&db, "u1", &id).is_ok());
    assert!(commands::cmd_receipts_delete(&db, "u1", &id).is_err());
    assert_eq!(db.count_receipts("u1").unwrap(), 0);
}

// ========== Summary Commands ==========

#[tokio::test]
async fn test_summary_commands() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir, "struk.jpg");
    let ai = AIClient::Mock(MockBackend::new());
    commands::analyze_with(&db, &Config::default(), ai, &image, "u1")
        .await
        .unwrap();

    let settings = Config::default();
    for json in [false, true] {
        assert!(commands::cmd_summary_daily(&db, &settings, "u1", Some("2024-03-01"), json).is_ok());
        assert!(commands::cmd_summary_weekly(&db, &settings, "u1", Some("2024-03-01"), json).is_ok());
        assert!(commands::cmd_summary_monthly(&db, &settings, "u1", Some("2024-03"), json).is_ok());
        assert!(commands::cmd_summary_categories(&db, &settings, "u1", None, None, json).is_ok());
    }

    // Defaults to today / current month
    assert!(commands::cmd_summary_daily(&db, &settings, "u1", None, false).is_ok());
    assert!(commands::cmd_summary_monthly(&db, &settings, "u1", None, false).is_ok());

    assert!(commands::cmd_summary_monthly(&db, &settings, "u1", Some("March"), false).is_err());
    assert!(commands::cmd_summary_daily(&db, &settings, "u1", Some("2024/03/01"), false).is_err());
}

#[test]
fn test_categories_for_empty_user() {
    let db = setup_test_db();
    assert!(
        commands::cmd_summary_categories(&db, &Config::default(), "nobody", None, None, false)
            .is_ok()
    );
}

// ========== Chat Command ==========

#[tokio::test]
async fn test_chat_reply_routes_messages() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let settings = Config::default();

    let image = write_image(&dir, "struk.jpg");
    let ingestor = commands::ingestor_with(&db, &settings, AIClient::Mock(MockBackend::new()));
    let reply = commands::chat_reply(&db, &settings, Some(ingestor), "u1", "", Some(&image))
        .await
        .unwrap();
    assert!(reply.contains("RECEIPT SAVED"));
    assert_eq!(db.count_receipts("u1").unwrap(), 1);

    let reply = commands::chat_reply(&db, &settings, None, "u1", "/help", None)
        .await
        .unwrap();
    assert_eq!(reply, struk_core::format::help_message());

    let reply = commands::chat_reply(&db, &settings, None, "u1", "", Some(&image))
        .await
        .unwrap();
    assert_eq!(reply, ANALYSIS_UNAVAILABLE_REPLY);
}

#[tokio::test]
async fn test_chat_rejects_unsupported_file() {
    let db = setup_test_db();
    let dir = TempDir::new().unwrap();
    let pdf = write_image(&dir, "scan.pdf");

    let result = commands::chat_reply(&db, &Config::default(), None, "u1", "", Some(&pdf)).await;
    assert!(result.is_err());

    // Non-image media coming from a real channel gets a reply instead
    let bot = struk_core::ChatBot::new(
        std::sync::Arc::new(db.clone()),
        struk_core::WeekStart::Monday,
    );
    let reply = bot
        .handle(&struk_core::IncomingMessage::media(
            "u1",
            "application/pdf",
            b"%PDF".to_vec(),
        ))
        .await;
    assert_eq!(reply, INVALID_MEDIA_REPLY);
}

// ========== Prompts Commands ==========

#[test]
fn test_prompts_commands() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("analyze_image.md"),
        "---\nid: analyze_image\nversion: 9\ntask_type: vision\n---\n\n# User\nIs this a receipt?\n",
    )
    .unwrap();
    let mut library = PromptLibrary::with_override_dir(dir.path().to_path_buf());

    assert!(commands::cmd_prompts_list(&mut library).is_ok());
    assert!(commands::cmd_prompts_show(&mut library, "analyze_image").is_ok());
    assert!(commands::cmd_prompts_show(&mut library, "categorize_items").is_ok());
    assert!(commands::cmd_prompts_show(&mut library, "classify_merchant").is_err());

    let mut embedded = PromptLibrary::embedded_only();
    assert!(commands::cmd_prompts_list(&mut embedded).is_ok());
}

#[test]
fn test_prompts_list_reports_broken_override() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("categorize_items.md"), "not a prompt").unwrap();
    let mut library = PromptLibrary::with_override_dir(dir.path().to_path_buf());

    assert!(commands::cmd_prompts_list(&mut library).is_err());
}
