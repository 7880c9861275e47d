//! Database tests

use super::*;
use crate::store::ReceiptStore;
use crate::test_utils::{receipt, receipt_with_categories};
use chrono::NaiveDate;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert!(db.list_by_user("u1").unwrap().is_empty());
    assert_eq!(db.count_receipts("u1").unwrap(), 0);
}

#[test]
fn test_receipts_schema_exists() {
    let db = Database::in_memory().unwrap();
    let conn = db.conn().unwrap();

    let columns: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('receipts') WHERE name IN
             ('user_id', 'id', 'store_name', 'date', 'time', 'items_json', 'subtotal',
              'tax', 'total', 'categories_json', 'created_at')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(columns, 11, "receipts table should have 11 expected columns");

    let index: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_receipts_user_date'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(index, 1);
}

#[test]
fn test_put_and_get_roundtrip() {
    let db = Database::in_memory().unwrap();
    let original = receipt_with_categories(
        "u1",
        "r1",
        "2024-03-01",
        50000.0,
        1,
        &[("Food", 30000.0), ("Beverage", 20000.0)],
    );
    db.put(&original).unwrap();

    let loaded = db.get_by_id("u1", "r1").unwrap().unwrap();
    assert_eq!(loaded, original);
    assert!(db.get_by_id("u2", "r1").unwrap().is_none());
    assert!(db.get_by_id("u1", "missing").unwrap().is_none());
}

#[test]
fn test_put_overwrites_same_key() {
    let db = Database::in_memory().unwrap();
    db.put(&receipt("u1", "r1", "2024-03-01", 10.0, 1)).unwrap();
    db.put(&receipt("u1", "r1", "2024-03-02", 25.0, 1)).unwrap();

    let all = db.list_by_user("u1").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].total, 25.0);
    assert_eq!(all[0].date, day(2024, 3, 2));
}

#[test]
fn test_list_order_is_recency() {
    let db = Database::in_memory().unwrap();
    db.put(&receipt("u1", "a", "2024-03-09", 1.0, 1)).unwrap();
    db.put(&receipt("u1", "b", "2024-03-01", 2.0, 3)).unwrap();
    db.put(&receipt("u1", "c", "2024-03-05", 3.0, 2)).unwrap();
    // Same timestamp as "c": id breaks the tie
    db.put(&receipt("u1", "d", "2024-03-05", 4.0, 2)).unwrap();

    let ids: Vec<_> = db
        .list_by_user("u1")
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["b", "d", "c", "a"]);
}

#[test]
fn test_date_filters() {
    let db = Database::in_memory().unwrap();
    db.put(&receipt("u1", "a", "2024-02-29", 1.0, 1)).unwrap();
    db.put(&receipt("u1", "b", "2024-03-01", 2.0, 2)).unwrap();
    db.put(&receipt("u1", "c", "2024-03-31", 3.0, 3)).unwrap();
    db.put(&receipt("u1", "d", "2024-04-01", 4.0, 4)).unwrap();
    db.put(&receipt("u2", "e", "2024-03-15", 5.0, 5)).unwrap();

    let exact = db.list_by_user_and_date("u1", day(2024, 3, 1)).unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, "b");

    let march = db
        .list_by_user_and_date_range("u1", day(2024, 3, 1), day(2024, 3, 31))
        .unwrap();
    let ids: Vec<_> = march.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b"]);

    let single = db
        .list_by_user_and_date_range("u1", day(2024, 3, 1), day(2024, 3, 1))
        .unwrap();
    assert_eq!(single, exact);
}

#[test]
fn test_open_ended_date_filters() {
    let db = Database::in_memory().unwrap();
    db.put(&receipt_with_categories(
        "u1",
        "a",
        "2024-03-05",
        10000.0,
        1,
        &[("Food", 10000.0)],
    ))
    .unwrap();
    db.put(&receipt("u1", "b", "2024-02-20", 2.0, 2)).unwrap();

    let after = db
        .list_by_user_between("u1", Some(day(2024, 3, 1)), None)
        .unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, "a");

    let before = db
        .list_by_user_between("u1", None, Some(day(2024, 3, 1)))
        .unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].id, "b");

    // Open bounds through the summary engine against SQLite
    let engine = crate::summary::SummaryEngine::new(&db, crate::models::WeekStart::Monday);
    let page = engine
        .receipts_page("u1", 1, 10, Some(day(2024, 3, 1)), None)
        .unwrap();
    assert_eq!(page.pagination.total, 1);
    let report = engine
        .categories("u1", Some(day(2024, 3, 1)), None)
        .unwrap();
    assert_eq!(report.category_totals["Food"], 10000.0);
}

#[test]
fn test_delete_and_count() {
    let db = Database::in_memory().unwrap();
    db.put(&receipt("u1", "a", "2024-03-01", 1.0, 1)).unwrap();
    db.put(&receipt("u1", "b", "2024-03-01", 2.0, 2)).unwrap();
    assert_eq!(db.count_receipts("u1").unwrap(), 2);

    assert!(!db.delete_by_id("u1", "missingId").unwrap());
    assert_eq!(db.count_receipts("u1").unwrap(), 2);

    assert!(db.delete_by_id("u1", "a").unwrap());
    assert_eq!(db.count_receipts("u1").unwrap(), 1);
    assert!(!db.delete_by_id("u1", "a").unwrap());
}

#[test]
fn test_reopen_preserves_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("struk.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::new_unencrypted(path).unwrap();
        db.put(&receipt("u1", "a", "2024-03-01", 42.0, 1)).unwrap();
    }

    let db = Database::new_unencrypted(path).unwrap();
    assert_eq!(db.get_by_id("u1", "a").unwrap().unwrap().total, 42.0);
}

#[test]
fn test_encrypted_database_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secure.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::new_with_key(path, Some("correct horse")).unwrap();
        db.put(&receipt("u1", "a", "2024-03-01", 42.0, 1)).unwrap();
    }

    let db = Database::new_with_key(path, Some("correct horse")).unwrap();
    assert_eq!(db.count_receipts("u1").unwrap(), 1);

    // Wrong passphrase cannot read the schema
    assert!(Database::new_with_key(path, Some("wrong")).is_err());
}

#[test]
fn test_derive_key_is_deterministic() {
    let a = derive_key("passphrase").unwrap();
    let b = derive_key("passphrase").unwrap();
    let c = derive_key("other").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn test_datetime_format_roundtrip() {
    let dt = parse_datetime("2024-03-01T10:15:00.000000Z").unwrap();
    assert_eq!(format_datetime(&dt), "2024-03-01T10:15:00.000000Z");
    assert!(parse_datetime("2024-03-01 10:15:00").is_some());
    assert!(parse_datetime("yesterday").is_none());
}
