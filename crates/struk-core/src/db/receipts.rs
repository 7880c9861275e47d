//! Receipt operations

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::{format_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::Receipt;
use crate::store::ReceiptStore;

const RECEIPT_COLUMNS: &str = "user_id, id, store_name, date, time, items_json,
                               subtotal, tax, total, categories_json, created_at";

const RECENCY_ORDER: &str = "ORDER BY created_at DESC, id DESC";

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

impl Database {
    /// Number of receipts stored for a user
    pub fn count_receipts(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM receipts WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn query_receipts(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Receipt>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM receipts WHERE {} {}",
            RECEIPT_COLUMNS, filter, RECENCY_ORDER
        );
        let mut stmt = conn.prepare(&sql)?;

        let receipts = stmt
            .query_map(args, Self::row_to_receipt)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(receipts)
    }

    /// Helper to convert a row to Receipt
    fn row_to_receipt(row: &Row) -> rusqlite::Result<Receipt> {
        let date_str: String = row.get(3)?;
        let items_json: String = row.get(5)?;
        let categories_json: String = row.get(9)?;
        let created_at_str: String = row.get(10)?;

        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| conversion_error(3, e))?;
        let items = serde_json::from_str(&items_json).map_err(|e| conversion_error(5, e))?;
        let categories =
            serde_json::from_str(&categories_json).map_err(|e| conversion_error(9, e))?;
        let created_at = parse_datetime(&created_at_str).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(10, "created_at".into(), Type::Text)
        })?;

        Ok(Receipt {
            user_id: row.get(0)?,
            id: row.get(1)?,
            store_name: row.get(2)?,
            date,
            time: row.get(4)?,
            items,
            subtotal: row.get(6)?,
            tax: row.get(7)?,
            total: row.get(8)?,
            categories,
            created_at,
        })
    }
}

impl ReceiptStore for Database {
    fn put(&self, receipt: &Receipt) -> Result<()> {
        let items_json = serde_json::to_string(&receipt.items)?;
        let categories_json = serde_json::to_string(&receipt.categories)?;

        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO receipts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                RECEIPT_COLUMNS
            ),
            params![
                receipt.user_id,
                receipt.id,
                receipt.store_name,
                receipt.date.to_string(),
                receipt.time,
                items_json,
                receipt.subtotal,
                receipt.tax,
                receipt.total,
                categories_json,
                format_datetime(&receipt.created_at),
            ],
        )?;
        Ok(())
    }

    fn list_by_user(&self, user_id: &str) -> Result<Vec<Receipt>> {
        self.query_receipts("user_id = ?", &[&user_id])
    }

    fn list_by_user_and_date(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Receipt>> {
        self.query_receipts("user_id = ? AND date = ?", &[&user_id, &date.to_string()])
    }

    fn list_by_user_and_date_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Receipt>> {
        self.query_receipts(
            "user_id = ? AND date >= ? AND date <= ?",
            &[&user_id, &start.to_string(), &end.to_string()],
        )
    }

    fn list_by_user_between(
        &self,
        user_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Receipt>> {
        let start = start.map(|d| d.to_string());
        let end = end.map(|d| d.to_string());

        let mut filter = String::from("user_id = ?");
        let mut args: Vec<&dyn rusqlite::ToSql> = vec![&user_id];
        if let Some(start) = &start {
            filter.push_str(" AND date >= ?");
            args.push(start);
        }
        if let Some(end) = &end {
            filter.push_str(" AND date <= ?");
            args.push(end);
        }
        self.query_receipts(&filter, &args)
    }

    fn get_by_id(&self, user_id: &str, id: &str) -> Result<Option<Receipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM receipts WHERE user_id = ? AND id = ?",
            RECEIPT_COLUMNS
        ))?;

        let receipt = stmt
            .query_row(params![user_id, id], Self::row_to_receipt)
            .optional()?;

        Ok(receipt)
    }

    fn delete_by_id(&self, user_id: &str, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM receipts WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        Ok(deleted > 0)
    }
}
