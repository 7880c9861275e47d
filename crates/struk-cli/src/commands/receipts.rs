//! Receipt browsing CLI commands

use anyhow::{anyhow, Result};
use struk_core::db::Database;
use struk_core::format::format_currency;
use struk_core::{Config, ReceiptStore, SummaryEngine};

use super::{parse_date_arg, truncate};

/// List one page of a user's receipts
pub fn cmd_receipts_list(
    db: &Database,
    settings: &Config,
    user: &str,
    page: usize,
    limit: usize,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let start = parse_date_arg(from)?;
    let end = parse_date_arg(to)?;

    let engine = SummaryEngine::new(db, settings.week_start);
    let result = engine.receipts_page(user, page, limit, start, end)?;

    if result.pagination.total == 0 {
        println!("No receipts for {}", user);
        return Ok(());
    }

    println!(
        "\n🧾 Receipts for {} (page {} of {}, {} total)",
        user,
        result.pagination.current,
        result.pagination.pages.max(1),
        result.pagination.total
    );
    println!("{}", "─".repeat(70));

    for receipt in &result.receipts {
        let store = receipt.store_name.as_deref().unwrap_or("Unknown store");
        println!(
            "  {}  {:<28} {:>18}  {}",
            receipt.date.format("%Y-%m-%d"),
            truncate(store, 28),
            format_currency(receipt.total),
            receipt.id
        );
    }

    if result.receipts.is_empty() {
        println!("  (no receipts on this page)");
    }

    println!();
    Ok(())
}

/// Show one receipt
pub fn cmd_receipts_show(db: &Database, user: &str, id: &str, json: bool) -> Result<()> {
    let receipt = db
        .get_by_id(user, id)?
        .ok_or_else(|| anyhow!("Receipt {} not found for {}", id, user))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    println!();
    println!("🧾 {}", receipt.store_name.as_deref().unwrap_or("Unknown store"));
    println!("   Id: {}", receipt.id);
    match &receipt.time {
        Some(time) => println!("   Date: {} {}", receipt.date, time),
        None => println!("   Date: {}", receipt.date),
    }
    println!("   Ingested: {}", receipt.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!();

    for item in &receipt.items {
        println!(
            "   {:<32} {:>6} x {:>16} = {:>16}",
            truncate(&item.name, 32),
            item.quantity,
            format_currency(item.unit_price),
            format_currency(item.line_total)
        );
    }

    println!("   {}", "─".repeat(60));
    println!("   Subtotal: {}", format_currency(receipt.subtotal));
    if receipt.tax > 0.0 {
        println!("   Tax: {}", format_currency(receipt.tax));
    }
    println!("   Total: {}", format_currency(receipt.total));

    if !receipt.categories.is_empty() {
        println!();
        for cat in &receipt.categories {
            println!(
                "   📂 {}: {} ({})",
                cat.category,
                format_currency(cat.total),
                cat.items.join(", ")
            );
        }
    }

    println!();
    Ok(())
}

/// Delete one receipt
pub fn cmd_receipts_delete(db: &Database, user: &str, id: &str) -> Result<()> {
    if !db.delete_by_id(user, id)? {
        return Err(anyhow!("Receipt {} not found for {}", id, user));
    }
    println!("🗑️  Deleted receipt {}", id);
    Ok(())
}
