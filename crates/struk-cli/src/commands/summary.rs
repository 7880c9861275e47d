//! Spending summary commands
//!
//! Daily, weekly and monthly output reuses the chat formatter so the CLI shows
//! exactly what the bot would reply. `--json` prints the raw summary instead.

use anyhow::Result;
use serde::Serialize;
use struk_core::db::Database;
use struk_core::format::{self, format_currency, format_number};
use struk_core::models::YearMonth;
use struk_core::{summary, Config, SummaryEngine};

use super::parse_date_arg;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn cmd_summary_daily(
    db: &Database,
    settings: &Config,
    user: &str,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = parse_date_arg(date)?.unwrap_or_else(summary::today);
    let daily = SummaryEngine::new(db, settings.week_start).daily(user, date)?;

    if json {
        return print_json(&daily);
    }
    println!("{}", format::render_daily(&daily));
    Ok(())
}

pub fn cmd_summary_weekly(
    db: &Database,
    settings: &Config,
    user: &str,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = parse_date_arg(date)?.unwrap_or_else(summary::today);
    let weekly = SummaryEngine::new(db, settings.week_start).weekly(user, date)?;

    if json {
        return print_json(&weekly);
    }
    println!("{}", format::render_weekly(&weekly));
    Ok(())
}

pub fn cmd_summary_monthly(
    db: &Database,
    settings: &Config,
    user: &str,
    month: Option<&str>,
    json: bool,
) -> Result<()> {
    let month = match month {
        Some(m) => m.parse::<YearMonth>()?,
        None => YearMonth::of(summary::today()),
    };
    let monthly = SummaryEngine::new(db, settings.week_start).monthly(user, month)?;

    if json {
        return print_json(&monthly);
    }
    println!("{}", format::render_monthly(&monthly));
    Ok(())
}

pub fn cmd_summary_categories(
    db: &Database,
    settings: &Config,
    user: &str,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let start = parse_date_arg(from)?;
    let end = parse_date_arg(to)?;
    let report = SummaryEngine::new(db, settings.week_start).categories(user, start, end)?;

    if json {
        return print_json(&report);
    }

    println!();
    println!("📂 Spending by category for {}", user);
    println!("   ─────────────────────────────");

    if report.category_totals.is_empty() {
        println!("   No categorized receipts");
        println!();
        return Ok(());
    }

    let mut rows: Vec<(&String, &f64)> = report.category_totals.iter().collect();
    rows.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (category, amount) in rows {
        let pct = report
            .category_percentages
            .get(category)
            .copied()
            .unwrap_or(0.0);
        println!(
            "   {:<14} {:>18}  {:>6}%",
            category,
            format_currency(*amount),
            format_number((pct * 10.0).round() / 10.0)
        );
        if let Some(items) = report.category_items.get(category) {
            println!("      {}", items.join(", "));
        }
    }

    println!("   ─────────────────────────────");
    println!("   Total: {}", format_currency(report.total_spent));
    println!();
    Ok(())
}
