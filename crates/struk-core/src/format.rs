//! Plain-text rendering of receipts and summaries for chat replies
//!
//! Every function here is pure: the same input always renders the same text.

use std::fmt::Write;

use crate::models::{DailySummary, MonthlySummary, Receipt, WeeklySummary};

const RULE: &str = "--------------------";
const UNKNOWN: &str = "unknown";

/// Format an amount id-ID style: `Rp 1.234.567,5`
///
/// Fraction digits (up to three) are shown only when non-zero.
pub fn format_currency(amount: f64) -> String {
    format!("Rp {}", format_number(amount))
}

/// Group thousands with `.` and use `,` as the decimal separator
pub fn format_number(amount: f64) -> String {
    if !amount.is_finite() {
        return "0".to_string();
    }

    let scaled = (amount.abs() * 1000.0).round() as u64;
    let whole = scaled / 1000;
    let frac = scaled % 1000;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && scaled > 0 { "-" } else { "" };
    if frac == 0 {
        format!("{}{}", sign, grouped)
    } else {
        let frac = format!("{:03}", frac);
        format!("{}{},{}", sign, grouped, frac.trim_end_matches('0'))
    }
}

/// Categories sorted by amount descending, then name
fn ranked<'a, I>(totals: I) -> Vec<(&'a str, f64)>
where
    I: IntoIterator<Item = (&'a String, &'a f64)>,
{
    let mut ranked: Vec<(&str, f64)> = totals.into_iter().map(|(k, v)| (k.as_str(), *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

/// Reply for a freshly stored receipt
pub fn render_receipt(receipt: &Receipt) -> String {
    let mut out = String::from("🧾 RECEIPT SAVED\n\n");
    let _ = writeln!(
        out,
        "🏪 Store: {}",
        receipt.store_name.as_deref().unwrap_or(UNKNOWN)
    );
    let _ = writeln!(out, "📅 Date: {}", receipt.date.format("%d/%m/%Y"));
    let _ = writeln!(out, "⏰ Time: {}\n", receipt.time.as_deref().unwrap_or(UNKNOWN));

    out.push_str("🛒 ITEMS:\n");
    out.push_str(RULE);
    out.push('\n');
    for (index, item) in receipt.items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, item.name);
        let _ = writeln!(
            out,
            "   {}x @ {}",
            format_number(item.quantity),
            format_currency(item.unit_price)
        );
        let _ = writeln!(out, "   Line total: {}\n", format_currency(item.line_total));
    }
    out.push_str(RULE);
    out.push('\n');

    let _ = writeln!(out, "💰 Subtotal: {}", format_currency(receipt.subtotal));
    if receipt.tax > 0.0 {
        let _ = writeln!(out, "🧾 Tax: {}", format_currency(receipt.tax));
    }
    let _ = writeln!(out, "💵 TOTAL: {}\n", format_currency(receipt.total));

    if !receipt.categories.is_empty() {
        out.push_str("📊 CATEGORIES:\n");
        let totals = receipt.categories.iter().map(|c| (&c.category, &c.total));
        for (category, total) in ranked(totals) {
            let _ = writeln!(out, "• {}: {}", category, format_currency(total));
        }
    }

    out.push_str("\n📱 Send /summary for today's spending");
    out
}

/// Reply for `/summary`
pub fn render_daily(summary: &DailySummary) -> String {
    let mut out = String::from("📊 TODAY'S SPENDING\n");
    let _ = writeln!(out, "📅 {}\n", summary.date.format("%d %B %Y"));

    let _ = writeln!(out, "💰 Total spent: {}", format_currency(summary.total_spent));
    let _ = writeln!(out, "📋 Transactions: {}\n", summary.total_transactions);

    if !summary.category_totals.is_empty() {
        out.push_str("📊 BY CATEGORY:\n");
        out.push_str(RULE);
        out.push('\n');
        for (category, total) in ranked(&summary.category_totals) {
            let _ = writeln!(out, "• {}: {}", category, format_currency(total));
        }
        out.push('\n');
    }

    if !summary.receipts.is_empty() {
        out.push_str("🛒 TRANSACTIONS:\n");
        out.push_str(RULE);
        out.push('\n');
        for (index, digest) in summary.receipts.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} ({})",
                index + 1,
                digest.store_name.as_deref().unwrap_or(UNKNOWN),
                digest.time.as_deref().unwrap_or(UNKNOWN)
            );
            let _ = writeln!(out, "   {}\n", format_currency(digest.total));
        }
    }

    out.push_str("📱 Send /weekly for this week's spending");
    out
}

/// Reply for `/weekly`
pub fn render_weekly(summary: &WeeklySummary) -> String {
    let mut out = String::from("📊 THIS WEEK'S SPENDING\n");
    let _ = writeln!(
        out,
        "📅 {} - {}\n",
        summary.week_start.format("%d %b"),
        summary.week_end.format("%d %b %Y")
    );

    let _ = writeln!(out, "💰 Total spent: {}", format_currency(summary.total_spent));
    let _ = writeln!(
        out,
        "📈 Average per day: {}\n",
        format_currency(summary.average_per_day)
    );

    out.push_str("📊 BY DAY:\n");
    out.push_str(RULE);
    out.push('\n');
    for (date, total) in &summary.daily_totals {
        let _ = writeln!(out, "• {}: {}", date.format("%a, %d %b"), format_currency(*total));
    }

    out.push_str("\n📱 Send /monthly for this month's spending");
    out
}

/// Reply for `/monthly`
pub fn render_monthly(summary: &MonthlySummary) -> String {
    let mut out = String::from("📊 THIS MONTH'S SPENDING\n");
    let _ = writeln!(out, "📅 {}\n", summary.month.first_day().format("%B %Y"));

    let _ = writeln!(out, "💰 Total spent: {}", format_currency(summary.total_spent));
    let _ = writeln!(
        out,
        "📈 Average per day: {}\n",
        format_currency(summary.average_per_day)
    );

    if !summary.category_totals.is_empty() {
        out.push_str("📊 BY CATEGORY:\n");
        out.push_str(RULE);
        out.push('\n');
        for (category, total) in ranked(&summary.category_totals) {
            let _ = writeln!(out, "• {}: {}", category, format_currency(total));
        }
        out.push('\n');
    }

    if !summary.weekly_totals.is_empty() {
        out.push_str("📈 BY WEEK:\n");
        out.push_str(RULE);
        out.push('\n');
        for (week, total) in &summary.weekly_totals {
            let _ = writeln!(out, "• {}: {}", week, format_currency(*total));
        }
    }

    out.trim_end().to_string()
}

pub fn help_message() -> String {
    [
        "🤖 STRUK RECEIPT BOT",
        "",
        "📱 COMMANDS:",
        "• /help - Show this help",
        "• /summary - Today's spending",
        "• /weekly - This week's spending",
        "• /monthly - This month's spending",
        "",
        "💡 TIPS:",
        "• Make sure the receipt photo is sharp and not blurry",
        "• Photograph receipts in good lighting",
        "• Receipts are analyzed and saved automatically",
    ]
    .join("\n")
}

pub fn unrecognized_message() -> String {
    "🤔 Command not recognized. Send a receipt photo, or /help for available commands.".to_string()
}
