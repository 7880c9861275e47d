//! Spending summary handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::parse_date_param;
use crate::{AppError, AppState};
use struk_core::models::{
    CategoryReport, DailySummary, MonthlySummary, Stats, StatsPeriod, WeeklySummary, YearMonth,
};
use struk_core::summary;

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    /// Day to summarize (YYYY-MM-DD, default today)
    pub date: Option<String>,
}

/// GET /summary/:userId - Spending for one day
pub async fn daily_summary(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<DailyQuery>,
) -> Result<Json<DailySummary>, AppError> {
    let date = parse_date_param(params.date.as_deref(), "date")?.unwrap_or_else(summary::today);
    Ok(Json(state.summaries().daily(&user_id, date)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyQuery {
    /// Any day within the week (YYYY-MM-DD, default today)
    pub week_start: Option<String>,
}

/// GET /weekly/:userId - Spending for the week containing `weekStart`
pub async fn weekly_summary(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<WeeklyQuery>,
) -> Result<Json<WeeklySummary>, AppError> {
    let date = parse_date_param(params.week_start.as_deref(), "weekStart")?
        .unwrap_or_else(summary::today);
    Ok(Json(state.summaries().weekly(&user_id, date)?))
}

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    /// Month to summarize (YYYY-MM, default current month)
    pub month: Option<String>,
}

/// GET /monthly/:userId - Spending for a calendar month
pub async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<MonthlyQuery>,
) -> Result<Json<MonthlySummary>, AppError> {
    let month = match params.month.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => m.parse::<YearMonth>()?,
        None => YearMonth::of(summary::today()),
    };
    Ok(Json(state.summaries().monthly(&user_id, month)?))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// daily, weekly or monthly (anything else means monthly)
    pub period: Option<String>,
}

/// GET /stats/:userId - Summary for the current day, week or month
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<Stats>, AppError> {
    let period = StatsPeriod::parse_lenient(params.period.as_deref());
    Ok(Json(state.summaries().stats(&user_id, period, summary::today())?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /categories/:userId - Category totals, shares and item names
pub async fn categories(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<CategoriesQuery>,
) -> Result<Json<CategoryReport>, AppError> {
    let start = parse_date_param(params.start_date.as_deref(), "startDate")?;
    let end = parse_date_param(params.end_date.as_deref(), "endDate")?;
    Ok(Json(state.summaries().categories(&user_id, start, end)?))
}
