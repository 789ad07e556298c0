use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    api::error::ApiError,
    domain::{Report, ReportCell, ReportCells},
    forecast::ForecastParams,
    report::{Granularity, ReportRequest},
    state::AppState,
};

/// Query of GET /report_by_date/
#[derive(Debug, Deserialize)]
pub struct ReportByDateQuery {
    pub start_date: String,
    pub end_date: String,
    pub group_by: Option<String>,
}

/// Body of POST /forecast_report/
#[derive(Debug, Deserialize)]
pub struct ForecastReportBody {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub group_by: Option<String>,
    pub forecast: Option<ForecastParams>,
    pub allow_partial: Option<bool>,
}

/// `YYYY-MM-DD`, tolerating the trailing slash some clients append
fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{field} must be YYYY-MM-DD, got '{raw}'")))
}

fn parse_granularity(raw: Option<&str>) -> Result<Option<Granularity>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Ok(Some(value.parse::<Granularity>()?)),
    }
}

/// GET /report/ - all-time totals
pub async fn totals(State(state): State<AppState>) -> Result<Json<ReportCell>, ApiError> {
    Ok(Json(state.engine.totals().await?))
}

/// GET /report_by_date/ - historical report as a label → cell map
pub async fn report_by_date(
    State(state): State<AppState>,
    Query(query): Query<ReportByDateQuery>,
) -> Result<Json<ReportCells>, ApiError> {
    let start = parse_date("start_date", &query.start_date)?;
    let end = parse_date("end_date", &query.end_date)?;

    let mut request = ReportRequest::for_dates(start, end);
    request.granularity = parse_granularity(query.group_by.as_deref())?;

    let report = state.engine.build_report(&request).await?;
    Ok(Json(report.periods))
}

/// POST /forecast_report/ - hybrid historical + forecast report
pub async fn forecast_report(
    State(state): State<AppState>,
    Json(body): Json<ForecastReportBody>,
) -> Result<Json<Report>, ApiError> {
    let mut request = ReportRequest::for_dates(body.start_date, body.end_date)
        .allow_partial(body.allow_partial.unwrap_or(state.cfg.forecast.allow_partial));
    request.granularity = parse_granularity(body.group_by.as_deref())?;
    request.forecast = body.forecast;

    Ok(Json(state.engine.build_report(&request).await?))
}
