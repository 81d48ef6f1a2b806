use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use loglark_service::{
	Error as ServiceError, IngestExerciseResponse, IngestExpenseResponse, IngestFoodResponse,
	IngestRequest, IngestTimeResponse, RangeReportRequest, UnifiedIngestResponse,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/ingest", post(ingest_time))
		.route("/expense", post(ingest_expense))
		.route("/food", post(ingest_food))
		.route("/exercise", post(ingest_exercise))
		.route("/unified-ingest", post(unified_ingest))
		.route("/stats/start", post(scheduler_start))
		.route("/stats/stop", post(scheduler_stop))
		.route("/stats/run-manual", post(run_time_stats))
		.route("/expense-stats/run-manual", post(run_expense_stats))
		.route("/unified-report/run-manual", post(run_daily_calorie))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn ingest_time(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestTimeResponse>, ApiError> {
	let response = state.service.ingest_time(payload).await?;

	Ok(Json(response))
}

async fn ingest_expense(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestExpenseResponse>, ApiError> {
	let response = state.service.ingest_expense(payload).await?;

	Ok(Json(response))
}

async fn ingest_food(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestFoodResponse>, ApiError> {
	let response = state.service.ingest_food(payload).await?;

	Ok(Json(response))
}

async fn ingest_exercise(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestExerciseResponse>, ApiError> {
	let response = state.service.ingest_exercise(payload).await?;

	Ok(Json(response))
}

async fn unified_ingest(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<UnifiedIngestResponse>, ApiError> {
	let response = state.service.unified_ingest(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct SchedulerStatus {
	running: bool,
}

async fn scheduler_start(State(state): State<AppState>) -> Json<SchedulerStatus> {
	state.scheduler.start();

	Json(SchedulerStatus { running: state.scheduler.is_running() })
}

async fn scheduler_stop(State(state): State<AppState>) -> Json<SchedulerStatus> {
	state.scheduler.stop();

	Json(SchedulerStatus { running: state.scheduler.is_running() })
}

#[derive(Debug, Serialize)]
struct ReportResponse {
	report: String,
}

/// The body is optional; `{start_date, end_date}` selects a range report,
/// no body runs yesterday's scheduled report.
async fn run_time_stats(
	State(state): State<AppState>,
	payload: Option<Json<RangeReportRequest>>,
) -> Result<Json<ReportResponse>, ApiError> {
	let req = payload.map(|Json(req)| req).unwrap_or_default();
	let report = state.service.run_time_stats(req).await?;

	Ok(Json(ReportResponse { report }))
}

async fn run_expense_stats(
	State(state): State<AppState>,
	payload: Option<Json<RangeReportRequest>>,
) -> Result<Json<ReportResponse>, ApiError> {
	let req = payload.map(|Json(req)| req).unwrap_or_default();
	let report = state.service.run_expense_stats(req).await?;

	Ok(Json(ReportResponse { report }))
}

async fn run_daily_calorie(
	State(state): State<AppState>,
) -> Result<Json<ReportResponse>, ApiError> {
	let report = state.service.run_daily_calorie_report().await?;

	Ok(Json(ReportResponse { report }))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		// Upstream trouble (model, parse, Notion) surfaces as 502 like any
		// other bad gateway; only caller mistakes earn a 400.
		let (status, error_code) = match &err {
			ServiceError::Classification { .. } => (StatusCode::BAD_GATEWAY, "classification_failed"),
			ServiceError::MalformedResponse { .. } => (StatusCode::BAD_GATEWAY, "malformed_response"),
			ServiceError::MissingField { .. } => (StatusCode::BAD_GATEWAY, "missing_field"),
			ServiceError::Provider { .. } => (StatusCode::BAD_GATEWAY, "provider_error"),
			ServiceError::UnsupportedIntent { .. } => (StatusCode::BAD_REQUEST, "unsupported_intent"),
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
		};

		Self { status, error_code, message: err.to_string() }
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}
