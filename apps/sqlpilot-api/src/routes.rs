use axum::{
	Json, Router,
	extract::{
		Path, State,
		ws::{Message, WebSocket, WebSocketUpgrade},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use sqlpilot_domain::{schema::DescribedTable, validator::ValidationOutcome};
use sqlpilot_service::{
	AskReport, CancelFlag, CorrectionResult, Error, ExecuteReport, Explanation, IndexStats,
	IndexStatus, Nl2SqlReport, RetrievalOutcome, SchemaSummary,
};

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
	pub question: String,
	#[serde(default)]
	pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SqlRequest {
	pub sql: String,
}

#[derive(Debug, Deserialize)]
pub struct CorrectRequest {
	pub sql: String,
	pub error_message: String,
}

#[derive(Debug, Deserialize)]
pub struct RetrievalRequest {
	pub question: String,
	#[serde(default)]
	pub top_k: Option<u32>,
	#[serde(default)]
	pub threshold: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
	#[serde(default)]
	pub force: bool,
}

/// One text frame received on `/ws/query`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SocketRequest {
	Nl2sql {
		question: String,
		#[serde(default)]
		context: Option<String>,
	},
	Execute {
		sql: String,
	},
	Ping,
}

/// One text frame sent back on `/ws/query`, answering exactly one request.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SocketReply {
	Nl2sqlResult { data: Nl2SqlReport },
	ExecuteResult { data: ExecuteReport },
	Pong,
	Error { error_code: String, message: String },
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/query/nl2sql", post(nl2sql))
		.route("/v1/query/ask", post(ask))
		.route("/v1/query/execute", post(execute))
		.route("/v1/query/validate", post(validate))
		.route("/v1/query/explain", post(explain))
		.route("/v1/query/correct", post(correct))
		.route("/v1/schema", get(schema_summary))
		.route("/v1/schema/{table}", get(describe_table))
		.route("/v1/retrieval/search", post(retrieval_search))
		.route("/ws/query", get(query_socket))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/index", post(rebuild_index).get(index_status).delete(clear_index))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn nl2sql(
	State(state): State<AppState>,
	Json(payload): Json<QuestionRequest>,
) -> Result<Json<Nl2SqlReport>, ApiError> {
	let cancel = CancelFlag::new();
	let response =
		state.pilot.nl2sql(&payload.question, payload.context.as_deref(), &cancel).await?;

	Ok(Json(response))
}

async fn ask(
	State(state): State<AppState>,
	Json(payload): Json<QuestionRequest>,
) -> Result<Json<AskReport>, ApiError> {
	let cancel = CancelFlag::new();
	let response = state.pilot.ask(&payload.question, payload.context.as_deref(), &cancel).await?;

	Ok(Json(response))
}

async fn execute(
	State(state): State<AppState>,
	Json(payload): Json<SqlRequest>,
) -> Result<Json<ExecuteReport>, ApiError> {
	let response = state.pilot.execute_sql(&payload.sql).await?;

	Ok(Json(response))
}

async fn validate(
	State(state): State<AppState>,
	Json(payload): Json<SqlRequest>,
) -> Json<ValidationOutcome> {
	Json(state.pilot.validate(&payload.sql).await)
}

async fn explain(
	State(state): State<AppState>,
	Json(payload): Json<SqlRequest>,
) -> Result<Json<Explanation>, ApiError> {
	let response = state.pilot.explain(&payload.sql).await?;

	Ok(Json(response))
}

async fn correct(
	State(state): State<AppState>,
	Json(payload): Json<CorrectRequest>,
) -> Result<Json<CorrectionResult>, ApiError> {
	if payload.sql.trim().is_empty() {
		return Err(json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			"sql must be non-empty.",
			Some(vec!["$.sql".to_string()]),
		));
	}

	let response = state.pilot.correct(&payload.sql, &payload.error_message).await?;

	Ok(Json(response))
}

async fn schema_summary(State(state): State<AppState>) -> Result<Json<SchemaSummary>, ApiError> {
	let response = state.pilot.schema_summary().await?;

	Ok(Json(response))
}

async fn describe_table(
	State(state): State<AppState>,
	Path(table): Path<String>,
) -> Result<Json<DescribedTable>, ApiError> {
	let response = state.pilot.describe_table(&table).await?;

	Ok(Json(response))
}

async fn retrieval_search(
	State(state): State<AppState>,
	Json(payload): Json<RetrievalRequest>,
) -> Result<Json<RetrievalOutcome>, ApiError> {
	if payload.question.trim().is_empty() {
		return Err(json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			"question must be non-empty.",
			Some(vec!["$.question".to_string()]),
		));
	}

	let response = state.pilot.retrieve(&payload.question, payload.top_k, payload.threshold).await;

	Ok(Json(response))
}

async fn rebuild_index(
	State(state): State<AppState>,
	payload: Option<Json<IndexRequest>>,
) -> Result<Json<IndexStats>, ApiError> {
	let force = payload.map(|Json(request)| request.force).unwrap_or(false);
	let response = state.pilot.index_database(force).await?;

	Ok(Json(response))
}

async fn index_status(State(state): State<AppState>) -> Result<Json<IndexStatus>, ApiError> {
	let response = state.pilot.index_status().await?;

	Ok(Json(response))
}

async fn clear_index(State(state): State<AppState>) -> Result<Json<IndexStatus>, ApiError> {
	state.pilot.clear_index().await?;

	let response = state.pilot.index_status().await?;

	Ok(Json(response))
}

async fn query_socket(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> Response {
	upgrade.on_upgrade(move |socket| serve_socket(state, socket))
}

async fn serve_socket(state: AppState, mut socket: WebSocket) {
	tracing::info!("Query socket opened.");

	while let Some(message) = socket.recv().await {
		let text = match message {
			Ok(Message::Text(text)) => text,
			Ok(Message::Close(_)) => break,
			Ok(_) => continue,
			Err(err) => {
				tracing::warn!(error = %err, "Query socket failed.");

				break;
			},
		};
		let reply = socket_reply(&state, text.as_str()).await;
		let payload = match serde_json::to_string(&reply) {
			Ok(payload) => payload,
			Err(err) => {
				tracing::error!(error = %err, "Failed to encode socket reply.");

				break;
			},
		};

		if socket.send(Message::Text(payload.into())).await.is_err() {
			break;
		}
	}

	tracing::info!("Query socket closed.");
}

/// Answers one socket frame. Failures become an `error` reply and the socket stays open.
pub async fn socket_reply(state: &AppState, text: &str) -> SocketReply {
	let request = match serde_json::from_str::<SocketRequest>(text) {
		Ok(request) => request,
		Err(err) =>
			return SocketReply::Error {
				error_code: "INVALID_REQUEST".to_string(),
				message: err.to_string(),
			},
	};
	let result = match request {
		SocketRequest::Nl2sql { question, context } => state
			.pilot
			.nl2sql(&question, context.as_deref(), &CancelFlag::new())
			.await
			.map(|data| SocketReply::Nl2sqlResult { data }),
		SocketRequest::Execute { sql } =>
			state.pilot.execute_sql(&sql).await.map(|data| SocketReply::ExecuteResult { data }),
		SocketRequest::Ping => Ok(SocketReply::Pong),
	};

	result.unwrap_or_else(|err| {
		let err = ApiError::from(err);

		SocketReply::Error { error_code: err.error_code, message: err.message }
	})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();

		match err {
			Error::InvalidRequest { .. } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			Error::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			Error::ValidationRejected { warnings, .. } => json_error(
				StatusCode::UNPROCESSABLE_ENTITY,
				"VALIDATION_REJECTED",
				message,
				Some(warnings),
			),
			Error::ExecutionFailed { .. } =>
				json_error(StatusCode::UNPROCESSABLE_ENTITY, "EXECUTION_FAILED", message, None),
			Error::ServiceUnavailable { .. } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message, None),
			Error::Timeout { .. } =>
				json_error(StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", message, None),
			Error::IndexingFailed { table, .. } => json_error(
				StatusCode::INTERNAL_SERVER_ERROR,
				"INDEXING_FAILED",
				message,
				Some(vec![table]),
			),
			Error::Cancelled { .. } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "CANCELLED", message, None),
			Error::Provider { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None),
			Error::Qdrant { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "QDRANT_ERROR", message, None),
			Error::Storage { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message, None),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::error!(
				error_code = %self.error_code,
				message = %self.message,
				"Request failed."
			);
		}

		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
