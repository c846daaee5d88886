pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Query rejected: {reason}")]
	ValidationRejected { reason: String, warnings: Vec<String> },
	#[error("Query execution failed: {message}")]
	ExecutionFailed { message: String },
	#[error("{service} is unavailable: {message}")]
	ServiceUnavailable { service: String, message: String },
	#[error("{operation} timed out after {timeout_ms} ms.")]
	Timeout { operation: String, timeout_ms: u64 },
	#[error("Indexing failed at table {table}: {message}")]
	IndexingFailed { table: String, message: String },
	#[error("Cancelled before {stage}.")]
	Cancelled { stage: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}
impl Error {
	/// Backend failures that end an `index` call outright instead of being pinned to a table.
	pub fn is_backend_failure(&self) -> bool {
		matches!(
			self,
			Self::ServiceUnavailable { .. }
				| Self::Timeout { .. }
				| Self::Cancelled { .. }
				| Self::Qdrant { .. }
		)
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<sqlpilot_storage::Error> for Error {
	fn from(err: sqlpilot_storage::Error) -> Self {
		match err {
			sqlpilot_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			sqlpilot_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			sqlpilot_storage::Error::NotFound(message) => Self::NotFound { message },
			sqlpilot_storage::Error::Timeout { timeout_ms } =>
				Self::Timeout { operation: "Query execution".to_string(), timeout_ms },
			sqlpilot_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<sqlpilot_providers::Error> for Error {
	fn from(err: sqlpilot_providers::Error) -> Self {
		match err {
			sqlpilot_providers::Error::Timeout { provider, timeout_ms } =>
				Self::Timeout { operation: format!("Provider {provider}"), timeout_ms },
			sqlpilot_providers::Error::Unavailable { provider, message } =>
				Self::ServiceUnavailable { service: format!("Provider {provider}"), message },
			other => Self::Provider { message: other.to_string() },
		}
	}
}
