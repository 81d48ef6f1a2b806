pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Classification failed: {message}")]
	Classification { message: String },
	#[error("Model returned unusable JSON: {snippet}")]
	MalformedResponse { snippet: String },
	#[error("Missing key in function args: {field}")]
	MissingField { field: &'static str },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Unsupported intent type: {intent}")]
	UnsupportedIntent { intent: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
}
impl From<loglark_domain::Error> for Error {
	fn from(err: loglark_domain::Error) -> Self {
		match err {
			loglark_domain::Error::MalformedResponse { snippet } => Self::MalformedResponse { snippet },
			loglark_domain::Error::MissingField { field } => Self::MissingField { field },
			loglark_domain::Error::InvalidField { field, message } =>
				Self::MalformedResponse { snippet: format!("{field}: {message}") },
		}
	}
}
impl From<loglark_providers::Error> for Error {
	fn from(err: loglark_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
