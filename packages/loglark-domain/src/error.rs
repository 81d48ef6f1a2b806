pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Tool-call JSON is unrecoverable after repair: {snippet}")]
	MalformedResponse { snippet: String },
	#[error("Tool-call arguments are missing required field `{field}`.")]
	MissingField { field: &'static str },
	#[error("Field `{field}` is invalid: {message}")]
	InvalidField { field: &'static str, message: String },
}
