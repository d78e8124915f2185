//! Error types for the talentsift core library.
//!
//! Each module has its own error enum to provide clear error boundaries.
//! The library uses `thiserror` for structured, typed errors. Stage handlers
//! translate everything into [`StageError`], the single taxonomy the pipeline
//! runtime acts on.

/// Errors related to configuration loading, parsing, and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration field has an unacceptable value.
    #[error("invalid value for config field '{field}': {message}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// A description of why the value is invalid.
        message: String,
    },

    /// The configuration file does not exist at the specified path.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// The path that was searched.
        path: String,
    },

    /// TOML deserialization failed.
    #[error("failed to parse config file: {source}")]
    ParseError {
        /// The underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Errors from SQLite storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to connect to SQLite database.
    #[error("database connection error: {source}")]
    Connection {
        /// The underlying SQLx error.
        #[source]
        source: sqlx::Error,
    },

    /// Database migration failed.
    #[error("database migration error: {source}")]
    Migration {
        /// The underlying migration error.
        #[source]
        source: sqlx::migrate::MigrateError,
    },

    /// A database query failed.
    #[error("database query error: {source}")]
    Query {
        /// The underlying SQLx error.
        #[source]
        source: sqlx::Error,
    },

    /// A persisted JSON column could not be decoded.
    #[error("corrupt JSON in column '{column}': {message}")]
    CorruptRecord {
        /// The column holding the unreadable JSON.
        column: String,
        /// Details from the decoder.
        message: String,
    },
}

/// Errors from blob storage (raw documents, extracted text, evidence).
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// No blob exists under the given URI.
    #[error("blob not found: {uri}")]
    NotFound {
        /// The URI that was requested.
        uri: String,
    },

    /// An underlying filesystem operation failed.
    #[error("blob I/O error for '{uri}': {source}")]
    Io {
        /// The URI being read or written.
        uri: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A blob that should contain UTF-8 text did not.
    #[error("blob is not valid UTF-8: {uri}")]
    NotUtf8 {
        /// The URI of the offending blob.
        uri: String,
    },
}

/// Errors from interacting with the LLM / embedding provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP request to the provider failed.
    #[error("LLM HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("LLM API error (status {status}): {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the API.
        message: String,
    },

    /// Provider rate limit hit.
    #[error("LLM rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Provider response could not be parsed.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),

    /// No API key configured.
    #[error("no LLM API key configured")]
    NotConfigured,
}

/// Errors from document text extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The PDF could not be read at all.
    #[error("PDF parse error: {message}")]
    Pdf {
        /// Details from the PDF parser.
        message: String,
    },

    /// The Word document could not be read.
    #[error("Word parse error: {message}")]
    Word {
        /// Details from the archive or XML parser.
        message: String,
    },

    /// The document parsed but yielded no text.
    #[error("no text could be extracted from document")]
    Empty,
}

/// Outcome taxonomy for a stage handler.
///
/// Handlers do not catch errors internally except to translate them into
/// this enum; the pipeline runner is the single place that decides queue
/// and candidate state from it.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// An expected upstream record is absent (no documents, no extraction).
    #[error("missing input: {what}")]
    InputMissing {
        /// What was expected and not found.
        what: String,
    },

    /// Document parsing produced no usable text.
    #[error("parse failure: {message}")]
    ParseFailure {
        /// Details of the failure.
        message: String,
    },

    /// The model returned JSON that does not match the required shape.
    /// Treated as transient since model outputs are probabilistic.
    #[error("schema violation in model output: {message}")]
    SchemaViolation {
        /// Details from the validator.
        message: String,
    },

    /// The LLM or embedding provider failed or timed out.
    #[error("upstream provider error: {0}")]
    Upstream(#[from] LlmError),

    /// Blob storage read or write failed.
    #[error("blob storage error: {0}")]
    Storage(#[from] BlobError),

    /// A database operation inside the handler failed.
    #[error("database error: {0}")]
    Db(#[from] StorageError),

    /// No score configuration row exists. Fatal until an operator seeds one.
    #[error("no score config present")]
    ConfigMissing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_invalid_value_message() {
        let err = ConfigError::InvalidValue {
            field: "worker.poll_interval_secs".to_string(),
            message: "must be a positive integer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for config field 'worker.poll_interval_secs': must be a positive integer"
        );
    }

    #[test]
    fn blob_error_not_found_message() {
        let err = BlobError::NotFound {
            uri: "text/c1_abc.txt".to_string(),
        };
        assert_eq!(err.to_string(), "blob not found: text/c1_abc.txt");
    }

    #[test]
    fn llm_error_rate_limited_message() {
        let err = LlmError::RateLimited {
            retry_after_secs: 30,
        };
        assert_eq!(err.to_string(), "LLM rate limited, retry after 30 seconds");
    }

    #[test]
    fn llm_error_api_message() {
        let err = LlmError::Api {
            status: 401,
            message: "Invalid API key".to_string(),
        };
        assert_eq!(err.to_string(), "LLM API error (status 401): Invalid API key");
    }

    #[test]
    fn stage_error_input_missing_message() {
        let err = StageError::InputMissing {
            what: "documents for candidate c1".to_string(),
        };
        assert_eq!(err.to_string(), "missing input: documents for candidate c1");
    }

    #[test]
    fn stage_error_wraps_llm_error() {
        let err = StageError::from(LlmError::NotConfigured);
        assert_eq!(
            err.to_string(),
            "upstream provider error: no LLM API key configured"
        );
    }

    #[test]
    fn extract_error_empty_message() {
        assert_eq!(
            ExtractError::Empty.to_string(),
            "no text could be extracted from document"
        );
    }
}
