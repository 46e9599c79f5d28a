//! Error types for the schema registry client.

use serde::Deserialize;
use thiserror::Error;

/// Registry error code for an unknown subject.
pub const SUBJECT_NOT_FOUND: u32 = 40401;

/// Registry error code for an unknown version of a known subject.
pub const VERSION_NOT_FOUND: u32 = 40402;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Registry returned {status} (error code {error_code:?}): {message}")]
    Api {
        status: u16,
        error_code: Option<u32>,
        message: String,
    },

    #[error("Registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Schema {schema_id} is not a valid Avro schema: {source}")]
    InvalidSchema {
        schema_id: u32,
        #[source]
        source: Box<apache_avro::Error>,
    },

    #[error("Schema {schema_id} has type {schema_type}, expected AVRO")]
    UnsupportedSchemaType { schema_id: u32, schema_type: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RegistryError {
    /// Registry error code, when the registry supplied one.
    pub fn error_code(&self) -> Option<u32> {
        match self {
            RegistryError::SubjectNotFound(_) => Some(SUBJECT_NOT_FOUND),
            RegistryError::VersionNotFound(_) => Some(VERSION_NOT_FOUND),
            RegistryError::Api { error_code, .. } => *error_code,
            _ => None,
        }
    }

    /// True only for "subject not found" and "version not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::SubjectNotFound(_) | RegistryError::VersionNotFound(_)
        )
    }
}

/// Map a non-success registry response to an error.
///
/// The registry answers errors with `{"error_code": ..., "message": ...}`;
/// bodies that are not in that shape are kept verbatim.
pub fn parse_error(status: u16, body: &str) -> RegistryError {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error_code: Option<u32>,
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => {
            let message = err.message.unwrap_or_else(|| body.to_string());
            match err.error_code {
                Some(SUBJECT_NOT_FOUND) => RegistryError::SubjectNotFound(message),
                Some(VERSION_NOT_FOUND) => RegistryError::VersionNotFound(message),
                error_code => RegistryError::Api {
                    status,
                    error_code,
                    message,
                },
            }
        }
        Err(_) => RegistryError::Api {
            status,
            error_code: None,
            message: body.to_string(),
        },
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_subject_not_found() {
        let err = parse_error(
            404,
            r#"{"error_code":40401,"message":"Subject 'orders-key' not found."}"#,
        );
        assert!(matches!(err, RegistryError::SubjectNotFound(ref m) if m.contains("orders-key")));
        assert!(err.is_not_found());
        assert_eq!(err.error_code(), Some(40401));
    }

    #[test]
    fn test_parse_error_version_not_found() {
        let err = parse_error(404, r#"{"error_code":40402,"message":"Version 3 not found."}"#);
        assert!(matches!(err, RegistryError::VersionNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_error_schema_not_found_is_not_swallowable() {
        let err = parse_error(404, r#"{"error_code":40403,"message":"Schema not found"}"#);
        assert!(!err.is_not_found());
        assert_eq!(err.error_code(), Some(40403));
    }

    #[test]
    fn test_parse_error_non_json_body() {
        let err = parse_error(502, "Bad Gateway");
        match err {
            RegistryError::Api {
                status,
                error_code,
                message,
            } => {
                assert_eq!(status, 502);
                assert_eq!(error_code, None);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
