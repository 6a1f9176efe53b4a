/// Error types for the gallery client
///
/// Every fallible operation in the client returns `ClientError`.
/// At the async task boundary the error is rendered to a `String`,
/// because iced messages have to be `Clone`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, DNS, body read)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered, but not with a success status
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("configuration error: {0}")]
    Config(String),

    /// Form input that cannot be turned into a generation request
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mentions_url() {
        let err = ClientError::Status {
            url: "http://localhost/api/uploaded_images?page=1".to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = err.to_string();
        assert!(message.contains("page=1"));
        assert!(message.contains("500"));
    }

    #[test]
    fn test_invalid_input_message() {
        let err = ClientError::InvalidInput {
            field: "n",
            reason: "expected a whole number".to_string(),
        };
        assert_eq!(err.to_string(), "invalid n: expected a whole number");
    }
}
