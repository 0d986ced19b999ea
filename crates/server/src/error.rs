use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use ephemera_core::ContentError;

/// Errors that can occur when running the Ephemera server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener or reading the config file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Content was rejected or could not be found.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// The multipart body could not be read.
    #[error("invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// The request was well-formed but missing something required.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Too many event stream observers are connected.
    #[error("too many concurrent event streams")]
    TooManyObservers,

    /// A response could not be assembled.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Content(e) => match e {
                ContentError::Validation(_) => StatusCode::BAD_REQUEST,
                ContentError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                ContentError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ContentError::NotFound(_) => StatusCode::NOT_FOUND,
                ContentError::Expired(_) => StatusCode::GONE,
                ContentError::DuplicateId(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Multipart(e) => e.status(),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::TooManyObservers => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use ephemera_core::ContentId;

    use super::*;

    #[test]
    fn content_errors_map_to_statuses() {
        let id = ContentId::new("x");
        let cases = [
            (
                ServerError::from(ContentError::Validation("empty".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::from(ContentError::PayloadTooLarge { size: 2, max: 1 }),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ServerError::from(ContentError::UnsupportedMediaType("a/b".into())),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ServerError::from(ContentError::NotFound(id.clone())),
                StatusCode::NOT_FOUND,
            ),
            (
                ServerError::from(ContentError::Expired(id.clone())),
                StatusCode::GONE,
            ),
            (
                ServerError::from(ContentError::DuplicateId(id)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ServerError::TooManyObservers, StatusCode::TOO_MANY_REQUESTS),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }

    #[tokio::test]
    async fn response_body_carries_message() {
        let response = ServerError::BadRequest("missing field `file`".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "bad request: missing field `file`");
    }
}
