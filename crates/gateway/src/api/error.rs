use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use ch_domain::error::Error;

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// A domain error on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::UnavailableProvider(_) | Error::Configuration(_) | Error::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        api_error(status, self.0.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_bad_requests() {
        for e in [
            Error::UnavailableProvider("x".into()),
            Error::Configuration("OPENAI_API_KEY not set".into()),
            Error::InvalidRequest("bad".into()),
        ] {
            assert_eq!(ApiError(e).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn vendor_failures_are_server_errors() {
        let e = Error::Provider {
            provider: "openrouter".into(),
            message: "HTTP 502 - bad gateway".into(),
        };
        assert_eq!(ApiError(e).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError(Error::NotFound("draft".into())).status(),
            StatusCode::NOT_FOUND
        );
    }
}
