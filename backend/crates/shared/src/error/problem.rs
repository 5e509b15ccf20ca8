//! Problem details rendering (RFC 7807)
//!
//! Every error response in the workspace shares this body shape.

use super::app_error::AppError;

/// Build the problem-details body for an error
pub fn problem_details(err: &AppError) -> serde_json::Value {
    let mut body = serde_json::json!({
        "type": format!("https://httpstatuses.io/{}", err.status_code()),
        "title": err.kind().as_str(),
        "status": err.status_code(),
        "detail": err.message(),
        "action": err.action(),
    });

    if let Some(retry_at_ms) = err.retry_at_ms() {
        body["retryAtMs"] = serde_json::json!(retry_at_ms);
    }

    body
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(problem_details(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;

    #[test]
    fn test_problem_details_includes_retry_at() {
        let err = AppError::new(ErrorKind::TooManyRequests, "Too many attempts")
            .with_retry_at_ms(1234);
        let body = problem_details(&err);
        assert_eq!(body["status"], 429);
        assert_eq!(body["title"], "Too Many Requests");
        assert_eq!(body["detail"], "Too many attempts");
        assert_eq!(body["retryAtMs"], 1234);
    }

    #[test]
    fn test_problem_details_omits_retry_at_when_absent() {
        let body = problem_details(&AppError::new(ErrorKind::Forbidden, "nope"));
        assert!(body.get("retryAtMs").is_none());
        assert!(body["action"].is_null());
    }
}
