//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// CSRF
// ============================================================================

/// CSRF token response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

// ============================================================================
// Sign In
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "_csrf", default)]
    pub csrf: Option<String>,
    /// Local path to continue to after sign-in
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// Sign in response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub user_id: String,
    pub redirect_to: String,
}

// ============================================================================
// Sign Up
// ============================================================================

/// Sign up request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "_csrf", default)]
    pub csrf: Option<String>,
}

/// Sign up response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    pub user_id: String,
    /// True if the account must be confirmed by email before sign-in
    pub confirmation_required: bool,
}

// ============================================================================
// Sign Out
// ============================================================================

/// Sign out request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignOutRequest {
    #[serde(rename = "_csrf", default)]
    pub csrf: Option<String>,
}

// ============================================================================
// Session Status
// ============================================================================

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub user_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_request_field_names() {
        let req: SignInRequest = serde_json::from_str(
            r#"{"email":"a@example.com","password":"pw","_csrf":"tok","redirectTo":"/account"}"#,
        )
        .unwrap();
        assert_eq!(req.csrf.as_deref(), Some("tok"));
        assert_eq!(req.redirect_to.as_deref(), Some("/account"));
    }

    #[test]
    fn test_csrf_field_optional() {
        let req: SignUpRequest =
            serde_json::from_str(r#"{"email":"a@example.com","password":"pw"}"#).unwrap();
        assert!(req.csrf.is_none());
    }

    #[test]
    fn test_session_status_serialization() {
        let json = serde_json::to_value(SessionStatusResponse {
            authenticated: true,
            user_id: Some("u-1".into()),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"authenticated": true, "userId": "u-1"}));
    }
}
