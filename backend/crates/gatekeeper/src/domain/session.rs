//! Session Vocabulary
//!
//! The gatekeeper never owns a session. It only knows whether the auth
//! provider recognised one, the opaque user id behind it, and which cookie
//! writes the provider asked to relay.

use std::fmt;

use platform::cookie::SetCookie;
use platform::password::ClearTextPassword;

/// Opaque user identifier issued by the auth provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answer to "who is this, and do any cookies need to change?"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLookup {
    pub user: Option<UserId>,
    pub cookie_mutations: Vec<SetCookie>,
}

impl SessionLookup {
    /// No session and nothing to relay
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: UserId) -> Self {
        Self {
            user: Some(user),
            cookie_mutations: Vec::new(),
        }
    }

    pub fn with_mutations(mut self, mutations: Vec<SetCookie>) -> Self {
        self.cookie_mutations = mutations;
        self
    }
}

/// Session established for the current request
///
/// Inserted into request extensions by the gatekeeper middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentSession {
    user: Option<UserId>,
}

impl CurrentSession {
    pub fn new(user: Option<UserId>) -> Self {
        Self { user }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Email and password submitted by a client
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: ClearTextPassword,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: ClearTextPassword) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

/// Trim and lowercase an email address, rejecting obviously malformed input
///
/// Deliverability is the auth provider's concern; this only keeps garbage
/// away from it.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.len() > 254 || email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return None;
    }
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }
    let labels_ok = domain.split('.').all(|label| !label.is_empty());
    if !domain.contains('.') || !labels_ok {
        return None;
    }
    Some(email)
}

/// Session created by a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub user: UserId,
    pub cookie_mutations: Vec<SetCookie>,
}

/// Account created by a successful sign-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user: UserId,
    /// The provider wants the email confirmed before issuing a session
    pub confirmation_required: bool,
    /// Session cookies, empty when confirmation is required
    pub cookie_mutations: Vec<SetCookie>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::cookie::CookieConfig;

    #[test]
    fn test_anonymous_lookup() {
        let lookup = SessionLookup::anonymous();
        assert!(lookup.user.is_none());
        assert!(lookup.cookie_mutations.is_empty());
    }

    #[test]
    fn test_lookup_with_mutations() {
        let mutation = SetCookie::new(CookieConfig::default(), "v");
        let lookup =
            SessionLookup::authenticated(UserId::new("u-1")).with_mutations(vec![mutation.clone()]);
        assert_eq!(lookup.user, Some(UserId::new("u-1")));
        assert_eq!(lookup.cookie_mutations, vec![mutation]);
    }

    #[test]
    fn test_current_session() {
        assert!(!CurrentSession::default().is_authenticated());
        let session = CurrentSession::new(Some(UserId::new("u-1")));
        assert!(session.is_authenticated());
        assert_eq!(session.user().map(UserId::as_str), Some("u-1"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Alice@Example.COM "),
            Some("alice@example.com".to_string())
        );
        for bad in ["", "alice", "@example.com", "alice@", "alice@example", "a@b@c.com", "a b@c.com", "a@.com"] {
            assert_eq!(normalize_email(bad), None, "{bad}");
        }
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("a@example.com", ClearTextPassword::unchecked("hunter22".into()));
        let debug = format!("{:?}", creds);
        assert!(debug.contains("a@example.com"));
        assert!(!debug.contains("hunter22"));
    }
}
