//! Runtime Configuration Helpers
//!
//! Deployment environment detection and parsing of list-valued settings.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Deployment environment
///
/// Production turns on `Secure` cookies and HSTS, and hides debug-only
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Default for Environment {
    /// Debug builds default to development, release builds to production
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Environment::Development
        } else {
            Environment::Production
        }
    }
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown environment name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown environment: {0} (expected \"development\" or \"production\")")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "test" => Ok(Environment::Development),
            other => Err(UnknownEnvironment(other.to_string())),
        }
    }
}

/// Parse a comma separated list of paths
///
/// Blank entries are dropped and trailing slashes removed (except for `/`).
pub fn parse_path_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(normalize_path)
        .collect()
}

/// Remove trailing slashes from a path, keeping the root `/`
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!("production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!(" PROD ".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("development".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_is_production() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
    }

    #[test]
    fn test_parse_path_list() {
        let paths = parse_path_list(" /account/ , ,/api/admin,/api/internal//");
        assert_eq!(paths, vec!["/account", "/api/admin", "/api/internal"]);
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("///"), "/");
    }
}
