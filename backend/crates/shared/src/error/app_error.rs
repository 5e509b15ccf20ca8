//! Application Error - Unified error type for the application
//!
//! Defines [`AppError`] struct and [`AppResult<T>`] type alias.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// アプリケーション統一エラー型
///
/// HTTP に出る失敗はすべてこの形に変換されてから描画されます。
/// 内部の詳細は持たず、クライアントに見せてよい情報だけを保持します。
///
/// ## Examples
/// ```rust
/// use kernel::error::app_error::AppError;
/// use kernel::error::kind::ErrorKind;
///
/// let err = AppError::new(ErrorKind::TooManyRequests, "Too many attempts")
///     .with_action("Please try again later")
///     .with_retry_at_ms(1_700_000_900_000);
/// assert_eq!(err.status_code(), 429);
/// assert_eq!(err.retry_at_ms(), Some(1_700_000_900_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    kind: ErrorKind,
    /// ユーザー向けメッセージ
    message: Cow<'static, str>,
    /// ユーザーが取るべきアクション
    action: Option<Cow<'static, str>>,
    /// 再試行可能時刻（Unix ms、レート制限用）
    retry_at_ms: Option<i64>,
}

/// アプリケーション結果型エイリアス
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            retry_at_ms: None,
        }
    }

    /// 500 Internal Server Error
    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    /// ユーザー向けアクションを設定
    #[inline]
    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// 再試行可能時刻を設定
    ///
    /// クライアントがカウントダウンを表示できるよう、レスポンスに
    /// 機械可読な形で含まれます。
    #[inline]
    pub fn with_retry_at_ms(mut self, retry_at_ms: i64) -> Self {
        self.retry_at_ms = Some(retry_at_ms);
        self
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    #[inline]
    pub fn retry_at_ms(&self) -> Option<i64> {
        self.retry_at_ms
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(action) = &self.action {
            write!(f, " (Action: {})", action)?;
        }
        Ok(())
    }
}

impl Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_error() {
        let err = AppError::new(ErrorKind::Forbidden, "Invalid security token");
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), "Invalid security token");
        assert!(err.action().is_none());
        assert!(err.retry_at_ms().is_none());
    }

    #[test]
    fn test_builder_methods() {
        let err = AppError::new(ErrorKind::TooManyRequests, "Too many attempts")
            .with_action("Please try again later")
            .with_retry_at_ms(42);
        assert_eq!(err.action(), Some("Please try again later"));
        assert_eq!(err.retry_at_ms(), Some(42));
    }

    #[test]
    fn test_internal() {
        let err = AppError::internal("Internal server error");
        assert_eq!(err.status_code(), 500);
        assert!(err.kind().is_server_error());
    }

    #[test]
    fn test_display() {
        let err = AppError::new(ErrorKind::NotFound, "Not found");
        assert_eq!(err.to_string(), "[Not Found] Not found");

        let err = AppError::new(ErrorKind::Forbidden, "Invalid security token")
            .with_action("Refresh the page and try again");
        assert!(err.to_string().contains("Action: Refresh the page"));
    }
}
