//! Bounded auth provider calls for use cases

use std::future::Future;
use std::time::Duration;

use crate::domain::provider::ProviderError;
use crate::error::{GatekeeperError, GatekeeperResult};

/// Await a provider call, mapping a timeout to `ProviderUnavailable`
pub async fn bounded<T, F>(timeout: Duration, call: F) -> GatekeeperResult<T>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(GatekeeperError::from),
        Err(_) => Err(GatekeeperError::ProviderUnavailable(format!(
            "no response within {} ms",
            timeout.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slow_call_is_unavailable() {
        let result: GatekeeperResult<()> = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(GatekeeperError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_provider_error_is_mapped() {
        let result: GatekeeperResult<()> = bounded(Duration::from_secs(1), async {
            Err(ProviderError::InvalidCredentials)
        })
        .await;
        assert!(matches!(result, Err(GatekeeperError::InvalidCredentials)));
    }
}
