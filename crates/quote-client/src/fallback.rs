//! Ordered fallback across named async steps.

use crate::error::Error;
use futures::future::BoxFuture;
use std::future::Future;
use tracing::debug;

/// One attempt in a fallback sequence. The future is not polled until the
/// sequence reaches it.
pub struct Step<'a, T> {
    name: String,
    attempt: BoxFuture<'a, Result<T, Error>>,
}

impl<'a, T> Step<'a, T> {
    /// Wraps `attempt` under `name`.
    pub fn new<F>(name: impl Into<String>, attempt: F) -> Self
    where
        F: Future<Output = Result<T, Error>> + Send + 'a,
    {
        Self {
            name: name.into(),
            attempt: Box::pin(attempt),
        }
    }

    /// Step name as it appears in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Runs `steps` in order and returns the first success unchanged.
///
/// Failures are logged at debug and discarded; when every step fails the
/// last error surfaces. An `InvalidSymbol` error stops the sequence since no
/// later source would accept the input either.
///
/// # Errors
/// The last step's error, or `NoData` for an empty sequence.
pub async fn first_success<T>(steps: Vec<Step<'_, T>>) -> Result<T, Error> {
    let mut last_error = Error::NoData("no quote sources configured".to_string());
    for step in steps {
        match step.attempt.await {
            Ok(value) => {
                debug!(step = %step.name, "quote source succeeded");
                return Ok(value);
            }
            Err(e @ Error::InvalidSymbol(_)) => return Err(e),
            Err(e) => {
                debug!(step = %step.name, error = %e, "quote source failed, trying next");
                last_error = e;
            }
        }
    }
    Err(last_error)
}
