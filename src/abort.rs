use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::AbortCause;

/// Per-call cancellation source.
///
/// Holds the per-attempt timeout and the caller's optional signal. Each
/// [`AbortController::run`] arms a fresh timer that lives only as long as
/// that attempt, so it is released on every exit path. The signal spans the
/// whole call, retry waits included.
#[derive(Debug)]
pub(crate) struct AbortController {
    timeout: Duration,
    signal: Option<CancellationToken>,
}

impl AbortController {
    pub(crate) fn start(timeout: Duration, signal: Option<CancellationToken>) -> Self {
        Self { timeout, signal }
    }

    /// Drives one attempt until it completes, its timer fires or the caller
    /// cancels. The first source to fire decides the [`AbortCause`].
    pub(crate) async fn run<F: Future>(&self, future: F) -> Result<F::Output, AbortCause> {
        let timer = sleep(self.timeout);

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(AbortCause::Signal),
            _ = timer => Err(AbortCause::Timeout(self.timeout)),
            output = future => Ok(output),
        }
    }

    /// Drives `future` under the caller's signal only.
    pub(crate) async fn guard<F: Future>(&self, future: F) -> Result<F::Output, AbortCause> {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(AbortCause::Signal),
            output = future => Ok(output),
        }
    }

    async fn cancelled(&self) {
        match &self.signal {
            Some(signal) => signal.cancelled().await,
            None => std::future::pending().await,
        }
    }
}
