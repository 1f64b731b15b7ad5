//! Request context threaded through every store call
//!
//! Carries cooperative cancellation and an optional deadline. The executor
//! races each store future against both, so an abandoned request stops
//! waiting on the database instead of running to completion.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::QueryErrorKind;

/// Cancellation and deadline carrier for a single request
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Context driven by an existing cancellation token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Tighten the deadline to `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Tighten the deadline; an earlier existing deadline wins
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        });
        self
    }

    /// Derive a context that is cancelled whenever this one is
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run a store future under this context
    pub async fn run<F, T>(&self, fut: F) -> Result<T, QueryErrorKind>
    where
        F: Future<Output = Result<T, QueryErrorKind>>,
    {
        if self.token.is_cancelled() {
            return Err(QueryErrorKind::Cancelled);
        }

        let guarded = async {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(QueryErrorKind::Cancelled),
                result = fut => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or_else(|_| Err(QueryErrorKind::DeadlineExceeded)),
            None => guarded.await,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_background_runs_to_completion() {
        let ctx = RequestContext::background();
        let result = ctx.run(async { Ok::<_, QueryErrorKind>(42) }).await;
        assert_matches!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_cancelled_context_short_circuits() {
        let ctx = RequestContext::background();
        ctx.cancel();
        let result = ctx.run(async { Ok::<_, QueryErrorKind>(1) }).await;
        assert_matches!(result, Err(QueryErrorKind::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let ctx = RequestContext::background();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, QueryErrorKind>(())
            })
            .await;
        assert_matches!(result, Err(QueryErrorKind::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, QueryErrorKind>(())
            })
            .await;
        assert_matches!(result, Err(QueryErrorKind::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_child_follows_parent_cancellation() {
        let parent = RequestContext::background();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());

        let sibling = RequestContext::background();
        let grandchild = sibling.child();
        grandchild.cancel();
        assert!(!sibling.is_cancelled());
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = RequestContext::background()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }
}
