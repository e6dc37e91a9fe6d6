use crate::dispatcher::{FanOutDispatcher, clamp_concurrency};
use crate::errors::{AggregatorError, Result};
use crate::outcome::{CallOutcome, SuccessDetail};
use crate::reducer::{AggregateReport, reduce};
use crate::upstream::Upstream;
use std::sync::Arc;
use std::time::Instant;

/// Validates, fans out, waits for every call and reduces the outcomes.
///
/// Holds no per-request state, so one instance serves any number of
/// simultaneous aggregation requests independently.
pub struct Aggregator {
    dispatcher: FanOutDispatcher,
}

impl Aggregator {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            dispatcher: FanOutDispatcher::new(upstream),
        }
    }

    pub async fn aggregate(&self, requested: i64) -> Result<AggregateReport> {
        let arrived_at = Instant::now();
        let calls = clamp_concurrency(requested)?;
        if i64::from(calls) != requested {
            tracing::debug!(requested, calls, "Clamped concurrency");
        }

        let outcomes = self.settle(calls).await?;
        let total_time = arrived_at.elapsed();

        if outcomes.len() != calls as usize {
            tracing::error!(
                expected = calls,
                settled = outcomes.len(),
                "Outcome count does not match dispatched calls"
            );
            return Err(AggregatorError::InternalError(format!(
                "expected {calls} outcomes, got {}",
                outcomes.len()
            )));
        }

        Ok(reduce(outcomes, calls, total_time))
    }

    /// Runs the fan-out on a task of its own and waits for it.
    ///
    /// Dropping this future (the client went away) detaches the task instead
    /// of aborting it, so every dispatched call still runs to completion.
    async fn settle(&self, calls: u32) -> Result<Vec<CallOutcome>> {
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move { dispatcher.dispatch(calls).await })
            .await
            .map_err(|e| AggregatorError::InternalError(format!("fan-out task failed: {e}")))
    }

    /// One call, no aggregation.
    pub async fn single(&self) -> Result<SuccessDetail> {
        let mut outcomes = self.settle(1).await?;

        match outcomes.pop() {
            Some(CallOutcome::Success(detail)) => Ok(detail),
            Some(CallOutcome::Failure { reason }) => Err(AggregatorError::CallFailed(reason)),
            None => Err(AggregatorError::InternalError(
                "single call produced no outcome".to_string(),
            )),
        }
    }
}
