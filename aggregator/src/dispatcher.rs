//! Fan-out of concurrent upstream calls.
//!
//! [`FanOutDispatcher::dispatch`] spawns one task per call into a `JoinSet`
//! and waits for every task to settle before returning. There is no overall
//! deadline: a slow call holds the barrier until its own per-call timeout
//! turns it into a failure. A task that panics is recorded as a failure for
//! its slot; its siblings are unaffected.

use crate::errors::ValidationError;
use crate::extract::extract_outcome;
use crate::metrics_defs::{FANOUT_SIZE, UPSTREAM_CALLS, UPSTREAM_CALL_DURATION};
use crate::outcome::CallOutcome;
use crate::upstream::Upstream;
use shared::{counter, histogram};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

pub const MIN_CONCURRENCY: u32 = 1;

/// Upper bound on calls per aggregation request. Larger requests are reduced to it.
pub const MAX_CONCURRENCY: u32 = 100;

pub const DEFAULT_CONCURRENCY: u32 = 10;

/// Rejects counts below [`MIN_CONCURRENCY`] and silently caps counts above
/// [`MAX_CONCURRENCY`].
pub fn clamp_concurrency(requested: i64) -> Result<u32, ValidationError> {
    if requested < i64::from(MIN_CONCURRENCY) {
        return Err(ValidationError::TooFewCalls {
            requested,
            min: MIN_CONCURRENCY,
        });
    }

    Ok(requested.min(i64::from(MAX_CONCURRENCY)) as u32)
}

#[derive(Clone)]
pub struct FanOutDispatcher {
    upstream: Arc<dyn Upstream>,
}

impl FanOutDispatcher {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Issues `calls` concurrent reads and returns one outcome per call, in
    /// dispatch order, once all of them have settled.
    ///
    /// `calls` is expected to be clamped already.
    pub async fn dispatch(&self, calls: u32) -> Vec<CallOutcome> {
        let calls = calls as usize;
        let mut join_set = JoinSet::new();
        let mut task_slots = HashMap::with_capacity(calls);

        histogram!(FANOUT_SIZE).record(calls as f64);
        tracing::debug!(calls, "Dispatching upstream calls");

        for slot in 0..calls {
            let upstream = self.upstream.clone();

            let abort_handle = join_set.spawn(async move {
                let started_at = Instant::now();
                let response = upstream.fetch().await;
                let outcome = extract_outcome(response, started_at);
                record_call(&outcome, started_at);
                (slot, outcome)
            });

            task_slots.insert(abort_handle.id(), slot);
        }

        let mut outcomes: Vec<Option<CallOutcome>> = vec![None; calls];

        while let Some(join_result) = join_set.join_next_with_id().await {
            match join_result {
                Ok((_task_id, (slot, outcome))) => {
                    if let CallOutcome::Failure { reason } = &outcome {
                        tracing::warn!(slot, reason = %reason, "Upstream call failed");
                    }
                    outcomes[slot] = Some(outcome);
                }
                Err(e) => {
                    tracing::error!("Upstream call task failed: {e}");
                    if let Some(&slot) = task_slots.get(&e.id()) {
                        counter!(UPSTREAM_CALLS, "outcome" => "failure").increment(1);
                        outcomes[slot] = Some(CallOutcome::failure(format!("Call failed: {e}")));
                    }
                }
            }
        }

        // Every slot is filled unless the JoinSet lost a task; the aggregator checks the count.
        outcomes.into_iter().flatten().collect()
    }
}

fn record_call(outcome: &CallOutcome, started_at: Instant) {
    let label = match outcome {
        CallOutcome::Success(_) => "success",
        CallOutcome::Failure { .. } => "failure",
    };
    counter!(UPSTREAM_CALLS, "outcome" => label).increment(1);
    histogram!(UPSTREAM_CALL_DURATION, "outcome" => label)
        .record(started_at.elapsed().as_secs_f64());
}
