//! Folds the settled outcomes of one fan-out into an [`AggregateReport`].
//!
//! All latency aggregates are computed over whole milliseconds. The sum is
//! exact in `u64` and the average is a single `f64` division of that sum, so
//! `min <= average <= max` holds exactly and the numbers do not depend on the
//! order in which calls completed.

use crate::outcome::{CallOutcome, SuccessDetail};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    /// From the arrival of the aggregation request to the barrier
    pub total_time_ms: u64,
    /// Number of calls actually dispatched, after clamping
    pub requested_concurrency: u32,
    pub successful_calls: u32,
    pub failed_calls: u32,
    pub average_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub results: Vec<SuccessDetail>,
    pub errors: Vec<String>,
}

#[derive(Default)]
struct LatencyStats {
    count: u64,
    sum_ms: u64,
    min_ms: Option<u64>,
    max_ms: u64,
}

impl LatencyStats {
    fn record(&mut self, latency_ms: u64) {
        self.count += 1;
        self.sum_ms += latency_ms;
        self.min_ms = Some(self.min_ms.map_or(latency_ms, |min| min.min(latency_ms)));
        self.max_ms = self.max_ms.max(latency_ms);
    }

    fn average_ms(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum_ms as f64 / self.count as f64
    }
}

pub fn reduce(
    outcomes: Vec<CallOutcome>,
    requested_concurrency: u32,
    total_time: Duration,
) -> AggregateReport {
    let mut results = Vec::new();
    let mut errors = Vec::new();
    let mut latency = LatencyStats::default();

    for outcome in outcomes {
        match outcome {
            CallOutcome::Success(detail) => {
                latency.record(detail.latency_ms());
                results.push(detail);
            }
            CallOutcome::Failure { reason } => errors.push(reason),
        }
    }

    AggregateReport {
        total_time_ms: total_time.as_millis() as u64,
        requested_concurrency,
        successful_calls: results.len() as u32,
        failed_calls: errors.len() as u32,
        average_latency_ms: latency.average_ms(),
        min_latency_ms: latency.min_ms.unwrap_or(0),
        max_latency_ms: latency.max_ms,
        results,
        errors,
    }
}
