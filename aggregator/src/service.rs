//! HTTP front of the gateway.
//!
//! - `GET /concurrent-stats?calls=<n>` fans out `n` calls (default 10) and
//!   returns the aggregate report. A report is returned with 200 even when
//!   every call failed.
//! - `GET /stats` performs a single call and returns its extracted counts.

use crate::aggregate::Aggregator;
use crate::dispatcher::DEFAULT_CONCURRENCY;
use crate::errors::AggregatorError;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use shared::http::{make_boxed_error_response, make_json_error_response, make_json_response};
use shared::{gauge, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

pub type GatewayResponse = Response<BoxBody<Bytes, AggregatorError>>;

const CONCURRENT_STATS_PATH: &str = "/concurrent-stats";
const STATS_PATH: &str = "/stats";

/// Response body of `GET /stats`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    process_time_ms: u64,
    entity_count: u64,
    available_count: u64,
    #[serde(rename = "sizeMB")]
    size_mb: f64,
}

/// Counts a request as in flight until dropped, including when hyper drops
/// the handler future because the client disconnected.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

#[derive(Clone)]
pub struct GatewayService {
    aggregator: Arc<Aggregator>,
}

impl GatewayService {
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self { aggregator }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> GatewayResponse {
        let started_at = Instant::now();
        let _inflight = InflightGuard::new();

        // The request body is never read
        let (parts, _) = req.into_parts();

        let (handler, response) = match (&parts.method, parts.uri.path()) {
            (&Method::GET, CONCURRENT_STATS_PATH) => (
                "concurrent_stats",
                self.concurrent_stats(parts.uri.query()).await,
            ),
            (&Method::GET, STATS_PATH) => ("stats", self.stats(started_at).await),
            (_, CONCURRENT_STATS_PATH | STATS_PATH) => (
                "method_not_allowed",
                Ok(make_boxed_error_response(StatusCode::METHOD_NOT_ALLOWED)),
            ),
            (method, path) => {
                tracing::warn!(method = %method, path = %path, "No route matched");
                (
                    "not_found",
                    Ok(make_boxed_error_response(StatusCode::NOT_FOUND)),
                )
            }
        };

        let response = response.unwrap_or_else(|e| error_response(&e));

        histogram!(
            REQUEST_DURATION,
            "handler" => handler,
            "status" => response.status().as_str().to_owned()
        )
        .record(started_at.elapsed().as_secs_f64());

        response
    }

    async fn concurrent_stats(&self, query: Option<&str>) -> Result<GatewayResponse, AggregatorError> {
        let requested = parse_calls(query);
        let report = self.aggregator.aggregate(requested).await?;

        tracing::info!(
            calls = report.requested_concurrency,
            successful = report.successful_calls,
            failed = report.failed_calls,
            total_time_ms = report.total_time_ms,
            "Processed concurrent stats"
        );

        Ok(make_json_response(StatusCode::OK, &report)?)
    }

    async fn stats(&self, started_at: Instant) -> Result<GatewayResponse, AggregatorError> {
        let detail = self.aggregator.single().await?;

        let stats = StatsResponse {
            process_time_ms: started_at.elapsed().as_millis() as u64,
            entity_count: detail.entity_count,
            available_count: detail.available_count,
            size_mb: detail.size_mb,
        };

        Ok(make_json_response(StatusCode::OK, &stats)?)
    }
}

impl Service<Request<Incoming>> for GatewayService {
    type Response = GatewayResponse;
    type Error = AggregatorError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Reads the `calls` query parameter. An absent, empty or non-integer value
/// means the default. Range checks are left to the aggregator.
fn parse_calls(query: Option<&str>) -> i64 {
    query
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "calls")
                .and_then(|(_, value)| value.trim().parse::<i64>().ok())
        })
        .unwrap_or(i64::from(DEFAULT_CONCURRENCY))
}

fn error_response(error: &AggregatorError) -> GatewayResponse {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(error = %error, "Request failed");
    } else {
        tracing::debug!(error = %error, "Rejected request");
    }
    make_json_error_response(status, &error.to_string())
}
