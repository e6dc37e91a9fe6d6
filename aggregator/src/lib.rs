pub mod aggregate;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod extract;
pub mod metrics_defs;
pub mod outcome;
pub mod reducer;
pub mod service;
pub mod upstream;

#[cfg(test)]
mod testutils;

use aggregate::Aggregator;
use errors::AggregatorError;
use service::GatewayService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use upstream::HttpUpstream;

pub async fn run(config: config::Config) -> Result<(), AggregatorError> {
    let upstream = HttpUpstream::new(&config.upstream)?;
    tracing::info!(upstream = %upstream.url(), "Upstream data service configured");

    let aggregator = Arc::new(Aggregator::new(Arc::new(upstream)));
    let gateway_service = GatewayService::new(aggregator);

    tracing::info!(
        "Endpoints: GET /concurrent-stats?calls=<num> (default {}, max {}), GET /stats",
        dispatcher::DEFAULT_CONCURRENCY,
        dispatcher::MAX_CONCURRENCY
    );

    let gateway_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        gateway_service,
    );
    // Everything needed to serve requests exists once we get here
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, AggregatorError>::new(|| true),
    );

    tokio::try_join!(gateway_task, admin_task)?;
    Ok(())
}
