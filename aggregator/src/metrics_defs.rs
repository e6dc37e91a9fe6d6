use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with status, handler.",
};

pub const REQUESTS_INFLIGHT: MetricDef = MetricDef {
    name: "requests.inflight",
    metric_type: MetricType::Gauge,
    description: "Number of requests currently being processed",
};

pub const UPSTREAM_CALLS: MetricDef = MetricDef {
    name: "upstream.calls",
    metric_type: MetricType::Counter,
    description: "Number of settled upstream calls. Tagged with outcome.",
};

pub const UPSTREAM_CALL_DURATION: MetricDef = MetricDef {
    name: "upstream.call.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of a single upstream call in seconds. Tagged with outcome.",
};

pub const FANOUT_SIZE: MetricDef = MetricDef {
    name: "fanout.size",
    metric_type: MetricType::Histogram,
    description: "Number of calls dispatched per aggregation request after clamping",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    REQUESTS_INFLIGHT,
    UPSTREAM_CALLS,
    UPSTREAM_CALL_DURATION,
    FANOUT_SIZE,
];
