//! Prometheus metrics handler

use crate::infrastructure::metrics::{
    ACTIVE_SESSIONS, SESSIONS_FAILED, SESSIONS_TOTAL, TRANSFERS_TOTAL,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_gauge!(ACTIVE_SESSIONS, "Number of call sessions currently open");
    describe_counter!(
        SESSIONS_TOTAL,
        "Total number of call sessions routed, by provenance"
    );
    describe_counter!(
        SESSIONS_FAILED,
        "Total number of call sessions closed because the bridge could not be sent"
    );
    describe_counter!(TRANSFERS_TOTAL, "Total number of REFER transfers relayed");

    Ok(handle)
}

/// HTTP metrics handler
pub async fn metrics_handler(State(prometheus_handle): State<PrometheusHandle>) -> Response {
    let metrics = prometheus_handle.render();
    (StatusCode::OK, metrics).into_response()
}
