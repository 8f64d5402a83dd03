//! Router composition.

use crate::{
    fault::FaultLayer,
    gallery::{self, Gallery},
    instrument::InstrumentLayer,
    metrics::Telemetry,
    Error,
};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{any, get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// The gallery page answers every path and method except `/metrics`, and
/// always goes through failure injection. With `telemetry`, the page is also
/// instrumented and `/metrics` exposes the registry; without it, neither
/// exists.
pub fn build_routes(
    gallery: Arc<Gallery>,
    failure_probability: f64,
    telemetry: Option<Telemetry>,
) -> Result<Router, Error> {
    let faults = FaultLayer::with_probability(
        failure_probability,
        gallery::failed_response as fn() -> Response,
    )?;

    let page: MethodRouter = any(gallery::index).with_state(gallery);

    let app = match telemetry {
        Some(telemetry) => {
            // Failures are injected inside the instrumentation so they are counted.
            let page = ServiceBuilder::new()
                .layer(InstrumentLayer::new(telemetry.requests().clone()))
                .layer(faults)
                .service(page);

            Router::new()
                .route("/metrics", get(render_metrics))
                .with_state(telemetry)
                .fallback_service(page)
        }
        None => Router::new().fallback_service(ServiceBuilder::new().layer(faults).service(page)),
    };

    Ok(app.layer(TraceLayer::new_for_http()))
}

/// `GET /metrics`
async fn render_metrics(State(telemetry): State<Telemetry>) -> Result<impl IntoResponse, Error> {
    let body = telemetry.encode()?;
    Ok(([(header::CONTENT_TYPE, telemetry.content_type())], body))
}
