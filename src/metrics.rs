//! # Request metrics
//!
//! Two metrics describe the gallery route:
//!
//! * `image_gallery_in_flight_requests` - gauge of requests currently being
//!   handled.
//! * `image_gallery_requests_total` - counter of completed requests, labelled
//!   with the response `code` and the request `method`.
//!
//! Metrics are registered into an explicitly constructed
//! [`prometheus::Registry`] owned by [`Telemetry`]; nothing is registered in
//! the process-wide default registry.

use crate::Error;
use http::{Method, StatusCode};
use prometheus::{core::Collector, Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::collections::BTreeMap;

/// Name of the in-flight requests gauge.
pub const IN_FLIGHT_REQUESTS: &str = "image_gallery_in_flight_requests";

/// Name of the completed requests counter.
pub const REQUESTS_TOTAL: &str = "image_gallery_requests_total";

const CODE_LABEL: &str = "code";
const METHOD_LABEL: &str = "method";

/// In-flight gauge and outcome counter for one instrumented route.
///
/// Cloning is cheap and every clone updates the same underlying atomics.
#[derive(Clone)]
pub struct RequestMetrics {
    in_flight: IntGauge,
    requests: IntCounterVec,
}

impl RequestMetrics {
    /// Create fresh, unregistered metrics.
    pub fn new() -> Result<Self, Error> {
        let in_flight = IntGauge::new(IN_FLIGHT_REQUESTS, "Image Gallery - in-flight requests")?;
        let requests = IntCounterVec::new(
            Opts::new(REQUESTS_TOTAL, "Image Gallery - total requests"),
            &[CODE_LABEL, METHOD_LABEL],
        )?;

        Ok(Self {
            in_flight,
            requests,
        })
    }

    /// Register both metrics into `registry`.
    ///
    /// # Errors
    ///
    /// Fails if the registry already holds a metric with the same name.
    pub fn register(&self, registry: &Registry) -> Result<(), Error> {
        registry.register(Box::new(self.in_flight.clone()))?;
        registry.register(Box::new(self.requests.clone()))?;
        Ok(())
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> i64 {
        self.in_flight.get()
    }

    /// Completed requests keyed by (status code, method).
    ///
    /// Only keys that have been recorded at least once are returned.
    pub fn outcomes(&self) -> BTreeMap<(u16, String), u64> {
        let mut outcomes = BTreeMap::new();

        for family in self.requests.collect() {
            for metric in family.get_metric() {
                let mut code = None;
                let mut method = None;
                for pair in metric.get_label() {
                    match pair.get_name() {
                        CODE_LABEL => code = pair.get_value().parse::<u16>().ok(),
                        METHOD_LABEL => method = Some(pair.get_value().to_string()),
                        _ => {}
                    }
                }

                if let (Some(code), Some(method)) = (code, method) {
                    outcomes.insert((code, method), metric.get_counter().get_value() as u64);
                }
            }
        }

        outcomes
    }

    /// Total number of completed requests across all outcomes.
    pub fn completed(&self) -> u64 {
        self.outcomes().values().sum()
    }

    pub(crate) fn enter(&self) {
        self.in_flight.inc();
    }

    pub(crate) fn exit(&self) {
        self.in_flight.dec();
    }

    pub(crate) fn record(&self, status: StatusCode, method: &str) {
        self.requests
            .with_label_values(&[status.as_str(), method])
            .inc();
    }
}

/// Bounded label value for a request method.
///
/// Extension methods collapse into `OTHER` so arbitrary client input cannot
/// grow the label set.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::HEAD => "HEAD",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::CONNECT => "CONNECT",
        Method::OPTIONS => "OPTIONS",
        Method::TRACE => "TRACE",
        Method::PATCH => "PATCH",
        _ => "OTHER",
    }
}

/// A registry together with the request metrics registered into it.
#[derive(Clone)]
pub struct Telemetry {
    registry: Registry,
    requests: RequestMetrics,
}

impl Telemetry {
    /// Create a private registry holding fresh request metrics.
    pub fn new() -> Result<Self, Error> {
        Self::with_registry(Registry::new())
    }

    /// Register fresh request metrics into an existing registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`] if the names are already taken in
    /// `registry`. Callers treat this as fatal at startup.
    pub fn with_registry(registry: Registry) -> Result<Self, Error> {
        let requests = RequestMetrics::new()?;
        requests.register(&registry)?;
        Ok(Self { registry, requests })
    }

    pub fn requests(&self) -> &RequestMetrics {
        &self.requests
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Content type of [`Telemetry::encode`] output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Gather the registry and encode it in the Prometheus text format.
    pub fn encode(&self) -> Result<String, Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| Error::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}
