//! # Request instrumentation for `tower`
//!
//! [`InstrumentLayer`] tracks how many requests an HTTP service is handling
//! and how they ended, without looking at request or response bodies.
//!
//! ## Usage
//!
//! ```rust
//! use image_gallery::{instrument::InstrumentLayer, metrics::Telemetry};
//! use http::{Request, Response};
//! use tower::{service_fn, ServiceBuilder};
//! # async fn my_service(_: Request<()>) -> Result<Response<String>, ()> {
//! #     Ok(Response::new(String::new()))
//! # }
//!
//! let telemetry = Telemetry::new().unwrap();
//!
//! let service = ServiceBuilder::new()
//!     .layer(InstrumentLayer::new(telemetry.requests().clone()))
//!     .service(service_fn(my_service));
//! ```

use crate::metrics::{method_label, RequestMetrics};
use http::{Request, Response, StatusCode};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

/// A layer that counts in-flight and completed requests.
#[derive(Clone)]
pub struct InstrumentLayer {
    metrics: RequestMetrics,
}

impl InstrumentLayer {
    /// Create a new `InstrumentLayer` updating the given metrics.
    pub fn new(metrics: RequestMetrics) -> Self {
        InstrumentLayer { metrics }
    }
}

impl<S> Layer<S> for InstrumentLayer {
    type Service = InstrumentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentService::new(inner, self.metrics.clone())
    }
}

/// Underlying service for the `InstrumentLayer`
#[derive(Clone)]
pub struct InstrumentService<S> {
    inner: S,
    metrics: RequestMetrics,
}

impl<S> InstrumentService<S> {
    /// Wrap `inner` so each call updates `metrics`.
    pub fn new(inner: S, metrics: RequestMetrics) -> Self {
        InstrumentService { inner, metrics }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for InstrumentService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = InstrumentFuture<ResBody, S::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // Created before the inner call so a panic inside it still releases
        // the in-flight slot.
        let guard = InFlightGuard::enter(&self.metrics, method_label(request.method()));

        let fut = self.inner.call(request);
        Box::pin(async move {
            // Bind the whole guard so the future owns it, not just a copy
            // of its status field.
            let mut guard = guard;
            let result = fut.await;
            if let Ok(response) = &result {
                guard.observe(response.status());
            }
            result
        })
    }
}

type InstrumentFuture<B, E> = Pin<Box<dyn Future<Output = Result<Response<B>, E>> + Send>>;

/// Holds one in-flight slot for the lifetime of a request.
///
/// Dropping the guard releases the slot and records the outcome, whether the
/// request completed, failed, panicked or was cancelled.
struct InFlightGuard {
    metrics: RequestMetrics,
    method: &'static str,
    status: Option<StatusCode>,
}

impl InFlightGuard {
    fn enter(metrics: &RequestMetrics, method: &'static str) -> Self {
        metrics.enter();
        InFlightGuard {
            metrics: metrics.clone(),
            method,
            status: None,
        }
    }

    fn observe(&mut self, status: StatusCode) {
        self.status = Some(status);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.metrics.exit();
        // No status observed falls back to the default success status.
        let status = self.status.unwrap_or(StatusCode::OK);
        self.metrics.record(status, self.method);
    }
}
