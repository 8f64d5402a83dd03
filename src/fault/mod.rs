//! # Failure injection for `tower`
//!
//! Layer that short-circuits a random share of requests with a canned
//! response instead of calling the inner service.
//!
//! ## Usage
//!
//! ```rust
//! use image_gallery::fault::FaultLayer;
//! use tower::{service_fn, ServiceBuilder};
//! # async fn my_service(_: ()) -> Result<&'static str, ()> {
//! #     Ok("ok")
//! # }
//!
//! // Answer 10% of the calls with "failed" without reaching `my_service`.
//! let fault_layer = FaultLayer::with_probability(0.1, || "failed").unwrap();
//!
//! let service = ServiceBuilder::new()
//!     .layer(fault_layer)
//!     .service(service_fn(my_service));
//! ```

use rand::distributions::{Bernoulli, BernoulliError};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

mod decider;
pub use decider::Decider;

/// A layer that randomly answers requests with a failure response.
///
/// The [`Decider`] picks which requests fail and `func` builds the response
/// returned in their place.
#[derive(Clone, Debug)]
pub struct FaultLayer<D, F> {
    decider: D,
    func: F,
}

impl<D, F> FaultLayer<D, F> {
    /// Create a new `FaultLayer` with the given decider and response function.
    pub fn new(decider: D, func: F) -> Self {
        FaultLayer { decider, func }
    }
}

impl<F> FaultLayer<Bernoulli, F> {
    /// Create a new `FaultLayer` failing requests with the given probability.
    ///
    /// The probability must be between 0 and 1. A probability of 0.1 means
    /// that one call in ten is answered by `func`.
    pub fn with_probability(probability: f64, func: F) -> Result<Self, BernoulliError> {
        Ok(FaultLayer::new(Bernoulli::new(probability)?, func))
    }
}

impl<D, F, S> Layer<S> for FaultLayer<D, F>
where
    D: Clone,
    F: Clone,
{
    type Service = FaultService<D, F, S>;

    fn layer(&self, inner: S) -> Self::Service {
        FaultService {
            inner,
            decider: self.decider.clone(),
            func: self.func.clone(),
        }
    }
}

/// Underlying service for the `FaultLayer`
#[derive(Clone, Debug)]
pub struct FaultService<D, F, S> {
    inner: S,
    decider: D,
    func: F,
}

impl<D, F, S, R> Service<R> for FaultService<D, F, S>
where
    D: Decider<R>,
    F: Fn() -> S::Response,
    S: Service<R>,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = FaultFuture<R, S>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: R) -> Self::Future {
        if self.decider.decide(&request) {
            tracing::debug!("injecting failure response");
            let response = (self.func)();
            return Box::pin(async move { Ok(response) });
        }

        Box::pin(self.inner.call(request))
    }
}

type FaultFuture<R, S> = Pin<
    Box<dyn Future<Output = Result<<S as Service<R>>::Response, <S as Service<R>>::Error>> + Send>,
>;
