//! Image gallery service with Prometheus request instrumentation
//!
//! The service renders a single page: it fetches an image description from
//! an upstream API, renders it into HTML and reports the visitor to an
//! access-log API. A share of requests fails on purpose so the metrics have
//! something to show.
//!
//! ## Layers
//!
//! * [`InstrumentLayer`](instrument/struct.InstrumentLayer.html) - count
//!   in-flight and completed requests by status code and method.
//! * [`FaultLayer`](fault/struct.FaultLayer.html) - randomly answer requests
//!   with a failure response.
//!
//! ## Example
//!
//! ```rust
//! use image_gallery::{fault::FaultLayer, instrument::InstrumentLayer, metrics::Telemetry};
//! use http::{Request, Response, StatusCode};
//! use tower::{service_fn, ServiceBuilder};
//! # async fn my_service(_: Request<()>) -> Result<Response<String>, ()> {
//! #     Ok(Response::new(String::new()))
//! # }
//! # fn failed() -> Response<String> {
//! #     let mut response = Response::new(String::from("Failed"));
//! #     *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
//! #     response
//! # }
//!
//! let telemetry = Telemetry::new().unwrap();
//!
//! // Count every request, including the 10% answered by `failed`.
//! let service = ServiceBuilder::new()
//!     .layer(InstrumentLayer::new(telemetry.requests().clone()))
//!     .layer(FaultLayer::with_probability(0.1, failed).unwrap())
//!     .service(service_fn(my_service));
//! ```

pub mod config;
pub mod fault;
pub mod gallery;
pub mod instrument;
pub mod metrics;
pub mod routes;
pub mod template;

mod error;
pub use error::Error;

#[cfg(test)]
mod test_utils;
