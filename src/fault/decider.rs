//! # Decider
//!
//! The [`Decider`] trait decides if a failure should be injected for a given
//! request. The gallery uses a [`Bernoulli`] decider, which ignores the
//! request and fails a fixed share of calls. Closures can pick requests by
//! their content instead.
//!
//! ## Example
//!
//! ```rust
//! use image_gallery::fault::Decider;
//! use http::{Method, Request};
//! use rand::distributions::Bernoulli;
//!
//! let request = Request::post("/").body(()).unwrap();
//!
//! // One request in ten.
//! let decision = Bernoulli::new(0.1).unwrap().decide(&request);
//!
//! // Only writes fail.
//! let writes = |req: &Request<()>| req.method() == Method::POST;
//! assert!(writes.decide(&request));
//! ```

use rand::distributions::{Bernoulli, Distribution};

/// Trait for deciding if a failure should be injected for a given request.
pub trait Decider<R> {
    /// Decide if a failure should be injected for `req`.
    fn decide(&self, req: &R) -> bool;
}

impl<R> Decider<R> for Bernoulli {
    fn decide(&self, _: &R) -> bool {
        self.sample(&mut rand::thread_rng())
    }
}

impl<F, R> Decider<R> for F
where
    F: Fn(&R) -> bool,
{
    fn decide(&self, req: &R) -> bool {
        self(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bernoulli_extremes() {
        let never = Bernoulli::new(0.0).unwrap();
        let always = Bernoulli::new(1.0).unwrap();

        for _ in 0..1000 {
            assert!(!never.decide(&()));
            assert!(always.decide(&()));
        }
    }

    #[test]
    fn closure_sees_request() {
        let even = |n: &u32| n % 2 == 0;

        assert!(even.decide(&4));
        assert!(!even.decide(&5));
    }
}
