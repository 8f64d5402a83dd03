//! Utilities for testing this crate

use http::{Request, Response, StatusCode};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::Semaphore;
use tower::Service;

/// What the [`DummyService`] does with a request.
#[derive(Clone)]
pub enum Behavior {
    /// Answer "ok" with the given status.
    Respond(StatusCode),
    /// Answer "ok" without touching the status.
    Implicit,
    /// Answer 200 after sleeping.
    Sleep(Duration),
    /// Wait for a permit from the semaphore, then answer 200.
    Hold(Arc<Semaphore>),
    /// Return an error instead of a response.
    Fail,
    /// Panic while handling the request.
    Panic,
}

#[derive(Clone)]
pub struct DummyService {
    behavior: Behavior,
}

impl DummyService {
    pub fn new(behavior: Behavior) -> Self {
        DummyService { behavior }
    }
}

impl<B> Service<Request<B>> for DummyService {
    type Response = Response<String>;
    type Error = String;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _request: Request<B>) -> Self::Future {
        let behavior = self.behavior.clone();
        Box::pin(async move {
            let mut response = Response::new(String::from("ok"));
            match behavior {
                Behavior::Respond(status) => *response.status_mut() = status,
                Behavior::Implicit => {}
                Behavior::Sleep(duration) => tokio::time::sleep(duration).await,
                Behavior::Hold(gate) => {
                    let _permit = gate.acquire().await.map_err(|e| e.to_string())?;
                }
                Behavior::Fail => return Err(String::from("error")),
                Behavior::Panic => panic!("dummy service panicked"),
            }
            Ok(response)
        })
    }
}
