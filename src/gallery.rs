//! The gallery page handler.
//!
//! Each request fetches an [`ImageRecord`] from the image API, renders it and
//! reports the caller to the access-log API without waiting for the result.

use crate::{template::PageTemplate, Error};
use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Image returned by the image API.
///
/// Missing fields decode as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImageRecord {
    pub url: String,
    pub caption: String,
    pub copyright: String,
}

/// Record posted to the access-log API for every rendered page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessLogEntry {
    #[serde(rename = "clientIp")]
    pub client_address: String,
}

/// Build the outbound client shared by all requests.
///
/// Keeps at most one idle connection per upstream, closed after a second.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(1)
        .pool_idle_timeout(Duration::from_secs(1))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// State of the gallery handler.
pub struct Gallery {
    client: reqwest::Client,
    image_api: String,
    access_api: String,
    template: PageTemplate,
}

impl Gallery {
    pub fn new(
        client: reqwest::Client,
        image_api: impl Into<String>,
        access_api: impl Into<String>,
        template: PageTemplate,
    ) -> Self {
        Self {
            client,
            image_api: image_api.into(),
            access_api: access_api.into(),
            template,
        }
    }

    /// Fetch and decode the current image.
    pub async fn fetch_image(&self) -> Result<ImageRecord, Error> {
        let image = self
            .client
            .get(&self.image_api)
            .send()
            .await?
            .error_for_status()?
            .json::<ImageRecord>()
            .await?;
        Ok(image)
    }

    pub fn render(&self, image: &ImageRecord) -> String {
        self.template.render(image)
    }

    /// Post `entry` to the access-log API in the background.
    ///
    /// Delivery is not awaited; failures are only logged.
    pub fn dispatch_access_log(&self, entry: AccessLogEntry) {
        let request = self.client.post(&self.access_api).json(&entry);

        tokio::spawn(async move {
            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(response) => {
                    debug!(status = %response.status(), client = %entry.client_address, "access log delivered")
                }
                Err(e) => {
                    warn!(error = %e, client = %entry.client_address, "access log delivery failed")
                }
            }
        });
    }
}

/// Gallery page, served for any path and method.
pub async fn index(
    State(gallery): State<Arc<Gallery>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Html<String>, Error> {
    let image = gallery.fetch_image().await?;
    let page = gallery.render(&image);

    gallery.dispatch_access_log(AccessLogEntry {
        client_address: addr.to_string(),
    });

    Ok(Html(page))
}

/// Response returned in place of the page for injected failures.
pub fn failed_response() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
}
