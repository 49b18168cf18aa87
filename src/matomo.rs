use http::header::{HeaderName, USER_AGENT};
use http::StatusCode;
use reqwest::Url;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::translate::TrackingParams;

pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

#[derive(thiserror::Error, Debug)]
pub enum TrackingError {
    #[error("invalid collector endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to send tracking request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected status code {0}")]
    UnexpectedStatus(u16),
}

/// Builds the shared client used for every tracking request.
pub fn set_up_http_client(config: &Config) -> Result<reqwest::Client, TrackingError> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(Duration::from_secs(5))
        .build()?;
    Ok(client)
}

/// Appends the tracking parameters to the collector endpoint.
pub fn tracking_url(endpoint: &str, params: &TrackingParams) -> Result<Url, TrackingError> {
    Url::parse_with_params(endpoint, params).map_err(|e| TrackingError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

/// Copy of `url` fit for logs, with `token_auth` masked.
pub fn redacted(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "token_auth" {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    let mut out = url.clone();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

/// Issues the tracking GET and requires a 204 from the collector.
pub async fn send(
    client: &reqwest::Client,
    url: Url,
    user_agent: &str,
) -> Result<(), TrackingError> {
    info!(url = %redacted(&url), "sending tracking request");

    let start = Instant::now();
    let response = client
        .get(url)
        .header(USER_AGENT, user_agent)
        .header(X_FORWARDED_PROTO, "https")
        .send()
        .await?;

    let status = response.status();
    debug!(
        status = %status,
        elapsed_ms = start.elapsed().as_millis(),
        "tracking HTTP request completed"
    );

    if status != StatusCode::NO_CONTENT {
        return Err(TrackingError::UnexpectedStatus(status.as_u16()));
    }

    Ok(())
}
