use aws_lambda_events::event::sqs::SqsMessage;
use tracing::{debug, info};

use crate::config::{Config, TrackingMode};
use crate::events::TrackingEvent;
use crate::matomo::{self, TrackingError};
use crate::translate;

/// Translates one queue record and ships it to the collector.
pub async fn sqs_record(
    client: &reqwest::Client,
    config: &Config,
    record: &SqsMessage,
) -> Result<(), TrackingError> {
    let event = TrackingEvent::from_body(record.body.as_deref().unwrap_or_default());

    info!(
        sqs_message_id = record.message_id.as_deref().unwrap_or_default(),
        event_source = record.event_source.as_deref().unwrap_or_default(),
        request_type = %event.request_type,
        request_id = %event.request_id,
        intent = %event.intent_name,
        user_id = %event.user_id,
        "tracking event received"
    );

    if config.mode == TrackingMode::LogOnly {
        debug!("log-only mode, not contacting collector");
        return Ok(());
    }

    track(client, config, &event).await
}

/// Sends the tracking request for an already decoded event.
pub async fn track(
    client: &reqwest::Client,
    config: &Config,
    event: &TrackingEvent,
) -> Result<(), TrackingError> {
    let params = translate::tracking_params(event, config);
    let url = matomo::tracking_url(&config.endpoint, &params)?;
    matomo::send(client, url, &event.client).await
}
