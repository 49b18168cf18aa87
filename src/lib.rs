use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{Error, LambdaEvent};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

pub mod config;
pub mod events;
pub mod identity;
pub mod matomo;
pub mod process;
pub mod region;
pub mod translate;

pub fn set_up_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();
}

// lambda handler
pub async fn function_handler(
    client: &reqwest::Client,
    config: &Config,
    evt: LambdaEvent<SqsEvent>,
) -> Result<(), Error> {
    info!(
        records = evt.payload.records.len(),
        mode = %config.mode,
        "Handling lambda invocation"
    );
    debug!("Handling event payload: {:?}", evt.payload);

    // records are shipped one at a time; the first failure aborts the batch so
    // the queue redelivers it
    for (idx, record) in evt.payload.records.iter().enumerate() {
        process::sqs_record(client, config, record)
            .await
            .map_err(|e| {
                error!(
                    record_index = idx,
                    sqs_message_id = record.message_id.as_deref().unwrap_or_default(),
                    "failed to track event: {}",
                    e
                );
                e
            })?;
    }

    Ok(())
}
