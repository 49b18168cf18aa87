use aws_config::BehaviorVersion;
use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use matomo_tracking_shipper::config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    matomo_tracking_shipper::set_up_logging();

    info!(
        "Initializing {} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let mut config = config::Config::load_from_env()?;

    // if the token provided is an ARN, get the token from Secrets Manager
    if let Some(secret_id) = config.token_secret_arn().map(str::to_string) {
        let aws_config = aws_config::load_defaults(BehaviorVersion::v2023_11_09()).await;
        config.matomo_token =
            Some(config::get_token_from_secrets_manager(&aws_config, secret_id).await?);
    }

    info!("Loaded config: {:?}", config);

    let client = matomo_tracking_shipper::matomo::set_up_http_client(&config)?;

    run(service_fn(|request: LambdaEvent<SqsEvent>| {
        matomo_tracking_shipper::function_handler(&client, &config, request)
    }))
    .await
}
