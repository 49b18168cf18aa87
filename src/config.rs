use std::fmt::Debug;
use std::str::FromStr;
use std::string::String;
use std::time::Duration;
use std::{env, fmt};

use aws_config::SdkConfig;
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;

pub const DEFAULT_ENDPOINT: &str = "http://www.hebcal.com/ma/ma.php";
pub const DEFAULT_PAGE_HOST: &str = "alexa.hebcal.com";

#[derive(Clone)]
pub struct Config {
    pub matomo_token: Option<String>,
    pub endpoint: String,
    pub site_id: u32,
    pub page_host: String,
    pub mode: TrackingMode,
    pub request_timeout: Duration,
}

impl Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("matomo_token", &self.matomo_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("site_id", &self.site_id)
            .field("page_host", &self.page_host)
            .field("mode", &self.mode)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            matomo_token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            site_id: 4,
            page_host: DEFAULT_PAGE_HOST.to_string(),
            mode: TrackingMode::Full,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Which revision of the translator runs.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TrackingMode {
    /// pageview ids and US city/state parsing enabled
    Full,
    /// visitor ids and explicit state only
    Basic,
    /// decode and log records without contacting the collector
    LogOnly,
}

impl FromStr for TrackingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "full" => Ok(TrackingMode::Full),
            "basic" => Ok(TrackingMode::Basic),
            "log-only" | "logonly" => Ok(TrackingMode::LogOnly),
            other => Err(format!("Invalid or Unsupported tracking mode {}", other)),
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackingMode::Full => write!(f, "full"),
            TrackingMode::Basic => write!(f, "basic"),
            TrackingMode::LogOnly => write!(f, "log-only"),
        }
    }
}

impl Config {
    pub fn load_from_env() -> Result<Config, String> {
        let conf = Config {
            matomo_token: env::var("MATOMO_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            endpoint: env::var("MATOMO_ENDPOINT").unwrap_or(DEFAULT_ENDPOINT.to_string()),
            site_id: env::var("MATOMO_SITE_ID")
                .unwrap_or("4".to_string())
                .parse::<u32>()
                .map_err(|e| format!("Error parsing MATOMO_SITE_ID to u32 - {}", e))?,
            page_host: env::var("PAGE_URL_HOST").unwrap_or(DEFAULT_PAGE_HOST.to_string()),
            mode: env::var("TRACKING_MODE")
                .unwrap_or("full".to_string())
                .parse::<TrackingMode>()?,
            request_timeout: env::var("REQUEST_TIMEOUT")
                .unwrap_or("10".to_string())
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| format!("Error parsing REQUEST_TIMEOUT to u64 - {}", e))?,
        };

        Ok(conf)
    }

    /// The token when one is configured and stored as a Secrets Manager ARN.
    pub fn token_secret_arn(&self) -> Option<&str> {
        self.matomo_token
            .as_deref()
            .filter(|t| t.starts_with("arn:aws:secretsmanager:"))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum KeySourceError {
    #[error("Failed to access AWS Secrets Manager. Please make sure the lambda function has permissions to access the {secret_id} secret. Error: {error:?}")]
    FailedToAccessSecretsManager {
        secret_id: String,
        error: GetSecretValueError,
    },
    #[error("Didn't find the {secret_id} secret in AWS secretsmanager")]
    MissingSecret { secret_id: String },
}

pub async fn get_token_from_secrets_manager(
    aws_config: &SdkConfig,
    secret_id: String,
) -> Result<String, KeySourceError> {
    let secretsmanager = aws_sdk_secretsmanager::Client::new(aws_config);
    let response = secretsmanager
        .get_secret_value()
        .set_secret_id(Some(secret_id.clone()))
        .send()
        .await
        .map_err(|error| KeySourceError::FailedToAccessSecretsManager {
            secret_id: secret_id.clone(),
            error: error.into_service_error(),
        })?;
    response
        .secret_string
        .filter(|s| !s.is_empty())
        .ok_or(KeySourceError::MissingSecret { secret_id })
}
