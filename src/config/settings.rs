use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the message broker and for logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the broker.
///
/// Controls how long a delivery attempt waits for an acknowledgment and how
/// many times it re-sends before giving up. `max_retries = None` retries forever.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub ack_timeout_ms: u64,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub ack_timeout_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// The defaults reproduce the reference delivery behavior: a five second ack
/// timeout and no retry limit.
impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 5000,
            max_retries: None,
        }
    }
}
