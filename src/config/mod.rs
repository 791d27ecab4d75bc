mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, LoggingSettings, Settings};

/// Prefix of the environment variables read by [`load_config`],
/// e.g. `ACKSUB_BROKER__ACK_TIMEOUT_MS=250`.
pub const ENV_PREFIX: &str = "ACKSUB";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the broker and logging configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        broker: BrokerSettings {
            ack_timeout_ms: partial
                .broker
                .as_ref()
                .and_then(|b| b.ack_timeout_ms)
                .unwrap_or(default.broker.ack_timeout_ms),
            max_retries: partial
                .broker
                .as_ref()
                .and_then(|b| b.max_retries)
                .or(default.broker.max_retries),
        },
        logging: LoggingSettings {
            level: partial
                .logging
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.logging.level),
        },
    })
}
