//! Configuration management for the weather alert application
//!
//! Built-in defaults are layered under `WEATHER_ALERT_*` environment
//! variables, then validated before any pipeline is constructed.

use crate::AlertError;
use crate::models::{Coordinates, RecipientList};
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, Map};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Prefix of every environment variable read by [`AlertConfig::load`]
pub const ENV_PREFIX: &str = "WEATHER_ALERT";

/// Root configuration structure for the weather alert application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Location the alert is about
    pub location: LocationConfig,
    /// Weather provider settings
    pub weather: WeatherConfig,
    /// Reverse geocoding settings
    pub geocoding: GeocodingConfig,
    /// Messaging delivery settings
    pub messenger: MessengerConfig,
    /// Polling schedule settings
    pub schedule: ScheduleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Phone numbers receiving the alert, in delivery order
    #[serde(deserialize_with = "list_or_comma_separated")]
    pub recipients: Vec<String>,
}

/// Alert location settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// IANA timezone passed to the weather provider
    pub timezone: String,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the Open-Meteo API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Reverse geocoding configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL for the Nominatim API
    pub base_url: String,
    /// Client identifier sent as User-Agent, required by Nominatim
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// WhatsApp Cloud API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    /// Base URL for the Graph API
    pub base_url: String,
    /// Graph API version segment
    pub api_version: String,
    /// Pre-authenticated access token
    pub access_token: String,
    /// Sending phone number ID from WhatsApp Business
    pub phone_number_id: String,
    /// Wait before each send, in seconds
    pub wait_seconds: u64,
    /// Release the connection after each send instead of keeping it alive
    pub close_after_send: bool,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Daily trigger settings for polling mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local hour (0-23) at which the alert fires
    pub hour: u32,
    /// Local minute (0-59) at which the alert fires
    pub minute: u32,
    /// Seconds between clock samples
    pub poll_interval_seconds: u64,
    /// Seconds to sleep after firing
    pub guard_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            location: LocationConfig {
                latitude: -26.3167,
                longitude: 31.1333,
                timezone: "Africa/Maputo".to_string(),
            },
            weather: WeatherConfig {
                base_url: "https://api.open-meteo.com/v1".to_string(),
                timeout_seconds: 10,
            },
            geocoding: GeocodingConfig {
                base_url: "https://nominatim.openstreetmap.org".to_string(),
                user_agent: "swazi_weather_alerts".to_string(),
                timeout_seconds: 10,
            },
            messenger: MessengerConfig {
                base_url: "https://graph.facebook.com".to_string(),
                api_version: "v18.0".to_string(),
                access_token: String::new(),
                phone_number_id: String::new(),
                wait_seconds: 15,
                close_after_send: true,
                timeout_seconds: 30,
            },
            schedule: ScheduleConfig {
                hour: 8,
                minute: 0,
                poll_interval_seconds: 30,
                guard_seconds: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            recipients: vec!["+26879089337".to_string(), "+26876897613".to_string()],
        }
    }
}

impl AlertConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_from_env(None)
    }

    /// Load configuration from an explicit variable map instead of the process environment
    pub fn load_from_env(vars: Option<Map<String, String>>) -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .with_context(|| "Failed to serialize default configuration")?;

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(vars),
            )
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: AlertConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.location.latitude, self.location.longitude)
    }

    pub fn recipient_list(&self) -> crate::Result<RecipientList> {
        RecipientList::parse(&self.recipients)
            .map_err(|e| AlertError::config(format!("Invalid recipients: {e}")))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        self.validate_location()?;
        self.validate_endpoints()?;
        self.validate_messenger()?;
        self.validate_schedule()?;
        self.validate_logging()?;
        self.recipient_list()?;
        Ok(())
    }

    fn validate_location(&self) -> crate::Result<()> {
        if !self.coordinates().is_valid() {
            return Err(AlertError::config(format!(
                "Coordinates out of range: {}",
                self.coordinates().format_coordinates()
            )));
        }

        if self.location.timezone.parse::<Tz>().is_err() {
            return Err(AlertError::config(format!(
                "Unknown timezone '{}'",
                self.location.timezone
            )));
        }

        Ok(())
    }

    fn validate_endpoints(&self) -> crate::Result<()> {
        let endpoints = [
            ("Weather", &self.weather.base_url, self.weather.timeout_seconds),
            ("Geocoding", &self.geocoding.base_url, self.geocoding.timeout_seconds),
            ("Messenger", &self.messenger.base_url, self.messenger.timeout_seconds),
        ];

        for (name, url, timeout) in endpoints {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AlertError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                )));
            }
            if !(1..=300).contains(&timeout) {
                return Err(AlertError::config(format!(
                    "{name} API timeout must be between 1 and 300 seconds"
                )));
            }
        }

        if self.geocoding.user_agent.trim().is_empty() {
            return Err(AlertError::config("Geocoding user agent cannot be empty"));
        }

        Ok(())
    }

    fn validate_messenger(&self) -> crate::Result<()> {
        if self.messenger.access_token.is_empty() {
            return Err(AlertError::config(format!(
                "Messenger access token is required (set {ENV_PREFIX}_MESSENGER__ACCESS_TOKEN)"
            )));
        }

        if self.messenger.phone_number_id.is_empty() {
            return Err(AlertError::config(format!(
                "Messenger phone number ID is required (set {ENV_PREFIX}_MESSENGER__PHONE_NUMBER_ID)"
            )));
        }

        if self.messenger.wait_seconds > 300 {
            return Err(AlertError::config(
                "Messenger wait cannot exceed 300 seconds",
            ));
        }

        Ok(())
    }

    /// The alert must fire at most once per matching minute: a sample lands in
    /// every minute, and the next sample after firing is in a later minute.
    fn validate_schedule(&self) -> crate::Result<()> {
        let schedule = &self.schedule;

        if schedule.hour > 23 || schedule.minute > 59 {
            return Err(AlertError::config(format!(
                "Invalid trigger time {:02}:{:02}",
                schedule.hour, schedule.minute
            )));
        }

        if !(1..=60).contains(&schedule.poll_interval_seconds) {
            return Err(AlertError::config(
                "Poll interval must be between 1 and 60 seconds",
            ));
        }

        if schedule.guard_seconds + schedule.poll_interval_seconds < 60 {
            return Err(AlertError::config(
                "Guard plus poll interval must cover at least 60 seconds",
            ));
        }

        Ok(())
    }

    fn validate_logging(&self) -> crate::Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AlertError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AlertError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        Ok(())
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl MessengerConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }
}

impl ScheduleConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    #[must_use]
    pub fn guard(&self) -> Duration {
        Duration::from_secs(self.guard_seconds)
    }
}

/// Environment variables arrive as one string, defaults as a sequence
fn list_or_comma_separated<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<String>),
        String(String),
    }

    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(list) => list,
        ListOrString::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
