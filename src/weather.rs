//! Current weather retrieval from the Open-Meteo API
//!
//! [`OpenMeteoClient`] reports every failure as a typed error;
//! [`WeatherFetcher`] logs it and degrades to "no weather".

use crate::AlertError;
use crate::config::AlertConfig;
use crate::models::{Coordinates, WeatherSnapshot};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Anything able to report current conditions for a coordinate pair
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_weather(&self, coordinates: Coordinates) -> crate::Result<WeatherSnapshot>;
}

/// Weather API client for Open-Meteo
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    /// Create a new weather API client
    pub fn new(config: &AlertConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(config.weather.timeout())
            .user_agent(format!("weather-alert/{}", crate::VERSION))
            .build()?;

        Ok(Self {
            client,
            base_url: config.weather.base_url.trim_end_matches('/').to_string(),
            timezone: config.location.timezone.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn current_weather(&self, coordinates: Coordinates) -> crate::Result<WeatherSnapshot> {
        let start_time = Instant::now();
        let url = format!("{}/forecast", self.base_url);
        debug!("Open-Meteo request URL: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("timezone", self.timezone.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::weather(format!(
                "Open-Meteo request failed with status {status}"
            )));
        }

        let forecast: openmeteo::ForecastResponse = response.json().await.map_err(|e| {
            AlertError::weather(format!("Failed to parse Open-Meteo response: {e}"))
        })?;

        debug!(
            "Open-Meteo responded in {:.3}s",
            start_time.elapsed().as_secs_f64()
        );

        Ok(forecast.into_snapshot())
    }
}

/// First pipeline stage: never fails, absent weather is `None`
pub struct WeatherFetcher {
    provider: Box<dyn WeatherProvider>,
}

impl WeatherFetcher {
    pub fn new(provider: impl WeatherProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
        }
    }

    pub async fn fetch(&self, coordinates: Coordinates) -> Option<WeatherSnapshot> {
        match self.provider.current_weather(coordinates).await {
            Ok(snapshot) => {
                info!(
                    "Current weather at {}: temperature {}, code {}",
                    coordinates.format_coordinates(),
                    snapshot.format_temperature(),
                    snapshot.condition_code
                );
                Some(snapshot)
            }
            Err(e) if e.is_timeout() => {
                warn!("Weather API error: request timed out ({e})");
                None
            }
            Err(e) => {
                warn!("Weather API error: {e}");
                None
            }
        }
    }
}

/// Open-Meteo response structures
mod openmeteo {
    use super::WeatherSnapshot;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current_weather: Option<CurrentWeather>,
    }

    /// Current conditions; any field may be missing
    #[derive(Debug, Default, Deserialize)]
    pub struct CurrentWeather {
        pub temperature: Option<f64>,
        pub weathercode: Option<i64>,
    }

    impl ForecastResponse {
        pub fn into_snapshot(self) -> WeatherSnapshot {
            let current = self.current_weather.unwrap_or_default();
            WeatherSnapshot::new(current.temperature, current.weathercode.unwrap_or(0))
        }
    }
}
