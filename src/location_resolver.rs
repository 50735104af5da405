//! Location Resolution Module
//!
//! This module turns the alert coordinates into a place name for the message
//! header via Nominatim reverse geocoding (OpenStreetMap, no API key).

use crate::AlertError;
use crate::config::AlertConfig;
use crate::models::{Coordinates, PlaceName};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Reverse geocoding backend returning a full address string
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, coordinates: Coordinates) -> crate::Result<String>;
}

/// Nominatim reverse geocoding client
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(config: &AlertConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(config.geocoding.timeout())
            .user_agent(config.geocoding.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.geocoding.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn reverse(&self, coordinates: Coordinates) -> crate::Result<String> {
        let url = format!("{}/reverse", self.base_url);
        debug!("Reverse geocoding via {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::geocoding(format!(
                "Reverse geocode returned status {status}"
            )));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| AlertError::geocoding(format!("Reverse geocode parse error: {e}")))?;

        if let Some(error) = body.error {
            return Err(AlertError::geocoding(error));
        }

        body.display_name
            .ok_or_else(|| AlertError::geocoding("No address in reverse geocode result"))
    }
}

/// Service for resolving the alert coordinates into a place name
pub struct LocationResolver {
    geocoder: Box<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(geocoder: impl Geocoder + 'static) -> Self {
        Self {
            geocoder: Box::new(geocoder),
        }
    }

    /// Resolve coordinates to the most specific segment of their address.
    ///
    /// Never fails: any lookup problem yields [`PlaceName::FALLBACK`].
    pub async fn resolve(&self, coordinates: Coordinates) -> PlaceName {
        debug!("Resolving coordinates: {}", coordinates.format_coordinates());

        let address = match self.geocoder.reverse(coordinates).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Geocoding error: {e}");
                return PlaceName::fallback();
            }
        };

        match PlaceName::from_address(&address) {
            Some(place) => {
                info!("Resolved location: {}", place);
                place
            }
            None => {
                warn!("Geocoding error: malformed address '{}'", address);
                PlaceName::fallback()
            }
        }
    }
}
