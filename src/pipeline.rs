//! One end-to-end alert run: resolve, fetch, format, deliver

use crate::clock::Clock;
use crate::config::AlertConfig;
use crate::delivery::{AlertDispatcher, DeliveryResult, SendOptions, WhatsAppSender};
use crate::location_resolver::{LocationResolver, NominatimGeocoder};
use crate::message::{AlertMessage, MessageFormatter};
use crate::models::{Coordinates, PlaceName, RecipientList, WeatherSnapshot};
use crate::weather::{OpenMeteoClient, WeatherFetcher};
use std::sync::Arc;
use tracing::{info, warn};

/// What a single run produced
#[derive(Debug)]
pub struct PipelineReport {
    pub place: PlaceName,
    pub weather: Option<WeatherSnapshot>,
    pub message: AlertMessage,
    pub deliveries: Vec<DeliveryResult>,
}

impl PipelineReport {
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.deliveries.iter().filter(|d| d.delivered()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.deliveries.len() - self.delivered_count()
    }
}

pub struct AlertPipeline {
    coordinates: Coordinates,
    recipients: RecipientList,
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
    dispatcher: AlertDispatcher,
    clock: Arc<dyn Clock>,
}

impl AlertPipeline {
    pub fn new(
        coordinates: Coordinates,
        recipients: RecipientList,
        resolver: LocationResolver,
        fetcher: WeatherFetcher,
        dispatcher: AlertDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            coordinates,
            recipients,
            resolver,
            fetcher,
            dispatcher,
            clock,
        }
    }

    /// Wire the Open-Meteo, Nominatim and WhatsApp clients from configuration
    pub fn from_config(config: &AlertConfig, clock: Arc<dyn Clock>) -> crate::Result<Self> {
        Ok(Self::new(
            config.coordinates(),
            config.recipient_list()?,
            LocationResolver::new(NominatimGeocoder::new(config)?),
            WeatherFetcher::new(OpenMeteoClient::new(config)?),
            AlertDispatcher::new(WhatsAppSender::new(config)?, SendOptions::from_config(config)),
            clock,
        ))
    }

    #[must_use]
    pub fn recipients(&self) -> &RecipientList {
        &self.recipients
    }

    pub async fn run(&self) -> PipelineReport {
        let place = self.resolver.resolve(self.coordinates).await;
        let weather = self.fetcher.fetch(self.coordinates).await;

        let message = MessageFormatter::format_at(weather.as_ref(), &place, self.clock.now());
        if message.is_unavailable_notice() {
            warn!("No weather available, sending service notice instead");
        }
        info!("Generated message: {}", message);

        let deliveries = self.dispatcher.deliver_all(&message, &self.recipients).await;

        let report = PipelineReport {
            place,
            weather,
            message,
            deliveries,
        };

        if report.failed_count() == 0 {
            info!(
                "Weather alert delivered to all {} recipients",
                report.delivered_count()
            );
        } else {
            warn!(
                "Weather alert delivered to {} of {} recipients",
                report.delivered_count(),
                report.deliveries.len()
            );
        }

        report
    }
}
