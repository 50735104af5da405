//! Alert message formatting

use crate::models::{PlaceName, WeatherSnapshot};
use chrono::{Local, NaiveDateTime};
use std::fmt;

/// Sent in place of the forecast when no weather data could be fetched
pub const UNAVAILABLE_MESSAGE: &str =
    "⚠️ Weather alert service is currently unavailable. Please check back later.";

/// Timestamp pattern of the "last updated" line, e.g. `Fri, Mar 01 08:00`
const TIMESTAMP_FORMAT: &str = "%a, %b %d %H:%M";

/// A formatted, ready-to-send alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage(String);

impl AlertMessage {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_unavailable_notice(&self) -> bool {
        self.0 == UNAVAILABLE_MESSAGE
    }
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct MessageFormatter;

impl MessageFormatter {
    /// Format with the current local time as the update timestamp
    #[must_use]
    pub fn format(snapshot: Option<&WeatherSnapshot>, place: &PlaceName) -> AlertMessage {
        Self::format_at(snapshot, place, Local::now().naive_local())
    }

    #[must_use]
    pub fn format_at(
        snapshot: Option<&WeatherSnapshot>,
        place: &PlaceName,
        updated_at: NaiveDateTime,
    ) -> AlertMessage {
        let Some(snapshot) = snapshot else {
            return AlertMessage(UNAVAILABLE_MESSAGE.to_string());
        };

        AlertMessage(format!(
            "*Weather Alert for {place}*\n\n\
             🌡️ Temperature: {temperature}\n\
             ☁️ Condition: {condition}\n\
             🕒 Last updated: {updated}\n\n\
             Stay prepared! (This is an automated alert)",
            temperature = snapshot.format_temperature(),
            condition = snapshot.condition(),
            updated = updated_at.format(TIMESTAMP_FORMAT),
        ))
    }
}
