//! Weather snapshot model and the condition code catalog

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current conditions as reported by the weather provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius, absent when the provider omitted it
    pub temperature: Option<f64>,
    /// WMO weather interpretation code (0 when omitted)
    pub condition_code: i64,
}

impl WeatherSnapshot {
    /// Create a snapshot from provider values
    #[must_use]
    pub fn new(temperature: Option<f64>, condition_code: i64) -> Self {
        Self {
            temperature,
            condition_code,
        }
    }

    /// Format temperature with unit, `N/A°C` when unknown
    #[must_use]
    pub fn format_temperature(&self) -> String {
        match self.temperature {
            // adding zero turns -0.0 into 0.0
            Some(value) => format!("{}°C", value + 0.0),
            None => "N/A°C".to_string(),
        }
    }

    /// Icon and label for the condition code
    #[must_use]
    pub fn condition(&self) -> Condition {
        ConditionCatalog::lookup(self.condition_code)
    }
}

/// Icon and label for a weather condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub icon: &'static str,
    pub label: &'static str,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon, self.label)
    }
}

/// Fixed mapping from weather code to display condition
pub struct ConditionCatalog;

impl ConditionCatalog {
    /// Entry for every code not listed in [`ConditionCatalog::ENTRIES`]
    pub const DEFAULT: Condition = Condition {
        icon: "🌤️",
        label: "Fair weather",
    };

    /// WMO codes with a dedicated icon and label
    pub const ENTRIES: [(i64, Condition); 10] = [
        (0, Condition { icon: "☀️", label: "Clear sky" }),
        (1, Condition { icon: "🌤️", label: "Mainly clear" }),
        (2, Condition { icon: "⛅", label: "Partly cloudy" }),
        (3, Condition { icon: "☁️", label: "Overcast" }),
        (45, Condition { icon: "🌫️", label: "Fog" }),
        (48, Condition { icon: "🌫️", label: "Freezing fog" }),
        (51, Condition { icon: "🌧️", label: "Light drizzle" }),
        (61, Condition { icon: "🌧️", label: "Light rain" }),
        (80, Condition { icon: "🌦️", label: "Light showers" }),
        (95, Condition { icon: "⛈️", label: "Thunderstorm" }),
    ];

    /// Convert a weather code to its condition, falling back to fair weather
    #[must_use]
    pub fn lookup(code: i64) -> Condition {
        Self::ENTRIES
            .iter()
            .find(|(entry_code, _)| *entry_code == code)
            .map_or(Self::DEFAULT, |(_, condition)| *condition)
    }
}
