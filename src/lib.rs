//! Weather alerts for WhatsApp recipients
//!
//! This library fetches current conditions for a fixed location, resolves a
//! place name, formats a short alert and delivers it to every configured
//! recipient, either once or on a daily schedule.

pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod message;
pub mod models;
pub mod pipeline;
pub mod scheduler;
pub mod weather;

// Re-export core types for public API
pub use clock::{Clock, SimulatedClock, SystemClock};
pub use config::AlertConfig;
pub use delivery::{AlertDispatcher, DeliveryResult, MessageSender, SendOptions, WhatsAppSender};
pub use error::AlertError;
pub use location_resolver::{Geocoder, LocationResolver, NominatimGeocoder};
pub use message::{AlertMessage, MessageFormatter, UNAVAILABLE_MESSAGE};
pub use models::{Coordinates, PhoneNumber, PlaceName, RecipientList, WeatherSnapshot};
pub use pipeline::{AlertPipeline, PipelineReport};
pub use scheduler::{DailyTrigger, PollingScheduler};
pub use weather::{OpenMeteoClient, WeatherFetcher, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Printed by both entry points on startup
pub const BANNER: &str = "Starting Swazi Mobile Weather Alert System...";

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AlertError>;
