//! Data models for the weather alert pipeline
//!
//! This module contains the value types passed between pipeline stages:
//! - Location: coordinates and resolved place names
//! - Weather: current conditions and the condition catalog
//! - Recipient: validated phone numbers

pub mod location;
pub mod recipient;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Coordinates, PlaceName};
pub use recipient::{PhoneNumber, RecipientList};
pub use weather::{Condition, ConditionCatalog, WeatherSnapshot};
