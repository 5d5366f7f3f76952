//! Pixometer Sensor Library
//!
//! This library polls the Pixometer metering API for electricity, gas and water
//! readings and exposes each meter as a periodically updated sensor.

pub mod config;
pub mod error;
pub mod models;
pub mod pixometer_api;
pub mod platform;
pub mod sensor;
pub mod wrapper;

// Re-export commonly used types for easier access
pub use config::PixometerConfig;
pub use error::PixometerError;
pub use models::{Meter, PhysicalMedium, Reading};
pub use pixometer_api::PixometerAPI;
pub use platform::setup_platform;
pub use sensor::{PixometerSensor, SensorSnapshot};
pub use wrapper::PixometerWrapper;
