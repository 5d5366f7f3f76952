use crate::models::{Meter, PhysicalMedium};
use crate::wrapper::PixometerWrapper;
use serde_derive::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

const STATE_CLASS: &str = "total_increasing";

/// Icon, device class and unit shown for a given medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediumProfile {
    pub icon: &'static str,
    pub device_class: &'static str,
    pub unit: &'static str,
}

impl MediumProfile {
    pub fn for_medium(medium: PhysicalMedium) -> Self {
        match medium {
            PhysicalMedium::Electricity => Self {
                icon: "mdi:flash",
                device_class: "energy",
                unit: "kWh",
            },
            PhysicalMedium::Gas => Self {
                icon: "mdi:radiator",
                device_class: "gas",
                unit: "m³",
            },
            // Water keeps the gas device class
            PhysicalMedium::Water => Self {
                icon: "mdi:water-pump",
                device_class: "gas",
                unit: "m³",
            },
        }
    }
}

/// Everything the host needs to publish a sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub name: String,
    pub unique_id: String,
    pub available: bool,
    pub state: Option<String>,
    pub unit_of_measurement: Option<String>,
    pub device_class: Option<&'static str>,
    pub icon: Option<&'static str>,
    pub attributes: BTreeMap<String, Value>,
}

/// Exposes the latest reading of one meter.
pub struct PixometerSensor {
    meter: Meter,
    wrapper: Arc<PixometerWrapper>,
    state: Option<String>,
    attributes: BTreeMap<String, Value>,
    profile: Option<MediumProfile>,
}

impl PixometerSensor {
    /// Creates the sensor and runs a first update.
    pub async fn new(meter: Meter, wrapper: Arc<PixometerWrapper>) -> Self {
        let mut sensor = Self {
            meter,
            wrapper,
            state: None,
            attributes: BTreeMap::new(),
            profile: None,
        };
        sensor.update().await;
        sensor
    }

    pub fn name(&self) -> String {
        format!("pixometer_{}", self.meter.meter_id)
    }

    pub fn unique_id(&self) -> String {
        format!("pixometer_{}", self.meter.meter_id)
    }

    pub fn available(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn extra_state_attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn unit_of_measurement(&self) -> Option<&str> {
        display_unit(self.meter.physical_unit.as_deref())
    }

    pub fn device_class(&self) -> Option<&'static str> {
        self.profile.map(|p| p.device_class)
    }

    pub fn icon(&self) -> Option<&'static str> {
        self.profile.map(|p| p.icon)
    }

    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            name: self.name(),
            unique_id: self.unique_id(),
            available: self.available(),
            state: self.state.clone(),
            unit_of_measurement: self.unit_of_measurement().map(str::to_string),
            device_class: self.device_class(),
            icon: self.icon(),
            attributes: self.attributes.clone(),
        }
    }

    /// Refreshes readings through the shared wrapper and updates state.
    ///
    /// Leaves state and attributes untouched when the meter has no readings.
    pub async fn update(&mut self) {
        debug!(meter_id = %self.meter.meter_id, "Updating pixometer sensor");
        self.wrapper.refresh_latest_readings().await;
        if let Some(meter) = self.wrapper.meter(&self.meter.url).await {
            self.meter = meter;
        }
        self.apply_meter();
    }

    fn apply_meter(&mut self) {
        let Some(latest) = self.meter.latest_reading() else {
            return;
        };
        self.state = Some(latest.value.clone());

        if let Some(medium) = self.meter.medium() {
            self.profile = Some(MediumProfile::for_medium(medium));
        }

        let mut attributes = BTreeMap::new();
        attributes.insert("last_reading".to_string(), Value::from(latest.reading_date.clone()));
        attributes.insert("appearance".to_string(), Value::from(self.meter.appearance.clone()));
        attributes.insert(
            "physical_medium".to_string(),
            Value::from(self.meter.physical_medium.clone()),
        );
        attributes.insert("created".to_string(), Value::from(self.meter.created.clone()));
        attributes.insert("state_class".to_string(), Value::from(STATE_CLASS));
        attributes.insert("device_class".to_string(), Value::from(self.device_class()));
        attributes.insert(
            "native_unit_of_measurement".to_string(),
            Value::from(self.profile.map(|p| p.unit)),
        );

        let optional = [
            ("label", &self.meter.label),
            ("zip_code", &self.meter.zip_code),
            ("city", &self.meter.city),
            ("address", &self.meter.address),
            ("location_in_building", &self.meter.location_in_building),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                attributes.insert(key.to_string(), Value::from(value.clone()));
            }
        }

        self.attributes = attributes;
    }
}

/// Pixometer spells cubic meters as `m^3`.
fn display_unit(physical_unit: Option<&str>) -> Option<&str> {
    match physical_unit {
        Some("m^3") => Some("m³"),
        other => other,
    }
}
