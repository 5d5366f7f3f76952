use crate::config::PixometerConfig;
use crate::pixometer_api::PixometerAPI;
use crate::sensor::PixometerSensor;
use crate::wrapper::PixometerWrapper;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the shared wrapper and one sensor per meter.
pub async fn setup_platform(
    config: &PixometerConfig,
) -> anyhow::Result<(Arc<PixometerWrapper>, Vec<PixometerSensor>)> {
    info!(url = %config.base_url, "Setting up Pixometer sensors");

    let api = PixometerAPI::new(&config.base_url)?;
    let wrapper = Arc::new(PixometerWrapper::new(api, config));

    let mut sensors = Vec::new();
    for meter in wrapper.get_meters().await {
        let meter_id = meter.meter_id.clone();
        sensors.push(PixometerSensor::new(meter, wrapper.clone()).await);
        debug!(%meter_id, "Sensor added");
    }

    info!(count = sensors.len(), "Pixometer sensors ready");
    Ok((wrapper, sensors))
}
