use pixometer_sensor::{setup_platform, PixometerConfig, PixometerSensor};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Starting Pixometer sensor bridge");
    let config = PixometerConfig::from_env()?;

    let (_wrapper, mut sensors) = setup_platform(&config).await?;
    if sensors.is_empty() {
        tracing::warn!("No Pixometer meters found, nothing to poll");
        return Ok(());
    }
    publish(&sensors)?;

    // tokio intervals must be non-zero
    let mut scan = interval(config.scan_interval.max(Duration::from_secs(60)));
    scan.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately and setup already updated every sensor
    scan.tick().await;

    loop {
        scan.tick().await;
        for sensor in sensors.iter_mut() {
            sensor.update().await;
        }
        publish(&sensors)?;
    }
}

/// Writes one JSON line per sensor for the host to pick up
fn publish(sensors: &[PixometerSensor]) -> anyhow::Result<()> {
    for sensor in sensors {
        println!("{}", serde_json::to_string(&sensor.snapshot())?);
    }
    Ok(())
}
