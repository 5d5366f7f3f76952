//! Shared Pixometer state: access token, meter list and reading cache.
//!
//! All sensors share one [`PixometerWrapper`]. Every operation that touches
//! the token, the meters or the last fetch time holds the wrapper's lock for
//! its whole duration, so concurrent sensor updates collapse into a single
//! upstream fetch per scan interval.

use crate::config::PixometerConfig;
use crate::models::{AccessToken, Meter, Reading};
use crate::pixometer_api::PixometerAPI;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, warn};

#[derive(Default)]
struct WrapperState {
    token: Option<AccessToken>,
    /// `None` until the first meter refresh, successful or not.
    meters: Option<Vec<Meter>>,
    last_update: Option<Instant>,
}

pub struct PixometerWrapper {
    api: PixometerAPI,
    username: String,
    password: String,
    scan_interval: Duration,
    page_size: u32,
    state: Mutex<WrapperState>,
}

impl PixometerWrapper {
    pub fn new(api: PixometerAPI, config: &PixometerConfig) -> Self {
        Self {
            api,
            username: config.username.clone(),
            password: config.password.clone(),
            scan_interval: config.scan_interval,
            page_size: config.page_size,
            state: Mutex::new(WrapperState::default()),
        }
    }

    /// Makes sure a non-expired access token is cached, requesting one if needed.
    pub async fn ensure_valid_token(&self) -> bool {
        let mut state = self.state.lock().await;
        self.ensure_token_locked(&mut state).await.is_some()
    }

    /// Expiry of the cached token, if any.
    pub async fn token_expires_at(&self) -> Option<Instant> {
        self.state.lock().await.token.as_ref().map(|t| t.expires_at)
    }

    /// Returns the cached meters, loading them on first use.
    pub async fn get_meters(&self) -> Vec<Meter> {
        let mut state = self.state.lock().await;
        if state.meters.is_none() {
            self.refresh_meters_locked(&mut state).await;
        }
        state.meters.clone().unwrap_or_default()
    }

    /// Reloads the meter list from Pixometer, dropping any cached readings.
    pub async fn refresh_meters(&self) -> Vec<Meter> {
        let mut state = self.state.lock().await;
        self.refresh_meters_locked(&mut state).await;
        state.meters.clone().unwrap_or_default()
    }

    /// Snapshot of a single meter, matched by URL.
    pub async fn meter(&self, url: &str) -> Option<Meter> {
        let state = self.state.lock().await;
        state
            .meters
            .iter()
            .flatten()
            .find(|m| m.url == url)
            .cloned()
    }

    /// [`refresh_readings`](Self::refresh_readings) with the configured page size.
    pub async fn refresh_latest_readings(&self) -> bool {
        self.refresh_readings(self.page_size).await
    }

    /// Fetches the latest readings unless that already happened within the scan interval.
    pub async fn refresh_readings(&self, page_size: u32) -> bool {
        let mut state = self.state.lock().await;

        if let Some(last_update) = state.last_update {
            // An interval too large to add never elapses
            let fresh = match last_update.checked_add(self.scan_interval) {
                Some(next_update) => next_update > Instant::now(),
                None => true,
            };
            if fresh {
                debug!(
                    elapsed = ?last_update.elapsed(),
                    "Last reading fetch was recent, skipping"
                );
                return true;
            }
        }

        if state.meters.is_none() {
            self.refresh_meters_locked(&mut state).await;
        }

        let Some(authorization) = self.ensure_token_locked(&mut state).await else {
            return false;
        };

        let response = match self.api.list_readings(&authorization, page_size).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Cannot get readings from Pixometer");
                return false;
            }
        };
        state.last_update = Some(Instant::now());

        if response.count == 0 {
            // Readings from the previous fetch are left in place.
            warn!("No readings data from Pixometer");
            return true;
        }

        let Some(meters) = state.meters.as_mut() else {
            return true;
        };
        distribute_readings(meters, response.results);
        for meter in meters.iter() {
            if let Some(latest) = meter.latest_reading() {
                debug!(
                    meter_id = %meter.meter_id,
                    reading_date = %latest.reading_date,
                    value = %latest.value,
                    "Latest reading"
                );
            }
        }
        true
    }

    /// Returns the authorization header value for a valid token.
    async fn ensure_token_locked(&self, state: &mut WrapperState) -> Option<String> {
        if let Some(token) = &state.token {
            if token.is_valid_at(Instant::now()) {
                debug!(expires_in = ?token.expires_at - Instant::now(), "Token is still valid");
                return Some(token.authorization());
            }
        }

        let issued_at = Instant::now();
        match self
            .api
            .request_access_token(&self.username, &self.password)
            .await
        {
            Ok(response) => {
                let token = AccessToken::from_response(response, issued_at);
                debug!(
                    user_id = %token.user_id,
                    valid_for = ?token.expires_at - issued_at,
                    "Obtained new Pixometer token"
                );
                let authorization = token.authorization();
                state.token = Some(token);
                Some(authorization)
            }
            Err(e) => {
                error!(error = %e, "Cannot connect to Pixometer");
                None
            }
        }
    }

    async fn refresh_meters_locked(&self, state: &mut WrapperState) {
        state.meters = Some(Vec::new());

        let Some(authorization) = self.ensure_token_locked(state).await else {
            error!("Cannot load meters without a Pixometer token");
            return;
        };

        let response = match self.api.list_meters(&authorization).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Cannot get meters data from Pixometer");
                return;
            }
        };

        if response.count == 0 {
            warn!("No meters from Pixometer");
            return;
        }

        for meter in &response.results {
            debug!(meter_id = %meter.meter_id, url = %meter.url, "Found meter");
        }
        state.meters = Some(response.results);
    }
}

/// Replaces every meter's readings with the ones whose `meter` URL matches it.
fn distribute_readings(meters: &mut [Meter], readings: Vec<Reading>) {
    for meter in meters.iter_mut() {
        meter.readings.clear();
    }
    for reading in readings {
        for meter in meters.iter_mut().filter(|m| m.url == reading.meter) {
            meter.readings.push(reading.clone());
        }
    }
}
