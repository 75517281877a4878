//! # Publisher Module
//!
//! Maps readings onto the ingress API payload and POSTs them.
//!
//! This module handles:
//! - Scaling and on/off conversion of reading fields
//! - JSON payload construction with a publish-time timestamp
//! - Authenticated POST to the ingress endpoint

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bmv::Reading;
use crate::config::PublisherConfig;
use crate::error::Result;

/// Device type identifier expected by the ingress API
pub const INGRESS_DEVICE_TYPE: &str = "VICTRON_ENERGY_BMV600";

/// Header carrying the device token
pub const DEVICE_TOKEN_HEADER: &str = "x-device-token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of an ingress request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRequest {
    pub device_type: &'static str,
    pub data: IngressData,
}

/// Published measurement values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressData {
    /// UTC seconds since the epoch at publish time
    pub date: i64,
    /// State of charge in percent
    pub state_of_charge: Option<f64>,
    pub alarm: bool,
    pub relay: bool,
    pub battery_voltage: Option<i64>,
    pub starter_battery_voltage: Option<i64>,
    pub current: Option<i64>,
    pub consumed_energy: Option<i64>,
    pub time_to_go: Option<i64>,
}

impl IngressData {
    pub fn from_reading(reading: &Reading, date: i64) -> Self {
        Self {
            date,
            state_of_charge: reading.state_of_charge.map(|soc| soc as f64 * 0.1),
            alarm: is_on(reading.alarm.as_deref()),
            relay: is_on(reading.relay.as_deref()),
            battery_voltage: reading.battery_voltage,
            starter_battery_voltage: reading.starter_battery_voltage,
            current: reading.current,
            consumed_energy: reading.consumed_energy,
            time_to_go: reading.time_to_go,
        }
    }
}

impl IngressRequest {
    pub fn new(reading: &Reading, date: i64) -> Self {
        Self {
            device_type: INGRESS_DEVICE_TYPE,
            data: IngressData::from_reading(reading, date),
        }
    }
}

/// "ON" is true; "OFF", anything else and absent are false
pub fn is_on(state: Option<&str>) -> bool {
    state == Some("ON")
}

/// Ingress endpoint for an API base URL
pub fn ingress_url(api_base_url: &str) -> String {
    format!("{}/ingress", api_base_url.trim_end_matches('/'))
}

/// HTTP publisher for readings
#[derive(Debug, Clone)]
pub struct Publisher {
    client: Client,
    url: String,
    device_token: String,
}

impl Publisher {
    /// Create a publisher
    ///
    /// # Errors
    ///
    /// Returns `Http` error if the HTTP client cannot be built
    pub fn new(config: &PublisherConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            url: ingress_url(&config.api_base_url),
            device_token: config.device_token.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Publish one reading, stamped with the current time
    ///
    /// # Returns
    ///
    /// * `Result<bool>` - `true` if the API accepted the reading (202)
    ///
    /// A rejected reading is logged and not retried.
    ///
    /// # Errors
    ///
    /// Returns `Http` error if the request could not be sent
    pub async fn publish(&self, reading: &Reading) -> Result<bool> {
        let request = IngressRequest::new(reading, Utc::now().timestamp());
        debug!("Publishing values: {:?}", request);

        let response = self
            .client
            .post(&self.url)
            .header(DEVICE_TOKEN_HEADER, &self.device_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            info!("Successfully published data");
            Ok(true)
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!("Ingress rejected reading with HTTP status {}: {}", status, body);
            Ok(false)
        }
    }
}
