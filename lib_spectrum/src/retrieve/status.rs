//! One-shot snapshot retrieval.

use anyhow::bail;
use reqwest::Method;

use super::ky_http::ApiClient;
use crate::telemetry::vehicle_state::VehicleState;

/// Endpoint serving the current vehicle state as JSON.
pub const STATUS_ENDPOINT: &str = "SpectrumStatus";

/// Fetches the current `VehicleState` from `endpoint` (normally
/// [`STATUS_ENDPOINT`]) without opening the live feed.
///
/// # Errors
/// Fails on transport errors, a non-2xx status or a body that is not a valid snapshot.
pub async fn fetch_vehicle_state(client: &ApiClient, endpoint: &str) -> anyhow::Result<VehicleState> {
    let resp = client
        .request::<VehicleState, ()>(Method::GET, endpoint, None, None)
        .await?;

    match resp.data {
        Some(state) if resp.success => Ok(state),
        _ => bail!(
            "{} returned status {}: {}",
            endpoint,
            resp.status,
            resp.error_body.unwrap_or_default()
        ),
    }
}
