// Wire types for the BrewCreator REST API.
//
// Fields use `#[serde(default)]` liberally because the fleet endpoint is
// inconsistent about field presence across equipment kinds and firmware
// versions. Anything not modelled explicitly lands in `extra` so nothing
// the service sends is silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Fleet listing ────────────────────────────────────────────────────

/// Envelope returned by `GET /api/v1.0/equipments`.
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentPage {
    #[serde(default)]
    pub data: Vec<RawEquipment>,
    /// Paging metadata and anything else in the envelope.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One raw device record from the fleet listing.
///
/// The kind discriminator is `iotHubBrewEquipmentGroupId`
/// (`"Ferminator"` | `"Tilt"`); classification into typed snapshots
/// happens in `brewcreator-core`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEquipment {
    pub id: String,
    #[serde(rename = "iotHubBrewEquipmentId", default)]
    pub serial_number: Option<String>,
    #[serde(rename = "iotHubBrewEquipmentGroupId", default)]
    pub group: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_connected: Option<bool>,
    /// ISO-8601 timestamp of the last telemetry report.
    #[serde(default)]
    pub last_activity_time: Option<String>,
    #[serde(default)]
    pub actual_temperature: Option<f64>,

    // Fermentation-controller telemetry.
    #[serde(default)]
    pub fan_speed: Option<i32>,
    #[serde(default)]
    pub set_temperature: Option<f64>,
    /// Process mode: `"Ready"` | `"Cooling"` | `"Heating"` | `"Idle"`.
    #[serde(default)]
    pub l_process: Option<String>,
    /// Run status: `"Start"` | `"Stop"`.
    #[serde(default)]
    pub l_status: Option<String>,
    #[serde(default)]
    pub is_logging_data: Option<bool>,
    /// Ids of equipment linked to this controller.
    #[serde(default)]
    pub connected_equipments: Option<Vec<String>>,
    #[serde(default)]
    pub device_twin_state: Option<DeviceTwinState>,
    #[serde(default)]
    pub batch_info: Option<RawBatchInfo>,

    // Hydrometer-probe telemetry.
    #[serde(default)]
    pub sg: Option<f64>,
    #[serde(default)]
    pub abv: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,

    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Firmware/hardware versions reported through the device twin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTwinState {
    #[serde(default)]
    pub reported_sw_version: Option<String>,
    #[serde(default)]
    pub reported_hw_version: Option<String>,
}

/// Batch metadata attached to a fermentation controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBatchInfo {
    #[serde(default)]
    pub brew_name: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub beer_style: Option<String>,
    #[serde(default)]
    pub ebc: Option<f64>,
    #[serde(default)]
    pub ibu: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub og: Option<f64>,
    #[serde(default)]
    pub fg: Option<f64>,
    /// `"Top"` | `"Bottom"`.
    #[serde(default)]
    pub fermentation_type: Option<String>,
    #[serde(default)]
    pub brew_date: Option<String>,
}

// ── Write path ───────────────────────────────────────────────────────

/// Envelope returned by `PUT /api/v1.0/equipments/{id}`.
///
/// A missing flag deserializes as `false` so callers see "not confirmed"
/// rather than a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub succeeded: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Realtime negotiate ───────────────────────────────────────────────

/// Response of `POST /telemetry/negotiate?negotiateVersion=1`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    pub connection_token: String,
}

// ── Token endpoint ───────────────────────────────────────────────────

/// Response of the identity server's `/connect/token` endpoint, for both
/// the authorization-code and refresh-token grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
}

// ── Tests ────────────────────────────────────────────────────────────
