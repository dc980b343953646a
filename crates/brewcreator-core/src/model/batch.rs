// Batch metadata carried by a fermentation controller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

/// Where the yeast does its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum FermentationType {
    /// Top-fermenting (ale) yeast.
    Top,
    /// Bottom-fermenting (lager) yeast.
    Bottom,
}

/// Snapshot of the batch currently tracked by a controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchInfo {
    pub brew_name: Option<String>,
    pub owner: Option<String>,
    pub beer_style: Option<String>,
    pub ebc: Option<f64>,
    pub ibu: Option<f64>,
    /// Batch volume in liters.
    pub volume: Option<f64>,
    pub original_gravity: Option<f64>,
    pub final_gravity: Option<f64>,
    pub fermentation_type: Option<FermentationType>,
    pub brew_date: Option<DateTime<Utc>>,
}

/// Partial batch-metadata update.
///
/// Serializes to the wire `batchInfo` object with unset fields omitted,
/// so the server only touches what the caller set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brew_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beer_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ibu: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(rename = "og", skip_serializing_if = "Option::is_none")]
    pub original_gravity: Option<f64>,
    #[serde(rename = "fg", skip_serializing_if = "Option::is_none")]
    pub final_gravity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fermentation_type: Option<FermentationType>,
}
