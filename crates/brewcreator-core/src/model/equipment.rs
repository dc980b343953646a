// Equipment snapshots.
//
// One tagged enum over device kind instead of an inheritance tree:
// kind-specific payloads live in their own structs and callers dispatch
// by pattern match.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

use super::batch::BatchInfo;
use super::id::EquipmentId;

/// Device-kind discriminator as sent by the fleet listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EquipmentKind {
    Ferminator,
    Tilt,
    Unknown,
}

impl EquipmentKind {
    /// Classify the wire value of `iotHubBrewEquipmentGroupId`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "Ferminator" => Self::Ferminator,
            "Tilt" => Self::Tilt,
            _ => Self::Unknown,
        }
    }
}

/// One piece of equipment as of the most recent fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Equipment {
    Ferminator(Ferminator),
    Tilt(Tilt),
}

impl Equipment {
    pub fn id(&self) -> &EquipmentId {
        match self {
            Self::Ferminator(f) => &f.id,
            Self::Tilt(t) => &t.id,
        }
    }

    pub fn kind(&self) -> EquipmentKind {
        match self {
            Self::Ferminator(_) => EquipmentKind::Ferminator,
            Self::Tilt(_) => EquipmentKind::Tilt,
        }
    }

    pub fn serial_number(&self) -> &str {
        match self {
            Self::Ferminator(f) => &f.serial_number,
            Self::Tilt(t) => &t.serial_number,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Ferminator(f) => &f.name,
            Self::Tilt(t) => &t.name,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Ferminator(f) => f.is_active,
            Self::Tilt(t) => t.is_active,
        }
    }

    pub fn last_activity_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Ferminator(f) => f.last_activity_time,
            Self::Tilt(t) => t.last_activity_time,
        }
    }

    /// Current temperature reading; for controllers this prefers the
    /// linked hydrometer over the built-in probe.
    pub fn actual_temperature(&self) -> Option<f64> {
        match self {
            Self::Ferminator(f) => f.actual_temperature(),
            Self::Tilt(t) => t.actual_temperature,
        }
    }

    pub fn as_ferminator(&self) -> Option<&Ferminator> {
        match self {
            Self::Ferminator(f) => Some(f),
            Self::Tilt(_) => None,
        }
    }

    pub fn as_tilt(&self) -> Option<&Tilt> {
        match self {
            Self::Tilt(t) => Some(t),
            Self::Ferminator(_) => None,
        }
    }
}

// ── Ferminator ──────────────────────────────────────────────────────

/// Temperature-regulation process mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum FerminatorMode {
    Ready,
    Cooling,
    Heating,
    Idle,
}

/// Run status of the regulation program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum FerminatorStatus {
    Start,
    Stop,
}

/// Fermentation-controller snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ferminator {
    pub id: EquipmentId,
    pub serial_number: String,
    pub name: String,
    pub is_active: bool,
    pub is_connected: bool,
    pub last_activity_time: Option<DateTime<Utc>>,
    /// Reading of the controller's own probe.
    pub builtin_temperature: Option<f64>,
    pub fan_speed: Option<i32>,
    pub target_temperature: Option<f64>,
    pub mode: Option<FerminatorMode>,
    pub status: Option<FerminatorStatus>,
    pub sw_version: Option<String>,
    pub hw_version: Option<String>,
    pub is_logging_data: bool,
    /// Linked equipment ids declared by the controller, narrowed to the
    /// ids actually present in the same fetch.
    pub connected_equipment: Vec<EquipmentId>,
    pub batch_info: Option<BatchInfo>,
    /// Hydrometer resolved from `connected_equipment` that is currently
    /// logging data, if any. Set during directory construction.
    pub linked_tilt: Option<Tilt>,
}

impl Ferminator {
    /// Effective temperature: the linked hydrometer's reading when one
    /// is logging data, otherwise the built-in probe.
    pub fn actual_temperature(&self) -> Option<f64> {
        match &self.linked_tilt {
            Some(tilt) => tilt.actual_temperature,
            None => self.builtin_temperature,
        }
    }

    pub fn actual_temperature_builtin_probe(&self) -> Option<f64> {
        self.builtin_temperature
    }
}

// ── Tilt ────────────────────────────────────────────────────────────

/// Color band of a Tilt hydrometer, doubling as its model designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
pub enum TiltColor {
    #[strum(serialize = "TiltOrange", to_string = "Orange")]
    Orange,
    #[strum(serialize = "TiltYellow", to_string = "Yellow")]
    Yellow,
    #[strum(serialize = "TiltGreen", to_string = "Green")]
    Green,
    #[strum(serialize = "TiltBlue", to_string = "Blue")]
    Blue,
    #[strum(serialize = "TiltPurple", to_string = "Purple")]
    Purple,
    #[strum(serialize = "TiltRed", to_string = "Red")]
    Red,
    #[strum(serialize = "TiltPink", to_string = "Pink")]
    Pink,
    #[strum(serialize = "TiltBlack", to_string = "Black")]
    Black,
}

/// Hydrometer-probe snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tilt {
    pub id: EquipmentId,
    pub serial_number: String,
    pub name: String,
    pub is_active: bool,
    pub is_connected: bool,
    pub last_activity_time: Option<DateTime<Utc>>,
    pub actual_temperature: Option<f64>,
    pub specific_gravity: Option<f64>,
    pub abv: Option<f64>,
    pub color: Option<TiltColor>,
    pub is_logging_data: bool,
}

// ── Tests ───────────────────────────────────────────────────────────
