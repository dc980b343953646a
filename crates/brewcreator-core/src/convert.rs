// ── Wire-to-domain conversions ──
//
// Bridges raw `brewcreator_api` fleet records into typed snapshots.
// Conversions are lossy but never fatal: unknown equipment kinds are
// dropped with a warning, unparseable enum values and timestamps become
// `None` with a debug log, and the rest of the record stays usable.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use brewcreator_api::models::{RawBatchInfo, RawEquipment};

use crate::model::{
    BatchInfo, Equipment, EquipmentId, EquipmentKind, FermentationType, Ferminator,
    FerminatorMode, FerminatorStatus, Tilt, TiltColor,
};

/// Classify a raw record into a typed snapshot.
///
/// Returns `None` (after logging) for unrecognized device kinds so a
/// single odd record never fails the whole fetch.
pub(crate) fn equipment_from_raw(raw: &RawEquipment) -> Option<Equipment> {
    let kind = raw
        .group
        .as_deref()
        .map_or(EquipmentKind::Unknown, EquipmentKind::from_wire);

    match kind {
        EquipmentKind::Ferminator => Some(Equipment::Ferminator(ferminator_from_raw(raw))),
        EquipmentKind::Tilt => Some(Equipment::Tilt(tilt_from_raw(raw))),
        EquipmentKind::Unknown => {
            warn!(id = %raw.id, group = ?raw.group, "unknown equipment type, dropping record");
            None
        }
    }
}

fn ferminator_from_raw(raw: &RawEquipment) -> Ferminator {
    let (sw_version, hw_version) = raw
        .device_twin_state
        .as_ref()
        .map_or((None, None), |twin| {
            (
                twin.reported_sw_version.clone(),
                twin.reported_hw_version.clone(),
            )
        });

    Ferminator {
        id: EquipmentId::new(raw.id.clone()),
        serial_number: raw.serial_number.clone().unwrap_or_default(),
        name: raw.name.clone().unwrap_or_default(),
        is_active: raw.is_active.unwrap_or_default(),
        is_connected: raw.is_connected.unwrap_or_default(),
        last_activity_time: parse_timestamp(raw.last_activity_time.as_deref()),
        builtin_temperature: raw.actual_temperature,
        fan_speed: raw.fan_speed,
        target_temperature: raw.set_temperature,
        mode: parse_enum::<FerminatorMode>(raw.l_process.as_deref(), "lProcess"),
        status: parse_enum::<FerminatorStatus>(raw.l_status.as_deref(), "lStatus"),
        sw_version,
        hw_version,
        is_logging_data: raw.is_logging_data.unwrap_or_default(),
        connected_equipment: raw
            .connected_equipments
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(EquipmentId::from)
            .collect(),
        batch_info: raw.batch_info.as_ref().map(batch_from_raw),
        // Resolved during directory construction, against siblings from
        // the same fetch only.
        linked_tilt: None,
    }
}

fn tilt_from_raw(raw: &RawEquipment) -> Tilt {
    Tilt {
        id: EquipmentId::new(raw.id.clone()),
        serial_number: raw.serial_number.clone().unwrap_or_default(),
        name: raw.name.clone().unwrap_or_default(),
        is_active: raw.is_active.unwrap_or_default(),
        is_connected: raw.is_connected.unwrap_or_default(),
        last_activity_time: parse_timestamp(raw.last_activity_time.as_deref()),
        actual_temperature: raw.actual_temperature,
        specific_gravity: raw.sg,
        abv: raw.abv,
        color: parse_enum::<TiltColor>(raw.color.as_deref(), "color"),
        is_logging_data: raw.is_logging_data.unwrap_or_default(),
    }
}

fn batch_from_raw(raw: &RawBatchInfo) -> BatchInfo {
    BatchInfo {
        brew_name: raw.brew_name.clone(),
        owner: raw.owner.clone(),
        beer_style: raw.beer_style.clone(),
        ebc: raw.ebc,
        ibu: raw.ibu,
        volume: raw.volume,
        original_gravity: raw.og,
        final_gravity: raw.fg,
        fermentation_type: parse_enum::<FermentationType>(
            raw.fermentation_type.as_deref(),
            "fermentationType",
        ),
        brew_date: parse_timestamp(raw.brew_date.as_deref()),
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Parse an ISO-8601 timestamp; unparseable values become `None`.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(err) => {
            debug!(value = raw, error = %err, "unparseable timestamp");
            None
        }
    }
}

/// Parse a wire enum value; unknown values become `None`.
fn parse_enum<T: FromStr>(raw: Option<&str>, field: &str) -> Option<T> {
    let raw = raw?;
    match T::from_str(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(value = raw, field, "unrecognized wire value");
            None
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
