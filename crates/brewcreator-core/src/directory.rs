// ── Equipment directory ──
//
// Mapping from id to snapshot, rebuilt wholesale on every fetch. The
// linked-probe pass runs after all snapshots exist because linkage must
// reference sibling records from the *same* fetch, never a stale
// directory.

use std::collections::{HashMap, HashSet};

use brewcreator_api::models::EquipmentPage;

use crate::convert;
use crate::model::{Equipment, EquipmentId, Ferminator, Tilt};

/// All equipment visible in one fleet fetch, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EquipmentDirectory {
    inner: HashMap<EquipmentId, Equipment>,
}

impl EquipmentDirectory {
    /// Build a directory from one raw fleet page.
    ///
    /// Unrecognized device kinds are dropped (logged by the conversion
    /// layer); afterwards every controller's declared linkage is resolved
    /// against the records of this fetch.
    pub fn from_page(page: &EquipmentPage) -> Self {
        let mut equipment: Vec<Equipment> = page
            .data
            .iter()
            .filter_map(convert::equipment_from_raw)
            .collect();

        resolve_links(&mut equipment);

        Self {
            inner: equipment
                .into_iter()
                .map(|e| (e.id().clone(), e))
                .collect(),
        }
    }

    pub fn get(&self, id: &EquipmentId) -> Option<&Equipment> {
        self.inner.get(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EquipmentId, &Equipment)> {
        self.inner.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Equipment> {
        self.inner.values()
    }

    /// All fermentation controllers in the directory.
    pub fn ferminators(&self) -> impl Iterator<Item = &Ferminator> {
        self.inner.values().filter_map(Equipment::as_ferminator)
    }

    /// All hydrometer probes in the directory.
    pub fn tilts(&self) -> impl Iterator<Item = &Tilt> {
        self.inner.values().filter_map(Equipment::as_tilt)
    }
}

impl IntoIterator for EquipmentDirectory {
    type Item = (EquipmentId, Equipment);
    type IntoIter = std::collections::hash_map::IntoIter<EquipmentId, Equipment>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// Second pass over a freshly converted fetch: narrow each controller's
/// declared linkage to ids present in this fetch and resolve the linked
/// probe to a connected hydrometer that is currently logging data.
/// Unresolved linkage yields no probe (built-in sensor fallback), never
/// an error.
fn resolve_links(equipment: &mut [Equipment]) {
    let present: HashSet<EquipmentId> = equipment.iter().map(|e| e.id().clone()).collect();
    let tilts: HashMap<EquipmentId, Tilt> = equipment
        .iter()
        .filter_map(Equipment::as_tilt)
        .map(|t| (t.id.clone(), t.clone()))
        .collect();

    for item in equipment.iter_mut() {
        if let Equipment::Ferminator(ferminator) = item {
            ferminator
                .connected_equipment
                .retain(|id| present.contains(id));
            ferminator.linked_tilt = ferminator
                .connected_equipment
                .iter()
                .filter_map(|id| tilts.get(id))
                .find(|tilt| tilt.is_logging_data)
                .cloned();
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(value: serde_json::Value) -> EquipmentPage {
        serde_json::from_value(value).unwrap()
    }

    fn ferminator_record(linked: &[&str]) -> serde_json::Value {
        json!({
            "id": "ferm-1",
            "iotHubBrewEquipmentGroupId": "Ferminator",
            "actualTemperature": 21.5,
            "connectedEquipments": linked,
        })
    }

    fn tilt_record(id: &str, temperature: f64, logging: bool) -> serde_json::Value {
        json!({
            "id": id,
            "iotHubBrewEquipmentGroupId": "Tilt",
            "actualTemperature": temperature,
            "isLoggingData": logging,
        })
    }

    #[test]
    fn linked_probe_resolves_to_logging_tilt_from_same_fetch() {
        let directory = EquipmentDirectory::from_page(&page(json!({
            "data": [
                ferminator_record(&["tilt-a", "tilt-b"]),
                tilt_record("tilt-a", 18.2, true),
                tilt_record("tilt-b", 25.0, false),
            ]
        })));

        assert_eq!(directory.len(), 3);
        let ferminator = directory
            .get(&EquipmentId::new("ferm-1"))
            .and_then(Equipment::as_ferminator)
            .unwrap();

        // Both linked ids are present, but only the logging probe wins.
        assert_eq!(ferminator.connected_equipment.len(), 2);
        let linked = ferminator.linked_tilt.as_ref().unwrap();
        assert_eq!(linked.id, EquipmentId::new("tilt-a"));

        // Effective temperature comes from the probe, not the built-in
        // sensor.
        assert_eq!(ferminator.actual_temperature(), Some(18.2));
        assert_eq!(ferminator.actual_temperature_builtin_probe(), Some(21.5));
    }

    #[test]
    fn absent_linked_ids_fall_back_to_builtin_sensor() {
        let directory = EquipmentDirectory::from_page(&page(json!({
            "data": [ferminator_record(&["tilt-gone"])]
        })));

        let ferminator = directory
            .get(&EquipmentId::new("ferm-1"))
            .and_then(Equipment::as_ferminator)
            .unwrap();

        // The dangling reference is narrowed away, not an error.
        assert!(ferminator.connected_equipment.is_empty());
        assert!(ferminator.linked_tilt.is_none());
        assert_eq!(ferminator.actual_temperature(), Some(21.5));
    }

    #[test]
    fn non_logging_probe_is_not_linked() {
        let directory = EquipmentDirectory::from_page(&page(json!({
            "data": [
                ferminator_record(&["tilt-a"]),
                tilt_record("tilt-a", 18.2, false),
            ]
        })));

        let ferminator = directory
            .get(&EquipmentId::new("ferm-1"))
            .and_then(Equipment::as_ferminator)
            .unwrap();

        // The id stays in the narrowed linkage, but a silent probe never
        // overrides the built-in sensor.
        assert_eq!(ferminator.connected_equipment.len(), 1);
        assert!(ferminator.linked_tilt.is_none());
        assert_eq!(ferminator.actual_temperature(), Some(21.5));
    }

    #[test]
    fn unknown_kinds_are_excluded_without_failing_the_fetch() {
        let directory = EquipmentDirectory::from_page(&page(json!({
            "data": [
                tilt_record("tilt-a", 19.0, true),
                { "id": "keg-1", "iotHubBrewEquipmentGroupId": "Kegerator" },
            ]
        })));

        assert_eq!(directory.len(), 1);
        assert!(directory.get(&EquipmentId::new("keg-1")).is_none());
        assert_eq!(directory.tilts().count(), 1);
    }
}
