//! Vehicle Handle and Registry Traits

use crate::error::CommunicationError;
use crate::model::{Feature, FeatureSet, HvacStatus, Period, PluggedStatus, TripHistoryData, VehicleId};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// A connected vehicle as seen by the polling core.
///
/// The state accessors return the last values cached by the implementor and
/// must be cheap. `refresh` and `fetch_trip_histories` perform blocking
/// remote calls and may take arbitrarily long.
pub trait Vehicle: Send + Sync {
    /// Capability tags of this vehicle
    fn features(&self) -> FeatureSet;

    /// Last known plug state
    fn plugged_in(&self) -> PluggedStatus;

    /// Last known climate-control state
    fn hvac_status(&self) -> HvacStatus;

    /// Ask the backend for fresh vehicle state
    fn refresh(&self) -> Result<(), CommunicationError>;

    /// Fetch the trip history report for `period`
    fn fetch_trip_histories(&self, period: Period) -> Result<TripHistoryData, CommunicationError>;

    /// Whether the vehicle advertises `feature`
    fn supports(&self, feature: Feature) -> bool {
        self.features().contains(&feature)
    }
}

/// Read-only view of the vehicles known to the host.
///
/// `vehicles` must yield the same order on every call for an unchanged set.
pub trait VehicleRegistry: Send + Sync {
    fn vehicles(&self) -> Vec<(VehicleId, Arc<dyn Vehicle>)>;
}

/// Registry backed by an insertion-ordered list
#[derive(Default)]
pub struct StaticRegistry {
    entries: RwLock<Vec<(VehicleId, Arc<dyn Vehicle>)>>,
}

impl StaticRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vehicle, replacing any existing handle with the same id in place
    pub fn insert(&self, id: VehicleId, vehicle: Arc<dyn Vehicle>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = entries.iter_mut().find(|(existing, _)| *existing == id) {
            debug!("Replacing vehicle handle for {}", id);
            slot.1 = vehicle;
        } else {
            info!("Registered vehicle {}", id);
            entries.push((id, vehicle));
        }
    }

    /// Remove a vehicle, returning whether it was present
    pub fn remove(&self, id: &VehicleId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(existing, _)| existing != id);
        let removed = entries.len() != before;
        if removed {
            info!("Unregistered vehicle {}", id);
        }
        removed
    }

    /// Number of registered vehicles
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VehicleRegistry for StaticRegistry {
    fn vehicles(&self) -> Vec<(VehicleId, Arc<dyn Vehicle>)> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, vehicle)| (id.clone(), Arc::clone(vehicle)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockVehicle;

    fn ids(registry: &StaticRegistry) -> Vec<String> {
        registry
            .vehicles()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect()
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let registry = StaticRegistry::new();
        registry.insert("b".into(), Arc::new(MockVehicle::new()));
        registry.insert("a".into(), Arc::new(MockVehicle::new()));
        registry.insert("c".into(), Arc::new(MockVehicle::new()));

        assert_eq!(ids(&registry), vec!["b", "a", "c"]);
        assert_eq!(ids(&registry), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let registry = StaticRegistry::new();
        registry.insert("a".into(), Arc::new(MockVehicle::new()));
        registry.insert("b".into(), Arc::new(MockVehicle::new()));
        registry.insert(
            "a".into(),
            Arc::new(MockVehicle::new().with_hvac(HvacStatus::On)),
        );

        assert_eq!(registry.len(), 2);
        let vehicles = registry.vehicles();
        assert_eq!(vehicles[0].0.as_str(), "a");
        assert_eq!(vehicles[0].1.hvac_status(), HvacStatus::On);
    }

    #[test]
    fn test_remove() {
        let registry = StaticRegistry::new();
        registry.insert("a".into(), Arc::new(MockVehicle::new()));

        assert!(registry.remove(&"a".into()));
        assert!(!registry.remove(&"a".into()));
        assert!(registry.is_empty());
    }
}
