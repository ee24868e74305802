use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cg_schemas::{GateError, VehicleId, VehicleRecord};
use cg_store::{EntityStore, InMemoryStore};
use cg_validation::validate_plate_number;
use serde::Deserialize;
use tracing::info;

use crate::directory::VehicleDirectory;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewVehicle {
    #[serde(default)]
    pub id: VehicleId,
    pub plate_number: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "allowed_by_default")]
    pub allowed: bool,
}

fn allowed_by_default() -> bool {
    true
}

/// In-memory resident vehicle registry. Plates are unique, compared
/// case-insensitively.
#[derive(Debug, Default)]
pub struct VehicleBook {
    rows: RwLock<InMemoryStore<VehicleRecord>>,
}

impl VehicleBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryStore<VehicleRecord>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryStore<VehicleRecord>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_vehicle(&self, v: NewVehicle) -> Result<VehicleRecord, GateError> {
        validate_plate_number(&v.plate_number)?;

        let mut rows = self.write();
        if rows
            .find_one_by(|r| r.plate_number.eq_ignore_ascii_case(&v.plate_number))
            .is_some()
        {
            return Err(GateError::conflict(format!(
                "vehicle with plate {} already registered",
                v.plate_number
            )));
        }

        let saved = rows.save(VehicleRecord {
            id: v.id,
            plate_number: v.plate_number,
            owner: v.owner,
            allowed: v.allowed,
        })?;
        info!(vehicle_id = saved.id, plate = %saved.plate_number, "vehicle registered");
        Ok(saved)
    }

    /// Grant or revoke entry permission.
    pub fn set_allowed(&self, id: VehicleId, allowed: bool) -> Result<VehicleRecord, GateError> {
        let mut rows = self.write();
        let mut v = rows
            .find_by_id(id)
            .ok_or_else(|| GateError::not_found("Vehicle", id))?;
        v.allowed = allowed;
        let v = rows.update(v)?;
        info!(vehicle_id = id, allowed, "vehicle entry permission set");
        Ok(v)
    }

    pub fn vehicle(&self, id: VehicleId) -> Result<VehicleRecord, GateError> {
        self.read()
            .find_by_id(id)
            .ok_or_else(|| GateError::not_found("Vehicle", id))
    }

    pub fn find_by_plate(&self, plate: &str) -> Option<VehicleRecord> {
        self.read()
            .find_one_by(|r| r.plate_number.eq_ignore_ascii_case(plate))
    }

    pub fn all_vehicles(&self) -> Vec<VehicleRecord> {
        self.read().find_all()
    }
}

impl VehicleDirectory for VehicleBook {
    fn find_vehicle(&self, id: VehicleId) -> Option<VehicleRecord> {
        self.read().find_by_id(id)
    }
}
