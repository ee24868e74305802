use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cg_lanes::LaneCapacityManager;
use cg_pass::{GatePass, LaneEffect, PassEvent, PassVehicle};
use cg_reservation::is_valid_for_access;
use cg_schemas::{GateError, Lane, LaneId, LaneStatus, PassDirection, PassId, PassStatus, VehicleId};
use cg_store::{EntityStore, InMemoryStore};
use cg_validation::validate_plate_number;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::directory::{ReservationDirectory, VehicleDirectory};

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassAction {
    Created,
    Approved,
    Denied,
    Completed,
}

/// A committed pass change together with the lane state it left behind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassChange {
    pub action: PassAction,
    pub pass: GatePass,
    pub lane: Lane,
}

/// Hook notified after a change commits, before the write lock is released,
/// so observers see changes in commit order. Implementations must not call
/// back into the coordinator.
pub trait GateObserver: Send + Sync {
    fn pass_changed(&self, _change: &PassChange) {}

    fn lane_changed(&self, _lane: &Lane) {}
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TrafficState {
    lanes: LaneCapacityManager,
    passes: InMemoryStore<GatePass>,
}

pub struct TrafficCoordinator<V, R, C = SystemClock> {
    vehicles: V,
    reservations: R,
    clock: C,
    state: RwLock<TrafficState>,
    observers: Vec<Arc<dyn GateObserver>>,
}

impl<V, R, C> TrafficCoordinator<V, R, C>
where
    V: VehicleDirectory,
    R: ReservationDirectory,
    C: Clock,
{
    pub fn new(vehicles: V, reservations: R, clock: C) -> Self {
        Self {
            vehicles,
            reservations,
            clock,
            state: RwLock::new(TrafficState::default()),
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn GateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn vehicles(&self) -> &V {
        &self.vehicles
    }

    pub fn reservations(&self) -> &R {
        &self.reservations
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn read(&self) -> RwLockReadGuard<'_, TrafficState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrafficState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify_lane(&self, lane: &Lane) {
        for o in &self.observers {
            o.lane_changed(lane);
        }
    }

    fn notify_pass(&self, action: PassAction, pass: &GatePass, lane: &Lane) {
        if self.observers.is_empty() {
            return;
        }
        let change = PassChange {
            action,
            pass: pass.clone(),
            lane: lane.clone(),
        };
        for o in &self.observers {
            o.pass_changed(&change);
        }
    }

    // -----------------------------------------------------------------------
    // Lane administration
    // -----------------------------------------------------------------------

    pub fn add_lane(
        &self,
        id: LaneId,
        number: i64,
        capacity_per_minute: i64,
    ) -> Result<Lane, GateError> {
        let mut st = self.write();
        let lane = st.lanes.add_lane(id, number, capacity_per_minute)?;
        self.notify_lane(&lane);
        Ok(lane)
    }

    pub fn update_lane(
        &self,
        id: LaneId,
        number: i64,
        capacity_per_minute: i64,
    ) -> Result<Lane, GateError> {
        let mut st = self.write();
        let lane = st.lanes.update_lane(id, number, capacity_per_minute)?;
        self.notify_lane(&lane);
        Ok(lane)
    }

    pub fn set_lane_status(&self, id: LaneId, status: LaneStatus) -> Result<Lane, GateError> {
        let mut st = self.write();
        let lane = st.lanes.set_status(id, status)?;
        self.notify_lane(&lane);
        Ok(lane)
    }

    pub fn lane(&self, id: LaneId) -> Result<Lane, GateError> {
        self.read().lanes.lane(id)
    }

    pub fn all_lanes(&self) -> Vec<Lane> {
        self.read().lanes.all_lanes()
    }

    pub fn available_lane(&self) -> Option<Lane> {
        self.read().lanes.available_lane()
    }

    pub fn available_lanes(&self) -> Vec<Lane> {
        self.read().lanes.available_lanes()
    }

    pub fn utilization(&self, id: LaneId) -> Result<f64, GateError> {
        self.read().lanes.utilization(id)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Resident entry. Creates a PENDING pass on the first available lane.
    /// No load is taken until approval.
    ///
    /// # Errors
    /// `NotFound` (unknown vehicle), `BusinessRule` (vehicle not allowed, or
    /// no available lanes).
    pub fn request_entry(&self, vehicle_id: VehicleId) -> Result<GatePass, GateError> {
        let vehicle = self
            .vehicles
            .find_vehicle(vehicle_id)
            .ok_or_else(|| GateError::not_found("Vehicle", vehicle_id))?;

        if !vehicle.allowed {
            warn!(vehicle_id, plate = %vehicle.plate_number, "entry refused: vehicle not allowed");
            return Err(GateError::rule(format!(
                "vehicle {} is not allowed to enter",
                vehicle.plate_number
            )));
        }

        self.open_pass(
            PassVehicle::Registered {
                vehicle_id,
                plate_number: vehicle.plate_number,
            },
            PassDirection::Entry,
        )
    }

    /// Resident exit. Same as entry without the permission check.
    pub fn request_exit(&self, vehicle_id: VehicleId) -> Result<GatePass, GateError> {
        let vehicle = self
            .vehicles
            .find_vehicle(vehicle_id)
            .ok_or_else(|| GateError::not_found("Vehicle", vehicle_id))?;

        self.open_pass(
            PassVehicle::Registered {
                vehicle_id,
                plate_number: vehicle.plate_number,
            },
            PassDirection::Exit,
        )
    }

    fn open_pass(
        &self,
        vehicle: PassVehicle,
        direction: PassDirection,
    ) -> Result<GatePass, GateError> {
        let now = self.clock.now();
        let mut st = self.write();

        let lane = st.lanes.available_lane().ok_or_else(|| {
            warn!(
                plate = %vehicle.plate_number(),
                ?direction,
                "request refused: no available lanes"
            );
            GateError::rule("no available lanes")
        })?;

        let pass = GatePass::requested(vehicle, lane.id, direction, now);
        let pass = st.passes.save(pass)?;

        info!(
            pass_id = pass.id,
            lane_id = lane.id,
            ?direction,
            status = %pass.status(),
            "pass requested"
        );
        self.notify_pass(PassAction::Created, &pass, &lane);
        Ok(pass)
    }

    /// Visitor entry. The reservation window check stands in for approval:
    /// the pass is created APPROVED. Like every pass, no load is taken at
    /// creation; only `approve` admits a unit, so a later `complete` on a
    /// visitor pass saturates at zero.
    ///
    /// # Errors
    /// `InvalidArgument` (plate format), `NotFound` (no active reservation),
    /// `BusinessRule` (outside the access window, or no available lanes).
    pub fn request_visitor_entry(&self, plate_number: &str) -> Result<GatePass, GateError> {
        validate_plate_number(plate_number)?;

        let reservation = self
            .reservations
            .find_active_by_plate(plate_number)
            .ok_or_else(|| GateError::not_found("VisitReservation", plate_number))?;

        let now = self.clock.now();
        if !is_valid_for_access(&reservation, now, self.reservations.access_window()) {
            warn!(
                plate = plate_number,
                reservation_id = reservation.id,
                visit_at = %reservation.visit_at(),
                %now,
                "visitor refused: outside access window"
            );
            return Err(GateError::rule("visitor access not allowed at this time"));
        }

        let mut st = self.write();

        let lane = st.lanes.available_lane().ok_or_else(|| {
            warn!(plate = plate_number, "visitor refused: no available lanes");
            GateError::rule("no available lanes")
        })?;

        let visitor = PassVehicle::Visitor {
            plate_number: plate_number.to_string(),
        };
        let pass = GatePass::pre_approved(visitor, lane.id, now);
        let pass = st.passes.save(pass)?;

        info!(
            pass_id = pass.id,
            lane_id = lane.id,
            reservation_id = reservation.id,
            status = %pass.status(),
            "visitor pass issued"
        );
        self.notify_pass(PassAction::Created, &pass, &lane);
        Ok(pass)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    pub fn approve_pass(&self, pass_id: PassId) -> Result<GatePass, GateError> {
        self.transition(pass_id, PassAction::Approved, |lane| PassEvent::Approve {
            lane_status: lane.status,
        })
    }

    pub fn deny_pass(&self, pass_id: PassId) -> Result<GatePass, GateError> {
        self.transition(pass_id, PassAction::Denied, |_| PassEvent::Deny)
    }

    pub fn complete_pass(&self, pass_id: PassId) -> Result<GatePass, GateError> {
        self.transition(pass_id, PassAction::Completed, |_| PassEvent::Complete)
    }

    /// Guard, transition and lane effect as one critical section. Nothing is
    /// written unless the state machine accepts the event.
    fn transition(
        &self,
        pass_id: PassId,
        action: PassAction,
        event_for: impl FnOnce(&Lane) -> PassEvent,
    ) -> Result<GatePass, GateError> {
        let mut st = self.write();

        let mut pass = st
            .passes
            .find_by_id(pass_id)
            .ok_or_else(|| GateError::not_found("GatePass", pass_id))?;
        let lane = st.lanes.lane(pass.lane_id)?;

        let effect = pass.apply(event_for(&lane)).map_err(|e| {
            warn!(
                pass_id,
                lane_id = lane.id,
                lane_status = %lane.status,
                error = %e,
                "pass transition refused"
            );
            GateError::from(e)
        })?;

        let lane = match effect {
            LaneEffect::None => lane,
            LaneEffect::Admit => st.lanes.increase_load(lane.id)?,
            LaneEffect::Release => st.lanes.decrease_load(lane.id)?,
        };
        let pass = st.passes.update(pass)?;

        info!(
            pass_id,
            lane_id = lane.id,
            status = %pass.status(),
            lane_load = lane.current_load,
            lane_status = %lane.status,
            "pass transitioned"
        );
        self.notify_pass(action, &pass, &lane);
        Ok(pass)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn pass(&self, pass_id: PassId) -> Result<GatePass, GateError> {
        self.read()
            .passes
            .find_by_id(pass_id)
            .ok_or_else(|| GateError::not_found("GatePass", pass_id))
    }

    pub fn all_passes(&self) -> Vec<GatePass> {
        self.read().passes.find_all()
    }

    pub fn pending_passes(&self) -> Vec<GatePass> {
        self.passes_by_status(PassStatus::Pending)
    }

    pub fn passes_by_status(&self, status: PassStatus) -> Vec<GatePass> {
        self.read().passes.find_by(|p| p.status() == status)
    }

    pub fn passes_by_lane(&self, lane_id: LaneId) -> Vec<GatePass> {
        self.read().passes.find_by(|p| p.lane_id == lane_id)
    }

    /// Registered-vehicle passes only; visitor passes carry no vehicle id.
    pub fn passes_by_vehicle(&self, vehicle_id: VehicleId) -> Vec<GatePass> {
        self.read()
            .passes
            .find_by(|p| p.vehicle.vehicle_id() == Some(vehicle_id))
    }

    /// Passes on `lane_id` with `start <= pass_time <= end`.
    ///
    /// # Errors
    /// `NotFound` if the lane does not exist.
    pub fn traffic_count_in_window(
        &self,
        lane_id: LaneId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<usize, GateError> {
        let st = self.read();
        st.lanes.lane(lane_id)?;
        let count = st
            .passes
            .find_by(|p| p.lane_id == lane_id && p.pass_time >= start && p.pass_time <= end)
            .len();
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
