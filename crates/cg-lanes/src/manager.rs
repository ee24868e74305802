use cg_schemas::{GateError, Lane, LaneId, LaneStatus};
use cg_store::{EntityStore, InMemoryStore};
use cg_validation::validate_positive;
use tracing::{debug, info};

/// Owns every lane and is the only writer of lane load and status.
///
/// The manager is not synchronized. The traffic coordinator holds it behind
/// the same lock as the pass store so that a pass transition and its lane side
/// effect commit together.
#[derive(Debug, Clone)]
pub struct LaneCapacityManager<S = InMemoryStore<Lane>>
where
    S: EntityStore<Lane>,
{
    store: S,
}

impl Default for LaneCapacityManager<InMemoryStore<Lane>> {
    fn default() -> Self {
        Self::new()
    }
}

impl LaneCapacityManager<InMemoryStore<Lane>> {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new(),
        }
    }
}

impl<S> LaneCapacityManager<S>
where
    S: EntityStore<Lane>,
{
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Register a new lane, OPEN with zero load.
    ///
    /// `id == 0` lets the store assign one.
    ///
    /// # Errors
    /// - `InvalidArgument` if `number` or `capacity_per_minute` is not positive.
    /// - `Conflict` if the lane number (or an explicit id) is already taken.
    pub fn add_lane(
        &mut self,
        id: LaneId,
        number: i64,
        capacity_per_minute: i64,
    ) -> Result<Lane, GateError> {
        let number = validate_positive(number, "lane number")?;
        let capacity = validate_positive(capacity_per_minute, "capacity per minute")?;

        if self.find_by_number(number).is_some() {
            return Err(number_taken(number));
        }

        let lane = self.store.save(Lane::new(id, number, capacity))?;
        info!(lane_id = lane.id, number, capacity, "lane added");
        Ok(lane)
    }

    /// Renumber or resize a lane in place.
    ///
    /// Shrinking below the current load is refused so the load bound holds.
    /// The BUSY flag is re-derived against the new capacity.
    pub fn update_lane(
        &mut self,
        id: LaneId,
        number: i64,
        capacity_per_minute: i64,
    ) -> Result<Lane, GateError> {
        let number = validate_positive(number, "lane number")?;
        let capacity = validate_positive(capacity_per_minute, "capacity per minute")?;

        let mut lane = self.lane(id)?;

        if let Some(other) = self.find_by_number(number) {
            if other.id != id {
                return Err(number_taken(number));
            }
        }

        if capacity < lane.current_load {
            return Err(GateError::rule(format!(
                "capacity {capacity} is below current load {} on lane {}",
                lane.current_load, lane.number
            )));
        }

        lane.number = number;
        lane.capacity_per_minute = capacity;
        reconcile_busy(&mut lane);

        Ok(self.store.update(lane)?)
    }

    /// Operator status change.
    ///
    /// | current | requested      | result                         |
    /// |---------|----------------|--------------------------------|
    /// | BUSY    | OPEN / CLOSED  | `IllegalTransition`            |
    /// | BUSY    | BUSY           | no-op                          |
    /// | any     | BUSY, headroom | `IllegalTransition`            |
    /// | OPEN    | CLOSED         | CLOSED                         |
    /// | CLOSED  | OPEN           | OPEN                           |
    pub fn set_status(&mut self, id: LaneId, status: LaneStatus) -> Result<Lane, GateError> {
        let mut lane = self.lane(id)?;

        if lane.status == LaneStatus::Busy && status != LaneStatus::Busy {
            return Err(GateError::illegal(format!(
                "cannot change lane {} from BUSY directly; load must drop below capacity first",
                lane.number
            )));
        }

        if status == LaneStatus::Busy && lane.has_capacity() {
            return Err(GateError::illegal(format!(
                "lane {} cannot be marked BUSY below capacity ({}/{})",
                lane.number, lane.current_load, lane.capacity_per_minute
            )));
        }

        if lane.status != status {
            info!(lane_id = id, from = %lane.status, to = %status, "lane status set");
        }
        lane.status = status;
        Ok(self.store.update(lane)?)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn lane(&self, id: LaneId) -> Result<Lane, GateError> {
        self.store
            .find_by_id(id)
            .ok_or_else(|| GateError::not_found("GateLane", id))
    }

    pub fn all_lanes(&self) -> Vec<Lane> {
        self.store.find_all()
    }

    /// First-fit: the first OPEN lane with headroom in enumeration order.
    pub fn available_lane(&self) -> Option<Lane> {
        self.store.find_one_by(Lane::is_available)
    }

    pub fn available_lanes(&self) -> Vec<Lane> {
        self.store.find_by(Lane::is_available)
    }

    /// `current_load / capacity * 100`, divided before scaling.
    pub fn utilization(&self, id: LaneId) -> Result<f64, GateError> {
        let lane = self.lane(id)?;
        Ok(f64::from(lane.current_load) / f64::from(lane.capacity_per_minute) * 100.0)
    }

    fn find_by_number(&self, number: u32) -> Option<Lane> {
        self.store.find_one_by(|l| l.number == number)
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Admit one load unit. Saturates at capacity without error.
    /// Reaching capacity forces BUSY.
    pub fn increase_load(&mut self, id: LaneId) -> Result<Lane, GateError> {
        let mut lane = self.lane(id)?;

        if lane.has_capacity() {
            lane.current_load += 1;
            debug!(
                lane_id = id,
                load = lane.current_load,
                "lane load increased"
            );
        } else {
            debug!(lane_id = id, "lane already saturated; increase ignored");
        }
        reconcile_busy(&mut lane);

        Ok(self.store.update(lane)?)
    }

    /// Release one load unit. Saturates at zero without error.
    /// Dropping below capacity while BUSY reverts to OPEN.
    pub fn decrease_load(&mut self, id: LaneId) -> Result<Lane, GateError> {
        let mut lane = self.lane(id)?;

        lane.current_load = lane.current_load.saturating_sub(1);
        debug!(
            lane_id = id,
            load = lane.current_load,
            "lane load decreased"
        );
        reconcile_busy(&mut lane);

        Ok(self.store.update(lane)?)
    }
}

fn number_taken(number: u32) -> GateError {
    GateError::conflict(format!("lane with number {number} already exists"))
}

/// Re-derive BUSY from load: at capacity → BUSY; BUSY with headroom → OPEN.
/// CLOSED with headroom stays CLOSED.
fn reconcile_busy(lane: &mut Lane) {
    if !lane.has_capacity() {
        if lane.status != LaneStatus::Busy {
            info!(lane_id = lane.id, from = %lane.status, "lane at capacity; forced BUSY");
            lane.status = LaneStatus::Busy;
        }
    } else if lane.status == LaneStatus::Busy {
        info!(lane_id = lane.id, "lane below capacity; BUSY -> OPEN");
        lane.status = LaneStatus::Open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cg_schemas::GateErrorKind;

    fn manager_with(lanes: &[(i64, i64)]) -> LaneCapacityManager {
        let mut m = LaneCapacityManager::new();
        for (number, cap) in lanes {
            m.add_lane(0, *number, *cap).unwrap();
        }
        m
    }

    #[test]
    fn add_lane_starts_open_and_empty() {
        let m = manager_with(&[(5, 10)]);
        let lane = m.lane(1).unwrap();
        assert_eq!(lane.number, 5);
        assert_eq!(lane.capacity_per_minute, 10);
        assert_eq!(lane.current_load, 0);
        assert_eq!(lane.status, LaneStatus::Open);
    }

    #[test]
    fn add_lane_rejects_non_positive_inputs() {
        let mut m = LaneCapacityManager::new();
        assert_eq!(
            m.add_lane(0, 0, 5).unwrap_err().kind(),
            GateErrorKind::InvalidArgument
        );
        assert_eq!(
            m.add_lane(0, 3, -1).unwrap_err().kind(),
            GateErrorKind::InvalidArgument
        );
        assert!(m.all_lanes().is_empty());
    }

    #[test]
    fn add_lane_rejects_duplicate_explicit_id() {
        let mut m = LaneCapacityManager::new();
        m.add_lane(4, 1, 5).unwrap();
        let err = m.add_lane(4, 2, 5).unwrap_err();
        assert_eq!(err.kind(), GateErrorKind::Conflict);
    }

    #[test]
    fn update_lane_conflicts_only_with_other_lanes() {
        let mut m = manager_with(&[(1, 5), (2, 5)]);
        // Keeping its own number is fine.
        let lane = m.update_lane(1, 1, 8).unwrap();
        assert_eq!(lane.capacity_per_minute, 8);

        let err = m.update_lane(1, 2, 8).unwrap_err();
        assert_eq!(err.kind(), GateErrorKind::Conflict);
        assert_eq!(m.lane(1).unwrap().number, 1);
    }

    #[test]
    fn update_lane_unknown_id_is_not_found() {
        let mut m = LaneCapacityManager::new();
        let err = m.update_lane(99, 1, 1).unwrap_err();
        assert_eq!(err.kind(), GateErrorKind::NotFound);
    }

    #[test]
    fn update_lane_refuses_capacity_below_load() {
        let mut m = manager_with(&[(1, 3)]);
        m.increase_load(1).unwrap();
        m.increase_load(1).unwrap();
        let err = m.update_lane(1, 1, 1).unwrap_err();
        assert_eq!(err.kind(), GateErrorKind::BusinessRule);
        assert_eq!(m.lane(1).unwrap().capacity_per_minute, 3);
    }

    #[test]
    fn update_lane_rederives_busy() {
        let mut m = manager_with(&[(1, 2)]);
        m.increase_load(1).unwrap();
        m.increase_load(1).unwrap();
        assert_eq!(m.lane(1).unwrap().status, LaneStatus::Busy);

        // Growing capacity frees the lane.
        let lane = m.update_lane(1, 1, 4).unwrap();
        assert_eq!(lane.status, LaneStatus::Open);

        // Shrinking onto the load saturates it again.
        let lane = m.update_lane(1, 1, 2).unwrap();
        assert_eq!(lane.status, LaneStatus::Busy);
    }

    #[test]
    fn reaching_capacity_forces_busy_and_saturates() {
        let mut m = manager_with(&[(1, 2)]);
        m.increase_load(1).unwrap();
        assert_eq!(m.lane(1).unwrap().status, LaneStatus::Open);
        let lane = m.increase_load(1).unwrap();
        assert_eq!(lane.status, LaneStatus::Busy);
        assert_eq!(lane.current_load, 2);

        // Saturated: no error, no change.
        let lane = m.increase_load(1).unwrap();
        assert_eq!(lane.current_load, 2);
        assert_eq!(lane.status, LaneStatus::Busy);
    }

    #[test]
    fn dropping_below_capacity_reverts_busy_to_open() {
        let mut m = manager_with(&[(1, 1)]);
        m.increase_load(1).unwrap();
        let lane = m.decrease_load(1).unwrap();
        assert_eq!(lane.current_load, 0);
        assert_eq!(lane.status, LaneStatus::Open);
    }

    #[test]
    fn decrease_at_zero_is_idempotent() {
        let mut m = manager_with(&[(1, 3)]);
        let lane = m.decrease_load(1).unwrap();
        assert_eq!(lane.current_load, 0);
        let lane = m.decrease_load(1).unwrap();
        assert_eq!(lane.current_load, 0);
        assert_eq!(lane.status, LaneStatus::Open);
    }

    #[test]
    fn closed_lane_stays_closed_when_load_drops() {
        let mut m = manager_with(&[(1, 3)]);
        m.increase_load(1).unwrap();
        m.set_status(1, LaneStatus::Closed).unwrap();
        let lane = m.decrease_load(1).unwrap();
        assert_eq!(lane.status, LaneStatus::Closed);
    }

    #[test]
    fn busy_cannot_be_left_by_operator() {
        let mut m = manager_with(&[(1, 1)]);
        m.increase_load(1).unwrap();
        for target in [LaneStatus::Open, LaneStatus::Closed] {
            let err = m.set_status(1, target).unwrap_err();
            assert_eq!(err.kind(), GateErrorKind::IllegalTransition);
        }
        // BUSY -> BUSY is allowed and changes nothing.
        let lane = m.set_status(1, LaneStatus::Busy).unwrap();
        assert_eq!(lane.status, LaneStatus::Busy);
    }

    #[test]
    fn busy_cannot_be_set_with_headroom() {
        let mut m = manager_with(&[(1, 3)]);
        let err = m.set_status(1, LaneStatus::Busy).unwrap_err();
        assert_eq!(err.kind(), GateErrorKind::IllegalTransition);
        assert_eq!(m.lane(1).unwrap().status, LaneStatus::Open);
    }

    #[test]
    fn open_closed_toggle_is_always_legal() {
        let mut m = manager_with(&[(1, 3)]);
        assert_eq!(
            m.set_status(1, LaneStatus::Closed).unwrap().status,
            LaneStatus::Closed
        );
        assert_eq!(
            m.set_status(1, LaneStatus::Open).unwrap().status,
            LaneStatus::Open
        );
    }

    #[test]
    fn available_lane_is_first_fit_not_least_loaded() {
        let mut m = manager_with(&[(1, 10), (2, 10)]);
        // Lane 1 carries more load than lane 2 but still has headroom.
        for _ in 0..5 {
            m.increase_load(1).unwrap();
        }
        assert_eq!(m.available_lane().unwrap().id, 1);

        m.set_status(1, LaneStatus::Closed).unwrap();
        assert_eq!(m.available_lane().unwrap().id, 2);

        m.set_status(2, LaneStatus::Closed).unwrap();
        assert!(m.available_lane().is_none());
        assert!(m.available_lanes().is_empty());
    }

    #[test]
    fn utilization_divides_before_scaling() {
        let mut m = manager_with(&[(1, 3)]);
        m.increase_load(1).unwrap();
        let u = m.utilization(1).unwrap();
        assert_eq!(u, 1.0_f64 / 3.0 * 100.0);
        assert_eq!(
            m.utilization(7).unwrap_err().kind(),
            GateErrorKind::NotFound
        );
    }
}
