//! Scenario: one lane of capacity 1 admits one vehicle at a time.
//!
//! GREEN when:
//! - request -> PENDING on L1, load still 0
//! - approve -> APPROVED, L1 load 1 and BUSY
//! - a second entry request fails with BusinessRule (no available lanes)
//! - complete -> COMPLETED, L1 load 0 and OPEN
//! - completing again fails and leaves load at 0

use std::sync::Arc;

use cg_reservation::ReservationBook;
use cg_schemas::{GateErrorKind, LaneStatus, PassStatus};
use cg_traffic::{ManualClock, NewVehicle, TrafficCoordinator, VehicleBook};
use chrono::NaiveDate;

fn vehicle(book: &VehicleBook, plate: &str) -> u64 {
    book.register_vehicle(NewVehicle {
        id: 0,
        plate_number: plate.into(),
        owner: None,
        allowed: true,
    })
    .unwrap()
    .id
}

#[test]
fn scenario_capacity_one_lane_round_trip() {
    let vehicles = Arc::new(VehicleBook::new());
    let clock = ManualClock::new(
        NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap(),
    );
    let c = TrafficCoordinator::new(vehicles.clone(), ReservationBook::default(), clock);

    let l1 = c.add_lane(1, 1, 1).unwrap();
    assert_eq!(l1.status, LaneStatus::Open);
    let v1 = vehicle(&vehicles, "RES-001");
    let v2 = vehicle(&vehicles, "RES-002");

    let p1 = c.request_entry(v1).unwrap();
    assert_eq!(p1.status(), PassStatus::Pending);
    assert_eq!(p1.lane_id, l1.id);
    assert_eq!(c.lane(l1.id).unwrap().current_load, 0);

    let p1 = c.approve_pass(p1.id).unwrap();
    assert_eq!(p1.status(), PassStatus::Approved);
    let lane = c.lane(l1.id).unwrap();
    assert_eq!(lane.current_load, 1);
    assert_eq!(lane.status, LaneStatus::Busy);

    let err = c.request_entry(v2).unwrap_err();
    assert_eq!(err.kind(), GateErrorKind::BusinessRule);
    assert_eq!(c.all_passes().len(), 1);

    let p1 = c.complete_pass(p1.id).unwrap();
    assert_eq!(p1.status(), PassStatus::Completed);
    let lane = c.lane(l1.id).unwrap();
    assert_eq!(lane.current_load, 0);
    assert_eq!(lane.status, LaneStatus::Open);

    let err = c.complete_pass(p1.id).unwrap_err();
    assert_eq!(err.kind(), GateErrorKind::IllegalTransition);
    assert_eq!(c.lane(l1.id).unwrap().current_load, 0);
    assert_eq!(c.utilization(l1.id).unwrap(), 0.0);
}

#[test]
fn scenario_approval_on_closed_lane_is_illegal() {
    let vehicles = Arc::new(VehicleBook::new());
    let clock = ManualClock::new(
        NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap(),
    );
    let c = TrafficCoordinator::new(vehicles.clone(), ReservationBook::default(), clock);
    c.add_lane(0, 1, 4).unwrap();
    let v = vehicle(&vehicles, "RES-001");

    let p = c.request_entry(v).unwrap();
    c.set_lane_status(p.lane_id, LaneStatus::Closed).unwrap();

    let err = c.approve_pass(p.id).unwrap_err();
    assert_eq!(err.kind(), GateErrorKind::IllegalTransition);
    let lane = c.lane(p.lane_id).unwrap();
    assert_eq!(lane.current_load, 0);
    assert_eq!(lane.status, LaneStatus::Closed);

    // Reopening lets the same pending pass through.
    c.set_lane_status(p.lane_id, LaneStatus::Open).unwrap();
    let p = c.approve_pass(p.id).unwrap();
    assert_eq!(p.status(), PassStatus::Approved);
}
