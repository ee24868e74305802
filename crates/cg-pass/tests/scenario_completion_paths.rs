//! Scenario: COMPLETED is reachable only along the legal paths.
//!
//! GREEN when, over every event sequence of length <= 3:
//! - a resident pass reaches COMPLETED only via approve -> complete
//! - a visitor pass reaches COMPLETED only via complete
//! - the first refused event stops the sequence without changing status

use cg_pass::{GatePass, PassEvent, PassVehicle};
use cg_schemas::{LaneStatus, PassDirection, PassStatus};
use chrono::{NaiveDate, NaiveDateTime};

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 5, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

const EVENTS: [PassEvent; 5] = [
    PassEvent::Approve {
        lane_status: LaneStatus::Open,
    },
    PassEvent::Approve {
        lane_status: LaneStatus::Busy,
    },
    PassEvent::Approve {
        lane_status: LaneStatus::Closed,
    },
    PassEvent::Deny,
    PassEvent::Complete,
];

fn sequences(max_len: usize) -> Vec<Vec<PassEvent>> {
    let mut out = vec![vec![]];
    let mut frontier = vec![vec![]];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for seq in &frontier {
            for ev in EVENTS {
                let mut s: Vec<PassEvent> = seq.clone();
                s.push(ev);
                next.push(s);
            }
        }
        out.extend(next.iter().cloned());
        frontier = next;
    }
    out
}

/// Apply until the first refusal; returns the accepted prefix.
fn run(mut pass: GatePass, seq: &[PassEvent]) -> (GatePass, Vec<PassEvent>) {
    let mut accepted = Vec::new();
    for ev in seq {
        let before = pass.status();
        match pass.apply(*ev) {
            Ok(_) => accepted.push(*ev),
            Err(_) => {
                assert_eq!(pass.status(), before);
                break;
            }
        }
    }
    (pass, accepted)
}

const APPROVE_OPEN: PassEvent = PassEvent::Approve {
    lane_status: LaneStatus::Open,
};

#[test]
fn scenario_resident_pass_completes_only_after_approval() {
    for seq in sequences(3) {
        let pass = GatePass::requested(
            PassVehicle::Registered {
                vehicle_id: 1,
                plate_number: "RES-001".into(),
            },
            1,
            PassDirection::Entry,
            at(),
        );
        let (pass, accepted) = run(pass, &seq);
        if pass.status() == PassStatus::Completed {
            let expected = vec![APPROVE_OPEN, PassEvent::Complete];
            assert_eq!(accepted, expected, "{seq:?}");
        }
    }
}

#[test]
fn scenario_visitor_pass_completes_directly() {
    for seq in sequences(3) {
        let pass = GatePass::pre_approved(
            PassVehicle::Visitor {
                plate_number: "VIS-001".into(),
            },
            1,
            at(),
        );
        let (pass, accepted) = run(pass, &seq);
        if pass.status() == PassStatus::Completed {
            assert_eq!(accepted, vec![PassEvent::Complete], "{seq:?}");
        }
        // Visitor passes never go back through PENDING.
        assert_ne!(pass.status(), PassStatus::Pending);
    }
}
