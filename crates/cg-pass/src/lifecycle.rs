//! Pass lifecycle state machine.
//!
//! # State diagram
//!
//! ```text
//!   request_*()                 approve (lane OPEN)
//!   ─────────► Pending ───────────────────────────► Approved ──complete──► Completed (term.)
//!                 │                                     ▲
//!                 └──deny──► Denied (term.)             │
//!                                                       │
//!   visitor entry (reservation already checked) ────────┘
//! ```
//!
//! Every other (state, event) pair is a [`TransitionError`] and leaves the
//! pass unchanged.

use cg_schemas::{GateError, LaneId, LaneStatus, PassDirection, PassId, PassStatus, VehicleId};
use cg_store::Entity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PassVehicle
// ---------------------------------------------------------------------------

/// Who a pass was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassVehicle {
    /// A resident vehicle from the vehicle directory.
    Registered {
        vehicle_id: VehicleId,
        plate_number: String,
    },
    /// An unregistered visitor car, known only by its plate.
    Visitor { plate_number: String },
}

impl PassVehicle {
    pub fn vehicle_id(&self) -> Option<VehicleId> {
        match self {
            PassVehicle::Registered { vehicle_id, .. } => Some(*vehicle_id),
            PassVehicle::Visitor { .. } => None,
        }
    }

    pub fn plate_number(&self) -> &str {
        match self {
            PassVehicle::Registered { plate_number, .. }
            | PassVehicle::Visitor { plate_number } => plate_number,
        }
    }
}

// ---------------------------------------------------------------------------
// PassEvent / LaneEffect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassEvent {
    /// Operator approval. `lane_status` is the lane's status at approval time.
    Approve { lane_status: LaneStatus },
    Deny,
    Complete,
}

impl PassEvent {
    fn name(&self) -> &'static str {
        match self {
            PassEvent::Approve { .. } => "approve",
            PassEvent::Deny => "deny",
            PassEvent::Complete => "complete",
        }
    }
}

/// Lane side effect implied by a successful transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneEffect {
    None,
    /// Take one load unit on the pass's lane.
    Admit,
    /// Give one load unit back.
    Release,
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

/// An event that cannot be applied in the pass's current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionError {
    pub pass_id: PassId,
    pub from: PassStatus,
    pub event: &'static str,
    pub reason: String,
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (pass {} is {}, event {})",
            self.reason, self.pass_id, self.from, self.event
        )
    }
}

impl std::error::Error for TransitionError {}

impl From<TransitionError> for GateError {
    fn from(e: TransitionError) -> Self {
        GateError::illegal(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// GatePass
// ---------------------------------------------------------------------------

/// One admission record for one vehicle's entry or exit attempt.
///
/// `lane_id`, `direction` and `pass_time` are fixed at creation. `status`
/// only moves through [`GatePass::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePass {
    pub id: PassId,
    pub vehicle: PassVehicle,
    pub lane_id: LaneId,
    pub direction: PassDirection,
    status: PassStatus,
    pub pass_time: NaiveDateTime,
}

impl GatePass {
    /// A resident entry/exit request, PENDING until an operator acts on it.
    pub fn requested(
        vehicle: PassVehicle,
        lane_id: LaneId,
        direction: PassDirection,
        pass_time: NaiveDateTime,
    ) -> Self {
        Self {
            id: 0,
            vehicle,
            lane_id,
            direction,
            status: PassStatus::Pending,
            pass_time,
        }
    }

    /// A visitor entry whose reservation check already stands in for approval.
    /// Starts APPROVED; PENDING is never observed.
    pub fn pre_approved(vehicle: PassVehicle, lane_id: LaneId, pass_time: NaiveDateTime) -> Self {
        Self {
            id: 0,
            vehicle,
            lane_id,
            direction: PassDirection::Entry,
            status: PassStatus::Approved,
            pass_time,
        }
    }

    pub fn status(&self) -> PassStatus {
        self.status
    }

    /// Apply `event`, returning the lane side effect to commit with it.
    ///
    /// # Errors
    /// [`TransitionError`] for every pair not in the diagram above, and for an
    /// approval while the lane is BUSY or CLOSED. The pass is unchanged on error.
    pub fn apply(&mut self, event: PassEvent) -> Result<LaneEffect, TransitionError> {
        use PassEvent::*;
        use PassStatus::*;

        let effect = match (self.status, event) {
            (Pending, Approve { lane_status }) => {
                if lane_status != LaneStatus::Open {
                    return Err(self.refuse(
                        event,
                        format!(
                            "cannot approve pass: lane {} is {lane_status}",
                            self.lane_id
                        ),
                    ));
                }
                self.status = Approved;
                LaneEffect::Admit
            }

            (Pending, Deny) => {
                self.status = Denied;
                LaneEffect::None
            }

            (Approved, Complete) => {
                self.status = Completed;
                LaneEffect::Release
            }

            (_, Approve { .. }) => {
                return Err(self.refuse(event, "cannot approve non-pending pass"));
            }
            (_, Deny) => {
                return Err(self.refuse(event, "cannot deny non-pending pass"));
            }
            (_, Complete) => {
                return Err(self.refuse(event, "cannot complete non-approved pass"));
            }
        };

        Ok(effect)
    }

    fn refuse(&self, event: PassEvent, reason: impl Into<String>) -> TransitionError {
        TransitionError {
            pass_id: self.id,
            from: self.status,
            event: event.name(),
            reason: reason.into(),
        }
    }
}

impl Entity for GatePass {
    const NAME: &'static str = "GatePass";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
