//! cg-schemas
//!
//! Shared records for the compound gate: lanes, vehicles, visit reservations
//! and the enums a gate pass is described by. The pass record itself lives in
//! `cg-pass` next to the state machine that owns its status.
//!
//! No behavior beyond trivial predicates lives here.

mod error;

pub use error::{GateError, GateErrorKind};

use cg_store::Entity;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub type LaneId = u64;
pub type PassId = u64;
pub type VehicleId = u64;
pub type ReservationId = u64;

// ---------------------------------------------------------------------------
// Lane
// ---------------------------------------------------------------------------

/// Operational status of a gate lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaneStatus {
    /// Accepting admissions (subject to headroom).
    Open,
    /// Load has reached capacity. Only leaves BUSY when load drops.
    Busy,
    /// Closed by an operator, independent of load.
    Closed,
}

impl LaneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneStatus::Open => "OPEN",
            LaneStatus::Busy => "BUSY",
            LaneStatus::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for LaneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LaneStatus {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(LaneStatus::Open),
            "BUSY" => Ok(LaneStatus::Busy),
            "CLOSED" => Ok(LaneStatus::Closed),
            other => Err(GateError::invalid(format!(
                "unknown lane status '{other}'; expected OPEN | BUSY | CLOSED"
            ))),
        }
    }
}

/// A physical gate channel.
///
/// Invariants (maintained by `cg-lanes`, never by callers):
/// - `current_load <= capacity_per_minute`
/// - `status == Busy` implies `current_load == capacity_per_minute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneId,
    pub number: u32,
    pub capacity_per_minute: u32,
    pub current_load: u32,
    pub status: LaneStatus,
}

impl Lane {
    /// A freshly created lane: OPEN, no load.
    pub fn new(id: LaneId, number: u32, capacity_per_minute: u32) -> Self {
        Self {
            id,
            number,
            capacity_per_minute,
            current_load: 0,
            status: LaneStatus::Open,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.current_load < self.capacity_per_minute
    }

    /// OPEN with headroom: the first-fit admission predicate.
    pub fn is_available(&self) -> bool {
        self.status == LaneStatus::Open && self.has_capacity()
    }
}

impl Entity for Lane {
    const NAME: &'static str = "GateLane";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

// ---------------------------------------------------------------------------
// Pass enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassDirection {
    Entry,
    Exit,
}

/// Lifecycle status of a gate pass. See `cg-pass` for the legal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassStatus {
    Pending,
    Approved,
    /// **Terminal.**
    Denied,
    /// **Terminal.**
    Completed,
}

impl PassStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PassStatus::Denied | PassStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PassStatus::Pending => "PENDING",
            PassStatus::Approved => "APPROVED",
            PassStatus::Denied => "DENIED",
            PassStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for PassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PassStatus {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(PassStatus::Pending),
            "APPROVED" => Ok(PassStatus::Approved),
            "DENIED" => Ok(PassStatus::Denied),
            "COMPLETED" => Ok(PassStatus::Completed),
            other => Err(GateError::invalid(format!(
                "unknown pass status '{other}'; expected PENDING | APPROVED | DENIED | COMPLETED"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

/// A registered resident vehicle as the traffic core sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub plate_number: String,
    /// Free-form owner reference (unit number, resident name). Not validated here.
    pub owner: Option<String>,
    /// Entry permission. Exit is always permitted for a known vehicle.
    pub allowed: bool,
}

impl Entity for VehicleRecord {
    const NAME: &'static str = "Vehicle";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

// ---------------------------------------------------------------------------
// Visit reservation
// ---------------------------------------------------------------------------

/// A booked visitor slot. The plate does not need to be a registered vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitReservation {
    pub id: ReservationId,
    pub visitor_name: String,
    pub vehicle_plate: String,
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub passengers: u8,
    /// One-way flag; reservations are never physically deleted.
    #[serde(default)]
    pub cancelled: bool,
}

impl VisitReservation {
    /// `visit_date` combined with `visit_time`.
    pub fn visit_at(&self) -> NaiveDateTime {
        self.visit_date.and_time(self.visit_time)
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled
    }
}

impl Entity for VisitReservation {
    const NAME: &'static str = "VisitReservation";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}
