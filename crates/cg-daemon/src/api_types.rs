//! Request and response types for cg-daemon HTTP endpoints.
//!
//! Domain records (`Lane`, `GatePass`, `VehicleRecord`, `VisitReservation`)
//! are returned as-is; only envelopes and inputs live here. No business logic.

use cg_schemas::{LaneId, VehicleId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub compound: String,
    pub config_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// INVALID_ARGUMENT | NOT_FOUND | CONFLICT | ILLEGAL_TRANSITION | BUSINESS_RULE_VIOLATION
    pub kind: String,
}

// ---------------------------------------------------------------------------
// Lanes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct LaneRequest {
    /// Ignored on update. `0` (default) lets the gate assign one.
    #[serde(default)]
    pub id: LaneId,
    pub number: i64,
    pub capacity_per_minute: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaneListQuery {
    /// Only OPEN lanes with headroom, first-fit order.
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LaneStatusRequest {
    /// OPEN | BUSY | CLOSED, case-insensitive.
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationResponse {
    pub lane_id: LaneId,
    pub utilization_percent: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrafficQuery {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficCountResponse {
    pub lane_id: LaneId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Gate requests and passes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleGateRequest {
    pub vehicle_id: VehicleId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitorGateRequest {
    pub plate_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PassQuery {
    /// PENDING | APPROVED | DENIED | COMPLETED
    pub status: Option<String>,
    pub lane_id: Option<LaneId>,
    pub vehicle_id: Option<VehicleId>,
}

// ---------------------------------------------------------------------------
// Vehicles and reservations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AllowedRequest {
    pub allowed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationQuery {
    pub visitor: Option<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitorAccessQuery {
    pub plate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitorAccessResponse {
    pub plate: String,
    pub at: NaiveDateTime,
    pub allowed: bool,
}
