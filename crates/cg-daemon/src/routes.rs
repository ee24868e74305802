//! Axum router and all HTTP handlers for cg-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are thin: parse, call the gate, map errors.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use cg_pass::GatePass;
use cg_reservation::NewReservation;
use cg_schemas::{
    GateError, GateErrorKind, Lane, LaneId, LaneStatus, PassId, PassStatus, ReservationId,
    VehicleId, VehicleRecord, VisitReservation,
};
use cg_traffic::{Clock, NewVehicle};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::info;

use crate::{
    api_types::{
        AllowedRequest, ErrorResponse, HealthResponse, LaneListQuery, LaneRequest,
        LaneStatusRequest, PassQuery, ReservationQuery, TrafficCountResponse, TrafficQuery,
        UtilizationResponse, VehicleGateRequest, VisitorAccessQuery, VisitorAccessResponse,
        VisitorGateRequest,
    },
    state::{AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/stream", get(stream))
        // lanes
        .route("/v1/lanes", get(list_lanes).post(add_lane))
        .route("/v1/lanes/:id", get(get_lane).put(update_lane))
        .route("/v1/lanes/:id/status", post(set_lane_status))
        .route("/v1/lanes/:id/utilization", get(lane_utilization))
        .route("/v1/lanes/:id/traffic", get(lane_traffic))
        // gate requests
        .route("/v1/gate/entry", post(request_entry))
        .route("/v1/gate/exit", post(request_exit))
        .route("/v1/gate/visitor", post(request_visitor_entry))
        // passes
        .route("/v1/passes", get(list_passes))
        .route("/v1/passes/:id", get(get_pass))
        .route("/v1/passes/:id/approve", post(approve_pass))
        .route("/v1/passes/:id/deny", post(deny_pass))
        .route("/v1/passes/:id/complete", post(complete_pass))
        // vehicles
        .route("/v1/vehicles", get(list_vehicles).post(register_vehicle))
        .route("/v1/vehicles/:id", get(get_vehicle))
        .route("/v1/vehicles/:id/allowed", post(set_vehicle_allowed))
        // reservations
        .route(
            "/v1/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route("/v1/reservations/:id", get(get_reservation))
        .route("/v1/reservations/:id/cancel", post(cancel_reservation))
        .route("/v1/visitor-access", get(visitor_access))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// `GateError` as an HTTP response. The process never dies on one of these.
#[derive(Debug)]
pub struct ApiError(pub GateError);

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        ApiError(e)
    }
}

pub fn status_for(kind: GateErrorKind) -> StatusCode {
    match kind {
        GateErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        GateErrorKind::NotFound => StatusCode::NOT_FOUND,
        GateErrorKind::Conflict | GateErrorKind::IllegalTransition => StatusCode::CONFLICT,
        GateErrorKind::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        (
            status_for(kind),
            Json(ErrorResponse {
                error: self.0.to_string(),
                kind: kind.as_str().to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
            compound: st.compound.clone(),
            config_hash: st.config_hash.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Lanes
// ---------------------------------------------------------------------------

pub(crate) async fn list_lanes(
    State(st): State<Arc<AppState>>,
    Query(q): Query<LaneListQuery>,
) -> Json<Vec<Lane>> {
    if q.available {
        Json(st.gate.available_lanes())
    } else {
        Json(st.gate.all_lanes())
    }
}

pub(crate) async fn add_lane(
    State(st): State<Arc<AppState>>,
    Json(req): Json<LaneRequest>,
) -> ApiResult<(StatusCode, Json<Lane>)> {
    let lane = st
        .gate
        .add_lane(req.id, req.number, req.capacity_per_minute)?;
    Ok((StatusCode::CREATED, Json(lane)))
}

pub(crate) async fn get_lane(
    State(st): State<Arc<AppState>>,
    Path(id): Path<LaneId>,
) -> ApiResult<Json<Lane>> {
    Ok(Json(st.gate.lane(id)?))
}

pub(crate) async fn update_lane(
    State(st): State<Arc<AppState>>,
    Path(id): Path<LaneId>,
    Json(req): Json<LaneRequest>,
) -> ApiResult<Json<Lane>> {
    let lane = st
        .gate
        .update_lane(id, req.number, req.capacity_per_minute)?;
    Ok(Json(lane))
}

pub(crate) async fn set_lane_status(
    State(st): State<Arc<AppState>>,
    Path(id): Path<LaneId>,
    Json(req): Json<LaneStatusRequest>,
) -> ApiResult<Json<Lane>> {
    let status: LaneStatus = req.status.parse()?;
    let lane = st.gate.set_lane_status(id, status)?;
    info!(lane_id = id, %status, "lanes/status");
    Ok(Json(lane))
}

pub(crate) async fn lane_utilization(
    State(st): State<Arc<AppState>>,
    Path(id): Path<LaneId>,
) -> ApiResult<Json<UtilizationResponse>> {
    Ok(Json(UtilizationResponse {
        lane_id: id,
        utilization_percent: st.gate.utilization(id)?,
    }))
}

pub(crate) async fn lane_traffic(
    State(st): State<Arc<AppState>>,
    Path(id): Path<LaneId>,
    Query(q): Query<TrafficQuery>,
) -> ApiResult<Json<TrafficCountResponse>> {
    let count = st.gate.traffic_count_in_window(id, q.start, q.end)?;
    Ok(Json(TrafficCountResponse {
        lane_id: id,
        start: q.start,
        end: q.end,
        count,
    }))
}

// ---------------------------------------------------------------------------
// Gate requests
// ---------------------------------------------------------------------------

pub(crate) async fn request_entry(
    State(st): State<Arc<AppState>>,
    Json(req): Json<VehicleGateRequest>,
) -> ApiResult<(StatusCode, Json<GatePass>)> {
    let pass = st.gate.request_entry(req.vehicle_id)?;
    Ok((StatusCode::CREATED, Json(pass)))
}

pub(crate) async fn request_exit(
    State(st): State<Arc<AppState>>,
    Json(req): Json<VehicleGateRequest>,
) -> ApiResult<(StatusCode, Json<GatePass>)> {
    let pass = st.gate.request_exit(req.vehicle_id)?;
    Ok((StatusCode::CREATED, Json(pass)))
}

pub(crate) async fn request_visitor_entry(
    State(st): State<Arc<AppState>>,
    Json(req): Json<VisitorGateRequest>,
) -> ApiResult<(StatusCode, Json<GatePass>)> {
    let pass = st.gate.request_visitor_entry(&req.plate_number)?;
    Ok((StatusCode::CREATED, Json(pass)))
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

pub(crate) async fn list_passes(
    State(st): State<Arc<AppState>>,
    Query(q): Query<PassQuery>,
) -> ApiResult<Json<Vec<GatePass>>> {
    let status = q
        .status
        .as_deref()
        .map(str::parse::<PassStatus>)
        .transpose()?;

    // Start from the narrowest indexed query, then apply the remaining filters.
    let mut passes = match (q.vehicle_id, q.lane_id, status) {
        (Some(v), _, _) => st.gate.passes_by_vehicle(v),
        (None, Some(l), _) => st.gate.passes_by_lane(l),
        (None, None, Some(s)) => st.gate.passes_by_status(s),
        (None, None, None) => st.gate.all_passes(),
    };
    passes.retain(|p| {
        q.lane_id.map_or(true, |l| p.lane_id == l) && status.map_or(true, |s| p.status() == s)
    });

    Ok(Json(passes))
}

pub(crate) async fn get_pass(
    State(st): State<Arc<AppState>>,
    Path(id): Path<PassId>,
) -> ApiResult<Json<GatePass>> {
    Ok(Json(st.gate.pass(id)?))
}

pub(crate) async fn approve_pass(
    State(st): State<Arc<AppState>>,
    Path(id): Path<PassId>,
) -> ApiResult<Json<GatePass>> {
    Ok(Json(st.gate.approve_pass(id)?))
}

pub(crate) async fn deny_pass(
    State(st): State<Arc<AppState>>,
    Path(id): Path<PassId>,
) -> ApiResult<Json<GatePass>> {
    Ok(Json(st.gate.deny_pass(id)?))
}

pub(crate) async fn complete_pass(
    State(st): State<Arc<AppState>>,
    Path(id): Path<PassId>,
) -> ApiResult<Json<GatePass>> {
    Ok(Json(st.gate.complete_pass(id)?))
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

pub(crate) async fn list_vehicles(State(st): State<Arc<AppState>>) -> Json<Vec<VehicleRecord>> {
    Json(st.vehicles.all_vehicles())
}

pub(crate) async fn register_vehicle(
    State(st): State<Arc<AppState>>,
    Json(req): Json<NewVehicle>,
) -> ApiResult<(StatusCode, Json<VehicleRecord>)> {
    let v = st.vehicles.register_vehicle(req)?;
    Ok((StatusCode::CREATED, Json(v)))
}

pub(crate) async fn get_vehicle(
    State(st): State<Arc<AppState>>,
    Path(id): Path<VehicleId>,
) -> ApiResult<Json<VehicleRecord>> {
    Ok(Json(st.vehicles.vehicle(id)?))
}

pub(crate) async fn set_vehicle_allowed(
    State(st): State<Arc<AppState>>,
    Path(id): Path<VehicleId>,
    Json(req): Json<AllowedRequest>,
) -> ApiResult<Json<VehicleRecord>> {
    Ok(Json(st.vehicles.set_allowed(id, req.allowed)?))
}

// ---------------------------------------------------------------------------
// Reservations
// ---------------------------------------------------------------------------

pub(crate) async fn list_reservations(
    State(st): State<Arc<AppState>>,
    Query(q): Query<ReservationQuery>,
) -> Json<Vec<VisitReservation>> {
    let mut rows = match &q.visitor {
        Some(name) => st.reservations.reservations_by_visitor(name),
        None if q.active => st.reservations.active_reservations(),
        None => st.reservations.all_reservations(),
    };
    if q.active {
        rows.retain(VisitReservation::is_active);
    }
    Json(rows)
}

pub(crate) async fn create_reservation(
    State(st): State<Arc<AppState>>,
    Json(req): Json<NewReservation>,
) -> ApiResult<(StatusCode, Json<VisitReservation>)> {
    let today = st.gate.clock().today();
    let r = st.reservations.create_reservation(req, today)?;
    Ok((StatusCode::CREATED, Json(r)))
}

pub(crate) async fn get_reservation(
    State(st): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
) -> ApiResult<Json<VisitReservation>> {
    Ok(Json(st.reservations.reservation(id)?))
}

pub(crate) async fn cancel_reservation(
    State(st): State<Arc<AppState>>,
    Path(id): Path<ReservationId>,
) -> ApiResult<Json<VisitReservation>> {
    Ok(Json(st.reservations.cancel_reservation(id)?))
}

pub(crate) async fn visitor_access(
    State(st): State<Arc<AppState>>,
    Query(q): Query<VisitorAccessQuery>,
) -> Json<VisitorAccessResponse> {
    let at = st.gate.clock().now();
    let allowed = st.reservations.validate_visitor_access(&q.plate, at);
    Json(VisitorAccessResponse {
        plate: q.plate,
        at,
        allowed,
    })
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(m.event_name()).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
