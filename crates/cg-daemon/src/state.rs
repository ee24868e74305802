//! Shared runtime state for cg-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The admission core is
//! synchronous; handlers call it directly since every call is a short
//! in-memory critical section.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use cg_audit::AuditJournal;
use cg_config::CompoundConfig;
use cg_reservation::{AccessWindow, ReservationBook};
use cg_schemas::Lane;
use cg_traffic::{Clock, GateObserver, PassChange, SystemClock, TrafficCoordinator, VehicleBook};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// The coordinator as the daemon wires it.
pub type Gate = TrafficCoordinator<Arc<VehicleBook>, Arc<ReservationBook>, Arc<dyn Clock>>;

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Pass(PassChange),
    Lane(Lane),
    LogLine { level: String, msg: String },
}

impl BusMsg {
    pub fn event_name(&self) -> &'static str {
        match self {
            BusMsg::Heartbeat { .. } => "heartbeat",
            BusMsg::Pass(_) => "pass",
            BusMsg::Lane(_) => "lane",
            BusMsg::LogLine { .. } => "log",
        }
    }
}

// ---------------------------------------------------------------------------
// GateEvents: fan-out of committed changes
// ---------------------------------------------------------------------------

/// Publishes committed changes to the SSE bus and, when configured, the
/// pass journal. Runs under the coordinator's write lock, so journal order
/// is commit order.
struct GateEvents {
    bus: broadcast::Sender<BusMsg>,
    journal: Option<Mutex<AuditJournal>>,
}

impl GateObserver for GateEvents {
    fn pass_changed(&self, change: &PassChange) {
        if let Some(journal) = &self.journal {
            let event_type = format!("PASS_{}", action_name(change));
            let written = serde_json::to_value(change)
                .context("serialize pass change")
                .and_then(|payload| {
                    journal
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .append("pass", &event_type, payload)
                });
            if let Err(e) = written {
                warn!(
                    pass_id = change.pass.id,
                    error = %format!("{e:#}"),
                    "journal append failed"
                );
                let _ = self.bus.send(BusMsg::LogLine {
                    level: "ERROR".to_string(),
                    msg: format!("journal append failed for pass {}", change.pass.id),
                });
            }
        }
        // No subscribers is not an error.
        let _ = self.bus.send(BusMsg::Pass(change.clone()));
    }

    fn lane_changed(&self, lane: &Lane) {
        let _ = self.bus.send(BusMsg::Lane(lane.clone()));
    }
}

fn action_name(change: &PassChange) -> String {
    serde_json::to_value(change.action)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", change.action).to_ascii_uppercase())
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub compound: String,
    /// Hash of the merged config the daemon booted with, if any.
    pub config_hash: Option<String>,
    pub vehicles: Arc<VehicleBook>,
    pub reservations: Arc<ReservationBook>,
    pub gate: Gate,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Default config, wall clock, no lanes, no journal.
    pub fn new() -> Self {
        Self::assemble(
            &CompoundConfig::default(),
            None,
            Arc::new(SystemClock),
            AccessWindow::default(),
            None,
        )
    }

    /// Boot from typed config: open the journal, build the gate, seed lanes
    /// in list order.
    pub fn from_config(
        cfg: &CompoundConfig,
        config_hash: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let minutes = cfg.reservation_window_minutes;
        let window = AccessWindow::minutes(minutes).context("reservation.window_minutes")?;

        let journal = match &cfg.audit_journal_path {
            None => None,
            Some(path) => {
                let j = AuditJournal::open(path)
                    .with_context(|| format!("open pass journal {path:?}"))?;
                info!(path = ?j.path(), seq = j.seq(), "pass journal opened");
                Some(j)
            }
        };

        let st = Self::assemble(cfg, config_hash, clock, window, journal);

        for (i, seed) in cfg.lanes.iter().enumerate() {
            st.gate
                .add_lane(0, seed.number, seed.capacity_per_minute)
                .with_context(|| format!("seed lanes[{i}] (number {})", seed.number))?;
        }
        info!(compound = %st.compound, lanes = cfg.lanes.len(), "gate ready");

        Ok(st)
    }

    fn assemble(
        cfg: &CompoundConfig,
        config_hash: Option<String>,
        clock: Arc<dyn Clock>,
        window: AccessWindow,
        journal: Option<AuditJournal>,
    ) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        let vehicles = Arc::new(VehicleBook::new());
        let reservations = Arc::new(ReservationBook::new(window));
        let events = Arc::new(GateEvents {
            bus: bus.clone(),
            journal: journal.map(Mutex::new),
        });
        let gate = TrafficCoordinator::new(vehicles.clone(), reservations.clone(), clock)
            .with_observer(events);

        Self {
            bus,
            build: BuildInfo {
                service: "cg-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            compound: cfg.name.clone(),
            config_hash,
            vehicles,
            reservations,
            gate,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
