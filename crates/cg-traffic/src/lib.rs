//! cg-traffic
//!
//! The admission authority for one compound. Turns entry, exit and visitor
//! requests into gate passes and drives approve/deny/complete while keeping
//! lane load consistent.
//!
//! # Design
//!
//! ```text
//!   request_entry / request_exit / request_visitor_entry
//!        │
//!        ├─ VehicleDirectory / ReservationDirectory  (read-only lookups)
//!        ├─ Clock                                    (now, for the window check)
//!        ▼
//!   ┌──────────────── write lock ────────────────┐
//!   │ LaneCapacityManager   ◄── LaneEffect ──┐   │
//!   │ pass store ── GatePass::apply(event) ──┘   │
//!   └────────────────────────────────────────────┘
//!        │
//!        ▼
//!   GateObserver (audit journal, event bus), still under the lock
//! ```
//!
//! # Invariants
//!
//! - Lane state and the pass store live behind one lock. "Pick a lane and
//!   create a pass" and "transition a pass and apply its lane effect" each
//!   run as one critical section, so no lane is over-admitted.
//! - A failed call leaves lanes and passes exactly as they were.
//! - Queries clone a consistent snapshot under the read lock.

mod clock;
mod coordinator;
mod directory;
mod vehicles;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{GateObserver, PassAction, PassChange, TrafficCoordinator};
pub use directory::{ReservationDirectory, VehicleDirectory};
pub use vehicles::{NewVehicle, VehicleBook};
