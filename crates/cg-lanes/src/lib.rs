//! cg-lanes
//!
//! Lane capacity model: owns lane state and decides admission and release
//! of load units.
//!
//! # Invariants
//!
//! - `0 <= current_load <= capacity_per_minute` for every lane, always.
//! - `status == BUSY` implies `current_load == capacity_per_minute`.
//! - Reaching capacity forces BUSY; dropping below capacity while BUSY forces
//!   OPEN. Operators cannot leave BUSY by hand.
//! - CLOSED is an operator status independent of load.
//!
//! # Selection policy
//!
//! [`LaneCapacityManager::available_lane`] is **first-fit**: the first lane in
//! store enumeration order (ascending id) that is OPEN with headroom. It is
//! not least-loaded and must not silently become so.
//!
//! Pure deterministic logic. No IO, no clock.

mod manager;

pub use manager::LaneCapacityManager;
