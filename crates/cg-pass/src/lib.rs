//! cg-pass
//!
//! The gate pass record and the state machine that owns its status.
//!
//! Lane load is not touched here. [`GatePass::apply`] reports the
//! [`LaneEffect`] a successful transition implies and the caller applies it
//! under the same lock as the pass write.

mod lifecycle;

pub use lifecycle::{GatePass, LaneEffect, PassEvent, PassVehicle, TransitionError};
