//! cg-reservation
//!
//! Visitor reservations: the access-window predicate and the book that
//! creates, cancels and looks reservations up.
//!
//! # Invariants
//!
//! - At most one active (non-cancelled) reservation per plate per date.
//!   Plates compare case-insensitively.
//! - `cancelled` is one-way. Reservations are never deleted.
//! - Access is valid iff not cancelled and `now` lies in
//!   `[visit_at - window, visit_at + window]`, both ends inclusive.

mod book;
mod window;

pub use book::{NewReservation, ReservationBook};
pub use window::{is_valid_for_access, AccessWindow, DEFAULT_WINDOW_MINUTES};
