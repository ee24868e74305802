use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cg_schemas::{GateError, ReservationId, VisitReservation};
use cg_store::{EntityStore, InMemoryStore};
use cg_validation::{
    validate_future_date, validate_not_empty, validate_passengers, validate_plate_number,
    validate_visit_time,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::info;

use crate::window::{is_valid_for_access, AccessWindow};

/// Booking request as it arrives from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReservation {
    /// `0` lets the book assign one.
    #[serde(default)]
    pub id: ReservationId,
    pub visitor_name: String,
    pub vehicle_plate: String,
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub passengers: i64,
}

/// Thread-safe reservation store with the booking rules applied.
#[derive(Debug, Default)]
pub struct ReservationBook {
    window: AccessWindow,
    rows: RwLock<InMemoryStore<VisitReservation>>,
}

impl ReservationBook {
    pub fn new(window: AccessWindow) -> Self {
        Self {
            window,
            rows: RwLock::new(InMemoryStore::new()),
        }
    }

    pub fn window(&self) -> AccessWindow {
        self.window
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryStore<VisitReservation>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryStore<VisitReservation>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Book a visit.
    ///
    /// # Errors
    /// - `InvalidArgument`: empty name, bad plate, passengers outside 1..=10,
    ///   time outside 06:00..=22:00, date not strictly after `today`.
    /// - `Conflict`: the plate already has an active reservation that date,
    ///   or an explicit id is taken.
    pub fn create_reservation(
        &self,
        req: NewReservation,
        today: NaiveDate,
    ) -> Result<VisitReservation, GateError> {
        validate_not_empty(&req.visitor_name, "visitor name")?;
        validate_plate_number(&req.vehicle_plate)?;
        let passengers = validate_passengers(req.passengers)?;
        validate_visit_time(req.visit_time)?;
        validate_future_date(req.visit_date, today, "visit date")?;

        let mut rows = self.write();

        let taken = rows
            .find_one_by(|r| {
                r.is_active()
                    && r.visit_date == req.visit_date
                    && r.vehicle_plate.eq_ignore_ascii_case(&req.vehicle_plate)
            })
            .is_some();
        if taken {
            return Err(GateError::conflict(format!(
                "vehicle {} already has an active reservation on {}",
                req.vehicle_plate, req.visit_date
            )));
        }

        let saved = rows.save(VisitReservation {
            id: req.id,
            visitor_name: req.visitor_name.trim().to_string(),
            vehicle_plate: req.vehicle_plate,
            visit_date: req.visit_date,
            visit_time: req.visit_time,
            passengers,
            cancelled: false,
        })?;

        info!(
            reservation_id = saved.id,
            plate = %saved.vehicle_plate,
            visit_at = %saved.visit_at(),
            "reservation created"
        );
        Ok(saved)
    }

    /// Sets the one-way `cancelled` flag. Cancelling twice is not an error.
    pub fn cancel_reservation(&self, id: ReservationId) -> Result<VisitReservation, GateError> {
        let mut rows = self.write();
        let mut r = rows
            .find_by_id(id)
            .ok_or_else(|| GateError::not_found("VisitReservation", id))?;
        if r.cancelled {
            return Ok(r);
        }
        r.cancelled = true;
        let r = rows.update(r)?;
        info!(reservation_id = id, "reservation cancelled");
        Ok(r)
    }

    pub fn reservation(&self, id: ReservationId) -> Result<VisitReservation, GateError> {
        self.read()
            .find_by_id(id)
            .ok_or_else(|| GateError::not_found("VisitReservation", id))
    }

    pub fn all_reservations(&self) -> Vec<VisitReservation> {
        self.read().find_all()
    }

    pub fn active_reservations(&self) -> Vec<VisitReservation> {
        self.read().find_by(VisitReservation::is_active)
    }

    pub fn reservations_by_visitor(&self, name: &str) -> Vec<VisitReservation> {
        let name = name.trim();
        self.read()
            .find_by(|r| r.visitor_name.eq_ignore_ascii_case(name))
    }

    /// Lowest-id non-cancelled reservation for `plate`, any date.
    pub fn find_active_by_plate(&self, plate: &str) -> Option<VisitReservation> {
        self.read()
            .find_one_by(|r| r.is_active() && r.vehicle_plate.eq_ignore_ascii_case(plate))
    }

    /// `false` when the plate has no active reservation.
    pub fn validate_visitor_access(&self, plate: &str, now: NaiveDateTime) -> bool {
        self.find_active_by_plate(plate)
            .map(|r| is_valid_for_access(&r, now, self.window))
            .unwrap_or(false)
    }
}
