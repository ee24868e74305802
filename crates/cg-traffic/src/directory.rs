//! Read-only lookups the coordinator needs from outside the admission core.

use std::sync::Arc;

use cg_reservation::{AccessWindow, ReservationBook};
use cg_schemas::{VehicleId, VehicleRecord, VisitReservation};

pub trait VehicleDirectory: Send + Sync {
    fn find_vehicle(&self, id: VehicleId) -> Option<VehicleRecord>;
}

pub trait ReservationDirectory: Send + Sync {
    /// Lowest-id active reservation for `plate`, any date.
    fn find_active_by_plate(&self, plate: &str) -> Option<VisitReservation>;

    fn access_window(&self) -> AccessWindow {
        AccessWindow::default()
    }
}

impl ReservationDirectory for ReservationBook {
    fn find_active_by_plate(&self, plate: &str) -> Option<VisitReservation> {
        ReservationBook::find_active_by_plate(self, plate)
    }

    fn access_window(&self) -> AccessWindow {
        self.window()
    }
}

impl<T: VehicleDirectory + ?Sized> VehicleDirectory for Arc<T> {
    fn find_vehicle(&self, id: VehicleId) -> Option<VehicleRecord> {
        (**self).find_vehicle(id)
    }
}

impl<T: ReservationDirectory + ?Sized> ReservationDirectory for Arc<T> {
    fn find_active_by_plate(&self, plate: &str) -> Option<VisitReservation> {
        (**self).find_active_by_plate(plate)
    }

    fn access_window(&self) -> AccessWindow {
        (**self).access_window()
    }
}
