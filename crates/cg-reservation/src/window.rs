use cg_schemas::{GateError, VisitReservation};
use chrono::{Duration, NaiveDateTime};

pub const DEFAULT_WINDOW_MINUTES: i64 = 30;

/// Half-width of the access interval around a booked visit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessWindow {
    half_width: Duration,
}

impl Default for AccessWindow {
    fn default() -> Self {
        Self {
            half_width: Duration::minutes(DEFAULT_WINDOW_MINUTES),
        }
    }
}

impl AccessWindow {
    pub fn minutes(minutes: i64) -> Result<Self, GateError> {
        if minutes <= 0 {
            return Err(GateError::invalid("reservation window minutes must be positive"));
        }
        Ok(Self {
            half_width: Duration::minutes(minutes),
        })
    }

    pub fn half_width_minutes(&self) -> i64 {
        self.half_width.num_minutes()
    }

    /// Closed interval `[visit_at - w, visit_at + w]`.
    pub fn contains(&self, visit_at: NaiveDateTime, now: NaiveDateTime) -> bool {
        now >= visit_at - self.half_width && now <= visit_at + self.half_width
    }
}

/// Pure predicate: not cancelled and `now` inside the window.
pub fn is_valid_for_access(
    reservation: &VisitReservation,
    now: NaiveDateTime,
    window: AccessWindow,
) -> bool {
    !reservation.cancelled && window.contains(reservation.visit_at(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn reservation_at(h: u32, m: u32) -> VisitReservation {
        VisitReservation {
            id: 1,
            visitor_name: "Dana".into(),
            vehicle_plate: "VIS-001".into(),
            visit_date: NaiveDate::from_ymd_opt(2026, 6, 2).unwrap(),
            visit_time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
            passengers: 2,
            cancelled: false,
        }
    }

    fn on_visit_day(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn window_is_closed_on_both_ends() {
        let r = reservation_at(14, 0);
        let w = AccessWindow::default();
        assert!(is_valid_for_access(&r, on_visit_day(13, 30, 0), w));
        assert!(is_valid_for_access(&r, on_visit_day(14, 0, 0), w));
        assert!(is_valid_for_access(&r, on_visit_day(14, 30, 0), w));
        assert!(!is_valid_for_access(&r, on_visit_day(13, 29, 59), w));
        assert!(!is_valid_for_access(&r, on_visit_day(14, 30, 1), w));
    }

    #[test]
    fn cancelled_reservation_is_never_valid() {
        let mut r = reservation_at(14, 0);
        r.cancelled = true;
        let w = AccessWindow::default();
        for t in [
            on_visit_day(13, 30, 0),
            on_visit_day(14, 0, 0),
            on_visit_day(14, 30, 0),
        ] {
            assert!(!is_valid_for_access(&r, t, w));
        }
    }

    #[test]
    fn window_crosses_midnight() {
        // 06:00 is the earliest bookable time, but the predicate itself is date-aware.
        let mut r = reservation_at(0, 10);
        r.visit_date = NaiveDate::from_ymd_opt(2026, 6, 3).unwrap();
        assert!(is_valid_for_access(&r, on_visit_day(23, 45, 0), AccessWindow::default()));
    }

    #[test]
    fn custom_width_and_rejects_non_positive() {
        let r = reservation_at(14, 0);
        let w = AccessWindow::minutes(10).unwrap();
        assert_eq!(w.half_width_minutes(), 10);
        assert!(is_valid_for_access(&r, on_visit_day(13, 50, 0), w));
        assert!(!is_valid_for_access(&r, on_visit_day(13, 49, 59), w));
        assert!(AccessWindow::minutes(0).is_err());
    }
}
