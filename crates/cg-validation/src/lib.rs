//! cg-validation
//!
//! Format validators applied before input reaches the admission core.
//! Every failure is `GateError::InvalidArgument`; callers propagate with `?`.
//!
//! Pure deterministic logic. Date checks take `today` from the caller so
//! nothing here reads the wall clock.

use std::sync::OnceLock;

use cg_schemas::GateError;
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

pub const EMAIL_PATTERN: &str = r"^[A-Za-z0-9+_.-]+@(.+)$";
pub const PHONE_PATTERN: &str = r"^\+?[0-9]{10,15}$";
/// Upper-case letters, digits and dashes, 3 to 15 characters.
pub const PLATE_PATTERN: &str = r"^[A-Z0-9-]{3,15}$";

pub const MIN_PASSENGERS: i64 = 1;
pub const MAX_PASSENGERS: i64 = 10;

/// Visits may be booked from 06:00 through 22:00 inclusive.
pub fn visit_window_open() -> NaiveTime {
    NaiveTime::default() + chrono::Duration::hours(6)
}

pub fn visit_window_close() -> NaiveTime {
    NaiveTime::default() + chrono::Duration::hours(22)
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static validator pattern must compile"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, EMAIL_PATTERN)
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, PHONE_PATTERN)
}

fn plate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, PLATE_PATTERN)
}

pub fn validate_not_empty(value: &str, field: &str) -> Result<(), GateError> {
    if value.trim().is_empty() {
        return Err(GateError::invalid(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), GateError> {
    if email.trim().is_empty() {
        return Err(GateError::invalid("email cannot be empty"));
    }
    if !email_re().is_match(email) {
        return Err(GateError::invalid("invalid email format"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), GateError> {
    if phone.trim().is_empty() {
        return Err(GateError::invalid("phone cannot be empty"));
    }
    if !phone_re().is_match(phone) {
        return Err(GateError::invalid("invalid phone number format"));
    }
    Ok(())
}

/// Plates are matched as given; lower-case input is rejected, not normalized.
pub fn validate_plate_number(plate: &str) -> Result<(), GateError> {
    if plate.trim().is_empty() {
        return Err(GateError::invalid("plate number cannot be empty"));
    }
    if !plate_re().is_match(plate) {
        return Err(GateError::invalid(format!("invalid plate number format '{plate}'")));
    }
    Ok(())
}

/// Strictly positive, returned as `u32` for storage.
pub fn validate_positive(value: i64, field: &str) -> Result<u32, GateError> {
    if value <= 0 {
        return Err(GateError::invalid(format!("{field} must be positive")));
    }
    u32::try_from(value).map_err(|_| GateError::invalid(format!("{field} is too large")))
}

pub fn validate_passengers(passengers: i64) -> Result<u8, GateError> {
    if passengers < MIN_PASSENGERS {
        return Err(GateError::invalid("number of passengers must be at least 1"));
    }
    if passengers > MAX_PASSENGERS {
        return Err(GateError::invalid("number of passengers cannot exceed 10"));
    }
    // Range-checked above.
    Ok(passengers as u8)
}

pub fn validate_visit_time(time: NaiveTime) -> Result<(), GateError> {
    if time < visit_window_open() || time > visit_window_close() {
        return Err(GateError::invalid("visit time must be between 06:00 and 22:00"));
    }
    Ok(())
}

/// `date` must be strictly after `today`.
pub fn validate_future_date(
    date: NaiveDate,
    today: NaiveDate,
    field: &str,
) -> Result<(), GateError> {
    if date <= today {
        return Err(GateError::invalid(format!("{field} must be in the future")));
    }
    Ok(())
}
