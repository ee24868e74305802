//! Error taxonomy shared by every admission component.
//!
//! Every failure is locally recoverable: the operation that returned it left
//! lane and pass state untouched. Presentation layers map [`GateErrorKind`]
//! to their own status codes and keep running.

use cg_store::StoreError;

/// Coarse classification of a [`GateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateErrorKind {
    /// Malformed input caught before business logic.
    InvalidArgument,
    /// Referenced entity id or plate does not exist.
    NotFound,
    /// Duplicate unique key (lane number, plate, id).
    Conflict,
    /// State-machine guard violated.
    IllegalTransition,
    /// Domain rule failure with no dedicated state.
    BusinessRule,
}

impl GateErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            GateErrorKind::NotFound => "NOT_FOUND",
            GateErrorKind::Conflict => "CONFLICT",
            GateErrorKind::IllegalTransition => "ILLEGAL_TRANSITION",
            GateErrorKind::BusinessRule => "BUSINESS_RULE_VIOLATION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    InvalidArgument(String),
    NotFound { entity: &'static str, key: String },
    Conflict(String),
    IllegalTransition(String),
    BusinessRule(String),
}

impl GateError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        GateError::InvalidArgument(msg.into())
    }

    pub fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        GateError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        GateError::Conflict(msg.into())
    }

    pub fn illegal(msg: impl Into<String>) -> Self {
        GateError::IllegalTransition(msg.into())
    }

    pub fn rule(msg: impl Into<String>) -> Self {
        GateError::BusinessRule(msg.into())
    }

    pub fn kind(&self) -> GateErrorKind {
        match self {
            GateError::InvalidArgument(_) => GateErrorKind::InvalidArgument,
            GateError::NotFound { .. } => GateErrorKind::NotFound,
            GateError::Conflict(_) => GateErrorKind::Conflict,
            GateError::IllegalTransition(_) => GateErrorKind::IllegalTransition,
            GateError::BusinessRule(_) => GateErrorKind::BusinessRule,
        }
    }
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateError::InvalidArgument(msg) => write!(f, "INVALID_ARGUMENT: {msg}"),
            GateError::NotFound { entity, key } => {
                write!(f, "NOT_FOUND: {entity} '{key}' not found")
            }
            GateError::Conflict(msg) => write!(f, "CONFLICT: {msg}"),
            GateError::IllegalTransition(msg) => write!(f, "ILLEGAL_TRANSITION: {msg}"),
            GateError::BusinessRule(msg) => write!(f, "BUSINESS_RULE_VIOLATION: {msg}"),
        }
    }
}

impl std::error::Error for GateError {}

impl From<StoreError> for GateError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateId { entity, id } => {
                GateError::conflict(format!("{entity} with id {id} already exists"))
            }
            StoreError::NotFound { entity, id } => GateError::not_found(entity, id),
        }
    }
}
