//! The module contains the errors the engine can throw.
//!
//! Every rejected operation maps to exactly one [`EngineError`] variant, and
//! every variant belongs to one [`ErrorKind`] of the taxonomy the HTTP layer
//! understands:
//!
//! - [`Validation`] bad input shape or range.
//! - [`PreconditionFailed`] state machine or role violation.
//! - [`NotFound`] unknown user, balance or request.
//! - [`Conflict`] a conditional update lost a race; refresh and retry.
//! - [`Internal`] store failure.
//!
//!  [`Validation`]: ErrorKind::Validation
//!  [`PreconditionFailed`]: ErrorKind::PreconditionFailed
//!  [`NotFound`]: ErrorKind::NotFound
//!  [`Conflict`]: ErrorKind::Conflict
//!  [`Internal`]: ErrorKind::Internal
use sea_orm::DbErr;
use thiserror::Error;

/// Coarse classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    PreconditionFailed,
    NotFound,
    Conflict,
    Internal,
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
    #[error("Invalid rating: {0} (expected 1 to 5)")]
    InvalidRating(i32),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("You have reached the maximum number of pending requests ({0})")]
    TooManyPending(u64),
    #[error("Request is not pending")]
    NotPending,
    #[error("Request is not accepted")]
    NotAccepted,
    #[error("You cannot accept your own request")]
    SelfAccept,
    #[error("You must be an active fairy to accept requests")]
    FairyInactive,
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Amount exceeds the fairy max transaction amount: {0}")]
    ExceedsMaxAmount(String),
    #[error("Only the requestor can do this")]
    NotOwner,
    #[error("Only the fairy who accepted the request can do this")]
    NotFairy,
    #[error("The {0} has already confirmed this request")]
    AlreadyConfirmed(String),
    #[error("Weekly budget exceeded: {0}")]
    BudgetExceeded(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_)
            | Self::InvalidLocation(_)
            | Self::InvalidRating(_)
            | Self::InvalidInput(_)
            | Self::ExistingKey(_) => ErrorKind::Validation,
            Self::TooManyPending(_)
            | Self::NotPending
            | Self::NotAccepted
            | Self::SelfAccept
            | Self::FairyInactive
            | Self::InsufficientFunds(_)
            | Self::ExceedsMaxAmount(_)
            | Self::NotOwner
            | Self::NotFairy
            | Self::AlreadyConfirmed(_)
            | Self::BudgetExceeded(_) => ErrorKind::PreconditionFailed,
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Returns `true` when the caller has the wrong role for the operation
    /// rather than the target being in the wrong state.
    pub fn is_role_violation(&self) -> bool {
        matches!(self, Self::NotOwner | Self::NotFairy | Self::FairyInactive)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidLocation(a), Self::InvalidLocation(b)) => a == b,
            (Self::InvalidRating(a), Self::InvalidRating(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::TooManyPending(a), Self::TooManyPending(b)) => a == b,
            (Self::NotPending, Self::NotPending) => true,
            (Self::NotAccepted, Self::NotAccepted) => true,
            (Self::SelfAccept, Self::SelfAccept) => true,
            (Self::FairyInactive, Self::FairyInactive) => true,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::ExceedsMaxAmount(a), Self::ExceedsMaxAmount(b)) => a == b,
            (Self::NotOwner, Self::NotOwner) => true,
            (Self::NotFairy, Self::NotFairy) => true,
            (Self::AlreadyConfirmed(a), Self::AlreadyConfirmed(b)) => a == b,
            (Self::BudgetExceeded(a), Self::BudgetExceeded(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_violations_are_preconditions() {
        assert_eq!(EngineError::NotPending.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(EngineError::SelfAccept.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(
            EngineError::AlreadyConfirmed("fairy".to_string()).kind(),
            ErrorKind::PreconditionFailed
        );
    }

    #[test]
    fn bad_input_is_validation() {
        assert_eq!(EngineError::InvalidRating(6).kind(), ErrorKind::Validation);
        assert_eq!(
            EngineError::InvalidLocation("Mars".to_string()).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn lost_race_is_conflict_and_store_failure_is_internal() {
        assert_eq!(
            EngineError::Conflict("request no longer pending".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::Database(DbErr::Custom("boom".to_string())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn role_violations_are_flagged() {
        assert!(EngineError::NotOwner.is_role_violation());
        assert!(EngineError::FairyInactive.is_role_violation());
        assert!(!EngineError::NotPending.is_role_violation());
    }
}
