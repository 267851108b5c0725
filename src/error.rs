use thiserror::Error;

/// User-facing input errors. The requested operation is aborted and no state
/// is changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("company name is required")]
    MissingCompanyName,

    #[error("no start point: live position unavailable")]
    NoLivePosition,

    #[error("start client {0} not found")]
    UnknownStartClient(String),

    #[error("select at least one client for the tour")]
    EmptySelection,

    #[error("client {0} not found")]
    UnknownClient(String),

    #[error("tour {0} not found")]
    UnknownTour(String),

    #[error("amount must be a positive number")]
    InvalidAmount,

    #[error("destructive action requires confirmation")]
    NotConfirmed,
}
