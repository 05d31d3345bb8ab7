/// Failures surfaced by the notification services. Store errors are logged
/// where they are caught and reduced to one of these generic kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authorization(String),

    #[error("notification not found")]
    NotFound,

    #[error("failed to load notifications")]
    Fetch,

    #[error("{0}")]
    Write(&'static str),

    #[error("request cancelled")]
    Cancelled,
}
