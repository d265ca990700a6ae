use ulid::Ulid;

use crate::model::Percent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Validation(ValidationError),
    Authorization(AuthorizationError),
    NotFound(NotFoundError),
    Unauthenticated,
    /// The per-engineer section was not acquired before the caller's deadline.
    /// Nothing was mutated.
    DeadlineExceeded,
    LimitExceeded(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidRange,
    InvalidAllocation(Percent),
    CapacityExceeded {
        peak: Percent,
        max_capacity: Percent,
        /// Existing assignments active at the peak instant.
        conflicting: Vec<Ulid>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    NotManager,
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundError {
    Engineer(Ulid),
    Project(Ulid),
    Assignment(Ulid),
}

impl EngineError {
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(ValidationError::CapacityExceeded { .. })
        )
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            EngineError::Validation(ValidationError::CapacityExceeded { .. }) => "capacity_exceeded",
            EngineError::Validation(_) => "invalid",
            EngineError::Authorization(_) => "forbidden",
            EngineError::NotFound(_) => "not_found",
            EngineError::Unauthenticated => "unauthenticated",
            EngineError::DeadlineExceeded => "deadline_exceeded",
            EngineError::LimitExceeded(_) => "limit_exceeded",
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        EngineError::Validation(e)
    }
}

impl From<AuthorizationError> for EngineError {
    fn from(e: AuthorizationError) -> Self {
        EngineError::Authorization(e)
    }
}

impl From<NotFoundError> for EngineError {
    fn from(e: NotFoundError) -> Self {
        EngineError::NotFound(e)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidRange => write!(f, "invalid range: start is after end"),
            ValidationError::InvalidAllocation(p) => {
                write!(f, "invalid allocation {p}%: must be between 1 and 100")
            }
            ValidationError::CapacityExceeded {
                peak,
                max_capacity,
                conflicting,
            } => {
                write!(
                    f,
                    "capacity exceeded: peak {peak}% over max {max_capacity}%; conflicts with {conflicting:?}"
                )
            }
        }
    }
}

impl std::fmt::Display for AuthorizationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorizationError::NotManager => write!(f, "only managers may do this"),
            AuthorizationError::NotOwner => {
                write!(f, "only a manager or the project owner may do this")
            }
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundError::Engineer(id) => write!(f, "engineer not found: {id}"),
            NotFoundError::Project(id) => write!(f, "project not found: {id}"),
            NotFoundError::Assignment(id) => write!(f, "assignment not found: {id}"),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(e) => write!(f, "validation error: {e}"),
            EngineError::Authorization(e) => write!(f, "forbidden: {e}"),
            EngineError::NotFound(e) => write!(f, "{e}"),
            EngineError::Unauthenticated => write!(f, "unauthenticated"),
            EngineError::DeadlineExceeded => {
                write!(f, "deadline expired before the engineer's ledger could be locked")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for ValidationError {}
impl std::error::Error for AuthorizationError {}
impl std::error::Error for NotFoundError {}
impl std::error::Error for EngineError {}
