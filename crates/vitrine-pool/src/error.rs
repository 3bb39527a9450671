//! Pool-specific error types.

use thiserror::Error;

use vitrine_types::{ComponentKind, DiagnosticError, ErrorKind, VitrineError};

/// Errors from the instance pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No factory registered for the requested kind.
    #[error("no component factory registered for kind '{kind}'")]
    UnknownKind { kind: ComponentKind },
    /// A factory for this kind already exists.
    #[error("a component factory for kind '{kind}' is already registered")]
    AlreadyRegistered { kind: ComponentKind },
    /// Non-blocking checkout found no free permit.
    #[error("instance pool exhausted (all {capacity} permits leased)")]
    Exhausted { capacity: usize },
    /// Bounded checkout elapsed before a permit freed up.
    #[error("timed out after {waited_ms}ms waiting for an instance of '{kind}'")]
    CheckoutTimeout {
        kind: ComponentKind,
        waited_ms: u64,
    },
    /// The pool refuses further checkouts.
    #[error("instance pool is closed")]
    Closed,
    /// The component factory failed on both attempts.
    #[error("factory for kind '{kind}' failed after {attempts} attempts: {reason}")]
    Build {
        kind: ComponentKind,
        attempts: u32,
        reason: String,
    },
    /// Pool configuration error.
    #[error("pool configuration error: {0}")]
    Config(String),
}

impl From<PoolError> for VitrineError {
    fn from(e: PoolError) -> Self {
        let kind = match &e {
            PoolError::UnknownKind { .. } => ErrorKind::NotFound,
            PoolError::AlreadyRegistered { .. } => ErrorKind::InvalidInput,
            PoolError::Exhausted { .. } => ErrorKind::ResourceExhausted,
            PoolError::CheckoutTimeout { .. } => ErrorKind::Timeout,
            PoolError::Closed => ErrorKind::Unavailable,
            PoolError::Build { .. } => ErrorKind::Internal,
            PoolError::Config(_) => ErrorKind::InvalidInput,
        };
        VitrineError::new(kind, e.to_string())
    }
}

impl DiagnosticError for PoolError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::UnknownKind { kind } => Some(format!(
                "No factory for '{kind}' was registered with this pool."
            )),
            Self::AlreadyRegistered { .. } => {
                Some("Each component kind can have exactly one factory.".into())
            }
            Self::Exhausted { capacity } => Some(format!(
                "All {capacity} pool slots are leased by live document views."
            )),
            Self::CheckoutTimeout { waited_ms, .. } => Some(format!(
                "No lease was returned within the {waited_ms}ms wait window."
            )),
            Self::Closed => {
                Some("The pool was shut down; no further checkouts are possible.".into())
            }
            Self::Build { .. } => {
                Some("The component factory returned an error twice in a row.".into())
            }
            Self::Config(_) => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::UnknownKind { .. } => {
                Some("Register the kind at startup: pool.register(kind, factory)".into())
            }
            Self::AlreadyRegistered { .. } => {
                Some("Register each component kind once, before any checkout.".into())
            }
            Self::Exhausted { .. } | Self::CheckoutTimeout { .. } => Some(
                "Increase the pool capacity in vitrine.toml:\n  [pool]\n  capacity = 8".into(),
            ),
            Self::Closed => {
                Some("Check the host shutdown ordering; create a new pool if needed.".into())
            }
            Self::Build { .. } => Some(
                "Check the factory's host resources (data files, native libraries).".into(),
            ),
            Self::Config(_) => Some("Use a capacity of at least 1.".into()),
        }
    }
}
