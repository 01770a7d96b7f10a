//! Single error vocabulary crossing every component boundary (SPEC_FULL.md §7, §4.12).
//!
//! Nothing downstream of the storage layer matches on driver-specific error
//! types; every fallible operation in this crate returns `CoreError`. The
//! HTTP layer (in the `imagedesc-server` crate) is the only place a variant
//! is translated into a status code and response body.

use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("consent required")]
    ConsentRequired,

    #[error("payment required")]
    PaymentRequired,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("unsupported media type")]
    UnsupportedMediaType,

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The correlation id in the matching `error!` trace event and
    /// `X-Correlation-Id` response header is the real per-request id minted
    /// by `imagedesc-server`'s correlation middleware, not carried here —
    /// this crate has no access to that request-scoped value, so the
    /// variant only carries what it can actually know (§4.9, §4.13).
    #[error("internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },

    #[error("service unavailable")]
    ServiceUnavailable,
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CoreError::Conflict(msg.into())
    }

    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        CoreError::Internal { source: source.into() }
    }
}

/// Storage errors are never propagated as raw `sqlx::Error` above C1; callers
/// wrap them here, preserving the distinction between "the data says no"
/// (NotFound, handled upstream already), "the database itself is unreachable
/// right now, try again" (ServiceUnavailable, per §7 recovery policy), and
/// "something this crate doesn't know how to classify happened" (Internal).
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound("record"),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_) => CoreError::ServiceUnavailable,
            other => CoreError::Internal { source: anyhow::Error::new(other) },
        }
    }
}
