//! Error kinds surfaced to callers and their wire codes.

use crate::beatmaps::{FetchError, ResolveError};
use crate::difficulty::CalcError;

#[derive(Debug)]
pub enum ServiceError {
    /// Missing identifiers or undecodable input. No side effects.
    MalformedRequest(String),
    /// `GET /pp` found no record.
    NotFound(String),
    /// The hash → id lookup failed or returned nothing.
    ResolutionFailed(String),
    /// The beatmap origin failed.
    FetchFailed(String),
    /// The beatmap directory could not be written.
    PathUnwritable(String),
    /// The calculator rejected the map or produced no value.
    ComputeFailed(String),
    /// More than one record matched a single identifier.
    IntegrityViolation(String),
    /// The record store failed.
    StoreUnavailable(String),
    /// The request did not finish within the server's deadline.
    Timeout,
}

impl ServiceError {
    /// Machine-readable code, also used as the HTTP status.
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::MalformedRequest(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::ResolutionFailed(_) => 422,
            ServiceError::FetchFailed(_) => 502,
            ServiceError::PathUnwritable(_)
            | ServiceError::ComputeFailed(_)
            | ServiceError::IntegrityViolation(_) => 500,
            ServiceError::StoreUnavailable(_) => 503,
            ServiceError::Timeout => 504,
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            ServiceError::NotFound(what) => write!(f, "Beatmap not found: {}", what),
            ServiceError::ResolutionFailed(msg) => {
                write!(f, "Could not resolve beatmap id: {}", msg)
            }
            ServiceError::FetchFailed(msg) => write!(f, "Could not download beatmap: {}", msg),
            ServiceError::PathUnwritable(msg) => write!(f, "Could not store beatmap: {}", msg),
            ServiceError::ComputeFailed(msg) => {
                write!(f, "Could not calculate performance: {}", msg)
            }
            ServiceError::IntegrityViolation(msg) => write!(f, "Inconsistent records: {}", msg),
            // Store details stay in the logs.
            ServiceError::StoreUnavailable(_) => write!(f, "Database unavailable"),
            ServiceError::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        log::error!("STORE: {}", e);
        ServiceError::StoreUnavailable(e.to_string())
    }
}

impl From<ResolveError> for ServiceError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Store(e) => e.into(),
            ResolveError::Lookup(e) => ServiceError::ResolutionFailed(e.to_string()),
        }
    }
}

impl From<FetchError> for ServiceError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Origin(msg) => ServiceError::FetchFailed(msg),
            FetchError::Unwritable(msg) => ServiceError::PathUnwritable(msg),
        }
    }
}

impl From<CalcError> for ServiceError {
    fn from(e: CalcError) -> Self {
        ServiceError::ComputeFailed(e.to_string())
    }
}
