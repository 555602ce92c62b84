//! Request handling: normalization, the cache orchestrator and the wire envelopes.

pub mod error;
pub mod orchestrator;
pub mod request;
pub mod response;
#[cfg(test)]
pub mod testing;

pub use error::ServiceError;
pub use orchestrator::CacheOrchestrator;
pub use request::{Identity, LookupQuery, PerformanceRequest};
pub use response::{ErrorEnvelope, PerformanceEnvelope};
