//! Candidate sources: trait, synthetic market, universe file, guards.

pub mod circuit_breaker;
pub mod guarded;
pub mod provider;
pub mod synthetic;
pub mod universe;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use guarded::GuardedSource;
pub use provider::{CandidateSource, DataError, DataSource, StaticSource};
pub use synthetic::SyntheticSource;
pub use universe::Universe;
