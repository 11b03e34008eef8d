//! Bounded-concurrency HTTP load generator.
//!
//! Issues a fixed number of GET requests against one endpoint, never more
//! than the configured number at once, retries each request on its own and
//! aggregates the terminal outcomes into a [`Report`].

pub mod cfg;
pub mod cmd;
pub mod engine;
pub mod logging;
pub mod report;
pub mod stat;

pub use self::{engine::run_load, report::Report};
