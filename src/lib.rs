//! storefront-sw - offline caching and request routing for the storefront
//!
//! Pre-caches the storefront shell at install time, evicts caches left by
//! older versions at activation, and answers every intercepted fetch with
//! a network-first or cache-first strategy so pages keep working offline.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod network;
pub mod registry;
pub mod router;
pub mod storage;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use error::{SwError, SwResult};
pub use worker::{FetchOutcome, ServiceWorker, WorkerState};
