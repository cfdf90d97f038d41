//! Integration tests for storefront-sw

mod cli_tests;
mod support;
mod worker_tests;
