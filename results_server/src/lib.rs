//! Test results server — ingests JUnit XML uploads and stores failing tests.
//!
//! An upload is parsed, recorded as a test run, reduced to its distinct
//! failures and committed against Postgres (or the in-memory store used in
//! tests). Everything except process wiring lives in this library.

pub mod config;
pub mod error;
pub mod metrics;
pub mod migration;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;
pub mod store;
