//! Result ingestion services.

pub mod failure_extractor;
pub mod failure_service;
pub mod ingest_service;
pub mod junit_parser;
pub mod run_service;
