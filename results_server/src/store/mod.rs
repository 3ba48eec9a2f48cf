//! Store handles passed explicitly to the ingestion pipeline.
//!
//! `PgStore` is the production backend. `MemoryStore` keeps the same
//! observable contract in process and backs the test suite.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::{build_pool, PgPool, PgStore};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::test_failure::{NewTestFailure, TestFailure};
use crate::models::test_run::{NewTestRun, TestRun};

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a run and return it with its assigned id and timestamp.
    /// The row is committed before this returns.
    async fn create_run(&self, new_run: NewTestRun) -> Result<TestRun, StoreError>;

    /// Persist a batch of failures atomically; on error no row of the batch
    /// is visible.
    async fn insert_failures(&self, failures: Vec<NewTestFailure>) -> Result<usize, StoreError>;

    async fn get_run(&self, run_id: i64) -> Result<Option<TestRun>, StoreError>;

    /// Failures of a run ordered by name, then variant.
    async fn failures_for_run(&self, run_id: i64) -> Result<Vec<TestFailure>, StoreError>;

    /// Trivial round trip used by the health check.
    async fn ping(&self) -> Result<(), StoreError>;
}
