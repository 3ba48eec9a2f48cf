//! test_failure — One distinct failing test observed within a run.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::test_failure;

/// Variant recorded when a test case carries no `combinations` attribute.
pub const DEFAULT_VARIANT: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = test_failure)]
pub struct TestFailure {
    pub test_run_id: i64,
    pub test_name: String,
    pub test_variant: String,
    pub info_text: Option<String>,
    pub failure_text: Option<String>,
}

/// Failures carry no server-assigned columns, so the insertable and
/// queryable shapes are the same row.
pub type NewTestFailure = TestFailure;

/// Identity of a failure row within the store.
pub type FailureKey = (i64, String, String);

impl TestFailure {
    pub fn key(&self) -> FailureKey {
        (
            self.test_run_id,
            self.test_name.clone(),
            self.test_variant.clone(),
        )
    }
}
