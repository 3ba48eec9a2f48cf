//! test_run — One ingestion event (a single uploaded result file).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::test_run;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = test_run)]
pub struct TestRun {
    pub id: i64,
    pub branch: Option<String>,
    pub revision: Option<String>,
    pub platform: String,
    pub dt: DateTime<Utc>,
    pub bbnum: i32,
    pub typ: String,
    pub info: Option<String>,
}

/// Run parameters as validated by the upload boundary.
#[derive(Debug, Clone, PartialEq, Insertable, Deserialize)]
#[diesel(table_name = test_run)]
pub struct NewTestRun {
    pub branch: Option<String>,
    pub revision: Option<String>,
    pub platform: String,
    pub bbnum: i32,
    pub typ: String,
    pub info: Option<String>,
}
