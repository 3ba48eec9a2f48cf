//! Test run creation and lookup.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::error::StoreError;
use crate::models::test_run::{NewTestRun, TestRun};
use crate::schema::test_run;

/// Insert a run row and return it with its assigned id and timestamp.
///
/// Runs outside any explicit transaction, so the row is committed as soon as
/// the statement succeeds.
pub async fn create_run(
    conn: &mut AsyncPgConnection,
    new_run: NewTestRun,
) -> Result<TestRun, StoreError> {
    let run = diesel::insert_into(test_run::table)
        .values(&new_run)
        .returning(TestRun::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(
        run_id = run.id,
        platform = %run.platform,
        bbnum = run.bbnum,
        "Test run created"
    );

    Ok(run)
}

pub async fn get_run(
    conn: &mut AsyncPgConnection,
    run_id: i64,
) -> Result<Option<TestRun>, StoreError> {
    let run = test_run::table
        .find(run_id)
        .select(TestRun::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(run)
}
