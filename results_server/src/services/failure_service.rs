//! Failure batch storage and read-back queries.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::error::StoreError;
use crate::models::test_failure::{NewTestFailure, TestFailure};
use crate::schema::test_failure;

/// Rows per INSERT statement; five bind parameters per row keeps each
/// statement well under the Postgres limit of 65535.
pub const INSERT_CHUNK: usize = 1000;

/// Insert a batch of failures in one transaction.
///
/// Any violation rolls back every row of the batch.
pub async fn insert_failures(
    conn: &mut AsyncPgConnection,
    failures: Vec<NewTestFailure>,
) -> Result<usize, StoreError> {
    let inserted = conn
        .transaction::<usize, diesel::result::Error, _>(|conn| {
            async move {
                let mut inserted = 0;
                for chunk in failures.chunks(INSERT_CHUNK) {
                    inserted += diesel::insert_into(test_failure::table)
                        .values(chunk)
                        .execute(conn)
                        .await?;
                }
                Ok(inserted)
            }
            .scope_boxed()
        })
        .await?;
    Ok(inserted)
}

/// Failures of a run ordered by name, then variant.
pub async fn failures_for_run(
    conn: &mut AsyncPgConnection,
    run_id: i64,
) -> Result<Vec<TestFailure>, StoreError> {
    let rows = test_failure::table
        .filter(test_failure::test_run_id.eq(run_id))
        .order((test_failure::test_name.asc(), test_failure::test_variant.asc()))
        .select(TestFailure::as_select())
        .load(conn)
        .await?;
    Ok(rows)
}

pub async fn count_failures(conn: &mut AsyncPgConnection, run_id: i64) -> Result<i64, StoreError> {
    let count = test_failure::table
        .filter(test_failure::test_run_id.eq(run_id))
        .count()
        .get_result(conn)
        .await?;
    Ok(count)
}
