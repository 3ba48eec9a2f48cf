//! Postgres store over a diesel-async deadpool pool.

use async_trait::async_trait;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use super::ResultStore;
use crate::error::StoreError;
use crate::models::test_failure::{NewTestFailure, TestFailure};
use crate::models::test_run::{NewTestRun, TestRun};
use crate::services::{failure_service, run_service};

pub type PgPool = Pool<AsyncPgConnection>;

/// Build a connection pool; connections are opened lazily.
pub fn build_pool(database_url: &str, max_size: usize) -> anyhow::Result<PgPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))?;
    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn conn(&self) -> Result<Object<AsyncPgConnection>, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn create_run(&self, new_run: NewTestRun) -> Result<TestRun, StoreError> {
        let mut conn = self.conn().await?;
        run_service::create_run(&mut conn, new_run).await
    }

    async fn insert_failures(&self, failures: Vec<NewTestFailure>) -> Result<usize, StoreError> {
        let mut conn = self.conn().await?;
        failure_service::insert_failures(&mut conn, failures).await
    }

    async fn get_run(&self, run_id: i64) -> Result<Option<TestRun>, StoreError> {
        let mut conn = self.conn().await?;
        run_service::get_run(&mut conn, run_id).await
    }

    async fn failures_for_run(&self, run_id: i64) -> Result<Vec<TestFailure>, StoreError> {
        let mut conn = self.conn().await?;
        failure_service::failures_for_run(&mut conn, run_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        diesel::sql_query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}
