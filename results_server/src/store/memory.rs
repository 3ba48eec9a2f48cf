//! In-process store with the same constraints as the Postgres schema.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::ResultStore;
use crate::error::StoreError;
use crate::migration::limits;
use crate::models::test_failure::{FailureKey, NewTestFailure, TestFailure};
use crate::models::test_run::{NewTestRun, TestRun};

#[derive(Default)]
struct Tables {
    next_run_id: i64,
    runs: BTreeMap<i64, TestRun>,
    failures: BTreeMap<FailureKey, TestFailure>,
}

/// Store backed by process memory.
///
/// Enforces the primary key, the run foreign key and the column lengths of
/// the SQL schema. A batch is checked in full before any row is applied.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_count(&self) -> usize {
        self.lock().runs.len()
    }

    pub fn failure_count(&self) -> usize {
        self.lock().failures.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave a half-applied batch.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn check_len(column: &str, value: Option<&str>, max: usize) -> Result<(), StoreError> {
    match value {
        Some(v) if v.chars().count() > max => Err(StoreError::Database(format!(
            "value too long for type character varying({max}) in column \"{column}\""
        ))),
        _ => Ok(()),
    }
}

fn check_run(run: &NewTestRun) -> Result<(), StoreError> {
    check_len("branch", run.branch.as_deref(), limits::BRANCH)?;
    check_len("revision", run.revision.as_deref(), limits::REVISION)?;
    check_len("platform", Some(&run.platform), limits::PLATFORM)?;
    check_len("typ", Some(&run.typ), limits::TYP)?;
    check_len("info", run.info.as_deref(), limits::RUN_INFO)
}

fn check_failure(failure: &NewTestFailure) -> Result<(), StoreError> {
    check_len("test_name", Some(&failure.test_name), limits::TEST_NAME)?;
    check_len("test_variant", Some(&failure.test_variant), limits::TEST_VARIANT)?;
    check_len("info_text", failure.info_text.as_deref(), limits::INFO_TEXT)
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn create_run(&self, new_run: NewTestRun) -> Result<TestRun, StoreError> {
        check_run(&new_run)?;

        let mut tables = self.lock();
        tables.next_run_id += 1;
        let run = TestRun {
            id: tables.next_run_id,
            branch: new_run.branch,
            revision: new_run.revision,
            platform: new_run.platform,
            dt: Utc::now(),
            bbnum: new_run.bbnum,
            typ: new_run.typ,
            info: new_run.info,
        };
        tables.runs.insert(run.id, run.clone());
        Ok(run)
    }

    async fn insert_failures(&self, failures: Vec<NewTestFailure>) -> Result<usize, StoreError> {
        let mut tables = self.lock();

        let mut batch_keys = HashSet::with_capacity(failures.len());
        for failure in &failures {
            check_failure(failure)?;
            if !tables.runs.contains_key(&failure.test_run_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "insert on table \"test_failure\" violates foreign key constraint: \
                     test_run_id={} is not present in table \"test_run\"",
                    failure.test_run_id
                )));
            }
            let key = failure.key();
            if tables.failures.contains_key(&key) || !batch_keys.insert(key) {
                return Err(StoreError::UniqueViolation(format!(
                    "duplicate key value violates unique constraint \"test_failure_pkey\": \
                     ({}, {}, {}) already exists",
                    failure.test_run_id, failure.test_name, failure.test_variant
                )));
            }
        }

        let inserted = failures.len();
        for failure in failures {
            tables.failures.insert(failure.key(), failure);
        }
        Ok(inserted)
    }

    async fn get_run(&self, run_id: i64) -> Result<Option<TestRun>, StoreError> {
        Ok(self.lock().runs.get(&run_id).cloned())
    }

    async fn failures_for_run(&self, run_id: i64) -> Result<Vec<TestFailure>, StoreError> {
        // BTreeMap order on (run, name, variant) is the documented ordering.
        Ok(self
            .lock()
            .failures
            .range((run_id, String::new(), String::new())..)
            .take_while(|((id, _, _), _)| *id == run_id)
            .map(|(_, f)| f.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_run(platform: &str) -> NewTestRun {
        NewTestRun {
            branch: Some("main".to_string()),
            revision: Some("rev123".to_string()),
            platform: platform.to_string(),
            bbnum: 42,
            typ: "test".to_string(),
            info: None,
        }
    }

    fn failure(run_id: i64, name: &str, variant: &str) -> NewTestFailure {
        NewTestFailure {
            test_run_id: run_id,
            test_name: name.to_string(),
            test_variant: variant.to_string(),
            info_text: None,
            failure_text: None,
        }
    }

    #[tokio::test]
    async fn run_ids_are_monotonic() {
        let store = MemoryStore::new();
        let a = store.create_run(new_run("linux")).await.unwrap();
        let b = store.create_run(new_run("linux")).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.get_run(a.id).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn overlong_platform_is_rejected() {
        let store = MemoryStore::new();
        let err = store.create_run(new_run(&"x".repeat(101))).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert_eq!(store.run_count(), 0);
    }

    #[tokio::test]
    async fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let run = store.create_run(new_run("linux")).await.unwrap();
        let err = store
            .insert_failures(vec![
                failure(run.id, "a.a", "N/A"),
                failure(run.id, "b.b", "N/A"),
                failure(run.id, "a.a", "N/A"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.failure_count(), 0);
    }

    #[tokio::test]
    async fn collision_with_stored_row_is_rejected() {
        let store = MemoryStore::new();
        let run = store.create_run(new_run("linux")).await.unwrap();
        store.insert_failures(vec![failure(run.id, "a.a", "N/A")]).await.unwrap();
        let err = store
            .insert_failures(vec![failure(run.id, "b.b", "N/A"), failure(run.id, "a.a", "N/A")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("test_failure_pkey"));
        assert_eq!(store.failure_count(), 1);
    }

    #[tokio::test]
    async fn unknown_run_violates_foreign_key() {
        let store = MemoryStore::new();
        let err = store.insert_failures(vec![failure(7, "a.a", "N/A")]).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn failures_for_run_are_scoped_and_ordered() {
        let store = MemoryStore::new();
        let r1 = store.create_run(new_run("linux")).await.unwrap();
        let r2 = store.create_run(new_run("linux")).await.unwrap();
        store
            .insert_failures(vec![
                failure(r1.id, "b.b", "N/A"),
                failure(r1.id, "a.a", "x"),
                failure(r1.id, "a.a", "N/A"),
            ])
            .await
            .unwrap();
        store.insert_failures(vec![failure(r2.id, "c.c", "N/A")]).await.unwrap();

        let rows = store.failures_for_run(r1.id).await.unwrap();
        let keys: Vec<_> = rows
            .iter()
            .map(|f| (f.test_name.as_str(), f.test_variant.as_str()))
            .collect();
        assert_eq!(keys, [("a.a", "N/A"), ("a.a", "x"), ("b.b", "N/A")]);
    }
}
