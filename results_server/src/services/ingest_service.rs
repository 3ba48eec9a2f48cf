//! Upload ingestion: parse, create the run, extract failures, store them.
//!
//! The run row is committed on its own before the failure batch is written,
//! so a rejected batch leaves the run in place with no failures attached.
//! Malformed input is rejected before anything reaches the store.

use crate::error::{IngestError, StorageError};
use crate::models::test_run::NewTestRun;
use crate::services::{failure_extractor, junit_parser};
use crate::store::ResultStore;

/// Successful result of one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// `n` failure rows were committed.
    Stored(usize),
    /// The document had no failures; only the run row was written.
    NothingToStore,
}

impl IngestOutcome {
    pub fn detail(&self) -> &'static str {
        match self {
            Self::Stored(_) => "Results were stored successfully.",
            Self::NothingToStore => "No test failures to store.",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Stored(_) => "stored",
            Self::NothingToStore => "nothing_to_store",
        }
    }
}

/// Ingest one result document for the run described by `run`.
pub async fn ingest(
    store: &dyn ResultStore,
    run: NewTestRun,
    raw_xml: &[u8],
) -> Result<IngestOutcome, IngestError> {
    let platform = run.platform.clone();
    let bbnum = run.bbnum;

    let document = junit_parser::parse_document(raw_xml)?;

    let run = store.create_run(run).await.map_err(|e| {
        tracing::error!(platform = %platform, bbnum, error = %e, "Failed to insert test run");
        StorageError::on_create(e)
    })?;

    let failures = failure_extractor::extract_failures(run.id, &document);
    if failures.is_empty() {
        tracing::info!(run_id = run.id, platform = %platform, bbnum, "No test failures to store");
        return Ok(IngestOutcome::NothingToStore);
    }

    let count = store.insert_failures(failures).await.map_err(|e| {
        tracing::error!(
            run_id = run.id,
            platform = %platform,
            bbnum,
            error = %e,
            "Failed to store test results"
        );
        StorageError::on_batch(e)
    })?;

    crate::metrics::failures_stored(count);
    tracing::info!(
        run_id = run.id,
        platform = %platform,
        bbnum,
        failures = count,
        "Stored test results"
    );

    Ok(IngestOutcome::Stored(count))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::{InvalidInputError, StoreError};
    use crate::models::test_failure::{NewTestFailure, TestFailure};
    use crate::models::test_run::TestRun;
    use crate::store::MemoryStore;

    fn run_params() -> NewTestRun {
        NewTestRun {
            branch: Some("main".to_string()),
            revision: Some("rev123".to_string()),
            platform: "linux".to_string(),
            bbnum: 42,
            typ: "test".to_string(),
            info: None,
        }
    }

    /// Wraps a memory store and lets a test force a failure at one step.
    struct FaultyStore {
        inner: MemoryStore,
        fail_create: Option<StoreError>,
        fail_batch: Option<StoreError>,
    }

    impl FaultyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_create: None,
                fail_batch: None,
            }
        }
    }

    #[async_trait]
    impl ResultStore for FaultyStore {
        async fn create_run(&self, new_run: NewTestRun) -> Result<TestRun, StoreError> {
            match &self.fail_create {
                Some(e) => Err(e.clone()),
                None => self.inner.create_run(new_run).await,
            }
        }

        async fn insert_failures(
            &self,
            failures: Vec<NewTestFailure>,
        ) -> Result<usize, StoreError> {
            match &self.fail_batch {
                Some(e) => Err(e.clone()),
                None => self.inner.insert_failures(failures).await,
            }
        }

        async fn get_run(&self, run_id: i64) -> Result<Option<TestRun>, StoreError> {
            self.inner.get_run(run_id).await
        }

        async fn failures_for_run(&self, run_id: i64) -> Result<Vec<TestFailure>, StoreError> {
            self.inner.failures_for_run(run_id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping().await
        }
    }

    const ONE_FAILURE: &[u8] = br#"<testsuites><testsuite name="main">
  <testcase classname="archive" name="archive"><failure>mismatch</failure></testcase>
  <testcase classname="main" name="alias"/>
</testsuite></testsuites>"#;

    #[tokio::test]
    async fn stores_failures() {
        let store = MemoryStore::new();
        let outcome = ingest(&store, run_params(), ONE_FAILURE).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Stored(1));

        let rows = store.failures_for_run(1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].test_name, "archive.archive");
        assert_eq!(rows[0].test_variant, "N/A");
        assert_eq!(rows[0].failure_text.as_deref(), Some("mismatch"));
    }

    #[tokio::test]
    async fn no_failures_keeps_the_run() {
        let store = MemoryStore::new();
        let xml = br#"<testsuites><testsuite><testcase classname="c" name="n"/></testsuite></testsuites>"#;
        let outcome = ingest(&store, run_params(), xml).await.unwrap();
        assert_eq!(outcome, IngestOutcome::NothingToStore);
        assert_eq!(store.run_count(), 1);
        assert_eq!(store.failure_count(), 0);
    }

    #[tokio::test]
    async fn malformed_xml_creates_no_run() {
        let store = MemoryStore::new();
        let err = ingest(&store, run_params(), b"<testsuites><testsuite>")
            .await
            .unwrap_err();
        assert_eq!(err, IngestError::InvalidInput(InvalidInputError));
        assert_eq!(store.run_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_failures_are_stored_once() {
        let store = MemoryStore::new();
        let xml = br#"<testsuites><testsuite>
  <testcase classname="main" name="archive" combinations=""><failure>one</failure></testcase>
  <testcase classname="main" name="archive" combinations=""><failure>two</failure></testcase>
  <testcase classname="main" name="alias"><failure/></testcase>
</testsuite></testsuites>"#;
        let outcome = ingest(&store, run_params(), xml).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Stored(2));
        assert_eq!(store.failure_count(), 2);
    }

    #[tokio::test]
    async fn run_creation_failure_skips_failures() {
        let mut store = FaultyStore::new();
        store.fail_create = Some(StoreError::CheckViolation("bad run".to_string()));
        let err = ingest(&store, run_params(), ONE_FAILURE).await.unwrap_err();
        assert_eq!(
            err,
            IngestError::Storage(StorageError::CreateFailed("bad run".to_string()))
        );
        assert_eq!(store.inner.failure_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_is_unreachable() {
        let mut store = FaultyStore::new();
        store.fail_create = Some(StoreError::Unavailable("connection refused".to_string()));
        let err = ingest(&store, run_params(), ONE_FAILURE).await.unwrap_err();
        assert!(matches!(err, IngestError::Storage(StorageError::Unreachable(_))));
    }

    #[tokio::test]
    async fn batch_conflict_keeps_the_run() {
        let mut store = FaultyStore::new();
        store.fail_batch = Some(StoreError::UniqueViolation(
            "duplicate key value violates unique constraint \"test_failure_pkey\"".to_string(),
        ));
        let err = ingest(&store, run_params(), ONE_FAILURE).await.unwrap_err();
        match err {
            IngestError::Storage(StorageError::Conflict(cause)) => {
                assert!(cause.contains("test_failure_pkey"))
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(store.inner.run_count(), 1);
        assert_eq!(store.inner.failure_count(), 0);
    }

    #[tokio::test]
    async fn overlong_variant_rolls_back_the_batch() {
        let store = MemoryStore::new();
        let xml = format!(
            r#"<testsuites><testsuite>
  <testcase classname="c" name="ok"><failure/></testcase>
  <testcase classname="c" name="long" combinations="{}"><failure/></testcase>
</testsuite></testsuites>"#,
            "v".repeat(65)
        );
        let err = ingest(&store, run_params(), xml.as_bytes()).await.unwrap_err();
        assert!(matches!(err, IngestError::Storage(StorageError::Conflict(_))));
        assert_eq!(store.run_count(), 1);
        assert_eq!(store.failure_count(), 0);
    }

    #[test]
    fn outcome_details() {
        assert_eq!(IngestOutcome::Stored(3).detail(), "Results were stored successfully.");
        assert_eq!(IngestOutcome::NothingToStore.detail(), "No test failures to store.");
    }
}
