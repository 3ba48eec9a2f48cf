//! Failure extraction — turns a parsed document into failure rows.
//!
//! Only `<failure>` nodes produce rows; `<error>` and `<skipped>` nodes are
//! ignored even when they sit next to a failure in the same case. Rows are
//! emitted in document order, and a row whose (run, name, variant) key was
//! already emitted in the same pass is dropped.

use std::collections::HashSet;

use crate::migration::limits;
use crate::models::test_failure::{FailureKey, NewTestFailure, DEFAULT_VARIANT};
use crate::services::junit_parser::{JUnitDocument, ResultNode, TestCase};

/// Suite-qualified test name: `classname.name`, kept as `.name` when the
/// classname is empty.
pub fn qualified_name(case: &TestCase) -> String {
    format!("{}.{}", case.classname, case.name)
}

/// The `combinations` attribute, or `N/A` when the case has none.
pub fn variant(case: &TestCase) -> String {
    case.attribute("combinations")
        .unwrap_or(DEFAULT_VARIANT)
        .to_string()
}

/// Extract the failure rows for `test_run_id` from `document`.
pub fn extract_failures(test_run_id: i64, document: &JUnitDocument) -> Vec<NewTestFailure> {
    let mut seen: HashSet<FailureKey> = HashSet::new();
    let mut failures = Vec::new();

    for case in document.cases().filter(|c| c.is_failure()) {
        let test_name = qualified_name(case);
        let test_variant = variant(case);

        for result in case.failures() {
            let failure = NewTestFailure {
                test_run_id,
                test_name: test_name.clone(),
                test_variant: test_variant.clone(),
                info_text: info_text(result),
                failure_text: result.text.clone(),
            };

            if !seen.insert(failure.key()) {
                tracing::debug!(
                    run_id = test_run_id,
                    test_name = %failure.test_name,
                    test_variant = %failure.test_variant,
                    "Skipping duplicate failure"
                );
                continue;
            }
            failures.push(failure);
        }
    }

    failures
}

fn info_text(result: &ResultNode) -> Option<String> {
    let message = result.message.as_deref()?.trim();
    if message.is_empty() {
        return None;
    }
    Some(message.chars().take(limits::INFO_TEXT).collect())
}
