//! JUnit XML parsing — untrusted bytes in, owned result tree out.
//!
//! Accepts a `<testsuites>` root whose direct `<testsuite>` children are the
//! suites, or a bare `<testsuite>` root treated as a single suite. Anything
//! that is not well-formed UTF-8 XML with one of those roots is rejected as a
//! whole; no partial tree is ever returned.

use std::collections::BTreeMap;

use roxmltree::{Document, Node};

use crate::error::InvalidInputError;

/// Kind of a result node found under a `<testcase>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Failure,
    Error,
    Skipped,
}

impl ResultKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "failure" => Some(Self::Failure),
            "error" => Some(Self::Error),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// A `<failure>`, `<error>` or `<skipped>` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultNode {
    pub kind: ResultKind,
    pub message: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub classname: String,
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub results: Vec<ResultNode>,
}

impl TestCase {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// A case with no result nodes passed.
    pub fn is_passed(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_failure(&self) -> bool {
        self.results.iter().any(|r| r.kind == ResultKind::Failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResultNode> {
        self.results.iter().filter(|r| r.kind == ResultKind::Failure)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    pub name: Option<String>,
    pub cases: Vec<TestCase>,
}

/// Parsed result document: suites in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JUnitDocument {
    pub suites: Vec<TestSuite>,
}

impl JUnitDocument {
    pub fn cases(&self) -> impl Iterator<Item = &TestCase> {
        self.suites.iter().flat_map(|s| s.cases.iter())
    }
}

/// Parse a JUnit XML document.
pub fn parse_document(bytes: &[u8]) -> Result<JUnitDocument, InvalidInputError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        tracing::debug!(error = %e, "result document is not valid UTF-8");
        InvalidInputError
    })?;

    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    // Default options reject DTDs, so entity expansion never happens.
    let doc = Document::parse(text).map_err(|e| {
        tracing::debug!(error = %e, "result document is not well-formed XML");
        InvalidInputError
    })?;

    let root = doc.root_element();
    let suites = match root.tag_name().name() {
        "testsuites" => root
            .children()
            .filter(|n| n.has_tag_name("testsuite"))
            .map(parse_suite)
            .collect(),
        "testsuite" => vec![parse_suite(root)],
        other => {
            tracing::debug!(root = other, "unexpected root element in result document");
            return Err(InvalidInputError);
        }
    };

    Ok(JUnitDocument { suites })
}

fn parse_suite(node: Node<'_, '_>) -> TestSuite {
    TestSuite {
        name: node.attribute("name").map(str::to_string),
        cases: node
            .children()
            .filter(|n| n.has_tag_name("testcase"))
            .map(parse_case)
            .collect(),
    }
}

fn parse_case(node: Node<'_, '_>) -> TestCase {
    let attributes = node
        .attributes()
        .map(|a| (a.name().to_string(), a.value().to_string()))
        .collect::<BTreeMap<_, _>>();

    let results = node
        .children()
        .filter(|n| n.is_element())
        .filter_map(|n| {
            ResultKind::from_tag(n.tag_name().name()).map(|kind| ResultNode {
                kind,
                message: n.attribute("message").map(str::to_string),
                text: n.text().map(str::to_string),
            })
        })
        .collect();

    TestCase {
        classname: node.attribute("classname").unwrap_or_default().to_string(),
        name: node.attribute("name").unwrap_or_default().to_string(),
        attributes,
        results,
    }
}
