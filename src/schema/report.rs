//! Validation results
//!
//! Violations accumulate in traversal order: object members are visited in
//! sorted order, required-field checks precede member checks, and array
//! elements follow index order. The order is therefore deterministic.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::path::DocumentPath;

/// Kind of constraint a candidate violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    MissingRequired,
    TypeMismatch,
    EnumMismatch,
    AdditionalProperty,
    PatternMismatch,
    /// `$ref` target missing from a hand-built definition table
    UnresolvedReference,
}

impl ViolationKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequired => "REL_MISSING_REQUIRED",
            ViolationKind::TypeMismatch => "REL_TYPE_MISMATCH",
            ViolationKind::EnumMismatch => "REL_ENUM_MISMATCH",
            ViolationKind::AdditionalProperty => "REL_ADDITIONAL_PROPERTY",
            ViolationKind::PatternMismatch => "REL_PATTERN_MISMATCH",
            ViolationKind::UnresolvedReference => "REL_UNRESOLVED_REF",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One violated constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Violation {
    pub path: DocumentPath,
    #[serde(rename = "code", serialize_with = "serialize_kind")]
    pub kind: ViolationKind,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

fn serialize_kind<S: serde::Serializer>(
    kind: &ViolationKind,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.code())
}

impl Violation {
    pub fn new(
        path: DocumentPath,
        kind: ViolationKind,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path,
            kind,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_required(path: DocumentPath) -> Self {
        Self::new(path, ViolationKind::MissingRequired, "field to be present", "missing")
    }

    pub fn type_mismatch(
        path: DocumentPath,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(path, ViolationKind::TypeMismatch, expected, actual)
    }

    pub fn enum_mismatch(
        path: DocumentPath,
        allowed: &[String],
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            path,
            ViolationKind::EnumMismatch,
            format!("one of [{}]", allowed.join(", ")),
            actual,
        )
    }

    pub fn additional_property(path: DocumentPath) -> Self {
        Self::new(
            path,
            ViolationKind::AdditionalProperty,
            "no undeclared fields",
            "extra field present",
        )
    }

    pub fn pattern_mismatch(path: DocumentPath, pattern: &str, actual: impl Into<String>) -> Self {
        Self::new(
            path,
            ViolationKind::PatternMismatch,
            format!("string matching /{}/", pattern),
            actual,
        )
    }

    pub fn unresolved_reference(path: DocumentPath, name: &str) -> Self {
        Self::new(
            path,
            ViolationKind::UnresolvedReference,
            format!("definition '{}'", name),
            "not found",
        )
    }

    /// Human-readable message without the path
    pub fn message(&self) -> String {
        format!("expected {}, got {}", self.expected, self.actual)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at '{}': expected {}, got {}",
            self.kind, self.path, self.expected, self.actual
        )
    }
}

/// Outcome of validating one candidate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Drops repeated violations, keeping the first occurrence.
    pub(crate) fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.violations.retain(|v| seen.insert(v.clone()));
    }

    /// True when no constraint was violated
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// (path, message) pairs in report order
    pub fn messages(&self) -> Vec<(String, String)> {
        self.violations
            .iter()
            .map(|v| (v.path.to_string(), v.message()))
            .collect()
    }

    /// Violations whose path displays as `path`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.path.to_string() == path)
    }

    /// Converts into `Ok(())` or `Err(violations)`.
    pub fn into_result(self) -> Result<(), Vec<Violation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }
}

impl IntoIterator for ValidationReport {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}
