//! Core types for boundary violations and results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Severity level for boundary violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail the check.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            other => Err(other.to_string()),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to project root.
    pub file: PathBuf,
    /// Line number (1-indexed, 0 when unknown).
    pub line: usize,
    /// Column number (1-indexed, 0 when unknown).
    pub column: usize,
}

impl Location {
    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of a whole file.
    #[must_use]
    pub fn file(file: impl Into<PathBuf>) -> Self {
        Self::new(file, 0, 0)
    }
}

/// A boundary violation found during a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code (e.g., "BND001").
    pub code: String,
    /// Rule name (e.g., "element-types").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Location of the offending import (or file).
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// The import specifier involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,
    /// 0-based index of the governing rule, if one governed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_index: Option<usize>,
    /// Reference to design document (e.g., "ARCHITECTURE.md L85").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ref: Option<String>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            location,
            message: message.into(),
            dependency: None,
            rule_index: None,
            doc_ref: None,
        }
    }

    /// Records the import specifier involved.
    #[must_use]
    pub fn with_dependency(mut self, source: impl Into<String>) -> Self {
        self.dependency = Some(source.into());
        self
    }

    /// Records the governing rule.
    #[must_use]
    pub fn with_rule_index(mut self, index: Option<usize>) -> Self {
        self.rule_index = index;
        self
    }

    /// Adds a design document reference to this violation.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_ref = Some(doc_ref.into());
        self
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.location.file.display(),
            self.location.line,
            self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if let Some(dependency) = &self.dependency {
            let _ = writeln!(output, "  = import: {dependency}");
        }
        if let Some(index) = self.rule_index {
            let _ = writeln!(output, "  = rule: #{}", index + 1);
        }
        if let Some(doc_ref) = &self.doc_ref {
            let _ = writeln!(output, "  = see: {doc_ref}");
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.code,
            self.message
        )?;
        if let Some(doc_ref) = &self.doc_ref {
            write!(f, " (see: {doc_ref})")?;
        }
        Ok(())
    }
}

/// Result of checking a set of dependencies.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All violations found.
    pub violations: Vec<Violation>,
    /// Number of files checked.
    pub files_checked: usize,
    /// Number of dependency edges checked.
    #[serde(default)]
    pub dependencies_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == Severity::Error)
    }

    /// Returns violations filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Counts violations by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity| self.violations.iter().filter(|v| v.severity == severity).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Adds violations from another result.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
        self.files_checked += other.files_checked;
        self.dependencies_checked += other.dependencies_checked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new(
            "BND001",
            "element-types",
            severity,
            Location::new("src/components/button/index.js", 3, 1),
            "No rule allows this dependency",
        )
    }

    #[test]
    fn violation_new_has_no_extras() {
        let v = make_violation(Severity::Error);
        assert!(v.doc_ref.is_none());
        assert!(v.dependency.is_none());
        assert!(v.rule_index.is_none());
    }

    #[test]
    fn violation_format_includes_details() {
        let v = make_violation(Severity::Error)
            .with_dependency("../helpers/date")
            .with_rule_index(Some(0))
            .with_doc_ref("ARCHITECTURE.md L85");
        let formatted = v.format();
        assert!(formatted.contains("= import: ../helpers/date"));
        assert!(formatted.contains("= rule: #1"));
        assert!(formatted.contains("= see: ARCHITECTURE.md L85"));
    }

    #[test]
    fn violation_display_omits_doc_ref_when_none() {
        let v = make_violation(Severity::Warning);
        let display = format!("{v}");
        assert!(display.starts_with("src/components/button/index.js:3:1: warning [BND001]"));
        assert!(!display.contains("see:"));
    }

    #[test]
    fn severity_parses() {
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn has_violations_at_error_only() {
        let mut result = LintResult::new();
        result.violations.push(make_violation(Severity::Warning));
        assert!(!result.has_violations_at(Severity::Error));
        assert!(result.has_violations_at(Severity::Warning));
        assert!(!result.has_errors());
    }

    #[test]
    fn extend_accumulates_counts() {
        let mut a = LintResult::new();
        a.files_checked = 1;
        a.dependencies_checked = 2;
        let mut b = LintResult::new();
        b.files_checked = 1;
        b.dependencies_checked = 3;
        b.violations.push(make_violation(Severity::Error));
        a.extend(b);
        assert_eq!((a.files_checked, a.dependencies_checked), (2, 5));
        assert_eq!(a.count_by_severity(), (1, 0, 0));
    }
}
