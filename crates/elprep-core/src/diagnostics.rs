//! Findings from checking a [`Network`](crate::Network) against its invariants.
//!
//! Errors mark data the pipeline must not transform (weightings out of step
//! with snapshots, dangling bus references). Warnings are logged and ignored.
//!
//! ```
//! use elprep_core::diagnostics::{Category, Diagnostics};
//!
//! let mut diag = Diagnostics::new();
//! diag.warn(Category::Snapshots, "network has no snapshots");
//! diag.error_on(Category::Reference, "lines.7", "unknown bus 'NL0 0'");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert!(diag.into_result().is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::{PrepError, PrepResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// What part of the model an issue concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Snapshot labels and their weightings
    Snapshots,
    /// Time-varying tables
    Series,
    /// Names pointing at buses, carriers or line types
    Reference,
    /// Parameter values outside their physical range
    Physical,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Snapshots => "snapshots",
            Category::Series => "series",
            Category::Reference => "reference",
            Category::Physical => "physical",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    /// `<component list>.<name>` or `<component list>.<attribute>` for series
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl fmt::Display for DiagnosticIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.entity {
            Some(entity) => write!(f, "{} [{}] {}: {}", severity, self.category, entity, self.message),
            None => write!(f, "{} [{}] {}", severity, self.category, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: Category,
        entity: Option<String>,
        message: impl Into<String>,
    ) {
        self.issues.push(DiagnosticIssue {
            severity,
            category,
            message: message.into(),
            entity,
        });
    }

    pub fn warn(&mut self, category: Category, message: impl Into<String>) {
        self.push(Severity::Warning, category, None, message);
    }

    pub fn error(&mut self, category: Category, message: impl Into<String>) {
        self.push(Severity::Error, category, None, message);
    }

    pub fn warn_on(&mut self, category: Category, entity: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, category, Some(entity.into()), message);
    }

    pub fn error_on(&mut self, category: Category, entity: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, category, Some(entity.into()), message);
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Warning)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Issue counts per category, for the inspection report.
    pub fn by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.category).or_insert(0) += 1;
        }
        counts
    }

    /// The warnings when nothing is broken, otherwise a validation error
    /// listing every error-level issue.
    pub fn into_result(self) -> PrepResult<Vec<DiagnosticIssue>> {
        if self.has_errors() {
            let listed: Vec<String> = self.errors().map(ToString::to_string).collect();
            return Err(PrepError::Validation(listed.join("; ")));
        }
        Ok(self.issues)
    }

    pub fn summary(&self) -> String {
        let plural = |n: usize, word: &str| format!("{} {}{}", n, word, if n == 1 { "" } else { "s" });
        match (self.warning_count(), self.error_count()) {
            (0, 0) => "no issues".to_string(),
            (w, 0) => plural(w, "warning"),
            (0, e) => plural(e, "error"),
            (w, e) => format!("{}, {}", plural(w, "warning"), plural(e, "error")),
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
