//! Diagnostics collected while a rename catalog runs.
//!
//! Rules never abort a run; everything that goes wrong (or is merely worth noting) is
//! recorded here, tagged with the label of the rule that produced it. Entries are also
//! forwarded to the `log` facade as they are pushed, so a CLI with a logger installed
//! shows them live.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Append-only container for diagnostic entries
//! - [`Diagnostic`] - Individual entry with severity, category, rule label and message
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - What kind of failure or observation the entry is about
//!
//! # Usage Examples
//!
//! ```rust
//! use dotrename::deobfuscation::{DiagnosticCategory, Diagnostics};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.warning(DiagnosticCategory::Match, "ConsoleSdtd", "No match found");
//! diagnostics.error(DiagnosticCategory::Match, "World.gameTime", "2 matches found");
//!
//! assert!(diagnostics.has_errors());
//! assert_eq!(diagnostics.for_label("ConsoleSdtd").len(), 1);
//! ```
//!
//! # Thread Safety
//!
//! [`Diagnostics`] uses `boxcar::Vec` internally, so entries can be appended through a
//! shared reference and the container can be read from other threads after the run.

use std::{
    collections::BTreeMap,
    fmt::{self, Write},
    sync::atomic::{AtomicUsize, Ordering},
};

use log::Level;
use strum::{Display, EnumIter};

use crate::metadata::token::Token;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    ///
    /// Used for relationship reports and for notes about skipped rules.
    Info,

    /// A rule did not apply.
    ///
    /// The run continues; elements the rule would have named keep their obfuscated
    /// names.
    Warning,

    /// A rule applied incorrectly or could not decide.
    ///
    /// Ambiguous matches and failed actions land here.
    Error,
}

impl DiagnosticSeverity {
    /// The `log` level entries of this severity are forwarded with.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            DiagnosticSeverity::Info => Level::Info,
            DiagnosticSeverity::Warning => Level::Warn,
            DiagnosticSeverity::Error => Level::Error,
        }
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => f.pad("INFO"),
            DiagnosticSeverity::Warning => f.pad("WARN"),
            DiagnosticSeverity::Error => f.pad("ERROR"),
        }
    }
}

/// Category indicating what a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum DiagnosticCategory {
    /// Resolution outcome: no match or an ambiguous match.
    Match,

    /// An instruction operand did not resolve to the expected element.
    Operand,

    /// A naming heuristic found nothing to name the element after.
    Naming,

    /// An action failed on a uniquely matched element.
    Action,

    /// A rule was skipped because an earlier rule did not bind its prerequisite.
    Prerequisite,

    /// Report about base/derived relationships between renamed types.
    Relationship,
}

/// A single diagnostic entry.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category of this diagnostic.
    pub category: DiagnosticCategory,

    /// Label of the rule that produced the entry.
    pub label: String,

    /// Human-readable description.
    pub message: String,

    /// Optional token of the element involved.
    pub token: Option<Token>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    ///
    /// # Arguments
    ///
    /// * `severity` - Severity level of the diagnostic
    /// * `category` - Category of the diagnostic
    /// * `label` - Label of the rule that produced it
    /// * `message` - Human-readable description
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        label: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            label: label.into(),
            message: message.into(),
            token: None,
        }
    }

    /// Attaches the token of the element involved.
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}: {}",
            self.severity, self.category, self.label, self.message
        )?;

        if let Some(token) = self.token {
            write!(f, " (token: {token})")?;
        }

        Ok(())
    }
}

/// Append-only container for diagnostic entries.
///
/// Per-severity counters are kept next to the entries, so the count queries the engine
/// runs after every step do not walk the whole list.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
    counts: [AtomicUsize; 3],
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
            counts: Default::default(),
        }
    }

    /// Adds an informational diagnostic.
    pub fn info(
        &self,
        category: DiagnosticCategory,
        label: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit(DiagnosticSeverity::Info, category, label.into(), message.into());
    }

    /// Adds a warning diagnostic.
    pub fn warning(
        &self,
        category: DiagnosticCategory,
        label: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit(DiagnosticSeverity::Warning, category, label.into(), message.into());
    }

    /// Adds an error diagnostic.
    pub fn error(
        &self,
        category: DiagnosticCategory,
        label: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit(DiagnosticSeverity::Error, category, label.into(), message.into());
    }

    fn emit(
        &self,
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        label: String,
        message: String,
    ) {
        self.push(Diagnostic::new(severity, category, label, message));
    }

    /// Appends `diagnostic` and forwards it to the `log` facade.
    pub fn push(&self, diagnostic: Diagnostic) {
        log::log!(
            diagnostic.severity.level(),
            "[{}] {}: {}",
            diagnostic.category,
            diagnostic.label,
            diagnostic.message
        );
        self.counts[diagnostic.severity as usize].fetch_add(1, Ordering::Relaxed);
        self.entries.push(diagnostic);
    }

    /// Returns true if anything was recorded.
    pub fn has_any(&self) -> bool {
        self.count() > 0
    }

    /// Returns true if at least one error was recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns true if at least one warning was recorded.
    pub fn has_warnings(&self) -> bool {
        self.warning_count() > 0
    }

    /// Total number of entries.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Number of entries with `severity`.
    pub fn count_of(&self, severity: DiagnosticSeverity) -> usize {
        self.counts[severity as usize].load(Ordering::Relaxed)
    }

    /// Number of errors.
    pub fn error_count(&self) -> usize {
        self.count_of(DiagnosticSeverity::Error)
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.count_of(DiagnosticSeverity::Warning)
    }

    /// Number of informational entries.
    pub fn info_count(&self) -> usize {
        self.count_of(DiagnosticSeverity::Info)
    }

    /// All entries in the order they were pushed.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, entry)| entry)
    }

    fn with_severity(&self, severity: DiagnosticSeverity) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.severity == severity).collect()
    }

    /// All errors.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.with_severity(DiagnosticSeverity::Error)
    }

    /// All warnings.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.with_severity(DiagnosticSeverity::Warning)
    }

    /// Entries of one category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Entries produced by the step with this label.
    pub fn for_label(&self, label: &str) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.label == label).collect()
    }

    /// Counts per severity, then every warning and error grouped under its step label.
    pub fn summary(&self) -> String {
        let mut output = format!(
            "Diagnostics: {} error(s), {} warning(s), {} info(s)\n",
            self.error_count(),
            self.warning_count(),
            self.info_count()
        );

        let mut by_label: BTreeMap<&str, Vec<&Diagnostic>> = BTreeMap::new();
        for diagnostic in self.iter() {
            if diagnostic.severity != DiagnosticSeverity::Info {
                by_label.entry(&diagnostic.label).or_default().push(diagnostic);
            }
        }
        for (label, entries) in by_label {
            let _ = writeln!(output, "\n{label}:");
            for diagnostic in entries {
                let _ = writeln!(
                    output,
                    "  {:<5} {}: {}",
                    diagnostic.severity, diagnostic.category, diagnostic.message
                );
            }
        }
        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::TableId;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::Operand,
            "EntityPlayer.position",
            "operand is not a field definition",
        )
        .with_token(Token::from_parts(TableId::MethodDef, 2));

        assert_eq!(
            diag.to_string(),
            "[WARN] Operand: EntityPlayer.position: operand is not a field definition (token: 0x06000002)"
        );
    }

    #[test]
    fn test_counts_and_filters() {
        let diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_any());

        diagnostics.info(DiagnosticCategory::Relationship, "Console", "Base <- Derived");
        diagnostics.warning(DiagnosticCategory::Match, "Console", "No match found");
        diagnostics.error(DiagnosticCategory::Match, "World", "Multiple matches found (3)");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.info_count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.error_count(), 1);
        assert!(diagnostics.has_warnings());
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Match).len(), 2);
        assert_eq!(diagnostics.for_label("Console").len(), 2);
    }

    #[test]
    fn test_summary_groups_by_label() {
        let diagnostics = Diagnostics::new();
        diagnostics.warning(DiagnosticCategory::Naming, "Command", "No name for command found");
        diagnostics.error(DiagnosticCategory::Action, "World", "rename failed");
        diagnostics.info(DiagnosticCategory::Relationship, "World", "Base <- a");

        let summary = diagnostics.summary();
        assert!(summary.starts_with("Diagnostics: 1 error(s), 1 warning(s), 1 info(s)"));
        assert!(summary.contains("\nCommand:\n  WARN  Naming: No name for command found\n"));
        assert!(summary.contains("\nWorld:\n  ERROR Action: rename failed\n"));
        assert!(!summary.contains("Base <- a"));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let diagnostics = Diagnostics::new();
        for i in 0..5 {
            diagnostics.info(DiagnosticCategory::Relationship, format!("r{i}"), "x");
        }
        let labels: Vec<&str> = diagnostics.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["r0", "r1", "r2", "r3", "r4"]);
    }
}
