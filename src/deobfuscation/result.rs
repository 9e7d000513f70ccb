//! Rename run result types.
//!
//! A [`RunReport`] lists the outcome of every labeled step in execution order. Together
//! with the diagnostics and the rename tracker it forms the [`RunResult`] returned by
//! [`crate::deobfuscation::RenameEngine::run`].

use std::{fmt, time::Duration};

use crate::deobfuscation::{diagnostics::Diagnostics, tracker::RenameTracker};

/// What happened to one labeled step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Exactly one match; all actions succeeded
    Applied,
    /// Nothing matched
    NoMatch,
    /// More than one element matched; nothing was changed
    Ambiguous(usize),
    /// Exactly one match, but an action failed
    ActionFailed,
    /// A prerequisite of the step was never bound
    Skipped,
}

impl Outcome {
    /// Returns `true` only for [`Outcome::Applied`].
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Outcome::Applied
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => write!(f, "Applied"),
            Outcome::NoMatch => write!(f, "NoMatch"),
            Outcome::Ambiguous(count) => write!(f, "Ambiguous({count})"),
            Outcome::ActionFailed => write!(f, "ActionFailed"),
            Outcome::Skipped => write!(f, "Skipped"),
        }
    }
}

/// The outcome of one labeled step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Full label of the step (including any fan-out prefix)
    pub label: String,
    /// What happened
    pub outcome: Outcome,
}

/// Outcomes of all steps of a run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Name of the catalog that ran
    pub catalog: String,
    /// Step outcomes in execution order
    pub steps: Vec<StepOutcome>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunReport {
    /// Creates an empty report for `catalog`.
    #[must_use]
    pub fn new(catalog: impl Into<String>) -> Self {
        RunReport {
            catalog: catalog.into(),
            ..Self::default()
        }
    }

    /// Appends the outcome of a step.
    pub fn push(&mut self, label: impl Into<String>, outcome: Outcome) {
        self.steps.push(StepOutcome {
            label: label.into(),
            outcome,
        });
    }

    /// The last recorded outcome for `label`.
    #[must_use]
    pub fn outcome(&self, label: &str) -> Option<Outcome> {
        self.steps
            .iter()
            .rev()
            .find(|s| s.label == label)
            .map(|s| s.outcome)
    }

    /// Number of steps whose outcome satisfies `filter`.
    pub fn count(&self, filter: impl Fn(Outcome) -> bool) -> usize {
        self.steps.iter().filter(|s| filter(s.outcome)).count()
    }

    /// Number of applied steps.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.count(Outcome::is_success)
    }

    /// Generates a one-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} step(s): {} applied, {} no match, {} ambiguous, {} failed, {} skipped in {:.2?}",
            self.catalog,
            self.steps.len(),
            self.applied(),
            self.count(|o| o == Outcome::NoMatch),
            self.count(|o| matches!(o, Outcome::Ambiguous(_))),
            self.count(|o| o == Outcome::ActionFailed),
            self.count(|o| o == Outcome::Skipped),
            self.elapsed
        )
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{:<14} {}", step.outcome.to_string(), step.label)?;
        }
        write!(f, "{}", self.summary())
    }
}

/// Everything a rename run produced.
#[derive(Debug)]
pub struct RunResult {
    /// Step outcomes
    pub report: RunReport,
    /// Diagnostics in emission order
    pub diagnostics: Diagnostics,
    /// Renames and visibility changes
    pub tracker: RenameTracker,
}

impl RunResult {
    /// Report summary plus diagnostic counts.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}\n{} renamed, {} made public, {} warning(s), {} error(s)",
            self.report.summary(),
            self.tracker.len(),
            self.tracker.publicized().len(),
            self.diagnostics.warning_count(),
            self.diagnostics.error_count()
        )
    }
}
