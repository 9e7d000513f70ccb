//! Configuration for the rename engine.
//!
//! This module provides [`RenameConfig`], which controls how a [`crate::deobfuscation::RenameSession`]
//! treats method bodies, consistency checks and informational reporting.

/// Configuration for a rename run.
///
/// Controls body normalization, consistency checking and which informational
/// diagnostics are emitted. None of these settings can make a run abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameConfig {
    /// Re-compact method bodies after they were simplified for scanning (default: true).
    pub restore_macros: bool,

    /// Report base/derived relationships of renamed subclasses (default: true).
    pub report_relationships: bool,

    /// Refuse renames that duplicate a type or field name in the same scope (default: true).
    pub check_name_collisions: bool,

    /// Allow an element renamed earlier in the run to receive a different name (default: false).
    pub allow_reassign: bool,

    /// Emit one informational note per unbound prerequisite that causes skips (default: true).
    pub skip_notes: bool,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            restore_macros: true,
            report_relationships: true,
            check_name_collisions: true,
            allow_reassign: false,
            skip_notes: true,
        }
    }
}

impl RenameConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a "strict" configuration.
    ///
    /// Same as the default; kept as a named preset so callers can state intent.
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Creates a "lenient" configuration.
    ///
    /// This configuration:
    /// - Skips name collision checks
    /// - Lets later rules overwrite names given by earlier rules
    /// - Drops skip notes and relationship reports
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            check_name_collisions: false,
            allow_reassign: true,
            skip_notes: false,
            report_relationships: false,
            ..Self::default()
        }
    }

    /// Sets whether bodies are re-compacted after scanning.
    #[must_use]
    pub fn with_restore_macros(mut self, enabled: bool) -> Self {
        self.restore_macros = enabled;
        self
    }

    /// Sets whether relationship reports are emitted.
    #[must_use]
    pub fn with_relationships(mut self, enabled: bool) -> Self {
        self.report_relationships = enabled;
        self
    }

    /// Sets whether name collisions are checked.
    #[must_use]
    pub fn with_collision_checks(mut self, enabled: bool) -> Self {
        self.check_name_collisions = enabled;
        self
    }

    /// Sets whether reassigning a name is allowed.
    #[must_use]
    pub fn with_reassign(mut self, enabled: bool) -> Self {
        self.allow_reassign = enabled;
        self
    }
}
