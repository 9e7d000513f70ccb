//! Mutable state of one catalog run.
//!
//! A [`RenameSession`] owns exclusive access to the module for the duration of a run,
//! together with everything the run accumulates: the scope of bound slots, the rename
//! tracker, diagnostics and the per-step report. Steps and actions only ever talk to
//! the session; it is the single place where renames are checked for consistency and
//! where outcomes are turned into diagnostics.

use std::collections::BTreeSet;

use log::debug;

use crate::{
    deobfuscation::{
        action::Action,
        config::RenameConfig,
        context::MatchContext,
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
        predicate::Predicate,
        resolver::{self, MatchResult},
        result::{Outcome, RunReport, RunResult},
        scope::{Scope, Slot},
        tracker::RenameTracker,
    },
    metadata::{
        module::{Element, ElementKind, Module},
        token::Token,
    },
    Error, Result,
};

/// State threaded through every step of a run.
pub struct RenameSession<'m> {
    module: &'m mut Module,
    config: RenameConfig,
    scope: Scope,
    tracker: RenameTracker,
    diagnostics: Diagnostics,
    report: RunReport,
    noted: BTreeSet<String>,
    prefixes: Vec<String>,
    active: Vec<String>,
}

impl<'m> RenameSession<'m> {
    /// Starts a session over `module`.
    pub fn new(module: &'m mut Module, config: RenameConfig) -> Self {
        RenameSession {
            module,
            config,
            scope: Scope::new(),
            tracker: RenameTracker::new(),
            diagnostics: Diagnostics::new(),
            report: RunReport::default(),
            noted: BTreeSet::new(),
            prefixes: Vec::new(),
            active: Vec::new(),
        }
    }

    /// The module, read-only.
    #[must_use]
    pub fn module(&self) -> &Module {
        &*self.module
    }

    /// The module, for mutations outside the rename and visibility checks.
    pub fn module_mut(&mut self) -> &mut Module {
        &mut *self.module
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &RenameConfig {
        &self.config
    }

    /// Bindings made so far.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Renames and visibility changes made so far.
    #[must_use]
    pub fn tracker(&self) -> &RenameTracker {
        &self.tracker
    }

    /// Diagnostics emitted so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Step outcomes recorded so far.
    #[must_use]
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// A predicate context over the current module state and scope.
    #[must_use]
    pub fn context(&self) -> MatchContext<'_> {
        MatchContext::new(&*self.module, &self.scope)
    }

    /// The full label of a step, including the prefixes of enclosing fan-outs.
    #[must_use]
    pub fn label(&self, label: &str) -> String {
        if self.prefixes.is_empty() {
            return label.to_string();
        }
        format!("{}/{}", self.prefixes.join("/"), label)
    }

    /// Runs `f` with `prefix` added to every label it records.
    pub fn with_prefix<T>(&mut self, prefix: String, f: impl FnOnce(&mut Self) -> T) -> T {
        self.prefixes.push(prefix);
        let result = f(self);
        self.prefixes.pop();
        result
    }

    /// Runs `f` on a copy of the current scope; bindings it makes are discarded.
    pub fn isolated<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.scope.clone();
        let result = f(self);
        self.scope = saved;
        result
    }

    /// Binds `slot` to `token`.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedTable`] if `token` is not an element of kind `E`.
    pub fn bind<E: Element>(&mut self, slot: Slot<E>, token: Token) -> Result<()> {
        self.scope.bind(slot, token)?;
        debug!("bound '{}' to {}", slot.name(), token);
        Ok(())
    }

    /// The token bound to `slot`.
    #[must_use]
    pub fn slot<E>(&self, slot: Slot<E>) -> Option<Token> {
        self.scope.get(slot)
    }

    /// Evaluates `predicate` on `candidates` without recording anything.
    pub fn find<E: Element>(
        &self,
        candidates: impl IntoIterator<Item = Token>,
        predicate: &dyn Predicate<E>,
    ) -> MatchResult {
        resolver::find(&self.context(), candidates, predicate)
    }

    /// Resolves the unique element among `candidates` and applies `actions` to it.
    ///
    /// Zero matches emit a warning, several matches an error; both leave the module
    /// untouched. If nothing matched because the predicate read a slot that was never
    /// bound, the step counts as skipped instead. Returns `true` only if an element was
    /// matched and every action succeeded.
    pub fn resolve<E: Element>(
        &mut self,
        label: &str,
        candidates: impl IntoIterator<Item = Token>,
        predicate: &dyn Predicate<E>,
        actions: &[Box<dyn Action>],
    ) -> bool {
        let (result, unbound) = {
            let ctx = self.context();
            let result = resolver::find(&ctx, candidates, predicate);
            (result, ctx.unbound_slots())
        };

        match result {
            MatchResult::Unique(token) => self.apply(label, token, actions),
            MatchResult::Missing if !unbound.is_empty() => {
                self.skip(label, &unbound);
                false
            }
            MatchResult::Missing => {
                self.warn(
                    DiagnosticCategory::Match,
                    label,
                    format!("no {} matches", E::KIND),
                );
                self.record(label, Outcome::NoMatch);
                false
            }
            MatchResult::Ambiguous(tokens) => {
                self.error(
                    DiagnosticCategory::Match,
                    label,
                    format!("{} {}s match, expected exactly one", tokens.len(), E::KIND),
                );
                self.record(label, Outcome::Ambiguous(tokens.len()));
                false
            }
        }
    }

    /// Applies `actions` in order to `target`, stopping at the first failure.
    pub fn apply(&mut self, label: &str, target: Token, actions: &[Box<dyn Action>]) -> bool {
        let failure = self.in_step(label, |session| {
            actions
                .iter()
                .find_map(|action| action.apply(session, target).err().map(|e| (action, e)))
        });

        if let Some((action, error)) = failure {
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Error,
                    DiagnosticCategory::Action,
                    self.label(label),
                    format!("{} failed: {}", action.describe(), error),
                )
                .with_token(target),
            );
            self.record(label, Outcome::ActionFailed);
            return false;
        }

        self.record(label, Outcome::Applied);
        true
    }

    /// Runs `f` as part of the step `label`; diagnostics raised by scans inside `f` are
    /// tagged with it.
    pub fn in_step<T>(&mut self, label: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.active.push(label.to_string());
        let result = f(self);
        self.active.pop();
        result
    }

    /// Label of the step whose actions are running, empty outside of any step.
    #[must_use]
    pub fn current_label(&self) -> &str {
        self.active.last().map_or("", String::as_str)
    }

    /// Renames `target`, subject to the reassignment and collision checks.
    ///
    /// Renaming an element to its current name succeeds without any change.
    ///
    /// # Errors
    /// [`Error::AlreadyRenamed`] if the element received another name earlier in this
    /// run, [`Error::NameCollision`] if the name is taken in the element's scope,
    /// [`Error::InvalidToken`] if `target` is not an element.
    pub fn rename(&mut self, target: Token, name: &str) -> Result<()> {
        let kind = ElementKind::from_token(target).ok_or(Error::InvalidToken(target))?;
        let current = self
            .module
            .name_of(target)
            .ok_or(Error::InvalidToken(target))?;
        if current == name {
            return Ok(());
        }

        if !self.config.allow_reassign {
            if let Some(assigned) = self.tracker.assigned_name(target) {
                return Err(Error::AlreadyRenamed {
                    token: target,
                    assigned: assigned.to_string(),
                    requested: name.to_string(),
                });
            }
        }

        let scope = self.module.scope_of(target);
        if self.config.check_name_collisions {
            if let Some(existing) = self.module.name_conflict(target, name) {
                return Err(Error::NameCollision {
                    name: name.to_string(),
                    scope,
                    existing,
                });
            }
        }

        let original = self.module.set_name(target, name)?;
        debug!("renamed {} '{}' -> '{}' ({})", kind, original, name, target);
        self.tracker
            .record(target, kind, scope, original, name.to_string());
        Ok(())
    }

    /// Makes `target` public. Already public elements are left alone.
    ///
    /// # Errors
    /// Fails for parameters and tokens that are not elements.
    pub fn make_public(&mut self, target: Token) -> Result<()> {
        if self.module.make_public(target)? {
            debug!("made {} public", target);
            self.tracker.record_publicized(target);
        }
        Ok(())
    }

    /// Records a skipped step whose prerequisites `missing` were never bound.
    ///
    /// Each missing prerequisite produces at most one note per run, no matter how many
    /// steps depend on it.
    pub fn skip(&mut self, label: &str, missing: &[&str]) {
        self.note_missing(label, missing);
        self.record(label, Outcome::Skipped);
    }

    /// Emits the prerequisite notes of [`RenameSession::skip`] without recording an
    /// outcome.
    pub fn note_missing(&mut self, label: &str, missing: &[&str]) {
        if self.config.skip_notes {
            for name in missing {
                if self.noted.insert((*name).to_string()) {
                    self.diagnostics.info(
                        DiagnosticCategory::Prerequisite,
                        self.label(label),
                        format!("'{name}' was never resolved, dependent steps are skipped"),
                    );
                }
            }
        }
    }

    /// Reports every type directly deriving from `base`.
    ///
    /// The base is shown by the name this run assigned to it, if any.
    pub fn report_derived(&mut self, label: &str, base: Token) {
        if !self.config.report_relationships {
            return;
        }

        let base_name = self
            .tracker
            .assigned_name(base)
            .or_else(|| self.module.name_of(base))
            .unwrap_or_default()
            .to_string();
        for derived in self.module.derived_types(base) {
            let derived_name = self.module.name_of(derived).unwrap_or_default();
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Info,
                    DiagnosticCategory::Relationship,
                    self.label(label),
                    format!("{base_name} <- {derived_name}"),
                )
                .with_token(derived),
            );
        }
    }

    /// Emits an informational diagnostic for `label`.
    pub fn info(&self, category: DiagnosticCategory, label: &str, message: impl Into<String>) {
        self.diagnostics.info(category, self.label(label), message);
    }

    /// Emits a warning for `label`.
    pub fn warn(&self, category: DiagnosticCategory, label: &str, message: impl Into<String>) {
        self.diagnostics.warning(category, self.label(label), message);
    }

    /// Emits an error for `label`.
    pub fn error(&self, category: DiagnosticCategory, label: &str, message: impl Into<String>) {
        self.diagnostics.error(category, self.label(label), message);
    }

    /// Records the outcome of a step.
    pub fn record(&mut self, label: &str, outcome: Outcome) {
        let label = self.label(label);
        debug!("{label}: {outcome}");
        self.report.push(label, outcome);
    }

    /// Ends the session, handing out everything it accumulated.
    #[must_use]
    pub fn finish(self, catalog: &str) -> RunResult {
        let mut report = self.report;
        report.catalog = catalog.to_string();
        RunResult {
            report,
            diagnostics: self.diagnostics,
            tracker: self.tracker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        deobfuscation::{
            action::{rename, MakePublic},
            predicate::MethodMatcher,
        },
        metadata::{method::MethodDef, typesystem::TypeDef},
        test::factories::sample_module,
    };

    const WORLD: Slot<TypeDef> = Slot::new("World");

    fn world_methods(module: &Module) -> Vec<Token> {
        let world = module.type_by_name("Game.World").unwrap().token;
        module.methods_of(world).map(|m| m.token).collect()
    }

    #[test]
    fn test_resolve_unique_applies_actions() {
        let mut module = sample_module();
        let candidates = world_methods(&module);
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let matcher = MethodMatcher::new()
            .not_constructor()
            .public()
            .static_()
            .param_count(0)
            .returns("System.Boolean");
        let actions: Vec<Box<dyn Action>> = vec![Box::new(rename("IsDedicated"))];
        assert!(session.resolve::<MethodDef>("World.IsDedicated", candidates, &matcher, &actions));
        assert_eq!(session.report().outcome("World.IsDedicated"), Some(Outcome::Applied));
        assert!(!session.diagnostics().has_any());
    }

    #[test]
    fn test_resolve_missing_and_ambiguous() {
        let mut module = sample_module();
        let candidates = world_methods(&module);
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let none = MethodMatcher::new().param_count(7);
        assert!(!session.resolve::<MethodDef>("none", candidates.clone(), &none, &[]));
        assert_eq!(session.report().outcome("none"), Some(Outcome::NoMatch));
        assert_eq!(session.diagnostics().warning_count(), 1);

        let public = MethodMatcher::new().not_constructor().public();
        assert!(!session.resolve::<MethodDef>("many", candidates, &public, &[]));
        assert_eq!(session.report().outcome("many"), Some(Outcome::Ambiguous(3)));
        assert_eq!(session.diagnostics().error_count(), 1);
    }

    #[test]
    fn test_unbound_slot_skips_with_single_note() {
        let mut module = sample_module();
        let candidates = world_methods(&module);
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let matcher = MethodMatcher::new().declared_in(WORLD);
        for label in ["first", "second"] {
            assert!(!session.resolve::<MethodDef>(label, candidates.clone(), &matcher, &[]));
            assert_eq!(session.report().outcome(label), Some(Outcome::Skipped));
        }
        assert_eq!(session.diagnostics().count(), 1);
        assert_eq!(session.diagnostics().info_count(), 1);
    }

    #[test]
    fn test_failing_action_stops_pipeline() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let actions: Vec<Box<dyn Action>> = vec![
            Box::new(rename("Player")),
            Box::new(MakePublic),
        ];
        assert!(!session.apply("collide", world, &actions));
        assert_eq!(session.report().outcome("collide"), Some(Outcome::ActionFailed));
        assert!(!session.module().is_public(world).unwrap());
        assert_eq!(session.diagnostics().errors()[0].token, Some(world));
    }

    #[test]
    fn test_reassignment_is_refused_unless_allowed() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        {
            let mut session = RenameSession::new(&mut module, RenameConfig::default());
            session.rename(world, "GameWorld").unwrap();
            assert!(matches!(
                session.rename(world, "Other"),
                Err(Error::AlreadyRenamed { .. })
            ));
        }

        let mut session = RenameSession::new(&mut module, RenameConfig::lenient());
        session.rename(world, "First").unwrap();
        session.rename(world, "Second").unwrap();
        assert_eq!(session.tracker().original_name(world), Some("GameWorld"));
        assert_eq!(session.tracker().assigned_name(world), Some("Second"));
    }

    #[test]
    fn test_labels_carry_prefixes() {
        let mut module = sample_module();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());
        session.with_prefix("Commands[c]".to_string(), |s| {
            s.record("Help", Outcome::NoMatch);
        });
        session.record("Done", Outcome::Applied);

        let labels: Vec<&str> = session.report().steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Commands[c]/Help", "Done"]);
    }

    #[test]
    fn test_report_derived_uses_assigned_name() {
        let mut module = sample_module();
        let player = module.type_by_name("Game.Player").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());
        session.rename(player, "EntityPlayer").unwrap();
        session.report_derived("Relations", player);

        let notes = session.diagnostics().by_category(DiagnosticCategory::Relationship);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "EntityPlayer <- c");
    }
}
