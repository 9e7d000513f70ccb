//! Catalog steps.
//!
//! A catalog is an ordered list of [`Step`]s; declaration order is evaluation order.
//! The step kinds cover everything a rename catalog needs:
//!
//! - [`Rule`] - match exactly one element among candidates, then apply actions
//! - [`Apply`] - apply actions to an element selected directly (a named type, the base
//!   of a type, a bound slot)
//! - [`Guarded`] - sub-steps that only run once their prerequisites are bound
//! - [`FanOut`] - a sub-pipeline run once for every subclass of a bound type
//! - [`FnStep`] - a closure, for steps that do not fit the shapes above
//!
//! # Examples
//!
//! ```rust
//! use dotrename::deobfuscation::{MethodMatcher, Rule, Slot};
//! use dotrename::metadata::typesystem::TypeDef;
//!
//! const CONSOLE: Slot<TypeDef> = Slot::new("ConsoleSdtd");
//!
//! let rule = Rule::methods("ConsoleSdtd.Run()")
//!     .within(CONSOLE)
//!     .matching(
//!         MethodMatcher::new()
//!             .not_constructor()
//!             .public()
//!             .virtual_()
//!             .param_count(0)
//!             .min_code_size(20),
//!     )
//!     .rename("Run");
//! # let _ = rule;
//! ```

use crate::{
    deobfuscation::{
        action::{Action, Bind, MakePublic, Rename},
        context::MatchContext,
        diagnostics::DiagnosticCategory,
        predicate::Predicate,
        result::Outcome,
        scope::Slot,
        session::RenameSession,
    },
    metadata::{
        field::FieldDef,
        method::MethodDef,
        module::{Element, Module},
        token::Token,
        typesystem::TypeDef,
    },
};

/// One unit of a catalog.
pub trait Step {
    /// Label used in diagnostics and in the run report.
    fn label(&self) -> &str;

    /// Runs the step. Returns `true` if it fully succeeded.
    ///
    /// Steps never fail the run; everything that goes wrong is recorded in the session.
    fn execute(&self, session: &mut RenameSession<'_>) -> bool;
}

/// Elements that can be enumerated as members of a type.
pub trait Member: Element + 'static {
    /// Members of kind `Self` declared by `owner`.
    fn declared_by(module: &Module, owner: Token) -> Vec<Token>;

    /// Candidates of a rule that is not restricted to one type.
    fn module_wide(module: &Module) -> Vec<Token> {
        Self::table(module).iter().map(Element::token).collect()
    }
}

impl Member for TypeDef {
    fn declared_by(module: &Module, owner: Token) -> Vec<Token> {
        module
            .get::<TypeDef>(owner)
            .map(|t| t.nested.clone())
            .unwrap_or_default()
    }

    // Nested types are only reachable through `within`.
    fn module_wide(module: &Module) -> Vec<Token> {
        module
            .types()
            .iter()
            .filter(|t| !t.is_nested())
            .map(|t| t.token)
            .collect()
    }
}

impl Member for MethodDef {
    fn declared_by(module: &Module, owner: Token) -> Vec<Token> {
        module.methods_of(owner).map(|m| m.token).collect()
    }
}

impl Member for FieldDef {
    fn declared_by(module: &Module, owner: Token) -> Vec<Token> {
        module.fields_of(owner).map(|f| f.token).collect()
    }
}

/// How a step selects a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSel {
    /// The type with this full name (`Namespace.Name`, `Outer/Inner`)
    Named(String),
    /// The type bound to a slot
    Slot(Slot<TypeDef>),
    /// The base type of another selection, if it is defined in the module
    BaseOf(Box<TypeSel>),
}

impl TypeSel {
    /// The base type of this selection.
    #[must_use]
    pub fn base(self) -> Self {
        TypeSel::BaseOf(Box::new(self))
    }

    /// Resolves the selection.
    ///
    /// # Errors
    /// Returns [`Unresolved::Unbound`] if a slot the selection depends on is empty, and
    /// [`Unresolved::NotFound`] if a named type or base type is not in the module.
    pub fn resolve(&self, session: &RenameSession<'_>) -> Result<Token, Unresolved> {
        match self {
            TypeSel::Named(name) => session
                .module()
                .type_by_name(name)
                .map(|t| t.token)
                .map_err(|_| Unresolved::NotFound(name.clone())),
            TypeSel::Slot(slot) => session
                .slot(*slot)
                .ok_or_else(|| Unresolved::Unbound(slot.name().to_string())),
            TypeSel::BaseOf(inner) => {
                let derived = inner.resolve(session)?;
                session
                    .module()
                    .base_type(derived)
                    .map(|t| t.token)
                    .ok_or_else(|| Unresolved::NotFound(self.to_string()))
            }
        }
    }
}

/// Why a step could not select its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// A prerequisite slot was never bound
    Unbound(String),
    /// A named type or base type does not exist in the module
    NotFound(String),
}

impl Unresolved {
    /// Records the outcome of a step that could not select its element.
    ///
    /// An unbound prerequisite skips the step quietly; a missing type is a failed match
    /// and gets a warning.
    pub fn record(&self, session: &mut RenameSession<'_>, label: &str) {
        match self {
            Unresolved::Unbound(name) => session.skip(label, &[name.as_str()]),
            Unresolved::NotFound(name) => {
                session.warn(
                    DiagnosticCategory::Match,
                    label,
                    format!("type '{name}' not found"),
                );
                session.record(label, Outcome::NoMatch);
            }
        }
    }
}

impl std::fmt::Display for TypeSel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeSel::Named(name) => write!(f, "{name}"),
            TypeSel::Slot(slot) => write!(f, "{}", slot.name()),
            TypeSel::BaseOf(inner) => write!(f, "{inner}.base"),
        }
    }
}

impl From<&str> for TypeSel {
    fn from(name: &str) -> Self {
        TypeSel::Named(name.to_string())
    }
}

impl From<String> for TypeSel {
    fn from(name: String) -> Self {
        TypeSel::Named(name)
    }
}

impl From<Slot<TypeDef>> for TypeSel {
    fn from(slot: Slot<TypeDef>) -> Self {
        TypeSel::Slot(slot)
    }
}

/// Where a rule takes its candidates from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Every element of the kind in the module; for types, the top-level ones
    Module,
    /// The members of one type
    Within(TypeSel),
}

/// Match exactly one element of kind `E`, then apply actions to it.
pub struct Rule<E> {
    label: String,
    source: Source,
    predicate: Box<dyn Predicate<E>>,
    actions: Vec<Box<dyn Action>>,
}

impl Rule<TypeDef> {
    /// A rule over the types of the module.
    #[must_use]
    pub fn types(label: impl Into<String>) -> Self {
        Self::new(label)
    }
}

impl Rule<MethodDef> {
    /// A rule over the methods of the module.
    #[must_use]
    pub fn methods(label: impl Into<String>) -> Self {
        Self::new(label)
    }
}

impl Rule<FieldDef> {
    /// A rule over the fields of the module.
    #[must_use]
    pub fn fields(label: impl Into<String>) -> Self {
        Self::new(label)
    }
}

impl<E: Member> Rule<E> {
    /// A rule accepting every element of the module until narrowed down.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Rule {
            label: label.into(),
            source: Source::Module,
            predicate: Box::new(|_: &MatchContext<'_>, _: &E| true),
            actions: Vec::new(),
        }
    }

    /// Restricts the candidates to members of the selected type.
    #[must_use]
    pub fn within(mut self, owner: impl Into<TypeSel>) -> Self {
        self.source = Source::Within(owner.into());
        self
    }

    /// Sets the predicate.
    #[must_use]
    pub fn matching(mut self, predicate: impl Predicate<E> + 'static) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    /// Appends an action.
    #[must_use]
    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Appends a rename.
    #[must_use]
    pub fn rename(self, name: impl Into<String>) -> Self {
        self.then(Rename(name.into()))
    }

    /// Appends a visibility elevation.
    #[must_use]
    pub fn make_public(self) -> Self {
        self.then(MakePublic)
    }

    /// Appends a binding of the match to `slot`.
    #[must_use]
    pub fn bind(self, slot: Slot<E>) -> Self {
        self.then(Bind(slot))
    }

    fn candidates(&self, session: &RenameSession<'_>) -> Result<Vec<Token>, Unresolved> {
        let module = session.module();
        match &self.source {
            Source::Module => Ok(E::module_wide(module)),
            Source::Within(owner) => Ok(E::declared_by(module, owner.resolve(session)?)),
        }
    }
}

impl<E: Member> Step for Rule<E> {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self, session: &mut RenameSession<'_>) -> bool {
        match self.candidates(session) {
            Ok(candidates) => {
                session.resolve(&self.label, candidates, self.predicate.as_ref(), &self.actions)
            }
            Err(unresolved) => {
                unresolved.record(session, &self.label);
                false
            }
        }
    }
}

/// What an [`Apply`] step acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A selected type
    Type(TypeSel),
    /// Whatever element is bound to the named slot
    Slot(&'static str),
}

/// Apply actions to a directly selected element.
pub struct Apply {
    label: String,
    target: Target,
    actions: Vec<Box<dyn Action>>,
}

impl Apply {
    /// Acts on the selected type.
    #[must_use]
    pub fn to_type(label: impl Into<String>, target: impl Into<TypeSel>) -> Self {
        Apply {
            label: label.into(),
            target: Target::Type(target.into()),
            actions: Vec::new(),
        }
    }

    /// Acts on the element bound to `slot`.
    #[must_use]
    pub fn to_slot<E>(label: impl Into<String>, slot: Slot<E>) -> Self {
        Apply {
            label: label.into(),
            target: Target::Slot(slot.name()),
            actions: Vec::new(),
        }
    }

    /// Appends an action.
    #[must_use]
    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Appends a rename.
    #[must_use]
    pub fn rename(self, name: impl Into<String>) -> Self {
        self.then(Rename(name.into()))
    }

    /// Appends a visibility elevation.
    #[must_use]
    pub fn make_public(self) -> Self {
        self.then(MakePublic)
    }
}

impl Step for Apply {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self, session: &mut RenameSession<'_>) -> bool {
        let target = match &self.target {
            Target::Type(selection) => selection.resolve(session),
            Target::Slot(name) => session
                .scope()
                .get_named(name)
                .ok_or_else(|| Unresolved::Unbound((*name).to_string())),
        };

        match target {
            Ok(token) => session.apply(&self.label, token, &self.actions),
            Err(unresolved) => {
                unresolved.record(session, &self.label);
                false
            }
        }
    }
}

/// Sub-steps that only run once every required slot is bound.
///
/// When a prerequisite is missing, every sub-step is recorded as skipped and a single
/// note names the prerequisite.
pub struct Guarded {
    label: String,
    requires: Vec<&'static str>,
    steps: Vec<Box<dyn Step>>,
}

impl Guarded {
    /// An empty group.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Guarded {
            label: label.into(),
            requires: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Adds a prerequisite.
    #[must_use]
    pub fn requires<E>(mut self, slot: Slot<E>) -> Self {
        self.requires.push(slot.name());
        self
    }

    /// Appends a sub-step.
    #[must_use]
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Appends several sub-steps.
    #[must_use]
    pub fn steps(mut self, steps: Vec<Box<dyn Step>>) -> Self {
        self.steps.extend(steps);
        self
    }
}

impl Step for Guarded {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self, session: &mut RenameSession<'_>) -> bool {
        let missing: Vec<&str> = self
            .requires
            .iter()
            .copied()
            .filter(|name| session.scope().get_named(name).is_none())
            .collect();

        if !missing.is_empty() {
            for step in &self.steps {
                session.skip(step.label(), &missing);
            }
            return false;
        }

        let mut success = true;
        for step in &self.steps {
            success &= step.execute(session);
        }
        success
    }
}

/// A sub-pipeline run once for every top-level type whose base type is the bound `base`.
///
/// Each run gets the subclass bound to `subclass`, its own copy of the scope and a
/// label prefix `<label>[<subclass name>]`, so outcomes of one subclass never leak into
/// another.
pub struct FanOut {
    label: String,
    base: Slot<TypeDef>,
    subclass: Slot<TypeDef>,
    steps: Vec<Box<dyn Step>>,
    report_derived: bool,
}

impl FanOut {
    /// Fans out over the subclasses of `base`.
    #[must_use]
    pub fn new(label: impl Into<String>, base: Slot<TypeDef>, subclass: Slot<TypeDef>) -> Self {
        FanOut {
            label: label.into(),
            base,
            subclass,
            steps: Vec::new(),
            report_derived: false,
        }
    }

    /// Appends a sub-step.
    #[must_use]
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Appends several sub-steps.
    #[must_use]
    pub fn steps(mut self, steps: Vec<Box<dyn Step>>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// After each subclass' pipeline, reports the types deriving from that subclass.
    #[must_use]
    pub fn report_derived(mut self) -> Self {
        self.report_derived = true;
        self
    }

    fn run_subclass(&self, session: &mut RenameSession<'_>, subclass: Token) -> bool {
        if let Err(error) = session.bind(self.subclass, subclass) {
            session.error(DiagnosticCategory::Action, &self.label, error.to_string());
            return false;
        }

        let mut success = true;
        for step in &self.steps {
            success &= step.execute(session);
        }
        if self.report_derived {
            session.report_derived("derived", subclass);
        }
        success
    }
}

impl Step for FanOut {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self, session: &mut RenameSession<'_>) -> bool {
        let Some(base) = session.slot(self.base) else {
            session.skip(&self.label, &[self.base.name()]);
            return false;
        };

        let subclasses = session.module().derived_types(base);
        if subclasses.is_empty() {
            session.info(DiagnosticCategory::Relationship, &self.label, "no subclasses");
        }

        let mut success = true;
        for subclass in subclasses {
            let prefix = format!(
                "{}[{}]",
                self.label,
                session.module().name_of(subclass).unwrap_or_default()
            );
            success &= session.isolated(|session| {
                session.with_prefix(prefix, |session| self.run_subclass(session, subclass))
            });
        }
        success
    }
}

/// A closure step. The closure reports its outcome, which is recorded under the step's
/// label; diagnostics raised by scans inside it are tagged with the label as well.
pub struct FnStep<F> {
    label: String,
    f: F,
}

/// Wraps a closure as a step.
pub fn step<F>(label: impl Into<String>, f: F) -> FnStep<F>
where
    F: Fn(&mut RenameSession<'_>, &str) -> Outcome,
{
    FnStep {
        label: label.into(),
        f,
    }
}

impl<F> Step for FnStep<F>
where
    F: Fn(&mut RenameSession<'_>, &str) -> Outcome,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self, session: &mut RenameSession<'_>) -> bool {
        let outcome = session.in_step(&self.label, |session| (self.f)(session, &self.label));
        session.record(&self.label, outcome);
        outcome.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        deobfuscation::{
            config::RenameConfig,
            predicate::{FieldMatcher, MethodMatcher, TypeMatcher},
        },
        metadata::builder::{MethodBuilder, ModuleBuilder, TypeBuilder},
        test::factories::sample_module,
    };

    const WORLD: Slot<TypeDef> = Slot::new("World");
    const PLAYER: Slot<TypeDef> = Slot::new("Player");
    const SUBCLASS: Slot<TypeDef> = Slot::new("Subclass");

    #[test]
    fn test_rule_within_named_type() {
        let mut module = sample_module();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let rule = Rule::fields("World.gameTime")
            .within("Game.World")
            .matching(FieldMatcher::new().of_type("System.UInt64"))
            .make_public()
            .rename("gameTime");
        assert!(rule.execute(&mut session));

        let world = session.module().type_by_name("Game.World").unwrap().token;
        let field = session.module().fields_of(world).next().unwrap();
        assert_eq!(field.name, "gameTime");
        assert!(field.is_public());
    }

    #[test]
    fn test_missing_named_type_is_no_match() {
        let mut module = sample_module();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let rule = Rule::methods("Chunk.GetMapColors()").within("Chunk");
        assert!(!rule.execute(&mut session));
        assert_eq!(
            session.report().outcome("Chunk.GetMapColors()"),
            Some(Outcome::NoMatch)
        );

        let warnings = session.diagnostics().warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].category, DiagnosticCategory::Match);
        assert_eq!(warnings[0].message, "type 'Chunk' not found");
        assert!(session
            .diagnostics()
            .by_category(DiagnosticCategory::Prerequisite)
            .is_empty());
    }

    #[test]
    fn test_unbound_slot_skips() {
        let mut module = sample_module();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let rule = Rule::methods("Player.a").within(PLAYER).rename("A");
        assert!(!rule.execute(&mut session));
        assert_eq!(session.report().outcome("Player.a"), Some(Outcome::Skipped));
        assert_eq!(session.diagnostics().warning_count(), 0);
        assert_eq!(
            session
                .diagnostics()
                .by_category(DiagnosticCategory::Prerequisite)
                .len(),
            1
        );
    }

    #[test]
    fn test_bind_then_use_slot() {
        let mut module = sample_module();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let bind = Rule::types("World")
            .matching(TypeMatcher::new().with_methods(MethodMatcher::new().static_(), 1))
            .bind(WORLD);
        let rename = Rule::methods("World.IsDedicated")
            .within(WORLD)
            .matching(MethodMatcher::new().static_())
            .rename("IsDedicated");
        assert!(bind.execute(&mut session));
        assert!(rename.execute(&mut session));
        assert!(session.slot(WORLD).is_some());
    }

    #[test]
    fn test_apply_to_base_type() {
        let mut module = sample_module();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let step = Apply::to_type("EntityBase", TypeSel::from("Game.c").base()).rename("EntityPlayer");
        assert!(step.execute(&mut session));
        assert!(session.module().type_by_name("Game.EntityPlayer").is_ok());

        let missing = Apply::to_type("NoBase", TypeSel::from("Game.Player").base()).rename("X");
        assert!(!missing.execute(&mut session));
        assert_eq!(session.report().outcome("NoBase"), Some(Outcome::NoMatch));
        let warnings = session.diagnostics().warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "type 'Game.Player.base' not found");
    }

    #[test]
    fn test_module_wide_type_rule_ignores_nested() {
        let mut module = ModuleBuilder::new("Test")
            .add_type(
                TypeBuilder::new("", "a")
                    .method(MethodBuilder::new("Run").public().static_())
                    .nested(
                        TypeBuilder::new("", "b")
                            .method(MethodBuilder::new("Run").public().static_()),
                    ),
            )
            .build()
            .unwrap();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let rule = Rule::types("Program")
            .matching(TypeMatcher::new().with_methods(MethodMatcher::new().static_(), 1))
            .rename("Program");
        assert!(rule.execute(&mut session));
        assert!(session.module().type_by_name("Program").is_ok());
        assert!(session.module().type_by_name("Program/b").is_ok());
    }

    #[test]
    fn test_fan_out_skips_nested_subclasses() {
        let mut module = ModuleBuilder::new("Test")
            .add_type(TypeBuilder::new("", "Base").public())
            .add_type(TypeBuilder::new("", "a").extends("Base"))
            .add_type(
                TypeBuilder::new("", "c").nested(TypeBuilder::new("", "d").extends("Base")),
            )
            .build()
            .unwrap();
        let base = module.type_by_name("Base").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());
        session.bind(PLAYER, base).unwrap();

        let fan_out = FanOut::new("Commands", PLAYER, SUBCLASS).step(
            step("Name", |session, _| {
                let subclass = session.slot(SUBCLASS).unwrap();
                let name = format!("Command_{}", session.module().name_of(subclass).unwrap());
                session.rename(subclass, &name).unwrap();
                Outcome::Applied
            }),
        );
        assert!(fan_out.execute(&mut session));

        assert_eq!(session.report().outcome("Commands[a]/Name"), Some(Outcome::Applied));
        assert_eq!(session.report().outcome("Commands[d]/Name"), None);
        assert!(session.module().type_by_name("c/d").is_ok());
    }

    #[test]
    fn test_guarded_skips_all_sub_steps_with_one_note() {
        let mut module = sample_module();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let group = Guarded::new("Player members")
            .requires(PLAYER)
            .step(Rule::methods("Player.a").within(PLAYER).rename("A"))
            .step(Rule::fields("Player.b").within(PLAYER).rename("B"));
        assert!(!group.execute(&mut session));
        assert_eq!(session.report().outcome("Player.a"), Some(Outcome::Skipped));
        assert_eq!(session.report().outcome("Player.b"), Some(Outcome::Skipped));
        assert_eq!(session.diagnostics().count(), 1);
    }

    #[test]
    fn test_fan_out_isolates_subclasses() {
        let mut module = ModuleBuilder::new("Test")
            .add_type(TypeBuilder::new("", "Base").public())
            .add_type(
                TypeBuilder::new("", "a")
                    .extends("Base")
                    .method(MethodBuilder::new("x").public().returns("System.Int32"))
                    .method(MethodBuilder::new("y").public().returns("System.Int32")),
            )
            .add_type(
                TypeBuilder::new("", "b")
                    .extends("Base")
                    .method(MethodBuilder::new("x").public().returns("System.Int32")),
            )
            .build()
            .unwrap();
        let base = module.type_by_name("Base").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());
        session.bind(PLAYER, base).unwrap();

        let fan_out = FanOut::new("Commands", PLAYER, SUBCLASS).step(
            Rule::methods("RepeatInterval()")
                .within(SUBCLASS)
                .matching(MethodMatcher::new().public().returns("System.Int32"))
                .rename("RepeatInterval"),
        );
        assert!(!fan_out.execute(&mut session));

        assert_eq!(
            session.report().outcome("Commands[a]/RepeatInterval()"),
            Some(Outcome::Ambiguous(2))
        );
        assert_eq!(
            session.report().outcome("Commands[b]/RepeatInterval()"),
            Some(Outcome::Applied)
        );
        let b = session.module().type_by_name("b").unwrap().token;
        assert_eq!(
            session.module().methods_of(b).next().map(|m| m.name.as_str()),
            Some("RepeatInterval")
        );
        assert!(session.slot(SUBCLASS).is_none());
    }

    #[test]
    fn test_fn_step_records_outcome() {
        let mut module = sample_module();
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let custom = step("custom", |session, label| {
            session.warn(DiagnosticCategory::Naming, label, "No name found");
            Outcome::NoMatch
        });
        assert!(!custom.execute(&mut session));
        assert_eq!(session.report().outcome("custom"), Some(Outcome::NoMatch));
        assert_eq!(session.diagnostics().for_label("custom").len(), 1);
    }
}
