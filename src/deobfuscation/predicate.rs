//! Composable structural predicates over metadata elements.
//!
//! A [`Predicate`] decides whether an element is the one a rule is looking for. The
//! fluent matchers accumulate filter closures and match only if *all* of them hold,
//! so a rule narrows its candidates down by stacking structural facts:
//!
//! ```rust
//! use dotrename::deobfuscation::MethodMatcher;
//!
//! // public static bool X()
//! let matcher = MethodMatcher::new()
//!     .not_constructor()
//!     .public()
//!     .static_()
//!     .param_count(0)
//!     .returns("System.Boolean");
//! # let _ = matcher;
//! ```
//!
//! Plain closures `Fn(&MatchContext, &E) -> bool` are predicates as well. Predicates
//! must not mutate anything; they may read method bodies.

use crate::{
    deobfuscation::context::{MatchContext, TypeName},
    metadata::{
        field::FieldDef,
        method::{MethodDef, ParamDef},
        signatures::TypeSignature,
        typesystem::TypeDef,
    },
};

/// A pure test over an element of kind `E`.
pub trait Predicate<E> {
    /// Returns `true` if `element` satisfies this predicate.
    fn matches(&self, ctx: &MatchContext<'_>, element: &E) -> bool;
}

impl<E, F> Predicate<E> for F
where
    F: Fn(&MatchContext<'_>, &E) -> bool,
{
    fn matches(&self, ctx: &MatchContext<'_>, element: &E) -> bool {
        self(ctx, element)
    }
}

/// A boxed filter over elements of kind `E`.
type Filter<E> = Box<dyn Fn(&MatchContext<'_>, &E) -> bool>;

fn all<E>(filters: &[Filter<E>], ctx: &MatchContext<'_>, element: &E) -> bool {
    filters.iter().all(|filter| filter(ctx, element))
}

/// Returns `true` if `signature` names a type declared in the global namespace.
fn in_global_namespace(ctx: &MatchContext<'_>, signature: &TypeSignature) -> bool {
    let Some(token) = signature.element_type().type_token() else {
        return false;
    };
    if let Some(type_def) = ctx.get::<TypeDef>(token) {
        return type_def.namespace.is_empty() && !type_def.is_nested();
    }
    ctx.module()
        .type_ref(token)
        .is_some_and(|type_ref| type_ref.namespace.is_empty())
}

/// Fluent predicate over methods.
#[derive(Default)]
pub struct MethodMatcher {
    filters: Vec<Filter<MethodDef>>,
}

impl MethodMatcher {
    /// A matcher accepting every method.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary filter.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&MatchContext<'_>, &MethodDef) -> bool + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Methods with exactly this (current) name.
    #[must_use]
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.filter(move |_, m| m.name == name)
    }

    /// Excludes `.ctor` and `.cctor`.
    #[must_use]
    pub fn not_constructor(self) -> Self {
        self.filter(|_, m| !m.is_constructor())
    }

    /// Public methods.
    #[must_use]
    pub fn public(self) -> Self {
        self.filter(|_, m| m.is_public())
    }

    /// Private methods.
    #[must_use]
    pub fn private(self) -> Self {
        self.filter(|_, m| m.is_private())
    }

    /// Static methods.
    #[must_use]
    pub fn static_(self) -> Self {
        self.filter(|_, m| m.is_static())
    }

    /// Instance methods.
    #[must_use]
    pub fn instance(self) -> Self {
        self.filter(|_, m| !m.is_static())
    }

    /// Virtual methods.
    #[must_use]
    pub fn virtual_(self) -> Self {
        self.filter(|_, m| m.is_virtual())
    }

    /// Methods with exactly `count` parameters.
    #[must_use]
    pub fn param_count(self, count: usize) -> Self {
        self.filter(move |_, m| m.param_count() == count)
    }

    /// Methods whose parameter at `index` has type `name`.
    #[must_use]
    pub fn param_type(self, index: usize, name: impl Into<TypeName>) -> Self {
        let name = name.into();
        self.filter(move |ctx, m| {
            ctx.module()
                .param(m, index)
                .is_some_and(|p| ctx.has_type(&p.param_type, &name))
        })
    }

    /// Methods whose parameter at `index` is called `name`.
    #[must_use]
    pub fn param_named(self, index: usize, name: impl Into<String>) -> Self {
        let name = name.into();
        self.filter(move |ctx, m| {
            ctx.module()
                .param(m, index)
                .is_some_and(|p: &ParamDef| p.name == name)
        })
    }

    /// Methods returning `name`.
    #[must_use]
    pub fn returns(self, name: impl Into<TypeName>) -> Self {
        let name = name.into();
        self.filter(move |ctx, m| ctx.has_type(&m.return_type, &name))
    }

    /// Methods returning a type declared in the global namespace.
    #[must_use]
    pub fn returns_global_type(self) -> Self {
        self.filter(|ctx, m| in_global_namespace(ctx, &m.return_type))
    }

    /// Methods whose body is longer than `size` bytes.
    #[must_use]
    pub fn min_code_size(self, size: u64) -> Self {
        self.filter(move |_, m| m.code_size() > size)
    }

    /// Methods declared by the type `name`.
    #[must_use]
    pub fn declared_in(self, name: impl Into<TypeName>) -> Self {
        let name = name.into();
        self.filter(move |ctx, m| ctx.has_type(&TypeSignature::Class(m.declaring_type), &name))
    }
}

impl Predicate<MethodDef> for MethodMatcher {
    fn matches(&self, ctx: &MatchContext<'_>, element: &MethodDef) -> bool {
        all(&self.filters, ctx, element)
    }
}

/// Fluent predicate over fields.
#[derive(Default)]
pub struct FieldMatcher {
    filters: Vec<Filter<FieldDef>>,
}

impl FieldMatcher {
    /// A matcher accepting every field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary filter.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&MatchContext<'_>, &FieldDef) -> bool + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Fields with exactly this (current) name.
    #[must_use]
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.filter(move |_, f| f.name == name)
    }

    /// Public fields.
    #[must_use]
    pub fn public(self) -> Self {
        self.filter(|_, f| f.is_public())
    }

    /// Private fields.
    #[must_use]
    pub fn private(self) -> Self {
        self.filter(|_, f| f.is_private())
    }

    /// Static fields.
    #[must_use]
    pub fn static_(self) -> Self {
        self.filter(|_, f| f.is_static())
    }

    /// Instance fields.
    #[must_use]
    pub fn instance(self) -> Self {
        self.filter(|_, f| !f.is_static())
    }

    /// Fields of type `name`.
    #[must_use]
    pub fn of_type(self, name: impl Into<TypeName>) -> Self {
        let name = name.into();
        self.filter(move |ctx, f| ctx.has_type(&f.field_type, &name))
    }

    /// Fields whose type is a generic instantiation with exactly these arguments.
    #[must_use]
    pub fn generic_args<I, T>(self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        let names: Vec<TypeName> = names.into_iter().map(Into::into).collect();
        self.filter(move |ctx, f| ctx.has_generic_params(&f.field_type, &names))
    }

    /// Array-typed fields.
    #[must_use]
    pub fn array(self) -> Self {
        self.filter(|_, f| f.field_type.is_array())
    }
}

impl Predicate<FieldDef> for FieldMatcher {
    fn matches(&self, ctx: &MatchContext<'_>, element: &FieldDef) -> bool {
        all(&self.filters, ctx, element)
    }
}

/// Fluent predicate over types.
#[derive(Default)]
pub struct TypeMatcher {
    filters: Vec<Filter<TypeDef>>,
}

impl TypeMatcher {
    /// A matcher accepting every type.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary filter.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&MatchContext<'_>, &TypeDef) -> bool + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Types with exactly this (current) name.
    #[must_use]
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.filter(move |_, t| t.name == name)
    }

    /// Public types.
    #[must_use]
    pub fn public(self) -> Self {
        self.filter(|_, t| t.is_public())
    }

    /// Top-level (non-nested) types.
    #[must_use]
    pub fn top_level(self) -> Self {
        self.filter(|_, t| !t.is_nested())
    }

    /// Types whose base type is `name`.
    #[must_use]
    pub fn extends(self, name: impl Into<TypeName>) -> Self {
        let name = name.into();
        self.filter(move |ctx, t| t.base.as_ref().is_some_and(|b| ctx.has_type(b, &name)))
    }

    /// Types declaring exactly `count` methods that satisfy `matcher`.
    #[must_use]
    pub fn with_methods(self, matcher: MethodMatcher, count: usize) -> Self {
        self.filter(move |ctx, t| ctx.count_methods(t.token, &matcher) == count)
    }

    /// Types declaring at least one method that satisfies `matcher`.
    #[must_use]
    pub fn with_method(self, matcher: MethodMatcher) -> Self {
        self.filter(move |ctx, t| ctx.has_method(t.token, &matcher))
    }
}

impl Predicate<TypeDef> for TypeMatcher {
    fn matches(&self, ctx: &MatchContext<'_>, element: &TypeDef) -> bool {
        all(&self.filters, ctx, element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        deobfuscation::scope::{Scope, Slot},
        metadata::module::Module,
        test::factories::sample_module,
    };

    fn methods<'m>(module: &'m Module, ctx: &MatchContext<'_>, p: &MethodMatcher) -> Vec<&'m str> {
        module
            .methods()
            .iter()
            .filter(|m| p.matches(ctx, m))
            .map(|m| m.name.as_str())
            .collect()
    }

    #[test]
    fn test_empty_matcher_accepts_everything() {
        let module = sample_module();
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);
        assert_eq!(
            methods(&module, &ctx, &MethodMatcher::new()).len(),
            module.methods().len()
        );
    }

    #[test]
    fn test_conjunction_narrows_to_one() {
        let module = sample_module();
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);

        let matcher = MethodMatcher::new()
            .not_constructor()
            .public()
            .static_()
            .param_count(0)
            .returns("System.Boolean");
        assert_eq!(methods(&module, &ctx, &matcher), vec!["d"]);
    }

    #[test]
    fn test_param_predicates() {
        let module = sample_module();
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);

        let by_type = MethodMatcher::new().param_count(2).param_type(1, "bool");
        assert_eq!(methods(&module, &ctx, &by_type), vec!["e"]);

        let by_name = MethodMatcher::new().param_named(0, "_line");
        assert_eq!(methods(&module, &ctx, &by_name), vec!["e"]);

        let out_of_range = MethodMatcher::new().param_type(5, "bool");
        assert!(methods(&module, &ctx, &out_of_range).is_empty());
    }

    #[test]
    fn test_code_size_and_global_return() {
        let module = sample_module();
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);

        let long = MethodMatcher::new().min_code_size(20);
        assert_eq!(methods(&module, &ctx, &long), vec!["f"]);

        let global = MethodMatcher::new().returns_global_type();
        assert_eq!(methods(&module, &ctx, &global), vec!["g"]);
    }

    #[test]
    fn test_field_matchers() {
        let module = sample_module();
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);
        let names = |p: &FieldMatcher| -> Vec<String> {
            module
                .fields()
                .iter()
                .filter(|f| p.matches(&ctx, f))
                .map(|f| f.name.clone())
                .collect()
        };

        assert_eq!(names(&FieldMatcher::new().of_type("UInt64")), vec!["a"]);
        assert_eq!(names(&FieldMatcher::new().generic_args(["Player"])), vec!["b"]);
        assert_eq!(names(&FieldMatcher::new().of_type("List")), vec!["b"]);
        assert_eq!(names(&FieldMatcher::new().array()), vec!["c"]);
    }

    #[test]
    fn test_type_matcher_with_nested_method_query() {
        let module = sample_module();
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);

        let matcher = TypeMatcher::new().with_methods(
            MethodMatcher::new().public().static_().returns("Boolean"),
            1,
        );
        let matched: Vec<&str> = module
            .types()
            .iter()
            .filter(|t| matcher.matches(&ctx, t))
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(matched, vec!["World"]);
    }

    #[test]
    fn test_unbound_slot_never_matches() {
        const MISSING: Slot<TypeDef> = Slot::new("missing");
        let module = sample_module();
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);

        let matcher = TypeMatcher::new().extends(MISSING);
        assert!(module.types().iter().all(|t| !matcher.matches(&ctx, t)));
        assert_eq!(ctx.unbound_slots(), vec!["missing"]);
    }

    #[test]
    fn test_closure_predicate() {
        let module = sample_module();
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);
        let predicate = |_: &MatchContext<'_>, t: &TypeDef| t.name == "Player";
        assert_eq!(
            module.types().iter().filter(|t| predicate.matches(&ctx, t)).count(),
            1
        );
    }
}
