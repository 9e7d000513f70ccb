//! Read-only view predicates evaluate against.
//!
//! [`MatchContext`] bundles the module and the current [`Scope`]. Besides plain access it
//! offers the signature checks shared by all matchers ([`MatchContext::has_type`],
//! [`MatchContext::has_generic_params`]) and silent nested queries
//! ([`MatchContext::count_methods`]) that let a type predicate look at its members
//! without emitting diagnostics.
//!
//! Reads of unbound slots are remembered: when a rule finds nothing and one of its
//! predicates needed a slot that was never bound, the rule counts as skipped rather
//! than unmatched.

use std::{cell::RefCell, collections::BTreeSet};

use crate::{
    deobfuscation::{predicate::Predicate, scope::{Scope, Slot}},
    metadata::{
        method::MethodDef,
        module::{Element, Module},
        signatures::{simple_name, TypeSignature},
        token::Token,
        typesystem::TypeDef,
    },
};

/// A type named in a predicate: a literal name or a type bound earlier in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    /// Compared by simple name (`System.Int32` and `Int32` are equivalent)
    Literal(String),
    /// Compared by identity with the bound type definition
    Bound(Slot<TypeDef>),
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::Literal(name.to_string())
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        TypeName::Literal(name)
    }
}

impl From<Slot<TypeDef>> for TypeName {
    fn from(slot: Slot<TypeDef>) -> Self {
        TypeName::Bound(slot)
    }
}

/// The view a predicate evaluates against.
pub struct MatchContext<'a> {
    module: &'a Module,
    scope: &'a Scope,
    unbound: RefCell<BTreeSet<&'static str>>,
}

impl<'a> MatchContext<'a> {
    /// Creates a context over `module` and `scope`.
    #[must_use]
    pub fn new(module: &'a Module, scope: &'a Scope) -> Self {
        MatchContext {
            module,
            scope,
            unbound: RefCell::new(BTreeSet::new()),
        }
    }

    /// The module being matched.
    #[must_use]
    pub fn module(&self) -> &'a Module {
        self.module
    }

    /// The bindings made so far.
    #[must_use]
    pub fn scope(&self) -> &'a Scope {
        self.scope
    }

    /// Reads a slot, remembering it if it is unbound.
    #[must_use]
    pub fn slot<E>(&self, slot: Slot<E>) -> Option<Token> {
        let token = self.scope.get(slot);
        if token.is_none() {
            self.unbound.borrow_mut().insert(slot.name());
        }
        token
    }

    /// Slots read while unbound since this context was created.
    #[must_use]
    pub fn unbound_slots(&self) -> Vec<&'static str> {
        self.unbound.borrow().iter().copied().collect()
    }

    /// Returns `true` if `signature` denotes the type `name`.
    ///
    /// Literal names are compared under the simple-name policy; bound names match
    /// only a direct reference to the bound definition. An unbound slot never matches.
    #[must_use]
    pub fn has_type(&self, signature: &TypeSignature, name: &TypeName) -> bool {
        match name {
            TypeName::Literal(literal) => self
                .module
                .simple_type_name(signature)
                .is_some_and(|actual| actual == simple_name(literal)),
            TypeName::Bound(slot) => match self.slot(*slot) {
                Some(bound) => matches!(
                    signature,
                    TypeSignature::Class(token) | TypeSignature::ValueType(token) if *token == bound
                ),
                None => false,
            },
        }
    }

    /// Returns `true` if `signature` is a generic instantiation whose ordered arguments
    /// are exactly `names`.
    #[must_use]
    pub fn has_generic_params(&self, signature: &TypeSignature, names: &[TypeName]) -> bool {
        let args = signature.generic_args();
        signature.is_generic_instance()
            && args.len() == names.len()
            && args
                .iter()
                .zip(names)
                .all(|(arg, name)| self.has_type(arg, name))
    }

    /// Number of methods declared by `type_token` satisfying `predicate`.
    #[must_use]
    pub fn count_methods(&self, type_token: Token, predicate: &dyn Predicate<MethodDef>) -> usize {
        self.module
            .methods_of(type_token)
            .filter(|method| predicate.matches(self, method))
            .count()
    }

    /// Returns `true` if `type_token` declares at least one method satisfying `predicate`.
    #[must_use]
    pub fn has_method(&self, type_token: Token, predicate: &dyn Predicate<MethodDef>) -> bool {
        self.module
            .methods_of(type_token)
            .any(|method| predicate.matches(self, method))
    }

    /// Looks up an element of the module.
    #[must_use]
    pub fn get<E: Element>(&self, token: Token) -> Option<&'a E> {
        self.module.get(token)
    }
}
