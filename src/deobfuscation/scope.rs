//! Named, typed bindings shared between rules of one run.
//!
//! A rule that discovers an element (say, the console type) binds it to a [`Slot`];
//! later rules read the slot to constrain their own matching. Slots are declared as
//! constants so every rule refers to the same binding:
//!
//! ```rust
//! use dotrename::deobfuscation::{Scope, Slot};
//! use dotrename::metadata::{token::{TableId, Token}, typesystem::TypeDef};
//!
//! const CONSOLE: Slot<TypeDef> = Slot::new("ConsoleSdtd");
//!
//! let mut scope = Scope::new();
//! assert_eq!(scope.get(CONSOLE), None);
//!
//! let token = Token::from_parts(TableId::TypeDef, 7);
//! scope.bind(CONSOLE, token)?;
//! assert_eq!(scope.get(CONSOLE), Some(token));
//! # Ok::<(), dotrename::Error>(())
//! ```

use std::{collections::BTreeMap, fmt, marker::PhantomData};

use crate::{
    metadata::{module::Element, token::Token},
    Error, Result,
};

/// A named binding for one element of kind `E`.
pub struct Slot<E> {
    name: &'static str,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Slot<E> {
    /// Declares a slot.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Slot {
            name,
            _marker: PhantomData,
        }
    }

    /// The slot name, unique within a catalog.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<E> Clone for Slot<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Slot<E> {}

impl<E> PartialEq for Slot<E> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<E> Eq for Slot<E> {}

impl<E> fmt::Debug for Slot<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.name)
    }
}

/// The set of bound slots of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    bindings: BTreeMap<&'static str, Token>,
}

impl Scope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `slot` to `token`, replacing any earlier binding.
    ///
    /// # Errors
    /// Returns [`Error::UnexpectedTable`] if the token is not an element of kind `E`.
    pub fn bind<E: Element>(&mut self, slot: Slot<E>, token: Token) -> Result<()> {
        if !token.is_table(E::KIND.table()) {
            return Err(Error::UnexpectedTable {
                token,
                expected: E::KIND.table(),
                found: token.table_id(),
            });
        }
        self.bindings.insert(slot.name, token);
        Ok(())
    }

    /// The token bound to `slot`.
    #[must_use]
    pub fn get<E>(&self, slot: Slot<E>) -> Option<Token> {
        self.bindings.get(slot.name).copied()
    }

    /// The token bound to a slot by name, regardless of kind.
    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<Token> {
        self.bindings.get(name).copied()
    }

    /// Returns `true` if `slot` is bound.
    #[must_use]
    pub fn is_bound<E>(&self, slot: Slot<E>) -> bool {
        self.bindings.contains_key(slot.name)
    }

    /// Removes the binding of `slot`.
    pub fn unbind<E>(&mut self, slot: Slot<E>) {
        self.bindings.remove(slot.name);
    }

    /// Number of bound slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates `(slot name, token)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Token)> + '_ {
        self.bindings.iter().map(|(name, token)| (*name, *token))
    }
}
