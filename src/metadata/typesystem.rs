//! Type definitions and type references.

use crate::metadata::{
    attributes::{self, TypeAttributes},
    signatures::TypeSignature,
    token::Token,
};

/// A type defined in the module (`TypeDef` table).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Token identifying this type
    pub token: Token,
    /// Namespace, empty for the global namespace and for nested types
    pub namespace: String,
    /// Current name
    pub name: String,
    /// Raw `TypeAttributes`
    pub flags: u32,
    /// Base type, `None` for `System.Object` and interfaces
    pub base: Option<TypeSignature>,
    /// Methods declared by this type
    pub methods: Vec<Token>,
    /// Fields declared by this type
    pub fields: Vec<Token>,
    /// Types nested inside this type
    pub nested: Vec<Token>,
    /// The enclosing type, for nested types
    pub enclosing: Option<Token>,
}

impl TypeDef {
    /// `Namespace.Name`, or just `Name` in the global namespace.
    ///
    /// Nested types are qualified by their enclosing type through
    /// [`crate::metadata::module::Module::type_full_name`].
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Returns `true` for nested types.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }

    /// Returns `true` if the type is visible outside the assembly (directly or nested).
    #[must_use]
    pub fn is_public(&self) -> bool {
        attributes::is_public_type(self.flags)
    }

    /// Returns `true` for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::INTERFACE != 0
    }

    /// The token of the base type (`TypeDef` or `TypeRef`), if any.
    #[must_use]
    pub fn base_token(&self) -> Option<Token> {
        self.base.as_ref().and_then(TypeSignature::type_token)
    }
}

/// A type referenced from another assembly (`TypeRef` table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Token identifying this reference
    pub token: Token,
    /// Namespace of the referenced type
    pub namespace: String,
    /// Name of the referenced type, including any generic arity suffix
    pub name: String,
}

impl TypeRef {
    /// `Namespace.Name`, or just `Name` in the global namespace.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// A reference to a member of an external type (`MemberRef` table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    /// Token identifying this reference
    pub token: Token,
    /// Member name
    pub name: String,
    /// The `TypeRef` declaring the member
    pub parent: Token,
}
