//! Access and modifier bits of types, methods and fields.
//!
//! The engine only ever reads visibility, `static`, `virtual` and the special-name
//! bits, and only ever writes visibility (make-public). Method flags get typed
//! `bitflags` views; type and field flags stay plain `u32` masks with the handful of
//! values the builder and the make-public action need.

use bitflags::bitflags;

/// Low three bits of a method's flags hold its access level.
pub const METHOD_ACCESS_MASK: u32 = 0x0007;

bitflags! {
    /// Access level of a method. The values are exclusive, not combinable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodAccessFlags: u32 {
        /// `private`
        const PRIVATE = 0x0001;
        /// `private protected`
        const FAM_AND_ASSEM = 0x0002;
        /// `internal`
        const ASSEM = 0x0003;
        /// `protected`
        const FAMILY = 0x0004;
        /// `protected internal`
        const FAM_OR_ASSEM = 0x0005;
        /// `public`
        const PUBLIC = 0x0006;
    }
}

impl MethodAccessFlags {
    /// Access level stored in raw method `flags`.
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & METHOD_ACCESS_MASK)
    }
}

bitflags! {
    /// Method modifiers the predicates and the builder care about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodModifiers: u32 {
        /// No `this`
        const STATIC = 0x0010;
        /// `sealed override`
        const FINAL = 0x0020;
        /// Dispatched through the vtable
        const VIRTUAL = 0x0040;
        /// Overloads hide by signature
        const HIDE_BY_SIG = 0x0080;
        /// `new virtual`
        const NEW_SLOT = 0x0100;
        /// No body
        const ABSTRACT = 0x0400;
        /// Name has meaning to tools (accessors, operators)
        const SPECIAL_NAME = 0x0800;
        /// Name has meaning to the runtime (`.ctor`, `.cctor`)
        const RTSPECIAL_NAME = 0x1000;
    }
}

impl MethodModifiers {
    /// Everything in raw method `flags` except the access level.
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        Self::from_bits_truncate(flags & !METHOD_ACCESS_MASK)
    }
}

#[allow(non_snake_case)]
/// Type flag values.
pub mod TypeAttributes {
    /// Visibility bits.
    pub const VISIBILITY_MASK: u32 = 0x0007;
    /// Top-level `internal`.
    pub const NOT_PUBLIC: u32 = 0x0000;
    /// Top-level `public`.
    pub const PUBLIC: u32 = 0x0001;
    /// Nested `public`.
    pub const NESTED_PUBLIC: u32 = 0x0002;
    /// Nested `private`.
    pub const NESTED_PRIVATE: u32 = 0x0003;
    /// Nested `internal`.
    pub const NESTED_ASSEMBLY: u32 = 0x0005;
    /// `interface`
    pub const INTERFACE: u32 = 0x0020;
    /// `abstract`
    pub const ABSTRACT: u32 = 0x0080;
    /// `sealed`
    pub const SEALED: u32 = 0x0100;
}

#[allow(non_snake_case)]
/// Field flag values.
pub mod FieldAttributes {
    /// Access bits, same encoding as for methods.
    pub const FIELD_ACCESS_MASK: u32 = 0x0007;
    /// `private`
    pub const PRIVATE: u32 = 0x0001;
    /// `internal`
    pub const ASSEMBLY: u32 = 0x0003;
    /// `protected`
    pub const FAMILY: u32 = 0x0004;
    /// `public`
    pub const PUBLIC: u32 = 0x0006;
    /// `static`
    pub const STATIC: u32 = 0x0010;
    /// `readonly`
    pub const INIT_ONLY: u32 = 0x0020;
    /// `const`
    pub const LITERAL: u32 = 0x0040;
}

/// Visibility a type needs to be reachable from outside the module.
#[must_use]
pub fn public_type_visibility(nested: bool) -> u32 {
    if nested {
        TypeAttributes::NESTED_PUBLIC
    } else {
        TypeAttributes::PUBLIC
    }
}

/// Returns `true` if the visibility bits of type `flags` are public.
#[must_use]
pub fn is_public_type(flags: u32) -> bool {
    matches!(
        flags & TypeAttributes::VISIBILITY_MASK,
        TypeAttributes::PUBLIC | TypeAttributes::NESTED_PUBLIC
    )
}

/// Type `flags` with the visibility bits replaced.
#[must_use]
pub fn with_type_visibility(flags: u32, visibility: u32) -> u32 {
    (flags & !TypeAttributes::VISIBILITY_MASK) | (visibility & TypeAttributes::VISIBILITY_MASK)
}

/// Field `flags` with the access bits replaced.
#[must_use]
pub fn with_field_access(flags: u32, access: u32) -> u32 {
    (flags & !FieldAttributes::FIELD_ACCESS_MASK) | (access & FieldAttributes::FIELD_ACCESS_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_flags_split_into_access_and_modifiers() {
        let raw = MethodAccessFlags::PUBLIC.bits()
            | MethodModifiers::STATIC.bits()
            | MethodModifiers::HIDE_BY_SIG.bits();
        assert_eq!(
            MethodAccessFlags::from_method_flags(raw),
            MethodAccessFlags::PUBLIC
        );
        let modifiers = MethodModifiers::from_method_flags(raw);
        assert_eq!(modifiers, MethodModifiers::STATIC | MethodModifiers::HIDE_BY_SIG);
    }

    #[test]
    fn test_family_is_neither_private_nor_public() {
        let access = MethodAccessFlags::from_method_flags(0x0004);
        assert_eq!(access, MethodAccessFlags::FAMILY);
        assert_ne!(access, MethodAccessFlags::PUBLIC);
        assert_ne!(access, MethodAccessFlags::PRIVATE);
    }

    #[test]
    fn test_type_visibility_keeps_other_bits() {
        let flags = TypeAttributes::NESTED_PRIVATE | TypeAttributes::SEALED;
        assert!(!is_public_type(flags));

        let public = with_type_visibility(flags, public_type_visibility(true));
        assert!(is_public_type(public));
        assert_eq!(public & TypeAttributes::SEALED, TypeAttributes::SEALED);
        assert_eq!(
            with_type_visibility(TypeAttributes::ABSTRACT, public_type_visibility(false)),
            TypeAttributes::ABSTRACT | TypeAttributes::PUBLIC
        );
    }

    #[test]
    fn test_field_access_keeps_static() {
        let flags = FieldAttributes::PRIVATE | FieldAttributes::STATIC | FieldAttributes::INIT_ONLY;
        let public = with_field_access(flags, FieldAttributes::PUBLIC);
        assert_eq!(public & FieldAttributes::FIELD_ACCESS_MASK, FieldAttributes::PUBLIC);
        assert_ne!(public & FieldAttributes::STATIC, 0);
        assert_ne!(public & FieldAttributes::INIT_ONLY, 0);
    }
}
