//! Method and parameter definitions.

use crate::{
    assembly::MethodBody,
    metadata::{
        attributes::{MethodAccessFlags, MethodModifiers, METHOD_ACCESS_MASK},
        signatures::TypeSignature,
        token::Token,
    },
};

/// A method defined in the module (`MethodDef` table).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    /// Token identifying this method
    pub token: Token,
    /// Current name
    pub name: String,
    /// Raw `MethodAttributes`
    pub flags: u32,
    /// The type declaring this method
    pub declaring_type: Token,
    /// Parameters in declaration order
    pub params: Vec<Token>,
    /// Return type
    pub return_type: TypeSignature,
    /// Instruction stream, `None` for abstract and extern methods
    pub body: Option<MethodBody>,
}

impl MethodDef {
    /// Access flags (public, private, ...).
    #[must_use]
    pub fn access(&self) -> MethodAccessFlags {
        MethodAccessFlags::from_method_flags(self.flags)
    }

    /// Modifier flags (static, virtual, ...).
    #[must_use]
    pub fn modifiers(&self) -> MethodModifiers {
        MethodModifiers::from_method_flags(self.flags)
    }

    /// Returns `true` if the method is public.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.access() == MethodAccessFlags::PUBLIC
    }

    /// Returns `true` if the method is private.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.access() == MethodAccessFlags::PRIVATE
    }

    /// Returns `true` for static methods.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers().contains(MethodModifiers::STATIC)
    }

    /// Returns `true` for virtual methods.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.modifiers().contains(MethodModifiers::VIRTUAL)
    }

    /// Returns `true` for instance and type initializers (`.ctor` / `.cctor`).
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.modifiers().contains(MethodModifiers::RTSPECIAL_NAME)
            && (self.name == ".ctor" || self.name == ".cctor")
    }

    /// Replaces the access bits, keeping every modifier.
    pub fn set_access(&mut self, access: MethodAccessFlags) {
        self.flags = (self.flags & !METHOD_ACCESS_MASK) | access.bits();
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Encoded body size in bytes, 0 without a body.
    #[must_use]
    pub fn code_size(&self) -> u64 {
        self.body.as_ref().map_or(0, MethodBody::code_size)
    }
}

/// A method parameter (`Param` table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    /// Token identifying this parameter
    pub token: Token,
    /// Current name
    pub name: String,
    /// 1-based position in the method signature
    pub sequence: u16,
    /// Declared type
    pub param_type: TypeSignature,
    /// The method owning this parameter
    pub method: Token,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::TableId;

    fn method(name: &str, flags: u32) -> MethodDef {
        MethodDef {
            token: Token::from_parts(TableId::MethodDef, 1),
            name: name.to_string(),
            flags,
            declaring_type: Token::from_parts(TableId::TypeDef, 1),
            params: Vec::new(),
            return_type: TypeSignature::Void,
            body: None,
        }
    }

    #[test]
    fn test_constructor_detection() {
        assert!(method(".ctor", 0x1806).is_constructor());
        assert!(method(".cctor", 0x1811).is_constructor());
        assert!(!method(".ctor", 0x0006).is_constructor());
        assert!(!method("Start", 0x1806).is_constructor());
    }

    #[test]
    fn test_set_access_keeps_modifiers() {
        let mut m = method("Run", 0x0001 | 0x0040 | 0x0080);
        assert!(m.is_private());
        m.set_access(MethodAccessFlags::PUBLIC);
        assert!(m.is_public());
        assert!(m.is_virtual());
        assert!(m.modifiers().contains(MethodModifiers::HIDE_BY_SIG));
    }

    #[test]
    fn test_code_size_without_body() {
        assert_eq!(method("Abstract", 0x0406).code_size(), 0);
    }
}
