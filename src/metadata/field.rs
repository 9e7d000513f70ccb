//! Field definitions.

use crate::metadata::{
    attributes::{self, FieldAttributes},
    signatures::TypeSignature,
    token::Token,
};

/// A field defined in the module (`Field` table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Token identifying this field
    pub token: Token,
    /// Current name
    pub name: String,
    /// Raw `FieldAttributes`
    pub flags: u32,
    /// The type declaring this field
    pub declaring_type: Token,
    /// Declared type
    pub field_type: TypeSignature,
}

impl FieldDef {
    /// Returns `true` if the field is public.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags & FieldAttributes::FIELD_ACCESS_MASK == FieldAttributes::PUBLIC
    }

    /// Returns `true` if the field is private.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.flags & FieldAttributes::FIELD_ACCESS_MASK == FieldAttributes::PRIVATE
    }

    /// Returns `true` for static fields.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags & FieldAttributes::STATIC != 0
    }

    /// Replaces the access bits with `PUBLIC`.
    pub fn set_public(&mut self) {
        self.flags = attributes::with_field_access(self.flags, FieldAttributes::PUBLIC);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::TableId;

    #[test]
    fn test_set_public_keeps_static() {
        let mut field = FieldDef {
            token: Token::from_parts(TableId::Field, 1),
            name: "a".to_string(),
            flags: FieldAttributes::PRIVATE | FieldAttributes::STATIC,
            declaring_type: Token::from_parts(TableId::TypeDef, 1),
            field_type: TypeSignature::U8,
        };
        assert!(field.is_private());
        field.set_public();
        assert!(field.is_public());
        assert!(field.is_static());
    }
}
