//! Type signatures for fields, parameters, return values and base types.
//!
//! [`TypeSignature`] mirrors the subset of ECMA-335 §II.23.2.12 element types that
//! rename rules inspect. Types defined in or referenced by the module are carried as
//! tokens so that a signature always reflects the *current* name of the type it
//! points at, even after that type has been renamed by an earlier rule.
//!
//! # Simple-name policy
//!
//! Rules compare types by *simple name* only (see [`simple_name`]). Obfuscation
//! frequently flattens or rewrites namespaces, so `System.Boolean`, `Boolean` and a
//! type named `Boolean` in another namespace all compare equal. This is a deliberate
//! relaxed-matching policy.

use crate::metadata::token::Token;

/// A type as it appears in a member signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeSignature {
    #[default]
    /// Not defined
    Unknown,
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// System.String
    String,
    /// System.Object
    Object,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// CIL class, token into `TypeDef` or `TypeRef`
    Class(Token),
    /// CIL value-type, token into `TypeDef` or `TypeRef`
    ValueType(Token),
    /// Generic type and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    /// Single dimension array
    SzArray(Box<TypeSignature>),
    /// Type by reference
    ByRef(Box<TypeSignature>),
    /// Generic type parameter
    GenericParamType(u32),
    /// Generic method parameter
    GenericParamMethod(u32),
}

/// Primitive element types with their `System` names and C# aliases.
const PRIMITIVES: &[(TypeSignature, &str, &str)] = &[
    (TypeSignature::Void, "Void", "void"),
    (TypeSignature::Boolean, "Boolean", "bool"),
    (TypeSignature::Char, "Char", "char"),
    (TypeSignature::I1, "SByte", "sbyte"),
    (TypeSignature::U1, "Byte", "byte"),
    (TypeSignature::I2, "Int16", "short"),
    (TypeSignature::U2, "UInt16", "ushort"),
    (TypeSignature::I4, "Int32", "int"),
    (TypeSignature::U4, "UInt32", "uint"),
    (TypeSignature::I8, "Int64", "long"),
    (TypeSignature::U8, "UInt64", "ulong"),
    (TypeSignature::R4, "Single", "float"),
    (TypeSignature::R8, "Double", "double"),
    (TypeSignature::String, "String", "string"),
    (TypeSignature::Object, "Object", "object"),
    (TypeSignature::I, "IntPtr", "nint"),
    (TypeSignature::U, "UIntPtr", "nuint"),
];

impl TypeSignature {
    /// The simple `System` name of a primitive element type (`Boolean`, `Int32`, ...).
    #[must_use]
    pub fn primitive_name(&self) -> Option<&'static str> {
        PRIMITIVES
            .iter()
            .find(|(sig, _, _)| sig == self)
            .map(|(_, name, _)| *name)
    }

    /// Parses a primitive from its full name, simple name or C# alias.
    ///
    /// `"System.Int32"`, `"Int32"` and `"int"` all yield [`TypeSignature::I4`].
    #[must_use]
    pub fn from_primitive_name(name: &str) -> Option<Self> {
        let simple = name.strip_prefix("System.").unwrap_or(name);
        PRIMITIVES
            .iter()
            .find(|(_, system, alias)| *system == simple || *alias == name)
            .map(|(sig, _, _)| sig.clone())
    }

    /// Returns `true` for single-dimension arrays.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, TypeSignature::SzArray(_))
    }

    /// Returns `true` for generic instantiations.
    #[must_use]
    pub fn is_generic_instance(&self) -> bool {
        matches!(self, TypeSignature::GenericInst(_, _))
    }

    /// The ordered generic arguments of an instantiation, empty otherwise.
    #[must_use]
    pub fn generic_args(&self) -> &[TypeSignature] {
        match self {
            TypeSignature::GenericInst(_, args) => args,
            _ => &[],
        }
    }

    /// Strips arrays and by-refs down to the underlying element type.
    #[must_use]
    pub fn element_type(&self) -> &TypeSignature {
        match self {
            TypeSignature::SzArray(inner) | TypeSignature::ByRef(inner) => inner.element_type(),
            other => other,
        }
    }

    /// The `TypeDef`/`TypeRef` token this signature names, ignoring generic arguments.
    #[must_use]
    pub fn type_token(&self) -> Option<Token> {
        match self {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => Some(*token),
            TypeSignature::GenericInst(base, _) => base.type_token(),
            _ => None,
        }
    }
}

/// Reduces a (possibly qualified) type name to its simple name.
///
/// Drops the namespace and any enclosing type, the generic arity suffix and any
/// generic argument list; array ranks are preserved:
///
/// * `System.Collections.Generic.Dictionary`2` → `Dictionary`
/// * `System.String[]` → `String[]`
/// * `Outer/Inner` → `Inner`
#[must_use]
pub fn simple_name(name: &str) -> String {
    let mut base = name.trim();
    let mut ranks = 0usize;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        ranks += 1;
    }

    if let Some(open) = base.find('<') {
        base = &base[..open];
    }

    let last = base.rsplit(['.', '/']).next().unwrap_or(base);
    let last = last.split('`').next().unwrap_or(last);

    let mut result = String::with_capacity(last.len() + ranks * 2);
    result.push_str(last);
    for _ in 0..ranks {
        result.push_str("[]");
    }
    result
}

/// Compares two type names under the simple-name policy.
#[must_use]
pub fn same_simple_name(left: &str, right: &str) -> bool {
    simple_name(left) == simple_name(right)
}
