//! The in-memory module graph the rename engine works on.
//!
//! A [`Module`] is an arena of element tables indexed by metadata token row. Elements
//! refer to each other exclusively by [`Token`], so renaming an element is a single
//! in-place write and every signature that points at it observes the new name.
//!
//! # Key Components
//!
//! - [`Module`] - Element tables plus lookup, naming and visibility operations
//! - [`Element`] - Trait implemented by the four renameable element kinds
//! - [`ElementKind`] - Discriminant used by reports and rename records
//!
//! Modules are created with [`crate::metadata::builder::ModuleBuilder`].

use strum::{Display, EnumString};

use crate::{
    metadata::{
        attributes::{self, MethodAccessFlags},
        field::FieldDef,
        method::{MethodDef, ParamDef},
        signatures::{simple_name, TypeSignature},
        token::{TableId, Token},
        typesystem::{MemberRef, TypeDef, TypeRef},
    },
    Error, Result,
};

/// The kinds of elements the engine can match and rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    /// A `TypeDef`
    Type,
    /// A `MethodDef`
    Method,
    /// A `Field`
    Field,
    /// A `Param`
    Param,
}

impl ElementKind {
    /// The metadata table holding elements of this kind.
    #[must_use]
    pub const fn table(self) -> TableId {
        match self {
            ElementKind::Type => TableId::TypeDef,
            ElementKind::Method => TableId::MethodDef,
            ElementKind::Field => TableId::Field,
            ElementKind::Param => TableId::Param,
        }
    }

    /// The kind of element `token` addresses, `None` for non-element tables.
    #[must_use]
    pub fn from_token(token: Token) -> Option<Self> {
        match token.table_id()? {
            TableId::TypeDef => Some(ElementKind::Type),
            TableId::MethodDef => Some(ElementKind::Method),
            TableId::Field => Some(ElementKind::Field),
            TableId::Param => Some(ElementKind::Param),
            _ => None,
        }
    }
}

/// A renameable metadata element stored in one of the module's tables.
pub trait Element: Sized {
    /// The kind of this element.
    const KIND: ElementKind;

    /// The identity of this element.
    fn token(&self) -> Token;

    /// The current name.
    fn name(&self) -> &str;

    /// The whole table this element lives in, in row order.
    fn table(module: &Module) -> &[Self];
}

impl Element for TypeDef {
    const KIND: ElementKind = ElementKind::Type;

    fn token(&self) -> Token {
        self.token
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn table(module: &Module) -> &[Self] {
        &module.types
    }
}

impl Element for MethodDef {
    const KIND: ElementKind = ElementKind::Method;

    fn token(&self) -> Token {
        self.token
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn table(module: &Module) -> &[Self] {
        &module.methods
    }
}

impl Element for FieldDef {
    const KIND: ElementKind = ElementKind::Field;

    fn token(&self) -> Token {
        self.token
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn table(module: &Module) -> &[Self] {
        &module.fields
    }
}

impl Element for ParamDef {
    const KIND: ElementKind = ElementKind::Param;

    fn token(&self) -> Token {
        self.token
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn table(module: &Module) -> &[Self] {
        &module.params
    }
}

fn row_index(token: Token) -> Option<usize> {
    usize::try_from(token.row()).ok()?.checked_sub(1)
}

/// An arena of metadata elements addressed by token.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub(crate) name: String,
    pub(crate) types: Vec<TypeDef>,
    pub(crate) type_refs: Vec<TypeRef>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) params: Vec<ParamDef>,
    pub(crate) member_refs: Vec<MemberRef>,
    pub(crate) user_strings: Vec<String>,
}

impl Module {
    /// The module name (`Assembly-CSharp`, ...).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All type definitions, in table order.
    #[must_use]
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    /// All method definitions, in table order.
    #[must_use]
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// All field definitions, in table order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// All parameters, in table order.
    #[must_use]
    pub fn params(&self) -> &[ParamDef] {
        &self.params
    }

    /// All type references, in table order.
    #[must_use]
    pub fn type_refs(&self) -> &[TypeRef] {
        &self.type_refs
    }

    /// Looks up an element of kind `E` by token.
    ///
    /// Returns `None` if the token addresses another table or a row that does not exist.
    #[must_use]
    pub fn get<E: Element>(&self, token: Token) -> Option<&E> {
        if !token.is_table(E::KIND.table()) {
            return None;
        }
        E::table(self).get(row_index(token)?)
    }

    /// Like [`Module::get`], but reports why the lookup failed.
    ///
    /// # Errors
    /// [`Error::UnexpectedTable`] for tokens of another table, [`Error::InvalidToken`]
    /// for rows that do not exist.
    pub fn element<E: Element>(&self, token: Token) -> Result<&E> {
        if !token.is_table(E::KIND.table()) {
            return Err(Error::UnexpectedTable {
                token,
                expected: E::KIND.table(),
                found: token.table_id(),
            });
        }
        self.get(token).ok_or(Error::InvalidToken(token))
    }

    /// Looks up a type reference by token.
    #[must_use]
    pub fn type_ref(&self, token: Token) -> Option<&TypeRef> {
        if !token.is_table(TableId::TypeRef) {
            return None;
        }
        self.type_refs.get(row_index(token)?)
    }

    /// Looks up a member reference by token.
    #[must_use]
    pub fn member_ref(&self, token: Token) -> Option<&MemberRef> {
        if !token.is_table(TableId::MemberRef) {
            return None;
        }
        self.member_refs.get(row_index(token)?)
    }

    /// The literal behind an `ldstr` token.
    #[must_use]
    pub fn user_string(&self, token: Token) -> Option<&str> {
        if !token.is_table(TableId::UserString) {
            return None;
        }
        self.user_strings
            .get(row_index(token)?)
            .map(String::as_str)
    }

    /// Finds a type definition by its full name (`Namespace.Name` or `Outer/Inner`).
    ///
    /// # Errors
    /// Returns [`Error::TypeNotFound`] if no type carries this name.
    pub fn type_by_name(&self, full_name: &str) -> Result<&TypeDef> {
        self.types
            .iter()
            .find(|t| self.type_full_name(t.token).as_deref() == Some(full_name))
            .ok_or_else(|| Error::TypeNotFound(full_name.to_string()))
    }

    /// Full name of a `TypeDef` or `TypeRef`, using current names.
    ///
    /// Nested types are written `Outer/Inner`.
    #[must_use]
    pub fn type_full_name(&self, token: Token) -> Option<String> {
        if let Some(type_ref) = self.type_ref(token) {
            return Some(type_ref.qualified_name());
        }

        let type_def = self.get::<TypeDef>(token)?;
        match type_def.enclosing {
            Some(enclosing) => {
                let outer = self.type_full_name(enclosing)?;
                Some(format!("{}/{}", outer, type_def.name))
            }
            None => Some(type_def.qualified_name()),
        }
    }

    /// Renders a signature with current names (`System.Int32`, `List`1<Game.Foo>`, `T[]`).
    ///
    /// Returns `None` for [`TypeSignature::Unknown`] and for dangling tokens.
    #[must_use]
    pub fn type_name(&self, signature: &TypeSignature) -> Option<String> {
        if let Some(primitive) = signature.primitive_name() {
            return Some(format!("System.{primitive}"));
        }

        match signature {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                self.type_full_name(*token)
            }
            TypeSignature::GenericInst(base, args) => {
                let base = self.type_name(base)?;
                let args = args
                    .iter()
                    .map(|arg| self.type_name(arg))
                    .collect::<Option<Vec<_>>>()?;
                Some(format!("{}<{}>", base, args.join(", ")))
            }
            TypeSignature::SzArray(inner) => Some(format!("{}[]", self.type_name(inner)?)),
            TypeSignature::ByRef(inner) => Some(format!("{}&", self.type_name(inner)?)),
            TypeSignature::GenericParamType(index) => Some(format!("!{index}")),
            TypeSignature::GenericParamMethod(index) => Some(format!("!!{index}")),
            _ => None,
        }
    }

    /// The simple name of a signature's type, see [`simple_name`].
    #[must_use]
    pub fn simple_type_name(&self, signature: &TypeSignature) -> Option<String> {
        self.type_name(signature).map(|name| simple_name(&name))
    }

    /// The type definition a signature refers to, looking through arrays and by-refs.
    #[must_use]
    pub fn resolve_type(&self, signature: &TypeSignature) -> Option<&TypeDef> {
        self.get::<TypeDef>(signature.element_type().type_token()?)
    }

    /// The base type of a type, if it is defined in this module.
    #[must_use]
    pub fn base_type(&self, token: Token) -> Option<&TypeDef> {
        let base = self.get::<TypeDef>(token)?.base_token()?;
        self.get::<TypeDef>(base)
    }

    /// All top-level types whose base type is exactly `token`, in table order.
    #[must_use]
    pub fn derived_types(&self, token: Token) -> Vec<Token> {
        self.types
            .iter()
            .filter(|t| !t.is_nested() && t.base_token() == Some(token))
            .map(|t| t.token)
            .collect()
    }

    /// Methods declared by `type_token`.
    pub fn methods_of(&self, type_token: Token) -> impl Iterator<Item = &MethodDef> {
        self.get::<TypeDef>(type_token)
            .map(|t| t.methods.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|token| self.get::<MethodDef>(*token))
    }

    /// Fields declared by `type_token`.
    pub fn fields_of(&self, type_token: Token) -> impl Iterator<Item = &FieldDef> {
        self.get::<TypeDef>(type_token)
            .map(|t| t.fields.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|token| self.get::<FieldDef>(*token))
    }

    /// The parameter at `index` (0-based) of a method.
    #[must_use]
    pub fn param(&self, method: &MethodDef, index: usize) -> Option<&ParamDef> {
        self.get::<ParamDef>(*method.params.get(index)?)
    }

    /// The current name of any element or type reference.
    #[must_use]
    pub fn name_of(&self, token: Token) -> Option<&str> {
        match ElementKind::from_token(token) {
            Some(ElementKind::Type) => self.get::<TypeDef>(token).map(Element::name),
            Some(ElementKind::Method) => self.get::<MethodDef>(token).map(Element::name),
            Some(ElementKind::Field) => self.get::<FieldDef>(token).map(Element::name),
            Some(ElementKind::Param) => self.get::<ParamDef>(token).map(Element::name),
            None => self.type_ref(token).map(|r| r.name.as_str()),
        }
    }

    /// The scope an element is declared in, as shown in rename records.
    ///
    /// Types report their namespace (or enclosing type), members their declaring type,
    /// parameters their method as `Type::Method`.
    #[must_use]
    pub fn scope_of(&self, token: Token) -> String {
        let scope = match ElementKind::from_token(token) {
            Some(ElementKind::Type) => self.get::<TypeDef>(token).and_then(|t| match t.enclosing {
                Some(enclosing) => self.type_full_name(enclosing),
                None => Some(t.namespace.clone()),
            }),
            Some(ElementKind::Method) => self
                .get::<MethodDef>(token)
                .and_then(|m| self.type_full_name(m.declaring_type)),
            Some(ElementKind::Field) => self
                .get::<FieldDef>(token)
                .and_then(|f| self.type_full_name(f.declaring_type)),
            Some(ElementKind::Param) => self.get::<ParamDef>(token).and_then(|p| {
                let method = self.get::<MethodDef>(p.method)?;
                let owner = self.type_full_name(method.declaring_type)?;
                Some(format!("{}::{}", owner, method.name))
            }),
            None => None,
        };
        scope.unwrap_or_default()
    }

    /// Another element in the same naming scope already called `name`, if any.
    ///
    /// Types collide within their namespace (or enclosing type), fields within their
    /// declaring type. Methods and parameters never collide.
    #[must_use]
    pub fn name_conflict(&self, token: Token, name: &str) -> Option<Token> {
        match ElementKind::from_token(token)? {
            ElementKind::Type => {
                let target = self.get::<TypeDef>(token)?;
                self.types
                    .iter()
                    .find(|t| {
                        t.token != token
                            && t.name == name
                            && t.enclosing == target.enclosing
                            && t.namespace == target.namespace
                    })
                    .map(|t| t.token)
            }
            ElementKind::Field => {
                let target = self.get::<FieldDef>(token)?;
                self.fields_of(target.declaring_type)
                    .find(|f| f.token != token && f.name == name)
                    .map(|f| f.token)
            }
            ElementKind::Method | ElementKind::Param => None,
        }
    }

    /// Sets the name of an element, returning the previous name.
    ///
    /// # Errors
    /// [`Error::InvalidToken`] if `token` does not address an element.
    pub fn set_name(&mut self, token: Token, name: &str) -> Result<String> {
        let index = row_index(token).ok_or(Error::InvalidToken(token))?;
        let slot = match ElementKind::from_token(token) {
            Some(ElementKind::Type) => self.types.get_mut(index).map(|t| &mut t.name),
            Some(ElementKind::Method) => self.methods.get_mut(index).map(|m| &mut m.name),
            Some(ElementKind::Field) => self.fields.get_mut(index).map(|f| &mut f.name),
            Some(ElementKind::Param) => self.params.get_mut(index).map(|p| &mut p.name),
            None => None,
        };

        let slot = slot.ok_or(Error::InvalidToken(token))?;
        Ok(std::mem::replace(slot, name.to_string()))
    }

    /// Returns `true` if the element is public.
    ///
    /// # Errors
    /// [`Error::UnexpectedTable`] for parameters and non-element tokens,
    /// [`Error::InvalidToken`] for rows that do not exist.
    pub fn is_public(&self, token: Token) -> Result<bool> {
        match ElementKind::from_token(token) {
            Some(ElementKind::Type) => Ok(self.element::<TypeDef>(token)?.is_public()),
            Some(ElementKind::Method) => Ok(self.element::<MethodDef>(token)?.is_public()),
            Some(ElementKind::Field) => Ok(self.element::<FieldDef>(token)?.is_public()),
            _ => Err(Error::UnexpectedTable {
                token,
                expected: TableId::MethodDef,
                found: token.table_id(),
            }),
        }
    }

    /// Raises the visibility of a type, method or field to public.
    ///
    /// Top-level types become `Public`, nested types `NestedPublic`. Returns `false` if
    /// the element already was public.
    ///
    /// # Errors
    /// Same as [`Module::is_public`].
    pub fn make_public(&mut self, token: Token) -> Result<bool> {
        if self.is_public(token)? {
            return Ok(false);
        }

        let index = row_index(token).ok_or(Error::InvalidToken(token))?;
        match ElementKind::from_token(token) {
            Some(ElementKind::Type) => {
                let type_def = self
                    .types
                    .get_mut(index)
                    .ok_or(Error::InvalidToken(token))?;
                type_def.flags = attributes::with_type_visibility(
                    type_def.flags,
                    attributes::public_type_visibility(type_def.is_nested()),
                );
            }
            Some(ElementKind::Method) => self
                .methods
                .get_mut(index)
                .ok_or(Error::InvalidToken(token))?
                .set_access(MethodAccessFlags::PUBLIC),
            Some(ElementKind::Field) => self
                .fields
                .get_mut(index)
                .ok_or(Error::InvalidToken(token))?
                .set_public(),
            _ => return Err(malformed_error!("Visibility of {} cannot change", token)),
        }
        Ok(true)
    }

    /// Mutable access to a method, used to normalize bodies before scanning.
    pub(crate) fn method_mut(&mut self, token: Token) -> Option<&mut MethodDef> {
        if !token.is_table(TableId::MethodDef) {
            return None;
        }
        self.methods.get_mut(row_index(token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            attributes::TypeAttributes,
            builder::{ModuleBuilder, TypeBuilder},
        },
        test::factories::sample_module,
    };

    #[test]
    fn test_lookup_checks_table() {
        let module = sample_module();
        let world = module.type_by_name("Game.World").unwrap();
        assert!(module.get::<TypeDef>(world.token).is_some());
        assert!(module.get::<MethodDef>(world.token).is_none());
        assert!(matches!(
            module.element::<FieldDef>(world.token),
            Err(Error::UnexpectedTable { .. })
        ));
        assert!(matches!(
            module.element::<TypeDef>(Token::from_parts(TableId::TypeDef, 999)),
            Err(Error::InvalidToken(_))
        ));
    }

    #[test]
    fn test_type_names_follow_renames() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let field = module
            .fields_of(world)
            .find(|f| f.name == "b")
            .unwrap()
            .clone();
        assert_eq!(
            module.type_name(&field.field_type).as_deref(),
            Some("System.Collections.Generic.List`1<Game.Player>")
        );

        let player = module.type_by_name("Game.Player").unwrap().token;
        module.set_name(player, "EntityPlayer").unwrap();
        assert_eq!(
            module.type_name(&field.field_type).as_deref(),
            Some("System.Collections.Generic.List`1<Game.EntityPlayer>")
        );
        assert_eq!(
            module.simple_type_name(&field.field_type).as_deref(),
            Some("List")
        );
    }

    #[test]
    fn test_make_public_is_idempotent() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let method = module.methods_of(world).find(|m| m.is_private()).unwrap().token;

        assert!(module.make_public(method).unwrap());
        assert!(module.is_public(method).unwrap());
        assert!(!module.make_public(method).unwrap());
    }

    #[test]
    fn test_nested_type_becomes_nested_public() {
        let mut module = sample_module();
        let nested = module.type_by_name("Game.World/a").unwrap().token;
        assert!(module.make_public(nested).unwrap());
        let flags = module.get::<TypeDef>(nested).unwrap().flags;
        assert_eq!(
            flags & TypeAttributes::VISIBILITY_MASK,
            TypeAttributes::NESTED_PUBLIC
        );
    }

    #[test]
    fn test_scope_and_conflicts() {
        let module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let player = module.type_by_name("Game.Player").unwrap().token;
        assert_eq!(module.scope_of(world), "Game");
        assert_eq!(module.name_conflict(world, "Player"), Some(player));
        assert_eq!(module.name_conflict(world, "Chunk"), None);

        let field = module.fields_of(world).next().unwrap().token;
        assert_eq!(module.scope_of(field), "Game.World");
    }

    #[test]
    fn test_derived_types() {
        let module = sample_module();
        let player = module.type_by_name("Game.Player").unwrap().token;
        let derived = module.derived_types(player);
        assert_eq!(derived.len(), 1);
        assert_eq!(module.name_of(derived[0]), Some("c"));
        assert_eq!(module.base_type(derived[0]).map(|t| t.token), Some(player));
    }

    #[test]
    fn test_derived_types_skip_nested() {
        let module = ModuleBuilder::new("Test")
            .add_type(TypeBuilder::new("", "k1"))
            .add_type(TypeBuilder::new("", "m1").extends("k1"))
            .add_type(
                TypeBuilder::new("", "o1").nested(TypeBuilder::new("", "a").extends("k1")),
            )
            .build()
            .unwrap();
        let base = module.type_by_name("k1").unwrap().token;
        let derived = module.derived_types(base);
        assert_eq!(derived, vec![module.type_by_name("m1").unwrap().token]);
    }
}
