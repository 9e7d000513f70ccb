//! Fluent construction of [`Module`] instances.
//!
//! Types, members and signatures are declared by *name*; [`ModuleBuilder::build`]
//! allocates tokens and links every reference afterwards, so declarations may refer to
//! types and members declared later.
//!
//! # Type name syntax
//!
//! - `System.Int32`, `Int32` and `int` are primitives
//! - `Game.World` names a type of the module by full name, nested types as `Outer/Inner`
//! - anything else becomes a type reference (`UnityEngine.Vector3`)
//! - `T[]` is an array, `T&` a by-ref, `!0` / `!!0` are generic parameters
//! - `List<Game.Player>` / ``Dictionary`2<int, string>`` are generic instantiations
//!
//! Member operands are written `Type::member`.
//!
//! # Examples
//!
//! ```rust
//! use dotrename::metadata::builder::{MethodBuilder, ModuleBuilder, TypeBuilder};
//!
//! let module = ModuleBuilder::new("Assembly-CSharp")
//!     .add_type(
//!         TypeBuilder::new("", "a").public().method(
//!             MethodBuilder::new("b")
//!                 .public()
//!                 .static_()
//!                 .returns("System.Boolean")
//!                 .ldstr("dedicated")
//!                 .ret(),
//!         ),
//!     )
//!     .build()?;
//!
//! assert_eq!(module.types().len(), 1);
//! assert_eq!(module.methods()[0].code_size(), 6);
//! # Ok::<(), dotrename::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    assembly::{Immediate, MethodBody, OpCode, Operand},
    metadata::{
        attributes::{self, FieldAttributes, MethodAccessFlags, MethodModifiers, TypeAttributes},
        field::FieldDef,
        method::{MethodDef, ParamDef},
        module::Module,
        signatures::TypeSignature,
        token::{TableId, Token},
        typesystem::{MemberRef, TypeDef, TypeRef},
    },
    Result,
};

/// An instruction operand written by name, linked to a token at build time.
#[derive(Debug, Clone, PartialEq)]
pub enum IlOperand {
    /// No operand
    None,
    /// Immediate value
    Immediate(Immediate),
    /// Branch target as instruction index
    Target(usize),
    /// Local variable index
    Local(u16),
    /// Argument index
    Argument(u16),
    /// Switch targets as instruction indices
    Switch(Vec<usize>),
    /// A field as `Type::field`
    Field(String),
    /// A method as `Type::method`
    Method(String),
    /// A type name
    Type(String),
    /// A string literal, stored in the user string heap
    String(String),
    /// A raw token, used verbatim
    Token(Token),
}

/// Builder for a [`Module`].
#[derive(Debug, Clone, Default)]
pub struct ModuleBuilder {
    name: String,
    types: Vec<TypeBuilder>,
}

/// Builder for a type definition.
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    namespace: String,
    name: String,
    public: bool,
    flags: u32,
    base: Option<String>,
    fields: Vec<FieldBuilder>,
    methods: Vec<MethodBuilder>,
    nested: Vec<TypeBuilder>,
}

/// Builder for a field definition.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name: String,
    field_type: String,
    flags: u32,
}

/// Builder for a method definition and its body.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    access: MethodAccessFlags,
    modifiers: MethodModifiers,
    params: Vec<(String, String)>,
    returns: String,
    body: Option<Vec<(OpCode, IlOperand)>>,
}

impl ModuleBuilder {
    /// Starts an empty module.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        ModuleBuilder {
            name: name.into(),
            types: Vec::new(),
        }
    }

    /// Adds a top-level type.
    #[must_use]
    pub fn add_type(mut self, builder: TypeBuilder) -> Self {
        self.types.push(builder);
        self
    }

    /// Allocates tokens and links all names.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unparsable type names, member operands
    /// naming a missing member of a module type, and out-of-range branch indices.
    pub fn build(self) -> Result<Module> {
        let mut flat: Vec<(&TypeBuilder, Option<usize>)> = Vec::new();
        for builder in &self.types {
            flatten(builder, None, &mut flat);
        }

        let mut linker = Linker {
            names: HashMap::new(),
            module: Module {
                name: self.name.clone(),
                ..Module::default()
            },
        };

        for (index, (builder, enclosing)) in flat.iter().enumerate() {
            let token = Token::from_parts(TableId::TypeDef, row(index)?);
            let enclosing_token = enclosing
                .map(|e| row(e).map(|r| Token::from_parts(TableId::TypeDef, r)))
                .transpose()?;

            let full_name = match enclosing {
                Some(e) => {
                    let outer = linker.module.type_full_name(Token::from_parts(
                        TableId::TypeDef,
                        row(*e)?,
                    ));
                    format!("{}/{}", outer.unwrap_or_default(), builder.name)
                }
                None if builder.namespace.is_empty() => builder.name.clone(),
                None => format!("{}.{}", builder.namespace, builder.name),
            };

            let visibility = match (builder.public, enclosing.is_some()) {
                (true, true) => TypeAttributes::NESTED_PUBLIC,
                (true, false) => TypeAttributes::PUBLIC,
                (false, true) => TypeAttributes::NESTED_PRIVATE,
                (false, false) => TypeAttributes::NOT_PUBLIC,
            };

            linker.names.insert(full_name, token);
            linker.module.types.push(TypeDef {
                token,
                namespace: if enclosing.is_some() {
                    String::new()
                } else {
                    builder.namespace.clone()
                },
                name: builder.name.clone(),
                flags: visibility | builder.flags,
                base: None,
                methods: Vec::new(),
                fields: Vec::new(),
                nested: Vec::new(),
                enclosing: enclosing_token,
            });
            if let Some(e) = enclosing {
                linker.module.types[*e].nested.push(token);
            }
        }

        let mut pending = Vec::new();
        for (index, (builder, _)) in flat.iter().enumerate() {
            let type_token = linker.module.types[index].token;

            if let Some(base) = &builder.base {
                let base = linker.signature(base)?;
                linker.module.types[index].base = Some(base);
            }

            for field in &builder.fields {
                let token = Token::from_parts(TableId::Field, row(linker.module.fields.len())?);
                let field_type = linker.signature(&field.field_type)?;
                linker.module.fields.push(FieldDef {
                    token,
                    name: field.name.clone(),
                    flags: field.flags,
                    declaring_type: type_token,
                    field_type,
                });
                linker.module.types[index].fields.push(token);
            }

            for method in &builder.methods {
                let token =
                    Token::from_parts(TableId::MethodDef, row(linker.module.methods.len())?);

                let mut params = Vec::with_capacity(method.params.len());
                for (sequence, (name, param_type)) in method.params.iter().enumerate() {
                    let param_token =
                        Token::from_parts(TableId::Param, row(linker.module.params.len())?);
                    let param_type = linker.signature(param_type)?;
                    linker.module.params.push(ParamDef {
                        token: param_token,
                        name: name.clone(),
                        sequence: u16::try_from(sequence + 1)
                            .map_err(|_| malformed_error!("Too many parameters"))?,
                        param_type,
                        method: token,
                    });
                    params.push(param_token);
                }

                let return_type = linker.signature(&method.returns)?;
                linker.module.methods.push(MethodDef {
                    token,
                    name: method.name.clone(),
                    flags: method.access.bits() | method.modifiers.bits(),
                    declaring_type: type_token,
                    params,
                    return_type,
                    body: None,
                });
                linker.module.types[index].methods.push(token);

                if let Some(ops) = &method.body {
                    pending.push((token, ops));
                }
            }
        }

        for (token, ops) in pending {
            let mut code = Vec::with_capacity(ops.len());
            for (opcode, operand) in ops {
                code.push((*opcode, linker.operand(operand)?));
            }
            let body = MethodBody::assemble(code)?;
            if let Some(method) = linker.module.method_mut(token) {
                method.body = Some(body);
            }
        }

        Ok(linker.module)
    }
}

fn flatten<'a>(
    builder: &'a TypeBuilder,
    enclosing: Option<usize>,
    out: &mut Vec<(&'a TypeBuilder, Option<usize>)>,
) {
    let index = out.len();
    out.push((builder, enclosing));
    for nested in &builder.nested {
        flatten(nested, Some(index), out);
    }
}

fn row(index: usize) -> Result<u32> {
    u32::try_from(index + 1)
        .ok()
        .filter(|row| *row <= 0x00FF_FFFF)
        .ok_or_else(|| malformed_error!("Table row {} does not fit a token", index + 1))
}

/// Splits `a, b<c, d>, e` at top-level commas.
fn split_args(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts
}

struct Linker {
    names: HashMap<String, Token>,
    module: Module,
}

impl Linker {
    fn signature(&mut self, text: &str) -> Result<TypeSignature> {
        let text = text.trim();
        if text.is_empty() {
            return Err(malformed_error!("Empty type name"));
        }

        if let Some(inner) = text.strip_suffix("[]") {
            return Ok(TypeSignature::SzArray(Box::new(self.signature(inner)?)));
        }
        if let Some(inner) = text.strip_suffix('&') {
            return Ok(TypeSignature::ByRef(Box::new(self.signature(inner)?)));
        }
        if let Some(index) = text.strip_prefix("!!") {
            let index = index
                .parse()
                .map_err(|_| malformed_error!("Invalid generic parameter '{}'", text))?;
            return Ok(TypeSignature::GenericParamMethod(index));
        }
        if let Some(index) = text.strip_prefix('!') {
            let index = index
                .parse()
                .map_err(|_| malformed_error!("Invalid generic parameter '{}'", text))?;
            return Ok(TypeSignature::GenericParamType(index));
        }

        if let Some(args) = text.strip_suffix('>') {
            let open = args
                .find('<')
                .ok_or_else(|| malformed_error!("Unbalanced generic arguments in '{}'", text))?;
            let base_name = &args[..open];
            let args = split_args(&args[open + 1..])
                .into_iter()
                .map(|arg| self.signature(arg))
                .collect::<Result<Vec<_>>>()?;
            let base = self.named(base_name, args.len());
            return Ok(TypeSignature::GenericInst(Box::new(base), args));
        }

        Ok(self.named(text, 0))
    }

    fn named(&mut self, name: &str, arity: usize) -> TypeSignature {
        if let Some(token) = self.names.get(name) {
            return TypeSignature::Class(*token);
        }

        let with_arity = if arity > 0 && !name.contains('`') {
            format!("{name}`{arity}")
        } else {
            name.to_string()
        };
        if let Some(token) = self.names.get(&with_arity) {
            return TypeSignature::Class(*token);
        }

        if arity == 0 {
            if let Some(primitive) = TypeSignature::from_primitive_name(name) {
                return primitive;
            }
        }

        TypeSignature::Class(self.type_ref(&with_arity))
    }

    fn type_ref(&mut self, full_name: &str) -> Token {
        let (namespace, name) = full_name.rsplit_once('.').unwrap_or(("", full_name));
        if let Some(existing) = self
            .module
            .type_refs
            .iter()
            .find(|r| r.namespace == namespace && r.name == name)
        {
            return existing.token;
        }

        let token = Token::from_parts(TableId::TypeRef, self.module.type_refs.len() as u32 + 1);
        self.module.type_refs.push(TypeRef {
            token,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        token
    }

    fn member(&mut self, text: &str, field: bool) -> Result<Token> {
        let (owner, name) = text
            .rsplit_once("::")
            .ok_or_else(|| malformed_error!("Member '{}' is not written as Type::member", text))?;

        if let Some(owner) = self.names.get(owner).copied() {
            let found = if field {
                self.module
                    .fields_of(owner)
                    .find(|f| f.name == name)
                    .map(|f| f.token)
            } else {
                self.module
                    .methods_of(owner)
                    .find(|m| m.name == name)
                    .map(|m| m.token)
            };
            return found.ok_or_else(|| malformed_error!("Unknown member '{}'", text));
        }

        let parent = self.type_ref(owner);
        if let Some(existing) = self
            .module
            .member_refs
            .iter()
            .find(|r| r.parent == parent && r.name == name)
        {
            return Ok(existing.token);
        }

        let token =
            Token::from_parts(TableId::MemberRef, self.module.member_refs.len() as u32 + 1);
        self.module.member_refs.push(MemberRef {
            token,
            name: name.to_string(),
            parent,
        });
        Ok(token)
    }

    fn operand(&mut self, operand: &IlOperand) -> Result<Operand> {
        Ok(match operand {
            IlOperand::None => Operand::None,
            IlOperand::Immediate(value) => Operand::Immediate(*value),
            IlOperand::Target(index) => Operand::Target(*index as u64),
            IlOperand::Local(index) => Operand::Local(*index),
            IlOperand::Argument(index) => Operand::Argument(*index),
            IlOperand::Switch(targets) => {
                Operand::Switch(targets.iter().map(|t| *t as u64).collect())
            }
            IlOperand::Field(text) => Operand::Token(self.member(text, true)?),
            IlOperand::Method(text) => Operand::Token(self.member(text, false)?),
            IlOperand::Type(text) => {
                let signature = self.signature(text)?;
                let token = match signature.type_token() {
                    Some(token) => token,
                    None => match signature.primitive_name() {
                        Some(primitive) => self.type_ref(&format!("System.{primitive}")),
                        None => {
                            return Err(malformed_error!("'{}' has no type token", text));
                        }
                    },
                };
                Operand::Token(token)
            }
            IlOperand::String(literal) => {
                self.module.user_strings.push(literal.clone());
                Operand::Token(Token::from_parts(
                    TableId::UserString,
                    self.module.user_strings.len() as u32,
                ))
            }
            IlOperand::Token(token) => Operand::Token(*token),
        })
    }
}

impl TypeBuilder {
    /// A non-public class with no base type and no members.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeBuilder {
            namespace: namespace.into(),
            name: name.into(),
            public: false,
            flags: 0,
            base: None,
            fields: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Makes the type public (`NestedPublic` when nested).
    #[must_use]
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Adds raw `TypeAttributes` bits besides visibility.
    #[must_use]
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags |= flags & !TypeAttributes::VISIBILITY_MASK;
        self
    }

    /// Sets the base type by name.
    #[must_use]
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a nested type.
    #[must_use]
    pub fn nested(mut self, nested: TypeBuilder) -> Self {
        self.nested.push(nested);
        self
    }
}

impl FieldBuilder {
    /// A private instance field of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        FieldBuilder {
            name: name.into(),
            field_type: field_type.into(),
            flags: FieldAttributes::PRIVATE,
        }
    }

    /// Makes the field public.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.flags = attributes::with_field_access(self.flags, FieldAttributes::PUBLIC);
        self
    }

    /// Makes the field static.
    #[must_use]
    pub fn static_(mut self) -> Self {
        self.flags |= FieldAttributes::STATIC;
        self
    }

    /// Replaces all flags with raw `FieldAttributes`.
    #[must_use]
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}

impl MethodBuilder {
    /// A private instance method returning `void`, without body.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        MethodBuilder {
            name: name.into(),
            access: MethodAccessFlags::PRIVATE,
            modifiers: MethodModifiers::HIDE_BY_SIG,
            params: Vec::new(),
            returns: "System.Void".to_string(),
            body: None,
        }
    }

    /// A public instance constructor (`.ctor`).
    #[must_use]
    pub fn constructor() -> Self {
        MethodBuilder::new(".ctor")
            .public()
            .modifiers(MethodModifiers::SPECIAL_NAME | MethodModifiers::RTSPECIAL_NAME)
    }

    /// Sets access to public.
    #[must_use]
    pub fn public(self) -> Self {
        self.access(MethodAccessFlags::PUBLIC)
    }

    /// Sets access to private.
    #[must_use]
    pub fn private(self) -> Self {
        self.access(MethodAccessFlags::PRIVATE)
    }

    /// Sets the access flags.
    #[must_use]
    pub fn access(mut self, access: MethodAccessFlags) -> Self {
        self.access = access;
        self
    }

    /// Adds modifier flags.
    #[must_use]
    pub fn modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Makes the method static.
    #[must_use]
    pub fn static_(self) -> Self {
        self.modifiers(MethodModifiers::STATIC)
    }

    /// Makes the method virtual.
    #[must_use]
    pub fn virtual_(self) -> Self {
        self.modifiers(MethodModifiers::VIRTUAL)
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, param_type: impl Into<String>) -> Self {
        self.params.push((name.into(), param_type.into()));
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, return_type: impl Into<String>) -> Self {
        self.returns = return_type.into();
        self
    }

    /// Appends an instruction, creating the body on first use.
    #[must_use]
    pub fn instr(mut self, opcode: OpCode, operand: IlOperand) -> Self {
        self.body
            .get_or_insert_with(Vec::new)
            .push((opcode, operand));
        self
    }

    /// Appends an instruction without operand.
    #[must_use]
    pub fn op(self, opcode: OpCode) -> Self {
        self.instr(opcode, IlOperand::None)
    }

    /// Appends `count` `nop` instructions.
    #[must_use]
    pub fn nops(mut self, count: usize) -> Self {
        for _ in 0..count {
            self = self.op(OpCode::Nop);
        }
        self
    }

    /// Appends `ldstr literal`.
    #[must_use]
    pub fn ldstr(self, literal: impl Into<String>) -> Self {
        self.instr(OpCode::Ldstr, IlOperand::String(literal.into()))
    }

    /// Appends `ldfld Type::field`.
    #[must_use]
    pub fn ldfld(self, field: impl Into<String>) -> Self {
        self.instr(OpCode::Ldfld, IlOperand::Field(field.into()))
    }

    /// Appends `call Type::method`.
    #[must_use]
    pub fn call(self, method: impl Into<String>) -> Self {
        self.instr(OpCode::Call, IlOperand::Method(method.into()))
    }

    /// Appends `ret`.
    #[must_use]
    pub fn ret(self) -> Self {
        self.op(OpCode::Ret)
    }
}
