//! Mutations applied to uniquely matched elements.
//!
//! An [`Action`] changes one element: it renames it, raises its visibility, binds it
//! to a scope slot, or drives a nested operation (an operand scan, a rename of a type
//! reached through a signature). Every built-in action is idempotent, since a run is
//! never rolled back and the same catalog may be applied to a module twice.

use crate::{
    deobfuscation::{
        diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity},
        scanner,
        scope::Slot,
        session::RenameSession,
    },
    metadata::{
        field::FieldDef, method::MethodDef, module::Element, module::ElementKind,
        token::Token, typesystem::TypeDef,
    },
    assembly::OpCode,
    Error, Result,
};

/// One mutation of one element.
pub trait Action {
    /// Short human-readable description, used in diagnostics.
    fn describe(&self) -> String;

    /// Applies the action to `target`.
    ///
    /// # Errors
    /// Any error is reported by the session as an action failure of the running rule.
    fn apply(&self, session: &mut RenameSession<'_>, target: Token) -> Result<()>;
}

/// Renames the target. Renaming to the current name succeeds without change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename(pub String);

impl Action for Rename {
    fn describe(&self) -> String {
        format!("rename to '{}'", self.0)
    }

    fn apply(&self, session: &mut RenameSession<'_>, target: Token) -> Result<()> {
        session.rename(target, &self.0)
    }
}

/// Makes the target (type, method or field) public. Already public succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakePublic;

impl Action for MakePublic {
    fn describe(&self) -> String {
        "make public".to_string()
    }

    fn apply(&self, session: &mut RenameSession<'_>, target: Token) -> Result<()> {
        session.make_public(target)
    }
}

/// Binds the target to a slot for later rules.
#[derive(Debug)]
pub struct Bind<E>(pub Slot<E>);

impl<E: Element> Action for Bind<E> {
    fn describe(&self) -> String {
        format!("bind '{}'", self.0.name())
    }

    fn apply(&self, session: &mut RenameSession<'_>, target: Token) -> Result<()> {
        session.bind(self.0, target)
    }
}

/// Where to find a type reachable from a matched member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOf {
    /// The type of the method parameter at this index
    Param(usize),
    /// The return type of the method
    Return,
    /// The declared type of the field, looking through arrays
    Field,
    /// The base type of the type
    Base,
    /// The type declaring the method or field
    Declaring,
}

/// Applies a nested action to a type definition reached from the target.
///
/// Fails if the reached type is not defined in the module (a primitive or a reference
/// to another assembly).
pub struct OnType {
    from: TypeOf,
    action: Box<dyn Action>,
}

impl OnType {
    /// Reaches the type `from` the target and applies `action` to it.
    pub fn new(from: TypeOf, action: impl Action + 'static) -> Self {
        OnType {
            from,
            action: Box::new(action),
        }
    }
}

/// Resolves the type definition `from` leads to, starting at `target`.
///
/// # Errors
/// [`Error::UnexpectedTable`] if `from` does not apply to the target's kind,
/// [`Error::TypeNotFound`] if the type is not defined in the module.
pub fn reach_type(session: &RenameSession<'_>, target: Token, from: TypeOf) -> Result<Token> {
    let module = session.module();
    let signature = match (from, ElementKind::from_token(target)) {
        (TypeOf::Param(index), Some(ElementKind::Method)) => {
            let method = module.element::<MethodDef>(target)?;
            module
                .param(method, index)
                .map(|p| p.param_type.clone())
                .ok_or_else(|| Error::Error(format!("{} has no parameter {}", method.name, index)))?
        }
        (TypeOf::Return, Some(ElementKind::Method)) => {
            module.element::<MethodDef>(target)?.return_type.clone()
        }
        (TypeOf::Field, Some(ElementKind::Field)) => {
            module.element::<FieldDef>(target)?.field_type.clone()
        }
        (TypeOf::Base, Some(ElementKind::Type)) => {
            let type_def = module.element::<TypeDef>(target)?;
            type_def
                .base
                .clone()
                .ok_or_else(|| Error::TypeNotFound(format!("base of {}", type_def.name)))?
        }
        (TypeOf::Declaring, Some(ElementKind::Method)) => {
            let declaring = module.element::<MethodDef>(target)?.declaring_type;
            return Ok(declaring);
        }
        (TypeOf::Declaring, Some(ElementKind::Field)) => {
            let declaring = module.element::<FieldDef>(target)?.declaring_type;
            return Ok(declaring);
        }
        _ => {
            return Err(Error::UnexpectedTable {
                token: target,
                expected: match from {
                    TypeOf::Field => ElementKind::Field.table(),
                    TypeOf::Base => ElementKind::Type.table(),
                    _ => ElementKind::Method.table(),
                },
                found: target.table_id(),
            })
        }
    };

    module
        .resolve_type(&signature)
        .map(|t| t.token)
        .ok_or_else(|| {
            Error::TypeNotFound(
                module
                    .type_name(&signature)
                    .unwrap_or_else(|| format!("{signature:?}")),
            )
        })
}

impl Action for OnType {
    fn describe(&self) -> String {
        format!("{:?} type: {}", self.from, self.action.describe())
    }

    fn apply(&self, session: &mut RenameSession<'_>, target: Token) -> Result<()> {
        let type_token = reach_type(session, target, self.from)?;
        self.action.apply(session, type_token)
    }
}

/// Scans the target method for instructions with given opcodes and applies a nested
/// action to every distinct element they reference.
///
/// Operands that do not resolve to a definition of the expected kind are reported as
/// warnings and skipped. A failure of the nested action is reported against its
/// operand and the scan moves on to the next one.
pub struct ScanOperands {
    opcodes: Vec<OpCode>,
    expected: ElementKind,
    action: Box<dyn Action>,
}

impl ScanOperands {
    /// Scans for `opcodes` whose operand is an element of kind `expected`.
    pub fn new(opcodes: &[OpCode], expected: ElementKind, action: impl Action + 'static) -> Self {
        ScanOperands {
            opcodes: opcodes.to_vec(),
            expected,
            action: Box::new(action),
        }
    }

    /// Field loads (`ldfld`, `ldsfld`).
    pub fn field_loads(action: impl Action + 'static) -> Self {
        Self::new(&[OpCode::Ldfld, OpCode::Ldsfld], ElementKind::Field, action)
    }

    /// Calls (`call`, `callvirt`).
    pub fn calls(action: impl Action + 'static) -> Self {
        Self::new(&[OpCode::Call, OpCode::Callvirt], ElementKind::Method, action)
    }
}

impl Action for ScanOperands {
    fn describe(&self) -> String {
        let opcodes: Vec<&str> = self.opcodes.iter().map(|o| o.mnemonic()).collect();
        format!("for each {} operand: {}", opcodes.join("/"), self.action.describe())
    }

    fn apply(&self, session: &mut RenameSession<'_>, target: Token) -> Result<()> {
        let operands = scanner::scan_operands(session, target, &self.opcodes, self.expected)?;
        let total = operands.len();
        let mut failed = 0;
        for operand in operands {
            if let Err(error) = self.action.apply(session, operand) {
                failed += 1;
                session.diagnostics().push(
                    Diagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCategory::Action,
                        session.label(session.current_label()),
                        format!("{} failed: {}", self.action.describe(), error),
                    )
                    .with_token(operand),
                );
            }
        }

        if failed > 0 {
            return Err(Error::Error(format!("{failed} of {total} operands failed")));
        }
        Ok(())
    }
}

/// Runs several actions in order, stopping at the first failure.
pub struct Sequence(pub Vec<Box<dyn Action>>);

impl Action for Sequence {
    fn describe(&self) -> String {
        let parts: Vec<String> = self.0.iter().map(|a| a.describe()).collect();
        parts.join(", ")
    }

    fn apply(&self, session: &mut RenameSession<'_>, target: Token) -> Result<()> {
        for action in &self.0 {
            action.apply(session, target)?;
        }
        Ok(())
    }
}

/// A closure used as an action.
pub struct FnAction<F> {
    description: String,
    f: F,
}

impl<F> Action for FnAction<F>
where
    F: Fn(&mut RenameSession<'_>, Token) -> Result<()>,
{
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn apply(&self, session: &mut RenameSession<'_>, target: Token) -> Result<()> {
        (self.f)(session, target)
    }
}

/// Wraps a closure as an action.
pub fn action<F>(description: impl Into<String>, f: F) -> FnAction<F>
where
    F: Fn(&mut RenameSession<'_>, Token) -> Result<()>,
{
    FnAction {
        description: description.into(),
        f,
    }
}

/// Shorthand for [`Rename`].
pub fn rename(name: impl Into<String>) -> Rename {
    Rename(name.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        deobfuscation::{config::RenameConfig, result::Outcome, session::RenameSession},
        metadata::builder::{FieldBuilder, MethodBuilder, ModuleBuilder, TypeBuilder},
        test::factories::sample_module,
    };

    #[test]
    fn test_rename_is_idempotent() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        assert!(rename("GameWorld").apply(&mut session, world).is_ok());
        assert!(rename("GameWorld").apply(&mut session, world).is_ok());
        assert_eq!(session.module().name_of(world), Some("GameWorld"));
        assert_eq!(session.tracker().len(), 1);
        assert_eq!(session.tracker().original_name(world), Some("World"));
    }

    #[test]
    fn test_make_public_is_idempotent() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        assert!(MakePublic.apply(&mut session, world).is_ok());
        assert!(MakePublic.apply(&mut session, world).is_ok());
        assert!(session.module().is_public(world).unwrap());
        assert_eq!(session.tracker().publicized(), &[world]);
    }

    #[test]
    fn test_on_type_reaches_array_element() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let player = module.type_by_name("Game.Player").unwrap().token;
        let array_field = module.fields_of(world).find(|f| f.name == "c").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        OnType::new(TypeOf::Field, rename("EntityPlayer"))
            .apply(&mut session, array_field)
            .unwrap();
        assert_eq!(session.module().name_of(player), Some("EntityPlayer"));
    }

    #[test]
    fn test_on_type_fails_for_primitives() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let ulong_field = module.fields_of(world).find(|f| f.name == "a").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let result = OnType::new(TypeOf::Field, rename("X")).apply(&mut session, ulong_field);
        assert!(matches!(result, Err(Error::TypeNotFound(_))));
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let mut module = sample_module();
        let world = module.type_by_name("Game.World").unwrap().token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let failing = action("fail", |_, _| Err(Error::Error("boom".into())));
        let sequence = Sequence(vec![Box::new(failing), Box::new(rename("Never"))]);
        assert!(sequence.apply(&mut session, world).is_err());
        assert_eq!(session.module().name_of(world), Some("World"));
    }

    #[test]
    fn test_scan_continues_past_failed_operand() {
        let mut module = ModuleBuilder::new("Test")
            .add_type(
                TypeBuilder::new("", "a")
                    .field(FieldBuilder::new("x", "System.Int32"))
                    .field(FieldBuilder::new("y", "System.Int32"))
                    .field(FieldBuilder::new("xField", "System.Int32"))
                    .method(
                        MethodBuilder::new("m")
                            .public()
                            .returns("System.Int32")
                            .op(OpCode::Ldarg0)
                            .ldfld("a::x")
                            .op(OpCode::Ldarg0)
                            .ldfld("a::y")
                            .op(OpCode::Add)
                            .ret(),
                    ),
            )
            .build()
            .unwrap();
        let method = module.methods()[0].token;
        let x = module.fields()[0].token;
        let y = module.fields()[1].token;
        let mut session = RenameSession::new(&mut module, RenameConfig::default());

        let suffix = action("append 'Field'", |session, field| {
            let name = format!("{}Field", session.module().name_of(field).unwrap_or_default());
            session.rename(field, &name)
        });
        let actions: Vec<Box<dyn Action>> = vec![Box::new(ScanOperands::field_loads(suffix))];
        assert!(!session.apply("a.m()", method, &actions));

        assert_eq!(session.module().name_of(x), Some("x"));
        assert_eq!(session.module().name_of(y), Some("yField"));
        assert_eq!(session.report().outcome("a.m()"), Some(Outcome::ActionFailed));

        let errors = session.diagnostics().errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].label, "a.m()");
        assert_eq!(errors[0].token, Some(x));
        assert!(errors[0].message.starts_with("append 'Field' failed:"));
        assert!(errors[1].message.ends_with("1 of 2 operands failed"));
    }
}
