//! Linear instruction scanning of method bodies.
//!
//! Bodies are expanded to their macro-free form before they are scanned, so every
//! argument, local, constant and branch is encoded the same way regardless of which
//! short form the compiler chose. When [`RenameConfig::restore_macros`] is set, the
//! body is compacted again afterwards.
//!
//! Two scans are offered:
//!
//! - [`scan_operands`] collects the definitions referenced by instructions of given
//!   opcodes (the fields an accessor loads, the methods a method calls)
//! - [`longest_string_literal`] picks the longest literal pushed by `ldstr` as a naming
//!   hint; on equal length the first literal wins
//!
//! Operands that cannot be resolved are reported as warnings against the running step
//! and skipped; they never stop a scan.
//!
//! [`RenameConfig::restore_macros`]: crate::deobfuscation::RenameConfig::restore_macros

use crate::{
    assembly::{MethodBody, OpCode},
    deobfuscation::{diagnostics::DiagnosticCategory, session::RenameSession},
    metadata::{
        field::FieldDef,
        method::{MethodDef, ParamDef},
        module::ElementKind,
        typesystem::TypeDef,
        token::Token,
    },
    Error, Result,
};

/// Runs `scan` over the macro-free body of `method`.
fn with_simplified_body<T>(
    session: &mut RenameSession<'_>,
    method: Token,
    scan: impl FnOnce(&RenameSession<'_>, &MethodBody) -> T,
) -> Result<T> {
    session.module().element::<MethodDef>(method)?;
    session
        .module_mut()
        .method_mut(method)
        .and_then(|m| m.body.as_mut())
        .ok_or(Error::NoBody(method))?
        .simplify_macros()?;

    let result = {
        let view: &RenameSession<'_> = session;
        let body = view
            .module()
            .get::<MethodDef>(method)
            .and_then(|m| m.body.as_ref())
            .ok_or(Error::NoBody(method))?;
        scan(view, body)
    };

    if session.config().restore_macros {
        if let Some(body) = session
            .module_mut()
            .method_mut(method)
            .and_then(|m| m.body.as_mut())
        {
            body.optimize_macros()?;
        }
    }
    Ok(result)
}

/// Returns `true` if `token` addresses an existing element of kind `kind`.
fn resolves_to(session: &RenameSession<'_>, token: Token, kind: ElementKind) -> bool {
    let module = session.module();
    match kind {
        ElementKind::Type => module.get::<TypeDef>(token).is_some(),
        ElementKind::Method => module.get::<MethodDef>(token).is_some(),
        ElementKind::Field => module.get::<FieldDef>(token).is_some(),
        ElementKind::Param => module.get::<ParamDef>(token).is_some(),
    }
}

/// Collects the distinct definitions of kind `expected` referenced by instructions of
/// `method` whose opcode is one of `opcodes`, in first-seen order.
///
/// # Errors
/// Fails if `method` is not a method with a body, or if its body cannot be
/// re-encoded after the scan.
pub fn scan_operands(
    session: &mut RenameSession<'_>,
    method: Token,
    opcodes: &[OpCode],
    expected: ElementKind,
) -> Result<Vec<Token>> {
    with_simplified_body(session, method, |session, body| {
        let mut found = Vec::new();
        for instruction in body.iter().filter(|i| opcodes.contains(&i.opcode)) {
            match instruction.operand.token() {
                Some(token) if resolves_to(session, token, expected) => {
                    if !found.contains(&token) {
                        found.push(token);
                    }
                }
                operand => session.warn(
                    DiagnosticCategory::Operand,
                    session.current_label(),
                    format!(
                        "{} at IL_{:04X} does not reference a {} definition ({})",
                        instruction.opcode,
                        instruction.offset,
                        expected,
                        describe_operand(session, operand)
                    ),
                ),
            }
        }
        found
    })
}

fn describe_operand(session: &RenameSession<'_>, operand: Option<Token>) -> String {
    match operand {
        Some(token) => match session.module().member_ref(token) {
            Some(member) => format!("external member '{}'", member.name),
            None => format!("token {token}"),
        },
        None => "no token operand".to_string(),
    }
}

/// The longest literal pushed by `ldstr` in `method`, counted in characters.
///
/// On equal length the literal seen first wins. Empty literals never win, so a body
/// pushing only `""` yields `None`. `ldstr` operands that do not resolve to a user
/// string are reported and ignored.
///
/// # Errors
/// Same as [`scan_operands`].
pub fn longest_string_literal(
    session: &mut RenameSession<'_>,
    method: Token,
) -> Result<Option<String>> {
    with_simplified_body(session, method, |session, body| {
        let mut longest: Option<&str> = None;
        let mut best = 0;
        for instruction in body.iter().filter(|i| i.opcode == OpCode::Ldstr) {
            let literal = instruction
                .user_string_token()
                .and_then(|token| session.module().user_string(token));
            match literal {
                Some(literal) => {
                    let length = literal.chars().count();
                    if length > best {
                        best = length;
                        longest = Some(literal);
                    }
                }
                None => session.warn(
                    DiagnosticCategory::Operand,
                    session.current_label(),
                    format!(
                        "ldstr at IL_{:04X} has no string operand",
                        instruction.offset
                    ),
                ),
            }
        }
        longest.map(str::to_string)
    })
}
