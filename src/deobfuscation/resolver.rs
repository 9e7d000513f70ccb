//! Single-match resolution.
//!
//! [`find`] evaluates a predicate against every candidate and classifies the result by
//! cardinality. The scan never stops at the first hit: a second match must surface as
//! [`MatchResult::Ambiguous`] instead of being hidden by candidate order.

use crate::{
    deobfuscation::{context::MatchContext, predicate::Predicate},
    metadata::{module::Element, token::Token},
};

/// Cardinality-classified outcome of a [`find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// No candidate satisfied the predicate
    Missing,
    /// Exactly one candidate satisfied the predicate
    Unique(Token),
    /// Several candidates satisfied the predicate, in candidate order
    Ambiguous(Vec<Token>),
}

impl MatchResult {
    /// The matched element, only for [`MatchResult::Unique`].
    #[must_use]
    pub fn unique(&self) -> Option<Token> {
        match self {
            MatchResult::Unique(token) => Some(*token),
            _ => None,
        }
    }

    /// Number of matching candidates.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            MatchResult::Missing => 0,
            MatchResult::Unique(_) => 1,
            MatchResult::Ambiguous(tokens) => tokens.len(),
        }
    }
}

/// Evaluates `predicate` on every candidate of kind `E`.
///
/// Tokens that do not address an element of kind `E` are ignored.
pub fn find<E, I>(ctx: &MatchContext<'_>, candidates: I, predicate: &dyn Predicate<E>) -> MatchResult
where
    E: Element,
    I: IntoIterator<Item = Token>,
{
    let matches: Vec<Token> = candidates
        .into_iter()
        .filter(|token| {
            ctx.get::<E>(*token)
                .is_some_and(|element| predicate.matches(ctx, element))
        })
        .collect();

    match matches.len() {
        0 => MatchResult::Missing,
        1 => MatchResult::Unique(matches[0]),
        _ => MatchResult::Ambiguous(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        deobfuscation::{predicate::MethodMatcher, scope::Scope},
        metadata::{
            builder::{MethodBuilder, ModuleBuilder, TypeBuilder},
            method::MethodDef,
        },
    };

    fn module_with_matches(matching: usize, others: usize) -> crate::metadata::module::Module {
        let mut holder = TypeBuilder::new("", "a");
        for i in 0..matching {
            holder = holder.method(
                MethodBuilder::new(format!("m{i}"))
                    .public()
                    .static_()
                    .returns("System.Boolean"),
            );
        }
        for i in 0..others {
            holder = holder.method(MethodBuilder::new(format!("o{i}")).public());
        }
        ModuleBuilder::new("Test").add_type(holder).build().unwrap()
    }

    #[test]
    fn test_cardinality_is_exact() {
        for matching in 0..5 {
            let module = module_with_matches(matching, 3);
            let scope = Scope::new();
            let ctx = MatchContext::new(&module, &scope);
            let candidates = module.methods().iter().map(|m| m.token);
            let matcher = MethodMatcher::new().static_().returns("Boolean");

            let result = find::<MethodDef, _>(&ctx, candidates, &matcher);
            assert_eq!(result.count(), matching);
            match matching {
                0 => assert_eq!(result, MatchResult::Missing),
                1 => assert!(result.unique().is_some()),
                n => assert!(matches!(result, MatchResult::Ambiguous(ref t) if t.len() == n)),
            }
        }
    }

    #[test]
    fn test_foreign_tokens_are_ignored() {
        let module = module_with_matches(1, 0);
        let scope = Scope::new();
        let ctx = MatchContext::new(&module, &scope);
        let type_token = module.types()[0].token;
        let accept_all = |_: &MatchContext<'_>, _: &MethodDef| true;

        let result = find::<MethodDef, _>(&ctx, [type_token], &accept_all);
        assert_eq!(result, MatchResult::Missing);
    }
}
