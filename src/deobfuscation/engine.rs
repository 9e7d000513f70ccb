//! Main rename engine.
//!
//! The [`RenameEngine`] is the entry point for running a catalog over a module. It
//! opens a [`RenameSession`], executes the catalog's steps strictly in declaration
//! order and collects everything the run produced into a [`RunResult`].
//!
//! A run always completes: steps that find nothing, find too much or fail in an
//! action are recorded and the next step runs.

use std::time::Instant;

use log::{debug, info};

use crate::{
    deobfuscation::{
        catalogs::Catalog, config::RenameConfig, result::RunResult, rule::Step,
        session::RenameSession,
    },
    metadata::module::Module,
};

/// Runs rename catalogs over modules.
///
/// # Example
///
/// ```rust
/// use dotrename::deobfuscation::{MethodMatcher, RenameConfig, RenameEngine, Rule, Step};
/// use dotrename::metadata::builder::{MethodBuilder, ModuleBuilder, TypeBuilder};
///
/// let mut module = ModuleBuilder::new("Demo")
///     .add_type(
///         TypeBuilder::new("", "a")
///             .method(MethodBuilder::new("b").public().static_().returns("System.Boolean")),
///     )
///     .build()?;
///
/// let steps: Vec<Box<dyn Step>> = vec![Box::new(
///     Rule::methods("IsDedicated")
///         .matching(MethodMatcher::new().static_().returns("Boolean"))
///         .rename("IsDedicated"),
/// )];
///
/// let engine = RenameEngine::new(RenameConfig::default());
/// let result = engine.run_steps(&mut module, "demo", &steps);
/// assert_eq!(result.report.applied(), 1);
/// # Ok::<(), dotrename::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenameEngine {
    config: RenameConfig,
}

impl RenameEngine {
    /// Creates an engine with the given configuration.
    #[must_use]
    pub fn new(config: RenameConfig) -> Self {
        RenameEngine { config }
    }

    /// The configuration every run uses.
    #[must_use]
    pub fn config(&self) -> &RenameConfig {
        &self.config
    }

    /// Runs `catalog` over `module`.
    pub fn run(&self, module: &mut Module, catalog: &dyn Catalog) -> RunResult {
        self.run_steps(module, &catalog.id(), &catalog.steps())
    }

    /// Runs an ad-hoc list of steps over `module`, reporting it under `name`.
    pub fn run_steps(&self, module: &mut Module, name: &str, steps: &[Box<dyn Step>]) -> RunResult {
        let start = Instant::now();
        info!("running catalog '{}' ({} steps) on {}", name, steps.len(), module.name());

        let mut session = RenameSession::new(module, self.config.clone());
        for step in steps {
            debug!("step {}", step.label());
            step.execute(&mut session);
        }

        let mut result = session.finish(name);
        result.report.elapsed = start.elapsed();
        info!("{}", result.report.summary());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        deobfuscation::{
            predicate::{FieldMatcher, MethodMatcher},
            result::Outcome,
            rule::Rule,
        },
        test::factories::sample_module,
    };

    #[test]
    fn test_run_continues_after_failures() {
        let mut module = sample_module();
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(
                Rule::methods("ambiguous")
                    .within("Game.World")
                    .matching(MethodMatcher::new().public()),
            ),
            Box::new(Rule::fields("missing").within("Game.Nope")),
            Box::new(
                Rule::fields("World.gameTime")
                    .within("Game.World")
                    .matching(FieldMatcher::new().of_type("UInt64"))
                    .rename("gameTime"),
            ),
        ];

        let result = RenameEngine::default().run_steps(&mut module, "test", &steps);
        assert_eq!(result.report.steps.len(), 3);
        assert!(matches!(result.report.outcome("ambiguous"), Some(Outcome::Ambiguous(_))));
        assert_eq!(result.report.outcome("missing"), Some(Outcome::Skipped));
        assert_eq!(result.report.outcome("World.gameTime"), Some(Outcome::Applied));
        assert_eq!(result.report.catalog, "test");
        assert_eq!(result.tracker.len(), 1);
    }
}
