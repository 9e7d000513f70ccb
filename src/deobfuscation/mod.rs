//! Signature-based rename engine for obfuscated .NET modules.
//!
//! Obfuscators strip the names of types and members but leave their shapes intact:
//! visibility, parameter lists, return types, the fields an accessor loads, the
//! literals a method pushes. This module recovers names from those shapes. A
//! [`Catalog`] lists rename steps; the [`RenameEngine`] runs them in order over a
//! [`Module`](crate::metadata::module::Module) and reports what happened to each.
//!
//! # Architecture
//!
//! ```text
//! Catalog ──► steps ──► RenameEngine::run
//!                           │
//!                           ▼
//!                     RenameSession
//!                     ├─ Scope       (named slots bound by earlier steps)
//!                     ├─ find        (single-match resolution)
//!                     ├─ actions     (rename, make public, bind, scan)
//!                     ├─ RenameTracker
//!                     └─ Diagnostics
//!                           │
//!                           ▼
//!                       RunResult
//! ```
//!
//! # Key Components
//!
//! ## Predicates
//!
//! [`MethodMatcher`], [`FieldMatcher`] and [`TypeMatcher`] are fluent, composable
//! [`Predicate`]s over module elements. Type references inside them are either literal
//! names or [`Slot`]s bound earlier in the run.
//!
//! ## Steps
//!
//! - [`Rule`] - find exactly one element and apply actions to it
//! - [`Apply`] - apply actions to a type reached by name, slot or base chain
//! - [`Guarded`] - run sub-steps only once their slots are bound
//! - [`FanOut`] - run sub-steps once per subclass of a bound base type
//! - [`FnStep`] - custom logic, created with [`step`]
//!
//! ## Actions
//!
//! [`Rename`] and [`MakePublic`] are idempotent. [`OnType`] moves from a member to a
//! related type, [`ScanOperands`] from a method to the members its body references.
//!
//! ## Outcomes
//!
//! Every step ends with an [`Outcome`]. A run never aborts: missing and ambiguous
//! matches, failing actions and unresolved prerequisites are recorded in the
//! [`RunReport`] and in [`Diagnostics`], and the next step runs.
//!
//! # Example
//!
//! ```rust
//! use dotrename::deobfuscation::{CatalogRegistry, RenameConfig, RenameEngine};
//! use dotrename::metadata::builder::{ModuleBuilder, TypeBuilder};
//!
//! let mut module = ModuleBuilder::new("Assembly-CSharp")
//!     .add_type(TypeBuilder::new("", "World"))
//!     .build()?;
//!
//! let registry = CatalogRegistry::new();
//! let catalog = registry.get("sdtd").expect("built-in catalog");
//!
//! let result = RenameEngine::new(RenameConfig::default()).run(&mut module, &**catalog);
//! println!("{}", result.report.summary());
//! # Ok::<(), dotrename::Error>(())
//! ```

mod action;
mod config;
mod context;
mod diagnostics;
mod engine;
mod predicate;
mod resolver;
mod result;
mod rule;
mod scope;
mod session;
mod tracker;

/// Built-in rename catalogs.
pub mod catalogs;
/// Instruction scans over method bodies.
pub mod scanner;

pub use action::{
    action, reach_type, rename, Action, Bind, FnAction, MakePublic, OnType, Rename,
    ScanOperands, Sequence, TypeOf,
};
pub use catalogs::{Catalog, CatalogRegistry, SdtdCatalog};
pub use config::RenameConfig;
pub use context::{MatchContext, TypeName};
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
pub use engine::RenameEngine;
pub use predicate::{FieldMatcher, MethodMatcher, Predicate, TypeMatcher};
pub use resolver::{find, MatchResult};
pub use result::{Outcome, RunReport, RunResult, StepOutcome};
pub use rule::{
    step, Apply, FanOut, FnStep, Guarded, Member, Rule, Source, Step, Target, TypeSel,
    Unresolved,
};
pub use scope::{Scope, Slot};
pub use session::RenameSession;
pub use tracker::{RenameRecord, RenameTracker};
