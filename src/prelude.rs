//! # dotrename Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotrename library. Import it to get the module model, the predicate
//! builders, the rule types and the engine in one line.
//!
//! ```rust
//! use dotrename::prelude::*;
//! ```

// Core error handling
pub use crate::Error;
pub use crate::Result;

// Module model
pub use crate::metadata::builder::{FieldBuilder, MethodBuilder, ModuleBuilder, TypeBuilder};
pub use crate::metadata::field::FieldDef;
pub use crate::metadata::method::{MethodDef, ParamDef};
pub use crate::metadata::module::{Element, ElementKind, Module};
pub use crate::metadata::signatures::TypeSignature;
pub use crate::metadata::token::Token;
pub use crate::metadata::typesystem::TypeDef;

// Instructions
pub use crate::assembly::{Instruction, MethodBody, OpCode, Operand};

// Predicates and rules
pub use crate::deobfuscation::{
    Action, Apply, FanOut, FieldMatcher, Guarded, MethodMatcher, OnType, Predicate, Rule,
    ScanOperands, Slot, Step, TypeMatcher, TypeOf, TypeSel,
};

// Engine and results
pub use crate::deobfuscation::{
    Catalog, CatalogRegistry, DiagnosticCategory, DiagnosticSeverity, Diagnostics, Outcome,
    RenameConfig, RenameEngine, RenameTracker, RunReport, RunResult,
};
