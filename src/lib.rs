// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![warn(missing_docs)]
#![allow(clippy::too_many_arguments)]
#![deny(unsafe_code)]

//! # dotrename
//!
//! Signature-based name recovery for obfuscated .NET modules.
//!
//! Name obfuscators replace the identifiers of types, methods and fields with
//! meaningless ones (`a`, `b`, `\u0001`) but cannot change what the code *is*: a
//! method still has three parameters, still returns a `bool`, still loads the same
//! field. `dotrename` describes the elements a consumer depends on by such signatures,
//! finds the single element matching each description and gives it back its name.
//!
//! # Architecture
//!
//! - [`metadata`] - The module graph: types, methods, fields, parameters, tokens and
//!   signatures, plus the mutation facade (rename, make public)
//! - [`assembly`] - The CIL instruction model with macro simplification, used to scan
//!   method bodies
//! - [`deobfuscation`] - Predicates, rename rules, the staged engine, diagnostics and
//!   the built-in catalogs
//!
//! # Quick Start
//!
//! ```rust
//! use dotrename::prelude::*;
//!
//! let mut module = ModuleBuilder::new("Assembly-CSharp")
//!     .add_type(
//!         TypeBuilder::new("", "a").method(
//!             MethodBuilder::new("b")
//!                 .public()
//!                 .static_()
//!                 .returns("System.Boolean"),
//!         ),
//!     )
//!     .build()?;
//!
//! let steps: Vec<Box<dyn Step>> = vec![
//!     Box::new(
//!         Rule::types("StaticDirectories")
//!             .matching(TypeMatcher::new().with_methods(MethodMatcher::new().static_(), 1))
//!             .rename("StaticDirectories"),
//!     ),
//! ];
//!
//! let result = RenameEngine::default().run_steps(&mut module, "quick-start", &steps);
//! assert_eq!(result.report.outcome("StaticDirectories"), Some(Outcome::Applied));
//! assert!(module.type_by_name("StaticDirectories").is_ok());
//! # Ok::<(), dotrename::Error>(())
//! ```
//!
//! # Error Handling
//!
//! Facade operations return [`Result`]. Catalog runs never fail as a whole: every
//! problem is recorded as a [`deobfuscation::Diagnostic`] and the outcome of the step
//! that hit it.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotrename::prelude::*;
///
/// let module = ModuleBuilder::new("Demo").build()?;
/// assert!(module.types().is_empty());
/// # Ok::<(), dotrename::Error>(())
/// ```
pub mod prelude;

/// CIL instruction model and method bodies.
///
/// Bodies are sequences of [`assembly::Instruction`]s laid out at byte offsets. The
/// scanner expands short macro forms (`ldarg.0`, `br.s`) into their canonical
/// encodings before it looks at operands, and can compact them afterwards.
pub mod assembly;

/// Module graph and metadata elements.
pub mod metadata;

/// Rename engine, predicates and catalogs.
pub mod deobfuscation;

/// `dotrename` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotrename` Error type
///
/// # Examples
///
/// ```rust
/// use dotrename::{Error, metadata::builder::ModuleBuilder};
///
/// let module = ModuleBuilder::new("Demo").build()?;
/// assert!(matches!(module.type_by_name("World"), Err(Error::TypeNotFound(_))));
/// # Ok::<(), dotrename::Error>(())
/// ```
pub use error::Error;
