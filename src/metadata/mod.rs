//! Metadata model of a .NET module.
//!
//! This module holds the element graph rename rules match against and mutate. It is a
//! model of the parts of ECMA-335 metadata that carry names and shapes, not a PE
//! parser: modules are constructed with [`builder::ModuleBuilder`] or from a snapshot.
//!
//! # Key Components
//!
//! - [`module::Module`] - Element tables, name lookup and the mutation facade
//! - [`typesystem`] - Type definitions, type references and member references
//! - [`method`] / [`field`] - Member definitions with their signatures
//! - [`signatures`] - Type signatures and the simple-name policy
//! - [`attributes`] - Visibility and modifier flags
//! - [`token`] - Metadata tokens and the tables they address
//!
//! # Examples
//!
//! ```rust
//! use dotrename::metadata::builder::{FieldBuilder, ModuleBuilder, TypeBuilder};
//!
//! let module = ModuleBuilder::new("Assembly-CSharp")
//!     .add_type(TypeBuilder::new("", "World").field(FieldBuilder::new("a", "System.UInt64")))
//!     .build()?;
//!
//! let world = module.type_by_name("World")?.token;
//! assert_eq!(module.fields_of(world).count(), 1);
//! # Ok::<(), dotrename::Error>(())
//! ```

/// Visibility and modifier flags
pub mod attributes;
/// Fluent module construction
pub mod builder;
/// Field definitions
pub mod field;
/// Method and parameter definitions
pub mod method;
/// The module graph and its mutation facade
pub mod module;
/// Type signatures
pub mod signatures;
/// Metadata tokens
pub mod token;
/// Type definitions and references
pub mod typesystem;
