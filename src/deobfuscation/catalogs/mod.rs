//! Rename catalogs for specific target modules.
//!
//! A catalog is the ordered list of steps that recovers names in one family of
//! obfuscated builds. Catalogs are data for the engine: the engine knows nothing about
//! any particular target.
//!
//! # Architecture
//!
//! - [`Catalog`] - Trait implemented by every catalog
//! - [`CatalogRegistry`] - Looks catalogs up by id
//!
//! # Built-in Catalogs
//!
//! - [`SdtdCatalog`] - 7 Days to Die dedicated server (`Assembly-CSharp`)
//!
//! # Example
//!
//! ```rust
//! use dotrename::deobfuscation::CatalogRegistry;
//!
//! let registry = CatalogRegistry::new();
//! let catalog = registry.get("sdtd").expect("built in");
//! assert!(!catalog.steps().is_empty());
//! ```

mod registry;
mod sdtd;

pub use registry::CatalogRegistry;
pub use sdtd::SdtdCatalog;

use crate::deobfuscation::rule::Step;

/// An ordered set of rename steps for one target.
///
/// # Implementing a Catalog
///
/// ```rust
/// use dotrename::deobfuscation::{Catalog, Rule, Step, TypeMatcher};
///
/// struct MyCatalog;
///
/// impl Catalog for MyCatalog {
///     fn id(&self) -> String { "mine".to_string() }
///     fn name(&self) -> String { "My Target".to_string() }
///
///     fn steps(&self) -> Vec<Box<dyn Step>> {
///         vec![Box::new(
///             Rule::types("Program")
///                 .matching(TypeMatcher::new().named("a"))
///                 .rename("Program"),
///         )]
///     }
/// }
/// ```
pub trait Catalog: Send + Sync {
    /// Unique identifier, lowercase (e.g. "sdtd").
    fn id(&self) -> String;

    /// Human-readable name of the target.
    fn name(&self) -> String;

    /// One-line description shown by listings.
    fn description(&self) -> String {
        String::new()
    }

    /// The steps, in evaluation order.
    ///
    /// Steps are built fresh on every call, so a catalog can be run any number of times.
    fn steps(&self) -> Vec<Box<dyn Step>>;
}
