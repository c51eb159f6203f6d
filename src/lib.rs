//! deadsweep: safe dead-symbol elimination for resolved syntax trees.
//!
//! The host hands over a [`SourceModel`] — Code Units with every use site
//! already resolved to its declaration — and the engine repeatedly sweeps
//! each unit, deleting private methods, nested types, fields and locals
//! that nothing references, until a pass removes nothing. Anything
//! annotated, externally visible, or still referenced is never touched;
//! leaving dead code behind is acceptable, deleting live code is not.

// Export modules for library usage
pub mod config;
pub mod core;
pub mod driver;
pub mod executor;
pub mod index;
pub mod policy;
pub mod sweep;

// Re-export commonly used types
pub use crate::core::{
    CleanSummary, DeletionRecord, Error, Node, NodeId, NodeKind, Result, Scope, SourceModel, Span,
    SymbolKind, Visibility,
};

pub use crate::config::CleanConfig;
pub use crate::driver::{Cleaner, NoopNormalizer, Normalizer};
pub use crate::executor::{delete_symbol, delete_symbol_with_references};
pub use crate::index::ReferenceIndex;
pub use crate::policy::{is_safe_to_delete, scope_for};
pub use crate::sweep::sweep_unit;
