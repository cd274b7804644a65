//! BuildProbe Common Library
//!
//! Test-data generation and cleanup tracking for the BuildProbe harness:
//! entity shapes and their field tables, the entity generator, the creation
//! ledger and request/response model comparison.

pub mod comparison;
pub mod error;
pub mod generator;
pub mod ledger;
pub mod model;
pub mod random;
pub mod shape;
pub mod types;

// Re-export commonly used types
pub use comparison::{assert_models_match, ComparisonRules};
pub use error::{Error, Result};
pub use generator::{generate, generate_all, generate_kind, generate_with, validate_schema};
pub use ledger::{drain_shared, CreationLedger, EntityDeleter, SharedLedger};
pub use model::{Entity, ShapeKind, TestData};
pub use shape::{Shape, Value};
pub use types::*;

/// BuildProbe version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
