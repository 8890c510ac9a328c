//! Data models
//!
//! Wire types for the field-operations REST backend.
//! All IDs are `i64`; the backend's numeric strings are accepted too.

pub mod assignment;
pub mod checkpoint;
pub mod employee;
pub mod issue;
pub mod project;

// Re-exports
pub use assignment::*;
pub use checkpoint::*;
pub use employee::*;
pub use issue::*;
pub use project::*;
