//! Shared types for the WATC compiler.
//!
//! This crate defines source spans, the value-type and operator taxonomy,
//! and the error types used across all compiler stages.

mod error;
mod span;
pub mod types;

pub use error::{FieldKind, WatError};
pub use span::Span;
pub use types::{
    BinaryOp, BinaryOpKind, CompareOp, CompareOpKind, ConvertOp, ConvertOpKind, MemOp, MemSize,
    Signedness, UnaryOp, UnaryOpKind, ValueType,
};

/// Result type used throughout the WATC compiler.
pub type Result<T> = std::result::Result<T, WatError>;
