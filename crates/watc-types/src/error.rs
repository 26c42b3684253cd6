//! Error types shared across the WATC compiler.
//!
//! Every failure in the AST/resolution layer is a deterministic structural
//! condition. Formatting for diagnostics (source-line excerpts etc.) is the
//! caller's job; these types carry the span and the facts.

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Module fields that may appear at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Table,
    Memory,
    Start,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Table => write!(f, "table"),
            FieldKind::Memory => write!(f, "memory"),
            FieldKind::Start => write!(f, "start"),
        }
    }
}

/// Structural errors from building and resolving the AST.
///
/// Type errors are not detected here — the validator owns those; this layer
/// only preserves the type tags it needs.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum WatError {
    /// A symbolic name is absent from the scope it is used in.
    #[error("unbound name `{name}`")]
    UnboundName { name: String, loc: Span },

    /// A numeric index is beyond the size of its index space.
    #[error("index {index} out of range (space has {size} entries)")]
    OutOfRange { index: usize, size: usize, loc: Span },

    /// A singleton module field was declared twice.
    #[error("duplicate {kind} field")]
    DuplicateField { kind: FieldKind, loc: Span },

    /// Two exports share one literal name.
    #[error("duplicate export `{name}`")]
    DuplicateExport { name: String, loc: Span },
}

impl WatError {
    /// The source location the error points at.
    pub fn loc(&self) -> Span {
        match self {
            WatError::UnboundName { loc, .. }
            | WatError::OutOfRange { loc, .. }
            | WatError::DuplicateField { loc, .. }
            | WatError::DuplicateExport { loc, .. } => *loc,
        }
    }
}
