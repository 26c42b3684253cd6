//! Value-type and operator taxonomy.
//!
//! Pure data: every operator kind is paired with the value type(s) it
//! operates on. Consumers (validator, binary encoder) read the pairing
//! structs; nothing here is behavior.

use serde::{Deserialize, Serialize};
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Value types
// ══════════════════════════════════════════════════════════════════════════════

/// A primitive value type tagging both data and operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// No value (empty result type).
    Void,
    I32,
    I64,
    F32,
    F64,
}

impl ValueType {
    /// True for `i32`/`i64`.
    pub fn is_int(self) -> bool {
        matches!(self, ValueType::I32 | ValueType::I64)
    }

    /// True for `f32`/`f64`.
    pub fn is_float(self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }

    /// The text-format keyword for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Void => "void",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memory access width in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemSize {
    Size8,
    Size16,
    Size32,
    Size64,
}

impl MemSize {
    pub fn bits(self) -> u32 {
        match self {
            MemSize::Size8 => 8,
            MemSize::Size16 => 16,
            MemSize::Size32 => 32,
            MemSize::Size64 => 64,
        }
    }
}

/// Signedness of integer operations and partial-width loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signedness {
    Signed,
    Unsigned,
}

// ══════════════════════════════════════════════════════════════════════════════
// Operator kinds
// ══════════════════════════════════════════════════════════════════════════════

/// Unary operator kinds. Float kinds (`Abs`..`Trunc`) and integer kinds
/// (`Clz`..`Popcnt`) share one enum; the paired [`ValueType`] selects the
/// instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Abs,
    Ceil,
    Floor,
    Nearest,
    Neg,
    Sqrt,
    Trunc,
    Clz,
    Ctz,
    Not,
    Popcnt,
}

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    /// Integer division, signed.
    DivS,
    /// Integer division, unsigned.
    DivU,
    /// Float division.
    Div,
    RemS,
    RemU,
    And,
    Or,
    Xor,
    Shl,
    ShrS,
    ShrU,
    Min,
    Max,
    CopySign,
}

/// Comparison operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOpKind {
    Eq,
    Ne,
    LtS,
    LtU,
    Lt,
    LeS,
    LeU,
    Le,
    GtS,
    GtU,
    Gt,
    GeS,
    GeU,
    Ge,
}

/// Conversion operator kinds. The paired source/destination types on
/// [`ConvertOp`] select the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOpKind {
    ConvertS,
    ConvertU,
    Demote,
    Promote,
    TruncS,
    TruncU,
    Wrap,
    ExtendS,
    ExtendU,
    Reinterpret,
}

// ══════════════════════════════════════════════════════════════════════════════
// Operator pairings
// ══════════════════════════════════════════════════════════════════════════════

/// A unary operator with its operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnaryOp {
    pub ty: ValueType,
    pub kind: UnaryOpKind,
}

/// A binary operator with its operand type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOp {
    pub ty: ValueType,
    pub kind: BinaryOpKind,
}

/// A comparison operator with its operand type. The result is always `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOp {
    pub ty: ValueType,
    pub kind: CompareOpKind,
}

/// A conversion operator: `to.kind/from`, e.g. `f64.convert_s/i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOp {
    pub to: ValueType,
    pub kind: ConvertOpKind,
    pub from: ValueType,
}

/// A memory access shape: value type, access width, and signedness for
/// partial-width loads (`None` for full-width accesses and all stores).
/// Whether it is a load or a store is carried by the expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemOp {
    pub ty: ValueType,
    pub size: MemSize,
    pub sign: Option<Signedness>,
}

impl MemOp {
    /// A full-width access: `i32.load`, `f64.store`, ...
    pub fn natural(ty: ValueType) -> Self {
        let size = match ty {
            ValueType::I64 | ValueType::F64 => MemSize::Size64,
            _ => MemSize::Size32,
        };
        Self {
            ty,
            size,
            sign: None,
        }
    }
}
