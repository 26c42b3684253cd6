//! Expression tree.
//!
//! Every instruction form is a variant of [`ExprKind`]; recursive variants
//! own their children through `Box`/`Vec`, so the tree is a tree (never a
//! DAG) and teardown is automatic and exactly-once.
//!
//! Built once by the parser. The only mutation after construction is the
//! resolution pass rewriting [`Var`]s in place.

use watc_types::{BinaryOp, CompareOp, ConvertOp, MemOp, Span, UnaryOp, ValueType};

use crate::binding::BindingHash;
use crate::var::Var;

// ══════════════════════════════════════════════════════════════════════════════
// Constants
// ══════════════════════════════════════════════════════════════════════════════

/// A typed constant payload. The value is only reachable through the tag, so
/// reading an `i64` payload as `f32` is not expressible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    /// Bit pattern of an `i32.const` (sign-agnostic).
    I32(u32),
    /// Bit pattern of an `i64.const`.
    I64(u64),
    F32(f32),
    F64(f64),
}

impl ConstValue {
    pub fn ty(self) -> ValueType {
        match self {
            ConstValue::I32(_) => ValueType::I32,
            ConstValue::I64(_) => ValueType::I64,
            ConstValue::F32(_) => ValueType::F32,
            ConstValue::F64(_) => ValueType::F64,
        }
    }
}

/// A literal constant: `(i32.const 7)`, `(f64.const 1.5)`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct Const {
    pub loc: Span,
    pub value: ConstValue,
}

impl Const {
    pub fn new(loc: Span, value: ConstValue) -> Self {
        Self { loc, value }
    }

    pub fn ty(&self) -> ValueType {
        self.value.ty()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Tableswitch
// ══════════════════════════════════════════════════════════════════════════════

/// A branch-table entry: jump to a case of this switch, or break out to an
/// enclosing label.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Case(Var),
    Br(Var),
}

impl Target {
    pub fn var(&self) -> &Var {
        match self {
            Target::Case(var) | Target::Br(var) => var,
        }
    }
}

/// One case arm of a tableswitch.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub loc: Span,
    pub label: Option<String>,
    pub exprs: Vec<Expr>,
}

/// `(tableswitch ...)`: a computed branch over case arms.
///
/// `case_bindings` maps case label → case index; it owns its key strings and
/// each [`Case`] owns its label, so neither side aliases the other.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSwitch {
    pub label: Option<String>,
    pub key: Box<Expr>,
    pub targets: Vec<Target>,
    pub default_target: Target,
    pub case_bindings: BindingHash,
    pub cases: Vec<Case>,
}

impl TableSwitch {
    /// Register a case arm, binding its label (if any) to the case index.
    pub fn push_case(&mut self, case: Case) -> usize {
        let index = self.cases.len();
        if let Some(label) = &case.label {
            self.case_bindings.insert_with_index(label, case.loc, index);
        }
        self.cases.push(case);
        index
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Recursive variants are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub loc: Span,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(loc: Span, kind: ExprKind) -> Self {
        Self { loc, kind }
    }
}

/// The instruction form of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `(i32.add a b)`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `(block $label exprs...)`
    Block {
        label: Option<String>,
        exprs: Vec<Expr>,
    },
    /// `(br $label value?)`
    Br {
        target: Var,
        expr: Option<Box<Expr>>,
    },
    /// `(br_if $label cond value?)`
    BrIf {
        target: Var,
        cond: Box<Expr>,
        expr: Option<Box<Expr>>,
    },
    /// `(call $func args...)` — defined-function index space
    Call { target: Var, args: Vec<Expr> },
    /// `(call_import $import args...)` — import index space
    CallImport { target: Var, args: Vec<Expr> },
    /// `(call_indirect $type index args...)`
    CallIndirect {
        type_var: Var,
        index: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `(i32.lt_s a b)`
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `(i32.const 7)`
    Const(Const),
    /// `(f64.convert_s/i32 x)`
    Convert { op: ConvertOp, expr: Box<Expr> },
    /// `(get_local $x)`
    GetLocal { var: Var },
    /// `(grow_memory pages)`
    GrowMemory { expr: Box<Expr> },
    /// `(has_feature "...")`
    HasFeature { text: String },
    /// `(if cond then)`
    If { cond: Box<Expr>, then: Box<Expr> },
    /// `(if cond then else)`
    IfElse {
        cond: Box<Expr>,
        then: Box<Expr>,
        else_: Box<Expr>,
    },
    /// `(i32.load8_u addr)` and friends
    Load {
        op: MemOp,
        align: Option<u32>,
        offset: u64,
        addr: Box<Expr>,
    },
    /// `(load_global $g)`
    LoadGlobal { var: Var },
    /// `(loop $outer $inner exprs...)` — both labels in scope in the body,
    /// the inner one innermost
    Loop {
        outer: Option<String>,
        inner: Option<String>,
        exprs: Vec<Expr>,
    },
    /// `(memory_size)`
    MemorySize,
    /// `(nop)`
    Nop,
    /// `(return value?)`
    Return { expr: Option<Box<Expr>> },
    /// `(i32.select cond a b)`
    Select {
        ty: ValueType,
        cond: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },
    /// `(set_local $x value)`
    SetLocal { var: Var, expr: Box<Expr> },
    /// `(i64.store addr value)` and friends
    Store {
        op: MemOp,
        align: Option<u32>,
        offset: u64,
        addr: Box<Expr>,
        value: Box<Expr>,
    },
    /// `(store_global $g value)`
    StoreGlobal { var: Var, expr: Box<Expr> },
    /// `(tableswitch ...)`
    TableSwitch(Box<TableSwitch>),
    /// `(f32.neg x)`
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// `(unreachable)`
    Unreachable,
}

impl ExprKind {
    /// The text-format name of this instruction form.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Binary { .. } => "binary",
            ExprKind::Block { .. } => "block",
            ExprKind::Br { .. } => "br",
            ExprKind::BrIf { .. } => "br_if",
            ExprKind::Call { .. } => "call",
            ExprKind::CallImport { .. } => "call_import",
            ExprKind::CallIndirect { .. } => "call_indirect",
            ExprKind::Compare { .. } => "compare",
            ExprKind::Const(_) => "const",
            ExprKind::Convert { .. } => "convert",
            ExprKind::GetLocal { .. } => "get_local",
            ExprKind::GrowMemory { .. } => "grow_memory",
            ExprKind::HasFeature { .. } => "has_feature",
            ExprKind::If { .. } => "if",
            ExprKind::IfElse { .. } => "if_else",
            ExprKind::Load { .. } => "load",
            ExprKind::LoadGlobal { .. } => "load_global",
            ExprKind::Loop { .. } => "loop",
            ExprKind::MemorySize => "memory_size",
            ExprKind::Nop => "nop",
            ExprKind::Return { .. } => "return",
            ExprKind::Select { .. } => "select",
            ExprKind::SetLocal { .. } => "set_local",
            ExprKind::Store { .. } => "store",
            ExprKind::StoreGlobal { .. } => "store_global",
            ExprKind::TableSwitch(_) => "tableswitch",
            ExprKind::Unary { .. } => "unary",
            ExprKind::Unreachable => "unreachable",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Traversal
// ══════════════════════════════════════════════════════════════════════════════

/// Whether a traversal keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Expr {
    /// The node's direct children, in evaluation/source order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Binary { left, right, .. } | ExprKind::Compare { left, right, .. } => {
                vec![&**left, &**right]
            }
            ExprKind::Block { exprs, .. } | ExprKind::Loop { exprs, .. } => exprs.iter().collect(),
            ExprKind::Br { expr, .. } | ExprKind::Return { expr } => {
                expr.iter().map(|e| &**e).collect()
            }
            ExprKind::BrIf { cond, expr, .. } => {
                let mut out: Vec<&Expr> = vec![&**cond];
                out.extend(expr.iter().map(|e| &**e));
                out
            }
            ExprKind::Call { args, .. } | ExprKind::CallImport { args, .. } => args.iter().collect(),
            ExprKind::CallIndirect { index, args, .. } => {
                let mut out: Vec<&Expr> = vec![&**index];
                out.extend(args.iter());
                out
            }
            ExprKind::Convert { expr, .. }
            | ExprKind::GrowMemory { expr }
            | ExprKind::SetLocal { expr, .. }
            | ExprKind::StoreGlobal { expr, .. }
            | ExprKind::Unary { expr, .. } => vec![&**expr],
            ExprKind::If { cond, then } => vec![&**cond, &**then],
            ExprKind::IfElse { cond, then, else_ } => vec![&**cond, &**then, &**else_],
            ExprKind::Load { addr, .. } => vec![&**addr],
            ExprKind::Select {
                cond,
                if_true,
                if_false,
                ..
            } => vec![&**cond, &**if_true, &**if_false],
            ExprKind::Store { addr, value, .. } => vec![&**addr, &**value],
            ExprKind::TableSwitch(ts) => {
                let mut out: Vec<&Expr> = vec![&*ts.key];
                for case in &ts.cases {
                    out.extend(case.exprs.iter());
                }
                out
            }
            ExprKind::Const(_)
            | ExprKind::GetLocal { .. }
            | ExprKind::HasFeature { .. }
            | ExprKind::LoadGlobal { .. }
            | ExprKind::MemorySize
            | ExprKind::Nop
            | ExprKind::Unreachable => Vec::new(),
        }
    }

    /// Depth-first pre-order traversal with early exit.
    ///
    /// `visit` sees this node first, then each child subtree in order.
    /// Returning [`Flow::Stop`] ends the whole traversal.
    pub fn walk(&self, visit: &mut impl FnMut(&Expr) -> Flow) -> Flow {
        if visit(self) == Flow::Stop {
            return Flow::Stop;
        }
        for child in self.children() {
            if child.walk(visit) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }
}
