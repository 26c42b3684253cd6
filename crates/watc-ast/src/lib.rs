//! Abstract syntax tree and symbol resolution for the WATC compiler.
//!
//! The text-format parser builds this tree, one resolution pass converts
//! symbolic names to indices, and from then on the tree is frozen: the
//! binary encoder, the validator and the conformance driver all read it
//! through the query methods here and never mutate it.
//!
//! ```text
//! parse → build (Module::build) → resolve (Module::resolve) → freeze
//! ```

pub mod binding;
pub mod expr;
pub mod func;
pub mod module;
pub mod script;
pub mod var;

mod resolve;

pub use binding::{Binding, BindingHash, TypeBindings};
pub use expr::{Case, Const, ConstValue, Expr, ExprKind, Flow, TableSwitch, Target};
pub use func::{Func, FuncSignature, FuncType};
pub use module::{Export, Import, ImportSig, Memory, Module, ModuleField, ModuleFieldKind, Segment};
pub use script::{Command, Invoke, Script};
pub use var::{Var, VarKind};
