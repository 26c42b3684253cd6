//! The one-shot Name→Index resolution pass.
//!
//! Walks every var in a module exactly once and rewrites symbolic names to
//! indices: locals against the owning function's merged param+local scope,
//! calls against the func/import/func-type spaces, globals against the
//! merged global space, and branch targets against a lexical label stack
//! (innermost match wins, numeric depths bounds-checked). After this pass
//! the module is frozen.

use watc_types::{Result, WatError};

use crate::binding::{BindingHash, TypeBindings};
use crate::expr::{Expr, ExprKind, TableSwitch, Target};
use crate::func::Func;
use crate::module::{ImportSig, Module, ModuleFieldKind};
use crate::var::{Var, VarKind};

/// The module-level index spaces body expressions resolve against.
struct Scopes<'a> {
    funcs: &'a BindingHash,
    num_funcs: usize,
    imports: &'a BindingHash,
    num_imports: usize,
    func_types: &'a BindingHash,
    num_func_types: usize,
    globals: &'a TypeBindings,
}

pub(crate) fn resolve_module(module: &mut Module) -> Result<()> {
    // Merged local views must be in place before bodies resolve.
    for field in module.fields.iter_mut() {
        if let ModuleFieldKind::Func(func) = &mut field.kind {
            func.link_params_and_locals();
        }
    }

    let scopes = Scopes {
        funcs: &module.func_bindings,
        num_funcs: module.funcs.len(),
        imports: &module.import_bindings,
        num_imports: module.imports.len(),
        func_types: &module.func_type_bindings,
        num_func_types: module.func_types.len(),
        globals: &module.globals,
    };

    for field in module.fields.iter_mut() {
        match &mut field.kind {
            ModuleFieldKind::Func(func) => resolve_func(func, &scopes)?,
            ModuleFieldKind::Import(import) => {
                if let ImportSig::TypeUse(type_var) = &mut import.sig {
                    type_var.resolve_in_place(scopes.func_types, scopes.num_func_types)?;
                }
            }
            ModuleFieldKind::Export(export) => {
                export.var.resolve_in_place(scopes.funcs, scopes.num_funcs)?;
            }
            ModuleFieldKind::Table(entries) => {
                for var in entries.iter_mut() {
                    var.resolve_in_place(scopes.funcs, scopes.num_funcs)?;
                }
            }
            ModuleFieldKind::Start(var) => {
                var.resolve_in_place(scopes.funcs, scopes.num_funcs)?;
            }
            ModuleFieldKind::FuncType(_)
            | ModuleFieldKind::Memory(_)
            | ModuleFieldKind::Global(_) => {}
        }
    }
    Ok(())
}

fn resolve_func(func: &mut Func, scopes: &Scopes) -> Result<()> {
    if let Some(type_var) = &mut func.type_var {
        type_var.resolve_in_place(scopes.func_types, scopes.num_func_types)?;
    }

    let mut resolver = ExprResolver {
        scopes,
        locals: &func.params_and_locals,
        labels: Vec::new(),
    };
    resolver.resolve_exprs(&mut func.body)
}

/// Per-function expression walker carrying the lexical label stack.
struct ExprResolver<'a> {
    scopes: &'a Scopes<'a>,
    locals: &'a TypeBindings,
    labels: Vec<Option<String>>,
}

impl ExprResolver<'_> {
    fn resolve_exprs(&mut self, exprs: &mut [Expr]) -> Result<()> {
        for expr in exprs {
            self.resolve_expr(expr)?;
        }
        Ok(())
    }

    fn resolve_expr(&mut self, expr: &mut Expr) -> Result<()> {
        match &mut expr.kind {
            ExprKind::Binary { left, right, .. } | ExprKind::Compare { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }
            ExprKind::Block { label, exprs } => {
                self.labels.push(label.clone());
                let result = self.resolve_exprs(exprs);
                self.labels.pop();
                result
            }
            ExprKind::Loop {
                outer,
                inner,
                exprs,
            } => {
                self.labels.push(outer.clone());
                self.labels.push(inner.clone());
                let result = self.resolve_exprs(exprs);
                self.labels.pop();
                self.labels.pop();
                result
            }
            ExprKind::Br { target, expr } => {
                self.resolve_label(target)?;
                self.resolve_opt(expr)
            }
            ExprKind::BrIf { target, cond, expr } => {
                self.resolve_label(target)?;
                self.resolve_expr(cond)?;
                self.resolve_opt(expr)
            }
            ExprKind::Call { target, args } => {
                target.resolve_in_place(self.scopes.funcs, self.scopes.num_funcs)?;
                self.resolve_exprs(args)
            }
            ExprKind::CallImport { target, args } => {
                target.resolve_in_place(self.scopes.imports, self.scopes.num_imports)?;
                self.resolve_exprs(args)
            }
            ExprKind::CallIndirect {
                type_var,
                index,
                args,
            } => {
                type_var.resolve_in_place(self.scopes.func_types, self.scopes.num_func_types)?;
                self.resolve_expr(index)?;
                self.resolve_exprs(args)
            }
            ExprKind::GetLocal { var } => {
                var.resolve_in_place(&self.locals.bindings, self.locals.len())?;
                Ok(())
            }
            ExprKind::SetLocal { var, expr } => {
                var.resolve_in_place(&self.locals.bindings, self.locals.len())?;
                self.resolve_expr(expr)
            }
            ExprKind::LoadGlobal { var } => {
                var.resolve_in_place(&self.scopes.globals.bindings, self.scopes.globals.len())?;
                Ok(())
            }
            ExprKind::StoreGlobal { var, expr } => {
                var.resolve_in_place(&self.scopes.globals.bindings, self.scopes.globals.len())?;
                self.resolve_expr(expr)
            }
            ExprKind::If { cond, then } => {
                self.resolve_expr(cond)?;
                self.resolve_expr(then)
            }
            ExprKind::IfElse { cond, then, else_ } => {
                self.resolve_expr(cond)?;
                self.resolve_expr(then)?;
                self.resolve_expr(else_)
            }
            ExprKind::Select {
                cond,
                if_true,
                if_false,
                ..
            } => {
                self.resolve_expr(cond)?;
                self.resolve_expr(if_true)?;
                self.resolve_expr(if_false)
            }
            ExprKind::Load { addr, .. } => self.resolve_expr(addr),
            ExprKind::Store { addr, value, .. } => {
                self.resolve_expr(addr)?;
                self.resolve_expr(value)
            }
            ExprKind::Convert { expr, .. }
            | ExprKind::GrowMemory { expr }
            | ExprKind::Unary { expr, .. } => self.resolve_expr(expr),
            ExprKind::Return { expr } => self.resolve_opt(expr),
            ExprKind::TableSwitch(ts) => {
                self.labels.push(ts.label.clone());
                let result = self.resolve_tableswitch(ts);
                self.labels.pop();
                result
            }
            ExprKind::Const(_)
            | ExprKind::HasFeature { .. }
            | ExprKind::MemorySize
            | ExprKind::Nop
            | ExprKind::Unreachable => Ok(()),
        }
    }

    fn resolve_opt(&mut self, expr: &mut Option<Box<Expr>>) -> Result<()> {
        match expr {
            Some(expr) => self.resolve_expr(expr),
            None => Ok(()),
        }
    }

    /// The switch label is already on the stack when this runs.
    fn resolve_tableswitch(&mut self, ts: &mut TableSwitch) -> Result<()> {
        self.resolve_expr(&mut ts.key)?;

        let num_cases = ts.cases.len();
        for target in ts
            .targets
            .iter_mut()
            .chain(std::iter::once(&mut ts.default_target))
        {
            match target {
                Target::Case(var) => {
                    var.resolve_in_place(&ts.case_bindings, num_cases)?;
                }
                Target::Br(var) => {
                    self.resolve_label(var)?;
                }
            }
        }

        for case in ts.cases.iter_mut() {
            self.resolve_exprs(&mut case.exprs)?;
        }
        Ok(())
    }

    /// Resolve a branch target against the label stack. Names become the
    /// relative depth of the innermost matching label (0 = innermost);
    /// numeric depths are bounds-checked.
    fn resolve_label(&self, var: &mut Var) -> Result<usize> {
        match &var.kind {
            VarKind::Index(depth) => {
                if *depth < self.labels.len() {
                    Ok(*depth)
                } else {
                    Err(WatError::OutOfRange {
                        index: *depth,
                        size: self.labels.len(),
                        loc: var.loc,
                    })
                }
            }
            VarKind::Name(name) => {
                let depth = self
                    .labels
                    .iter()
                    .rev()
                    .position(|label| label.as_deref() == Some(name.as_str()))
                    .ok_or_else(|| WatError::UnboundName {
                        name: name.clone(),
                        loc: var.loc,
                    })?;
                var.kind = VarKind::Index(depth);
                Ok(depth)
            }
        }
    }
}
