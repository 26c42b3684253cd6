//! Modules: the authoritative field list plus derived caches.
//!
//! A [`Module`] owns its fields in declaration order. [`Module::build`]
//! derives the cached views in one pass: flattened func/import/export/type
//! lists (as field indices, so they cannot dangle), the merged global space,
//! the singleton table/memory/start fields, and one binding namespace per
//! named category. After [`Module::resolve`] the module is frozen and every
//! query here is read-only.

use watc_types::{FieldKind, Result, Span, WatError};

use crate::binding::{BindingHash, TypeBindings};
use crate::func::{Func, FuncSignature, FuncType};
use crate::var::Var;

// ══════════════════════════════════════════════════════════════════════════════
// Fields
// ══════════════════════════════════════════════════════════════════════════════

/// How an import declares its signature.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSig {
    /// `(import ... (type $t))` — reference into the func-type space.
    TypeUse(Var),
    /// Inline result/param types.
    Inline(FuncSignature),
}

/// `(import $name "module" "func" ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub loc: Span,
    pub name: Option<String>,
    pub module_name: String,
    pub func_name: String,
    pub sig: ImportSig,
}

/// `(export "name" $func)`
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: String,
    pub var: Var,
}

/// A contiguous initialized byte range placed at a memory address.
/// Overlap between segments is the validator's concern, not checked here.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub loc: Span,
    pub addr: u32,
    pub data: Vec<u8>,
}

/// `(memory initial max segments...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Memory {
    pub loc: Span,
    pub initial_pages: u32,
    pub max_pages: u32,
    pub segments: Vec<Segment>,
}

/// One top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleField {
    pub loc: Span,
    pub kind: ModuleFieldKind,
}

/// The kind of a top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleFieldKind {
    Func(Func),
    Import(Import),
    Export(Export),
    /// Function table: ordered func references.
    Table(Vec<Var>),
    FuncType(FuncType),
    Memory(Memory),
    /// One global field may declare several globals.
    Global(TypeBindings),
    Start(Var),
}

// ══════════════════════════════════════════════════════════════════════════════
// Module
// ══════════════════════════════════════════════════════════════════════════════

/// A module: owned fields plus derived caches.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub loc: Span,
    pub(crate) fields: Vec<ModuleField>,

    // Cached views: indices into `fields`, one vec per field kind, in
    // declaration order.
    pub(crate) funcs: Vec<usize>,
    pub(crate) imports: Vec<usize>,
    pub(crate) exports: Vec<usize>,
    pub(crate) func_types: Vec<usize>,
    pub(crate) globals: TypeBindings,
    pub(crate) table: Option<usize>,
    pub(crate) memory: Option<usize>,
    pub(crate) start: Option<usize>,

    pub(crate) func_bindings: BindingHash,
    pub(crate) import_bindings: BindingHash,
    pub(crate) export_bindings: BindingHash,
    pub(crate) func_type_bindings: BindingHash,
}

impl Module {
    /// Build a module from its fields, deriving every cache in one pass.
    ///
    /// Fails with [`WatError::DuplicateField`] on a second table, memory or
    /// start field, and [`WatError::DuplicateExport`] on an export name
    /// collision.
    pub fn build(loc: Span, fields: Vec<ModuleField>) -> Result<Module> {
        let mut module = Module {
            loc,
            fields: Vec::with_capacity(fields.len()),
            funcs: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            func_types: Vec::new(),
            globals: TypeBindings::new(),
            table: None,
            memory: None,
            start: None,
            func_bindings: BindingHash::new(),
            import_bindings: BindingHash::new(),
            export_bindings: BindingHash::new(),
            func_type_bindings: BindingHash::new(),
        };
        for field in fields {
            module.append_field(field)?;
        }
        Ok(module)
    }

    fn append_field(&mut self, field: ModuleField) -> Result<()> {
        let field_index = self.fields.len();
        match &field.kind {
            ModuleFieldKind::Func(func) => {
                if let Some(name) = &func.name {
                    self.func_bindings
                        .insert_with_index(name, func.loc, self.funcs.len());
                }
                self.funcs.push(field_index);
            }
            ModuleFieldKind::Import(import) => {
                if let Some(name) = &import.name {
                    self.import_bindings
                        .insert_with_index(name, import.loc, self.imports.len());
                }
                self.imports.push(field_index);
            }
            ModuleFieldKind::Export(export) => {
                if self.export_bindings.lookup(&export.name).is_some() {
                    return Err(WatError::DuplicateExport {
                        name: export.name.clone(),
                        loc: field.loc,
                    });
                }
                self.export_bindings
                    .insert_with_index(&export.name, field.loc, self.exports.len());
                self.exports.push(field_index);
            }
            ModuleFieldKind::FuncType(func_type) => {
                if let Some(name) = &func_type.name {
                    self.func_type_bindings
                        .insert_with_index(name, field.loc, self.func_types.len());
                }
                self.func_types.push(field_index);
            }
            ModuleFieldKind::Global(globals) => {
                // Module-wide global indices run across all global fields in
                // declaration order.
                self.globals.extend(globals);
            }
            ModuleFieldKind::Table(_) => {
                if self.table.is_some() {
                    return Err(WatError::DuplicateField {
                        kind: FieldKind::Table,
                        loc: field.loc,
                    });
                }
                self.table = Some(field_index);
            }
            ModuleFieldKind::Memory(_) => {
                if self.memory.is_some() {
                    return Err(WatError::DuplicateField {
                        kind: FieldKind::Memory,
                        loc: field.loc,
                    });
                }
                self.memory = Some(field_index);
            }
            ModuleFieldKind::Start(_) => {
                if self.start.is_some() {
                    return Err(WatError::DuplicateField {
                        kind: FieldKind::Start,
                        loc: field.loc,
                    });
                }
                self.start = Some(field_index);
            }
        }
        self.fields.push(field);
        Ok(())
    }

    /// Run the one-shot Name→Index resolution pass over every var in the
    /// module. The module is frozen afterwards.
    pub fn resolve(&mut self) -> Result<()> {
        crate::resolve::resolve_module(self)
    }

    // ── Cached views ──────────────────────────────────────────────────────

    /// The authoritative field list, in declaration order.
    pub fn fields(&self) -> &[ModuleField] {
        &self.fields
    }

    pub fn func_count(&self) -> usize {
        self.funcs.len()
    }

    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    pub fn export_count(&self) -> usize {
        self.exports.len()
    }

    pub fn func_type_count(&self) -> usize {
        self.func_types.len()
    }

    pub fn func(&self, index: usize) -> Option<&Func> {
        match &self.fields.get(*self.funcs.get(index)?)?.kind {
            ModuleFieldKind::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn import(&self, index: usize) -> Option<&Import> {
        match &self.fields.get(*self.imports.get(index)?)?.kind {
            ModuleFieldKind::Import(import) => Some(import),
            _ => None,
        }
    }

    pub fn export(&self, index: usize) -> Option<&Export> {
        match &self.fields.get(*self.exports.get(index)?)?.kind {
            ModuleFieldKind::Export(export) => Some(export),
            _ => None,
        }
    }

    pub fn func_type(&self, index: usize) -> Option<&FuncType> {
        match &self.fields.get(*self.func_types.get(index)?)?.kind {
            ModuleFieldKind::FuncType(func_type) => Some(func_type),
            _ => None,
        }
    }

    /// Defined functions in declaration order.
    pub fn funcs(&self) -> impl Iterator<Item = &Func> {
        (0..self.funcs.len()).filter_map(|i| self.func(i))
    }

    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        (0..self.imports.len()).filter_map(|i| self.import(i))
    }

    pub fn exports(&self) -> impl Iterator<Item = &Export> {
        (0..self.exports.len()).filter_map(|i| self.export(i))
    }

    pub fn func_types(&self) -> impl Iterator<Item = &FuncType> {
        (0..self.func_types.len()).filter_map(|i| self.func_type(i))
    }

    /// The module-wide merged global space.
    pub fn globals(&self) -> &TypeBindings {
        &self.globals
    }

    pub fn table(&self) -> Option<&[Var]> {
        match &self.fields.get(self.table?)?.kind {
            ModuleFieldKind::Table(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn memory(&self) -> Option<&Memory> {
        match &self.fields.get(self.memory?)?.kind {
            ModuleFieldKind::Memory(memory) => Some(memory),
            _ => None,
        }
    }

    pub fn start(&self) -> Option<&Var> {
        match &self.fields.get(self.start?)?.kind {
            ModuleFieldKind::Start(var) => Some(var),
            _ => None,
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────
    //
    // Read-only; safe for concurrent readers once the module is frozen.

    /// Resolve a var in the defined-function index space.
    pub fn func_index_by_var(&self, var: &Var) -> Result<usize> {
        var.resolve(&self.func_bindings, self.funcs.len())
    }

    /// Resolve a var in the import index space. Imports and defined
    /// functions are separate spaces: `call` targets funcs, `call_import`
    /// targets imports.
    pub fn import_index_by_var(&self, var: &Var) -> Result<usize> {
        var.resolve(&self.import_bindings, self.imports.len())
    }

    /// Resolve a var in the func-type index space.
    pub fn func_type_index_by_var(&self, var: &Var) -> Result<usize> {
        var.resolve(&self.func_type_bindings, self.func_types.len())
    }

    /// Resolve a var in the merged global index space.
    pub fn global_index_by_var(&self, var: &Var) -> Result<usize> {
        var.resolve(&self.globals.bindings, self.globals.len())
    }

    pub fn func_by_var(&self, var: &Var) -> Result<&Func> {
        let index = self.func_index_by_var(var)?;
        self.func(index).ok_or(WatError::OutOfRange {
            index,
            size: self.funcs.len(),
            loc: var.loc,
        })
    }

    pub fn import_by_var(&self, var: &Var) -> Result<&Import> {
        let index = self.import_index_by_var(var)?;
        self.import(index).ok_or(WatError::OutOfRange {
            index,
            size: self.imports.len(),
            loc: var.loc,
        })
    }

    pub fn func_type_by_var(&self, var: &Var) -> Result<&FuncType> {
        let index = self.func_type_index_by_var(var)?;
        self.func_type(index).ok_or(WatError::OutOfRange {
            index,
            size: self.func_types.len(),
            loc: var.loc,
        })
    }

    /// The export with this literal name, if any.
    pub fn export_by_name(&self, name: &str) -> Option<&Export> {
        let binding = self.export_bindings.lookup(name)?;
        self.export(binding.index)
    }

    /// True iff some export's resolved target is `func_index`.
    pub fn func_is_exported(&self, func_index: usize) -> bool {
        self.exports()
            .any(|e| e.var.resolve(&self.func_bindings, self.funcs.len()) == Ok(func_index))
    }
}
