//! Resolution-pass tests: locals, calls, globals, branch labels and
//! tableswitch targets, all going from name-mode to index-mode in one pass.

use watc_ast::*;
use watc_types::{Span, ValueType, WatError};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn sp() -> Span {
    Span::point(1, 1)
}

fn expr(kind: ExprKind) -> Expr {
    Expr::new(sp(), kind)
}

fn i32c(v: u32) -> Expr {
    expr(ExprKind::Const(Const::new(sp(), ConstValue::I32(v))))
}

fn get_local(name: &str) -> Expr {
    expr(ExprKind::GetLocal {
        var: Var::name(sp(), name),
    })
}

fn br(name: &str) -> Expr {
    expr(ExprKind::Br {
        target: Var::name(sp(), name),
        expr: None,
    })
}

fn block(label: &str, exprs: Vec<Expr>) -> Expr {
    expr(ExprKind::Block {
        label: Some(label.into()),
        exprs,
    })
}

fn field(kind: ModuleFieldKind) -> ModuleField {
    ModuleField { loc: sp(), kind }
}

/// Wrap a body in a single-func module, resolve, and hand the func back.
fn resolve_func(func: Func) -> Func {
    let mut module = Module::build(sp(), vec![field(ModuleFieldKind::Func(func))]).unwrap();
    module.resolve().unwrap();
    module.func(0).unwrap().clone()
}

fn func_with_body(body: Vec<Expr>) -> Func {
    let mut func = Func::new(sp());
    func.body = body;
    func
}

/// The resolved index of a var that must be in index mode by now.
fn index_of(var: &Var) -> usize {
    match &var.kind {
        VarKind::Index(index) => *index,
        VarKind::Name(name) => panic!("var `{name}` still unresolved"),
    }
}

fn br_depth(e: &Expr) -> usize {
    match &e.kind {
        ExprKind::Br { target, .. } => index_of(target),
        other => panic!("expected br, got {}", other.name()),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Locals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_local_resolution_with_shadowing() {
    let mut func = Func::new(sp());
    func.params.push(Some("$a"), ValueType::I32, sp());
    func.params.push(Some("$b"), ValueType::I32, sp());
    func.locals.push(Some("$a"), ValueType::F32, sp());
    func.body = vec![
        get_local("$a"),
        get_local("$b"),
        expr(ExprKind::SetLocal {
            var: Var::name(sp(), "$b"),
            expr: Box::new(i32c(7)),
        }),
    ];

    let func = resolve_func(func);
    match (&func.body[0].kind, &func.body[1].kind, &func.body[2].kind) {
        (
            ExprKind::GetLocal { var: a },
            ExprKind::GetLocal { var: b },
            ExprKind::SetLocal { var: set_b, .. },
        ) => {
            assert_eq!(index_of(a), 2); // the local shadows param $a
            assert_eq!(index_of(b), 1);
            assert_eq!(index_of(set_b), 1);
        }
        _ => panic!("unexpected body shape"),
    }
}

#[test]
fn test_local_out_of_range_index() {
    let mut func = Func::new(sp());
    func.params.push(Some("$a"), ValueType::I32, sp());
    func.body = vec![expr(ExprKind::GetLocal {
        var: Var::index(sp(), 1),
    })];

    let mut module = Module::build(sp(), vec![field(ModuleFieldKind::Func(func))]).unwrap();
    assert_eq!(
        module.resolve(),
        Err(WatError::OutOfRange {
            index: 1,
            size: 1,
            loc: sp()
        })
    );
}

// ─────────────────────────────────────────────────────────────────────
// Calls
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_call_and_call_import_resolution() {
    let mut callee = Func::new(sp());
    callee.name = Some("$callee".into());

    let mut caller = Func::new(sp());
    caller.name = Some("$caller".into());
    caller.body = vec![
        expr(ExprKind::Call {
            target: Var::name(sp(), "$callee"),
            args: vec![i32c(1)],
        }),
        expr(ExprKind::CallImport {
            target: Var::name(sp(), "$print"),
            args: vec![i32c(2)],
        }),
    ];

    let mut module = Module::build(
        sp(),
        vec![
            field(ModuleFieldKind::Import(Import {
                loc: sp(),
                name: Some("$print".into()),
                module_name: "env".into(),
                func_name: "print".into(),
                sig: ImportSig::Inline(FuncSignature::new(
                    ValueType::Void,
                    vec![ValueType::I32],
                )),
            })),
            field(ModuleFieldKind::Func(callee)),
            field(ModuleFieldKind::Func(caller)),
        ],
    )
    .unwrap();
    module.resolve().unwrap();

    let caller = module.func(1).unwrap();
    match (&caller.body[0].kind, &caller.body[1].kind) {
        (
            ExprKind::Call { target, .. },
            ExprKind::CallImport {
                target: import_target,
                ..
            },
        ) => {
            assert_eq!(index_of(target), 0); // $callee in the func space
            assert_eq!(index_of(import_target), 0); // $print in the import space
        }
        _ => panic!("unexpected body shape"),
    }
}

#[test]
fn test_call_indirect_type_resolution() {
    let mut func = Func::new(sp());
    func.body = vec![expr(ExprKind::CallIndirect {
        type_var: Var::name(sp(), "$sig"),
        index: Box::new(i32c(0)),
        args: Vec::new(),
    })];

    let mut module = Module::build(
        sp(),
        vec![
            field(ModuleFieldKind::FuncType(FuncType {
                name: Some("$sig".into()),
                sig: FuncSignature::default(),
            })),
            field(ModuleFieldKind::Func(func)),
        ],
    )
    .unwrap();
    module.resolve().unwrap();

    match &module.func(0).unwrap().body[0].kind {
        ExprKind::CallIndirect { type_var, .. } => assert_eq!(index_of(type_var), 0),
        other => panic!("expected call_indirect, got {}", other.name()),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Globals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_global_resolution() {
    let mut globals = TypeBindings::new();
    globals.push(Some("$g"), ValueType::I32, sp());
    globals.push(Some("$h"), ValueType::F64, sp());

    let mut func = Func::new(sp());
    func.body = vec![
        expr(ExprKind::LoadGlobal {
            var: Var::name(sp(), "$h"),
        }),
        expr(ExprKind::StoreGlobal {
            var: Var::name(sp(), "$g"),
            expr: Box::new(i32c(3)),
        }),
    ];

    let mut module = Module::build(
        sp(),
        vec![
            field(ModuleFieldKind::Global(globals)),
            field(ModuleFieldKind::Func(func)),
        ],
    )
    .unwrap();
    module.resolve().unwrap();

    let func = module.func(0).unwrap();
    match (&func.body[0].kind, &func.body[1].kind) {
        (ExprKind::LoadGlobal { var: h }, ExprKind::StoreGlobal { var: g, .. }) => {
            assert_eq!(index_of(h), 1);
            assert_eq!(index_of(g), 0);
        }
        _ => panic!("unexpected body shape"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Branch labels
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_label_depths_in_nested_blocks() {
    let body = vec![block(
        "$outer",
        vec![block("$inner", vec![br("$outer"), br("$inner")])],
    )];
    let func = resolve_func(func_with_body(body));

    let (outer_br, inner_br) = match &func.body[0].kind {
        ExprKind::Block { exprs, .. } => match &exprs[0].kind {
            ExprKind::Block { exprs, .. } => (&exprs[0], &exprs[1]),
            _ => panic!("expected inner block"),
        },
        _ => panic!("expected outer block"),
    };
    assert_eq!(br_depth(outer_br), 1);
    assert_eq!(br_depth(inner_br), 0);
}

#[test]
fn test_label_shadowing_picks_innermost() {
    let body = vec![block("$l", vec![block("$l", vec![br("$l")])])];
    let func = resolve_func(func_with_body(body));

    match &func.body[0].kind {
        ExprKind::Block { exprs, .. } => match &exprs[0].kind {
            ExprKind::Block { exprs, .. } => assert_eq!(br_depth(&exprs[0]), 0),
            _ => panic!("expected inner block"),
        },
        _ => panic!("expected outer block"),
    }
}

#[test]
fn test_loop_dual_labels() {
    let body = vec![expr(ExprKind::Loop {
        outer: Some("$exit".into()),
        inner: Some("$cont".into()),
        exprs: vec![br("$cont"), br("$exit")],
    })];
    let func = resolve_func(func_with_body(body));

    match &func.body[0].kind {
        ExprKind::Loop { exprs, .. } => {
            assert_eq!(br_depth(&exprs[0]), 0); // inner label is innermost
            assert_eq!(br_depth(&exprs[1]), 1);
        }
        _ => panic!("expected loop"),
    }
}

#[test]
fn test_numeric_label_depth_checked() {
    let body = vec![block("$l", vec![expr(ExprKind::Br {
        target: Var::index(sp(), 2),
        expr: None,
    })])];
    let mut module =
        Module::build(sp(), vec![field(ModuleFieldKind::Func(func_with_body(body)))]).unwrap();
    assert_eq!(
        module.resolve(),
        Err(WatError::OutOfRange {
            index: 2,
            size: 1,
            loc: sp()
        })
    );
}

#[test]
fn test_unbound_label_name() {
    let body = vec![block("$l", vec![br("$nope")])];
    let mut module =
        Module::build(sp(), vec![field(ModuleFieldKind::Func(func_with_body(body)))]).unwrap();
    assert_eq!(
        module.resolve(),
        Err(WatError::UnboundName {
            name: "$nope".into(),
            loc: sp()
        })
    );
}

// ─────────────────────────────────────────────────────────────────────
// Tableswitch
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_tableswitch_targets() {
    let mut ts = TableSwitch {
        label: Some("$sw".into()),
        key: Box::new(i32c(1)),
        targets: vec![
            Target::Case(Var::name(sp(), "$one")),
            Target::Case(Var::index(sp(), 0)),
            Target::Br(Var::name(sp(), "$sw")),
        ],
        default_target: Target::Case(Var::name(sp(), "$zero")),
        case_bindings: BindingHash::new(),
        cases: Vec::new(),
    };
    ts.push_case(Case {
        loc: sp(),
        label: Some("$zero".into()),
        exprs: vec![i32c(0)],
    });
    ts.push_case(Case {
        loc: sp(),
        label: Some("$one".into()),
        exprs: vec![br("$sw")],
    });

    let body = vec![expr(ExprKind::TableSwitch(Box::new(ts)))];
    let func = resolve_func(func_with_body(body));

    let ts = match &func.body[0].kind {
        ExprKind::TableSwitch(ts) => ts,
        other => panic!("expected tableswitch, got {}", other.name()),
    };
    assert_eq!(index_of(ts.targets[0].var()), 1); // case $one
    assert_eq!(index_of(ts.targets[1].var()), 0); // numeric case, unchanged
    assert_eq!(index_of(ts.targets[2].var()), 0); // br to the switch label
    assert_eq!(index_of(ts.default_target.var()), 0); // case $zero
    assert_eq!(br_depth(&ts.cases[1].exprs[0]), 0); // br inside a case body
}

#[test]
fn test_tableswitch_unknown_case_label() {
    let ts = TableSwitch {
        label: None,
        key: Box::new(i32c(0)),
        targets: vec![Target::Case(Var::name(sp(), "$missing"))],
        default_target: Target::Case(Var::index(sp(), 0)),
        case_bindings: BindingHash::new(),
        cases: vec![Case {
            loc: sp(),
            label: None,
            exprs: Vec::new(),
        }],
    };
    let body = vec![expr(ExprKind::TableSwitch(Box::new(ts)))];
    let mut module =
        Module::build(sp(), vec![field(ModuleFieldKind::Func(func_with_body(body)))]).unwrap();
    assert_eq!(
        module.resolve(),
        Err(WatError::UnboundName {
            name: "$missing".into(),
            loc: sp()
        })
    );
}

// ─────────────────────────────────────────────────────────────────────
// Ownership / teardown
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_loop_teardown_after_resolution() {
    // A loop owning three children, one of which branches to the outer
    // label by name. Resolution mutates the tree in place; dropping the
    // module afterwards releases every node through ownership alone.
    let body = vec![expr(ExprKind::Loop {
        outer: Some("$exit".into()),
        inner: Some("$cont".into()),
        exprs: vec![i32c(1), br("$exit"), i32c(2)],
    })];
    let func = resolve_func(func_with_body(body));

    match &func.body[0].kind {
        ExprKind::Loop { exprs, .. } => {
            assert_eq!(exprs.len(), 3);
            assert_eq!(br_depth(&exprs[1]), 1);
        }
        _ => panic!("expected loop"),
    }
    drop(func);
}
