//! Conformance-script commands.
//!
//! A [`Script`] is the parsed form of a conformance test file: a sequence of
//! module definitions, invocations, and assertions about their results.
//! The external driver walks the commands; this layer only carries them.

use watc_types::{Result, Span};

use crate::expr::Const;
use crate::module::Module;

/// `(invoke "name" args...)` — call an exported function with constant
/// arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoke {
    pub loc: Span,
    /// Export name of the function to call.
    pub name: String,
    pub args: Vec<Const>,
}

/// One script directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Define the current module.
    Module(Module),
    /// Invoke an export of the current module.
    Invoke(Invoke),
    /// `(assert_return (invoke ...) expected)`
    AssertReturn { invoke: Invoke, expected: Const },
    /// `(assert_return_nan (invoke ...))`
    AssertReturnNan { invoke: Invoke },
    /// `(assert_trap (invoke ...) "message")`
    AssertTrap { invoke: Invoke, text: String },
    /// `(assert_invalid (module ...) "message")`
    AssertInvalid { module: Module, text: String },
}

/// An ordered command sequence. Built and torn down as a unit by the
/// driver; dropping the script drops every embedded module and tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub commands: Vec<Command>,
}

impl Script {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Resolve every defined module in place.
    ///
    /// Modules under `assert_invalid` are left unresolved: their invalidity
    /// (often an unresolvable name) is exactly what the driver asserts.
    pub fn resolve(&mut self) -> Result<()> {
        for command in &mut self.commands {
            if let Command::Module(module) = command {
                module.resolve()?;
            }
        }
        Ok(())
    }

    /// The defined modules, in script order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.commands.iter().filter_map(|c| match c {
            Command::Module(module) => Some(module),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ConstValue;
    use crate::module::Module;

    fn sp() -> Span {
        Span::point(1, 1)
    }

    #[test]
    fn test_script_modules_accessor() {
        let script = Script::new(vec![
            Command::Module(Module::build(sp(), Vec::new()).unwrap()),
            Command::Invoke(Invoke {
                loc: sp(),
                name: "main".into(),
                args: vec![Const::new(sp(), ConstValue::I32(1))],
            }),
            Command::Module(Module::build(sp(), Vec::new()).unwrap()),
        ]);
        assert_eq!(script.modules().count(), 2);
    }

    #[test]
    fn test_resolve_skips_assert_invalid() {
        use crate::module::{Export, ModuleField, ModuleFieldKind};
        use crate::var::Var;

        // An export pointing at a function that does not exist: invalid on
        // purpose, and Script::resolve must not reject the script for it.
        let bad = Module::build(
            sp(),
            vec![ModuleField {
                loc: sp(),
                kind: ModuleFieldKind::Export(Export {
                    name: "f".into(),
                    var: Var::name(sp(), "$missing"),
                }),
            }],
        )
        .unwrap();

        let mut script = Script::new(vec![Command::AssertInvalid {
            module: bad,
            text: "unknown function".into(),
        }]);
        assert!(script.resolve().is_ok());
    }
}
