//! Dual-mode cross-references.
//!
//! A [`Var`] is how one AST node points at another: by numeric index into an
//! index space, or by symbolic name to be looked up in that space's
//! [`BindingHash`]. The parser emits whichever form the source used; the
//! resolution pass flips `Name` to `Index` exactly once.

use watc_types::{Result, Span, WatError};

use crate::binding::BindingHash;

/// Index-mode or name-mode payload of a [`Var`].
#[derive(Debug, Clone, PartialEq)]
pub enum VarKind {
    Index(usize),
    Name(String),
}

/// A cross-reference to a function, local, global, type, label or export
/// target.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub loc: Span,
    pub kind: VarKind,
}

impl Var {
    pub fn index(loc: Span, index: usize) -> Self {
        Self {
            loc,
            kind: VarKind::Index(index),
        }
    }

    pub fn name(loc: Span, name: impl Into<String>) -> Self {
        Self {
            loc,
            kind: VarKind::Name(name.into()),
        }
    }

    /// True once the var carries a numeric index.
    pub fn is_resolved(&self) -> bool {
        matches!(self.kind, VarKind::Index(_))
    }

    /// Resolve against a scope. Pure query; the var is unchanged.
    ///
    /// Index mode is bounds-checked against `space_size` and returned as-is,
    /// so resolving twice is a no-op. Name mode returns the most recent
    /// binding for the name (shadow semantics).
    pub fn resolve(&self, bindings: &BindingHash, space_size: usize) -> Result<usize> {
        match &self.kind {
            VarKind::Index(index) => {
                if *index < space_size {
                    Ok(*index)
                } else {
                    Err(WatError::OutOfRange {
                        index: *index,
                        size: space_size,
                        loc: self.loc,
                    })
                }
            }
            VarKind::Name(name) => match bindings.lookup(name) {
                Some(binding) => Ok(binding.index),
                None => Err(WatError::UnboundName {
                    name: name.clone(),
                    loc: self.loc,
                }),
            },
        }
    }

    /// Resolve and cache the result back into the var, flipping
    /// `Name` → `Index`. The resolution pass uses this.
    pub fn resolve_in_place(&mut self, bindings: &BindingHash, space_size: usize) -> Result<usize> {
        let index = self.resolve(bindings, space_size)?;
        self.kind = VarKind::Index(index);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp() -> Span {
        Span::point(1, 1)
    }

    #[test]
    fn test_index_resolve_is_noop() {
        let scope = BindingHash::new();
        let v = Var::index(sp(), 2);
        assert_eq!(v.resolve(&scope, 5).unwrap(), 2);
        assert_eq!(v.resolve(&scope, 5).unwrap(), 2);
        assert_eq!(v.kind, VarKind::Index(2));
    }

    #[test]
    fn test_index_out_of_range() {
        let scope = BindingHash::new();
        let v = Var::index(sp(), 5);
        assert_eq!(
            v.resolve(&scope, 5),
            Err(WatError::OutOfRange {
                index: 5,
                size: 5,
                loc: sp()
            })
        );
    }

    #[test]
    fn test_name_resolution_and_caching() {
        let mut scope = BindingHash::new();
        scope.insert("$f", sp());
        scope.insert("$g", sp());

        let mut v = Var::name(sp(), "$g");
        assert!(!v.is_resolved());
        assert_eq!(v.resolve_in_place(&scope, 2).unwrap(), 1);
        assert!(v.is_resolved());
        assert_eq!(v.kind, VarKind::Index(1));
    }

    #[test]
    fn test_unbound_name() {
        let scope = BindingHash::new();
        let v = Var::name(sp(), "$missing");
        assert_eq!(
            v.resolve(&scope, 0),
            Err(WatError::UnboundName {
                name: "$missing".into(),
                loc: sp()
            })
        );
    }

    #[test]
    fn test_name_resolves_to_most_recent() {
        let mut scope = BindingHash::new();
        scope.insert("$x", sp());
        scope.insert("$x", sp());
        let v = Var::name(sp(), "$x");
        assert_eq!(v.resolve(&scope, 2).unwrap(), 1);
    }
}
