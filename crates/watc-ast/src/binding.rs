//! Name→index binding tables.
//!
//! [`BindingHash`] backs every named scope in the tree: function params and
//! locals, globals, funcs, imports, exports, func types, and tableswitch
//! case labels. Slot indices are append-only or free-list-reused, never
//! renumbered — positions handed out stay valid for the life of the table.
//!
//! Mutate-then-freeze discipline: tables are built single-threaded during
//! parsing and the resolution pass, then only read.

use std::collections::HashMap;

use watc_types::{Span, ValueType};

/// One name bound to a position in an index space.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub loc: Span,
    pub name: String,
    /// The declared position in the index space this table describes.
    pub index: usize,
}

/// A name→index table with shadow semantics and free-slot reuse.
///
/// Storage is a growable slot vector plus an explicit free-slot stack;
/// per-name chains keep recency order so the most recent declaration of a
/// name shadows earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingHash {
    slots: Vec<Option<Binding>>,
    free: Vec<usize>,
    chains: HashMap<String, Vec<usize>>,
}

impl BindingHash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots ever allocated, including freed ones.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The binding occupying `slot`, if live.
    pub fn get(&self, slot: usize) -> Option<&Binding> {
        self.slots.get(slot)?.as_ref()
    }

    /// Insert a binding whose index is its own slot position.
    ///
    /// Reuses the most recently freed slot if any, else appends. The new
    /// binding becomes the most recent match for `name`.
    pub fn insert(&mut self, name: &str, loc: Span) -> usize {
        let slot = self.alloc_slot();
        self.place(slot, name, loc, slot);
        slot
    }

    /// Insert a binding with an explicitly supplied index payload.
    ///
    /// Used where name density differs from the index space: a module's
    /// func table indexes every func field, named or not, so a named func's
    /// binding records its declared position rather than its slot.
    pub fn insert_with_index(&mut self, name: &str, loc: Span, index: usize) -> usize {
        let slot = self.alloc_slot();
        self.place(slot, name, loc, index);
        slot
    }

    /// Look up the most recent binding for `name`.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        let slot = *self.chains.get(name)?.last()?;
        self.slots[slot].as_ref()
    }

    /// Unlink the most recent binding for `name` and recycle its slot.
    /// Returns the freed slot.
    pub fn remove(&mut self, name: &str) -> Option<usize> {
        let chain = self.chains.get_mut(name)?;
        let slot = chain.pop()?;
        if chain.is_empty() {
            self.chains.remove(name);
        }
        self.slots[slot] = None;
        self.free.push(slot);
        Some(slot)
    }

    /// Re-link every binding of `src` into `self` with indices offset by
    /// `base_offset`. Per-name recency order is preserved, and merged
    /// entries shadow existing ones of the same name.
    pub fn merge(&mut self, src: &BindingHash, base_offset: usize) {
        for chain in src.chains.values() {
            for &slot in chain {
                if let Some(b) = &src.slots[slot] {
                    self.insert_with_index(&b.name, b.loc, b.index + base_offset);
                }
            }
        }
    }

    /// Live bindings in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    fn alloc_slot(&mut self) -> usize {
        match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        }
    }

    fn place(&mut self, slot: usize, name: &str, loc: Span, index: usize) {
        self.slots[slot] = Some(Binding {
            loc,
            name: name.to_string(),
            index,
        });
        self.chains.entry(name.to_string()).or_default().push(slot);
    }
}

/// A typed index space: a value type per slot, plus bindings for the named
/// slots. Used for function params, locals, and module globals.
///
/// `types.len()` is the size of the index space; unnamed declarations occupy
/// an index without entering the hash.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeBindings {
    pub types: Vec<ValueType>,
    pub bindings: BindingHash,
}

impl TypeBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the index space.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Declare a slot, optionally named. Returns its index.
    pub fn push(&mut self, name: Option<&str>, ty: ValueType, loc: Span) -> usize {
        let index = self.types.len();
        self.types.push(ty);
        if let Some(name) = name {
            self.bindings.insert_with_index(name, loc, index);
        }
        index
    }

    /// The value type at `index`.
    pub fn get(&self, index: usize) -> Option<ValueType> {
        self.types.get(index).copied()
    }

    /// Most recent index bound to `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.bindings.lookup(name).map(|b| b.index)
    }

    /// Append all of `other`'s slots, offsetting its binding indices past
    /// this space. `other`'s names shadow same-named entries already here.
    pub fn extend(&mut self, other: &TypeBindings) {
        let base = self.types.len();
        self.types.extend(other.types.iter().copied());
        self.bindings.merge(&other.bindings, base);
    }
}
