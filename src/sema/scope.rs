// src/sema/scope.rs
//! Name binding for the generator.
//!
//! A scope is a flat name map, not a chain: creating a child copies the
//! parent's visible names. That costs a clone per scope but lets a
//! completed module scope be stored and consulted long after the walk
//! that built it, which is how cross-module imports resolve. Function
//! scopes drop inherited local-variable bindings at creation: functions
//! close over nothing, so an enclosing `let` is simply not visible
//! inside a nested function body.

use rustc_hash::FxHashMap;

use crate::frontend::ast::Symbol;
use crate::frontend::Interner;
use crate::ir::BlockRef;
use crate::sema::type_arena::{TypeArena, TypeId};

/// What a bound name stands for
#[derive(Debug, Clone, Copy)]
pub enum Bound {
    /// A usable type: builtin, alias, or an import of either
    Type(TypeId),
    /// Index into the program-wide function list
    Function(usize),
    /// Parameter slot `index` of the unit `owner`
    Parameter { owner: BlockRef, index: usize },
    /// Local variable slot `index` of the unit `owner`
    Local { owner: BlockRef, index: usize },
    /// Index into the project's module list
    Module(usize),
}

/// Why a bind attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// The name is a reserved builtin
    Reserved,
    /// The name is already bound in this same scope
    AlreadyBound,
}

/// The reserved builtin type names. Lookup consults these before any
/// user binding, and bind refuses them outright, so builtins cannot be
/// shadowed anywhere.
#[derive(Debug)]
pub struct Builtins {
    names: FxHashMap<Symbol, TypeId>,
}

impl Builtins {
    pub fn new(interner: &mut Interner, arena: &TypeArena) -> Self {
        let mut names = FxHashMap::default();
        names.insert(interner.intern("u8"), arena.u8());
        names.insert(interner.intern("u16"), arena.u16());
        names.insert(interner.intern("u32"), arena.u32());
        names.insert(interner.intern("u64"), arena.u64());
        names.insert(interner.intern("usz"), arena.usz());
        names.insert(interner.intern("s8"), arena.s8());
        names.insert(interner.intern("s16"), arena.s16());
        names.insert(interner.intern("s32"), arena.s32());
        names.insert(interner.intern("s64"), arena.s64());
        names.insert(interner.intern("ssz"), arena.ssz());
        names.insert(interner.intern("f32"), arena.f32());
        names.insert(interner.intern("f64"), arena.f64());
        names.insert(interner.intern("bool"), arena.bool());
        names.insert(interner.intern("none"), arena.none());
        names.insert(interner.intern("never"), arena.never());
        Self { names }
    }

    pub fn get(&self, name: Symbol) -> Option<TypeId> {
        self.names.get(&name).copied()
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.names.contains_key(&name)
    }
}

/// Identity of one scope. Rebinding a name is an error only when the
/// existing binding belongs to the same scope; shadowing an inherited
/// one is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }
}

#[derive(Debug, Clone)]
struct Binding {
    bound: Bound,
    owner: ScopeId,
}

/// The names visible at one point of the program
#[derive(Debug, Clone)]
pub struct Scope {
    id: ScopeId,
    names: FxHashMap<Symbol, Binding>,
}

impl Scope {
    pub fn new(id: ScopeId) -> Self {
        Self {
            id,
            names: FxHashMap::default(),
        }
    }

    /// Copy this scope's names into a new scope. A function scope
    /// additionally drops inherited locals; parameters and declarations
    /// stay visible.
    pub fn child(&self, id: ScopeId, is_function: bool) -> Scope {
        let mut names = self.names.clone();
        if is_function {
            names.retain(|_, binding| !matches!(binding.bound, Bound::Local { .. }));
        }
        Scope { id, names }
    }

    pub fn bind(&mut self, builtins: &Builtins, name: Symbol, bound: Bound) -> Result<(), BindError> {
        if builtins.contains(name) {
            return Err(BindError::Reserved);
        }
        if let Some(existing) = self.names.get(&name) {
            if existing.owner == self.id {
                return Err(BindError::AlreadyBound);
            }
        }
        self.names.insert(
            name,
            Binding {
                bound,
                owner: self.id,
            },
        );
        Ok(())
    }

    pub fn get(&self, builtins: &Builtins, name: Symbol) -> Option<Bound> {
        if let Some(ty) = builtins.get(name) {
            return Some(Bound::Type(ty));
        }
        self.names.get(&name).map(|binding| binding.bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Interner, TypeArena, Builtins) {
        let mut interner = Interner::new();
        let arena = TypeArena::new();
        let builtins = Builtins::new(&mut interner, &arena);
        (interner, arena, builtins)
    }

    #[test]
    fn builtins_resolve_as_types() {
        let (mut interner, arena, builtins) = setup();
        let scope = Scope::new(ScopeId::new(0));
        let name = interner.intern("u64");
        match scope.get(&builtins, name) {
            Some(Bound::Type(ty)) => assert_eq!(ty, arena.u64()),
            other => panic!("expected builtin type, got {:?}", other),
        }
    }

    #[test]
    fn builtins_cannot_be_bound() {
        let (mut interner, _, builtins) = setup();
        let mut scope = Scope::new(ScopeId::new(0));
        let name = interner.intern("bool");
        assert_eq!(
            scope.bind(&builtins, name, Bound::Function(0)),
            Err(BindError::Reserved)
        );
    }

    #[test]
    fn rebinding_in_same_scope_rejected() {
        let (mut interner, _, builtins) = setup();
        let mut scope = Scope::new(ScopeId::new(0));
        let name = interner.intern("main");
        scope.bind(&builtins, name, Bound::Function(0)).unwrap();
        assert_eq!(
            scope.bind(&builtins, name, Bound::Function(1)),
            Err(BindError::AlreadyBound)
        );
    }

    #[test]
    fn shadowing_inherited_binding_allowed() {
        let (mut interner, _, builtins) = setup();
        let name = interner.intern("x");
        let mut outer = Scope::new(ScopeId::new(0));
        outer
            .bind(
                &builtins,
                name,
                Bound::Local {
                    owner: BlockRef::Module(0),
                    index: 0,
                },
            )
            .unwrap();

        let mut inner = outer.child(ScopeId::new(1), false);
        assert!(inner
            .bind(
                &builtins,
                name,
                Bound::Local {
                    owner: BlockRef::Module(0),
                    index: 1,
                },
            )
            .is_ok());
    }

    #[test]
    fn function_child_strips_locals_keeps_parameters() {
        let (mut interner, _, builtins) = setup();
        let local = interner.intern("counter");
        let param = interner.intern("status");
        let func = interner.intern("helper");

        let mut outer = Scope::new(ScopeId::new(0));
        outer
            .bind(
                &builtins,
                local,
                Bound::Local {
                    owner: BlockRef::Function(0),
                    index: 1,
                },
            )
            .unwrap();
        outer
            .bind(
                &builtins,
                param,
                Bound::Parameter {
                    owner: BlockRef::Function(0),
                    index: 0,
                },
            )
            .unwrap();
        outer.bind(&builtins, func, Bound::Function(1)).unwrap();

        let body = outer.child(ScopeId::new(1), true);
        assert!(body.get(&builtins, local).is_none());
        assert!(matches!(
            body.get(&builtins, param),
            Some(Bound::Parameter { .. })
        ));
        assert!(matches!(body.get(&builtins, func), Some(Bound::Function(1))));

        // A plain block child keeps everything
        let block = outer.child(ScopeId::new(2), false);
        assert!(block.get(&builtins, local).is_some());
    }
}
