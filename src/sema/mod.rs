// src/sema/mod.rs
//! Semantic analysis: scopes, the type arena, and the IR generator.
//!
//! There is no separate type-checking pass; [`generator`] checks types
//! while it lowers, so a program that generates is a program that
//! checked.

pub mod generator;
pub mod scope;
pub mod type_arena;

pub use generator::generate;
pub use scope::{BindError, Bound, Builtins, Scope, ScopeId};
pub use type_arena::{TypeArena, TypeId, TypeKind};
