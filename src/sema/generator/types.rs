// src/sema/generator/types.rs
//! Resolution of type expressions against a scope.

use super::*;
use crate::frontend::ast::{TypeExpr, TypeExprKind};
use crate::sema::type_arena::{ObjectMember, ObjectMemberVec, TypeIdVec};

impl<'a> Generator<'a> {
    pub(crate) fn type_of(
        &mut self,
        expr: &TypeExpr,
        scope: &Scope,
    ) -> Result<TypeId, SemanticError> {
        match &expr.kind {
            TypeExprKind::Named(name) => match scope.get(&self.builtins, *name) {
                Some(Bound::Type(ty)) => Ok(ty),
                Some(_) => Err(SemanticError::NotAType {
                    name: self.name(*name),
                    span: expr.span.into(),
                }),
                None => Err(SemanticError::UnboundName {
                    name: self.name(*name),
                    span: expr.span.into(),
                }),
            },
            TypeExprKind::Pointer(pointee) => {
                let pointee = self.type_of(pointee, scope)?;
                Ok(self.arena.pointer(pointee))
            }
            TypeExprKind::Object(members) => {
                let mut resolved = ObjectMemberVec::new();
                for member in members {
                    let ty = self.type_of(&member.ty, scope)?;
                    resolved.push(ObjectMember {
                        visibility: member.visibility,
                        name: member.name,
                        ty,
                    });
                }
                Ok(self.arena.object(resolved))
            }
            TypeExprKind::Tuple(members) => {
                let mut resolved = TypeIdVec::new();
                for member in members {
                    resolved.push(self.type_of(member, scope)?);
                }
                Ok(self.arena.tuple(resolved))
            }
        }
    }
}
