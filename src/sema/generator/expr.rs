// src/sema/generator/expr.rs
//! Expression lowering. Every expression leaves exactly one typed
//! entry on the abstract stack; the caller decides whether to keep,
//! pop, or store it.

use super::*;
use crate::frontend::ast::{
    AccessExpr, BinaryExpr, BinaryOp, CallExpr, CastExpr, Expr, ExprKind, IndexExpr,
    ObjectLiteralMember, Visibility,
};
use crate::sema::type_arena::{ObjectMember, ObjectMemberVec, TypeIdVec};

impl<'a> Generator<'a> {
    /// Lower one expression. `expected` is the type the surrounding
    /// context wants; literals take their type from it, and the result
    /// is converted to it when a conversion applies.
    pub(crate) fn expression(
        &mut self,
        expr: &Expr,
        scope: &Scope,
        expected: Option<TypeId>,
    ) -> Result<TypeId, SemanticError> {
        let result = match &expr.kind {
            ExprKind::Integer(value) => self.integer(*value, expr.span, expected)?,
            ExprKind::Scalar(value) => self.scalar(*value, expr.span, expected)?,
            ExprKind::Name(name) => self.name_reference(*name, expr.span, scope)?,
            ExprKind::Tuple(values) => self.tuple_literal(values, expr.span, scope, expected)?,
            ExprKind::Object(members) => {
                self.object_literal(members, expr.span, scope, expected)?
            }
            ExprKind::Syscall(arguments) => self.syscall(arguments, expr.span, scope)?,
            ExprKind::Binary(binary) => self.binary(binary, expr.span, scope, expected)?,
            ExprKind::Cast(cast) => self.cast(cast, scope)?,
            ExprKind::Access(access) => self.access(access, expr.span, scope)?,
            ExprKind::Index(index) => self.index(index, expr.span, scope)?,
            ExprKind::Call(call) => self.call(call, expr.span, scope)?,
        };
        self.expect_or_convert(result, expected, expr.span)
    }

    fn integer(
        &mut self,
        value: u64,
        span: Span,
        expected: Option<TypeId>,
    ) -> Result<TypeId, SemanticError> {
        let Some(expected) = expected else {
            return Err(SemanticError::AmbiguousLiteral {
                literal: "integer",
                span: span.into(),
            });
        };
        if self.arena.is_integral(expected) {
            self.emit(Instruction::PushInteger {
                ty: expected,
                value,
            });
            return Ok(expected);
        }
        if self.arena.is_scalar(expected) {
            self.emit(Instruction::PushScalar {
                ty: expected,
                value: value as f64,
            });
            return Ok(expected);
        }
        if let Some(referee) = self.arena.referee(expected) {
            if self.arena.is_integral(referee) {
                self.emit(Instruction::PushInteger { ty: referee, value });
                return Ok(referee);
            }
        }
        Err(SemanticError::Unsupported {
            detail: format!(
                "integer literal where type '{}' is expected",
                self.type_name(expected)
            ),
            span: span.into(),
        })
    }

    fn scalar(
        &mut self,
        value: f64,
        span: Span,
        expected: Option<TypeId>,
    ) -> Result<TypeId, SemanticError> {
        let Some(expected) = expected else {
            return Err(SemanticError::AmbiguousLiteral {
                literal: "scalar",
                span: span.into(),
            });
        };
        if self.arena.is_scalar(expected) {
            self.emit(Instruction::PushScalar {
                ty: expected,
                value,
            });
            return Ok(expected);
        }
        Err(SemanticError::Unsupported {
            detail: format!(
                "scalar literal where type '{}' is expected",
                self.type_name(expected)
            ),
            span: span.into(),
        })
    }

    /// A name pushes a reference to its storage, not the value. Reads
    /// happen through the conversion in [`Self::expect_or_convert`],
    /// so a bare name in a void context stays an address.
    fn name_reference(
        &mut self,
        name: Symbol,
        span: Span,
        scope: &Scope,
    ) -> Result<TypeId, SemanticError> {
        let Some(bound) = scope.get(&self.builtins, name) else {
            return Err(SemanticError::UnboundName {
                name: self.name(name),
                span: span.into(),
            });
        };
        match bound {
            Bound::Module(index) => Ok(self.arena.module(index)),
            Bound::Function(index) => {
                let ty = self.function_types[index];
                self.emit(Instruction::PushFunctionAddress { index, ty });
                Ok(ty)
            }
            Bound::Parameter { owner, index } | Bound::Local { owner, index } => {
                if owner != self.current_block {
                    return Err(SemanticError::CapturedBinding {
                        name: self.name(name),
                        span: span.into(),
                    });
                }
                let ty = self.locals[index];
                self.emit(Instruction::PushLocalReference { index });
                Ok(self.arena.reference(ty))
            }
            Bound::Type(_) => Err(SemanticError::Unsupported {
                detail: format!("type '{}' used as a value", self.name(name)),
                span: span.into(),
            }),
        }
    }

    fn tuple_literal(
        &mut self,
        values: &[Expr],
        span: Span,
        scope: &Scope,
        expected: Option<TypeId>,
    ) -> Result<TypeId, SemanticError> {
        let expected_members = expected.and_then(|ty| self.arena.member_types(ty));
        if let Some(members) = &expected_members {
            if members.len() != values.len() {
                return Err(SemanticError::LiteralArity {
                    expected: members.len(),
                    found: values.len(),
                    what: "values",
                    span: span.into(),
                });
            }
        }

        // The aggregate's type is only known once the members are, so
        // the entry is patched in place afterwards.
        let patch = self.code.len();
        self.emit(Instruction::BeginAggregate { ty: TypeId::NONE });
        let mut members = TypeIdVec::new();
        for (index, value) in values.iter().enumerate() {
            let expect = expected_members
                .as_ref()
                .and_then(|members| members.get(index).copied());
            let ty = self.expression(value, scope, expect)?;
            self.emit(Instruction::StoreMember { index });
            members.push(ty);
        }
        let result = self.arena.tuple(members);
        self.code[patch] = Instruction::BeginAggregate { ty: result };
        Ok(result)
    }

    /// Object literal members are matched to the expected type by
    /// position, and the property names must agree at each position.
    /// The literal itself types as an all-public object, which then
    /// converts to the expected type only when that type has no
    /// private properties.
    fn object_literal(
        &mut self,
        members: &[ObjectLiteralMember],
        span: Span,
        scope: &Scope,
        expected: Option<TypeId>,
    ) -> Result<TypeId, SemanticError> {
        let targets = expected.and_then(|ty| self.arena.object_members(ty));
        if let Some(targets) = &targets {
            if targets.len() != members.len() {
                return Err(SemanticError::LiteralArity {
                    expected: targets.len(),
                    found: members.len(),
                    what: "properties",
                    span: span.into(),
                });
            }
        }

        let patch = self.code.len();
        self.emit(Instruction::BeginAggregate { ty: TypeId::NONE });
        let mut resolved = ObjectMemberVec::new();
        for (index, member) in members.iter().enumerate() {
            let target = targets.as_ref().map(|targets| targets[index]);
            if let Some(target) = target {
                if target.name != member.name {
                    return Err(SemanticError::FieldNameMismatch {
                        expected: self.name(target.name),
                        found: self.name(member.name),
                        span: span.into(),
                    });
                }
            }
            let ty = self.expression(&member.value, scope, target.map(|t| t.ty))?;
            self.emit(Instruction::StoreMember { index });
            resolved.push(ObjectMember {
                visibility: Visibility::Public,
                name: member.name,
                ty,
            });
        }
        let result = self.arena.object(resolved);
        self.code[patch] = Instruction::BeginAggregate { ty: result };
        Ok(result)
    }

    /// The first argument must be a literal so the signature can be
    /// looked up at compile time; it counts toward the arity like any
    /// other argument.
    fn syscall(
        &mut self,
        arguments: &[Expr],
        span: Span,
        scope: &Scope,
    ) -> Result<TypeId, SemanticError> {
        let Some(first) = arguments.first() else {
            return Err(SemanticError::SyscallNoArguments { span: span.into() });
        };
        let number = match first.kind {
            ExprKind::Integer(number) => number,
            _ => {
                return Err(SemanticError::SyscallNumberNotLiteral { span: span.into() });
            }
        };
        let Some((inputs, output)) = self.platform.syscall_signature(number, &mut self.arena)
        else {
            return Err(SemanticError::UnsupportedSyscall {
                number,
                span: first.span.into(),
            });
        };
        if inputs.len() != arguments.len() {
            return Err(SemanticError::ArityMismatch {
                expected: inputs.len(),
                found: arguments.len(),
                span: span.into(),
            });
        }
        for (argument, input) in arguments.iter().zip(inputs.iter()) {
            self.expression(argument, scope, Some(*input))?;
        }
        self.emit(Instruction::Syscall {
            argc: arguments.len(),
        });
        self.emit(Instruction::PushSyscallReturnValue { ty: output });
        Ok(output)
    }

    fn call(
        &mut self,
        call: &CallExpr,
        span: Span,
        scope: &Scope,
    ) -> Result<TypeId, SemanticError> {
        let callee = self.expression(&call.callee, scope, None)?;
        let Some((inputs, output)) = self.arena.signature(callee) else {
            return Err(SemanticError::NotCallable {
                ty: self.type_name(callee),
                span: call.callee.span.into(),
            });
        };
        if inputs.len() != call.arguments.len() {
            return Err(SemanticError::ArityMismatch {
                expected: inputs.len(),
                found: call.arguments.len(),
                span: span.into(),
            });
        }
        for (argument, input) in call.arguments.iter().zip(inputs.iter()) {
            self.expression(argument, scope, Some(*input))?;
        }
        self.emit(Instruction::Call {
            argc: call.arguments.len(),
            ty: callee,
        });
        self.emit(Instruction::PushReturnValue { ty: output });
        Ok(output)
    }

    fn binary(
        &mut self,
        binary: &BinaryExpr,
        span: Span,
        scope: &Scope,
        expected: Option<TypeId>,
    ) -> Result<TypeId, SemanticError> {
        match binary.op {
            BinaryOp::Add => {
                self.arithmetic(binary, span, scope, expected, |ty| Instruction::PushSum { ty })
            }
            BinaryOp::Sub => self.arithmetic(binary, span, scope, expected, |ty| {
                Instruction::PushDifference { ty }
            }),
            BinaryOp::Mul => self.arithmetic(binary, span, scope, expected, |ty| {
                Instruction::PushProduct { ty }
            }),
            BinaryOp::Div => self.arithmetic(binary, span, scope, expected, |ty| {
                Instruction::PushQuotient { ty }
            }),
            BinaryOp::Lt => {
                self.comparison(binary, span, scope, true, |ty| Instruction::CmpLt { ty })
            }
            BinaryOp::Le => {
                self.comparison(binary, span, scope, true, |ty| Instruction::CmpLe { ty })
            }
            BinaryOp::Eq => {
                self.comparison(binary, span, scope, false, |ty| Instruction::CmpEq { ty })
            }
        }
    }

    /// Both operands must land on the same arithmetic type. The outer
    /// expectation flows into the left operand, and whatever it became
    /// is then expected of the right one.
    fn arithmetic(
        &mut self,
        binary: &BinaryExpr,
        span: Span,
        scope: &Scope,
        expected: Option<TypeId>,
        instruction: impl FnOnce(TypeId) -> Instruction,
    ) -> Result<TypeId, SemanticError> {
        let lhs = self.expression(&binary.lhs, scope, expected)?;
        let rhs = self.expression(&binary.rhs, scope, Some(lhs))?;
        if lhs != rhs {
            return Err(SemanticError::OperandMismatch { span: span.into() });
        }
        if !self.arena.is_arithmetic(lhs) {
            return Err(SemanticError::NotArithmetic {
                ty: self.type_name(lhs),
                span: span.into(),
            });
        }
        self.emit(instruction(lhs));
        Ok(lhs)
    }

    /// Comparisons ignore the outer expectation; the left operand sets
    /// the type, reading it out of a reference first when needed.
    /// Equality additionally works on non-arithmetic types.
    fn comparison(
        &mut self,
        binary: &BinaryExpr,
        span: Span,
        scope: &Scope,
        arithmetic: bool,
        instruction: impl FnOnce(TypeId) -> Instruction,
    ) -> Result<TypeId, SemanticError> {
        let mut lhs = self.expression(&binary.lhs, scope, None)?;
        if let Some(referee) = self.arena.referee(lhs) {
            self.emit(Instruction::ReadValue);
            lhs = referee;
        }
        let rhs = self.expression(&binary.rhs, scope, Some(lhs))?;
        if lhs != rhs {
            return Err(SemanticError::OperandMismatch { span: span.into() });
        }
        if arithmetic && !self.arena.is_arithmetic(lhs) {
            return Err(SemanticError::NotArithmetic {
                ty: self.type_name(lhs),
                span: span.into(),
            });
        }
        self.emit(instruction(lhs));
        Ok(self.arena.bool())
    }

    fn cast(&mut self, cast: &CastExpr, scope: &Scope) -> Result<TypeId, SemanticError> {
        let ty = self.type_of(&cast.ty, scope)?;
        self.expression(&cast.value, scope, Some(ty))?;
        Ok(ty)
    }

    fn access(
        &mut self,
        access: &AccessExpr,
        span: Span,
        scope: &Scope,
    ) -> Result<TypeId, SemanticError> {
        let value = self.expression(&access.value, scope, None)?;

        if let Some(index) = self.arena.module_of(value) {
            let bound = self.exported(index, access.member, access.member_span)?;
            return match bound {
                Bound::Function(function) => {
                    let ty = self.function_types[function];
                    self.emit(Instruction::PushFunctionAddress {
                        index: function,
                        ty,
                    });
                    Ok(ty)
                }
                _ => Err(SemanticError::Unsupported {
                    detail: format!(
                        "module member '{}' is not a function",
                        self.name(access.member)
                    ),
                    span: access.member_span.into(),
                }),
            };
        }

        if self.arena.is_object(value) {
            let Some((index, ty)) = self.find_member(value, access.member) else {
                return Err(SemanticError::UnknownField {
                    name: self.name(access.member),
                    ty: self.type_name(value),
                    span: access.member_span.into(),
                });
            };
            self.read_member_of_top(index);
            return Ok(ty);
        }

        if let Some(referee) = self.arena.referee(value) {
            if self.arena.is_object(referee) {
                let Some((index, ty)) = self.find_member(referee, access.member) else {
                    return Err(SemanticError::UnknownField {
                        name: self.name(access.member),
                        ty: self.type_name(referee),
                        span: access.member_span.into(),
                    });
                };
                self.read_member_through_reference(index);
                return Ok(ty);
            }
        }

        Err(SemanticError::Unsupported {
            detail: format!("property access on type '{}'", self.type_name(value)),
            span: span.into(),
        })
    }

    fn index(
        &mut self,
        expr: &IndexExpr,
        span: Span,
        scope: &Scope,
    ) -> Result<TypeId, SemanticError> {
        let value = self.expression(&expr.value, scope, None)?;
        let index = expr.index as usize;

        if let Some(members) = self.arena.tuple_members(value) {
            let Some(ty) = members.get(index).copied() else {
                return Err(SemanticError::IndexOutOfBounds {
                    span: expr.index_span.into(),
                });
            };
            self.read_member_of_top(index);
            return Ok(ty);
        }

        if let Some(referee) = self.arena.referee(value) {
            if let Some(members) = self.arena.tuple_members(referee) {
                let Some(ty) = members.get(index).copied() else {
                    return Err(SemanticError::IndexOutOfBounds {
                        span: expr.index_span.into(),
                    });
                };
                self.read_member_through_reference(index);
                return Ok(ty);
            }
        }

        Err(SemanticError::Unsupported {
            detail: format!("index into type '{}'", self.type_name(value)),
            span: span.into(),
        })
    }

    fn find_member(&self, ty: TypeId, name: Symbol) -> Option<(usize, TypeId)> {
        let members = self.arena.object_members(ty)?;
        members
            .iter()
            .position(|member| member.name == name)
            .map(|index| (index, members[index].ty))
    }

    /// Read member `index` out of the aggregate on top of the stack:
    /// take the aggregate's address, narrow it to the member, read,
    /// then drop the aggregate from under the result.
    fn read_member_of_top(&mut self, index: usize) {
        self.emit(Instruction::PushTopReference);
        self.emit(Instruction::OffsetReferenceToMember { index });
        self.emit(Instruction::ReadValue);
        self.emit(Instruction::Rotate);
        self.emit(Instruction::Pop);
    }

    /// Read member `index` through the reference on top of the stack.
    fn read_member_through_reference(&mut self, index: usize) {
        self.emit(Instruction::OffsetReferenceToMember { index });
        self.emit(Instruction::ReadValue);
    }
}
