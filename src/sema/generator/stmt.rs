// src/sema/generator/stmt.rs
//! Scope construction and statement lowering.

use super::*;
use crate::frontend::ast::{IfStmt, ImportStmt, ImportTarget, LetStmt, ReturnStmt, Stmt};
use crate::sema::type_arena::TypeIdVec;

impl<'a> Generator<'a> {
    /// Walk one block: pre-bind its type aliases and function
    /// signatures, then lower its statements in order. Returns the
    /// completed scope so the caller can store it for later lookups
    /// from imports and member accesses.
    ///
    /// `function` carries the parameter list and identity of the unit
    /// when the block is a function body. Parameter slots reserve the
    /// first local indices, and the scope drops inherited locals so
    /// bodies cannot capture them.
    pub(crate) fn generate_scope(
        &mut self,
        block: &'a Block,
        parent: Option<&Scope>,
        expected: Option<TypeId>,
        function: Option<(&'a [Parameter], BlockRef)>,
    ) -> Result<Scope, SemanticError> {
        let id = self.scope_id();
        let mut scope = match parent {
            Some(parent) => parent.child(id, function.is_some()),
            None => Scope::new(id),
        };

        for decl in &block.types {
            let source = self.type_of(&decl.ty, &scope)?;
            let ty = self.arena.def(source, decl.name);
            self.bind(&mut scope, decl.name, Bound::Type(ty), decl.span)?;
        }

        // Signatures resolve against the scope as it stands here, so a
        // function can name sibling functions and local type aliases
        // but not imports, which only bind during the statement walk.
        let first = self.functions.len();
        for decl in &block.functions {
            let mut inputs = TypeIdVec::new();
            for parameter in &decl.parameters {
                inputs.push(self.type_of(&parameter.ty, &scope)?);
            }
            let output = match &decl.return_type {
                Some(expr) => self.type_of(expr, &scope)?,
                None => TypeId::NONE,
            };
            let ty = self.arena.function(inputs, output);
            let index = self.functions.len();
            self.functions.push(decl);
            self.function_types.push(ty);
            self.function_scopes.push(None);
            self.function_modules.push(self.current_module);
            self.bind(&mut scope, decl.name, Bound::Function(index), decl.span)?;
        }

        if let Some((parameters, owner)) = function {
            for (index, parameter) in parameters.iter().enumerate() {
                let ty = self.type_of(&parameter.ty, &scope)?;
                self.bind(
                    &mut scope,
                    parameter.name,
                    Bound::Parameter { owner, index },
                    parameter.span,
                )?;
                self.locals.push(ty);
                self.emit(Instruction::ReserveParameter { ty });
            }
        }

        for statement in &block.statements {
            self.statement(statement, &mut scope, expected)?;
        }

        for slot in &mut self.function_scopes[first..first + block.functions.len()] {
            *slot = Some(scope.clone());
        }

        Ok(scope)
    }

    fn statement(
        &mut self,
        statement: &'a Stmt,
        scope: &mut Scope,
        expected: Option<TypeId>,
    ) -> Result<(), SemanticError> {
        match statement {
            Stmt::Import(import) => self.import(import, scope),
            Stmt::Let(decl) => self.local(decl, scope),
            Stmt::Return(ret) => self.ret(ret, scope, expected),
            Stmt::If(conditional) => self.conditional(conditional, scope, expected),
            Stmt::Expr(statement) => {
                self.expression(&statement.expr, scope, None)?;
                self.emit(Instruction::Pop);
                Ok(())
            }
        }
    }

    /// Imports bind during the statement walk. The loader has already
    /// rewritten `from` to a resolved path, so a miss here means the
    /// path never loaded, which load-order guarantees cannot happen
    /// for anything the parser accepted.
    fn import(&mut self, import: &'a ImportStmt, scope: &mut Scope) -> Result<(), SemanticError> {
        let Some(index) = self.project.module_index(&import.from) else {
            return Err(SemanticError::Unsupported {
                detail: format!("unresolved import '{}'", import.from),
                span: import.span.into(),
            });
        };
        match &import.target {
            ImportTarget::Module(name) => {
                self.bind(scope, *name, Bound::Module(index), import.span)?;
            }
            ImportTarget::Binding { name, alias } => {
                let bound = self.exported(index, *name, import.span)?;
                self.bind(scope, *alias, bound, import.span)?;
            }
        }
        Ok(())
    }

    /// A local is the entry its initializer left on the stack; no
    /// further instruction is needed to materialize it.
    fn local(&mut self, decl: &'a LetStmt, scope: &mut Scope) -> Result<(), SemanticError> {
        let ty = self.expression(&decl.value, scope, None)?;
        if ty == TypeId::NONE || ty == TypeId::NEVER {
            return Err(SemanticError::InvalidLocalType {
                ty: self.type_name(ty),
                span: decl.span.into(),
            });
        }
        let index = self.locals.len();
        self.locals.push(ty);
        self.bind(
            scope,
            decl.name,
            Bound::Local {
                owner: self.current_block,
                index,
            },
            decl.span,
        )?;
        Ok(())
    }

    fn ret(
        &mut self,
        statement: &'a ReturnStmt,
        scope: &mut Scope,
        expected: Option<TypeId>,
    ) -> Result<(), SemanticError> {
        let Some(expected) = expected else {
            return Err(SemanticError::ReturnOutsideFunction {
                span: statement.span.into(),
            });
        };
        self.expression(&statement.value, scope, Some(expected))?;
        self.emit(Instruction::Return { ty: expected });
        Ok(())
    }

    /// Each arm tests and falls into its body; a false test skips past
    /// the body to the arm's label. There is no join label, so after a
    /// taken body control continues into the remaining arms' tests.
    fn conditional(
        &mut self,
        statement: &'a IfStmt,
        scope: &mut Scope,
        expected: Option<TypeId>,
    ) -> Result<(), SemanticError> {
        let bool_ty = self.arena.bool();
        let label = self.label();
        self.expression(&statement.condition, scope, Some(bool_ty))?;
        self.emit(Instruction::JumpIfFalse { label });
        self.generate_scope(&statement.body, Some(&*scope), expected, None)?;
        self.emit(Instruction::Label { index: label });
        for alternative in &statement.alternatives {
            match &alternative.condition {
                Some(condition) => {
                    let label = self.label();
                    self.expression(condition, scope, Some(bool_ty))?;
                    self.emit(Instruction::JumpIfFalse { label });
                    self.generate_scope(&alternative.body, Some(&*scope), expected, None)?;
                    self.emit(Instruction::Label { index: label });
                }
                None => {
                    self.generate_scope(&alternative.body, Some(&*scope), expected, None)?;
                }
            }
        }
        Ok(())
    }
}
