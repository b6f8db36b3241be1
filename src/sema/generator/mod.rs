// src/sema/generator/mod.rs
//! Type checking and lowering to the stack instruction stream.
//!
//! One walk over each module AST both checks types and emits code.
//! Module bodies lower first, in the load order the module loader
//! produced. Function bodies lower afterwards from a worklist: the
//! signature pre-pass registers every declaration it sees, so the
//! worklist grows while it is being drained.

mod expr;
mod stmt;
mod types;


use tracing::debug;

use crate::codegen::Platform;
use crate::errors::{SemanticError, Sourced};
use crate::frontend::ast::{Block, FunctionDecl, Parameter, Symbol};
use crate::frontend::token::Span;
use crate::ir::{BlockRef, Instruction, Program};
use crate::module::Project;
use crate::sema::scope::{BindError, Bound, Builtins, Scope, ScopeId};
use crate::sema::type_arena::{TypeArena, TypeId};

/// Check and lower a loaded project into a [`Program`] for the given
/// target platform.
pub fn generate(project: &mut Project, platform: &dyn Platform) -> Result<Program, Sourced> {
    let arena = TypeArena::new();
    let builtins = Builtins::new(&mut project.interner, &arena);
    let module_count = project.modules.len();
    let generator = Generator {
        project: &*project,
        platform,
        arena,
        builtins,
        code: Vec::new(),
        functions: Vec::new(),
        function_types: Vec::new(),
        function_scopes: Vec::new(),
        function_modules: Vec::new(),
        module_scopes: vec![None; module_count],
        locals: Vec::new(),
        current_block: BlockRef::Module(0),
        current_module: 0,
        next_scope: 0,
        next_label: 0,
    };
    generator.run()
}

struct Generator<'a> {
    project: &'a Project,
    platform: &'a dyn Platform,
    arena: TypeArena,
    builtins: Builtins,
    code: Vec<Instruction>,
    /// Function declarations registered so far, in discovery order. The
    /// index into this list is the function's identity everywhere else.
    functions: Vec<&'a FunctionDecl>,
    function_types: Vec<TypeId>,
    /// Scope each function body will be checked against, filled in when
    /// the declaring block finishes walking and taken when the body is.
    function_scopes: Vec<Option<Scope>>,
    function_modules: Vec<usize>,
    /// Completed module scopes, indexed by module. `None` until the
    /// module body has been walked.
    module_scopes: Vec<Option<Scope>>,
    /// Types of the local slots of the unit currently being lowered,
    /// parameters first.
    locals: Vec<TypeId>,
    current_block: BlockRef,
    current_module: usize,
    next_scope: u32,
    next_label: usize,
}

impl<'a> Generator<'a> {
    fn run(mut self) -> Result<Program, Sourced> {
        self.emit(Instruction::Startup);
        self.emit(Instruction::Shutdown);

        for index in 0..self.project.modules.len() {
            let module = &self.project.modules[index];
            debug!(path = module.path.as_str(), "lowering module body");
            self.locals.clear();
            self.current_block = BlockRef::Module(index);
            self.current_module = index;
            self.emit(Instruction::Prologue { what: BlockRef::Module(index) });
            let scope = match self.generate_scope(&module.ast.block, None, None, None) {
                Ok(scope) => scope,
                Err(error) => return Err(self.sourced(error)),
            };
            self.emit(Instruction::Epilogue);
            self.module_scopes[index] = Some(scope);
        }

        let mut index = 0;
        while index < self.functions.len() {
            let function = self.functions[index];
            debug!(function = index, "lowering function body");
            self.locals.clear();
            self.current_block = BlockRef::Function(index);
            self.current_module = self.function_modules[index];
            let parent = self.function_scopes[index].take();
            let output = self
                .arena
                .signature(self.function_types[index])
                .map(|(_, output)| output)
                .unwrap_or(TypeId::NONE);
            self.emit(Instruction::Prologue { what: BlockRef::Function(index) });
            let walked = self.generate_scope(
                &function.body,
                parent.as_ref(),
                Some(output),
                Some((&function.parameters, BlockRef::Function(index))),
            );
            if let Err(error) = walked {
                return Err(self.sourced(error));
            }
            self.emit(Instruction::Epilogue);
            index += 1;
        }

        Ok(Program {
            instructions: self.code,
            arena: self.arena,
        })
    }

    fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    /// Accept `source` where `expected` is wanted, emitting whatever
    /// conversion applies. The conversions, in the order they are
    /// tried: read a reference whose referee is the expected type,
    /// convert between positionally identical object types, construct
    /// an object from a matching tuple prefix, and cast between
    /// arithmetic types (reading a reference first when needed).
    fn expect_or_convert(
        &mut self,
        source: TypeId,
        expected: Option<TypeId>,
        span: Span,
    ) -> Result<TypeId, SemanticError> {
        let Some(expected) = expected else {
            return Ok(source);
        };
        if source == expected {
            return Ok(source);
        }

        if self.arena.referee(source) == Some(expected) {
            self.emit(Instruction::ReadValue);
            return Ok(expected);
        }

        if let (Some(from), Some(to)) = (
            self.arena.object_members(source),
            self.arena.object_members(expected),
        ) {
            let compatible = from.len() == to.len()
                && from
                    .iter()
                    .zip(to.iter())
                    .all(|(a, b)| a.name == b.name && a.ty == b.ty);
            if compatible {
                if self.arena.has_private_member(source) {
                    return Err(SemanticError::PrivateConversion {
                        ty: self.type_name(source),
                        span: span.into(),
                    });
                }
                if self.arena.has_private_member(expected) {
                    return Err(SemanticError::PrivateConstruction {
                        ty: self.type_name(expected),
                        span: span.into(),
                    });
                }
                return Ok(expected);
            }
        }

        if let (Some(from), Some(to)) = (
            self.arena.tuple_members(source),
            self.arena.object_members(expected),
        ) {
            let compatible = from.len() <= to.len()
                && from.iter().zip(to.iter()).all(|(a, b)| *a == b.ty);
            if compatible {
                if self.arena.has_private_member(expected) {
                    return Err(SemanticError::PrivateConstruction {
                        ty: self.type_name(expected),
                        span: span.into(),
                    });
                }
                return Ok(expected);
            }
        }

        if self.arena.is_arithmetic(expected) {
            if self.arena.is_arithmetic(source) {
                self.emit(Instruction::NumericCast { ty: expected });
                return Ok(expected);
            }
            if let Some(referee) = self.arena.referee(source) {
                if self.arena.is_arithmetic(referee) {
                    self.emit(Instruction::ReadValue);
                    self.emit(Instruction::NumericCast { ty: expected });
                    return Ok(expected);
                }
            }
        }

        let found = match self.arena.referee(source) {
            Some(referee) => self.type_name(referee),
            None => self.type_name(source),
        };
        Err(SemanticError::TypeMismatch {
            expected: self.type_name(expected),
            found,
            span: span.into(),
        })
    }

    /// Look up an exported name in another module's completed scope.
    fn exported(&self, module: usize, name: Symbol, span: Span) -> Result<Bound, SemanticError> {
        let exports = &self.project.modules[module].ast.exports;
        if !exports.iter().any(|export| export.name == name) {
            return Err(SemanticError::UnknownExport {
                name: self.name(name),
                span: span.into(),
            });
        }
        let Some(scope) = self.module_scopes[module].as_ref() else {
            return Err(SemanticError::Unsupported {
                detail: format!(
                    "use of module '{}' before its body is compiled",
                    self.project.modules[module].path
                ),
                span: span.into(),
            });
        };
        match scope.get(&self.builtins, name) {
            Some(bound) => Ok(bound),
            None => Err(SemanticError::Unsupported {
                detail: format!("export '{}' is not bound", self.name(name)),
                span: span.into(),
            }),
        }
    }

    fn bind(
        &self,
        scope: &mut Scope,
        name: Symbol,
        bound: Bound,
        span: Span,
    ) -> Result<(), SemanticError> {
        scope
            .bind(&self.builtins, name, bound)
            .map_err(|error| match error {
                BindError::Reserved => SemanticError::ReservedName {
                    name: self.name(name),
                    span: span.into(),
                },
                BindError::AlreadyBound => SemanticError::NameCollision {
                    name: self.name(name),
                    span: span.into(),
                },
            })
    }

    fn name(&self, symbol: Symbol) -> String {
        self.project.interner.resolve(symbol).to_string()
    }

    fn type_name(&self, id: TypeId) -> String {
        self.arena.display(id, &self.project.interner)
    }

    fn scope_id(&mut self) -> ScopeId {
        let id = ScopeId::new(self.next_scope);
        self.next_scope += 1;
        id
    }

    fn label(&mut self) -> usize {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    fn sourced(&self, error: SemanticError) -> Sourced {
        let module = &self.project.modules[self.current_module];
        Sourced::new(&module.path, &module.source, error)
    }
}
