// src/ir/mod.rs
//! The typed stack-machine IR that connects the generator to a backend.
//!
//! A compiled program is one flat instruction sequence. Each
//! instruction carries only the data emission needs: a type handle, an
//! index, or a literal value. Nothing points at another instruction;
//! jump targets are label values resolved by the backend.

use crate::sema::type_arena::{TypeArena, TypeId};
use crate::frontend::Interner;

/// Which compilation unit a block of instructions or a local slot
/// belongs to. Module bodies compile to functions too, so both carry
/// an index into their respective list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Module(usize),
    Function(usize),
}

impl BlockRef {
    /// Assembly label of the unit's compiled body
    pub fn label(&self) -> String {
        match self {
            BlockRef::Module(index) => format!("fmodule{}", index),
            BlockRef::Function(index) => format!("f{}", index),
        }
    }
}

/// One operation of the stack machine.
///
/// Push instructions create exactly one abstract stack entry, pops
/// consume them; the backend replays the sequence against its operand
/// stack to assign frame slots. `ty` fields name the type of the entry
/// being produced or operated on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// Process entry point: calls every module body, then Shutdown
    Startup,
    /// Process exit with status 0
    Shutdown,
    /// Start of a compiled unit body
    Prologue { what: BlockRef },
    /// End of a compiled unit body
    Epilogue,
    /// Call through the address below the argc argument entries
    Call { argc: usize, ty: TypeId },
    Pop,
    PushReturnValue { ty: TypeId },
    /// Raw system call; consumes argc entries, the first is the number
    Syscall { argc: usize },
    PushSyscallReturnValue { ty: TypeId },
    PushFunctionAddress { index: usize, ty: TypeId },
    PushInteger { ty: TypeId, value: u64 },
    PushScalar { ty: TypeId, value: f64 },
    /// Push the address of local slot `index`
    PushLocalReference { index: usize },
    /// Push the address of the current top entry
    PushTopReference,
    Return { ty: TypeId },
    PushSum { ty: TypeId },
    PushDifference { ty: TypeId },
    PushProduct { ty: TypeId },
    PushQuotient { ty: TypeId },
    /// Retarget the reference on top to member `index` of its referee
    OffsetReferenceToMember { index: usize },
    /// Swap the top two entries
    Rotate,
    /// Pop a reference, push the value it refers to
    ReadValue,
    /// Declare the next parameter slot of the current unit
    ReserveParameter { ty: TypeId },
    /// Allocate an aggregate entry to be filled by StoreMember
    BeginAggregate { ty: TypeId },
    /// Pop a value into member `index` of the open aggregate
    StoreMember { index: usize },
    Label { index: usize },
    Jump { label: usize },
    /// Pop a bool entry and skip to the label when it is false
    JumpIfFalse { label: usize },
    CmpLt { ty: TypeId },
    CmpLe { ty: TypeId },
    CmpEq { ty: TypeId },
    NumericCast { ty: TypeId },
}

/// A generated program: the instruction stream plus the type arena its
/// instructions reference.
#[derive(Debug)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub arena: TypeArena,
}

impl Program {
    /// Render the instruction stream as a readable listing. Unit
    /// bodies are indented; types print in source syntax.
    pub fn listing(&self, interner: &Interner) -> String {
        let mut out = String::new();
        let mut indent = "";
        for instruction in &self.instructions {
            if matches!(instruction, Instruction::Epilogue) {
                indent = "";
            }
            out.push_str(indent);
            out.push_str(&self.render(instruction, interner));
            out.push('\n');
            if matches!(instruction, Instruction::Prologue { .. }) {
                indent = "  ";
            }
        }
        out
    }

    fn render(&self, instruction: &Instruction, interner: &Interner) -> String {
        let ty = |id: &TypeId| self.arena.display(*id, interner);
        match instruction {
            Instruction::Startup => "startup".to_string(),
            Instruction::Shutdown => "shutdown".to_string(),
            Instruction::Prologue { what } => format!("prologue {}", what.label()),
            Instruction::Epilogue => "epilogue".to_string(),
            Instruction::Call { argc, ty: f } => format!("call {} {}", argc, ty(f)),
            Instruction::Pop => "pop".to_string(),
            Instruction::PushReturnValue { ty: t } => {
                format!("push-return-value {}", ty(t))
            }
            Instruction::Syscall { argc } => format!("syscall {}", argc),
            Instruction::PushSyscallReturnValue { ty: t } => {
                format!("push-syscall-return-value {}", ty(t))
            }
            Instruction::PushFunctionAddress { index, ty: t } => {
                format!("push-function-address f{} {}", index, ty(t))
            }
            Instruction::PushInteger { ty: t, value } => {
                format!("push-integer {} {}", ty(t), value)
            }
            Instruction::PushScalar { ty: t, value } => {
                format!("push-scalar {} {}", ty(t), value)
            }
            Instruction::PushLocalReference { index } => {
                format!("push-local-reference {}", index)
            }
            Instruction::PushTopReference => "push-top-reference".to_string(),
            Instruction::Return { ty: t } => format!("return {}", ty(t)),
            Instruction::PushSum { ty: t } => format!("push-sum {}", ty(t)),
            Instruction::PushDifference { ty: t } => format!("push-difference {}", ty(t)),
            Instruction::PushProduct { ty: t } => format!("push-product {}", ty(t)),
            Instruction::PushQuotient { ty: t } => format!("push-quotient {}", ty(t)),
            Instruction::OffsetReferenceToMember { index } => {
                format!("offset-reference-to-member {}", index)
            }
            Instruction::Rotate => "rotate".to_string(),
            Instruction::ReadValue => "read-value".to_string(),
            Instruction::ReserveParameter { ty: t } => {
                format!("reserve-parameter {}", ty(t))
            }
            Instruction::BeginAggregate { ty: t } => format!("begin-aggregate {}", ty(t)),
            Instruction::StoreMember { index } => format!("store-member {}", index),
            Instruction::Label { index } => format!("label .l{}", index),
            Instruction::Jump { label } => format!("jump .l{}", label),
            Instruction::JumpIfFalse { label } => format!("jump-if-false .l{}", label),
            Instruction::CmpLt { ty: t } => format!("cmp-lt {}", ty(t)),
            Instruction::CmpLe { ty: t } => format!("cmp-le {}", ty(t)),
            Instruction::CmpEq { ty: t } => format!("cmp-eq {}", ty(t)),
            Instruction::NumericCast { ty: t } => format!("numeric-cast {}", ty(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_labels() {
        assert_eq!(BlockRef::Module(0).label(), "fmodule0");
        assert_eq!(BlockRef::Function(3).label(), "f3");
    }

    #[test]
    fn listing_indents_unit_bodies() {
        let interner = Interner::new();
        let program = Program {
            instructions: vec![
                Instruction::Startup,
                Instruction::Shutdown,
                Instruction::Prologue {
                    what: BlockRef::Module(0),
                },
                Instruction::PushInteger {
                    ty: TypeId::U64,
                    value: 60,
                },
                Instruction::Pop,
                Instruction::Epilogue,
            ],
            arena: TypeArena::new(),
        };

        let listing = program.listing(&interner);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "startup");
        assert_eq!(lines[2], "prologue fmodule0");
        assert_eq!(lines[3], "  push-integer u64 60");
        assert_eq!(lines[5], "epilogue");
    }
}
