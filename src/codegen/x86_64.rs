// src/codegen/x86_64.rs
//! Instruction lowering for Linux on x86-64.
//!
//! The calling convention is the compiler's own: `rdi` carries the
//! address of the packed argument block, `rsi` the address the return
//! value must be written to. A callee moves them to `r10` and `r9` in
//! its prologue so that its own calls can reuse `rdi`/`rsi`. Every
//! value lives in the frame; registers are only staging for one
//! instruction at a time, so no value is live in a register across two
//! IR instructions.

use std::path::Path;

use smallvec::smallvec;
use tracing::debug;

use crate::codegen::asm::{size_keyword, Asm, Patch, Reg};
use crate::codegen::link;
use crate::codegen::stack::{align_of, align_up, size_of, Slot, Stack};
use crate::codegen::Platform;
use crate::errors::CodegenError;
use crate::ir::{BlockRef, Instruction, Program};
use crate::sema::type_arena::{TypeArena, TypeId, TypeIdVec};

pub struct LinuxX86_64;

impl Platform for LinuxX86_64 {
    fn syscall_signature(
        &self,
        number: u64,
        arena: &mut TypeArena,
    ) -> Option<(TypeIdVec, TypeId)> {
        match number {
            // exit(status)
            60 => Some((smallvec![arena.u64(), arena.s32()], arena.never())),
            _ => None,
        }
    }

    #[tracing::instrument(skip_all, fields(output = %output.display()))]
    fn compile(&self, program: &Program, output: &Path) -> Result<(), CodegenError> {
        let text = emit(program)?;
        debug!(bytes = text.len(), "assembly rendered");
        link::assemble_and_link(&text, output)
    }
}

/// Render the whole instruction stream as one nasm source text.
pub fn emit(program: &Program) -> Result<String, CodegenError> {
    let mut emitter = Emitter {
        arena: &program.arena,
        asm: Asm::new(),
        stack: Stack::new(&program.arena),
        module_calls: Vec::new(),
        startup: None,
        frame: None,
    };
    for instruction in &program.instructions {
        emitter.instruction(instruction)?;
    }
    emitter.finish()
}

fn unsupported(detail: impl Into<String>) -> CodegenError {
    CodegenError::Unsupported {
        detail: detail.into(),
    }
}

/// The registers syscall arguments go to, argument order.
const SYSCALL_REGS: [Reg; 7] = [
    Reg::Rax,
    Reg::Rdi,
    Reg::Rsi,
    Reg::Rdx,
    Reg::R10,
    Reg::R8,
    Reg::R9,
];

struct Emitter<'a> {
    arena: &'a TypeArena,
    asm: Asm,
    stack: Stack<'a>,
    /// One `call` per module body, patched into `_start`
    module_calls: Vec<String>,
    startup: Option<Patch>,
    /// The current prologue's frame reservation
    frame: Option<Patch>,
}

impl<'a> Emitter<'a> {
    fn instruction(&mut self, instruction: &Instruction) -> Result<(), CodegenError> {
        match instruction {
            Instruction::Startup => {
                self.asm.op("default rel");
                self.asm.op("global _start");
                self.asm.label("_start:");
                self.startup = Some(self.asm.placeholder());
            }
            Instruction::Shutdown => {
                self.asm.op("mov rax, 60");
                self.asm.op("mov rdi, 0");
                self.asm.op("syscall");
            }
            Instruction::Prologue { what } => self.prologue(*what),
            Instruction::Epilogue => self.epilogue()?,
            Instruction::Call { argc, ty } => self.call(*argc, *ty)?,
            Instruction::Pop => {
                self.stack.pop()?;
            }
            Instruction::PushReturnValue { ty } => {
                self.stack.push(Slot::Value(*ty));
            }
            Instruction::Syscall { argc } => self.syscall(*argc)?,
            Instruction::PushSyscallReturnValue { ty } => {
                let entry = self.stack.push(Slot::Value(*ty));
                if !entry.is_placeholder() {
                    let operand = entry.operand();
                    let size = entry.size;
                    let reg = self.sized(Reg::Rax, size)?;
                    self.asm.op(format!("mov {operand}, {reg}"));
                }
            }
            Instruction::PushFunctionAddress { index, ty } => {
                self.asm.op(format!("lea rax, f{index}"));
                let slot = self.stack.push(Slot::Value(*ty)).operand();
                self.asm.op(format!("mov {slot}, rax"));
            }
            Instruction::PushInteger { ty, value } => {
                let size = size_of(self.arena, *ty);
                let reg = self.sized(Reg::Rax, size)?;
                self.asm.op(format!("mov {reg}, {value}"));
                let slot = self.stack.push(Slot::Value(*ty)).operand();
                self.asm.op(format!("mov {slot}, {reg}"));
            }
            Instruction::PushScalar { ty, value } => {
                let size = size_of(self.arena, *ty);
                let bits = match size {
                    4 => (*value as f32).to_bits() as u64,
                    8 => value.to_bits(),
                    _ => return Err(unsupported("scalar of unexpected width")),
                };
                let reg = self.sized(Reg::Rax, size)?;
                self.asm.op(format!("mov {reg}, 0x{bits:x}"));
                let slot = self.stack.push(Slot::Value(*ty)).operand();
                self.asm.op(format!("mov {slot}, {reg}"));
            }
            Instruction::PushLocalReference { index } => self.reference(*index)?,
            Instruction::PushTopReference => {
                let index = self
                    .stack
                    .len()
                    .checked_sub(1)
                    .ok_or_else(|| unsupported("reference to an empty stack"))?;
                self.reference(index)?;
            }
            Instruction::Return { ty: _ } => {
                let entry = self.stack.pop()?;
                self.copy("[r9]", &entry.operand(), entry.size);
                self.asm.op("jmp .epilogue");
            }
            Instruction::PushSum { ty } => self.arithmetic(*ty, "add")?,
            Instruction::PushDifference { ty } => self.arithmetic(*ty, "sub")?,
            Instruction::PushProduct { ty } => self.arithmetic(*ty, "imul")?,
            Instruction::PushQuotient { ty } => self.arithmetic(*ty, "div")?,
            Instruction::OffsetReferenceToMember { index } => self.offset_to_member(*index)?,
            Instruction::Rotate => self.rotate()?,
            Instruction::ReadValue => self.read_value()?,
            Instruction::ReserveParameter { ty } => {
                self.stack.parameter(*ty);
            }
            Instruction::BeginAggregate { ty } => {
                self.stack.push(Slot::Value(*ty));
            }
            Instruction::StoreMember { index } => {
                let member = self.stack.pop()?;
                let dst = self
                    .stack
                    .top()?
                    .member_operand(*index)
                    .ok_or_else(|| unsupported(format!("no member {index} to store into")))?;
                self.copy(&dst, &member.operand(), member.size);
            }
            Instruction::Label { index } => self.asm.label(format!(".l{index}:")),
            Instruction::Jump { label } => self.asm.op(format!("jmp .l{label}")),
            Instruction::JumpIfFalse { label } => {
                let entry = self.stack.pop()?;
                self.asm.op("mov al, 1");
                self.asm.op(format!("mov bl, {}", entry.operand()));
                self.asm.op("cmp al, bl");
                self.asm.op(format!("jne .l{label}"));
            }
            Instruction::CmpLt { ty } => self.comparison(*ty, "cmovl")?,
            Instruction::CmpLe { ty } => self.comparison(*ty, "cmovle")?,
            Instruction::CmpEq { ty } => self.comparison(*ty, "cmove")?,
            Instruction::NumericCast { ty } => self.numeric_cast(*ty)?,
        }
        Ok(())
    }

    fn prologue(&mut self, what: BlockRef) {
        if let BlockRef::Module(_) = what {
            self.module_calls.push(format!("call {}", what.label()));
        }
        self.stack = Stack::new(self.arena);
        self.asm.label(format!("{}:", what.label()));
        self.asm.indent();
        self.asm.op("push r9");
        self.asm.op("mov r9, rsi");
        self.asm.op("push r10");
        self.asm.op("mov r10, rdi");
        self.asm.op("push rbp");
        self.asm.op("mov rbp, rsp");
        self.frame = Some(self.asm.placeholder());
    }

    fn epilogue(&mut self) -> Result<(), CodegenError> {
        let frame = align_up(self.stack.frame_size(), 16);
        let patch = self
            .frame
            .take()
            .ok_or_else(|| unsupported("epilogue without a prologue"))?;
        self.asm.patch(patch, format!("sub rsp, {frame}"));
        // A return as the unit's last statement would jump to the very
        // next line.
        if self.asm.last_is("jmp .epilogue") {
            self.asm.drop_last();
        }
        self.asm.label(".epilogue:");
        self.asm.op("mov rsp, rbp");
        self.asm.op("pop rbp");
        self.asm.op("mov rdi, r10");
        self.asm.op("pop r10");
        self.asm.op("mov rsi, r9");
        self.asm.op("pop r9");
        self.asm.op("ret");
        self.asm.outdent();
        Ok(())
    }

    /// The argument entries sit contiguously on top of the callee
    /// address; the deepest one is the start of the packed block.
    fn call(&mut self, argc: usize, ty: TypeId) -> Result<(), CodegenError> {
        let mut block = None;
        for _ in 0..argc {
            block = Some(self.stack.pop()?);
        }
        if let Some(block) = block.filter(|entry| !entry.is_placeholder()) {
            self.asm.op(format!("lea rdi, {}", block.operand()));
        }
        let callee = self.stack.pop()?;

        // The return value lands at the free offset, aligned for its
        // type; zero alignment (a zero-sized return) skips the step
        // and forwards the destination as-is.
        let output = self
            .arena
            .signature(ty)
            .map(|(_, output)| output)
            .unwrap_or(TypeId::NONE);
        let old = self.stack.free_offset();
        let alignment = align_of(self.arena, output);
        if alignment != 0 {
            self.stack.align_free_offset(alignment);
        }
        self.asm
            .op(format!("lea rsi, [rsp + {}]", self.stack.free_offset()));
        self.asm.op(format!("call {}", callee.operand()));
        self.stack.set_free_offset(old);
        Ok(())
    }

    fn syscall(&mut self, argc: usize) -> Result<(), CodegenError> {
        for index in (0..argc).rev() {
            let entry = self.stack.pop()?;
            let reg = SYSCALL_REGS
                .get(index)
                .and_then(|reg| reg.sized(entry.size))
                .ok_or_else(|| {
                    unsupported(format!(
                        "syscall argument {index} of {} bytes",
                        entry.size
                    ))
                })?;
            self.asm.op(format!("mov {reg}, {}", entry.operand()));
        }
        self.asm.op("syscall");
        Ok(())
    }

    /// Push the address of stack slot `index`.
    fn reference(&mut self, index: usize) -> Result<(), CodegenError> {
        let target = self.stack.get(index)?.operand();
        self.asm.op(format!("lea rax, {target}"));
        let slot = self.stack.refer(index)?.operand();
        self.asm.op(format!("mov {slot}, rax"));
        Ok(())
    }

    fn read_value(&mut self) -> Result<(), CodegenError> {
        let entry = self.stack.pop()?;
        let pointee = match entry.slot {
            Slot::Address(pointee) => pointee,
            Slot::Value(ty) => self
                .arena
                .pointee(ty)
                .or_else(|| self.arena.referee(ty))
                .ok_or_else(|| unsupported("read through a non-pointer entry"))?,
        };
        self.asm.op(format!("mov rbx, {}", entry.operand()));
        let dst = self.stack.push(Slot::Value(pointee));
        let (operand, size) = (dst.operand(), dst.size);
        self.copy(&operand, "[rbx]", size);
        Ok(())
    }

    fn arithmetic(&mut self, ty: TypeId, op: &str) -> Result<(), CodegenError> {
        if !self.arena.is_integral(ty) {
            return Err(unsupported("arithmetic on a non-integral type"));
        }
        let size = size_of(self.arena, ty);
        let rhs = self.sized(Reg::Rbx, size)?;
        let lhs = self.sized(Reg::Rax, size)?;
        let rhs_entry = self.stack.pop()?;
        let lhs_entry = self.stack.pop()?;
        self.asm.op(format!("mov {rhs}, {}", rhs_entry.operand()));
        self.asm.op(format!("mov {lhs}, {}", lhs_entry.operand()));
        match op {
            "imul" => self.asm.op(format!("imul {rhs}")),
            "div" => {
                // One-operand division reads the high half from rdx
                // (ah for bytes); it has to be prepared first.
                if self.arena.is_signed(ty) {
                    let extend = match size {
                        1 => "cbw",
                        2 => "cwd",
                        4 => "cdq",
                        _ => "cqo",
                    };
                    self.asm.op(extend);
                    self.asm.op(format!("idiv {rhs}"));
                } else {
                    if size == 1 {
                        self.asm.op("movzx ax, al");
                    } else {
                        self.asm.op("xor rdx, rdx");
                    }
                    self.asm.op(format!("div {rhs}"));
                }
            }
            _ => self.asm.op(format!("{op} {lhs}, {rhs}")),
        }
        let slot = self.stack.push(Slot::Value(ty)).operand();
        self.asm.op(format!("mov {slot}, {lhs}"));
        Ok(())
    }

    /// Branchless comparison: materialize the bool with a conditional
    /// move against a fixed 1/0 pair, keeping the stack model free of
    /// control flow.
    fn comparison(&mut self, ty: TypeId, cmov: &str) -> Result<(), CodegenError> {
        if !self.arena.is_integral(ty) {
            return Err(unsupported("comparison of a non-integral type"));
        }
        let size = size_of(self.arena, ty);
        let rhs = self.sized(Reg::Rbx, size)?;
        let lhs = self.sized(Reg::Rax, size)?;
        self.asm.op("mov rdx, 1");
        self.asm.op("xor rcx, rcx");
        let rhs_entry = self.stack.pop()?;
        self.asm.op(format!("mov {rhs}, {}", rhs_entry.operand()));
        let lhs_entry = self.stack.pop()?;
        self.asm.op(format!("mov {lhs}, {}", lhs_entry.operand()));
        self.asm.op(format!("cmp {lhs}, {rhs}"));
        self.asm.op(format!("{cmov} rcx, rdx"));
        let slot = self.stack.push(Slot::Value(TypeId::BOOL)).operand();
        self.asm.op(format!("mov {slot}, cl"));
        Ok(())
    }

    /// Retarget the address on top from an aggregate to one of its
    /// members, using the referred slot's recorded member layout.
    fn offset_to_member(&mut self, index: usize) -> Result<(), CodegenError> {
        let slot_index = self
            .stack
            .top()?
            .refers_to
            .ok_or_else(|| unsupported("member offset through a non-reference entry"))?;
        let member = self
            .stack
            .get(slot_index)?
            .members
            .get(index)
            .cloned()
            .ok_or_else(|| unsupported(format!("no member {index} to offset to")))?;
        let popped = self.stack.pop()?;
        self.asm.op(format!("mov rax, {}", popped.operand()));
        self.asm.op(format!("add rax, {}", member.relative));
        let slot = self.stack.push(Slot::Address(member.ty)).operand();
        self.asm.op(format!("mov {slot}, rax"));
        Ok(())
    }

    /// Swap the top two entries. Their storage may differ in size and
    /// alignment, so both values are stashed above the live stack, the
    /// two slots rebuilt in swapped order, and the stash copied back
    /// into them.
    fn rotate(&mut self) -> Result<(), CodegenError> {
        let len = self.stack.len();
        if len < 2 {
            return Err(unsupported("rotate needs two entries"));
        }
        let a = self.stack.get(len - 2)?.clone();
        let b = self.stack.get(len - 1)?.clone();

        let saved_a = self.stack.push(a.slot).operand();
        self.copy(&saved_a, &a.operand(), a.size);
        let saved_b = self.stack.push(b.slot).operand();
        self.copy(&saved_b, &b.operand(), b.size);
        for _ in 0..4 {
            self.stack.pop()?;
        }
        let new_b = self.stack.push(b.slot).operand();
        self.copy(&new_b, &saved_b, b.size);
        let new_a = self.stack.push(a.slot).operand();
        self.copy(&new_a, &saved_a, a.size);
        Ok(())
    }

    fn numeric_cast(&mut self, target: TypeId) -> Result<(), CodegenError> {
        if !self.arena.is_integral(target) {
            return Err(unsupported("numeric cast to a non-integral type"));
        }
        let source = self.stack.pop()?;
        let source_ty = match source.slot {
            Slot::Value(ty) => ty,
            Slot::Address(_) => return Err(unsupported("numeric cast of an address entry")),
        };
        if !self.arena.is_integral(source_ty) {
            return Err(unsupported("numeric cast from a non-integral type"));
        }
        let src = source.operand();
        let src_size = source.size;
        let dst_size = size_of(self.arena, target);

        let reg = self.sized(Reg::Rax, dst_size)?;
        if dst_size <= src_size {
            // Little-endian truncation: read just the low bytes
            self.asm.op(format!("mov {reg}, {src}"));
        } else if self.arena.is_signed(source_ty) {
            let keyword = size_keyword(src_size)
                .ok_or_else(|| unsupported("cast from an oddly sized source"))?;
            self.asm.op(format!("movsx {reg}, {keyword} {src}"));
        } else if src_size == 4 {
            // A 32-bit load zero-extends on its own
            self.asm.op(format!("mov eax, {src}"));
        } else {
            let keyword = size_keyword(src_size)
                .ok_or_else(|| unsupported("cast from an oddly sized source"))?;
            self.asm.op(format!("movzx {reg}, {keyword} {src}"));
        }
        let slot = self.stack.push(Slot::Value(target)).operand();
        self.asm.op(format!("mov {slot}, {reg}"));
        Ok(())
    }

    /// Copy `size` bytes between memory operands: through a register
    /// for the machine widths, `rep movsb` for everything else.
    fn copy(&mut self, dst: &str, src: &str, size: usize) {
        if size == 0 {
            return;
        }
        if let Some(reg) = Reg::Rax.sized(size) {
            self.asm.op(format!("mov {reg}, {src}"));
            self.asm.op(format!("mov {dst}, {reg}"));
        } else {
            self.asm.op(format!("lea rsi, {src}"));
            self.asm.op(format!("lea rdi, {dst}"));
            self.asm.op(format!("mov rcx, {size}"));
            self.asm.op("rep movsb");
        }
    }

    fn sized(&self, reg: Reg, size: usize) -> Result<&'static str, CodegenError> {
        reg.sized(size)
            .ok_or_else(|| unsupported(format!("no register of {size} bytes")))
    }

    fn finish(mut self) -> Result<String, CodegenError> {
        if let Some(patch) = self.startup {
            self.asm.patch(patch, self.module_calls.join("\n"));
        }
        Ok(self.asm.finish())
    }
}
