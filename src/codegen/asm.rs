// src/codegen/asm.rs
//! Assembly text under construction.
//!
//! Two things make this more than a string: instruction lines inside a
//! unit body are indented for readability, and two spots (the module
//! calls in `_start`, each prologue's frame reservation) can only be
//! filled in after later instructions have been seen, so they are
//! emitted as placeholders and patched.

/// x86-64 general-purpose registers the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
}

impl Reg {
    /// Name of the register's `size`-byte view, when one exists.
    pub fn sized(self, size: usize) -> Option<&'static str> {
        let names = match self {
            Reg::Rax => ["rax", "eax", "ax", "al"],
            Reg::Rbx => ["rbx", "ebx", "bx", "bl"],
            Reg::Rcx => ["rcx", "ecx", "cx", "cl"],
            Reg::Rdx => ["rdx", "edx", "dx", "dl"],
            Reg::Rsi => ["rsi", "esi", "si", "sil"],
            Reg::Rdi => ["rdi", "edi", "di", "dil"],
            Reg::R8 => ["r8", "r8d", "r8w", "r8b"],
            Reg::R9 => ["r9", "r9d", "r9w", "r9b"],
            Reg::R10 => ["r10", "r10d", "r10w", "r10b"],
        };
        match size {
            8 => Some(names[0]),
            4 => Some(names[1]),
            2 => Some(names[2]),
            1 => Some(names[3]),
            _ => None,
        }
    }
}

/// nasm size keyword for a memory operand of `size` bytes
pub fn size_keyword(size: usize) -> Option<&'static str> {
    match size {
        1 => Some("byte"),
        2 => Some("word"),
        4 => Some("dword"),
        8 => Some("qword"),
        _ => None,
    }
}

/// A line reserved for later patching.
#[derive(Debug, Clone, Copy)]
pub struct Patch {
    index: usize,
    indent: usize,
}

#[derive(Debug, Default)]
pub struct Asm {
    lines: Vec<String>,
    indent: usize,
}

impl Asm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction line at the current indent
    pub fn op(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.lines.push(format!("{}{}", " ".repeat(self.indent), line));
    }

    /// Append a label or directive, never indented
    pub fn label(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Reserve the next line, remembering the indent it would have had
    pub fn placeholder(&mut self) -> Patch {
        let patch = Patch {
            index: self.lines.len(),
            indent: self.indent,
        };
        self.lines.push(String::new());
        patch
    }

    /// Fill a reserved line. Multi-line text is allowed (the module
    /// call block); every line gets the reserved indent.
    pub fn patch(&mut self, patch: Patch, text: impl Into<String>) {
        let text = text.into();
        self.lines[patch.index] = text
            .lines()
            .map(|line| format!("{}{}", " ".repeat(patch.indent), line))
            .collect::<Vec<_>>()
            .join("\n");
    }

    /// Whether the most recent line is `line` (ignoring indent)
    pub fn last_is(&self, line: &str) -> bool {
        self.lines
            .last()
            .is_some_and(|last| last.trim() == line)
    }

    pub fn drop_last(&mut self) {
        self.lines.pop();
    }

    pub fn indent(&mut self) {
        self.indent += 2;
    }

    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(2);
    }

    pub fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
