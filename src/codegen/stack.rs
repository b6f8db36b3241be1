// src/codegen/stack.rs
//! The abstract operand stack and frame layout.
//!
//! The backend replays the instruction stream against this stack: every
//! push assigns the next aligned offset in the frame, every pop rewinds
//! it, and the high-water mark becomes the frame reservation patched
//! into the prologue. Parameter entries live in the caller-allocated
//! block behind a separate register and are never reclaimed.

use crate::errors::CodegenError;
use crate::sema::type_arena::{TypeArena, TypeId, TypeKind};

/// Round `offset` up to a multiple of `alignment` (zero leaves it be).
pub fn align_up(offset: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return offset;
    }
    offset.div_ceil(alignment) * alignment
}

/// Byte size of a value of `ty`.
///
/// Aggregates are the sum of their members, each at its own aligned
/// offset, padded at the end to the aggregate's alignment. A memberless
/// aggregate is zero-sized.
pub fn size_of(arena: &TypeArena, ty: TypeId) -> usize {
    match arena.kind(ty) {
        TypeKind::None | TypeKind::Never | TypeKind::Module { .. } => 0,
        TypeKind::Bool => 1,
        TypeKind::Integer { bits, .. } | TypeKind::Scalar { bits } => *bits as usize / 8,
        TypeKind::Size { .. }
        | TypeKind::Function { .. }
        | TypeKind::Pointer { .. }
        | TypeKind::Reference { .. } => 8,
        TypeKind::Object { .. } | TypeKind::Tuple { .. } => {
            let mut offset = 0;
            let mut max_alignment = 0;
            for member in arena.member_types(ty).unwrap_or_default() {
                let alignment = align_of(arena, member);
                offset = align_up(offset, alignment) + size_of(arena, member);
                max_alignment = max_alignment.max(alignment);
            }
            align_up(offset, max_alignment)
        }
    }
}

/// Byte alignment of a value of `ty`. Aggregates take their most
/// demanding member's; zero-sized types have none.
pub fn align_of(arena: &TypeArena, ty: TypeId) -> usize {
    match arena.kind(ty) {
        TypeKind::None | TypeKind::Never | TypeKind::Module { .. } => 0,
        TypeKind::Bool => 1,
        TypeKind::Integer { bits, .. } | TypeKind::Scalar { bits } => *bits as usize / 8,
        TypeKind::Size { .. }
        | TypeKind::Function { .. }
        | TypeKind::Pointer { .. }
        | TypeKind::Reference { .. } => 8,
        TypeKind::Object { .. } | TypeKind::Tuple { .. } => arena
            .member_types(ty)
            .unwrap_or_default()
            .iter()
            .map(|member| align_of(arena, *member))
            .max()
            .unwrap_or(0),
    }
}

/// Which storage an entry's offset indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// The current frame, addressed off `rsp`
    Frame,
    /// The caller's packed argument block, addressed off `r10`
    Parameter,
}

impl Region {
    fn base(self) -> &'static str {
        match self {
            Region::Frame => "rsp",
            Region::Parameter => "r10",
        }
    }
}

/// What one entry holds. Addresses are raw pointers the backend mints
/// itself (for local references and member offsets); they carry the
/// pointee directly so minting one never has to touch the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Value(TypeId),
    Address(TypeId),
}

/// One member's layout inside an aggregate entry.
#[derive(Debug, Clone)]
pub struct Member {
    pub ty: TypeId,
    /// Offset within the aggregate's storage
    pub relative: usize,
    /// Offset within the entry's region
    pub offset: usize,
    pub size: usize,
}

/// One live value on the abstract operand stack.
#[derive(Debug, Clone)]
pub struct Entry {
    pub slot: Slot,
    pub region: Region,
    pub offset: usize,
    pub size: usize,
    pub alignment: usize,
    /// Member layout when the entry is an aggregate value
    pub members: Vec<Member>,
    /// Stack index this address was minted from, when it was
    pub refers_to: Option<usize>,
}

impl Entry {
    /// Zero-sized entries occupy a stack position but no storage.
    pub fn is_placeholder(&self) -> bool {
        self.size == 0
    }

    /// The entry's storage as an assembly operand
    pub fn operand(&self) -> String {
        format!("[{} + {}]", self.region.base(), self.offset)
    }

    /// Member `index`'s storage as an assembly operand
    pub fn member_operand(&self, index: usize) -> Option<String> {
        let member = self.members.get(index)?;
        Some(format!("[{} + {}]", self.region.base(), member.offset))
    }
}

fn underflow() -> CodegenError {
    CodegenError::Unsupported {
        detail: "operand stack underflow".to_string(),
    }
}

/// The operand stack of one unit body being emitted.
pub struct Stack<'a> {
    arena: &'a TypeArena,
    entries: Vec<Entry>,
    offset: usize,
    max_offset: usize,
    parameter_offset: usize,
}

impl<'a> Stack<'a> {
    pub fn new(arena: &'a TypeArena) -> Self {
        Self {
            arena,
            entries: Vec::new(),
            offset: 0,
            max_offset: 0,
            parameter_offset: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// High-water mark of the frame region, the frame's final size
    pub fn frame_size(&self) -> usize {
        self.max_offset
    }

    /// The next free frame offset
    pub fn free_offset(&self) -> usize {
        self.offset
    }

    /// Temporarily move the free offset (used by call lowering to
    /// align the return destination; the caller restores it).
    pub fn set_free_offset(&mut self, offset: usize) {
        self.offset = offset;
        self.max_offset = self.max_offset.max(offset);
    }

    pub fn align_free_offset(&mut self, alignment: usize) {
        self.set_free_offset(align_up(self.offset, alignment));
    }

    pub fn get(&self, index: usize) -> Result<&Entry, CodegenError> {
        self.entries.get(index).ok_or_else(underflow)
    }

    pub fn top(&self) -> Result<&Entry, CodegenError> {
        self.entries.last().ok_or_else(underflow)
    }

    fn layout(&self, slot: Slot) -> (usize, usize) {
        match slot {
            Slot::Value(ty) => (size_of(self.arena, ty), align_of(self.arena, ty)),
            Slot::Address(_) => (8, 8),
        }
    }

    /// Allocate the next aligned frame slot for `slot` and push it.
    pub fn push(&mut self, slot: Slot) -> &Entry {
        let (size, alignment) = self.layout(slot);
        if size == 0 {
            self.entries.push(Entry {
                slot,
                region: Region::Frame,
                offset: self.offset,
                size: 0,
                alignment: 0,
                members: Vec::new(),
                refers_to: None,
            });
            return &self.entries[self.entries.len() - 1];
        }

        self.offset = align_up(self.offset, alignment);
        let offset = self.offset;
        let members = self.lay_out_members(slot, Region::Frame);
        self.offset = align_up(self.offset, alignment);
        self.max_offset = self.max_offset.max(self.offset);

        self.entries.push(Entry {
            slot,
            region: Region::Frame,
            offset,
            size,
            alignment,
            members,
            refers_to: None,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Declare the next parameter slot. Parameters pack into the
    /// caller's block with the same alignment rules as the frame, but
    /// their cursor only ever advances.
    pub fn parameter(&mut self, ty: TypeId) -> &Entry {
        let slot = Slot::Value(ty);
        let (size, alignment) = self.layout(slot);
        self.parameter_offset = align_up(self.parameter_offset, alignment);
        let offset = self.parameter_offset;
        let members = self.lay_out_members(slot, Region::Parameter);
        self.parameter_offset = align_up(self.parameter_offset, alignment);

        self.entries.push(Entry {
            slot,
            region: Region::Parameter,
            offset,
            size,
            alignment,
            members,
            refers_to: None,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Advance the active cursor over `slot`'s storage, recording each
    /// aggregate member's own aligned offset along the way.
    fn lay_out_members(&mut self, slot: Slot, region: Region) -> Vec<Member> {
        let arena = self.arena;
        let cursor = match region {
            Region::Frame => &mut self.offset,
            Region::Parameter => &mut self.parameter_offset,
        };
        let member_types = match slot {
            Slot::Value(ty) => arena.member_types(ty),
            Slot::Address(_) => None,
        };
        let Some(member_types) = member_types else {
            *cursor += match slot {
                Slot::Value(ty) => size_of(arena, ty),
                Slot::Address(_) => 8,
            };
            return Vec::new();
        };

        let start = *cursor;
        let mut members = Vec::new();
        for ty in member_types {
            let size = size_of(arena, ty);
            let alignment = align_of(arena, ty);
            *cursor = align_up(*cursor, alignment);
            members.push(Member {
                ty,
                relative: *cursor - start,
                offset: *cursor,
                size,
            });
            *cursor += size;
        }
        members
    }

    /// Push an address of the entry at `index`.
    pub fn refer(&mut self, index: usize) -> Result<&Entry, CodegenError> {
        let pointee = match self.get(index)?.slot {
            Slot::Value(ty) => ty,
            Slot::Address(_) => {
                return Err(CodegenError::Unsupported {
                    detail: "reference to an address entry".to_string(),
                })
            }
        };
        self.push(Slot::Address(pointee));
        let last = self.entries.len() - 1;
        self.entries[last].refers_to = Some(index);
        Ok(&self.entries[last])
    }

    /// Remove and return the top entry, rewinding the free offset to
    /// just past the new top. Parameter entries below do not give
    /// their storage back.
    pub fn pop(&mut self) -> Result<Entry, CodegenError> {
        let entry = self.entries.pop().ok_or_else(underflow)?;
        self.offset = match self.entries.last() {
            Some(top) if top.region == Region::Frame => top.offset + top.size,
            _ => 0,
        };
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Symbol, Visibility};
    use crate::sema::type_arena::ObjectMember;

    fn point(arena: &mut TypeArena) -> TypeId {
        let members = vec![
            ObjectMember {
                visibility: Visibility::Public,
                name: Symbol(0),
                ty: TypeId::U8,
            },
            ObjectMember {
                visibility: Visibility::Public,
                name: Symbol(1),
                ty: TypeId::U64,
            },
        ];
        arena.object(members)
    }

    #[test]
    fn primitive_sizes() {
        let arena = TypeArena::new();
        assert_eq!(size_of(&arena, TypeId::U8), 1);
        assert_eq!(size_of(&arena, TypeId::S32), 4);
        assert_eq!(size_of(&arena, TypeId::F64), 8);
        assert_eq!(size_of(&arena, TypeId::BOOL), 1);
        assert_eq!(size_of(&arena, TypeId::USZ), 8);
        assert_eq!(size_of(&arena, TypeId::NONE), 0);
        assert_eq!(size_of(&arena, TypeId::NEVER), 0);
    }

    #[test]
    fn pointers_and_functions_are_word_sized() {
        let mut arena = TypeArena::new();
        let ptr = arena.pointer(TypeId::U8);
        let f = arena.function(vec![TypeId::U8], TypeId::NONE);
        assert_eq!(size_of(&arena, ptr), 8);
        assert_eq!(align_of(&arena, ptr), 8);
        assert_eq!(size_of(&arena, f), 8);
    }

    #[test]
    fn aggregate_size_is_a_multiple_of_alignment() {
        let mut arena = TypeArena::new();
        let object = point(&mut arena);
        // u8 at 0, padding to 8, u64 at 8
        assert_eq!(size_of(&arena, object), 16);
        assert_eq!(align_of(&arena, object), 8);
        assert_eq!(size_of(&arena, object) % align_of(&arena, object), 0);

        let tuple = arena.tuple(vec![TypeId::U16, TypeId::U8, TypeId::U32]);
        assert_eq!(align_of(&arena, tuple), 4);
        assert_eq!(size_of(&arena, tuple) % align_of(&arena, tuple), 0);
    }

    #[test]
    fn aggregate_alignment_is_max_member_alignment() {
        let mut arena = TypeArena::new();
        let tuple = arena.tuple(vec![TypeId::U8, TypeId::U32, TypeId::U16]);
        assert_eq!(align_of(&arena, tuple), 4);
    }

    #[test]
    fn empty_aggregates_are_zero_sized() {
        let mut arena = TypeArena::new();
        let empty = arena.tuple(Vec::<TypeId>::new());
        assert_eq!(size_of(&arena, empty), 0);
        assert_eq!(align_of(&arena, empty), 0);
    }

    #[test]
    fn balanced_pushes_and_pops_restore_the_free_offset() {
        let arena = TypeArena::new();
        let mut stack = Stack::new(&arena);
        stack.push(Slot::Value(TypeId::U64));
        let before = stack.free_offset();

        stack.push(Slot::Value(TypeId::U8));
        stack.push(Slot::Value(TypeId::U64));
        stack.push(Slot::Value(TypeId::U32));
        stack.pop().unwrap();
        stack.pop().unwrap();
        stack.pop().unwrap();

        assert_eq!(stack.free_offset(), before);
    }

    #[test]
    fn pushes_respect_alignment() {
        let arena = TypeArena::new();
        let mut stack = Stack::new(&arena);
        stack.push(Slot::Value(TypeId::U8));
        let entry = stack.push(Slot::Value(TypeId::U64));
        assert_eq!(entry.offset, 8);
        assert_eq!(entry.operand(), "[rsp + 8]");
    }

    #[test]
    fn parameter_storage_is_never_reclaimed() {
        let arena = TypeArena::new();
        let mut stack = Stack::new(&arena);
        let entry = stack.parameter(TypeId::U64);
        assert_eq!(entry.region, Region::Parameter);
        assert_eq!(entry.operand(), "[r10 + 0]");
        stack.push(Slot::Value(TypeId::U32));
        stack.pop().unwrap();
        // rewinds to zero, not into the parameter block
        assert_eq!(stack.free_offset(), 0);
        let second = stack.parameter(TypeId::U8);
        assert_eq!(second.offset, 8);
    }

    #[test]
    fn aggregate_members_get_their_own_offsets() {
        let mut arena = TypeArena::new();
        let object = point(&mut arena);
        let mut stack = Stack::new(&arena);
        stack.push(Slot::Value(TypeId::U32));
        let entry = stack.push(Slot::Value(object)).clone();
        assert_eq!(entry.offset, 8);
        assert_eq!(entry.members.len(), 2);
        assert_eq!(entry.members[0].relative, 0);
        assert_eq!(entry.members[1].relative, 8);
        assert_eq!(entry.member_operand(1).unwrap(), "[rsp + 16]");
    }

    #[test]
    fn references_track_their_slot() {
        let arena = TypeArena::new();
        let mut stack = Stack::new(&arena);
        stack.push(Slot::Value(TypeId::U64));
        let entry = stack.refer(0).unwrap();
        assert_eq!(entry.refers_to, Some(0));
        assert_eq!(entry.slot, Slot::Address(TypeId::U64));
        assert_eq!(entry.size, 8);
    }

    #[test]
    fn zero_sized_pushes_take_no_storage() {
        let arena = TypeArena::new();
        let mut stack = Stack::new(&arena);
        stack.push(Slot::Value(TypeId::U64));
        let before = stack.free_offset();
        let entry = stack.push(Slot::Value(TypeId::NEVER));
        assert!(entry.is_placeholder());
        assert_eq!(stack.free_offset(), before);
        stack.pop().unwrap();
        assert_eq!(stack.free_offset(), before);
    }

    #[test]
    fn pop_on_empty_stack_is_an_error() {
        let arena = TypeArena::new();
        let mut stack = Stack::new(&arena);
        assert!(stack.pop().is_err());
    }
}
