// src/sema/type_arena.rs
//
// Interned type system using TypeId handles for O(1) equality.
//
// This module provides the canonical type representation for Spinel's
// semantic analysis:
// - TypeId: u32 handle to an arena slot (Copy, trivial Eq/Hash)
// - TypeArena: per-compilation storage with structural deduplication
// - TypeKind: the shape of a type, using TypeId for child types
//
// Most constructors intern: structurally identical function, pointer,
// object, and tuple types always come back as the same TypeId, so the
// generator compares types by handle equality alone. Three constructors
// deliberately do NOT intern and mint a fresh slot every call:
// - reference(): lvalue markers, compared by identity like the values
//   they stand for
// - module(): module aliases never participate in conversions
// - def(): a user type alias keeps the source shape but gets its own
//   identity and display name

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::frontend::ast::{Symbol, Visibility};
use crate::frontend::Interner;

/// Handle to an interned type in the TypeArena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(u32);

impl TypeId {
    // Reserved TypeIds for the builtin primitives. These are guaranteed
    // to be interned at these indices by TypeArena::new().
    pub const U8: TypeId = TypeId(0);
    pub const U16: TypeId = TypeId(1);
    pub const U32: TypeId = TypeId(2);
    pub const U64: TypeId = TypeId(3);
    pub const USZ: TypeId = TypeId(4);
    pub const S8: TypeId = TypeId(5);
    pub const S16: TypeId = TypeId(6);
    pub const S32: TypeId = TypeId(7);
    pub const S64: TypeId = TypeId(8);
    pub const SSZ: TypeId = TypeId(9);
    pub const F32: TypeId = TypeId(10);
    pub const F64: TypeId = TypeId(11);
    pub const BOOL: TypeId = TypeId(12);
    pub const NONE: TypeId = TypeId(13);
    pub const NEVER: TypeId = TypeId(14);

    /// First non-reserved TypeId index
    pub const FIRST_DYNAMIC: u32 = 15;

    /// Get the raw index (for debugging)
    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_DYNAMIC
    }
}

/// SmallVec for type children - inline up to 4 (covers most signatures
/// and tuples)
pub type TypeIdVec = SmallVec<[TypeId; 4]>;

/// SmallVec for object members
pub type ObjectMemberVec = SmallVec<[ObjectMember; 4]>;

/// One field of a structural object type. Visibility is part of the
/// type's identity: `{public x: u64}` and `{private x: u64}` are
/// different types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectMember {
    pub visibility: Visibility,
    pub name: Symbol,
    pub ty: TypeId,
}

/// The shape of a type. This is the interning key: two types with equal
/// kinds are the same type (except for the non-interned constructors,
/// which bypass the dedup map).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Zero-size unit type
    None,
    /// Uninhabited type for non-returning calls; also zero-size
    Never,
    /// Fixed-width integer: u8..u64, s8..s64
    Integer { signed: bool, bits: u8 },
    /// Pointer-width integer: usz / ssz
    Size { signed: bool },
    /// Floating point: f32 / f64
    Scalar { bits: u8 },
    Bool,
    /// Callable signature
    Function { inputs: TypeIdVec, output: TypeId },
    /// Explicit pointer, distinct from Reference
    Pointer { pointee: TypeId },
    /// Structural object; field order, names, types, and visibilities
    /// all participate in identity
    Object { members: ObjectMemberVec },
    Tuple { members: TypeIdVec },
    /// Address of an lvalue, produced only by the generator and
    /// consumed automatically on read
    Reference { referee: TypeId },
    /// Alias for a loaded module's export set; not a runtime value
    Module { index: usize },
}

/// A stored type: its shape plus an optional display name. Named types
/// come from `def` and print as their alias instead of their shape.
#[derive(Debug, Clone)]
pub struct TypeData {
    pub kind: TypeKind,
    pub name: Option<Symbol>,
}

/// Pre-interned builtin types for O(1) access
#[derive(Debug, Clone, Copy)]
pub struct Primitives {
    pub u8: TypeId,
    pub u16: TypeId,
    pub u32: TypeId,
    pub u64: TypeId,
    pub usz: TypeId,
    pub s8: TypeId,
    pub s16: TypeId,
    pub s32: TypeId,
    pub s64: TypeId,
    pub ssz: TypeId,
    pub f32: TypeId,
    pub f64: TypeId,
    pub bool: TypeId,
    pub none: TypeId,
    pub never: TypeId,
}

/// Per-compilation type arena with structural interning.
pub struct TypeArena {
    /// Stored types, indexed by TypeId
    types: Vec<TypeData>,
    /// Deduplication map for the interning constructors
    intern_map: HashMap<TypeKind, TypeId>,
    /// Pre-interned builtins
    pub primitives: Primitives,
}

impl std::fmt::Debug for TypeArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeArena")
            .field("types_count", &self.types.len())
            .finish_non_exhaustive()
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    /// Create a new TypeArena with the builtin types pre-interned
    pub fn new() -> Self {
        let placeholder = TypeId(0);
        let mut arena = Self {
            types: Vec::new(),
            intern_map: HashMap::new(),
            primitives: Primitives {
                u8: placeholder,
                u16: placeholder,
                u32: placeholder,
                u64: placeholder,
                usz: placeholder,
                s8: placeholder,
                s16: placeholder,
                s32: placeholder,
                s64: placeholder,
                ssz: placeholder,
                f32: placeholder,
                f64: placeholder,
                bool: placeholder,
                none: placeholder,
                never: placeholder,
            },
        };

        // Pre-intern the builtins in the order defined by the TypeId
        // constants. The debug_asserts verify the constants match the
        // actual interned indices.
        arena.primitives.u8 = arena.intern(TypeKind::Integer {
            signed: false,
            bits: 8,
        });
        debug_assert_eq!(arena.primitives.u8, TypeId::U8);
        arena.primitives.u16 = arena.intern(TypeKind::Integer {
            signed: false,
            bits: 16,
        });
        debug_assert_eq!(arena.primitives.u16, TypeId::U16);
        arena.primitives.u32 = arena.intern(TypeKind::Integer {
            signed: false,
            bits: 32,
        });
        debug_assert_eq!(arena.primitives.u32, TypeId::U32);
        arena.primitives.u64 = arena.intern(TypeKind::Integer {
            signed: false,
            bits: 64,
        });
        debug_assert_eq!(arena.primitives.u64, TypeId::U64);
        arena.primitives.usz = arena.intern(TypeKind::Size { signed: false });
        debug_assert_eq!(arena.primitives.usz, TypeId::USZ);

        arena.primitives.s8 = arena.intern(TypeKind::Integer {
            signed: true,
            bits: 8,
        });
        debug_assert_eq!(arena.primitives.s8, TypeId::S8);
        arena.primitives.s16 = arena.intern(TypeKind::Integer {
            signed: true,
            bits: 16,
        });
        debug_assert_eq!(arena.primitives.s16, TypeId::S16);
        arena.primitives.s32 = arena.intern(TypeKind::Integer {
            signed: true,
            bits: 32,
        });
        debug_assert_eq!(arena.primitives.s32, TypeId::S32);
        arena.primitives.s64 = arena.intern(TypeKind::Integer {
            signed: true,
            bits: 64,
        });
        debug_assert_eq!(arena.primitives.s64, TypeId::S64);
        arena.primitives.ssz = arena.intern(TypeKind::Size { signed: true });
        debug_assert_eq!(arena.primitives.ssz, TypeId::SSZ);

        arena.primitives.f32 = arena.intern(TypeKind::Scalar { bits: 32 });
        debug_assert_eq!(arena.primitives.f32, TypeId::F32);
        arena.primitives.f64 = arena.intern(TypeKind::Scalar { bits: 64 });
        debug_assert_eq!(arena.primitives.f64, TypeId::F64);

        arena.primitives.bool = arena.intern(TypeKind::Bool);
        debug_assert_eq!(arena.primitives.bool, TypeId::BOOL);
        arena.primitives.none = arena.intern(TypeKind::None);
        debug_assert_eq!(arena.primitives.none, TypeId::NONE);
        arena.primitives.never = arena.intern(TypeKind::Never);
        debug_assert_eq!(arena.primitives.never, TypeId::NEVER);

        arena
    }

    /// Intern a kind, returning the existing TypeId if already present
    fn intern(&mut self, kind: TypeKind) -> TypeId {
        let next_id = TypeId(self.types.len() as u32);
        *self.intern_map.entry(kind.clone()).or_insert_with(|| {
            self.types.push(TypeData { kind, name: None });
            next_id
        })
    }

    /// Mint a fresh, never-deduplicated slot
    fn fresh(&mut self, kind: TypeKind, name: Option<Symbol>) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeData { kind, name });
        id
    }

    /// Get the stored data for a TypeId
    pub fn get(&self, id: TypeId) -> &TypeData {
        &self.types[id.0 as usize]
    }

    /// Get the shape of a TypeId
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.get(id).kind
    }

    // Builtin accessors

    pub fn u8(&self) -> TypeId {
        self.primitives.u8
    }
    pub fn u16(&self) -> TypeId {
        self.primitives.u16
    }
    pub fn u32(&self) -> TypeId {
        self.primitives.u32
    }
    pub fn u64(&self) -> TypeId {
        self.primitives.u64
    }
    pub fn usz(&self) -> TypeId {
        self.primitives.usz
    }
    pub fn s8(&self) -> TypeId {
        self.primitives.s8
    }
    pub fn s16(&self) -> TypeId {
        self.primitives.s16
    }
    pub fn s32(&self) -> TypeId {
        self.primitives.s32
    }
    pub fn s64(&self) -> TypeId {
        self.primitives.s64
    }
    pub fn ssz(&self) -> TypeId {
        self.primitives.ssz
    }
    pub fn f32(&self) -> TypeId {
        self.primitives.f32
    }
    pub fn f64(&self) -> TypeId {
        self.primitives.f64
    }
    pub fn bool(&self) -> TypeId {
        self.primitives.bool
    }
    pub fn none(&self) -> TypeId {
        self.primitives.none
    }
    pub fn never(&self) -> TypeId {
        self.primitives.never
    }

    // Compound type builders - interned on construction

    /// Create a function type from its signature
    pub fn function(&mut self, inputs: impl Into<TypeIdVec>, output: TypeId) -> TypeId {
        self.intern(TypeKind::Function {
            inputs: inputs.into(),
            output,
        })
    }

    /// Create a pointer type
    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeKind::Pointer { pointee })
    }

    /// Create a structural object type
    pub fn object(&mut self, members: impl Into<ObjectMemberVec>) -> TypeId {
        self.intern(TypeKind::Object {
            members: members.into(),
        })
    }

    /// Create a tuple type
    pub fn tuple(&mut self, members: impl Into<TypeIdVec>) -> TypeId {
        self.intern(TypeKind::Tuple {
            members: members.into(),
        })
    }

    /// Create an array type: sugar for `{readonly data: ptr[T],
    /// readonly length: usz}`
    pub fn array(&mut self, element: TypeId, interner: &mut Interner) -> TypeId {
        let data = interner.intern("data");
        let length = interner.intern("length");
        let pointer = self.pointer(element);
        let usz = self.usz();
        self.object(vec![
            ObjectMember {
                visibility: Visibility::Readonly,
                name: data,
                ty: pointer,
            },
            ObjectMember {
                visibility: Visibility::Readonly,
                name: length,
                ty: usz,
            },
        ])
    }

    // Identity-bearing builders - a fresh slot every call

    /// Create a reference to an lvalue's type. References are compared
    /// by identity, so every call returns a distinct TypeId.
    pub fn reference(&mut self, referee: TypeId) -> TypeId {
        self.fresh(TypeKind::Reference { referee }, None)
    }

    /// Create an alias type for a loaded module
    pub fn module(&mut self, index: usize) -> TypeId {
        self.fresh(TypeKind::Module { index }, None)
    }

    /// Clone a type's shape under a new display name with a new
    /// identity. This is what a user type alias produces: it converts
    /// to and from its source shape but is not the same type.
    pub fn def(&mut self, source: TypeId, name: Symbol) -> TypeId {
        let kind = self.get(source).kind.clone();
        self.fresh(kind, Some(name))
    }

    // Classification queries. These look through to the shape, so a
    // def'd integer is still integral.

    pub fn is_integral(&self, id: TypeId) -> bool {
        matches!(
            self.kind(id),
            TypeKind::Integer { .. } | TypeKind::Size { .. }
        )
    }

    pub fn is_scalar(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Scalar { .. })
    }

    pub fn is_arithmetic(&self, id: TypeId) -> bool {
        self.is_integral(id) || self.is_scalar(id)
    }

    pub fn is_signed(&self, id: TypeId) -> bool {
        matches!(
            self.kind(id),
            TypeKind::Integer { signed: true, .. } | TypeKind::Size { signed: true }
        )
    }

    pub fn is_callable(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Function { .. })
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Pointer { .. })
    }

    pub fn is_object(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Object { .. })
    }

    pub fn is_tuple(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Tuple { .. })
    }

    pub fn is_reference(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Reference { .. })
    }

    pub fn is_module(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Module { .. })
    }

    // Shape accessors

    /// The referee of a reference type
    pub fn referee(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Reference { referee } => Some(*referee),
            _ => None,
        }
    }

    /// The pointee of a pointer type
    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id) {
            TypeKind::Pointer { pointee } => Some(*pointee),
            _ => None,
        }
    }

    /// The inputs and output of a callable type
    pub fn signature(&self, id: TypeId) -> Option<(TypeIdVec, TypeId)> {
        match self.kind(id) {
            TypeKind::Function { inputs, output } => Some((inputs.clone(), *output)),
            _ => None,
        }
    }

    /// The fields of an object type
    pub fn object_members(&self, id: TypeId) -> Option<ObjectMemberVec> {
        match self.kind(id) {
            TypeKind::Object { members } => Some(members.clone()),
            _ => None,
        }
    }

    /// The elements of a tuple type
    pub fn tuple_members(&self, id: TypeId) -> Option<TypeIdVec> {
        match self.kind(id) {
            TypeKind::Tuple { members } => Some(members.clone()),
            _ => None,
        }
    }

    /// Positional member types of either aggregate kind
    pub fn member_types(&self, id: TypeId) -> Option<TypeIdVec> {
        match self.kind(id) {
            TypeKind::Object { members } => Some(members.iter().map(|m| m.ty).collect()),
            TypeKind::Tuple { members } => Some(members.clone()),
            _ => None,
        }
    }

    /// The loaded-module index behind a module alias
    pub fn module_of(&self, id: TypeId) -> Option<usize> {
        match self.kind(id) {
            TypeKind::Module { index } => Some(*index),
            _ => None,
        }
    }

    /// Whether any field of an object type is private
    pub fn has_private_member(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::Object { members } => members
                .iter()
                .any(|m| m.visibility == Visibility::Private),
            _ => false,
        }
    }

    /// Render a type for diagnostics. Named types print their alias;
    /// everything else prints its shape.
    pub fn display(&self, id: TypeId, interner: &Interner) -> String {
        let data = self.get(id);
        if let Some(name) = data.name {
            return interner.resolve(name).to_string();
        }
        match &data.kind {
            TypeKind::None => "none".to_string(),
            TypeKind::Never => "never".to_string(),
            TypeKind::Integer { signed, bits } => {
                format!("{}{}", if *signed { "s" } else { "u" }, bits)
            }
            TypeKind::Size { signed } => if *signed { "ssz" } else { "usz" }.to_string(),
            TypeKind::Scalar { bits } => format!("f{}", bits),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Function { inputs, output } => {
                let inputs = inputs
                    .iter()
                    .map(|&input| self.display(input, interner))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({}) => {}", inputs, self.display(*output, interner))
            }
            TypeKind::Pointer { pointee } => {
                format!("ptr[{}]", self.display(*pointee, interner))
            }
            TypeKind::Object { members } => {
                let members = members
                    .iter()
                    .map(|member| {
                        format!(
                            "{} {}: {}",
                            member.visibility.as_str(),
                            interner.resolve(member.name),
                            self.display(member.ty, interner)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", members)
            }
            TypeKind::Tuple { members } => {
                let members = members
                    .iter()
                    .map(|&member| self.display(member, interner))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{}]", members)
            }
            TypeKind::Reference { referee } => {
                format!("reference to {}", self.display(*referee, interner))
            }
            TypeKind::Module { .. } => "module alias".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(
        interner: &mut Interner,
        visibility: Visibility,
        name: &str,
        ty: TypeId,
    ) -> ObjectMember {
        ObjectMember {
            visibility,
            name: interner.intern(name),
            ty,
        }
    }

    #[test]
    fn builtins_land_on_reserved_ids() {
        let arena = TypeArena::new();
        assert_eq!(arena.u8(), TypeId::U8);
        assert_eq!(arena.ssz(), TypeId::SSZ);
        assert_eq!(arena.never(), TypeId::NEVER);
        assert!(arena.never().is_reserved());
    }

    #[test]
    fn compound_types_are_deduplicated() {
        let mut arena = TypeArena::new();
        let a = arena.function(vec![TypeId::U64, TypeId::S32], TypeId::NONE);
        let b = arena.function(vec![TypeId::U64, TypeId::S32], TypeId::NONE);
        assert_eq!(a, b);

        let p1 = arena.pointer(TypeId::U8);
        let p2 = arena.pointer(TypeId::U8);
        assert_eq!(p1, p2);

        let t1 = arena.tuple(vec![TypeId::U64, TypeId::F32]);
        let t2 = arena.tuple(vec![TypeId::U64, TypeId::F32]);
        assert_eq!(t1, t2);
        assert_ne!(t1, p1);
    }

    #[test]
    fn object_identity_includes_order_and_visibility() {
        let mut arena = TypeArena::new();
        let mut interner = Interner::new();

        let xy = arena.object(vec![
            member(&mut interner, Visibility::Public, "x", TypeId::U64),
            member(&mut interner, Visibility::Public, "y", TypeId::U64),
        ]);
        let xy_again = arena.object(vec![
            member(&mut interner, Visibility::Public, "x", TypeId::U64),
            member(&mut interner, Visibility::Public, "y", TypeId::U64),
        ]);
        let yx = arena.object(vec![
            member(&mut interner, Visibility::Public, "y", TypeId::U64),
            member(&mut interner, Visibility::Public, "x", TypeId::U64),
        ]);
        let hidden = arena.object(vec![
            member(&mut interner, Visibility::Private, "x", TypeId::U64),
            member(&mut interner, Visibility::Public, "y", TypeId::U64),
        ]);

        assert_eq!(xy, xy_again);
        assert_ne!(xy, yx);
        assert_ne!(xy, hidden);
        assert!(arena.has_private_member(hidden));
        assert!(!arena.has_private_member(xy));
    }

    #[test]
    fn references_are_never_deduplicated() {
        let mut arena = TypeArena::new();
        let a = arena.reference(TypeId::U64);
        let b = arena.reference(TypeId::U64);
        assert_ne!(a, b);
        assert_eq!(arena.referee(a), Some(TypeId::U64));
        assert!(arena.is_reference(b));
    }

    #[test]
    fn def_clones_shape_under_new_identity() {
        let mut arena = TypeArena::new();
        let mut interner = Interner::new();
        let name = interner.intern("offset");

        let alias = arena.def(TypeId::S64, name);
        assert_ne!(alias, TypeId::S64);
        assert!(arena.is_integral(alias));
        assert!(arena.is_signed(alias));
        assert_eq!(arena.display(alias, &interner), "offset");

        // A later s64 lookup still finds the primitive, not the alias
        let plain = arena.intern(TypeKind::Integer {
            signed: true,
            bits: 64,
        });
        assert_eq!(plain, TypeId::S64);
    }

    #[test]
    fn array_is_object_sugar() {
        let mut arena = TypeArena::new();
        let mut interner = Interner::new();

        let bytes = arena.array(TypeId::U8, &mut interner);
        assert!(arena.is_object(bytes));
        assert_eq!(
            arena.display(bytes, &interner),
            "{readonly data: ptr[u8], readonly length: usz}"
        );
    }

    #[test]
    fn display_formats() {
        let mut arena = TypeArena::new();
        let mut interner = Interner::new();

        assert_eq!(arena.display(TypeId::U8, &interner), "u8");
        assert_eq!(arena.display(TypeId::S64, &interner), "s64");
        assert_eq!(arena.display(TypeId::USZ, &interner), "usz");
        assert_eq!(arena.display(TypeId::F32, &interner), "f32");
        assert_eq!(arena.display(TypeId::NONE, &interner), "none");

        let f = arena.function(vec![TypeId::U64, TypeId::S32], TypeId::NONE);
        assert_eq!(arena.display(f, &interner), "(u64, s32) => none");

        let p = arena.pointer(TypeId::U64);
        assert_eq!(arena.display(p, &interner), "ptr[u64]");

        let t = arena.tuple(vec![TypeId::U64, TypeId::F32]);
        assert_eq!(arena.display(t, &interner), "[u64, f32]");

        let r = arena.reference(TypeId::U64);
        assert_eq!(arena.display(r, &interner), "reference to u64");

        let o = arena.object(vec![
            member(&mut interner, Visibility::Public, "x", TypeId::U64),
            member(&mut interner, Visibility::Private, "y", TypeId::F64),
        ]);
        assert_eq!(arena.display(o, &interner), "{public x: u64, private y: f64}");

        let m = arena.module(0);
        assert_eq!(arena.display(m, &interner), "module alias");
    }

    #[test]
    fn signature_round_trips() {
        let mut arena = TypeArena::new();
        let f = arena.function(vec![TypeId::U64], TypeId::S32);
        let (inputs, output) = arena.signature(f).unwrap();
        assert_eq!(inputs.as_slice(), &[TypeId::U64]);
        assert_eq!(output, TypeId::S32);
        assert!(arena.signature(TypeId::U64).is_none());
    }
}
