//! Type kinds and fields.
//!
//! `Kind` is closed: every variant has exactly one layout rule in the engine,
//! and adding a variant is a compile error until the rule exists.

use ori_ir::{Name, Pos};

use super::TypeId;

/// Channel direction.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ChanDir {
    #[default]
    Both,
    Recv,
    Send,
}

/// A struct field, function parameter, or interface entry.
///
/// For interfaces, an entry without a name embeds another interface. A
/// field without a type was already reported broken by an earlier phase and
/// is skipped during layout.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Field {
    pub name: Option<Name>,
    pub ty: Option<TypeId>,
    /// Byte offset (struct fields) or method slot offset (interfaces).
    pub offset: i64,
    pub pos: Pos,
    pub broken: bool,
}

impl Field {
    /// A named field.
    pub fn new(name: Name, ty: TypeId) -> Self {
        Field {
            name: Some(name),
            ty: Some(ty),
            offset: 0,
            pos: Pos::NONE,
            broken: false,
        }
    }

    /// An unnamed entry: an embedded interface, or an anonymous parameter.
    pub fn embedded(ty: TypeId) -> Self {
        Field {
            name: None,
            ty: Some(ty),
            offset: 0,
            pos: Pos::NONE,
            broken: false,
        }
    }

    /// A field whose type failed to resolve.
    pub fn untyped(name: Name) -> Self {
        Field {
            name: Some(name),
            ty: None,
            offset: 0,
            pos: Pos::NONE,
            broken: true,
        }
    }

    /// Set the declaration position.
    #[must_use]
    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }
}

/// The kind of a type node, with its kind-specific children.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Kind {
    // === Primitives ===
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int,
    Uint,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,

    // === Composites ===
    Ptr {
        elem: TypeId,
    },
    Slice {
        elem: TypeId,
    },
    Array {
        elem: TypeId,
        len: i64,
    },
    Map {
        key: TypeId,
        elem: TypeId,
    },
    Chan {
        elem: TypeId,
        dir: ChanDir,
    },
    /// `funarg` marks the receiver/parameter/result groups of a function.
    Struct {
        fields: Vec<Field>,
        funarg: bool,
    },
    Interface {
        methods: Vec<Field>,
    },
    /// Each group is a `Struct { funarg: true }` node.
    Func {
        recvs: TypeId,
        params: TypeId,
        results: TypeId,
        variadic: bool,
    },

    // === Synthetic markers ===
    /// Checks a channel's element size once the channel is laid out.
    ChanArgs {
        chan: TypeId,
    },
    /// Lays out a function's argument frame once the function is laid out.
    FuncArgs {
        func: TypeId,
    },

    /// A declared name whose definition never arrived.
    Forward,
}

impl Kind {
    /// Kind for a pre-interned primitive index, in `TypeId` order.
    pub(crate) const PRIMITIVES: [Kind; TypeId::PRIMITIVE_COUNT as usize] = [
        Kind::Bool,
        Kind::Int8,
        Kind::Int16,
        Kind::Int32,
        Kind::Int64,
        Kind::Uint8,
        Kind::Uint16,
        Kind::Uint32,
        Kind::Uint64,
        Kind::Int,
        Kind::Uint,
        Kind::Uintptr,
        Kind::Float32,
        Kind::Float64,
        Kind::Complex64,
        Kind::Complex128,
        Kind::String,
        Kind::UnsafePointer,
    ];

    /// Source spelling of a primitive kind.
    pub fn primitive_name(&self) -> Option<&'static str> {
        let name = match self {
            Kind::Bool => "bool",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Uintptr => "uintptr",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Complex64 => "complex64",
            Kind::Complex128 => "complex128",
            Kind::String => "string",
            Kind::UnsafePointer => "unsafe.Pointer",
            _ => return None,
        };
        Some(name)
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        matches!(self, Kind::Interface { .. })
    }

    #[inline]
    pub fn is_funarg_struct(&self) -> bool {
        matches!(self, Kind::Struct { funarg: true, .. })
    }
}
