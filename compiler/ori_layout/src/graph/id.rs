//! Type handle.
//!
//! Types live in the [`TypeGraph`](super::TypeGraph) arena and are referenced
//! by a 32-bit index. Primitive kinds are pre-interned at fixed indices so
//! callers can name them without a graph lookup.

use std::fmt;

/// A 32-bit index into the type graph.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // === Primitive Types (indices 0-17) ===

    pub const BOOL: Self = Self(0);
    pub const INT8: Self = Self(1);
    pub const INT16: Self = Self(2);
    pub const INT32: Self = Self(3);
    pub const INT64: Self = Self(4);
    pub const UINT8: Self = Self(5);
    pub const UINT16: Self = Self(6);
    pub const UINT32: Self = Self(7);
    pub const UINT64: Self = Self(8);
    /// Pointer-sized signed integer.
    pub const INT: Self = Self(9);
    /// Pointer-sized unsigned integer.
    pub const UINT: Self = Self(10);
    pub const UINTPTR: Self = Self(11);
    pub const FLOAT32: Self = Self(12);
    pub const FLOAT64: Self = Self(13);
    pub const COMPLEX64: Self = Self(14);
    pub const COMPLEX128: Self = Self(15);
    pub const STRING: Self = Self(16);
    pub const UNSAFE_POINTER: Self = Self(17);

    /// Number of pre-interned primitive types.
    pub const PRIMITIVE_COUNT: u32 = 18;

    /// Create an index from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is a pre-interned primitive.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

ori_ir::static_assert_size!(TypeId, 4);
