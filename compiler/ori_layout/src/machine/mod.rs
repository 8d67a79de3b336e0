//! Target machine parameters.
//!
//! Everything the layout pass needs to know about the target: pointer width,
//! register width, the largest addressable object, and the runtime header
//! sizes for strings and slices that follow from those.

use std::fmt;

use thiserror::Error;

/// Largest object on 64-bit targets (1 << 50 bytes).
const MAX_WIDTH_64: i64 = 1 << 50;

/// Largest object on 32-bit targets.
const MAX_WIDTH_32: i64 = (1 << 32) - 1;

/// Error type for machine parameter construction.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum MachineError {
    #[error("invalid pointer width {0}: expected 4 or 8")]
    InvalidPointerWidth(u8),

    #[error("invalid register width {0}: expected 4 or 8")]
    InvalidRegisterWidth(u8),

    #[error("register width {reg} is narrower than pointer width {ptr}")]
    RegisterNarrowerThanPointer { ptr: u8, reg: u8 },

    #[error("invalid maximum object width {0}: must be positive")]
    InvalidMaxWidth(i64),

    #[error("invalid target triple '{triple}': {reason}")]
    InvalidTripleFormat { triple: String, reason: String },

    #[error("unsupported target architecture '{arch}' in '{triple}'")]
    UnsupportedTarget { triple: String, arch: String },
}

/// Validated target parameters.
///
/// Construct with [`Machine::new`] or [`Machine::from_triple`]; the fields are
/// read-only afterwards.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Machine {
    ptr_width: u8,
    reg_width: u8,
    max_width: i64,
    sizeof_slice: i64,
    sizeof_string: i64,
}

impl Machine {
    /// Create machine parameters from explicit widths.
    pub fn new(ptr_width: u8, reg_width: u8, max_width: i64) -> Result<Self, MachineError> {
        if !matches!(ptr_width, 4 | 8) {
            return Err(MachineError::InvalidPointerWidth(ptr_width));
        }
        if !matches!(reg_width, 4 | 8) {
            return Err(MachineError::InvalidRegisterWidth(reg_width));
        }
        if reg_width < ptr_width {
            return Err(MachineError::RegisterNarrowerThanPointer {
                ptr: ptr_width,
                reg: reg_width,
            });
        }
        if max_width <= 0 {
            return Err(MachineError::InvalidMaxWidth(max_width));
        }

        let ptr = i64::from(ptr_width);
        let reg = i64::from(reg_width);
        Ok(Machine {
            ptr_width,
            reg_width,
            max_width,
            // slice: data pointer, len, cap; string: data pointer, len
            sizeof_slice: pad(3 * ptr, reg),
            sizeof_string: pad(2 * ptr, reg),
        })
    }

    /// Machine parameters for a target triple (`<arch>-<vendor>-<os>[-<env>]`).
    pub fn from_triple(triple: &str) -> Result<Self, MachineError> {
        let parts: Vec<&str> = triple.split('-').collect();
        if parts.len() < 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(MachineError::InvalidTripleFormat {
                triple: triple.to_string(),
                reason: "expected at least 3 components: <arch>-<vendor>-<os>".to_string(),
            });
        }

        let arch = parts[0];
        let env = parts.get(3).copied();

        match arch {
            "x86_64" if env == Some("gnux32") => Self::new(4, 8, MAX_WIDTH_64),
            "x86_64" | "aarch64" | "arm64" | "riscv64" | "riscv64gc" | "powerpc64"
            | "powerpc64le" | "s390x" | "mips64" | "mips64el" | "wasm64" => {
                Self::new(8, 8, MAX_WIDTH_64)
            }
            "i386" | "i586" | "i686" | "wasm32" | "riscv32" | "mips" | "mipsel" => {
                Self::new(4, 4, MAX_WIDTH_32)
            }
            a if a.starts_with("arm") || a.starts_with("thumb") => Self::new(4, 4, MAX_WIDTH_32),
            _ => Err(MachineError::UnsupportedTarget {
                triple: triple.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Default 64-bit target (8-byte pointers and registers).
    pub fn amd64() -> Self {
        Machine {
            ptr_width: 8,
            reg_width: 8,
            max_width: MAX_WIDTH_64,
            sizeof_slice: 24,
            sizeof_string: 16,
        }
    }

    /// Pointer width in bytes.
    #[inline]
    pub fn ptr_width(&self) -> i64 {
        i64::from(self.ptr_width)
    }

    /// Register width in bytes.
    #[inline]
    pub fn reg_width(&self) -> i64 {
        i64::from(self.reg_width)
    }

    /// Largest addressable object, in bytes.
    #[inline]
    pub fn max_width(&self) -> i64 {
        self.max_width
    }

    /// Size of a slice header.
    #[inline]
    pub fn sizeof_slice(&self) -> i64 {
        self.sizeof_slice
    }

    /// Size of a string header.
    #[inline]
    pub fn sizeof_string(&self) -> i64 {
        self.sizeof_string
    }

    /// Whether pointers are 4 bytes wide.
    #[inline]
    pub fn is_32bit(&self) -> bool {
        self.ptr_width == 4
    }

    #[inline]
    pub(crate) fn ptr_align(&self) -> u8 {
        self.ptr_width
    }

    #[inline]
    pub(crate) fn reg_align(&self) -> u8 {
        self.reg_width
    }

    /// Alignment of the pointer-sized integer kinds (`int`, `uint`, `uintptr`).
    #[inline]
    pub(crate) fn int_align(&self) -> u8 {
        if self.ptr_width == 8 {
            self.reg_width
        } else {
            4
        }
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Machine(ptr={}, reg={}, max={:#x})",
            self.ptr_width, self.reg_width, self.max_width
        )
    }
}

/// Round `o` up to a power-of-two `r`. Inputs are already validated.
const fn pad(o: i64, r: i64) -> i64 {
    (o + r - 1) & !(r - 1)
}
