//! Error codes for layout diagnostics.
//!
//! The first digit indicates the phase. Layout shares the E2xxx range with the
//! type checker since both report problems with type declarations.

use std::fmt;

/// Error codes for all layout diagnostics.
///
/// Format: E#### (errors) or W#### (warnings):
/// - E2xxx: Type declaration errors found while laying out types
/// - E9xxx: Internal compiler errors
/// - W2xxx: Type declaration warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Type Errors (E2xxx)
    /// Cyclic (invalid recursive) type definition
    E2008,
    /// Type too large (object size or address space exceeded)
    E2030,
    /// Duplicate method in interface
    E2031,
    /// Interface embeds a non-interface type
    E2032,
    /// Interface has too many methods
    E2033,
    /// Channel element type too large
    E2034,

    // Internal Errors (E9xxx)
    /// Internal compiler error
    E9001,
    /// Too many errors
    E9002,

    // Type Warnings (W2xxx)
    /// Function argument frame is not a multiple of the register width
    W2030,
}

impl ErrorCode {
    /// All error code variants, for exhaustive testing.
    pub const ALL: &[ErrorCode] = &[
        ErrorCode::E2008,
        ErrorCode::E2030,
        ErrorCode::E2031,
        ErrorCode::E2032,
        ErrorCode::E2033,
        ErrorCode::E2034,
        ErrorCode::E9001,
        ErrorCode::E9002,
        ErrorCode::W2030,
    ];

    /// Get the string representation of this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2030 => "E2030",
            ErrorCode::E2031 => "E2031",
            ErrorCode::E2032 => "E2032",
            ErrorCode::E2033 => "E2033",
            ErrorCode::E2034 => "E2034",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
            ErrorCode::W2030 => "W2030",
        }
    }

    /// Short human-readable description, used by `--explain` style listings.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E2008 => "invalid recursive type",
            ErrorCode::E2030 => "type too large",
            ErrorCode::E2031 => "duplicate method",
            ErrorCode::E2032 => "interface contains embedded non-interface",
            ErrorCode::E2033 => "interface too large",
            ErrorCode::E2034 => "channel element type too large",
            ErrorCode::E9001 => "internal compiler error",
            ErrorCode::E9002 => "too many errors",
            ErrorCode::W2030 => "misaligned argument frame",
        }
    }

    /// Check if this is an internal compiler error code.
    pub fn is_internal(&self) -> bool {
        matches!(self, ErrorCode::E9001 | ErrorCode::E9002)
    }

    /// Check if this is a warning code (W-prefix).
    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
