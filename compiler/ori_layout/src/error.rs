//! Internal consistency errors.
//!
//! These never describe a mistake in the user's program. Each one means an
//! earlier phase handed over a malformed graph or the layout pass itself has
//! a defect, so the driver should stop instead of emitting wrong layouts.

use ori_diagnostic::{Diagnostic, ErrorCode};
use ori_ir::Pos;
use thiserror::Error;

use crate::TypeId;

/// An internal compiler error raised by the layout pass.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LayoutError {
    /// Layout was requested before machine parameters were installed.
    #[error("type layout requested before machine parameters were set")]
    MachineNotSet,

    /// `set_machine` was called twice.
    #[error("machine parameters are already set")]
    MachineAlreadySet,

    /// A type without a finished layout was requested after `freeze`.
    #[error("width not calculated: {ty}")]
    Frozen { ty: String },

    /// A kind handler left the alignment implicit with an unusable width.
    #[error("invalid alignment for {ty} (width {width})")]
    InvalidAlignment { ty: String, width: i64 },

    /// A function argument struct was laid out on its own.
    #[error("function argument struct {ty} laid out outside its function")]
    FuncArgStruct { ty: String },

    /// A field's type finished computing without a usable width.
    #[error("invalid width for field of type {ty}")]
    InvalidWidth { ty: String },

    /// `round_up` was given a rounding that is not 1, 2, 4 or 8.
    #[error("bad rounding {0}")]
    BadRounding(i64),

    /// A reentrant computation found no declaration loop to report.
    #[error("failed to find type loop for: {ty}")]
    MissingTypeLoop { ty: String },

    /// A synthetic marker node refers to a type of the wrong kind.
    #[error("layout marker refers to non-matching type {ty}")]
    MalformedMarker { ty: String },

    /// `leave_nested` was called without a matching `enter_nested`.
    #[error("unbalanced deferred scope: leave without enter")]
    UnbalancedNesting,

    /// `define` was called on a type that was never declared.
    #[error("type {0:?} has no declaration")]
    NotNamed(TypeId),
}

impl LayoutError {
    /// Render this error as an internal compiler error diagnostic.
    #[cold]
    pub fn to_diagnostic(&self, pos: Pos) -> Diagnostic {
        Diagnostic::error(ErrorCode::E9001)
            .with_message(format!("internal compiler error: {self}"))
            .with_label(pos, "while laying out this type")
            .with_note("this is a bug in the compiler, not in your program")
    }
}
