//! Diagnostic system for the layout pass.
//!
//! - Error codes for searchability
//! - Clear messages (what went wrong)
//! - Primary position (where it went wrong)
//! - Notes (context)
//!
//! Diagnostics never abort anything by themselves. They are collected in a
//! [`DiagnosticQueue`] and the driver decides when to stop, typically once
//! [`DiagnosticQueue::limit_reached`] reports true.

mod diagnostic;
mod error_code;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
