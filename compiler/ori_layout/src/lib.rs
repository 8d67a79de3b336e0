//! Ori Layout - type sizes, alignments and offsets.
//!
//! Computes the in-memory width and alignment of every type reachable from a
//! set of roots, assigns struct field offsets and interface method slots, and
//! reports invalid recursive type declarations.
//!
//! # Architecture
//!
//! - [`TypeGraph`]: arena of type nodes addressed by [`TypeId`]
//! - [`Machine`]: target pointer width, register width and object size limit
//! - [`LayoutEngine`]: the one mutable context that owns the graph, the
//!   deferred work-list and the diagnostic sink while layout runs
//!
//! # Error Handling
//!
//! Problems in the user's program become [`ori_diagnostic::Diagnostic`]s and
//! layout continues with a placeholder width. Problems that can only come from
//! a compiler defect are returned as [`LayoutError`].
//!
//! # Tracing
//!
//! Enable with `RUST_LOG=ori_layout=debug` (or `trace`) after calling
//! [`init_tracing`].

mod error;
pub mod graph;
pub mod layout;
pub mod machine;

pub use error::LayoutError;
pub use graph::{ChanDir, Field, Kind, Layout, LayoutFlags, TypeGraph, TypeId, TypeSym, Width};
pub use layout::{round_up, LayoutConfig, LayoutEngine};
pub use machine::{Machine, MachineError};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=ori_layout=debug` or `RUST_LOG=ori_layout=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
