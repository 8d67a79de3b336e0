//! Deferred layout requests.
//!
//! While a declaration like
//!
//! ```text
//! type T *struct { next T }
//! ```
//!
//! is still being set up, laying out the struct would run into `T` before `T`
//! is known to be a pointer. Requests made inside a nested scope are parked
//! here instead and computed, last in first out, when the outermost scope
//! closes. Draining is a loop over an explicit stack; computing one parked
//! type may park more, and those are drained before the scope returns.

use crate::graph::{LayoutFlags, TypeId};
use crate::LayoutError;

use super::LayoutEngine;

/// Parked types and the current nesting depth.
#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    stack: Vec<TypeId>,
    depth: u32,
}

impl LayoutEngine {
    /// Make sure `t` is laid out eventually.
    ///
    /// Outside any nested scope this computes `t` right away. Inside one, `t`
    /// is parked (at most once) until the outermost scope closes.
    pub fn request_lazy(&mut self, t: TypeId) -> Result<(), LayoutError> {
        // Argument groups are laid out only together with their function.
        if self.graph.kind(t).is_funarg_struct() {
            let ty = self.graph.format_type(t);
            tracing::error!(%ty, "lazy layout requested for a function argument struct");
            return Err(LayoutError::FuncArgStruct { ty });
        }

        if self.deferred.depth == 0 {
            return self.compute(t);
        }

        if !self.graph.flags(t).contains(LayoutFlags::DEFERRED) {
            self.graph.insert_flags(t, LayoutFlags::DEFERRED);
            self.deferred.stack.push(t);
        }
        Ok(())
    }

    /// Open a nested scope. Lazy requests park until the outermost scope closes.
    pub fn enter_nested(&mut self) {
        self.deferred.depth += 1;
    }

    /// Close a nested scope, draining the parked types if it was the outermost.
    pub fn leave_nested(&mut self) -> Result<(), LayoutError> {
        if self.deferred.depth == 0 {
            tracing::error!("leave_nested without enter_nested");
            return Err(LayoutError::UnbalancedNesting);
        }

        if self.deferred.depth == 1 && !self.deferred.stack.is_empty() {
            tracing::debug!(pending = self.deferred.stack.len(), "draining deferred layouts");
            while let Some(t) = self.deferred.stack.pop() {
                self.graph.remove_flags(t, LayoutFlags::DEFERRED);
                self.compute(t)?;
            }
        }

        self.deferred.depth -= 1;
        Ok(())
    }

    /// Lay out every root and everything reachable from them.
    ///
    /// The roots are requested inside one scope, so forward references among
    /// them resolve before any parked type is computed.
    pub fn compute_all(&mut self, roots: impl IntoIterator<Item = TypeId>) -> Result<(), LayoutError> {
        self.enter_nested();
        for t in roots {
            self.request_lazy(t)?;
        }
        self.leave_nested()
    }

    /// Current nesting depth.
    pub fn nesting_depth(&self) -> u32 {
        self.deferred.depth
    }

    /// Number of parked types.
    pub fn pending(&self) -> usize {
        self.deferred.stack.len()
    }
}
