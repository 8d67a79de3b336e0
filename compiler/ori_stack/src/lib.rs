//! Stack safety for deep type graphs.
//!
//! Width computation recurses eagerly wherever a layout genuinely needs a
//! child's size right now: struct fields, array elements, embedded
//! interfaces. The cycle search and structural identity checks walk the same
//! edges. A long chain of nested declarations (`type T0 [1]T1`, `type T1
//! [1]T2`, ...) would otherwise overflow the native stack.
//!
//! # Platform Support
//!
//! - **Native targets**: `stacker` grows the stack on demand.
//! - **WASM targets**: passthrough.

/// Remaining stack below which we grow (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
///
/// Wrap each recursive step of a graph walk:
///
/// ```text
/// fn compute(&mut self, t: TypeId) -> Result<(), LayoutError> {
///     ensure_sufficient_stack(|| self.compute_inner(t))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version: call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
