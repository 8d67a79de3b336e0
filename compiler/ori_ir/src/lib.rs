//! Ori IR - foundation types shared by the layout crates.
//!
//! - `Name`: interned identifier (`u32` handle)
//! - `StringInterner`: owns the strings behind every `Name`
//! - `Pos`: source position (line, column) used to anchor diagnostics
//!
//! All types are `Copy` or cheap to clone and carry `Eq + Hash` so they can be
//! used as map keys in the type graph and the diagnostic queue.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod interner;
mod name;
mod pos;

pub use interner::StringInterner;
pub use name::Name;
pub use pos::Pos;
