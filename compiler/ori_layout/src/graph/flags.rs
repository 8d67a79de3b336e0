//! Per-node layout state.

use bitflags::bitflags;

bitflags! {
    /// Layout progress flags stored on every type node.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct LayoutFlags: u8 {
        /// Width and alignment are final.
        const COMPUTED = 1 << 0;
        /// The type was reported invalid. Never derived or reported again.
        const BROKEN = 1 << 1;
        /// Parked on the deferred work-list.
        const DEFERRED = 1 << 2;
    }
}

/// Width lifecycle of a type node.
///
/// `InProgress` is held while the node's own computation is on the stack. A
/// request that finds it there has walked around a cycle.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Width {
    #[default]
    Unset,
    InProgress,
    Known(i64),
}

impl Width {
    /// The width in bytes, if known.
    #[inline]
    pub fn known(self) -> Option<i64> {
        match self {
            Width::Known(w) => Some(w),
            Width::Unset | Width::InProgress => None,
        }
    }
}
