//! Field offsets for structs and function argument frames.

use ori_diagnostic::{Diagnostic, ErrorCode};
use ori_stack::ensure_sufficient_stack;

use super::{round_up, LayoutEngine};
use crate::graph::{Kind, LayoutFlags, TypeId, Width};
use crate::{LayoutError, Machine};

/// How the end offset of a field group is finished.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Rounding {
    /// Leave the end offset where the last field ends.
    Unrounded,
    /// Plain struct: pad a trailing zero-sized field, round to max alignment.
    Struct,
    /// Argument frame result group: round to at least the register width.
    Frame,
}

impl Rounding {
    fn floor(self, machine: &Machine) -> u8 {
        match self {
            Rounding::Frame => machine.reg_align(),
            Rounding::Unrounded | Rounding::Struct => 1,
        }
    }
}

impl LayoutEngine {
    /// Assign offsets to the fields of `t` starting at `start`.
    ///
    /// Sets the alignment of `t` and its width (measured from `start`), and
    /// returns the end offset. Overflow is blamed on `errtype`.
    pub(crate) fn layout_fields(
        &mut self,
        errtype: TypeId,
        t: TypeId,
        start: i64,
        rounding: Rounding,
    ) -> Result<i64, LayoutError> {
        let machine = self.machine_or_err()?;

        // Reflection tables on 32-bit targets need field offsets in 31 bits.
        let max_width = if machine.max_width() < 1 << 32 {
            (1 << 31) - 1
        } else {
            machine.max_width()
        };

        let mut offset = start;
        let mut max_align = rounding.floor(&machine);
        let mut last_zero = 0;

        let count = self.graph.fields(t).len();
        for i in 0..count {
            let Some(field) = self.graph.fields(t).get(i).copied() else {
                break;
            };
            // Already reported broken; lay out the rest.
            let Some(ty) = field.ty else {
                continue;
            };

            ensure_sufficient_stack(|| self.compute(ty))?;

            let align = self.graph.align(ty);
            max_align = max_align.max(align);
            if align > 0 {
                offset = round_up(offset, i64::from(align))?;
            }
            if let Some(slot) = self.graph.fields_mut(t).get_mut(i) {
                slot.offset = offset;
            }

            let width = self.known_width(ty)?;
            if width == 0 {
                last_zero = offset;
            }
            offset = offset.saturating_add(width);

            if offset >= max_width {
                let pos = self.type_pos(errtype);
                let name = self.graph.format_type(errtype);
                self.report(
                    Diagnostic::error(ErrorCode::E2030)
                        .with_message(format!("type {name} too large"))
                        .with_label(pos, "declared here"),
                );
                offset = super::PLACEHOLDER_WIDTH;
            }
        }

        // A nonzero-sized struct ending in a zero-sized field gets one byte of
        // padding, so the field's address never points at the next object.
        if rounding == Rounding::Struct && offset > start && offset == last_zero {
            offset += 1;
        }

        if rounding != Rounding::Unrounded {
            offset = round_up(offset, i64::from(max_align))?;
        }

        let node = self.graph.node_mut(t);
        node.align = max_align;
        node.width = Width::Known(offset - start);

        Ok(offset)
    }

    /// Lay out a function's receiver, parameter and result groups back to
    /// back and record the total as its argument frame size.
    pub(crate) fn layout_func_args(
        &mut self,
        func: TypeId,
        machine: &Machine,
    ) -> Result<i64, LayoutError> {
        let Kind::Func {
            recvs,
            params,
            results,
            ..
        } = *self.graph.kind(func)
        else {
            return Err(self.malformed_marker(func));
        };

        let mut width = self.layout_fields(func, recvs, 0, Rounding::Unrounded)?;
        width = self.layout_fields(func, params, width, Rounding::Unrounded)?;
        width = self.layout_fields(func, results, width, Rounding::Frame)?;

        for group in [recvs, params, results] {
            self.graph.insert_flags(group, LayoutFlags::COMPUTED);
        }
        self.graph.set_arg_width(func, width);

        if width % machine.reg_width() != 0 {
            let pos = self.type_pos(func);
            let ty = self.graph.format_type(func);
            self.report(
                Diagnostic::warning(ErrorCode::W2030)
                    .with_message(format!("bad type {ty} {width}"))
                    .with_label(pos, "argument frame is not register aligned"),
            );
        }

        tracing::trace!(func = ?func, width, "argument frame");
        Ok(width)
    }
}
