//! The layout engine.
//!
//! [`LayoutEngine::compute`] finalizes the width and alignment of one type,
//! recursing eagerly where the answer is needed now (struct fields, array
//! elements, embedded interfaces) and parking everything else on the deferred
//! work-list (pointees, map keys and values, channel and slice elements).
//!
//! # Lifecycle of a node
//!
//! `Unset` -> `InProgress` -> `Known` + `COMPUTED`. Meeting an `InProgress`
//! node means the computation walked around a declaration cycle: the cycle
//! is reported, every member is marked `BROKEN` and the node gets the
//! fallback width 0 / alignment 1.
//!
//! # Errors
//!
//! User mistakes go to the diagnostic queue and layout carries on with a
//! placeholder. [`LayoutError`] is reserved for states only a compiler defect
//! can produce; after one is returned the engine should be discarded.

mod cycle;
mod deferred;
mod iface;
mod structs;

use ori_diagnostic::queue::too_many_errors;
use ori_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, ErrorCode};
use ori_ir::Pos;
use ori_stack::ensure_sufficient_stack;

use crate::graph::{Kind, LayoutFlags, TypeGraph, TypeId, Width};
use crate::{LayoutError, Machine};

use deferred::DeferredQueue;
use structs::Rounding;

/// Width substituted for a type reported too large.
///
/// Small but nonzero, so dependent layouts stay sane.
const PLACEHOLDER_WIDTH: i64 = 8;

/// Channel elements must be smaller than this.
const MAX_CHAN_ELEM_WIDTH: i64 = 1 << 16;

/// Round `o` up to a multiple of `r`, which must be 1, 2, 4 or 8.
pub fn round_up(o: i64, r: i64) -> Result<i64, LayoutError> {
    if !(1..=8).contains(&r) || r & (r - 1) != 0 {
        tracing::error!(rounding = r, "bad rounding");
        return Err(LayoutError::BadRounding(r));
    }
    Ok((o + r - 1) & !(r - 1))
}

/// Engine options.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LayoutConfig {
    /// An interface may inherit the same method from two embedded interfaces
    /// (or from an embedding and its own declaration) when both signatures are
    /// identical. When false, every repeat is a duplicate-method error.
    pub allow_identical_embedded_duplicates: bool,
    /// Limits and dedup policy for the diagnostic queue.
    pub diagnostics: DiagnosticConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            allow_identical_embedded_duplicates: true,
            diagnostics: DiagnosticConfig::default(),
        }
    }
}

/// Owns the type graph and all mutable layout state.
pub struct LayoutEngine {
    graph: TypeGraph,
    machine: Option<Machine>,
    allow_identical_embedded_duplicates: bool,
    deferred: DeferredQueue,
    /// Set once a later phase must no longer mutate layouts.
    frozen: bool,
    diagnostics: DiagnosticQueue,
    /// Position of the innermost type being computed, for nodes without one.
    current_pos: Pos,
    /// Number of kind dispatches performed.
    dispatches: u64,
}

impl LayoutEngine {
    /// Create an engine without machine parameters.
    ///
    /// [`set_machine`](Self::set_machine) must be called before any layout.
    pub fn new(graph: TypeGraph, config: LayoutConfig) -> Self {
        LayoutEngine {
            graph,
            machine: None,
            allow_identical_embedded_duplicates: config.allow_identical_embedded_duplicates,
            deferred: DeferredQueue::default(),
            frozen: false,
            diagnostics: DiagnosticQueue::with_config(config.diagnostics),
            current_pos: Pos::NONE,
            dispatches: 0,
        }
    }

    /// Create an engine with machine parameters already installed.
    pub fn with_machine(graph: TypeGraph, machine: Machine, config: LayoutConfig) -> Self {
        let mut engine = Self::new(graph, config);
        engine.machine = Some(machine);
        engine
    }

    /// Install machine parameters. Allowed once.
    pub fn set_machine(&mut self, machine: Machine) -> Result<(), LayoutError> {
        if self.machine.is_some() {
            tracing::error!(?machine, "machine parameters set twice");
            return Err(LayoutError::MachineAlreadySet);
        }
        self.machine = Some(machine);
        Ok(())
    }

    pub fn machine(&self) -> Option<Machine> {
        self.machine
    }

    /// Enter read-only mode: from now on only finished layouts may be asked for.
    pub fn freeze(&mut self) {
        tracing::debug!("layout frozen");
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of kind dispatches so far. Requests for finished types do not
    /// dispatch.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut TypeGraph {
        &mut self.graph
    }

    pub fn into_graph(self) -> TypeGraph {
        self.graph
    }

    // === Diagnostics ===

    /// Diagnostics reported so far, in report order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.peek()
    }

    /// Drain the diagnostics, sorted by position.
    ///
    /// When errors were dropped at the limit, a final "too many errors"
    /// diagnostic is appended.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        let limit = self.diagnostics.config().error_limit;
        let suppressed = self.diagnostics.suppressed_count();
        let mut diags = self.diagnostics.flush();
        if suppressed > 0 {
            diags.push(too_many_errors(limit, self.current_pos));
        }
        diags
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }

    /// True once the configured error limit is hit; callers usually stop.
    pub fn limit_reached(&self) -> bool {
        self.diagnostics.limit_reached()
    }

    pub(crate) fn report(&mut self, diag: Diagnostic) {
        tracing::debug!(code = %diag.code, message = %diag.message, "layout diagnostic");
        self.diagnostics.add(diag);
    }

    /// Position to blame for `t`: its own, else the enclosing computation's.
    pub(crate) fn type_pos(&self, t: TypeId) -> Pos {
        self.graph.pos(t).or(self.current_pos)
    }

    fn report_too_large(&mut self, t: TypeId) {
        let pos = self.type_pos(t);
        let ty = self.graph.format_type(t);
        self.report(
            Diagnostic::error(ErrorCode::E2030)
                .with_message(format!("type {ty} too large"))
                .with_label(pos, "declared here"),
        );
    }

    fn machine_or_err(&self) -> Result<Machine, LayoutError> {
        self.machine.ok_or_else(|| {
            tracing::error!("type layout requested before machine parameters were set");
            LayoutError::MachineNotSet
        })
    }

    // === Calculator ===

    /// Finalize the width and alignment of `t`.
    ///
    /// Idempotent: a finished or broken type returns without dispatching.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn compute(&mut self, t: TypeId) -> Result<(), LayoutError> {
        let machine = self.machine_or_err()?;

        let node = self.graph.node(t);
        let (width, flags, pos) = (node.width(), node.flags(), node.pos());

        if width == Width::InProgress {
            self.report_type_loop(t)?;
            let node = self.graph.node_mut(t);
            node.width = Width::Known(0);
            node.align = 1;
            node.flags.insert(LayoutFlags::BROKEN);
            return Ok(());
        }

        if flags.contains(LayoutFlags::COMPUTED) {
            return Ok(());
        }

        if self.frozen {
            if flags.contains(LayoutFlags::BROKEN) {
                return Ok(());
            }
            self.graph.insert_flags(t, LayoutFlags::BROKEN);
            let ty = self.graph.format_type(t);
            tracing::error!(%ty, "width not calculated after layout was frozen");
            return Err(LayoutError::Frozen { ty });
        }

        // A broken recursive type referenced again.
        if flags.contains(LayoutFlags::BROKEN) && width == Width::Known(0) {
            return Ok(());
        }

        self.enter_nested();

        let saved_pos = self.current_pos;
        if pos.is_known() {
            self.current_pos = pos;
        }

        let node = self.graph.node_mut(t);
        node.width = Width::InProgress;
        node.align = 0;

        self.dispatches += 1;
        let (mut width, align) = self.dispatch(t, &machine)?;

        if machine.is_32bit() && i32::try_from(width).is_err() {
            self.report_too_large(t);
            width = PLACEHOLDER_WIDTH;
        }

        let align = match align {
            Some(align) => align,
            None => self.default_align(t, width)?,
        };

        let node = self.graph.node_mut(t);
        node.width = Width::Known(width);
        node.align = align;
        node.flags.insert(LayoutFlags::COMPUTED);

        self.current_pos = saved_pos;
        self.leave_nested()
    }

    /// Alignment for kinds that leave it implicit: the width itself.
    fn default_align(&self, t: TypeId, width: i64) -> Result<u8, LayoutError> {
        match u8::try_from(width) {
            Ok(align @ (1 | 2 | 4 | 8)) => Ok(align),
            _ => {
                let ty = self.graph.format_type(t);
                tracing::error!(%ty, width, "invalid alignment");
                Err(LayoutError::InvalidAlignment { ty, width })
            }
        }
    }

    /// Run the layout rule for `t`'s kind.
    ///
    /// Returns the width and, when the rule fixes it, the alignment.
    fn dispatch(&mut self, t: TypeId, machine: &Machine) -> Result<(i64, Option<u8>), LayoutError> {
        let ptr = machine.ptr_width();
        let (ptr_align, reg_align) = (machine.ptr_align(), machine.reg_align());

        let kind = self.graph.kind(t).clone();
        let layout = match kind {
            Kind::Bool | Kind::Int8 | Kind::Uint8 => (1, None),
            Kind::Int16 | Kind::Uint16 => (2, None),
            Kind::Int32 | Kind::Uint32 | Kind::Float32 => (4, None),
            Kind::Int64 | Kind::Uint64 | Kind::Float64 => (8, Some(reg_align)),
            Kind::Complex64 => (8, Some(4)),
            Kind::Complex128 => (16, Some(reg_align)),
            Kind::Int | Kind::Uint | Kind::Uintptr => (ptr, Some(machine.int_align())),
            Kind::String => (machine.sizeof_string(), Some(ptr_align)),
            Kind::UnsafePointer => (ptr, None),

            Kind::Ptr { elem } => {
                self.request_lazy(elem)?;
                (ptr, None)
            }

            Kind::Map { key, elem } => {
                self.request_lazy(elem)?;
                self.request_lazy(key)?;
                (ptr, None)
            }

            Kind::Chan { elem, .. } => {
                self.request_lazy(elem)?;
                // Checked once the channel itself is done.
                let marker = self
                    .graph
                    .add(Kind::ChanArgs { chan: t }, self.graph.pos(t));
                self.request_lazy(marker)?;
                (ptr, None)
            }

            Kind::ChanArgs { chan } => {
                self.check_chan_elem(chan)?;
                (1, None)
            }

            Kind::Slice { elem } => {
                self.request_lazy(elem)?;
                (machine.sizeof_slice(), Some(ptr_align))
            }

            Kind::Array { elem, len } => self.layout_array(t, elem, len, machine)?,

            Kind::Interface { .. } => {
                self.expand_interface(t)?;
                (2 * ptr, Some(ptr_align))
            }

            Kind::Struct { funarg: true, .. } => {
                let ty = self.graph.format_type(t);
                tracing::error!(%ty, "function argument struct laid out on its own");
                return Err(LayoutError::FuncArgStruct { ty });
            }

            Kind::Struct { funarg: false, .. } => {
                let width = self.layout_fields(t, t, 0, Rounding::Struct)?;
                (width, Some(self.graph.align(t)))
            }

            Kind::Func { .. } => {
                // The frame is laid out once the function value is done.
                let marker = self
                    .graph
                    .add(Kind::FuncArgs { func: t }, self.graph.pos(t));
                self.request_lazy(marker)?;
                (ptr, None)
            }

            Kind::FuncArgs { func } => (self.layout_func_args(func, machine)?, Some(1)),

            Kind::Forward => {
                self.report_type_loop(t)?;
                (1, None)
            }
        };

        Ok(layout)
    }

    fn layout_array(
        &mut self,
        t: TypeId,
        elem: TypeId,
        len: i64,
        machine: &Machine,
    ) -> Result<(i64, Option<u8>), LayoutError> {
        ensure_sufficient_stack(|| self.compute(elem))?;

        let elem_width = self.known_width(elem)?;
        let align = Some(self.graph.align(elem));

        if elem_width != 0 && len > (machine.max_width() - 1) / elem_width {
            let pos = self.type_pos(t);
            let ty = self.graph.format_type(t);
            self.report(
                Diagnostic::error(ErrorCode::E2030)
                    .with_message(format!("type {ty} larger than address space"))
                    .with_label(pos, "array declared here"),
            );
            return Ok((PLACEHOLDER_WIDTH, align));
        }

        let width = len.checked_mul(elem_width).unwrap_or(PLACEHOLDER_WIDTH);
        Ok((width, align))
    }

    fn check_chan_elem(&mut self, chan: TypeId) -> Result<(), LayoutError> {
        ensure_sufficient_stack(|| self.compute(chan))?;
        let Kind::Chan { elem, .. } = *self.graph.kind(chan) else {
            return Err(self.malformed_marker(chan));
        };
        ensure_sufficient_stack(|| self.compute(elem))?;

        if self.known_width(elem)? >= MAX_CHAN_ELEM_WIDTH {
            let pos = self.type_pos(chan);
            self.report(
                Diagnostic::error(ErrorCode::E2034)
                    .with_message("channel element type too large (>64kB)")
                    .with_label(pos, "channel declared here"),
            );
        }
        Ok(())
    }

    /// Width of a type that has just been computed.
    fn known_width(&self, t: TypeId) -> Result<i64, LayoutError> {
        match self.graph.width(t) {
            Some(width) if width >= 0 => Ok(width),
            _ => {
                let ty = self.graph.format_type(t);
                tracing::error!(%ty, width = ?self.graph.node(t).width(), "invalid width");
                Err(LayoutError::InvalidWidth { ty })
            }
        }
    }

    fn malformed_marker(&self, target: TypeId) -> LayoutError {
        let ty = self.graph.format_type(target);
        tracing::error!(%ty, "layout marker points at the wrong kind");
        LayoutError::MalformedMarker { ty }
    }
}

#[cfg(test)]
mod tests;
