//! Interface method sets.
//!
//! Flattens embedded interfaces into the interface's own method list, drops
//! or reports repeats, sorts the result and assigns one pointer-sized slot
//! per method.

use std::cmp::Ordering;

use ori_diagnostic::{Diagnostic, ErrorCode};
use ori_ir::Name;
use ori_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use super::LayoutEngine;
use crate::graph::{Field, LayoutFlags, TypeGraph, TypeId};
use crate::LayoutError;

impl LayoutEngine {
    /// Replace the entries of interface `t` with its expanded method set.
    pub(crate) fn expand_interface(&mut self, t: TypeId) -> Result<(), LayoutError> {
        let machine = self.machine_or_err()?;
        let entries = self.graph.fields(t).to_vec();

        let mut seen: FxHashMap<Name, Field> = FxHashMap::default();
        let mut methods: Vec<Field> = Vec::with_capacity(entries.len());

        for method in entries.iter().filter(|m| m.name.is_some()) {
            if let Some(ty) = method.ty {
                self.request_lazy(ty)?;
            }
            self.add_method(&mut seen, &mut methods, *method, true);
        }

        for embed in entries.iter().filter(|m| m.name.is_none()) {
            let Some(ty) = embed.ty else {
                continue;
            };

            if !self.graph.kind(ty).is_interface() {
                let ty = self.graph.format_type(ty);
                self.report(
                    Diagnostic::error(ErrorCode::E2032)
                        .with_message(format!("interface contains embedded non-interface {ty}"))
                        .with_label(embed.pos, "embedded here"),
                );
                self.graph.insert_flags(t, LayoutFlags::BROKEN);
                // Kept so the interface still prints with the bad entry.
                methods.push(Field {
                    broken: true,
                    ..*embed
                });
                continue;
            }

            ensure_sufficient_stack(|| self.compute(ty))?;

            let inherited: Vec<Field> = self
                .graph
                .fields(ty)
                .iter()
                .filter(|m| m.name.is_some())
                .copied()
                .collect();
            for method in inherited {
                // Blame the embedding site, not the method declaration.
                let copy = Field {
                    offset: 0,
                    pos: embed.pos,
                    ..method
                };
                self.add_method(&mut seen, &mut methods, copy, false);
            }
        }

        let graph = &self.graph;
        methods.sort_by(|a, b| method_order(graph, a, b));

        let ptr = machine.ptr_width();
        if i64::try_from(methods.len()).map_or(true, |n| n >= machine.max_width() / ptr) {
            let pos = self.type_pos(t);
            self.report(
                Diagnostic::error(ErrorCode::E2033)
                    .with_message("interface too large")
                    .with_label(pos, "declared here"),
            );
        }

        let mut slot = 0;
        for method in &mut methods {
            method.offset = slot;
            slot += ptr;
        }

        tracing::debug!(
            ty = %self.graph.format_type(t),
            methods = methods.len(),
            "expanded interface"
        );
        self.graph.set_methods(t, methods);
        Ok(())
    }

    fn add_method(
        &mut self,
        seen: &mut FxHashMap<Name, Field>,
        methods: &mut Vec<Field>,
        method: Field,
        explicit: bool,
    ) {
        let Some(name) = method.name else {
            methods.push(method);
            return;
        };

        match seen.get(&name) {
            None => {
                seen.insert(name, method);
            }
            Some(prev)
                if self.allow_identical_embedded_duplicates
                    && !explicit
                    && same_type(&self.graph, prev, &method) =>
            {
                return;
            }
            Some(_) => {
                let name = self.graph.name_str(name).to_string();
                self.report(
                    Diagnostic::error(ErrorCode::E2031)
                        .with_message(format!("duplicate method {name}"))
                        .with_label(method.pos, "method redeclared here"),
                );
            }
        }
        methods.push(method);
    }
}

fn same_type(graph: &TypeGraph, a: &Field, b: &Field) -> bool {
    match (a.ty, b.ty) {
        (Some(x), Some(y)) => graph.identical(x, y),
        _ => false,
    }
}

/// Canonical method order: unnamed entries first, then exported names before
/// unexported ones, then by name.
fn method_order(graph: &TypeGraph, a: &Field, b: &Field) -> Ordering {
    match (a.name, b.name) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => {
            let (x, y) = (graph.name_str(x), graph.name_str(y));
            is_exported(y).cmp(&is_exported(x)).then_with(|| x.cmp(y))
        }
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
