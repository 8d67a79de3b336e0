//! Invalid recursive type declarations.

#![allow(clippy::format_push_string)] // Multi-line message built once per cycle

use ori_diagnostic::{Diagnostic, ErrorCode};
use ori_stack::ensure_sufficient_stack;

use super::LayoutEngine;
use crate::graph::{Kind, LayoutFlags, TypeId};
use crate::LayoutError;

impl LayoutEngine {
    /// Search for a declaration loop through `t`.
    ///
    /// Only local named types take part: an imported type was checked by the
    /// unit that declared it. On success `path` holds exactly the loop.
    pub(crate) fn find_type_loop(&self, t: TypeId, path: &mut Vec<TypeId>) -> bool {
        if let Some(sym) = self.graph.sym(t) {
            if !sym.local {
                return false;
            }

            if let Some(i) = path.iter().position(|&seen| seen == t) {
                path.drain(..i);
                return true;
            }

            path.push(t);
            if let Some(rhs) = sym.rhs {
                if ensure_sufficient_stack(|| self.find_type_loop(rhs, path)) {
                    return true;
                }
            }
            path.pop();
            return false;
        }

        match self.graph.kind(t) {
            Kind::Array { elem, .. } => self.find_type_loop(*elem, path),
            Kind::Struct { fields, .. } => fields
                .iter()
                .filter_map(|f| f.ty)
                .any(|ty| ensure_sufficient_stack(|| self.find_type_loop(ty, path))),
            // Embedded interfaces only; method signatures may refer back freely.
            Kind::Interface { methods } => methods
                .iter()
                .filter_map(|m| m.ty)
                .filter(|&ty| self.graph.kind(ty).is_interface())
                .any(|ty| ensure_sufficient_stack(|| self.find_type_loop(ty, path))),
            _ => false,
        }
    }

    /// Report the declaration loop through `t` and mark its members broken.
    ///
    /// Does nothing if `t` is already broken, so each loop is reported once.
    pub(crate) fn report_type_loop(&mut self, t: TypeId) -> Result<(), LayoutError> {
        if self.graph.is_broken(t) {
            return Ok(());
        }

        let mut path = Vec::new();
        if !self.find_type_loop(t, &mut path) {
            let ty = self.graph.format_type(t);
            tracing::error!(%ty, "failed to find type loop");
            return Err(LayoutError::MissingTypeLoop { ty });
        }

        // Start at the earliest declaration so output does not depend on
        // which member was reached first.
        let mut first = 0;
        for (i, &ty) in path.iter().enumerate().skip(1) {
            if self.type_pos(ty).is_before(self.type_pos(path[first])) {
                first = i;
            }
        }
        path.rotate_left(first);

        let head = path[0];
        let head_name = self.graph.format_type(head);
        let head_pos = self.type_pos(head);

        let mut msg = format!("invalid recursive type {head_name}\n");
        for &ty in &path {
            msg.push_str(&format!(
                "\t{}: {} refers to\n",
                self.type_pos(ty),
                self.graph.format_type(ty)
            ));
            self.graph.insert_flags(ty, LayoutFlags::BROKEN);
        }
        msg.push_str(&format!("\t{head_pos}: {head_name}"));

        tracing::debug!(ty = %head_name, members = path.len(), "type loop");
        self.report(
            Diagnostic::error(ErrorCode::E2008)
                .with_message(msg)
                .with_label(head_pos, "invalid recursive type"),
        );
        Ok(())
    }
}
