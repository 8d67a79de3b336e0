//! Type formatting for diagnostics and debugging.

use ori_stack::ensure_sufficient_stack;

use super::{ChanDir, Field, Kind, TypeGraph, TypeId};

impl TypeGraph {
    /// Format a type the way it would be written in source.
    ///
    /// Named types print as their name, so formatting always terminates.
    pub fn format_type(&self, id: TypeId) -> String {
        let mut buf = String::new();
        self.format_type_into(id, &mut buf);
        buf
    }

    /// Format a type into an existing string buffer.
    pub fn format_type_into(&self, id: TypeId, buf: &mut String) {
        if let Some(sym) = self.sym(id) {
            buf.push_str(self.name_str(sym.name));
            return;
        }

        ensure_sufficient_stack(|| self.format_kind(id, buf));
    }

    fn format_kind(&self, id: TypeId, buf: &mut String) {
        let kind = self.kind(id);
        if let Some(name) = kind.primitive_name() {
            buf.push_str(name);
            return;
        }

        match kind {
            Kind::Ptr { elem } => {
                buf.push('*');
                self.format_type_into(*elem, buf);
            }
            Kind::Slice { elem } => {
                buf.push_str("[]");
                self.format_type_into(*elem, buf);
            }
            Kind::Array { elem, len } => {
                buf.push('[');
                buf.push_str(&len.to_string());
                buf.push(']');
                self.format_type_into(*elem, buf);
            }
            Kind::Map { key, elem } => {
                buf.push_str("map[");
                self.format_type_into(*key, buf);
                buf.push(']');
                self.format_type_into(*elem, buf);
            }
            Kind::Chan { elem, dir } => {
                buf.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Recv => "<-chan ",
                    ChanDir::Send => "chan<- ",
                });
                self.format_type_into(*elem, buf);
            }
            Kind::Struct { fields, .. } => {
                if fields.is_empty() {
                    buf.push_str("struct {}");
                    return;
                }
                buf.push_str("struct { ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        buf.push_str("; ");
                    }
                    if let Some(name) = field.name {
                        buf.push_str(self.name_str(name));
                        buf.push(' ');
                    }
                    self.format_field_type(field, buf);
                }
                buf.push_str(" }");
            }
            Kind::Interface { methods } => {
                if methods.is_empty() {
                    buf.push_str("interface {}");
                    return;
                }
                buf.push_str("interface { ");
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        buf.push_str("; ");
                    }
                    match (method.name, method.ty) {
                        (Some(name), Some(ty)) if matches!(self.kind(ty), Kind::Func { .. }) => {
                            buf.push_str(self.name_str(name));
                            self.format_signature(ty, buf);
                        }
                        (Some(name), _) => {
                            buf.push_str(self.name_str(name));
                            buf.push(' ');
                            self.format_field_type(method, buf);
                        }
                        (None, _) => self.format_field_type(method, buf),
                    }
                }
                buf.push_str(" }");
            }
            Kind::Func { .. } => {
                buf.push_str("func");
                self.format_signature(id, buf);
            }
            Kind::ChanArgs { chan } => {
                buf.push_str("chanargs(");
                self.format_type_into(*chan, buf);
                buf.push(')');
            }
            Kind::FuncArgs { func } => {
                buf.push_str("funcargs(");
                self.format_type_into(*func, buf);
                buf.push(')');
            }
            Kind::Forward => buf.push_str("<forward>"),
            // Primitives returned above.
            _ => buf.push_str("<unknown>"),
        }
    }

    /// `(A, B) C` or `(A, B) (C, D)`, receivers omitted.
    fn format_signature(&self, func: TypeId, buf: &mut String) {
        let Kind::Func {
            params,
            results,
            variadic,
            ..
        } = self.kind(func)
        else {
            return;
        };

        buf.push('(');
        let params = self.fields(*params);
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                buf.push_str(", ");
            }
            if *variadic && i + 1 == params.len() {
                buf.push_str("...");
                match param.ty.map(|ty| self.kind(ty)) {
                    Some(Kind::Slice { elem }) => self.format_type_into(*elem, buf),
                    _ => self.format_field_type(param, buf),
                }
            } else {
                self.format_field_type(param, buf);
            }
        }
        buf.push(')');

        match self.fields(*results) {
            [] => {}
            [single] if single.name.is_none() => {
                buf.push(' ');
                self.format_field_type(single, buf);
            }
            results => {
                buf.push_str(" (");
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    self.format_field_type(result, buf);
                }
                buf.push(')');
            }
        }
    }

    fn format_field_type(&self, field: &Field, buf: &mut String) {
        match field.ty {
            Some(ty) => self.format_type_into(ty, buf),
            None => buf.push_str("<broken>"),
        }
    }
}
