//! Structural type identity.

use ori_ir::Name;
use ori_stack::ensure_sufficient_stack;
use rustc_hash::FxHashSet;

use super::{Field, Kind, TypeGraph, TypeId};

impl TypeGraph {
    /// Report whether two types are identical.
    ///
    /// Named types are identical only to themselves. Anonymous types are
    /// compared structurally; function receivers and parameter names are
    /// ignored, struct field names are not. Interfaces compare by method set,
    /// regardless of declaration order or embedding.
    pub fn identical(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        if self.sym(a).is_some() || self.sym(b).is_some() {
            return false;
        }

        if self.kind(a).is_interface() && self.kind(b).is_interface() {
            return ensure_sufficient_stack(|| self.identical_method_sets(a, b));
        }

        ensure_sufficient_stack(|| self.identical_kinds(self.kind(a), self.kind(b)))
    }

    fn identical_method_sets(&self, a: TypeId, b: TypeId) -> bool {
        let (x, y) = (self.method_set(a), self.method_set(b));
        x.len() == y.len()
            && x.iter().zip(&y).all(|(m, n)| {
                m.0 == n.0
                    && match (m.1, n.1) {
                        (Some(s), Some(t)) => self.identical(s, t),
                        _ => false,
                    }
            })
    }

    /// Named methods of an interface with embedded interfaces flattened,
    /// sorted by name. The first entry for a name wins.
    fn method_set(&self, iface: TypeId) -> Vec<(Name, Option<TypeId>)> {
        let mut set = Vec::new();
        let mut visited = FxHashSet::default();
        self.collect_methods(iface, &mut set, &mut visited);
        set.sort_by_key(|m| m.0);
        set.dedup_by_key(|m| m.0);
        set
    }

    fn collect_methods(
        &self,
        iface: TypeId,
        set: &mut Vec<(Name, Option<TypeId>)>,
        visited: &mut FxHashSet<TypeId>,
    ) {
        // An interface embedding itself is reported as a loop elsewhere.
        if !visited.insert(iface) {
            return;
        }
        for entry in self.fields(iface) {
            match (entry.name, entry.ty) {
                (Some(name), ty) => set.push((name, ty)),
                (None, Some(ty)) if self.kind(ty).is_interface() => {
                    ensure_sufficient_stack(|| self.collect_methods(ty, set, visited));
                }
                _ => {}
            }
        }
    }

    fn identical_kinds(&self, a: &Kind, b: &Kind) -> bool {
        if let (Some(x), Some(y)) = (a.primitive_name(), b.primitive_name()) {
            return x == y;
        }

        match (a, b) {
            (Kind::Ptr { elem: x }, Kind::Ptr { elem: y })
            | (Kind::Slice { elem: x }, Kind::Slice { elem: y }) => self.identical(*x, *y),
            (Kind::Array { elem: x, len: n }, Kind::Array { elem: y, len: m }) => {
                n == m && self.identical(*x, *y)
            }
            (Kind::Map { key: k1, elem: e1 }, Kind::Map { key: k2, elem: e2 }) => {
                self.identical(*k1, *k2) && self.identical(*e1, *e2)
            }
            (Kind::Chan { elem: x, dir: d1 }, Kind::Chan { elem: y, dir: d2 }) => {
                d1 == d2 && self.identical(*x, *y)
            }
            (
                Kind::Struct {
                    fields: f1,
                    funarg: a1,
                },
                Kind::Struct {
                    fields: f2,
                    funarg: a2,
                },
            ) => a1 == a2 && self.identical_fields(f1, f2, true),
            (
                Kind::Func {
                    params: p1,
                    results: r1,
                    variadic: v1,
                    ..
                },
                Kind::Func {
                    params: p2,
                    results: r2,
                    variadic: v2,
                    ..
                },
            ) => {
                v1 == v2
                    && self.identical_fields(self.fields(*p1), self.fields(*p2), false)
                    && self.identical_fields(self.fields(*r1), self.fields(*r2), false)
            }
            _ => false,
        }
    }

    fn identical_fields(&self, a: &[Field], b: &[Field], names: bool) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| {
                (!names || x.name == y.name)
                    && match (x.ty, y.ty) {
                        (Some(s), Some(t)) => self.identical(s, t),
                        _ => false,
                    }
            })
    }
}
