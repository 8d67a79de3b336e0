use ori_diagnostic::{DiagnosticConfig, ErrorCode, Severity};
use ori_ir::Pos;
use pretty_assertions::assert_eq;

use super::*;
use crate::graph::{ChanDir, Field};

// === Helpers ===

fn ok<T>(result: Result<T, LayoutError>) -> T {
    result.unwrap_or_else(|e| panic!("unexpected layout error: {e}"))
}

fn amd64(graph: TypeGraph) -> LayoutEngine {
    LayoutEngine::with_machine(graph, Machine::amd64(), LayoutConfig::default())
}

fn i386(graph: TypeGraph) -> LayoutEngine {
    let machine =
        Machine::from_triple("i386-unknown-linux-gnu").unwrap_or_else(|e| panic!("{e}"));
    LayoutEngine::with_machine(graph, machine, LayoutConfig::default())
}

fn field(g: &mut TypeGraph, name: &str, ty: TypeId) -> Field {
    let name = g.intern(name);
    Field::new(name, ty)
}

fn method(g: &mut TypeGraph, name: &str, params: &[TypeId], pos: Pos) -> Field {
    let params = params.iter().map(|&t| Field::embedded(t)).collect();
    let sig = g.func(Vec::new(), params, Vec::new(), false);
    field(g, name, sig).at(pos)
}

fn declare(g: &mut TypeGraph, name: &str, line: u32, rhs: TypeId) -> TypeId {
    let t = g.declare(name, Pos::new(line, 6));
    ok(g.define(t, rhs));
    t
}

fn layout_of(e: &LayoutEngine, t: TypeId) -> (i64, u8) {
    let layout = e
        .graph()
        .layout(t)
        .unwrap_or_else(|| panic!("{} has no layout", e.graph().format_type(t)));
    (layout.width, layout.align)
}

fn offsets(e: &LayoutEngine, t: TypeId) -> Vec<i64> {
    e.graph().fields(t).iter().map(|f| f.offset).collect()
}

fn codes(e: &LayoutEngine) -> Vec<ErrorCode> {
    e.diagnostics().map(|d| d.code).collect()
}

fn params_of(e: &LayoutEngine, func: TypeId) -> (TypeId, TypeId, TypeId) {
    match *e.graph().kind(func) {
        Kind::Func {
            recvs,
            params,
            results,
            ..
        } => (recvs, params, results),
        _ => panic!("expected a function type"),
    }
}

// === Rounding ===

#[test]
fn test_round_up() {
    assert_eq!(round_up(0, 1), Ok(0));
    assert_eq!(round_up(5, 4), Ok(8));
    assert_eq!(round_up(8, 8), Ok(8));
    assert_eq!(round_up(9, 2), Ok(10));
}

#[test]
fn test_round_up_rejects_bad_rounding() {
    assert_eq!(round_up(1, 3), Err(LayoutError::BadRounding(3)));
    assert_eq!(round_up(1, 0), Err(LayoutError::BadRounding(0)));
    assert_eq!(round_up(1, 16), Err(LayoutError::BadRounding(16)));
}

// === Primitives ===

#[test]
fn test_primitive_table_64bit() {
    let mut e = amd64(TypeGraph::new());
    let expected = [
        (TypeId::BOOL, 1, 1),
        (TypeId::INT8, 1, 1),
        (TypeId::INT16, 2, 2),
        (TypeId::INT32, 4, 4),
        (TypeId::INT64, 8, 8),
        (TypeId::UINT8, 1, 1),
        (TypeId::UINT16, 2, 2),
        (TypeId::UINT32, 4, 4),
        (TypeId::UINT64, 8, 8),
        (TypeId::INT, 8, 8),
        (TypeId::UINT, 8, 8),
        (TypeId::UINTPTR, 8, 8),
        (TypeId::FLOAT32, 4, 4),
        (TypeId::FLOAT64, 8, 8),
        (TypeId::COMPLEX64, 8, 4),
        (TypeId::COMPLEX128, 16, 8),
        (TypeId::STRING, 16, 8),
        (TypeId::UNSAFE_POINTER, 8, 8),
    ];
    for (t, width, align) in expected {
        ok(e.compute(t));
        assert_eq!(
            layout_of(&e, t),
            (width, align),
            "{}",
            e.graph().format_type(t)
        );
    }
    assert!(codes(&e).is_empty());
}

#[test]
fn test_primitive_table_32bit() {
    let mut e = i386(TypeGraph::new());
    let expected = [
        (TypeId::BOOL, 1, 1),
        (TypeId::INT8, 1, 1),
        (TypeId::INT16, 2, 2),
        (TypeId::INT32, 4, 4),
        (TypeId::INT64, 8, 4),
        (TypeId::UINT8, 1, 1),
        (TypeId::UINT16, 2, 2),
        (TypeId::UINT32, 4, 4),
        (TypeId::UINT64, 8, 4),
        (TypeId::INT, 4, 4),
        (TypeId::UINT, 4, 4),
        (TypeId::UINTPTR, 4, 4),
        (TypeId::FLOAT32, 4, 4),
        (TypeId::FLOAT64, 8, 4),
        (TypeId::COMPLEX64, 8, 4),
        (TypeId::COMPLEX128, 16, 4),
        (TypeId::STRING, 8, 4),
        (TypeId::UNSAFE_POINTER, 4, 4),
    ];
    for (t, width, align) in expected {
        ok(e.compute(t));
        assert_eq!(
            layout_of(&e, t),
            (width, align),
            "{}",
            e.graph().format_type(t)
        );
    }
}

#[test]
fn test_x32_int_is_pointer_sized() {
    let machine =
        Machine::from_triple("x86_64-unknown-linux-gnux32").unwrap_or_else(|e| panic!("{e}"));
    let mut e = LayoutEngine::with_machine(TypeGraph::new(), machine, LayoutConfig::default());
    ok(e.compute(TypeId::INT));
    ok(e.compute(TypeId::INT64));
    assert_eq!(layout_of(&e, TypeId::INT), (4, 4));
    assert_eq!(layout_of(&e, TypeId::INT64), (8, 8));
}

// === Composites ===

#[test]
fn test_reference_kinds() {
    let mut g = TypeGraph::new();
    let p = g.ptr(TypeId::INT8);
    let s = g.slice(TypeId::INT8);
    let m = g.map(TypeId::STRING, TypeId::INT);
    let c = g.chan(TypeId::BOOL, ChanDir::Both);
    let i = g.interface(Vec::new());
    let f = g.func(Vec::new(), Vec::new(), Vec::new(), false);

    let mut e = amd64(g);
    ok(e.compute_all([p, s, m, c, i, f]));

    assert_eq!(layout_of(&e, p), (8, 8));
    assert_eq!(layout_of(&e, s), (24, 8));
    assert_eq!(layout_of(&e, m), (8, 8));
    assert_eq!(layout_of(&e, c), (8, 8));
    assert_eq!(layout_of(&e, i), (16, 8));
    assert_eq!(layout_of(&e, f), (8, 8));

    // Pointees and keys are laid out too, once the queue drains.
    assert_eq!(layout_of(&e, TypeId::INT8), (1, 1));
    assert_eq!(layout_of(&e, TypeId::STRING), (16, 8));
    assert_eq!(layout_of(&e, TypeId::BOOL), (1, 1));
}

#[test]
fn test_reference_kinds_32bit() {
    let mut g = TypeGraph::new();
    let s = g.slice(TypeId::INT8);
    let i = g.interface(Vec::new());

    let mut e = i386(g);
    ok(e.compute_all([s, i]));

    assert_eq!(layout_of(&e, s), (12, 4));
    assert_eq!(layout_of(&e, i), (8, 4));
}

#[test]
fn test_array_layout() {
    let mut g = TypeGraph::new();
    let a = g.array(TypeId::INT32, 5);
    let empty = g.array(TypeId::INT64, 0);
    let nested = g.array(a, 3);

    let mut e = amd64(g);
    ok(e.compute_all([a, empty, nested]));

    assert_eq!(layout_of(&e, a), (20, 4));
    assert_eq!(layout_of(&e, empty), (0, 8));
    assert_eq!(layout_of(&e, nested), (60, 4));
}

// === Struct layout ===

#[test]
fn test_struct_padding() {
    let mut g = TypeGraph::new();
    let a = field(&mut g, "a", TypeId::INT8);
    let b = field(&mut g, "b", TypeId::INT64);
    let s = g.structure(vec![a, b]);

    let mut e = amd64(g);
    ok(e.compute(s));

    assert_eq!(offsets(&e, s), vec![0, 8]);
    assert_eq!(layout_of(&e, s), (16, 8));
}

#[test]
fn test_struct_trailing_zero_sized_field() {
    let mut g = TypeGraph::new();
    let empty = g.structure(Vec::new());
    let x = field(&mut g, "x", TypeId::INT32);
    let y = field(&mut g, "y", empty);
    let s = g.structure(vec![x, y]);

    let mut e = amd64(g);
    ok(e.compute(s));

    assert_eq!(layout_of(&e, empty), (0, 1));
    assert_eq!(offsets(&e, s), vec![0, 4]);
    assert_eq!(layout_of(&e, s), (8, 4));
}

#[test]
fn test_leading_zero_sized_field_needs_no_padding() {
    let mut g = TypeGraph::new();
    let empty = g.structure(Vec::new());
    let y = field(&mut g, "y", empty);
    let x = field(&mut g, "x", TypeId::INT32);
    let s = g.structure(vec![y, x]);
    let only = field(&mut g, "only", empty);
    let all_empty = g.structure(vec![only]);

    let mut e = amd64(g);
    ok(e.compute_all([s, all_empty]));

    assert_eq!(offsets(&e, s), vec![0, 0]);
    assert_eq!(layout_of(&e, s), (4, 4));
    // Zero-sized overall: no padding byte.
    assert_eq!(layout_of(&e, all_empty), (0, 1));
}

#[test]
fn test_untyped_field_is_skipped() {
    let mut g = TypeGraph::new();
    let a = field(&mut g, "a", TypeId::INT16);
    let bad = g.intern("bad");
    let c = field(&mut g, "c", TypeId::INT16);
    let s = g.structure(vec![a, Field::untyped(bad), c]);

    let mut e = amd64(g);
    ok(e.compute(s));

    assert_eq!(offsets(&e, s), vec![0, 0, 2]);
    assert_eq!(layout_of(&e, s), (4, 2));
}

#[test]
fn test_compute_is_idempotent() {
    let mut g = TypeGraph::new();
    let a = field(&mut g, "a", TypeId::INT8);
    let b = field(&mut g, "b", TypeId::INT64);
    let s = g.structure(vec![a, b]);

    let mut e = amd64(g);
    ok(e.compute(s));
    let dispatched = e.dispatch_count();
    let first = layout_of(&e, s);
    assert_eq!(dispatched, 3);

    ok(e.compute(s));
    assert_eq!(e.dispatch_count(), dispatched);
    assert_eq!(layout_of(&e, s), first);
}

// === Type loops ===

#[test]
fn test_self_containing_struct_is_broken() {
    let mut g = TypeGraph::new();
    let a = g.declare("A", Pos::new(1, 6));
    let next = field(&mut g, "next", a);
    let lit = g.structure(vec![next]);
    ok(g.define(a, lit));

    let mut e = amd64(g);
    ok(e.compute(a));

    assert!(e.graph().is_broken(a));
    assert_eq!(layout_of(&e, a), (0, 1));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E2008);
    assert_eq!(
        diags[0].message,
        "invalid recursive type A\n\t1:6: A refers to\n\t1:6: A"
    );
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(1, 6)));

    // Asking again neither recomputes nor reports again.
    let dispatched = e.dispatch_count();
    ok(e.compute(a));
    assert_eq!(e.dispatch_count(), dispatched);
    assert_eq!(e.error_count(), 1);
}

#[test]
fn test_self_reference_through_pointer_is_legal() {
    let mut g = TypeGraph::new();
    let a = g.declare("A", Pos::new(1, 6));
    let p = g.ptr(a);
    let next = field(&mut g, "next", p);
    let lit = g.structure(vec![next]);
    ok(g.define(a, lit));

    let mut e = amd64(g);
    ok(e.compute(a));

    assert!(!e.graph().is_broken(a));
    assert_eq!(layout_of(&e, a), (8, 8));
    assert_eq!(layout_of(&e, p), (8, 8));
    assert_eq!(e.pending(), 0);
    assert_eq!(e.nesting_depth(), 0);
    assert!(codes(&e).is_empty());
}

#[test]
fn test_forward_pointer_declaration_in_nested_scope() {
    // type T *struct { next T }
    let mut e = amd64(TypeGraph::new());
    e.enter_nested();

    let g = e.graph_mut();
    let t = g.declare("T", Pos::new(1, 6));
    let next = field(g, "next", t);
    let s = g.structure(vec![next]);
    let p = g.ptr(s);

    ok(e.request_lazy(p));
    assert_eq!(e.pending(), 1);
    assert!(e.graph().flags(p).contains(LayoutFlags::DEFERRED));

    ok(e.graph_mut().define(t, p));
    ok(e.leave_nested());

    assert_eq!(layout_of(&e, t), (8, 8));
    assert_eq!(layout_of(&e, s), (8, 8));
    assert_eq!(layout_of(&e, p), (8, 8));
    assert!(!e.graph().flags(p).contains(LayoutFlags::DEFERRED));
    assert_eq!(e.pending(), 0);
    assert!(codes(&e).is_empty());
}

#[test]
fn test_mutual_recursion_reported_from_earliest_declaration() {
    let mut g = TypeGraph::new();
    let a = g.declare("A", Pos::new(1, 6));
    let b = g.declare("B", Pos::new(2, 6));
    let fa = field(&mut g, "b", b);
    let lit_a = g.structure(vec![fa]);
    let fb = field(&mut g, "a", a);
    let lit_b = g.structure(vec![fb]);
    ok(g.define(a, lit_a));
    ok(g.define(b, lit_b));

    let mut e = amd64(g);
    // Start from B: the report still begins at A.
    ok(e.compute(b));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(
        diags[0].message,
        "invalid recursive type A\n\t1:6: A refers to\n\t2:6: B refers to\n\t1:6: A"
    );
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(1, 6)));
    assert!(e.graph().is_broken(a));
    assert!(e.graph().is_broken(b));
    assert_eq!(layout_of(&e, a), (0, 1));
    assert_eq!(layout_of(&e, b), (0, 1));
}

#[test]
fn test_forward_loop_reported_once() {
    // type A B; type B A
    let mut g = TypeGraph::new();
    let a = g.declare("A", Pos::new(1, 6));
    let b = g.declare("B", Pos::new(2, 6));
    ok(g.define(a, b));
    ok(g.define(b, a));

    let mut e = amd64(g);
    ok(e.compute_all([a, b]));

    assert_eq!(codes(&e), vec![ErrorCode::E2008]);
    assert_eq!(
        e.diagnostics().next().map(|d| d.message.clone()),
        Some("invalid recursive type A\n\t1:6: A refers to\n\t2:6: B refers to\n\t1:6: A".into())
    );
    assert_eq!(layout_of(&e, a), (1, 1));
    assert_eq!(layout_of(&e, b), (1, 1));
}

#[test]
fn test_array_of_self_is_a_loop() {
    // type A [2]A
    let mut g = TypeGraph::new();
    let a = g.declare("A", Pos::new(3, 6));
    let lit = g.array(a, 2);
    ok(g.define(a, lit));

    let mut e = amd64(g);
    ok(e.compute(a));

    assert_eq!(codes(&e), vec![ErrorCode::E2008]);
    assert!(e.graph().is_broken(a));
    assert_eq!(layout_of(&e, a), (0, 1));
}

#[test]
fn test_interface_embedding_itself_is_a_loop() {
    // type I interface { I }
    let mut g = TypeGraph::new();
    let i = g.declare("I", Pos::new(1, 6));
    let lit = g.interface(vec![Field::embedded(i).at(Pos::new(1, 18))]);
    ok(g.define(i, lit));

    let mut e = amd64(g);
    ok(e.compute(i));

    assert_eq!(codes(&e), vec![ErrorCode::E2008]);
    assert!(e.graph().is_broken(i));
}

#[test]
fn test_imported_types_are_not_searched() {
    let mut g = TypeGraph::new();
    let node = g.declare_imported("Node", Pos::new(1, 6));
    let next = field(&mut g, "next", node);
    let lit = g.structure(vec![next]);
    ok(g.define(node, lit));

    let mut e = amd64(g);
    assert_eq!(
        e.compute(node),
        Err(LayoutError::MissingTypeLoop { ty: "Node".into() })
    );
}

#[test]
fn test_undefined_forward_has_no_loop() {
    let mut g = TypeGraph::new();
    let t = g.declare("T", Pos::new(1, 6));

    let mut e = amd64(g);
    assert_eq!(
        e.compute(t),
        Err(LayoutError::MissingTypeLoop { ty: "T".into() })
    );
}

// === Size limits ===

#[test]
fn test_array_larger_than_address_space() {
    let mut g = TypeGraph::new();
    let a = g.array(TypeId::INT64, 1 << 48);
    let a = g.at(a, Pos::new(7, 8));

    let mut e = amd64(g);
    ok(e.compute(a));
    ok(e.compute(a));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E2030);
    assert_eq!(
        diags[0].message,
        "type [281474976710656]int64 larger than address space"
    );
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(7, 8)));
    assert_eq!(layout_of(&e, a), (8, 8));
}

#[test]
fn test_anonymous_type_blamed_on_enclosing_declaration() {
    let mut g = TypeGraph::new();
    let huge = g.array(TypeId::INT64, 1 << 48);
    let f = field(&mut g, "buf", huge);
    let lit = g.structure(vec![f]);
    let t = declare(&mut g, "Buffer", 4, lit);

    let mut e = amd64(g);
    ok(e.compute(t));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(4, 6)));
    assert_eq!(layout_of(&e, t), (8, 8));
}

#[test]
fn test_32bit_width_overflow() {
    let mut g = TypeGraph::new();
    let a = g.array(TypeId::INT32, 600_000_000);

    let mut e = i386(g);
    ok(e.compute(a));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E2030);
    assert_eq!(diags[0].message, "type [600000000]int32 too large");
    assert_eq!(layout_of(&e, a), (8, 4));
}

#[test]
fn test_struct_offset_overflow_on_32bit() {
    let mut g = TypeGraph::new();
    let half = g.array(TypeId::INT8, 1 << 30);
    let a = field(&mut g, "a", half);
    let b = field(&mut g, "b", half);
    let lit = g.structure(vec![a, b]);
    let big = declare(&mut g, "Big", 5, lit);

    let mut e = i386(g);
    ok(e.compute(big));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "type Big too large");
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(5, 6)));
    assert_eq!(layout_of(&e, big), (8, 1));
}

#[test]
fn test_channel_element_too_large() {
    let mut g = TypeGraph::new();
    let big = g.array(TypeId::UINT8, 1 << 16);
    let small = g.array(TypeId::UINT8, (1 << 16) - 1);
    let c1 = g.chan(big, ChanDir::Both);
    let c1 = g.at(c1, Pos::new(4, 9));
    let c2 = g.chan(small, ChanDir::Recv);

    let mut e = amd64(g);
    ok(e.compute_all([c1, c2]));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E2034);
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(4, 9)));
    assert_eq!(layout_of(&e, c1), (8, 8));
    assert_eq!(layout_of(&e, big), (1 << 16, 1));
}

// === Interfaces ===

#[test]
fn test_interface_method_slots_sorted() {
    let mut g = TypeGraph::new();
    let m_b = method(&mut g, "b", &[], Pos::new(1, 1));
    let m_upper_a = method(&mut g, "A", &[], Pos::new(1, 2));
    let m_a = method(&mut g, "a", &[], Pos::new(1, 3));
    let m_upper_b = method(&mut g, "B", &[TypeId::INT], Pos::new(1, 4));
    let i = g.interface(vec![m_b, m_upper_a, m_a, m_upper_b]);

    let mut e = amd64(g);
    ok(e.compute(i));

    let names: Vec<_> = e
        .graph()
        .fields(i)
        .iter()
        .map(|m| m.name.map_or("", |n| e.graph().name_str(n)).to_string())
        .collect();
    assert_eq!(names, vec!["A", "B", "a", "b"]);
    assert_eq!(offsets(&e, i), vec![0, 8, 16, 24]);
    assert!(codes(&e).is_empty());
}

fn embedding_graph() -> (TypeGraph, TypeId) {
    // type A interface { M() }
    // type B interface { A; M() }
    let mut g = TypeGraph::new();
    let m_a = method(&mut g, "M", &[], Pos::new(1, 20));
    let lit_a = g.interface(vec![m_a]);
    let a = declare(&mut g, "A", 1, lit_a);

    let m_b = method(&mut g, "M", &[], Pos::new(2, 23));
    let lit_b = g.interface(vec![Field::embedded(a).at(Pos::new(2, 20)), m_b]);
    let b = declare(&mut g, "B", 2, lit_b);
    (g, b)
}

#[test]
fn test_identical_inherited_method_is_merged() {
    let (g, b) = embedding_graph();
    let mut e = amd64(g);
    ok(e.compute(b));

    assert!(codes(&e).is_empty());
    assert_eq!(e.graph().fields(b).len(), 1);
    assert_eq!(e.graph().fields(b)[0].pos, Pos::new(2, 23));
    assert_eq!(layout_of(&e, b), (16, 8));
}

#[test]
fn test_identical_inherited_method_rejected_when_disallowed() {
    let (g, b) = embedding_graph();
    let config = LayoutConfig {
        allow_identical_embedded_duplicates: false,
        ..LayoutConfig::default()
    };
    let mut e = LayoutEngine::with_machine(g, Machine::amd64(), config);
    ok(e.compute(b));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E2031);
    assert_eq!(diags[0].message, "duplicate method M");
    // Reported at the embedding site.
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(2, 20)));
    assert_eq!(e.graph().fields(b).len(), 2);
}

#[test]
fn test_explicit_duplicate_always_reported() {
    let mut g = TypeGraph::new();
    let m1 = method(&mut g, "M", &[], Pos::new(1, 15));
    let m2 = method(&mut g, "M", &[], Pos::new(1, 20));
    let i = g.interface(vec![m1, m2]);

    let mut e = amd64(g);
    ok(e.compute(i));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E2031);
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(1, 20)));
}

#[test]
fn test_conflicting_inherited_methods() {
    let mut g = TypeGraph::new();
    let m_a = method(&mut g, "M", &[], Pos::new(1, 20));
    let lit_a = g.interface(vec![m_a]);
    let a = declare(&mut g, "A", 1, lit_a);
    let m_c = method(&mut g, "M", &[TypeId::INT], Pos::new(2, 20));
    let lit_c = g.interface(vec![m_c]);
    let c = declare(&mut g, "C", 2, lit_c);
    let both = g.interface(vec![
        Field::embedded(a).at(Pos::new(3, 15)),
        Field::embedded(c).at(Pos::new(3, 18)),
    ]);

    let mut e = amd64(g);
    ok(e.compute(both));

    assert_eq!(codes(&e), vec![ErrorCode::E2031]);
    assert_eq!(
        e.diagnostics().next().and_then(|d| d.primary_pos()),
        Some(Pos::new(3, 18))
    );
}

#[test]
fn test_embedded_non_interface() {
    let mut g = TypeGraph::new();
    let i = g.interface(vec![Field::embedded(TypeId::INT).at(Pos::new(3, 2))]);

    let mut e = amd64(g);
    ok(e.compute(i));

    let diags: Vec<_> = e.diagnostics().cloned().collect();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::E2032);
    assert_eq!(
        diags[0].message,
        "interface contains embedded non-interface int"
    );
    assert_eq!(diags[0].primary_pos(), Some(Pos::new(3, 2)));

    assert!(e.graph().is_broken(i));
    let entries = e.graph().fields(i);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].broken);
    assert_eq!(layout_of(&e, i), (16, 8));
}

#[test]
fn test_interface_too_large() {
    let mut g = TypeGraph::new();
    let m = method(&mut g, "M", &[], Pos::new(1, 15));
    let n = method(&mut g, "N", &[], Pos::new(1, 20));
    let lit = g.interface(vec![m, n]);
    let i = declare(&mut g, "Wide", 1, lit);

    let machine = Machine::new(8, 8, 16).unwrap_or_else(|e| panic!("{e}"));
    let mut e = LayoutEngine::with_machine(g, machine, LayoutConfig::default());
    ok(e.compute(i));

    assert_eq!(codes(&e), vec![ErrorCode::E2033]);
    assert_eq!(
        e.diagnostics().next().and_then(|d| d.primary_pos()),
        Some(Pos::new(1, 6))
    );
    assert_eq!(offsets(&e, i), vec![0, 8]);
}

// === Function frames ===

#[test]
fn test_func_argument_frame() {
    // func(int8, int64) bool
    let mut g = TypeGraph::new();
    let f = g.func(
        Vec::new(),
        vec![Field::embedded(TypeId::INT8), Field::embedded(TypeId::INT64)],
        vec![Field::embedded(TypeId::BOOL)],
        false,
    );

    let mut e = amd64(g);
    ok(e.compute(f));

    assert_eq!(layout_of(&e, f), (8, 8));
    assert_eq!(e.graph().arg_width(f), Some(24));

    let (recvs, params, results) = params_of(&e, f);
    assert_eq!(layout_of(&e, recvs), (0, 1));
    assert_eq!(offsets(&e, params), vec![0, 8]);
    assert_eq!(layout_of(&e, params), (16, 8));
    assert_eq!(offsets(&e, results), vec![16]);
    assert_eq!(layout_of(&e, results), (8, 8));
    assert!(codes(&e).is_empty());
}

#[test]
fn test_method_frame_with_receiver() {
    // func (t *T) f(int8) int32
    let mut g = TypeGraph::new();
    let t = g.declare("T", Pos::new(1, 6));
    ok(g.define(t, TypeId::INT));
    let recv_ty = g.ptr(t);
    let recv = field(&mut g, "t", recv_ty);
    let f = g.func(
        vec![recv],
        vec![Field::embedded(TypeId::INT8)],
        vec![Field::embedded(TypeId::INT32)],
        false,
    );

    let mut e = amd64(g);
    ok(e.compute(f));

    let (recvs, params, results) = params_of(&e, f);
    assert_eq!(offsets(&e, recvs), vec![0]);
    // Parameters continue right after the receiver, unrounded.
    assert_eq!(offsets(&e, params), vec![8]);
    assert_eq!(layout_of(&e, params), (1, 1));
    assert_eq!(offsets(&e, results), vec![12]);
    assert_eq!(e.graph().arg_width(f), Some(16));
    assert_eq!(layout_of(&e, t), (8, 8));
}

#[test]
fn test_argument_groups_cannot_be_laid_out_alone() {
    let mut g = TypeGraph::new();
    let f = g.func(
        Vec::new(),
        vec![Field::embedded(TypeId::INT)],
        Vec::new(),
        false,
    );

    let mut e = amd64(g);
    let (_, params, _) = params_of(&e, f);

    assert!(matches!(
        e.compute(params),
        Err(LayoutError::FuncArgStruct { .. })
    ));
    assert!(matches!(
        e.request_lazy(params),
        Err(LayoutError::FuncArgStruct { .. })
    ));
}

// === Deferred queue ===

#[test]
fn test_request_lazy_outside_scope_computes_now() {
    let mut g = TypeGraph::new();
    let p = g.ptr(TypeId::INT16);

    let mut e = amd64(g);
    ok(e.request_lazy(p));

    assert_eq!(layout_of(&e, p), (8, 8));
    assert_eq!(layout_of(&e, TypeId::INT16), (2, 2));
    assert_eq!(e.pending(), 0);
}

#[test]
fn test_deferred_requests_park_once() {
    let mut g = TypeGraph::new();
    let p = g.ptr(TypeId::INT16);
    let s = g.slice(TypeId::INT16);

    let mut e = amd64(g);
    e.enter_nested();
    ok(e.request_lazy(p));
    ok(e.request_lazy(p));
    ok(e.request_lazy(s));
    assert_eq!(e.pending(), 2);
    assert_eq!(e.graph().layout(p), None);

    e.enter_nested();
    ok(e.leave_nested());
    // Only the outermost scope drains.
    assert_eq!(e.pending(), 2);

    ok(e.leave_nested());
    assert_eq!(e.pending(), 0);
    assert_eq!(e.nesting_depth(), 0);
    assert_eq!(layout_of(&e, p), (8, 8));
    assert_eq!(layout_of(&e, s), (24, 8));
}

#[test]
fn test_unbalanced_nesting() {
    let mut e = amd64(TypeGraph::new());
    assert_eq!(e.leave_nested(), Err(LayoutError::UnbalancedNesting));
}

// === Engine state ===

#[test]
fn test_machine_must_be_set() {
    let mut e = LayoutEngine::new(TypeGraph::new(), LayoutConfig::default());
    assert_eq!(e.compute(TypeId::INT), Err(LayoutError::MachineNotSet));

    ok(e.set_machine(Machine::amd64()));
    assert_eq!(
        e.set_machine(Machine::amd64()),
        Err(LayoutError::MachineAlreadySet)
    );
    ok(e.compute(TypeId::INT));
    assert_eq!(layout_of(&e, TypeId::INT), (8, 8));
}

#[test]
fn test_frozen_engine() {
    let mut e = amd64(TypeGraph::new());
    ok(e.compute(TypeId::INT));
    e.freeze();
    assert!(e.is_frozen());

    ok(e.compute(TypeId::INT));
    assert_eq!(
        e.compute(TypeId::STRING),
        Err(LayoutError::Frozen {
            ty: "string".into()
        })
    );
    assert!(e.graph().is_broken(TypeId::STRING));
    // Broken now, so asking again is quiet.
    ok(e.compute(TypeId::STRING));
}

#[test]
fn test_error_limit_and_take_diagnostics() {
    let mut g = TypeGraph::new();
    let a = g.array(TypeId::INT64, 1 << 48);
    let a = g.at(a, Pos::new(9, 1));
    let b = g.array(TypeId::INT32, 1 << 49);
    let b = g.at(b, Pos::new(2, 1));
    let c = g.array(TypeId::INT16, 1 << 50);
    let c = g.at(c, Pos::new(5, 1));

    let config = LayoutConfig {
        diagnostics: DiagnosticConfig {
            error_limit: 2,
            deduplicate: true,
        },
        ..LayoutConfig::default()
    };
    let mut e = LayoutEngine::with_machine(g, Machine::amd64(), config);
    ok(e.compute_all([a, b, c]));

    assert!(e.limit_reached());
    assert_eq!(e.error_count(), 2);

    let diags = e.take_diagnostics();
    let lines: Vec<_> = diags
        .iter()
        .map(|d| (d.code, d.primary_pos().map(|p| p.line)))
        .collect();
    // Drained last in first out: `c` and `b` fit under the limit, `a` is
    // dropped. The limit note has no position and sorts after them.
    assert_eq!(
        lines,
        vec![
            (ErrorCode::E2030, Some(2)),
            (ErrorCode::E2030, Some(5)),
            (ErrorCode::E9002, Some(0)),
        ]
    );
    assert_eq!(e.error_count(), 0);
}

#[test]
fn test_internal_error_diagnostic() {
    let diag = LayoutError::MachineNotSet.to_diagnostic(Pos::new(1, 1));
    assert_eq!(diag.code, ErrorCode::E9001);
    assert_eq!(diag.severity, Severity::Error);
    assert!(diag.message.starts_with("internal compiler error: "));
}

#[test]
fn test_into_graph_keeps_layouts() {
    let mut g = TypeGraph::new();
    let p = g.ptr(TypeId::INT8);
    let mut e = amd64(g);
    ok(e.compute(p));

    let g = e.into_graph();
    assert_eq!(g.layout(p).map(|l| l.width), Some(8));
}

// === Declaration order ===

#[test]
fn test_name_defined_before_its_target() {
    // type B A; type A struct { x int32 }
    let mut g = TypeGraph::new();
    let b = g.declare("B", Pos::new(1, 6));
    let a = g.declare("A", Pos::new(2, 6));
    ok(g.define(b, a));
    let x = field(&mut g, "x", TypeId::INT32);
    let lit = g.structure(vec![x]);
    ok(g.define(a, lit));

    let mut e = amd64(g);
    ok(e.compute(b));
    ok(e.compute(a));

    assert_eq!(layout_of(&e, b), (4, 4));
    assert_eq!(layout_of(&e, a), (4, 4));
    assert_eq!(offsets(&e, b), vec![0]);
    assert!(!e.graph().is_broken(b));
    assert!(codes(&e).is_empty());
}

#[test]
fn test_embedded_name_defined_out_of_order() {
    // type I interface { J }; type J K; type K interface { M() }
    let mut g = TypeGraph::new();
    let i = g.declare("I", Pos::new(1, 6));
    let j = g.declare("J", Pos::new(2, 6));
    let k = g.declare("K", Pos::new(3, 6));
    let lit_i = g.interface(vec![Field::embedded(j).at(Pos::new(1, 18))]);
    ok(g.define(i, lit_i));
    ok(g.define(j, k));
    let m = method(&mut g, "M", &[], Pos::new(3, 18));
    let lit_k = g.interface(vec![m]);
    ok(g.define(k, lit_k));

    let mut e = amd64(g);
    ok(e.compute(i));

    assert!(codes(&e).is_empty());
    assert_eq!(e.graph().fields(i).len(), 1);
    assert_eq!(layout_of(&e, i), (16, 8));
}

#[test]
fn test_inherited_methods_with_reordered_interface_parameters() {
    // type A interface { M(interface { P(); Q() }) }
    // type C interface { M(interface { Q(); P() }) }
    // interface { A; C }
    let mut g = TypeGraph::new();
    let p1 = method(&mut g, "P", &[], Pos::new(1, 30));
    let q1 = method(&mut g, "Q", &[], Pos::new(1, 35));
    let pq = g.interface(vec![p1, q1]);
    let m_a = method(&mut g, "M", &[pq], Pos::new(1, 20));
    let lit_a = g.interface(vec![m_a]);
    let a = declare(&mut g, "A", 1, lit_a);

    let q2 = method(&mut g, "Q", &[], Pos::new(2, 30));
    let p2 = method(&mut g, "P", &[], Pos::new(2, 35));
    let qp = g.interface(vec![q2, p2]);
    let m_c = method(&mut g, "M", &[qp], Pos::new(2, 20));
    let lit_c = g.interface(vec![m_c]);
    let c = declare(&mut g, "C", 2, lit_c);

    let both = g.interface(vec![
        Field::embedded(a).at(Pos::new(3, 15)),
        Field::embedded(c).at(Pos::new(3, 18)),
    ]);

    let mut e = amd64(g);
    ok(e.compute(both));

    assert!(codes(&e).is_empty());
    assert_eq!(e.graph().fields(both).len(), 1);
}
