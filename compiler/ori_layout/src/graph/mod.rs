//! The type graph.
//!
//! An arena of type nodes addressed by [`TypeId`]. Children (element types,
//! fields, method types) are stored as ids, so declared types may refer to
//! each other in any shape, including cycles.
//!
//! The graph is built by the front end (or by tests) through the constructor
//! methods below, then handed to a [`LayoutEngine`](crate::LayoutEngine) which
//! fills in widths, alignments and offsets in place.

mod flags;
mod format;
mod id;
mod identical;
mod kind;

pub use flags::{LayoutFlags, Width};
pub use id::TypeId;
pub use kind::{ChanDir, Field, Kind};

use ori_ir::{Name, Pos, StringInterner};
use rustc_hash::FxHashMap;

use crate::LayoutError;

/// Declaration of a named type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeSym {
    pub name: Name,
    pub pos: Pos,
    /// Declared in the compilation unit being laid out.
    pub local: bool,
    /// The type expression on the right-hand side of the declaration.
    pub rhs: Option<TypeId>,
}

/// Finished width and alignment of a type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Layout {
    pub width: i64,
    pub align: u8,
}

/// One node of the type graph.
#[derive(Clone, Debug)]
pub struct TypeNode {
    pub(crate) kind: Kind,
    pub(crate) width: Width,
    /// 0 until a kind handler or the default rule sets it.
    pub(crate) align: u8,
    pub(crate) flags: LayoutFlags,
    pub(crate) sym: Option<TypeSym>,
    pub(crate) pos: Pos,
}

impl TypeNode {
    fn new(kind: Kind, pos: Pos) -> Self {
        TypeNode {
            kind,
            width: Width::Unset,
            align: 0,
            flags: LayoutFlags::empty(),
            sym: None,
            pos,
        }
    }

    #[inline]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    #[inline]
    pub fn width(&self) -> Width {
        self.width
    }

    #[inline]
    pub fn align(&self) -> u8 {
        self.align
    }

    #[inline]
    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    #[inline]
    pub fn sym(&self) -> Option<&TypeSym> {
        self.sym.as_ref()
    }

    /// Declaration position for named types, literal position otherwise.
    #[inline]
    pub fn pos(&self) -> Pos {
        self.pos
    }
}

/// Arena of type nodes.
#[derive(Clone, Debug)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    interner: StringInterner,
    /// Argument frame size per function type.
    arg_widths: FxHashMap<TypeId, i64>,
    /// Named types defined as a name that is still `Forward`, keyed by that name.
    waiting: FxHashMap<TypeId, Vec<TypeId>>,
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeGraph {
    /// Create a graph holding only the primitive types.
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(256);
        for kind in Kind::PRIMITIVES {
            nodes.push(TypeNode::new(kind, Pos::NONE));
        }
        TypeGraph {
            nodes,
            interner: StringInterner::new(),
            arg_widths: FxHashMap::default(),
            waiting: FxHashMap::default(),
        }
    }

    // === Names ===

    pub fn intern(&mut self, s: &str) -> Name {
        self.interner.intern(s)
    }

    pub fn name_str(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    // === Construction ===

    /// Add a node of any kind.
    pub fn add(&mut self, kind: Kind, pos: Pos) -> TypeId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "type graphs never approach u32::MAX nodes"
        )]
        let id = TypeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(TypeNode::new(kind, pos));
        id
    }

    pub fn ptr(&mut self, elem: TypeId) -> TypeId {
        self.add(Kind::Ptr { elem }, Pos::NONE)
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.add(Kind::Slice { elem }, Pos::NONE)
    }

    pub fn array(&mut self, elem: TypeId, len: i64) -> TypeId {
        self.add(Kind::Array { elem, len }, Pos::NONE)
    }

    pub fn map(&mut self, key: TypeId, elem: TypeId) -> TypeId {
        self.add(Kind::Map { key, elem }, Pos::NONE)
    }

    pub fn chan(&mut self, elem: TypeId, dir: ChanDir) -> TypeId {
        self.add(Kind::Chan { elem, dir }, Pos::NONE)
    }

    pub fn structure(&mut self, fields: Vec<Field>) -> TypeId {
        self.add(
            Kind::Struct {
                fields,
                funarg: false,
            },
            Pos::NONE,
        )
    }

    /// An interface from explicit methods and embedded-interface entries.
    pub fn interface(&mut self, entries: Vec<Field>) -> TypeId {
        self.add(Kind::Interface { methods: entries }, Pos::NONE)
    }

    /// A function type. Each group becomes its own argument struct node.
    pub fn func(
        &mut self,
        recvs: Vec<Field>,
        params: Vec<Field>,
        results: Vec<Field>,
        variadic: bool,
    ) -> TypeId {
        let mut group = |fields| {
            self.add(
                Kind::Struct {
                    fields,
                    funarg: true,
                },
                Pos::NONE,
            )
        };
        let recvs = group(recvs);
        let params = group(params);
        let results = group(results);
        self.add(
            Kind::Func {
                recvs,
                params,
                results,
                variadic,
            },
            Pos::NONE,
        )
    }

    /// Declare a local named type. Its kind stays `Forward` until `define`.
    pub fn declare(&mut self, name: &str, pos: Pos) -> TypeId {
        self.declare_sym(name, pos, true)
    }

    /// Declare a named type imported from another compilation unit.
    pub fn declare_imported(&mut self, name: &str, pos: Pos) -> TypeId {
        self.declare_sym(name, pos, false)
    }

    fn declare_sym(&mut self, name: &str, pos: Pos, local: bool) -> TypeId {
        let name = self.interner.intern(name);
        let id = self.add(Kind::Forward, pos);
        self.nodes[id.index()].sym = Some(TypeSym {
            name,
            pos,
            local,
            rhs: None,
        });
        id
    }

    /// Give a declared type its definition.
    ///
    /// The named node takes a copy of the right-hand side's kind and records
    /// `rhs` as the declaration's type expression. Declarations may be defined
    /// in any order: when `rhs` is a name still waiting for its definition,
    /// `named` picks up the kind once that definition arrives.
    pub fn define(&mut self, named: TypeId, rhs: TypeId) -> Result<(), LayoutError> {
        let kind = self.nodes[rhs.index()].kind.clone();
        let node = &mut self.nodes[named.index()];
        let Some(sym) = node.sym.as_mut() else {
            return Err(LayoutError::NotNamed(named));
        };
        sym.rhs = Some(rhs);
        node.kind = kind;

        if node.kind == Kind::Forward {
            self.waiting.entry(rhs).or_default().push(named);
        } else {
            self.resolve_waiting(named);
        }
        Ok(())
    }

    /// Hand the kind of a newly defined name to every name defined as it,
    /// directly or through a chain of names.
    fn resolve_waiting(&mut self, defined: TypeId) {
        let mut stack = vec![defined];
        while let Some(t) = stack.pop() {
            let Some(waiters) = self.waiting.remove(&t) else {
                continue;
            };
            let kind = self.nodes[t.index()].kind.clone();
            for w in waiters {
                self.nodes[w.index()].kind = kind.clone();
                stack.push(w);
            }
        }
    }

    /// Set a node's source position.
    pub fn set_pos(&mut self, id: TypeId, pos: Pos) {
        self.nodes[id.index()].pos = pos;
    }

    /// Builder form of [`set_pos`](Self::set_pos).
    pub fn at(&mut self, id: TypeId, pos: Pos) -> TypeId {
        self.set_pos(id, pos);
        id
    }

    // === Queries ===

    #[inline]
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: TypeId) -> &Kind {
        &self.nodes[id.index()].kind
    }

    #[inline]
    pub fn flags(&self, id: TypeId) -> LayoutFlags {
        self.nodes[id.index()].flags
    }

    #[inline]
    pub fn sym(&self, id: TypeId) -> Option<&TypeSym> {
        self.nodes[id.index()].sym.as_ref()
    }

    #[inline]
    pub fn pos(&self, id: TypeId) -> Pos {
        self.nodes[id.index()].pos
    }

    /// Final width, once computed (a broken type reports its fallback).
    pub fn width(&self, id: TypeId) -> Option<i64> {
        self.nodes[id.index()].width.known()
    }

    /// Final alignment, or 0 before layout.
    pub fn align(&self, id: TypeId) -> u8 {
        self.nodes[id.index()].align
    }

    /// Width and alignment, once both are final.
    pub fn layout(&self, id: TypeId) -> Option<Layout> {
        let node = &self.nodes[id.index()];
        if !node.flags.contains(LayoutFlags::COMPUTED) {
            return None;
        }
        node.width.known().map(|width| Layout {
            width,
            align: node.align,
        })
    }

    pub fn is_computed(&self, id: TypeId) -> bool {
        self.flags(id).contains(LayoutFlags::COMPUTED)
    }

    pub fn is_broken(&self, id: TypeId) -> bool {
        self.flags(id).contains(LayoutFlags::BROKEN)
    }

    /// Struct fields or interface entries (empty for other kinds).
    ///
    /// After layout, an interface's entries are its expanded method set.
    pub fn fields(&self, id: TypeId) -> &[Field] {
        match &self.nodes[id.index()].kind {
            Kind::Struct { fields, .. } => fields,
            Kind::Interface { methods } => methods,
            _ => &[],
        }
    }

    /// Argument frame size of a function type, once its frame is laid out.
    pub fn arg_width(&self, func: TypeId) -> Option<i64> {
        self.arg_widths.get(&func).copied()
    }

    /// Number of nodes, primitives included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A graph always holds the primitives, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    // === Engine access ===

    #[inline]
    pub(crate) fn node_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn fields_mut(&mut self, id: TypeId) -> &mut [Field] {
        match &mut self.nodes[id.index()].kind {
            Kind::Struct { fields, .. } => fields,
            Kind::Interface { methods } => methods,
            _ => &mut [],
        }
    }

    pub(crate) fn set_methods(&mut self, id: TypeId, new: Vec<Field>) {
        if let Kind::Interface { methods } = &mut self.nodes[id.index()].kind {
            *methods = new;
        }
    }

    pub(crate) fn set_arg_width(&mut self, func: TypeId, width: i64) {
        self.arg_widths.insert(func, width);
    }

    pub(crate) fn insert_flags(&mut self, id: TypeId, flags: LayoutFlags) {
        self.nodes[id.index()].flags.insert(flags);
    }

    pub(crate) fn remove_flags(&mut self, id: TypeId, flags: LayoutFlags) {
        self.nodes[id.index()].flags.remove(flags);
    }
}
