//! String interner for identifiers in the type graph.
//!
//! The layout pass is single-threaded, so the interner is a plain owned table
//! rather than a sharded, lock-protected one.

use rustc_hash::FxHashMap;

use crate::Name;

/// Owns every interned string and hands out [`Name`] handles.
///
/// Index 0 is always the empty string.
#[derive(Clone, Debug)]
pub struct StringInterner {
    map: FxHashMap<Box<str>, Name>,
    strings: Vec<Box<str>>,
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl StringInterner {
    /// Create an interner holding only the empty string.
    pub fn new() -> Self {
        let mut interner = Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        };
        interner.strings.push(Box::from(""));
        interner.map.insert(Box::from(""), Name::EMPTY);
        interner
    }

    /// Intern a string, returning its Name.
    ///
    /// Interning the same string twice returns the same Name.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&name) = self.map.get(s) {
            return name;
        }

        #[expect(
            clippy::cast_possible_truncation,
            reason = "identifier tables never approach u32::MAX entries"
        )]
        let name = Name::from_raw(self.strings.len() as u32);
        self.strings.push(Box::from(s));
        self.map.insert(Box::from(s), name);
        name
    }

    /// Look up the string behind a Name.
    ///
    /// Names from a different interner resolve to `""` instead of panicking.
    pub fn lookup(&self, name: Name) -> &str {
        self.strings.get(name.index()).map_or("", |s| s)
    }

    /// Find the Name of an already-interned string without inserting it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.map.get(s).copied()
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// An interner always holds the empty string, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}
