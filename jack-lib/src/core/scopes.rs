//! The two tier symbol table used during compilation
//!
//! The class tier holds statics and fields and lives as long as the class is being compiled.
//! The subroutine tier holds arguments and locals and is thrown away whenever a new subroutine
//! starts. Lookups go from the subroutine tier outwards, so a local or argument shadows a field
//! or static with the same name. Starting a subroutine swaps in an empty `im` map instead of
//! clearing the old one in place.

use im::HashMap as ImHashMap;
use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;

use crate::core::Segment;

/// What kind of variable a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Static,
    Field,
    Argument,
    Local,
}

impl Category {
    /// statics and fields belong to the class, the rest to the subroutine
    pub fn is_class_level(self) -> bool {
        matches!(self, Category::Static | Category::Field)
    }
}

impl From<Category> for Segment {
    fn from(cat: Category) -> Self {
        match cat {
            Category::Static => Segment::Static,
            Category::Field => Segment::This,
            Category::Argument => Segment::Argument,
            Category::Local => Segment::Local,
        }
    }
}

/// Compile time information about a declared name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub category: Category,
    pub declared_type: String,
    pub ordinal: usize,
}

impl Symbol {
    pub fn segment(&self) -> Segment {
        self.category.into()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("`{name}` is already declared as {category} in this scope")]
    AlreadyDefined { name: String, category: Category },
}

pub type Scope = ImHashMap<String, Symbol>;

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    class_tier: Scope,
    subroutine_tier: Scope,
    /// next ordinal per category, indexed by `counter_idx`
    counters: [usize; 4],
}

fn counter_idx(cat: Category) -> usize {
    match cat {
        Category::Static => 0,
        Category::Field => 1,
        Category::Argument => 2,
        Category::Local => 3,
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// forget everything, used when a new class starts
    pub fn start_class(&mut self) {
        *self = Self::default();
    }

    /// Drops the subroutine tier and resets argument and local ordinals.
    ///
    /// For methods argument 0 is the receiver, so user parameters start at 1.
    pub fn start_subroutine(&mut self, is_method: bool) {
        self.subroutine_tier = Scope::new();
        self.counters[counter_idx(Category::Argument)] = usize::from(is_method);
        self.counters[counter_idx(Category::Local)] = 0;
    }

    /// Adds a symbol to the tier that owns `category` and hands out the next ordinal for it.
    pub fn define(
        &mut self,
        name: &str,
        declared_type: &str,
        category: Category,
    ) -> Result<(), ScopeError> {
        let tier = if category.is_class_level() {
            &mut self.class_tier
        } else {
            &mut self.subroutine_tier
        };
        if let Some(existing) = tier.get(name) {
            return Err(ScopeError::AlreadyDefined {
                name: name.into(),
                category: existing.category,
            });
        }
        let counter = &mut self.counters[counter_idx(category)];
        tier.insert(
            name.into(),
            Symbol {
                name: name.into(),
                category,
                declared_type: declared_type.into(),
                ordinal: *counter,
            },
        );
        *counter += 1;
        Ok(())
    }

    /// subroutine tier first, then the class tier
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_tier
            .get(name)
            .or_else(|| self.class_tier.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// The next ordinal that `category` would hand out. For the arguments of a method this
    /// includes the receiver slot.
    pub fn count_of(&self, category: Category) -> usize {
        self.counters[counter_idx(category)]
    }
}
