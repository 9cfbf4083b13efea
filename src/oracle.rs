//! Type descriptor oracle.
//!
//! The rest of the crate only asks two questions of the type system: "what is
//! the type with this qualified name" and "what are its fields". [`TypeOracle`]
//! is that seam; [`TypeUniverse`] is the in-memory implementation backed by a
//! universe document.

use std::collections::BTreeMap;

use crate::types::{QualifiedName, SourceSchema};

/// Read-only lookup of named types.
pub trait TypeOracle {
    /// Look up a type by qualified name. `None` means the type is unknown.
    fn lookup(&self, name: &QualifiedName) -> Option<&SourceSchema>;

    /// Look up a type by name within a package scope.
    fn lookup_in(&self, package: &str, name: &str) -> Option<&SourceSchema> {
        self.lookup(&QualifiedName::new(package, name))
    }
}

/// A set of named types indexed by qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeUniverse {
    types: BTreeMap<QualifiedName, SourceSchema>,
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type, returning the previous definition with the same name.
    pub fn insert(&mut self, schema: SourceSchema) -> Option<SourceSchema> {
        self.types.insert(schema.name.clone(), schema)
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.types.contains_key(name)
    }

    /// All types, ordered by qualified name.
    pub fn iter(&self) -> impl Iterator<Item = &SourceSchema> {
        self.types.values()
    }

    /// Types declared in one package, ordered by name.
    pub fn package_types<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a SourceSchema> {
        self.types
            .values()
            .filter(move |schema| schema.name.package == package)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeOracle for TypeUniverse {
    fn lookup(&self, name: &QualifiedName) -> Option<&SourceSchema> {
        self.types.get(name)
    }
}

impl FromIterator<SourceSchema> for TypeUniverse {
    fn from_iter<I: IntoIterator<Item = SourceSchema>>(iter: I) -> Self {
        let mut universe = TypeUniverse::new();
        for schema in iter {
            universe.insert(schema);
        }
        universe
    }
}
