//! Import alias bookkeeping for rendered field types.
//!
//! Every external package referenced by an emitted field gets an alias. Aliases
//! are always written out, even when the alias equals the package's last path
//! segment, because a package's declared name does not have to match its path.
//!
//! Alias selection for a path looks at, in order:
//!
//! 1. the last path segment (`example.com/aws/rds` -> `rds`),
//! 2. longer path suffixes joined together (`awsrds`, `examplecomawsrds`),
//! 3. the last segment with a numeric suffix (`rds2`, `rds3`, ...),
//!
//! taking the first candidate not held by another path, not equal to the local
//! package name, and not a Go keyword or predeclared identifier. The choice depends only on the path and the aliases
//! assigned before it.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::TypeRefError;
use crate::types::TypeRef;

/// Keywords and predeclared identifiers an alias must not shadow.
const RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var", "any", "bool", "byte", "comparable",
    "complex64", "complex128", "error", "float32", "float64", "int", "int8", "int16", "int32",
    "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64", "uintptr", "true",
    "false", "iota", "nil", "append", "cap", "clear", "close", "complex", "copy", "delete",
    "imag", "len", "make", "max", "min", "new", "panic", "print", "println", "real", "recover",
];

/// Package path to alias table for one output file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportTable {
    local_path: String,
    local_name: String,
    aliases: BTreeMap<String, String>,
    taken: BTreeSet<String>,
}

impl ImportTable {
    /// Table for a file declared in package `local_name` at `local_path`.
    pub fn new(local_path: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            local_name: local_name.into(),
            ..Self::default()
        }
    }

    pub fn local_path(&self) -> &str {
        &self.local_path
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Alias for `path`, assigning one on first use.
    pub fn use_package(&mut self, path: &str) -> String {
        if let Some(alias) = self.aliases.get(path) {
            return alias.clone();
        }
        let alias = self.pick_alias(path);
        self.taken.insert(alias.clone());
        self.aliases.insert(path.to_string(), alias.clone());
        alias
    }

    /// Render `ty` with external packages replaced by their aliases.
    ///
    /// Names in the local package (or with no package) render bare.
    pub fn use_type(&mut self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Basic(name) => name.clone(),
            TypeRef::Named(name) => {
                if name.package.is_empty() || name.package == self.local_path {
                    name.name.clone()
                } else {
                    format!("{}.{}", self.use_package(&name.package), name.name)
                }
            }
            TypeRef::Pointer(inner) => format!("*{}", self.use_type(inner)),
            TypeRef::Slice(inner) => format!("[]{}", self.use_type(inner)),
            TypeRef::Array(len, inner) => format!("[{}]{}", len, self.use_type(inner)),
            TypeRef::Map(key, value) => {
                let key = self.use_type(key);
                format!("map[{}]{}", key, self.use_type(value))
            }
            TypeRef::Opaque(text) => text.clone(),
        }
    }

    /// Parse a fully qualified type reference and render it like [`use_type`].
    ///
    /// [`use_type`]: ImportTable::use_type
    pub fn use_type_text(&mut self, text: &str) -> Result<String, TypeRefError> {
        let ty = TypeRef::parse(text)?;
        Ok(self.use_type(&ty))
    }

    pub fn alias_of(&self, path: &str) -> Option<&str> {
        self.aliases.get(path).map(String::as_str)
    }

    /// `(path, alias)` pairs sorted by path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(p, a)| (p.as_str(), a.as_str()))
    }

    /// Import lines `alias "path"`, sorted by path.
    pub fn statements(&self) -> Vec<String> {
        self.iter()
            .map(|(path, alias)| format!("{} \"{}\"", alias, path))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    fn is_free(&self, alias: &str) -> bool {
        !alias.is_empty()
            && alias != self.local_name
            && !RESERVED.contains(&alias)
            && !self.taken.contains(alias)
    }

    fn pick_alias(&self, path: &str) -> String {
        let segments: Vec<String> = path
            .split('/')
            .map(sanitize)
            .filter(|s| !s.is_empty())
            .collect();

        for start in (0..segments.len()).rev() {
            let candidate = identifier(segments[start..].concat());
            if self.is_free(&candidate) {
                return candidate;
            }
        }

        let base = identifier(segments.last().cloned().unwrap_or_default());
        let mut n = 2usize;
        loop {
            let candidate = format!("{}{}", base, n);
            if self.is_free(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Lowercase ASCII alphanumerics of a path segment.
fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Make sure an alias does not start with a digit.
fn identifier(alias: String) -> String {
    match alias.chars().next() {
        None => "pkg".to_string(),
        Some(c) if c.is_ascii_digit() => format!("pkg{}", alias),
        Some(_) => alias,
    }
}
