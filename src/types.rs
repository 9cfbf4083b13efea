//! Core types: qualified names, type references, fields, schemas and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeRefError;

/// Type literals passed through verbatim instead of being parsed.
const OPAQUE_PREFIXES: &[&str] = &[
    "interface{",
    "interface {",
    "func(",
    "func (",
    "struct{",
    "struct {",
    "chan ",
    "chan<- ",
    "<-chan ",
];

/// Identity of a named type: the package path it lives in and its name.
///
/// Ordered by package path, then name. The textual form is `package.Name`;
/// built-in names such as `error` have an empty package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    pub package: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Parse `package.Name`, splitting at the last `.`.
    ///
    /// Package paths may themselves contain dots (`example.com/rds`), names may not.
    pub fn parse(text: &str) -> Result<Self, TypeRefError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TypeRefError::Empty);
        }
        let (package, name) = match text.rsplit_once('.') {
            Some((package, name)) => (package, name),
            None => ("", text),
        };
        if !is_identifier(name) {
            return Err(TypeRefError::Invalid {
                text: text.to_string(),
                message: format!("\"{}\" is not a valid type name", name),
            });
        }
        if text.contains('.') && package.is_empty() {
            return Err(TypeRefError::Invalid {
                text: text.to_string(),
                message: "missing package path".to_string(),
            });
        }
        Ok(Self::new(package, name))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = TypeRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = TypeRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QualifiedName> for String {
    fn from(value: QualifiedName) -> Self {
        value.to_string()
    }
}

/// Reference to a type as it appears in a field declaration.
///
/// Parsed from and displayed as Go type syntax, e.g. `*[]example.com/rds.Tag`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// Predeclared kind such as `string` or `int64`.
    Basic(String),
    Named(QualifiedName),
    Pointer(Box<TypeRef>),
    Slice(Box<TypeRef>),
    Array(usize, Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    /// Interface, func and channel literals, kept as written.
    Opaque(String),
}

impl TypeRef {
    pub fn parse(text: &str) -> Result<Self, TypeRefError> {
        parse_ref(text, text)
    }

    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRef::Named(QualifiedName::new(package, name))
    }

    pub fn pointer(inner: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(inner))
    }

    pub fn slice(inner: TypeRef) -> Self {
        TypeRef::Slice(Box::new(inner))
    }

    /// Every named type reachable through pointer, slice, array and map indirections.
    pub fn named_refs(&self) -> Vec<&QualifiedName> {
        let mut out = Vec::new();
        self.collect_named(&mut out);
        out
    }

    fn collect_named<'a>(&'a self, out: &mut Vec<&'a QualifiedName>) {
        match self {
            TypeRef::Named(name) => out.push(name),
            TypeRef::Pointer(inner) | TypeRef::Slice(inner) | TypeRef::Array(_, inner) => {
                inner.collect_named(out)
            }
            TypeRef::Map(key, value) => {
                key.collect_named(out);
                value.collect_named(out);
            }
            TypeRef::Basic(_) | TypeRef::Opaque(_) => {}
        }
    }

    /// Rebuild the reference with every named component passed through `f`.
    pub fn map_named<F>(&self, f: &F) -> TypeRef
    where
        F: Fn(&QualifiedName) -> QualifiedName,
    {
        match self {
            TypeRef::Named(name) => TypeRef::Named(f(name)),
            TypeRef::Pointer(inner) => TypeRef::Pointer(Box::new(inner.map_named(f))),
            TypeRef::Slice(inner) => TypeRef::Slice(Box::new(inner.map_named(f))),
            TypeRef::Array(len, inner) => TypeRef::Array(*len, Box::new(inner.map_named(f))),
            TypeRef::Map(key, value) => {
                TypeRef::Map(Box::new(key.map_named(f)), Box::new(value.map_named(f)))
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Basic(name) => f.write_str(name),
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Pointer(inner) => write!(f, "*{}", inner),
            TypeRef::Slice(inner) => write!(f, "[]{}", inner),
            TypeRef::Array(len, inner) => write!(f, "[{}]{}", len, inner),
            TypeRef::Map(key, value) => write!(f, "map[{}]{}", key, value),
            TypeRef::Opaque(text) => f.write_str(text),
        }
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

/// A single field of a struct-shaped schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Never empty; unique within the owning schema.
    pub name: String,
    pub ty: TypeRef,
    /// Serialization metadata, passed through verbatim.
    pub tag: String,
    /// The source type that declared this field.
    pub origin: QualifiedName,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        ty: TypeRef,
        tag: impl Into<String>,
        origin: QualifiedName,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: tag.into(),
            origin,
        }
    }
}

/// Representation of a named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    /// Record with a list of fields.
    Struct { fields: Vec<FieldDescriptor> },
    /// Enum-like alias over a single primitive.
    Basic { underlying: String },
    /// Anything else (interfaces, function types, ...).
    Unsupported { kind: String },
}

impl TypeShape {
    /// Short kind name as used in universe documents.
    pub fn kind(&self) -> &str {
        match self {
            TypeShape::Struct { .. } => "struct",
            TypeShape::Basic { .. } => "basic",
            TypeShape::Unsupported { kind } => kind,
        }
    }
}

/// A named type as supplied by the type oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSchema {
    pub name: QualifiedName,
    pub shape: TypeShape,
}

impl SourceSchema {
    pub fn structure(name: QualifiedName, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name,
            shape: TypeShape::Struct { fields },
        }
    }

    pub fn basic(name: QualifiedName, underlying: impl Into<String>) -> Self {
        Self {
            name,
            shape: TypeShape::Basic {
                underlying: underlying.into(),
            },
        }
    }

    pub fn unsupported(name: QualifiedName, kind: impl Into<String>) -> Self {
        Self {
            name,
            shape: TypeShape::Unsupported { kind: kind.into() },
        }
    }

    /// Fields of a struct-shaped schema; empty for every other shape.
    pub fn fields(&self) -> &[FieldDescriptor] {
        match &self.shape {
            TypeShape::Struct { fields } => fields,
            _ => &[],
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.shape, TypeShape::Struct { .. })
    }
}

/// CRUD operation category a source type is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    CreateInput,
    ReadInput,
    UpdateInput,
    DeletionInput,
    CreateOutput,
    ReadOutput,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::CreateInput,
        Role::ReadInput,
        Role::UpdateInput,
        Role::DeletionInput,
        Role::CreateOutput,
        Role::ReadOutput,
    ];

    /// Input roles in aggregation order; later roles win collisions.
    pub const INPUTS: [Role; 4] = [
        Role::CreateInput,
        Role::ReadInput,
        Role::UpdateInput,
        Role::DeletionInput,
    ];

    /// Output roles in aggregation order; later roles win collisions.
    pub const OUTPUTS: [Role; 2] = [Role::ReadOutput, Role::CreateOutput];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::CreateInput => "create_input",
            Role::ReadInput => "read_input",
            Role::UpdateInput => "update_input",
            Role::DeletionInput => "deletion_input",
            Role::CreateOutput => "create_output",
            Role::ReadOutput => "read_output",
        }
    }

    pub fn is_input(&self) -> bool {
        Role::INPUTS.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if `s` is a valid identifier (letter or underscore, then alphanumerics).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

// --- Internal implementation ---

fn parse_ref(text: &str, full: &str) -> Result<TypeRef, TypeRefError> {
    let text = text.trim();
    if text.is_empty() {
        return if full.trim().is_empty() {
            Err(TypeRefError::Empty)
        } else {
            Err(invalid(full, "missing element type"))
        };
    }

    if let Some(rest) = text.strip_prefix('*') {
        return Ok(TypeRef::Pointer(Box::new(parse_ref(rest, full)?)));
    }
    if let Some(rest) = text.strip_prefix("[]") {
        return Ok(TypeRef::Slice(Box::new(parse_ref(rest, full)?)));
    }
    if let Some(inner) = text.strip_prefix("map[") {
        let close = matching_bracket(inner).ok_or_else(|| invalid(full, "unclosed map key"))?;
        let key = parse_ref(&inner[..close], full)?;
        let value = parse_ref(&inner[close + 1..], full)?;
        return Ok(TypeRef::Map(Box::new(key), Box::new(value)));
    }
    if let Some(rest) = text.strip_prefix('[') {
        let (len, elem) = rest
            .split_once(']')
            .ok_or_else(|| invalid(full, "unclosed array length"))?;
        let len = len
            .trim()
            .parse::<usize>()
            .map_err(|_| invalid(full, &format!("invalid array length \"{}\"", len)))?;
        return Ok(TypeRef::Array(len, Box::new(parse_ref(elem, full)?)));
    }
    if OPAQUE_PREFIXES.iter().any(|p| text.starts_with(p)) {
        return Ok(TypeRef::Opaque(text.to_string()));
    }
    if text.contains('.') {
        return QualifiedName::parse(text)
            .map(TypeRef::Named)
            .map_err(|e| match e {
                TypeRefError::Invalid { message, .. } => invalid(full, &message),
                other => other,
            });
    }
    if is_identifier(text) {
        return Ok(TypeRef::Basic(text.to_string()));
    }
    Err(invalid(full, &format!("unexpected \"{}\"", text)))
}

/// Index of the `]` closing an already-opened `[`.
fn matching_bracket(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn invalid(text: &str, message: &str) -> TypeRefError {
    TypeRefError::Invalid {
        text: text.to_string(),
        message: message.to_string(),
    }
}
