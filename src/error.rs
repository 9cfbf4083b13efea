//! Error types for loading, flattening, emission and generation.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Role;

/// Errors parsing a textual type reference or qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeRefError {
    #[error("empty type reference")]
    Empty,

    #[error("invalid type reference \"{text}\": {message}")]
    Invalid { text: String, message: String },
}

/// Errors loading universe and manifest documents.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Validate(#[from] ValidateError),

    #[error("invalid document at {path}: {message}")]
    InvalidDocument { path: String, message: String },

    #[error("{path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors validating a document against its embedded JSON Schema.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("invalid document schema: {message}")]
    InvalidSchema { message: String },

    #[error("document failed validation with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors computing the dependency closure of a type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("type {name} referenced by field {field} of {referenced_by} is not known")]
    TypeNotFound {
        name: String,
        referenced_by: String,
        field: String,
    },
}

/// Errors parsing or executing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("cannot parse template {template}: {message}")]
    Parse { template: String, message: String },

    #[error("cannot execute template {template}: no value for \"{key}\"")]
    MissingValue { template: String, key: String },
}

/// Errors rendering a closure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("cannot print type {type_name}: {source}")]
    Template {
        type_name: String,
        #[source]
        source: TemplateError,
    },
}

/// Errors running a generation manifest end to end.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("target {target}: invalid {role} type name \"{name}\": {source}")]
    InvalidTypeName {
        target: String,
        role: Role,
        name: String,
        #[source]
        source: TypeRefError,
    },

    #[error("target {target}: unknown {role} type {name}")]
    UnknownSourceType {
        target: String,
        role: Role,
        name: String,
    },

    #[error("target {target}: {source}")]
    Flatten {
        target: String,
        #[source]
        source: FlattenError,
    },

    #[error("target {target}: {source}")]
    Emit {
        target: String,
        #[source]
        source: EmitError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}
