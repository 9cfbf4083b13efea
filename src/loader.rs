//! Loading universes, manifests, templates and headers.
//!
//! JSON documents come from files, strings, or HTTP URLs. Every document is
//! validated against its embedded schema before it is deserialized.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::emit::Templates;
use crate::error::LoadError;
use crate::manifest::Manifest;
use crate::oracle::TypeUniverse;
use crate::template::Template;
use crate::types::{is_identifier, FieldDescriptor, QualifiedName, SourceSchema, TypeRef};
use crate::validator::{validate_manifest, validate_universe};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Template file names looked up by [`load_templates`].
pub const STRUCT_TEMPLATE_FILE: &str = "struct.tmpl";
pub const FIELD_TEMPLATE_FILE: &str = "field.tmpl";
pub const ENUM_TEMPLATE_FILE: &str = "enum.tmpl";
pub const FILE_TEMPLATE_FILE: &str = "file.tmpl";

#[derive(Debug, Deserialize)]
pub(crate) struct RawUniverse {
    pub types: Vec<RawType>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawType {
    pub package: String,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub fields: Vec<RawField>,
    #[serde(default)]
    pub underlying: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub tag: String,
}

/// Read a text file.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::ReadError` if it can't be read.
pub fn read_text(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::InvalidJson` if the file isn't valid JSON.
pub fn load_json(path: &Path) -> Result<Value, LoadError> {
    let content = read_text(path)?;
    load_json_str(&content)
}

/// Load a JSON document from a string.
pub fn load_json_str(content: &str) -> Result<Value, LoadError> {
    serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a JSON document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the response
/// status is not a success.
#[cfg(feature = "remote")]
pub fn load_json_url(url: &str) -> Result<Value, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    let response = client.get(url).send().map_err(network)?;

    // Check for HTTP errors before parsing
    let response = response.error_for_status().map_err(network)?;

    response.json().map_err(network)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a JSON document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_json_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_json_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_json(Path::new(source))
    }
}

/// Build a type universe from a parsed document.
///
/// # Errors
///
/// Returns `LoadError::Validate` when the document violates the universe
/// schema and `LoadError::InvalidDocument` for invalid names, duplicate types
/// or fields, and unparsable field types.
pub fn universe_from_value(document: &Value) -> Result<TypeUniverse, LoadError> {
    validate_universe(document)?;
    let raw = raw_universe(document)?;

    let mut universe = TypeUniverse::new();
    for (index, raw_type) in raw.types.iter().enumerate() {
        let schema = convert_type(index, raw_type)?;
        if universe.contains(&schema.name) {
            return Err(LoadError::InvalidDocument {
                path: format!("/types/{}", index),
                message: format!("duplicate type {}", schema.name),
            });
        }
        universe.insert(schema);
    }
    Ok(universe)
}

/// Load a type universe from a file.
pub fn load_universe(path: &Path) -> Result<TypeUniverse, LoadError> {
    universe_from_value(&load_json(path)?)
}

/// Load a type universe from a JSON string.
pub fn load_universe_str(content: &str) -> Result<TypeUniverse, LoadError> {
    universe_from_value(&load_json_str(content)?)
}

/// Load a type universe from a file path or URL.
pub fn load_universe_auto(source: &str) -> Result<TypeUniverse, LoadError> {
    universe_from_value(&load_json_auto(source)?)
}

/// Build a manifest from a parsed document.
pub fn manifest_from_value(document: &Value) -> Result<Manifest, LoadError> {
    validate_manifest(document)?;
    serde_json::from_value(document.clone()).map_err(|source| LoadError::InvalidJson { source })
}

/// Load a manifest from a file.
pub fn load_manifest(path: &Path) -> Result<Manifest, LoadError> {
    manifest_from_value(&load_json(path)?)
}

/// Load a manifest from a JSON string.
pub fn load_manifest_str(content: &str) -> Result<Manifest, LoadError> {
    manifest_from_value(&load_json_str(content)?)
}

/// Override templates in `base` with any template files present in `dir`.
///
/// Recognized names are `struct.tmpl`, `field.tmpl`, `enum.tmpl` and `file.tmpl`.
pub fn load_templates(dir: &Path, base: Templates) -> Result<Templates, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut templates = base;
    if let Some(t) = load_template_file(dir, STRUCT_TEMPLATE_FILE, "struct")? {
        templates = templates.with_structure(t);
    }
    if let Some(t) = load_template_file(dir, FIELD_TEMPLATE_FILE, "field")? {
        templates = templates.with_field(t);
    }
    if let Some(t) = load_template_file(dir, ENUM_TEMPLATE_FILE, "enum")? {
        templates = templates.with_enumeration(t);
    }
    if let Some(t) = load_template_file(dir, FILE_TEMPLATE_FILE, "file")? {
        templates = templates.with_file(t);
    }
    Ok(templates)
}

// --- Internal implementation ---

pub(crate) fn raw_universe(document: &Value) -> Result<RawUniverse, LoadError> {
    RawUniverse::deserialize(document).map_err(|source| LoadError::InvalidJson { source })
}

fn load_template_file(dir: &Path, file: &str, name: &str) -> Result<Option<Template>, LoadError> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(None);
    }
    let text = read_text(&path)?;
    Template::parse(name, &text)
        .map(Some)
        .map_err(|source| LoadError::Template { path, source })
}

pub(crate) fn convert_type(index: usize, raw: &RawType) -> Result<SourceSchema, LoadError> {
    if !is_identifier(&raw.name) {
        return Err(invalid(
            format!("/types/{}/name", index),
            format!("\"{}\" is not a valid type name", raw.name),
        ));
    }
    let name = QualifiedName::new(raw.package.as_str(), raw.name.as_str());

    match raw.kind.as_str() {
        "struct" => {
            let mut seen = BTreeSet::new();
            let mut fields = Vec::with_capacity(raw.fields.len());
            for (position, field) in raw.fields.iter().enumerate() {
                fields.push(convert_field(index, position, field, &name, &mut seen)?);
            }
            Ok(SourceSchema::structure(name, fields))
        }
        "basic" => {
            let underlying = raw.underlying.as_deref().unwrap_or("").trim();
            if !is_identifier(underlying) {
                return Err(invalid(
                    format!("/types/{}/underlying", index),
                    format!("\"{}\" is not a basic type", underlying),
                ));
            }
            Ok(SourceSchema::basic(name, underlying))
        }
        other => Ok(SourceSchema::unsupported(name, other)),
    }
}

fn convert_field(
    index: usize,
    position: usize,
    raw: &RawField,
    owner: &QualifiedName,
    seen: &mut BTreeSet<String>,
) -> Result<FieldDescriptor, LoadError> {
    let path = format!("/types/{}/fields/{}", index, position);
    if raw.name.is_empty() {
        return Err(invalid(format!("{}/name", path), "empty field name".to_string()));
    }
    if !seen.insert(raw.name.clone()) {
        return Err(invalid(
            format!("{}/name", path),
            format!("duplicate field {} in {}", raw.name, owner),
        ));
    }
    let ty = TypeRef::parse(&raw.ty)
        .map_err(|e| invalid(format!("{}/type", path), e.to_string()))?;
    Ok(FieldDescriptor::new(
        raw.name.as_str(),
        ty,
        raw.tag.as_str(),
        owner.clone(),
    ))
}

fn invalid(path: String, message: String) -> LoadError {
    LoadError::InvalidDocument { path, message }
}
