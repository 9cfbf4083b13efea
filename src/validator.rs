//! Document validation against embedded JSON Schemas.

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};

/// JSON Schema for type universe documents.
pub const UNIVERSE_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "crud-typegen type universe",
  "type": "object",
  "required": ["types"],
  "properties": {
    "types": { "type": "array", "items": { "$ref": "#/$defs/type" } }
  },
  "$defs": {
    "type": {
      "type": "object",
      "required": ["package", "name", "kind"],
      "properties": {
        "package": { "type": "string" },
        "name": { "type": "string", "minLength": 1 },
        "kind": { "type": "string", "minLength": 1 },
        "fields": { "type": "array", "items": { "$ref": "#/$defs/field" } },
        "underlying": { "type": "string", "minLength": 1 }
      },
      "additionalProperties": false,
      "if": { "required": ["kind"], "properties": { "kind": { "const": "basic" } } },
      "then": { "required": ["underlying"] }
    },
    "field": {
      "type": "object",
      "required": ["name", "type"],
      "properties": {
        "name": { "type": "string" },
        "type": { "type": "string" },
        "tag": { "type": "string" }
      },
      "additionalProperties": false
    }
  }
}"##;

/// JSON Schema for generation manifests.
pub const MANIFEST_SCHEMA: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "crud-typegen manifest",
  "type": "object",
  "required": ["package", "targets"],
  "properties": {
    "package": {
      "type": "object",
      "required": ["path", "name"],
      "properties": {
        "path": { "type": "string", "minLength": 1 },
        "name": { "type": "string", "minLength": 1 }
      },
      "additionalProperties": false
    },
    "declared": { "type": "array", "items": { "type": "string", "minLength": 1 } },
    "targets": { "type": "array", "items": { "$ref": "#/$defs/target" } }
  },
  "additionalProperties": false,
  "$defs": {
    "names": { "type": "array", "items": { "type": "string", "minLength": 1 } },
    "rules": { "type": "array", "items": { "$ref": "#/$defs/rule" } },
    "rule": {
      "type": "object",
      "minProperties": 1,
      "maxProperties": 1,
      "properties": {
        "name": { "type": "string" },
        "name_suffix": { "type": "string" },
        "tag_contains": { "type": "string" },
        "type": { "type": "string" }
      },
      "additionalProperties": false
    },
    "target": {
      "type": "object",
      "required": ["input"],
      "properties": {
        "input": { "type": "string", "minLength": 1 },
        "output": { "type": "string", "minLength": 1 },
        "roles": {
          "type": "object",
          "properties": {
            "create_input": { "$ref": "#/$defs/names" },
            "read_input": { "$ref": "#/$defs/names" },
            "update_input": { "$ref": "#/$defs/names" },
            "deletion_input": { "$ref": "#/$defs/names" },
            "create_output": { "$ref": "#/$defs/names" },
            "read_output": { "$ref": "#/$defs/names" }
          },
          "additionalProperties": false
        },
        "input_ignore": { "$ref": "#/$defs/rules" },
        "output_ignore": { "$ref": "#/$defs/rules" },
        "output_skips_input_fields": { "type": "boolean" },
        "markers": { "type": "string" }
      },
      "additionalProperties": false
    }
  }
}"##;

/// Validate a type universe document.
pub fn validate_universe(document: &Value) -> Result<(), ValidateError> {
    validate_against_embedded(UNIVERSE_SCHEMA, document)
}

/// Validate a generation manifest document.
pub fn validate_manifest(document: &Value) -> Result<(), ValidateError> {
    validate_against_embedded(MANIFEST_SCHEMA, document)
}

/// Validate a document against a JSON Schema, collecting every violation.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if `schema` does not compile, or
/// `ValidateError::Invalid` listing each violation with its instance path.
pub fn validate_against_schema(schema: &Value, document: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(document)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

fn validate_against_embedded(schema: &str, document: &Value) -> Result<(), ValidateError> {
    let schema: Value = serde_json::from_str(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;
    validate_against_schema(&schema, document)
}
