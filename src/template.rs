//! Placeholder substitution for declaration and file templates.
//!
//! Templates are plain text with `{{ .Key }}` placeholders. The leading dot is
//! optional. `{{-` trims whitespace before the placeholder and `-}}` trims
//! whitespace after it, the same way Go templates do. There are no conditionals,
//! loops or functions: anything that needs deciding is decided before rendering.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::error::TemplateError;
use crate::types::is_identifier;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Value(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `text` into a template called `name`.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Parse` for unclosed or empty placeholders and
    /// placeholder keys that are not identifiers.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let mut segments = Vec::new();
        let mut rest = text;
        let mut trim_next = false;

        while let Some(start) = rest.find("{{") {
            let offset = text.len() - rest.len() + start;
            let mut literal = &rest[..start];
            if trim_next {
                literal = literal.trim_start();
            }

            let mut after = &rest[start + 2..];
            if let Some(trimmed) = after.strip_prefix('-') {
                literal = literal.trim_end();
                after = trimmed;
            }
            if !literal.is_empty() {
                segments.push(Segment::Text(literal.to_string()));
            }

            let end = after.find("}}").ok_or_else(|| TemplateError::Parse {
                template: name.clone(),
                message: format!("unclosed action at byte {}", offset),
            })?;
            let mut action = &after[..end];
            trim_next = false;
            if let Some(trimmed) = action.strip_suffix('-') {
                action = trimmed;
                trim_next = true;
            }

            let key = action.trim();
            let key = key.strip_prefix('.').unwrap_or(key);
            if key.is_empty() {
                return Err(TemplateError::Parse {
                    template: name,
                    message: format!("empty action at byte {}", offset),
                });
            }
            if !is_identifier(key) {
                return Err(TemplateError::Parse {
                    template: name,
                    message: format!("unsupported action \"{}\" at byte {}", action.trim(), offset),
                });
            }
            segments.push(Segment::Value(key.to_string()));
            rest = &after[end + 2..];
        }

        let literal = if trim_next { rest.trim_start() } else { rest };
        if !literal.is_empty() {
            segments.push(Segment::Text(literal.to_string()));
        }

        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder keys in order of appearance.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Value(key) => Some(key.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Substitute every placeholder from `values`.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::MissingValue` naming the first key with no value.
    pub fn render<K, V>(&self, values: &BTreeMap<K, V>) -> Result<String, TemplateError>
    where
        K: Borrow<str> + Ord,
        V: AsRef<str>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Value(key) => {
                    let value = values.get(key.as_str()).ok_or_else(|| {
                        TemplateError::MissingValue {
                            template: self.name.clone(),
                            key: key.clone(),
                        }
                    })?;
                    out.push_str(value.as_ref());
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &'static str)]) -> BTreeMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn substitutes_values() {
        let t = Template::parse("enum", "type {{ .Name }} {{.Underlying}}").unwrap();
        let out = t
            .render(&values(&[("Name", "Engine"), ("Underlying", "string")]))
            .unwrap();
        assert_eq!(out, "type Engine string");
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["Name", "Underlying"]);
        assert_eq!(t.name(), "enum");
    }

    #[test]
    fn dot_is_optional() {
        let t = Template::parse("t", "{{ Name }}").unwrap();
        assert_eq!(t.render(&values(&[("Name", "x")])).unwrap(), "x");
    }

    #[test]
    fn trim_markers() {
        let t = Template::parse("t", "a  \n{{- .X -}}\n  b").unwrap();
        assert_eq!(t.render(&values(&[("X", "-")])).unwrap(), "a-b");
    }

    #[test]
    fn braces_next_to_actions() {
        let t = Template::parse("struct", "type {{ .Name }} struct {\n{{ .Fields }}}").unwrap();
        let out = t
            .render(&values(&[("Name", "Tag"), ("Fields", "\tKey string\n")]))
            .unwrap();
        assert_eq!(out, "type Tag struct {\n\tKey string\n}");
    }

    #[test]
    fn owned_value_bags() {
        let t = Template::parse("t", "{{ .A }}").unwrap();
        let mut bag: BTreeMap<String, String> = BTreeMap::new();
        bag.insert("A".to_string(), "owned".to_string());
        assert_eq!(t.render(&bag).unwrap(), "owned");
    }

    #[test]
    fn unclosed_action_is_parse_error() {
        let err = Template::parse("t", "type {{ .Name ").unwrap_err();
        assert!(matches!(err, TemplateError::Parse { ref template, .. } if template == "t"));
    }

    #[test]
    fn empty_or_logic_action_is_parse_error() {
        assert!(matches!(
            Template::parse("t", "{{ }}"),
            Err(TemplateError::Parse { .. })
        ));
        assert!(matches!(
            Template::parse("t", "{{ range .Fields }}"),
            Err(TemplateError::Parse { .. })
        ));
    }

    #[test]
    fn missing_value_is_execution_error() {
        let t = Template::parse("field", "{{ .Name }} {{ .Type }}").unwrap();
        let err = t.render(&values(&[("Name", "ID")])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingValue {
                template: "field".into(),
                key: "Type".into(),
            }
        );
    }

    #[test]
    fn text_without_actions() {
        let t = Template::parse("t", "plain").unwrap();
        assert_eq!(t.render(&BTreeMap::<String, String>::new()).unwrap(), "plain");
    }
}
