//! Field exclusion chains applied during aggregation.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::FieldDescriptor;

/// Predicate deciding whether a field should be left out.
pub type IgnoreFieldFn = Box<dyn Fn(&FieldDescriptor) -> bool>;

/// Declarative exclusion rule, as written in a generation manifest.
///
/// ```json
/// [{ "name": "ID" }, { "tag_contains": "readonly" }, { "type": "*time.Time" }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreRule {
    /// Field name equals the value.
    Name(String),
    /// Field name ends with the value.
    NameSuffix(String),
    /// Raw tag contains the value.
    TagContains(String),
    /// Field type, written in type syntax, equals the value.
    Type(String),
}

impl IgnoreRule {
    pub fn matches(&self, field: &FieldDescriptor) -> bool {
        match self {
            IgnoreRule::Name(name) => field.name == *name,
            IgnoreRule::NameSuffix(suffix) => field.name.ends_with(suffix.as_str()),
            IgnoreRule::TagContains(needle) => field.tag.contains(needle.as_str()),
            IgnoreRule::Type(text) => field.ty.to_string() == text.trim(),
        }
    }
}

/// Chain of ignore predicates; a field is ignored if any predicate matches.
#[derive(Default)]
pub struct FieldFilter {
    predicates: Vec<IgnoreFieldFn>,
}

impl FieldFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from declarative rules, in order.
    pub fn from_rules(rules: impl IntoIterator<Item = IgnoreRule>) -> Self {
        rules.into_iter().fold(Self::new(), Self::with_rule)
    }

    /// Append an arbitrary predicate.
    pub fn with(mut self, predicate: impl Fn(&FieldDescriptor) -> bool + 'static) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn with_rule(self, rule: IgnoreRule) -> Self {
        self.with(move |field| rule.matches(field))
    }

    /// Append a predicate ignoring every field whose name is in `names`.
    pub fn excluding_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return self;
        }
        self.with(move |field| names.contains(&field.name))
    }

    /// True if any predicate in the chain matches. Stops at the first match.
    pub fn should_ignore(&self, field: &FieldDescriptor) -> bool {
        self.predicates.iter().any(|predicate| predicate(field))
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Debug for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldFilter")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}
