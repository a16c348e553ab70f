//! Per-field schema metadata and its application to reflected nodes.

use crate::schema::{SchemaKind, SchemaNode};
use serde_json::{Number, Value};

/// Declarative metadata attached to one struct field
///
/// Numeric values are kept as the raw strings they were declared with and are
/// parsed when applied. A value that does not parse is ignored, leaving the
/// constraint off the schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMeta {
    /// Wire name, when different from the member name
    pub rename: Option<String>,
    /// Leave the field out of the schema entirely
    pub skip: bool,
    /// The field may be absent; it is not listed as required
    pub omit_empty: bool,
    /// Merge the members of this field's record into the parent
    pub flatten: bool,

    pub description: Option<String>,
    /// Forced `type`, overriding the reflected kind
    pub kind: Option<String>,

    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub exclusive_minimum: Option<String>,
    pub exclusive_maximum: Option<String>,

    pub min_length: Option<String>,
    pub max_length: Option<String>,
    pub pattern: Option<String>,
    pub format: Option<String>,

    pub min_items: Option<String>,
    pub max_items: Option<String>,

    /// Comma separated list of allowed values
    pub enumeration: Option<String>,
}

impl FieldMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    pub fn flatten(mut self) -> Self {
        self.flatten = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn minimum(mut self, value: impl ToString) -> Self {
        self.minimum = Some(value.to_string());
        self
    }

    pub fn maximum(mut self, value: impl ToString) -> Self {
        self.maximum = Some(value.to_string());
        self
    }

    pub fn exclusive_minimum(mut self, value: impl ToString) -> Self {
        self.exclusive_minimum = Some(value.to_string());
        self
    }

    pub fn exclusive_maximum(mut self, value: impl ToString) -> Self {
        self.exclusive_maximum = Some(value.to_string());
        self
    }

    pub fn min_length(mut self, value: impl ToString) -> Self {
        self.min_length = Some(value.to_string());
        self
    }

    pub fn max_length(mut self, value: impl ToString) -> Self {
        self.max_length = Some(value.to_string());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn min_items(mut self, value: impl ToString) -> Self {
        self.min_items = Some(value.to_string());
        self
    }

    pub fn max_items(mut self, value: impl ToString) -> Self {
        self.max_items = Some(value.to_string());
        self
    }

    pub fn enumeration(mut self, values: impl Into<String>) -> Self {
        self.enumeration = Some(values.into());
        self
    }

    /// Apply the overrides to a freshly reflected field schema
    pub fn apply(&self, schema: &mut SchemaNode) {
        if let Some(description) = non_empty(&self.description) {
            schema.description = Some(description.to_string());
        }
        if let Some(kind) = non_empty(&self.kind).and_then(|k| k.parse::<SchemaKind>().ok()) {
            schema.kind = Some(kind);
            // Object members follow the overridden kind
            if kind == SchemaKind::Object {
                schema.properties.get_or_insert_with(Default::default);
            } else {
                schema.properties = None;
                schema.additional_properties = None;
                schema.required.clear();
            }
        }

        let Some(kind) = schema.kind else {
            return;
        };

        if kind.is_numeric() {
            if let Some(v) = parse_float(&self.maximum) {
                schema.maximum = Some(v);
            }
            if let Some(v) = parse_float(&self.minimum) {
                schema.minimum = Some(v);
            }
            if let Some(v) = parse_float(&self.exclusive_maximum) {
                schema.exclusive_maximum = Some(v);
            }
            if let Some(v) = parse_float(&self.exclusive_minimum) {
                schema.exclusive_minimum = Some(v);
            }
        }

        if kind == SchemaKind::Array {
            if let Some(v) = parse_count(&self.max_items) {
                schema.max_items = Some(v);
            }
            if let Some(v) = parse_count(&self.min_items) {
                schema.min_items = Some(v);
            }
        }

        if kind == SchemaKind::String {
            if let Some(v) = parse_count(&self.max_length) {
                schema.max_length = Some(v);
            }
            if let Some(v) = parse_count(&self.min_length) {
                schema.min_length = Some(v);
            }
            if let Some(format) = non_empty(&self.format) {
                schema.format = Some(format.to_string());
            }
            if let Some(pattern) = non_empty(&self.pattern) {
                schema.pattern = Some(pattern.to_string());
            }
        }

        let Some(list) = non_empty(&self.enumeration) else {
            return;
        };
        if kind == SchemaKind::Array {
            // Enumerates legal elements; the first writer wins
            if let Some(items) = schema.items.as_deref_mut() {
                if items.enum_values.is_empty() {
                    if let Some(element) = items.kind.filter(|k| k.is_scalar()) {
                        items.enum_values = parse_enum(list, element);
                    }
                }
            }
        } else if kind.is_scalar() {
            schema.enum_values = parse_enum(list, kind);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_float(value: &Option<String>) -> Option<f64> {
    non_empty(value)?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn parse_count(value: &Option<String>) -> Option<usize> {
    non_empty(value)?.trim().parse::<usize>().ok()
}

/// Parse a comma separated enum list for the given element kind, dropping
/// tokens that do not parse
pub(crate) fn parse_enum(list: &str, kind: SchemaKind) -> Vec<Value> {
    list.split(',')
        .map(str::trim)
        .filter_map(|token| match kind {
            SchemaKind::String => Some(Value::String(token.to_string())),
            SchemaKind::Integer => token.parse::<i64>().ok().map(Value::from),
            SchemaKind::Number => token
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            SchemaKind::Boolean => token.parse::<bool>().ok().map(Value::Bool),
            SchemaKind::Object | SchemaKind::Array => None,
        })
        .collect()
}
