//! JSON Schema nodes (the OpenAPI 3.0 Schema Object subset).
//!
//! A [`SchemaNode`] is either a reference into `#/components/schemas` or a
//! typed node whose populated fields depend on its [`SchemaKind`]. Nodes are
//! plain data; they are produced by [`crate::reflect`] and stored by value in
//! the [`crate::Definition`].

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// The `type` keyword of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
}

impl SchemaKind {
    /// Kinds that may carry `enum` values directly
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            SchemaKind::String | SchemaKind::Number | SchemaKind::Integer | SchemaKind::Boolean
        )
    }

    /// Kinds that may carry numeric bounds
    pub fn is_numeric(self) -> bool {
        matches!(self, SchemaKind::Number | SchemaKind::Integer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`SchemaKind`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown schema type: {0}")]
pub struct UnknownSchemaKind(pub String);

impl FromStr for SchemaKind {
    type Err = UnknownSchemaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "object" => Ok(SchemaKind::Object),
            "array" => Ok(SchemaKind::Array),
            "string" => Ok(SchemaKind::String),
            "number" => Ok(SchemaKind::Number),
            "integer" => Ok(SchemaKind::Integer),
            "boolean" => Ok(SchemaKind::Boolean),
            other => Err(UnknownSchemaKind(other.to_string())),
        }
    }
}

/// A JSON Schema node
///
/// `kind == None` is the "unset" node the reflector produces for types it
/// does not recognise. When `reference` is set it is the only thing that gets
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchemaNode {
    /// `#/components/schemas/...`
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: Option<SchemaKind>,

    #[serde(default)]
    pub nullable: bool,

    /// Present iff `kind` is object
    #[serde(default)]
    pub properties: Option<BTreeMap<String, SchemaNode>>,

    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: Option<Box<SchemaNode>>,

    #[serde(default)]
    pub items: Option<Box<SchemaNode>>,

    #[serde(rename = "enum", default)]
    pub enum_values: Vec<Value>,

    /// Names of required properties; never serialized when empty
    #[serde(default)]
    pub required: BTreeSet<String>,

    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(rename = "exclusiveMaximum", default)]
    pub exclusive_maximum: Option<f64>,
    #[serde(rename = "exclusiveMinimum", default)]
    pub exclusive_minimum: Option<f64>,

    #[serde(rename = "maxLength", default)]
    pub max_length: Option<usize>,
    #[serde(rename = "minLength", default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub format: Option<String>,

    #[serde(rename = "maxItems", default)]
    pub max_items: Option<usize>,
    #[serde(rename = "minItems", default)]
    pub min_items: Option<usize>,
}

impl SchemaNode {
    /// A node of the given kind with every other field empty
    pub fn of_kind(kind: SchemaKind) -> Self {
        let mut node = Self {
            kind: Some(kind),
            ..Default::default()
        };
        if kind == SchemaKind::Object {
            node.properties = Some(BTreeMap::new());
        }
        node
    }

    /// An empty object node (`properties` present, no required names)
    pub fn object() -> Self {
        Self::of_kind(SchemaKind::Object)
    }

    /// An array node with the given element schema
    pub fn array(items: SchemaNode) -> Self {
        Self {
            kind: Some(SchemaKind::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// A reference-only node
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }

    /// True when neither a kind nor a reference has been determined
    pub fn is_unset(&self) -> bool {
        self.kind.is_none() && self.reference.is_none()
    }

    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Look up a property of an object node
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties.as_ref().and_then(|props| props.get(name))
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// Borrowed view used for the non-reference serialization path
#[derive(Serialize)]
struct NodeRepr<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<SchemaKind>,
    #[serde(skip_serializing_if = "is_false")]
    nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<&'a BTreeMap<String, SchemaNode>>,
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    additional_properties: Option<&'a SchemaNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<&'a SchemaNode>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    enum_values: Option<&'a Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<&'a BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum: Option<f64>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    exclusive_maximum: Option<f64>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    exclusive_minimum: Option<f64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<&'a String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a String>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    max_items: Option<usize>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    min_items: Option<usize>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(reference) = &self.reference {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry("$ref", reference)?;
            return map.end();
        }

        NodeRepr {
            description: self.description.as_ref(),
            kind: self.kind,
            nullable: self.nullable,
            properties: self.properties.as_ref().filter(|props| !props.is_empty()),
            additional_properties: self.additional_properties.as_deref(),
            items: self.items.as_deref(),
            enum_values: Some(&self.enum_values).filter(|values| !values.is_empty()),
            required: Some(&self.required).filter(|names| !names.is_empty()),
            maximum: self.maximum,
            minimum: self.minimum,
            exclusive_maximum: self.exclusive_maximum,
            exclusive_minimum: self.exclusive_minimum,
            max_length: self.max_length,
            min_length: self.min_length,
            pattern: self.pattern.as_ref(),
            format: self.format.as_ref(),
            max_items: self.max_items,
            min_items: self.min_items,
        }
        .serialize(serializer)
    }
}
