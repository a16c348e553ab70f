//! The OpenAPI 3.0 document model.
//!
//! Only the objects this crate produces are modelled. Maps are `BTreeMap` so
//! that serialized documents are stable, and every optional or empty member is
//! left out of the output.

use crate::config::DuplicatePolicy;
use crate::reflect::{reflect, Reflect};
use crate::schema::SchemaNode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The only media type populated automatically
pub const APPLICATION_JSON: &str = "application/json";

/// Complete OpenAPI 3.0 document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// OpenAPI specification version
    #[serde(rename = "openapi")]
    pub openapi_version: String,

    pub info: Info,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub servers: Vec<Server>,

    /// Path template to the operations registered on it
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub paths: BTreeMap<String, PathItem>,

    #[serde(skip_serializing_if = "Components::is_empty", default)]
    pub components: Components,

    #[serde(skip)]
    pub(crate) duplicate_policy: DuplicatePolicy,
}

/// API metadata information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub version: String,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "strut".to_string(),
            description: Some("strut".to_string()),
            version: "v0.0.1".to_string(),
        }
    }
}

/// Server the API is reachable on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl Server {
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            url: url.into(),
            description: (!description.is_empty()).then_some(description),
        }
    }
}

/// Operations available on a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Parameters shared by every operation on the path
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<Parameter>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub get: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub put: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub delete: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub patch: Option<Operation>,
}

impl PathItem {
    /// True when no verb has been registered
    pub fn is_empty(&self) -> bool {
        self.get.is_none()
            && self.put.is_none()
            && self.post.is_none()
            && self.delete.is_none()
            && self.patch.is_none()
    }
}

/// A single API operation on a path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    /// Unique across the whole definition
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operation_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub parameters: Vec<Parameter>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request_body: Option<RequestBody>,

    /// Status code to response
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub responses: BTreeMap<String, Response>,

    #[serde(skip_serializing_if = "is_false", default)]
    pub deprecated: bool,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a parameter by name and location
    pub fn parameter(&self, name: &str, location: ParamLocation) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }

    /// The response slot for a status code, created empty when missing
    pub fn response_mut(&mut self, status: &str) -> &mut Response {
        self.responses.entry(status.to_string()).or_default()
    }

    /// The request body, created empty when missing
    pub fn request_body_mut(&mut self) -> &mut RequestBody {
        self.request_body.get_or_insert_with(RequestBody::default)
    }
}

/// Where a parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Query,
    Path,
    Header,
    Cookie,
}

impl ParamLocation {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Query => "query",
            ParamLocation::Path => "path",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation parameter
///
/// Path parameters are always required; the flag cannot be cleared for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ParameterRepr")]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParamLocation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "is_false")]
    required: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub deprecated: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub allow_empty_value: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: ParamLocation, schema: SchemaNode) -> Self {
        Self {
            name: name.into(),
            location,
            description: None,
            required: location == ParamLocation::Path,
            deprecated: false,
            allow_empty_value: false,
            schema: Some(schema),
        }
    }

    /// A parameter whose schema is reflected from `T`
    pub fn of<T: Reflect + ?Sized>(name: impl Into<String>, location: ParamLocation) -> Self {
        Self::new(name, location, reflect::<T>())
    }

    pub fn query(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self::new(name, ParamLocation::Query, schema)
    }

    pub fn path(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self::new(name, ParamLocation::Path, schema)
    }

    pub fn header(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self::new(name, ParamLocation::Header, schema)
    }

    pub fn cookie(name: impl Into<String>, schema: SchemaNode) -> Self {
        Self::new(name, ParamLocation::Cookie, schema)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the parameter as required; has no effect on path parameters
    pub fn required(mut self, required: bool) -> Self {
        self.required = required || self.location == ParamLocation::Path;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn allow_empty_value(mut self) -> Self {
        self.allow_empty_value = true;
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParameterRepr {
    name: String,
    #[serde(rename = "in")]
    location: ParamLocation,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    deprecated: bool,
    #[serde(default)]
    allow_empty_value: bool,
    #[serde(default)]
    schema: Option<SchemaNode>,
}

impl From<ParameterRepr> for Parameter {
    fn from(repr: ParameterRepr) -> Self {
        Parameter {
            name: repr.name,
            location: repr.location,
            description: repr.description,
            required: repr.required || repr.location == ParamLocation::Path,
            deprecated: repr.deprecated,
            allow_empty_value: repr.allow_empty_value,
            schema: repr.schema,
        }
    }
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "is_false", default)]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    /// Schema of the JSON payload, if set
    pub fn json_schema(&self) -> Option<&SchemaNode> {
        self.content.get(APPLICATION_JSON)?.schema.as_ref()
    }
}

/// A documented response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub content: BTreeMap<String, MediaType>,
}

impl Response {
    /// A response carrying only a description
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            content: BTreeMap::new(),
        }
    }

    /// A response whose JSON body is `T`, inlined rather than referenced
    pub fn of<T: Reflect + ?Sized>(description: impl Into<String>) -> Self {
        Self::new(description).with_json_schema(reflect::<T>())
    }

    pub fn with_json_schema(mut self, schema: SchemaNode) -> Self {
        self.content
            .insert(APPLICATION_JSON.to_string(), MediaType::new(schema));
        self
    }

    /// Schema of the JSON payload, if set
    pub fn json_schema(&self) -> Option<&SchemaNode> {
        self.content.get(APPLICATION_JSON)?.schema.as_ref()
    }

    /// Only a description, no body
    pub fn is_description_only(&self) -> bool {
        self.description.is_some() && self.content.is_empty()
    }
}

/// Body shape for one media type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schema: Option<SchemaNode>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub example: Option<Value>,
}

impl MediaType {
    pub fn new(schema: SchemaNode) -> Self {
        Self {
            schema: Some(schema),
            example: None,
        }
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }
}

/// Reusable components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub schemas: BTreeMap<String, SchemaNode>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
