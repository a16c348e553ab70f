//! Per-route operation configuration.
//!
//! [`OperationBuilder`] collects the documentation for one route. Its methods
//! run in call order against an empty [`Operation`]; the request and response
//! schemas captured from the handler's types are merged in afterwards, so
//! description-only settings never erase a body schema.

use crate::reflect::Reflect;
use crate::schema::SchemaNode;
use crate::specification::{
    MediaType, Operation, ParamLocation, Parameter, Response, APPLICATION_JSON,
};
use std::collections::BTreeMap;

/// Short alias used at route registration sites
pub type Op = OperationBuilder;

/// Chainable builder for an [`Operation`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationBuilder {
    operation: Operation,
    status: Option<u16>,
}

impl OperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation.operation_id = Some(operation_id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.operation.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.operation.description = Some(description.into());
        self
    }

    /// Append tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operation.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.tags([tag])
    }

    pub fn deprecated(mut self) -> Self {
        self.operation.deprecated = true;
        self
    }

    /// Append a fully built parameter
    pub fn param(mut self, param: Parameter) -> Self {
        self.operation.parameters.push(param);
        self
    }

    pub fn query_param<T: Reflect + ?Sized>(self, name: &str, description: &str) -> Self {
        self.typed_param::<T>(name, ParamLocation::Query, description)
    }

    pub fn path_param<T: Reflect + ?Sized>(self, name: &str, description: &str) -> Self {
        self.typed_param::<T>(name, ParamLocation::Path, description)
    }

    pub fn header_param<T: Reflect + ?Sized>(self, name: &str, description: &str) -> Self {
        self.typed_param::<T>(name, ParamLocation::Header, description)
    }

    pub fn cookie_param<T: Reflect + ?Sized>(self, name: &str, description: &str) -> Self {
        self.typed_param::<T>(name, ParamLocation::Cookie, description)
    }

    fn typed_param<T: Reflect + ?Sized>(
        self,
        name: &str,
        location: ParamLocation,
        description: &str,
    ) -> Self {
        let mut param = Parameter::of::<T>(name, location);
        if !description.is_empty() {
            param = param.description(description);
        }
        self.param(param)
    }

    /// Describe the request body, keeping any schema already attached
    pub fn request_description(mut self, description: impl Into<String>) -> Self {
        self.operation.request_body_mut().description = Some(description.into());
        self
    }

    /// Describe a response, keeping any schema already attached to it
    pub fn response_description(mut self, status: u16, description: impl Into<String>) -> Self {
        self.operation
            .response_mut(&status.to_string())
            .description = Some(description.into());
        self
    }

    /// Set a response slot wholesale
    pub fn response(mut self, status: u16, response: Response) -> Self {
        self.operation
            .responses
            .insert(status.to_string(), response);
        self
    }

    /// A response whose body is `T`, with the schema inlined
    pub fn response_of<T: Reflect + ?Sized>(self, status: u16, description: &str) -> Self {
        self.response(status, Response::of::<T>(description))
    }

    /// Status used for the handler's successful reply and its documented body
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace everything configured so far with `operation`
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    /// Status code that carries the primary response body
    ///
    /// An explicit [`status`](Self::status) wins. Otherwise a `200` slot is
    /// used when present, then the lowest 2xx slot that only has a
    /// description, and `200` as the fallback.
    pub fn primary_status(&self) -> u16 {
        if let Some(status) = self.status {
            return status;
        }
        let responses = &self.operation.responses;
        if responses.contains_key("200") {
            return 200;
        }
        responses
            .iter()
            .filter(|(_, response)| response.is_description_only())
            .filter_map(|(code, _)| code.parse::<u16>().ok())
            .filter(|code| (200..300).contains(code))
            .min()
            .unwrap_or(200)
    }

    /// The operation as configured, without any injected schemas
    pub fn build(self) -> Operation {
        self.operation
    }

    /// Merge the handler's request/response schemas into the operation
    ///
    /// Returns the finished operation and the primary status code.
    pub fn finish(
        self,
        request: Option<SchemaNode>,
        response: Option<SchemaNode>,
    ) -> (Operation, u16) {
        let status = self.primary_status();
        let mut operation = self.operation;

        if let Some(schema) = request {
            let body = operation.request_body_mut();
            body.required = true;
            json_media(&mut body.content).schema = Some(schema);
        }

        if let Some(schema) = response {
            let slot = operation.response_mut(&status.to_string());
            json_media(&mut slot.content).schema = Some(schema);
        }

        (operation, status)
    }
}

// Existing examples on the media type are kept
fn json_media(content: &mut BTreeMap<String, MediaType>) -> &mut MediaType {
    content.entry(APPLICATION_JSON.to_string()).or_default()
}

impl From<Operation> for OperationBuilder {
    fn from(operation: Operation) -> Self {
        Self::new().operation(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;

    fn body_ref() -> SchemaNode {
        SchemaNode::reference("#/components/schemas/models_Body")
    }

    #[test]
    fn test_options_apply_in_order() {
        let op = Op::new()
            .operation_id("get-user")
            .summary("Get")
            .description("first")
            .description("second")
            .tags(["users", "admin"])
            .tag("extra")
            .deprecated()
            .build();

        assert_eq!(op.operation_id.as_deref(), Some("get-user"));
        assert_eq!(op.summary.as_deref(), Some("Get"));
        assert_eq!(op.description.as_deref(), Some("second"));
        assert_eq!(op.tags, vec!["users", "admin", "extra"]);
        assert!(op.deprecated);
    }

    #[test]
    fn test_typed_params() {
        let op = Op::new()
            .path_param::<i64>("id", "Item ID")
            .query_param::<String>("include", "Fields to include")
            .header_param::<String>("x-trace", "")
            .cookie_param::<bool>("session", "Session flag")
            .build();

        assert_eq!(op.parameters.len(), 4);
        let id = op.parameter("id", ParamLocation::Path).unwrap();
        assert!(id.is_required());
        assert_eq!(id.schema.as_ref().and_then(|s| s.kind), Some(SchemaKind::Integer));

        let include = op.parameter("include", ParamLocation::Query).unwrap();
        assert!(!include.is_required());
        assert_eq!(include.description.as_deref(), Some("Fields to include"));

        let trace = op.parameter("x-trace", ParamLocation::Header).unwrap();
        assert!(trace.description.is_none());
    }

    #[test]
    fn test_description_merges_into_injected_response() {
        let (op, status) = Op::new()
            .response_description(200, "User information")
            .finish(None, Some(body_ref()));

        assert_eq!(status, 200);
        let response = &op.responses["200"];
        assert_eq!(response.description.as_deref(), Some("User information"));
        assert_eq!(response.json_schema(), Some(&body_ref()));
    }

    #[test]
    fn test_request_description_keeps_schema() {
        let (op, _) = Op::new()
            .request_description("The new user")
            .finish(Some(body_ref()), None);

        let body = op.request_body.unwrap();
        assert_eq!(body.description.as_deref(), Some("The new user"));
        assert!(body.required);
        assert_eq!(body.json_schema(), Some(&body_ref()));
    }

    #[test]
    fn test_primary_status_prefers_described_2xx_slot() {
        let builder = Op::new()
            .response_description(204, "Deleted")
            .response_description(202, "Accepted")
            .response_of::<String>(404, "Not found");
        assert_eq!(builder.primary_status(), 202);

        let (op, status) = builder.finish(None, Some(body_ref()));
        assert_eq!(status, 202);
        assert_eq!(op.responses["202"].json_schema(), Some(&body_ref()));
        assert!(op.responses["204"].content.is_empty());
        assert!(!op.responses.contains_key("200"));
    }

    #[test]
    fn test_explicit_status_wins() {
        let builder = Op::new().response_description(200, "OK").status(201);
        assert_eq!(builder.primary_status(), 201);
    }

    #[test]
    fn test_default_status_is_200() {
        assert_eq!(Op::new().primary_status(), 200);
        assert_eq!(
            Op::new().response_of::<String>(404, "Missing").primary_status(),
            200
        );
    }

    #[test]
    fn test_extra_responses_survive_injection() {
        let (op, _) = Op::new()
            .response_description(200, "OK")
            .response_of::<String>(404, "Not found")
            .finish(None, Some(body_ref()));

        assert_eq!(op.responses.len(), 2);
        let missing = op.responses["404"].json_schema().unwrap();
        assert!(!missing.is_reference());
        assert_eq!(missing.kind, Some(SchemaKind::String));
    }

    #[test]
    fn test_operation_replaces_everything_before_it() {
        let mut replacement = Operation::new();
        replacement.summary = Some("replaced".to_string());

        let op = Op::new()
            .summary("original")
            .tag("lost")
            .operation(replacement)
            .tag("kept")
            .build();

        assert_eq!(op.summary.as_deref(), Some("replaced"));
        assert_eq!(op.tags, vec!["kept"]);
    }
}
