//! Registration of schemas and operations into a [`Definition`].

use crate::config::{DuplicatePolicy, StrutConfig};
use crate::error::{StrutError, StrutResult};
use crate::reflect::{reflect, Reflect};
use crate::schema::SchemaNode;
use crate::specification::{Components, Definition, Operation, ParamLocation, Parameter, PathItem};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of every component reference
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

static PATH_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("path variable pattern is valid"));

/// HTTP verbs an operation can be registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    /// Verbs whose operation documents a request body
    pub fn has_body(self) -> bool {
        matches!(self, Verb::Post | Verb::Put | Verb::Patch)
    }

    fn slot(self, item: &PathItem) -> &Option<Operation> {
        match self {
            Verb::Get => &item.get,
            Verb::Post => &item.post,
            Verb::Put => &item.put,
            Verb::Patch => &item.patch,
            Verb::Delete => &item.delete,
        }
    }

    fn slot_mut(self, item: &mut PathItem) -> &mut Option<Operation> {
        match self {
            Verb::Get => &mut item.get,
            Verb::Post => &mut item.post,
            Verb::Put => &mut item.put,
            Verb::Patch => &mut item.patch,
            Verb::Delete => &mut item.delete,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a Rust type, used to name its component schema
///
/// Derived from [`std::any::type_name`]: the module is the path segment just
/// before the type name and generic arguments are appended to the name, so
/// `app::models::Page<app::models::Item>` becomes `models_Page_Item`.
///
/// Arguments contribute their bare name only. `Page<a::Item>` and
/// `Page<b::Item>` share a component name, and the later registration
/// replaces the earlier schema, as any other same-named types do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeIdentity {
    pub module: Option<String>,
    pub name: String,
}

impl TypeIdentity {
    pub fn new(module: Option<&str>, name: &str) -> Self {
        Self {
            module: module.filter(|m| !m.is_empty()).map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn of<T: ?Sized>() -> Self {
        Self::from_type_name(std::any::type_name::<T>())
    }

    pub fn from_type_name(type_name: &str) -> Self {
        let ty = strip_prefixes(type_name);
        let (head, _) = split_generics(ty);
        let mut segments: Vec<&str> = head.split("::").collect();
        segments.pop();
        let module = segments.pop().map(sanitize).filter(|m| !m.is_empty());

        // Tuples and the unit type have no identifier of their own
        let name = Some(simple_name(ty))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unit".to_string());
        Self { module, name }
    }

    /// Key under `#/components/schemas`
    pub fn component_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{}_{}", module, self.name),
            None => self.name.clone(),
        }
    }

    /// `#/components/schemas/<name>`
    pub fn reference(&self) -> String {
        format!("{}{}", COMPONENTS_PREFIX, self.component_name())
    }
}

fn strip_prefixes(ty: &str) -> &str {
    let mut ty = ty.trim();
    loop {
        let next = ty
            .trim_start_matches('&')
            .trim_start_matches("mut ")
            .trim_start_matches("dyn ")
            .trim_start();
        let next = match next.strip_prefix('\'') {
            Some(rest) => rest.split_once(' ').map(|(_, t)| t).unwrap_or(rest),
            None => next,
        };
        if next == ty {
            return ty;
        }
        ty = next;
    }
}

fn split_generics(ty: &str) -> (&str, Option<&str>) {
    match ty.find('<') {
        Some(start) if ty.ends_with('>') => (&ty[..start], Some(&ty[start + 1..ty.len() - 1])),
        _ => (ty, None),
    }
}

fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

fn simple_name(ty: &str) -> String {
    let ty = strip_prefixes(ty);
    let (head, args) = split_generics(ty);
    let mut name = sanitize(head.rsplit("::").next().unwrap_or(head));
    for arg in args.map(split_top_level).unwrap_or_default() {
        let arg = simple_name(arg);
        if !arg.is_empty() {
            name.push('_');
            name.push_str(&arg);
        }
    }
    name
}

/// Keep identifier characters, collapsing everything else to single `_`
fn sanitize(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Names of the `{variable}` segments of an OpenAPI path template
pub fn path_variables(path: &str) -> Vec<String> {
    PATH_VARIABLE
        .captures_iter(path)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Rewrite an OpenAPI path template into axum's `:variable` syntax
pub fn to_router_path(path: &str) -> String {
    PATH_VARIABLE.replace_all(path, ":$1").into_owned()
}

impl Default for Definition {
    fn default() -> Self {
        Self::from_config(&StrutConfig::default())
    }
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty definition carrying the configured metadata
    pub fn from_config(config: &StrutConfig) -> Self {
        Self {
            openapi_version: config.openapi_version.clone(),
            info: config.info.clone(),
            servers: config.servers.clone(),
            paths: BTreeMap::new(),
            components: Components::default(),
            duplicate_policy: config.duplicate_policy,
        }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    pub fn set_duplicate_policy(&mut self, policy: DuplicatePolicy) {
        self.duplicate_policy = policy;
    }

    /// Store a schema under the type's component name, returning its reference
    ///
    /// Registering the same identity again replaces the stored schema.
    pub fn register_schema(&mut self, identity: &TypeIdentity, schema: SchemaNode) -> String {
        let name = identity.component_name();
        tracing::debug!(schema = %name, "registering component schema");
        self.components.schemas.insert(name, schema);
        identity.reference()
    }

    /// Reflect `T`, store it as a component and return a reference-only node
    pub fn register_type<T: Reflect + ?Sized>(&mut self) -> SchemaNode {
        let reference = self.register_schema(&TypeIdentity::of::<T>(), reflect::<T>());
        SchemaNode::reference(reference)
    }

    /// Look up a stored component by name
    pub fn schema(&self, name: &str) -> Option<&SchemaNode> {
        self.components.schemas.get(name)
    }

    /// Follow a `#/components/schemas/..` reference
    pub fn resolve<'a>(&'a self, node: &'a SchemaNode) -> Option<&'a SchemaNode> {
        match &node.reference {
            Some(reference) => self.schema(reference.strip_prefix(COMPONENTS_PREFIX)?),
            None => Some(node),
        }
    }

    /// Insert an operation under `path` and `verb`
    ///
    /// Template variables without a declared path parameter get one added as
    /// a required string. Conflicts are handled per the duplicate policy.
    pub fn register_operation(
        &mut self,
        path: &str,
        verb: Verb,
        mut operation: Operation,
    ) -> StrutResult<()> {
        for variable in path_variables(path) {
            if operation.parameter(&variable, ParamLocation::Path).is_none() {
                operation
                    .parameters
                    .push(Parameter::of::<String>(variable, ParamLocation::Path));
            }
        }

        let route_taken = self
            .paths
            .get(path)
            .is_some_and(|item| verb.slot(item).is_some());
        let id_taken = operation
            .operation_id
            .as_deref()
            .filter(|id| self.has_operation_id(id, path, verb));

        match self.duplicate_policy {
            DuplicatePolicy::Reject => {
                if route_taken {
                    return Err(StrutError::duplicate_route(verb, path));
                }
                if let Some(id) = id_taken {
                    return Err(StrutError::duplicate_operation_id(id));
                }
            }
            DuplicatePolicy::Overwrite => {
                if route_taken {
                    tracing::warn!(%verb, path, "overwriting previously registered route");
                }
                if let Some(id) = id_taken {
                    tracing::warn!(operation_id = id, "operationId is registered more than once");
                }
            }
        }

        tracing::debug!(%verb, path, "registering operation");
        *verb.slot_mut(self.paths.entry(path.to_string()).or_default()) = Some(operation);
        Ok(())
    }

    /// The operation registered under `path` and `verb`
    pub fn operation(&self, path: &str, verb: Verb) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| verb.slot(item).as_ref())
    }

    /// Every registered operation with its path and verb
    pub fn operations(&self) -> impl Iterator<Item = (&str, Verb, &Operation)> {
        const VERBS: [Verb; 5] = [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete];
        self.paths.iter().flat_map(|(path, item)| {
            VERBS.into_iter().filter_map(move |verb| {
                verb.slot(item)
                    .as_ref()
                    .map(|op| (path.as_str(), verb, op))
            })
        })
    }

    // Ignores the slot about to be replaced
    fn has_operation_id(&self, id: &str, path: &str, verb: Verb) -> bool {
        self.operations().any(|(p, v, op)| {
            (p, v) != (path, verb) && op.operation_id.as_deref() == Some(id)
        })
    }

    /// Serialize the document as JSON
    pub fn to_json(&self, pretty: bool) -> StrutResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Serialize the document as YAML
    pub fn to_yaml(&self) -> StrutResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
