/*!
# strut

Typed axum routes that document themselves as OpenAPI 3.0.

Every route is registered together with its request and response types.
Those types are reflected into JSON Schema, collected under
`#/components/schemas`, and referenced from the operation that uses them, so
the served document cannot drift from the handlers.

## Features

- Schema reflection through `#[derive(Reflect)]`, honouring serde renames
- Field constraints via `#[schema(...)]` attributes
- An OpenAPI 3.0 definition aggregated as routes are bound
- JSON and YAML documents served from the same router
- Duplicate route and operation id detection

## Usage

```rust,no_run
use serde::{Deserialize, Serialize};
use strut::{ApiError, Op, Reflect, RequestContext, Strut, StrutConfig};

#[derive(Serialize, Deserialize, Reflect)]
pub struct User {
    /// Display name
    #[schema(min_length = 1)]
    pub name: String,
}

async fn get_user(ctx: RequestContext) -> Result<User, ApiError> {
    let name = ctx.path_param("id").unwrap_or_default().to_string();
    Ok(User { name })
}

# async fn run() -> anyhow::Result<()> {
let mut api = Strut::new(StrutConfig::new("Users", "1.0.0"))?;
api.get("/users/{id}", get_user, Op::new().summary("Fetch a user"))?;

let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
axum::serve(listener, api.into_router()).await?;
# Ok(())
# }
```
*/

extern crate self as strut;

// Re-export main types
pub use crate::{
    binding::Strut,
    config::{DocsConfig, DuplicatePolicy, StrutConfig},
    context::RequestContext,
    error::{StrutError, StrutResult},
    operation::{Op, OperationBuilder},
    reflect::{reflect, reflect_descriptor, FieldMeta, RecordDescriptor, TypeDescriptor},
    registry::{path_variables, to_router_path, TypeIdentity, Verb},
    reply::{ApiError, IntoReply, Reply},
    schema::{SchemaKind, SchemaNode},
    specification::{
        Components, Definition, Info, MediaType, Operation, ParamLocation, Parameter, PathItem,
        RequestBody, Response, Server,
    },
};

// The trait and its derive share a name, living in different namespaces
pub use crate::reflect::Reflect;
pub use strut_derive::Reflect;

// Core modules
pub mod config;
pub mod error;
pub mod specification;

// Schema reflection
pub mod reflect;
pub mod schema;

// Definition aggregation
pub mod operation;
pub mod registry;

// Route binding
pub mod binding;
pub mod context;
pub mod docs;
pub mod reply;

// Test utilities
#[cfg(test)]
mod test_utils;
