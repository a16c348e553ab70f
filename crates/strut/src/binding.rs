//! Route binding.
//!
//! [`Strut`] registers typed handlers on an axum router and documents them in
//! its [`Definition`] in the same call. Registration happens on `&mut self`;
//! once [`Strut::into_router`] is called the definition is frozen behind an
//! `Arc` and served read-only.

use crate::config::StrutConfig;
use crate::context::RequestContext;
use crate::docs;
use crate::error::{StrutError, StrutResult};
use crate::operation::OperationBuilder;
use crate::reflect::Reflect;
use crate::registry::{to_router_path, TypeIdentity, Verb};
use crate::reply::{ApiError, IntoReply};
use crate::schema::SchemaNode;
use crate::specification::{Definition, Server};
use axum::extract::Request;
use axum::handler::Handler as AxumHandler;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter, MethodRouter, Route};
use axum::Router;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use tower::{Layer, Service};

/// Router path to the method routers registered on it
type Routes = BTreeMap<String, BTreeMap<Verb, MethodRouter>>;

/// Typed, self-documenting routes on top of an axum [`Router`]
pub struct Strut {
    definition: Definition,
    config: StrutConfig,
    base: Router,
    routes: Routes,
}

impl std::fmt::Debug for Strut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strut")
            .field("definition", &self.definition)
            .field("config", &self.config)
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for Strut {
    fn default() -> Self {
        Self::assemble(Router::new(), StrutConfig::default())
    }
}

impl Strut {
    /// Fails with [`StrutError::Config`] if the configuration does not validate
    pub fn new(config: StrutConfig) -> StrutResult<Self> {
        Self::with_router(Router::new(), config)
    }

    /// Start from an existing router; its routes are kept but not documented
    pub fn with_router(router: Router, config: StrutConfig) -> StrutResult<Self> {
        config.validate()?;
        Ok(Self::assemble(router, config))
    }

    fn assemble(router: Router, config: StrutConfig) -> Self {
        Self {
            definition: Definition::from_config(&config),
            config,
            base: router,
            routes: Routes::new(),
        }
    }

    pub fn config(&self) -> &StrutConfig {
        &self.config
    }

    /// The document as registered so far
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn add_server(&mut self, url: &str, description: &str) -> &mut Self {
        self.definition.servers.push(Server::new(url, description));
        self
    }

    pub fn title(&mut self, title: &str) -> &mut Self {
        self.definition.info.title = title.to_string();
        self
    }

    pub fn description(&mut self, description: &str) -> &mut Self {
        self.definition.info.description = Some(description.to_string());
        self
    }

    pub fn version(&mut self, version: &str) -> &mut Self {
        self.definition.info.version = version.to_string();
        self
    }

    /// Register a `GET` handler
    pub fn get<H, Fut, R>(&mut self, path: &str, handler: H, op: OperationBuilder) -> StrutResult<&mut Self>
    where
        H: Fn(RequestContext) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        self.bind_without_body(Verb::Get, path, handler, op)
    }

    /// Register a `DELETE` handler
    pub fn delete<H, Fut, R>(&mut self, path: &str, handler: H, op: OperationBuilder) -> StrutResult<&mut Self>
    where
        H: Fn(RequestContext) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        self.bind_without_body(Verb::Delete, path, handler, op)
    }

    /// Register a `POST` handler taking a JSON body
    pub fn post<H, Fut, Req, R>(&mut self, path: &str, handler: H, op: OperationBuilder) -> StrutResult<&mut Self>
    where
        H: Fn(RequestContext, Req) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        Req: Reflect + DeserializeOwned + Send + 'static,
        R: IntoReply + 'static,
    {
        self.bind_with_body(Verb::Post, path, handler, op)
    }

    /// Register a `PUT` handler taking a JSON body
    pub fn put<H, Fut, Req, R>(&mut self, path: &str, handler: H, op: OperationBuilder) -> StrutResult<&mut Self>
    where
        H: Fn(RequestContext, Req) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        Req: Reflect + DeserializeOwned + Send + 'static,
        R: IntoReply + 'static,
    {
        self.bind_with_body(Verb::Put, path, handler, op)
    }

    /// Register a `PATCH` handler taking a JSON body
    pub fn patch<H, Fut, Req, R>(&mut self, path: &str, handler: H, op: OperationBuilder) -> StrutResult<&mut Self>
    where
        H: Fn(RequestContext, Req) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        Req: Reflect + DeserializeOwned + Send + 'static,
        R: IntoReply + 'static,
    {
        self.bind_with_body(Verb::Patch, path, handler, op)
    }

    fn bind_without_body<H, Fut, R>(
        &mut self,
        verb: Verb,
        path: &str,
        handler: H,
        op: OperationBuilder,
    ) -> StrutResult<&mut Self>
    where
        H: Fn(RequestContext) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        let status = self.document::<(), R::Body>(verb, path, op, false)?;
        let endpoint = Endpoint::<H, NoBody>::new(handler, status, self.config.body_limit);
        self.mount(verb, path, on(method_filter(verb), endpoint));
        Ok(self)
    }

    fn bind_with_body<H, Fut, Req, R>(
        &mut self,
        verb: Verb,
        path: &str,
        handler: H,
        op: OperationBuilder,
    ) -> StrutResult<&mut Self>
    where
        H: Fn(RequestContext, Req) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        Req: Reflect + DeserializeOwned + Send + 'static,
        R: IntoReply + 'static,
    {
        let status = self.document::<Req, R::Body>(verb, path, op, true)?;
        let endpoint = Endpoint::<H, JsonBody<Req>>::new(handler, status, self.config.body_limit);
        self.mount(verb, path, on(method_filter(verb), endpoint));
        Ok(self)
    }

    /// Record the operation and its component schemas, returning the primary status
    fn document<Req, Res>(
        &mut self,
        verb: Verb,
        path: &str,
        op: OperationBuilder,
        with_body: bool,
    ) -> StrutResult<StatusCode>
    where
        Req: Reflect + ?Sized,
        Res: Reflect + ?Sized,
    {
        if !path.starts_with('/') {
            return Err(StrutError::config_error(format!(
                "route path '{}' must start with '/'",
                path
            )));
        }

        let request = with_body.then(|| SchemaNode::reference(TypeIdentity::of::<Req>().reference()));
        let response = SchemaNode::reference(TypeIdentity::of::<Res>().reference());

        let (operation, status) = op.finish(request, Some(response));
        let status = StatusCode::from_u16(status).map_err(|_| {
            StrutError::config_error(format!("invalid status code {} for {} {}", status, verb, path))
        })?;

        self.definition.register_operation(path, verb, operation)?;
        if with_body {
            self.definition.register_type::<Req>();
        }
        self.definition.register_type::<Res>();

        tracing::debug!(%verb, path, status = status.as_u16(), "route registered");
        Ok(status)
    }

    fn mount(&mut self, verb: Verb, path: &str, router: MethodRouter) {
        self.routes
            .entry(to_router_path(path))
            .or_default()
            .insert(verb, router);
    }

    /// Apply a tower layer to every route registered so far
    pub fn layer<L>(&mut self, layer: L) -> &mut Self
    where
        L: Layer<Route> + Clone + Send + 'static,
        L::Service: Service<Request> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.routes = std::mem::take(&mut self.routes)
            .into_iter()
            .map(|(path, verbs)| {
                let verbs = verbs
                    .into_iter()
                    .map(|(verb, router)| (verb, router.layer(layer.clone())))
                    .collect();
                (path, verbs)
            })
            .collect();
        self
    }

    /// Register routes whose layers stay local to the group
    ///
    /// The group documents into the same definition. If `build` fails, the
    /// definition is rolled back and none of the group's routes are mounted.
    pub fn group<F>(&mut self, build: F) -> StrutResult<&mut Self>
    where
        F: FnOnce(&mut Strut) -> StrutResult<()>,
    {
        let snapshot = self.definition.clone();
        let mut child = Strut::assemble(Router::new(), self.config.clone());
        child.definition = std::mem::take(&mut self.definition);

        if let Err(err) = build(&mut child) {
            self.definition = snapshot;
            return Err(err);
        }
        self.definition = child.definition;

        for (path, verbs) in child.routes {
            self.routes.entry(path).or_default().extend(verbs);
        }
        Ok(self)
    }

    /// Freeze the definition and build the router, documentation routes included
    pub fn into_router(self) -> Router {
        self.into_parts().0
    }

    /// Like [`into_router`](Self::into_router), also handing back the frozen definition
    pub fn into_parts(self) -> (Router, Arc<Definition>) {
        let definition = Arc::new(self.definition);

        let mut router = self.base;
        for (path, verbs) in self.routes {
            let method_router = verbs
                .into_values()
                .fold(MethodRouter::new(), |acc, next| acc.merge(next));
            router = router.route(&path, method_router);
        }

        if self.config.docs.enabled {
            router = router.merge(docs::routes(Arc::clone(&definition), &self.config.docs));
        }

        (router, definition)
    }
}

fn method_filter(verb: Verb) -> MethodFilter {
    match verb {
        Verb::Get => MethodFilter::GET,
        Verb::Post => MethodFilter::POST,
        Verb::Put => MethodFilter::PUT,
        Verb::Patch => MethodFilter::PATCH,
        Verb::Delete => MethodFilter::DELETE,
    }
}

/// Handlers that take no request body
struct NoBody;

/// Handlers that decode a JSON body into `Req`
struct JsonBody<Req>(PhantomData<fn() -> Req>);

/// Runtime half of a registered route
struct Endpoint<H, B> {
    handler: H,
    status: StatusCode,
    body_limit: usize,
    _body: PhantomData<fn() -> B>,
}

impl<H, B> Endpoint<H, B> {
    fn new(handler: H, status: StatusCode, body_limit: usize) -> Self {
        Self {
            handler,
            status,
            body_limit,
            _body: PhantomData,
        }
    }
}

impl<H: Clone, B> Clone for Endpoint<H, B> {
    fn clone(&self) -> Self {
        Self::new(self.handler.clone(), self.status, self.body_limit)
    }
}

impl<H, Fut, R, S> AxumHandler<(), S> for Endpoint<H, NoBody>
where
    H: Fn(RequestContext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
    S: Send + Sync + 'static,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send>>;

    fn call(self, req: Request, _state: S) -> Self::Future {
        Box::pin(async move {
            let (mut parts, _body) = req.into_parts();
            let context = RequestContext::from_parts(&mut parts).await;

            (self.handler)(context)
                .await
                .into_reply()
                .into_response_with(self.status)
        })
    }
}

impl<H, Fut, Req, R, S> AxumHandler<(), S> for Endpoint<H, JsonBody<Req>>
where
    H: Fn(RequestContext, Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    Req: DeserializeOwned + Send + 'static,
    R: IntoReply + 'static,
    S: Send + Sync + 'static,
{
    type Future = Pin<Box<dyn Future<Output = Response> + Send>>;

    fn call(self, req: Request, _state: S) -> Self::Future {
        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let context = RequestContext::from_parts(&mut parts).await;

            let bytes = match axum::body::to_bytes(body, self.body_limit).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(error = %err, path = context.uri().path(), "error reading request body");
                    return ApiError::bad_request("could not read request").into_response();
                }
            };

            let request: Req = match serde_json::from_slice(&bytes) {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(error = %err, path = context.uri().path(), "error decoding request");
                    return ApiError::bad_request("could not decode request").into_response();
                }
            };

            (self.handler)(context, request)
                .await
                .into_reply()
                .into_response_with(self.status)
        })
    }
}
