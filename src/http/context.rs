//! Per-request context handed to handlers.
//!
//! # Responsibilities
//! - Expose the parsed request, host scope, path params and route options
//! - `view`: negotiate a viewer and write the rendered body once
//! - `write_status`: set the response status once (first write wins)
//! - Turn the handler's [`Outcome`] into the final response
//!
//! # Design Decisions
//! - Cheap to clone; response state sits behind a mutex so handlers and
//!   middleware can share one context
//! - The body is buffered; nothing reaches the client before the handler returns

use axum::{
    body::{Body, Bytes},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Outcome, ViewError};
use crate::http::{language, request};
use crate::routing::{Params, RouteInfo, RouteOptions};
use crate::view::{Rendered, ViewRequest, ViewerKind, ViewerRegistry};

#[derive(Debug, Default)]
struct ResponseState {
    status: Option<StatusCode>,
    body: Option<Rendered>,
}

#[derive(Debug)]
struct Inner {
    parts: Parts,
    body: Bytes,
    host: String,
    route: Arc<RouteInfo>,
    params: Params,
    views: Arc<ViewerRegistry>,
    default_viewer: Option<ViewerKind>,
    response: Mutex<ResponseState>,
}

/// Request-scoped state. Created by the dispatcher, dropped with the request.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        route: Arc<RouteInfo>,
        params: Params,
        views: Arc<ViewerRegistry>,
        default_viewer: Option<ViewerKind>,
    ) -> Self {
        let host = request::host_scope(&parts);
        Self {
            inner: Arc::new(Inner {
                parts,
                body,
                host,
                route,
                params,
                views,
                default_viewer,
                response: Mutex::new(ResponseState::default()),
            }),
        }
    }

    /// Method, URI and headers of the request.
    pub fn request(&self) -> &Parts {
        &self.inner.parts
    }

    /// Buffered request body.
    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// Host scope ("" = default).
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    pub fn path(&self) -> &str {
        self.inner.parts.uri.path()
    }

    pub fn request_id(&self) -> Option<&str> {
        request::request_id(&self.inner.parts)
    }

    /// Path parameter captured by a `{name}` segment.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.inner
            .params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Options attached to the matched route at registration.
    pub fn route_options(&self) -> &RouteOptions {
        &self.inner.route.options
    }

    /// Logical path of the matched route.
    pub fn route_path(&self) -> &str {
        self.inner.route.pattern.logical_path()
    }

    /// Preferred languages from `Accept-Language`, most preferred first.
    pub fn accept_language(&self) -> Vec<String> {
        self.header(header::ACCEPT_LANGUAGE)
            .map(language::parse_accept_language)
            .unwrap_or_default()
    }

    /// Deserialize the request body as JSON.
    pub fn bind_json<T: DeserializeOwned>(&self) -> Result<T, ViewError> {
        Ok(serde_json::from_slice(&self.inner.body)?)
    }

    /// Deserialize the URL query string. A missing query binds as empty.
    pub fn bind_query<T: DeserializeOwned>(&self) -> Result<T, ViewError> {
        let query = self.inner.parts.uri.query().unwrap_or_default();
        Ok(serde_urlencoded::from_str(query)?)
    }

    /// Deserialize an `application/x-www-form-urlencoded` body.
    ///
    /// Requests without a body (`GET`, `HEAD`) bind from the query string.
    pub fn bind_form<T: DeserializeOwned>(&self) -> Result<T, ViewError> {
        let method = &self.inner.parts.method;
        if *method == Method::GET || *method == Method::HEAD {
            return self.bind_query();
        }
        Ok(serde_urlencoded::from_bytes(&self.inner.body)?)
    }

    /// Set the response status. Only the first call has an effect.
    pub fn write_status(&self, status: StatusCode) {
        let mut state = self.state();
        let written = state.status;
        match written {
            None => state.status = Some(status),
            Some(current) => tracing::trace!(
                current = %current,
                ignored = %status,
                "Response status already written"
            ),
        }
    }

    /// Status written so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.state().status
    }

    /// Render `data` under the view name derived from the route.
    pub fn view<T: Serialize + ?Sized>(&self, data: &T) -> Result<(), ViewError> {
        self.render(None, data, None)
    }

    /// Render `data` under an explicit view name.
    pub fn view_named<T: Serialize + ?Sized>(&self, data: &T, name: &str) -> Result<(), ViewError> {
        self.render(None, data, Some(name))
    }

    /// Render with a pinned viewer, bypassing negotiation.
    pub fn view_with<T: Serialize + ?Sized>(
        &self,
        kind: ViewerKind,
        data: &T,
        name: Option<&str>,
    ) -> Result<(), ViewError> {
        self.render(Some(kind), data, name)
    }

    fn render<T: Serialize + ?Sized>(
        &self,
        pinned: Option<ViewerKind>,
        data: &T,
        name: Option<&str>,
    ) -> Result<(), ViewError> {
        if self.state().body.is_some() {
            return Err(ViewError::ResponseCommitted);
        }

        let data: Value = serde_json::to_value(data)?;
        let derived;
        let view_name = match name {
            Some(name) => name,
            None => {
                derived = self.inner.route.default_view_name();
                derived.as_str()
            }
        };

        let req = ViewRequest {
            host: &self.inner.host,
            name: view_name,
            explicit: name.is_some(),
            data: &data,
        };
        let accept = self.header(header::ACCEPT);
        let rendered = self
            .inner
            .views
            .render(&req, accept, pinned.or(self.inner.default_viewer))?;

        let mut state = self.state();
        if state.body.is_some() {
            return Err(ViewError::ResponseCommitted);
        }
        state.body = Some(rendered);
        Ok(())
    }

    fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.inner
            .parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    fn state(&self) -> MutexGuard<'_, ResponseState> {
        self.inner
            .response
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Build the response for a finished handler.
    ///
    /// Returns the response and the viewer that produced the body, if any.
    pub(crate) fn finish(&self, outcome: Outcome) -> (Response, Option<ViewerKind>) {
        let mut state = self.state();

        if let Outcome::Failed(err) = outcome {
            let status = state.status.unwrap_or_else(|| err.status());
            if err.is_not_found() {
                tracing::debug!(
                    host = %self.inner.host,
                    path = %self.path(),
                    error = %err,
                    "View not found"
                );
            } else {
                tracing::error!(
                    host = %self.inner.host,
                    path = %self.path(),
                    request_id = ?self.request_id(),
                    error = %err,
                    "Handler failed"
                );
            }
            return (status.into_response(), None);
        }

        let status = state.status.unwrap_or(StatusCode::OK);
        match state.body.take() {
            Some(rendered) => {
                let viewer = rendered.viewer;
                let mut response = Response::new(Body::from(rendered.body));
                *response.status_mut() = status;
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(rendered.content_type),
                );
                (response, Some(viewer))
            }
            None => (status.into_response(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetStore, MemorySource};
    use crate::routing::{Pattern, RouteOrigin};
    use crate::template::TemplateComposer;
    use axum::http::Request;
    use serde_json::json;

    fn context(path: &str, pattern: &str, accept: Option<&str>) -> Context {
        let source = Arc::new(
            MemorySource::new()
                .with_file("pages/index.html", "<p>{{ .title }}</p>")
                .with_file("pages/admin/index.html", "admin"),
        );
        let views = Arc::new(ViewerRegistry::new(
            Arc::new(TemplateComposer::new(source.clone(), true)),
            AssetStore::new(source),
        ));

        let mut builder = Request::builder()
            .uri(path)
            .header("Accept-Language", "en;q=0.5, de");
        if let Some(accept) = accept {
            builder = builder.header("Accept", accept);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();

        let route = Arc::new(RouteInfo {
            pattern: Pattern::parse(pattern),
            options: RouteOptions::new().with("k", "v"),
            origin: RouteOrigin::Registered,
        });
        Context::new(parts, Bytes::from_static(b"{\"a\":1}"), route, Vec::new(), views, None)
    }

    #[test]
    fn test_first_status_wins() {
        let ctx = context("/", "/", None);
        ctx.write_status(StatusCode::BAD_REQUEST);
        ctx.write_status(StatusCode::OK);
        assert_eq!(ctx.status(), Some(StatusCode::BAD_REQUEST));

        let (response, viewer) = ctx.finish(Outcome::Cancelled);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(viewer.is_none());
    }

    #[test]
    fn test_view_derives_name_from_route() {
        let ctx = context("/admin/", "/admin/", Some("text/html"));
        ctx.view(&()).unwrap();
        let (response, viewer) = ctx.finish(Outcome::Completed);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(viewer, Some(ViewerKind::Html));
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_body_written_once() {
        let ctx = context("/", "/", Some("text/html"));
        ctx.view_named(&json!({"title": "hi"}), "index").unwrap();
        assert!(matches!(
            ctx.view_named(&json!({}), "index"),
            Err(ViewError::ResponseCommitted)
        ));
    }

    #[test]
    fn test_failed_outcome_maps_status() {
        let ctx = context("/", "/", None);
        let (response, _) = ctx.finish(Outcome::Failed(ViewError::ViewNotFound("x".into())));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let ctx = context("/", "/", None);
        let (response, _) = ctx.finish(Outcome::Failed(ViewError::Configuration("x".into())));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_accessors() {
        let ctx = context("/", "/", None);
        assert_eq!(ctx.accept_language(), vec!["de", "en"]);
        assert_eq!(ctx.route_options().string("k"), "v");
        assert_eq!(ctx.route_path(), "/");

        let value: Value = ctx.bind_json().unwrap();
        assert_eq!(value, json!({"a": 1}));
        assert!(ctx.bind_json::<Vec<u8>>().is_err());
    }

    #[test]
    fn test_bind_query() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Filter {
            tag: String,
            limit: Option<u32>,
        }

        let ctx = context("/list?tag=a%26b&limit=3", "/list", None);
        let filter: Filter = ctx.bind_query().unwrap();
        assert_eq!(filter, Filter { tag: "a&b".into(), limit: Some(3) });
        // GET forms read the query string too
        assert_eq!(ctx.bind_form::<Filter>().unwrap(), filter);

        let ctx = context("/list", "/list", None);
        assert!(matches!(ctx.bind_query::<Filter>(), Err(ViewError::Binding(_))));
    }
}
