//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use htmx_app::assets::MemorySource;
use htmx_app::{App, AppConfig, Shutdown};

/// An app over an in-memory asset tree.
pub fn app(files: &[(&str, &str)]) -> App {
    let source: MemorySource = files.iter().map(|(path, data)| (*path, data.to_string())).collect();
    App::new(AppConfig::default()).with_source(Arc::new(source))
}

/// An app over a directory on disk, read live on every request.
pub fn dir_app(root: &Path, cache_templates: bool) -> App {
    let mut config = AppConfig::default();
    config.assets.root = root.to_string_lossy().into_owned();
    config.views.cache_templates = cache_templates;
    App::new(config)
}

/// Response pieces a test cares about.
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .map(|v| v.to_str().unwrap())
            .unwrap_or_default()
    }
}

/// Request builder driving the router in-process.
pub struct Call {
    builder: axum::http::request::Builder,
    body: Body,
}

pub fn call(method: Method, path: &str) -> Call {
    Call {
        builder: Request::builder().method(method).uri(path),
        body: Body::empty(),
    }
}

pub fn get(path: &str) -> Call {
    call(Method::GET, path)
}

impl Call {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn accept(self, value: &str) -> Self {
        self.header("accept", value)
    }

    pub fn host(self, value: &str) -> Self {
        self.header("host", value)
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = Body::from(body.to_string());
        self
    }

    pub fn json(mut self, value: &serde_json::Value) -> Self {
        self.builder = self.builder.header("content-type", "application/json");
        self.body = Body::from(serde_json::to_vec(value).unwrap());
        self
    }

    pub async fn send(self, router: &Router) -> Reply {
        let request = self.builder.body(self.body).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Reply {
            status,
            headers,
            body,
        }
    }
}

/// Serve a built app on an ephemeral port.
pub async fn spawn(app: App) -> (SocketAddr, Shutdown, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        app.run(listener, rx).await.unwrap();
    });

    (addr, shutdown, handle)
}
