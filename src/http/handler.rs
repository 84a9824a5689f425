//! Handler and middleware types.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::sync::Arc;

use crate::error::Outcome;
use crate::http::context::Context;

/// A type-erased request handler.
pub type Handler = Arc<dyn Fn(Context) -> BoxFuture<'static, Outcome> + Send + Sync>;

/// Wraps a handler with behaviour that runs around it.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Erase an async handler function.
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Arc::new(move |ctx| f(ctx).boxed())
}

/// Erase a middleware function.
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Apply middleware so the first in the list runs outermost.
pub fn wrap(handler: Handler, middleware: &[Middleware]) -> Handler {
    middleware.iter().rev().fold(handler, |next, m| m(next))
}
