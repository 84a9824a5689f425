//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → [route table picks the most specific route]
//!     → context.rs (per-request state: host scope, params, options)
//!     → handler / group middleware
//!     → context.rs (status + rendered body → response)
//!     → Send to client
//! ```

pub mod context;
pub mod group;
pub mod handler;
pub mod language;
pub mod request;
pub mod server;

pub use context::Context;
pub use group::Group;
pub use handler::{handler, middleware, Handler, Middleware};
pub use request::X_REQUEST_ID;
pub use server::{App, HttpServer};
