//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (route lookup over the table)
//!     → matcher.rs (evaluate pattern, extract params)
//!     → Return: matched Route (handler, RouteInfo) or NoMatch
//!
//! Route Compilation (at build):
//!     registered routes + pages/ + public/ entries
//!     → compile patterns
//!     → freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at build, immutable at runtime
//! - Deterministic: same input always matches same route
//! - Most specific pattern wins; registered routes beat generated ones
//! - Route options are opaque to routing; handlers read them via the context

pub mod matcher;
pub mod options;
pub mod router;

pub use matcher::{Params, Pattern};
pub use options::{
    with_navigation, NavigationItem, RouteOptions, NAVIGATION_ACCESS, NAVIGATION_ICON,
    NAVIGATION_LABEL,
};
pub use router::{Route, RouteInfo, RouteOrigin, RouteTable};
