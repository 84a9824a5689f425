//! Asset store subsystem.
//!
//! # Data Flow
//! ```text
//! Request (host, path)
//!     → path.rs (decode, strip slash, reject traversal, index rule)
//!     → store.rs (host-scoped candidate lookup)
//!     → source.rs (live directory or in-memory tree)
//!     → Asset (bytes + content type from content_type.rs)
//! ```
//!
//! # Design Decisions
//! - Host overrides live under `<namespace>/@<host>/` and always win
//! - Missing and empty files are distinct outcomes
//! - Sources are immutable from the process's point of view; the optional
//!   watcher only invalidates derived caches

pub mod content_type;
pub mod path;
pub mod source;
pub mod store;
pub mod watcher;

pub use path::VirtualPath;
pub use source::{AssetSource, DirSource, MemorySource};
pub use store::{Asset, AssetStore, PUBLIC_NAMESPACE};
pub use watcher::AssetWatcher;
