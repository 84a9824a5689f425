//! Template composition subsystem.
//!
//! # Data Flow
//! ```text
//! pages/ views/ layouts/ components/   (host overrides under @<host>/)
//!     → parser.rs (text, values, blocks, defines, layout directive)
//!     → set.rs (TemplateSet per host scope, validated at build)
//!     → composer.rs (per-host arena, build-once, invalidation)
//!     → rendered HTML
//! ```
//!
//! # Design Decisions
//! - One layout per page; layouts cannot declare layouts
//! - Substitution is a pure function of (AST, namespace, data)
//! - No general template language: blocks, defines and value lookups only

pub mod composer;
pub mod parser;
pub mod set;

pub use composer::TemplateComposer;
pub use parser::{parse, Node, Template};
pub use set::TemplateSet;
