//! Configuration tree subsystem.
//!
//! # Data Flow
//! ```text
//! packaged defaults (TOML/JSON) + runtime overrides
//!     → value.rs (ConfigValue, deep_merge)
//!     → diff.rs (diff: base vs edited → flat ConfigDelta)
//!     → diff.rs (merge: ConfigDelta applied onto a tree copy)
//! ```
//!
//! # Design Decisions
//! - Values are a tagged union decided once at construction
//! - Mappings keep insertion order so editors render keys as written
//! - Deltas are flat (dot path → leaf) and never encode deletions
//! - Container kind for new nodes is driven by the next path segment:
//!   numeric → sequence, anything else → mapping

pub mod diff;
pub mod path;
pub mod value;

pub use diff::{apply_entry, diff, diff_at, leaves, merge, ConfigDelta, TreeError};
pub use value::{ConfigValue, Mapping, Pattern};
