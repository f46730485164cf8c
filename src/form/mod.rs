//! Editing form subsystem.
//!
//! # Data Flow
//! ```text
//! ConfigValue sub-tree + DescriptorRegistry
//!     → builder.rs (infer ControlNode tree; descriptors override inference)
//!     → control.rs (ControlNode, flattening to FormFields, add-row)
//!     → editor collaborator renders and edits
//!     → decoder.rs (flat FormFields → nested ConfigValue)
//! ```
//!
//! # Design Decisions
//! - Control kind is a presentation hint only; it never changes decoded values
//! - Decoding is pure and surfaces shape conflicts instead of guessing
//! - Form values stay strings; typing them back is the store's business

pub mod builder;
pub mod control;
pub mod decoder;
pub mod descriptor;

pub use builder::{build_node, infer_control, ControlSchemaBuilder};
pub use control::{ControlKind, ControlNode, ValueType};
pub use decoder::{decode, DecodeError, FormField};
pub use descriptor::{DescriptorRegistry, FieldDescriptor};
