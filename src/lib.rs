//! Related fields: populate a form field's choices from the values previously
//! submitted to a field on another form.
//!
//! - [`crate::core::mapping`]: the stored rule (target field <- source form + field)
//! - [`crate::core::store`]: whole-collection persistence per form over an option store
//! - [`crate::core::validate`]: raw admin submission -> mapping + errors
//! - [`crate::core::resolve`]: rewrites choice lists at render/validation time
//! - [`crate::admin`]: request-scoped handler the host wires its hooks and settings UI to

pub mod admin;
pub mod config;
pub mod core;
pub mod mapping;

pub use crate::admin::{RelatedFields, RenderStage};
pub use crate::config::Config;
pub use crate::core::catalog::{FieldCatalog, MemoryCatalog};
pub use crate::core::hooks::{DefaultHooks, Hooks};
pub use crate::core::mapping::{Mapping, MappingCollection};
pub use crate::core::store::{MappingStore, MemoryOptionStore, OptionStore};
