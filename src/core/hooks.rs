// host extension points
use serde::{Deserialize, Serialize};

use crate::core::mapping::Mapping;
use crate::core::types::FieldType;

/// One action link offered next to a mapping in a list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowAction {
    pub key: String,
    pub label: String,
}

impl RowAction {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self { key: key.into(), label: label.into() }
    }
}

/// Base action set for every mapping row: edit, then delete.
pub fn default_row_actions() -> Vec<RowAction> {
    vec![RowAction::new("edit", "Edit"), RowAction::new("delete", "Delete")]
}

/// Filters a host can override. Every method receives the built-in answer and
/// returns the one to use; the defaults pass it through.
pub trait Hooks {
    /// May a field of this type receive generated options?
    fn is_populateable(&self, _field_type: &FieldType, default_verdict: bool) -> bool {
        default_verdict
    }

    /// Max source entries fetched for one mapped field during one resolution.
    fn entry_limit(&self, default_limit: usize) -> usize {
        default_limit
    }

    fn row_actions(&self, _mapping: &Mapping, actions: Vec<RowAction>) -> Vec<RowAction> {
        actions
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl Hooks for DefaultHooks {}

impl<T: Hooks + ?Sized> Hooks for &T {
    fn is_populateable(&self, field_type: &FieldType, default_verdict: bool) -> bool {
        (**self).is_populateable(field_type, default_verdict)
    }

    fn entry_limit(&self, default_limit: usize) -> usize {
        (**self).entry_limit(default_limit)
    }

    fn row_actions(&self, mapping: &Mapping, actions: Vec<RowAction>) -> Vec<RowAction> {
        (**self).row_actions(mapping, actions)
    }
}
