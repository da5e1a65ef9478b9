// mapping persistence over an opaque key/value option layer
use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::error::StoreError;
use crate::core::mapping::MappingCollection;
use crate::core::types::FormId;

/// Named-option persistence supplied by the host.
///
/// `update_option` replaces the whole value for a key; implementations must make
/// that replacement atomic from a reader's point of view.
pub trait OptionStore {
    fn get_option(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn update_option(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

impl<T: OptionStore + ?Sized> OptionStore for &mut T {
    fn get_option(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get_option(key)
    }

    fn update_option(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).update_option(key, value)
    }
}

impl<T: OptionStore + ?Sized> OptionStore for Box<T> {
    fn get_option(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get_option(key)
    }

    fn update_option(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).update_option(key, value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryOptionStore {
    options: HashMap<String, Value>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

impl OptionStore for MemoryOptionStore {
    fn get_option(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.options.get(key).cloned())
    }

    fn update_option(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.options.insert(key.to_string(), value);
        Ok(())
    }
}

pub fn option_key(prefix: &str, form_id: FormId) -> String {
    format!("{prefix}related_fields_{form_id}")
}

/// Whole-collection CRUD for one form at a time.
///
/// Every write is load -> modify -> full rewrite with no lock around it: two
/// concurrent writers to the same form race and the last one wins.
#[derive(Debug, Clone)]
pub struct MappingStore<S> {
    options: S,
    key_prefix: String,
}

impl<S: OptionStore> MappingStore<S> {
    pub fn new(options: S) -> Self {
        Self::with_prefix(options, "")
    }

    pub fn with_prefix(options: S, key_prefix: impl Into<String>) -> Self {
        Self { options, key_prefix: key_prefix.into() }
    }

    pub fn key(&self, form_id: FormId) -> String {
        option_key(&self.key_prefix, form_id)
    }

    pub fn options(&self) -> &S {
        &self.options
    }

    pub fn into_inner(self) -> S {
        self.options
    }

    /// Fails open: missing, unreadable, or undecodable data all load as empty.
    pub fn load(&self, form_id: FormId) -> MappingCollection {
        let key = self.key(form_id);
        let value = match self.options.get_option(&key) {
            Ok(Some(v)) => v,
            Ok(None) => return MappingCollection::new(),
            Err(e) => {
                warn!(form_id, error = %e, "could not read related fields, treating as none");
                return MappingCollection::new();
            }
        };

        match value {
            //hosts store an empty list for "nothing yet"
            Value::Null => MappingCollection::new(),
            Value::Array(items) if items.is_empty() => MappingCollection::new(),
            other => match serde_json::from_value(other) {
                Ok(collection) => collection,
                Err(e) => {
                    warn!(form_id, error = %e, "undecodable related fields, treating as none");
                    MappingCollection::new()
                }
            },
        }
    }

    /// Replace the whole collection for `form_id`.
    pub fn save(&mut self, form_id: FormId, collection: &MappingCollection) -> bool {
        let key = self.key(form_id);
        let value = match serde_json::to_value(collection) {
            Ok(v) => v,
            Err(e) => {
                warn!(form_id, error = %e, "could not encode related fields");
                return false;
            }
        };

        match self.options.update_option(&key, value) {
            Ok(()) => {
                debug!(form_id, mappings = collection.len(), "saved related fields");
                true
            }
            Err(e) => {
                warn!(form_id, error = %e, "could not save related fields");
                false
            }
        }
    }

    /// `form_id == 0` is "no form" and fails without touching storage. An absent
    /// mapping id is not an error: the collection is rewritten as-is and the save
    /// result is returned.
    pub fn delete(&mut self, form_id: FormId, mapping_id: &str) -> bool {
        if form_id == 0 {
            return false;
        }

        let mut collection = self.load(form_id);
        let removed = collection.remove(mapping_id).is_some();
        let saved = self.save(form_id, &collection);
        info!(form_id, mapping_id, removed, saved, "delete related field");
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::Mapping;

    /// Backend that refuses every call.
    struct BrokenOptionStore;

    impl OptionStore for BrokenOptionStore {
        fn get_option(&self, key: &str) -> Result<Option<Value>, StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }

        fn update_option(&mut self, key: &str, _value: Value) -> Result<(), StoreError> {
            Err(StoreError::InvalidKey(key.to_string()))
        }
    }

    fn mk_collection() -> MappingCollection {
        vec![Mapping::new("m1", 5, 10, 7), Mapping::new("m2", 6, 10, 8)]
            .into_iter()
            .collect()
    }

    #[test]
    fn load_missing_form_is_empty() {
        let store = MappingStore::new(MemoryOptionStore::new());
        assert!(store.load(42).is_empty());
    }

    #[test]
    fn save_then_load_round_trips_under_form_key() {
        let mut store = MappingStore::new(MemoryOptionStore::new());
        assert!(store.save(1, &mk_collection()));

        assert!(store.options().raw("related_fields_1").is_some());
        assert_eq!(store.load(1), mk_collection());
        assert!(store.load(2).is_empty());
    }

    #[test]
    fn prefix_namespaces_keys() {
        let mut store = MappingStore::with_prefix(MemoryOptionStore::new(), "gfrf_");
        store.save(3, &mk_collection());
        assert!(store.options().raw("gfrf_related_fields_3").is_some());
    }

    #[test]
    fn load_tolerates_empty_list_and_garbage() {
        let mut opts = MemoryOptionStore::new();
        opts.update_option("related_fields_1", serde_json::json!([])).unwrap();
        opts.update_option("related_fields_2", serde_json::json!("not a map")).unwrap();

        let store = MappingStore::new(opts);
        assert!(store.load(1).is_empty());
        assert!(store.load(2).is_empty());
    }

    #[test]
    fn delete_without_form_id_fails_and_writes_nothing() {
        let mut store = MappingStore::new(MemoryOptionStore::new());
        assert!(!store.delete(0, "m1"));
        assert!(store.options().is_empty());
    }

    #[test]
    fn delete_removes_key_and_is_idempotent() {
        let mut store = MappingStore::new(MemoryOptionStore::new());
        store.save(1, &mk_collection());

        assert!(store.delete(1, "m1"));
        let after = store.load(1);
        assert_eq!(after.ids().collect::<Vec<_>>(), vec!["m2"]);

        //second delete of the same id: same success, collection unchanged
        assert!(store.delete(1, "m1"));
        assert_eq!(store.load(1), after);
    }

    #[test]
    fn broken_backend_fails_open_on_read_and_false_on_write() {
        let mut store = MappingStore::new(BrokenOptionStore);
        assert!(store.load(1).is_empty());
        assert!(!store.save(1, &mk_collection()));
        assert!(!store.delete(1, "m1"));
    }
}
