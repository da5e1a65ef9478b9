// related-field mappings + the per-form collection
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::types::{FieldId, FormId, MappingId};

/// One relationship rule: populate `target_field_id` on the owning form from the
/// values of `source_form_field_id` submitted to `source_form_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub id: MappingId,
    #[serde(deserialize_with = "loose_id")]
    pub target_field_id: FieldId,
    #[serde(deserialize_with = "loose_id")]
    pub source_form_id: FormId,
    #[serde(deserialize_with = "loose_id")]
    pub source_form_field_id: FieldId,
    /// `None` means active. Only an explicit `false` switches a mapping off.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "loose_flag")]
    pub is_active: Option<bool>,
}

impl Mapping {
    /// A fresh mapping with no references set yet (all zero) and no active flag.
    pub fn empty(id: impl Into<MappingId>) -> Self {
        Self {
            id: id.into(),
            target_field_id: 0,
            source_form_id: 0,
            source_form_field_id: 0,
            is_active: None,
        }
    }

    pub fn new(
        id: impl Into<MappingId>,
        target_field_id: FieldId,
        source_form_id: FormId,
        source_form_field_id: FieldId,
    ) -> Self {
        Self {
            target_field_id,
            source_form_id,
            source_form_field_id,
            ..Self::empty(id)
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    /// All three references are non-zero.
    pub fn is_complete(&self) -> bool {
        self.target_field_id != 0 && self.source_form_id != 0 && self.source_form_field_id != 0
    }
}

/// All mappings owned by one form, keyed by mapping id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingCollection {
    mappings: IndexMap<MappingId, Mapping>,
}

impl MappingCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.mappings.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Mapping> {
        self.mappings.get(id)
    }

    /// Insert or replace by `mapping.id`. A replaced mapping keeps its slot, so list
    /// order is stable across edits. Returns the previous value if any.
    pub fn upsert(&mut self, mapping: Mapping) -> Option<Mapping> {
        self.mappings.insert(mapping.id.clone(), mapping)
    }

    /// Remove by id, preserving the order of the rest. Absent ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Mapping> {
        self.mappings.shift_remove(id)
    }

    /// Returns false if no mapping has that id.
    pub fn set_active(&mut self, id: &str, is_active: bool) -> bool {
        match self.mappings.get_mut(id) {
            Some(m) => {
                m.is_active = Some(is_active);
                true
            }
            None => false,
        }
    }

    /// First mapping (in collection order) targeting `field_id`, active or not.
    ///
    /// The id-keyed model does not stop two mappings pointing at one field; when
    /// that happens the earliest one wins.
    pub fn for_target(&self, field_id: FieldId) -> Option<&Mapping> {
        self.mappings.values().find(|m| m.target_field_id == field_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> + '_ {
        self.mappings.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.mappings.keys().map(String::as_str)
    }
}

impl FromIterator<Mapping> for MappingCollection {
    fn from_iter<T: IntoIterator<Item = Mapping>>(iter: T) -> Self {
        let mut c = MappingCollection::new();
        for m in iter {
            c.upsert(m);
        }
        c
    }
}

//persisted records may carry ids/flags as strings ("5", "0", "1") written by older hosts
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

fn loose_id<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let id = match Loose::deserialize(d)? {
        Loose::Bool(_) => 0,
        Loose::Int(n) => u32::try_from(n).unwrap_or(0),
        Loose::Float(f) if f >= 0.0 && f <= u32::MAX as f64 => f as u32,
        Loose::Float(_) => 0,
        Loose::Str(s) => s.trim().parse().unwrap_or(0),
    };
    Ok(id)
}

fn loose_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let flag = match Option::<Loose>::deserialize(d)? {
        None => None,
        Some(Loose::Bool(b)) => Some(b),
        Some(Loose::Int(n)) => Some(n != 0),
        Some(Loose::Float(f)) => Some(f != 0.0),
        Some(Loose::Str(s)) => match s.trim() {
            "" | "0" | "false" => Some(false),
            _ => Some(true),
        },
    };
    Ok(flag)
}
