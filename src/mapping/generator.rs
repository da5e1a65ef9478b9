/*
Mapping id generation.

    Ids are opaque, generated once on creation, never rewritten.

    They only have to be unique inside one form's collection, but we use
    128 random bits so collisions are not a practical concern; the
    collection check below covers the rest.
*/
use uuid::Uuid;

use crate::core::mapping::MappingCollection;
use crate::core::types::MappingId;

/// Fresh id that is not already a key of `existing`.
pub fn generate_mapping_id(existing: &MappingCollection) -> MappingId {
    loop {
        let id = Uuid::new_v4().simple().to_string();
        if !existing.contains(&id) {
            return id;
        }
    }
}
