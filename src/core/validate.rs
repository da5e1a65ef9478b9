// building a mapping from a raw admin submission
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::ValidationError;
use crate::core::mapping::{Mapping, MappingCollection};
use crate::core::types::FormId;
use crate::mapping::generator::generate_mapping_id;

/// Raw picker values exactly as the admin surface received them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSelection {
    #[serde(default)]
    pub target_field: Option<String>,
    #[serde(default)]
    pub source_form: Option<String>,
    #[serde(default)]
    pub source_form_field: Option<String>,
}

impl RawSelection {
    pub fn new(target_field: &str, source_form: &str, source_form_field: &str) -> Self {
        Self {
            target_field: Some(target_field.to_string()),
            source_form: Some(source_form.to_string()),
            source_form_field: Some(source_form_field.to_string()),
        }
    }
}

/// Coerce a raw id to a non-negative integer, never failing.
///
/// Reads an optional sign and the leading digit run (`"5abc"` and `"5.9"` are 5),
/// drops the sign (`"-7"` is 7), and yields 0 when there are no digits or the
/// value does not fit a `u32`.
pub fn parse_id(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else { return 0 };
    let unsigned = raw.trim().trim_start_matches(['+', '-']);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..digits_end].parse::<u32>().unwrap_or(0)
}

/// Merge a submission into `existing` (or a new mapping) and check it.
///
/// Every rule is checked, so the caller gets all errors at once. A non-empty error
/// list means the mapping must not be persisted. The id and any existing
/// `is_active` flag are kept; new ids are unique within `siblings`.
pub fn validate_and_build(
    existing: Option<&Mapping>,
    raw: &RawSelection,
    form_id: FormId,
    siblings: &MappingCollection,
) -> (Mapping, Vec<ValidationError>) {
    let mut mapping = match existing {
        Some(m) => m.clone(),
        None => Mapping::empty(generate_mapping_id(siblings)),
    };

    mapping.target_field_id = parse_id(raw.target_field.as_deref());
    mapping.source_form_id = parse_id(raw.source_form.as_deref());
    mapping.source_form_field_id = parse_id(raw.source_form_field.as_deref());

    let mut errors = Vec::new();
    if mapping.target_field_id == 0 {
        errors.push(ValidationError::MissingTargetField);
    }
    if mapping.source_form_id == 0 {
        errors.push(ValidationError::MissingSourceForm);
    }
    if mapping.source_form_field_id == 0 {
        errors.push(ValidationError::MissingSourceField);
    }

    debug!(
        form_id,
        mapping_id = %mapping.id,
        is_new = existing.is_none(),
        errors = errors.len(),
        "validated related field submission"
    );

    (mapping, errors)
}
