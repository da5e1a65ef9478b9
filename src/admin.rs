//! Request-scoped entry points for the host platform.
//!
//! [`RelatedFields`] owns the injected store, catalog, hooks and config for one
//! request. The host calls [`RelatedFields::on_render_stage`] from every hook that
//! emits a live form definition, and the admin operations from its settings UI.
//! Nothing here renders markup or checks permissions; the host does that around
//! these calls.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::catalog::FieldCatalog;
use crate::core::error::ValidationError;
use crate::core::hooks::{default_row_actions, DefaultHooks, Hooks, RowAction};
use crate::core::mapping::{Mapping, MappingCollection};
use crate::core::resolve::Resolver;
use crate::core::store::{MappingStore, OptionStore};
use crate::core::types::{FieldId, Form, FormField, FormId, FormSummary};
use crate::core::validate::{validate_and_build, RawSelection};

/// Host lifecycle points where the live form is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    PreRender,
    AdminPreRender,
    PreValidation,
    PreSubmissionFilter,
}

impl RenderStage {
    pub const ALL: [RenderStage; 4] = [
        RenderStage::PreRender,
        RenderStage::AdminPreRender,
        RenderStage::PreValidation,
        RenderStage::PreSubmissionFilter,
    ];
}

/// Picker entry: a field id, the label an admin should see, and whether the
/// edit view should pre-select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub id: FieldId,
    pub label: String,
    #[serde(default)]
    pub selected: bool,
}

impl FieldOption {
    pub fn new(id: FieldId, label: impl Into<String>) -> Self {
        Self { id, label: label.into(), selected: false }
    }

    fn from_field(field: &FormField, selected: Option<FieldId>) -> Self {
        Self {
            id: field.id,
            label: field.display_label().to_string(),
            selected: selected == Some(field.id),
        }
    }
}

/// One list-view row with references already resolved to display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub id: String,
    pub is_active: bool,
    pub target_field_id: FieldId,
    pub target_field_label: String,
    pub source_form_id: FormId,
    pub source_form_title: String,
    pub source_form_field_id: FieldId,
    pub source_form_field_label: String,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The mapping as built from the submission, valid or not, so the edit view
    /// can redisplay what was entered.
    pub mapping: Mapping,
    pub errors: Vec<ValidationError>,
    pub saved: bool,
}

impl SaveOutcome {
    /// Admin notice for this outcome: the success line, or one line per error.
    pub fn messages(&self) -> Vec<String> {
        if !self.errors.is_empty() {
            return self.errors.iter().map(ToString::to_string).collect();
        }
        if self.saved {
            vec!["Related field saved successfully.".to_string()]
        } else {
            vec!["There was an issue saving this related field connection.".to_string()]
        }
    }
}

pub fn delete_message(deleted: bool) -> &'static str {
    if deleted {
        "Related field connection deleted."
    } else {
        "There was an issue deleting this related field connection."
    }
}

/// Request-scoped handler. Build one per inbound request; no state outlives it
/// beyond what the option store persists.
pub struct RelatedFields<S, C, H = DefaultHooks> {
    store: MappingStore<S>,
    catalog: C,
    hooks: H,
    config: Config,
}

impl<S: OptionStore, C: FieldCatalog> RelatedFields<S, C, DefaultHooks> {
    pub fn new(options: S, catalog: C, config: Config) -> Self {
        Self::with_hooks(options, catalog, DefaultHooks, config)
    }
}

impl<S: OptionStore, C: FieldCatalog, H: Hooks> RelatedFields<S, C, H> {
    pub fn with_hooks(options: S, catalog: C, hooks: H, config: Config) -> Self {
        let store = MappingStore::with_prefix(options, config.option_key_prefix.clone());
        Self { store, catalog, hooks, config }
    }

    pub fn store(&self) -> &MappingStore<S> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolver(&self) -> Resolver<'_, C, H> {
        Resolver::new(&self.catalog, &self.hooks, &self.config)
    }

    /// Rewrite mapped fields of `form`. One store read per call; never fails.
    pub fn resolve(&self, form: Form) -> Form {
        let collection = self.store.load(form.id);
        self.resolver().resolve(form, &collection)
    }

    pub fn on_render_stage(&self, stage: RenderStage, form: Form) -> Form {
        debug!(?stage, form_id = form.id, "resolving related fields");
        self.resolve(form)
    }

    pub fn is_populateable(&self, field: &FormField) -> bool {
        self.resolver().is_populateable(field)
    }

    pub fn mappings(&self, form_id: FormId) -> MappingCollection {
        self.store.load(form_id)
    }

    /// Rows for the list view of `form`'s mappings, in stored order.
    ///
    /// Missing target fields, source forms or source fields resolve to empty
    /// labels rather than dropping the row.
    pub fn list_mappings(&self, form: &Form) -> Vec<MappingRow> {
        let collection = self.store.load(form.id);
        let forms = self.catalog.forms().unwrap_or_else(|e| {
            warn!(form_id = form.id, error = %e, "could not list forms");
            Vec::new()
        });

        collection
            .iter()
            .map(|m| {
                let target_field_label = form
                    .field(m.target_field_id)
                    .map(|f| f.label.clone())
                    .unwrap_or_default();
                let source_form_title = forms
                    .iter()
                    .find(|f| f.id == m.source_form_id)
                    .map(|f| f.title.clone())
                    .unwrap_or_default();
                let source_form_field_label = self
                    .catalog
                    .form_fields(m.source_form_id)
                    .ok()
                    .and_then(|fields| {
                        fields
                            .iter()
                            .find(|f| f.id == m.source_form_field_id)
                            .map(|f| f.display_label().to_string())
                    })
                    .unwrap_or_default();

                MappingRow {
                    id: m.id.clone(),
                    is_active: m.is_active(),
                    target_field_id: m.target_field_id,
                    target_field_label,
                    source_form_id: m.source_form_id,
                    source_form_title,
                    source_form_field_id: m.source_form_field_id,
                    source_form_field_label,
                    actions: self.hooks.row_actions(m, default_row_actions()),
                }
            })
            .collect()
    }

    /// "Field to populate" picker: populateable fields of `form` after the
    /// admin pre-render pass, with `selected` marked when present.
    pub fn target_field_choices(&self, form: Form, selected: Option<FieldId>) -> Vec<FieldOption> {
        let form = self.on_render_stage(RenderStage::AdminPreRender, form);
        form.fields
            .iter()
            .filter(|f| self.is_populateable(f))
            .map(|f| FieldOption::from_field(f, selected))
            .collect()
    }

    pub fn source_forms(&self) -> Vec<FormSummary> {
        self.catalog.forms().unwrap_or_else(|e| {
            warn!(error = %e, "could not list forms");
            Vec::new()
        })
    }

    /// "Source form field" picker: every field of `form_id` except display-only
    /// ones. A `selected` id with no matching field marks nothing.
    pub fn available_form_fields(&self, form_id: FormId, selected: Option<FieldId>) -> Vec<FieldOption> {
        match self.catalog.form_fields(form_id) {
            Ok(fields) => fields
                .iter()
                .filter(|f| !f.display_only)
                .map(|f| FieldOption::from_field(f, selected))
                .collect(),
            Err(e) => {
                warn!(form_id, error = %e, "could not list source form fields");
                Vec::new()
            }
        }
    }

    /// Create (`existing_id` absent/unknown) or re-edit a mapping from a raw
    /// submission. Nothing is written unless validation passes.
    pub fn save_mapping(
        &mut self,
        form_id: FormId,
        existing_id: Option<&str>,
        raw: &RawSelection,
    ) -> SaveOutcome {
        let mut collection = self.store.load(form_id);
        let existing = existing_id.and_then(|id| collection.get(id));
        let (mapping, errors) = validate_and_build(existing, raw, form_id, &collection);

        if !errors.is_empty() {
            return SaveOutcome { mapping, errors, saved: false };
        }

        collection.upsert(mapping.clone());
        let saved = self.store.save(form_id, &collection);
        info!(form_id, mapping_id = %mapping.id, saved, "saved related field");

        SaveOutcome { mapping, errors, saved }
    }

    pub fn delete_mapping(&mut self, form_id: FormId, mapping_id: &str) -> bool {
        self.store.delete(form_id, mapping_id)
    }

    /// Flip one mapping on or off. Unknown form or mapping ids report `false`
    /// and leave storage alone.
    pub fn set_mapping_active(&mut self, form_id: FormId, mapping_id: &str, is_active: bool) -> bool {
        if form_id == 0 {
            return false;
        }

        let mut collection = self.store.load(form_id);
        if !collection.set_active(mapping_id, is_active) {
            warn!(form_id, mapping_id, "toggle for unknown related field");
            return false;
        }

        let saved = self.store.save(form_id, &collection);
        info!(form_id, mapping_id, is_active, saved, "toggled related field");
        saved
    }
}
