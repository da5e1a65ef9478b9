// resolution: rewrite choice lists of mapped fields from source-form entries
use tracing::{debug, warn};

use crate::config::Config;
use crate::core::catalog::{EntryQuery, FieldCatalog};
use crate::core::hooks::Hooks;
use crate::core::mapping::{Mapping, MappingCollection};
use crate::core::types::{Choice, Form, FormField, FormId};

/// Resolves one form against its already-loaded collection.
///
/// Stateless apart from the borrowed collaborators; build one per request.
pub struct Resolver<'a, C: ?Sized, H: ?Sized> {
    pub catalog: &'a C,
    pub hooks: &'a H,
    pub config: &'a Config,
}

impl<'a, C, H> Resolver<'a, C, H>
where
    C: FieldCatalog + ?Sized,
    H: Hooks + ?Sized,
{
    pub fn new(catalog: &'a C, hooks: &'a H, config: &'a Config) -> Self {
        Self { catalog, hooks, config }
    }

    pub fn is_populateable(&self, field: &FormField) -> bool {
        let default_verdict = self.config.default_populateable(&field.field_type);
        self.hooks.is_populateable(&field.field_type, default_verdict)
    }

    /// Walk `form.fields` in order and replace the choices of every populateable
    /// field that has an active mapping in `collection`.
    ///
    /// Steps per field:
    /// 1) skip if its type is not populateable
    /// 2) take the first mapping targeting it; skip if none or explicitly inactive
    /// 3) fetch active source entries, ascending by the source field, capped
    /// 4) one option per non-empty value (text == value, duplicates kept)
    /// 5) replace the field's choices wholesale
    ///
    /// Never fails: a catalog error is logged and yields an empty choice list.
    pub fn resolve(&self, mut form: Form, collection: &MappingCollection) -> Form {
        if collection.is_empty() {
            return form;
        }

        let limit = self.hooks.entry_limit(self.config.entry_limit);

        for field in form.fields.iter_mut() {
            if !self.is_populateable(field) {
                continue;
            }

            let Some(mapping) = collection.for_target(field.id) else {
                continue;
            };

            if !mapping.is_active() {
                continue;
            }

            field.choices = self.harvest(form.id, mapping, limit);
            debug!(
                form_id = form.id,
                field_id = field.id,
                mapping_id = %mapping.id,
                choices = field.choices.len(),
                "populated related field"
            );
        }

        form
    }

    fn harvest(&self, form_id: FormId, mapping: &Mapping, limit: usize) -> Vec<Choice> {
        let query = EntryQuery::harvest(mapping.source_form_id, mapping.source_form_field_id, limit);

        let entries = match self.catalog.entries(&query) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    form_id,
                    mapping_id = %mapping.id,
                    source_form_id = mapping.source_form_id,
                    error = %e,
                    "could not fetch source entries, leaving field without choices"
                );
                Vec::new()
            }
        };

        entries
            .iter()
            .filter_map(|e| e.value(mapping.source_form_field_id))
            .filter(|v| !v.is_empty())
            .map(Choice::same)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::MemoryCatalog;
    use crate::core::error::CatalogError;
    use crate::core::hooks::DefaultHooks;
    use crate::core::types::{Entry, EntryStatus, FieldType, FormSummary};
    use std::cell::Cell;

    fn mk_target_form() -> Form {
        Form::new(
            1,
            "Order",
            vec![
                FormField::new(4, "Notes", FieldType::Text),
                FormField::new(5, "Colour", FieldType::Select)
                    .with_choices(vec![Choice::same("static")]),
                FormField::new(6, "Size", FieldType::Radio)
                    .with_choices(vec![Choice::same("S"), Choice::same("M")]),
            ],
        )
    }

    fn mk_catalog(values: &[&str]) -> MemoryCatalog {
        let mut c = MemoryCatalog::new();
        c.add_form(Form::new(10, "Colours", vec![FormField::new(7, "Name", FieldType::Text)]));
        c.add_entries(10, values.iter().map(|v| Entry::new([("7", *v)])));
        c
    }

    fn mk_collection(mapping: Mapping) -> MappingCollection {
        vec![mapping].into_iter().collect()
    }

    fn texts(field: &FormField) -> Vec<&str> {
        field.choices.iter().map(|c| c.text.as_str()).collect()
    }

    /// Counts entry fetches and can be told to fail.
    struct ProbeCatalog {
        inner: MemoryCatalog,
        fail: bool,
        calls: Cell<usize>,
    }

    impl FieldCatalog for ProbeCatalog {
        fn form_fields(&self, form_id: u32) -> Result<Vec<FormField>, CatalogError> {
            self.inner.form_fields(form_id)
        }

        fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CatalogError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(CatalogError::Backend("db timeout".to_string()));
            }
            self.inner.entries(query)
        }

        fn forms(&self) -> Result<Vec<FormSummary>, CatalogError> {
            self.inner.forms()
        }
    }

    /// Hands back entries in exactly the order given and records the query.
    struct FixedOrderCatalog {
        entries: Vec<Entry>,
        seen: std::cell::RefCell<Vec<EntryQuery>>,
    }

    impl FieldCatalog for FixedOrderCatalog {
        fn form_fields(&self, _form_id: u32) -> Result<Vec<FormField>, CatalogError> {
            Ok(Vec::new())
        }

        fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CatalogError> {
            self.seen.borrow_mut().push(query.clone());
            Ok(self.entries.clone())
        }

        fn forms(&self) -> Result<Vec<FormSummary>, CatalogError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn scenario_duplicates_preserved_and_static_choices_replaced() {
        let catalog = FixedOrderCatalog {
            entries: ["A", "B", "A"].iter().map(|v| Entry::new([("7", *v)])).collect(),
            seen: Default::default(),
        };
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        let out = r.resolve(mk_target_form(), &mk_collection(Mapping::new("m1", 5, 10, 7)));

        //adapter order is kept, no dedup
        let colour = out.field(5).unwrap();
        assert_eq!(
            colour.choices,
            vec![Choice::same("A"), Choice::same("B"), Choice::same("A")]
        );
        assert_eq!(colour.choices[1], Choice { text: "B".into(), value: "B".into() });

        //untouched fields keep their options
        assert_eq!(texts(out.field(6).unwrap()), vec!["S", "M"]);

        //one fetch: active entries of form 10, ascending on field 7, first 200
        let seen = catalog.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], EntryQuery::harvest(10, 7, 200));
        assert_eq!(seen[0].status, EntryStatus::Active);
        assert_eq!(seen[0].direction, crate::core::catalog::SortDirection::Asc);
        assert_eq!(seen[0].offset, 0);
    }

    #[test]
    fn empty_values_are_skipped_in_order() {
        let catalog = FixedOrderCatalog {
            entries: vec![
                Entry::new([("3", "Red")]),
                Entry::new([("3", "")]),
                Entry::new([("4", "other field only")]),
                Entry::new([("3", "Blue")]),
            ],
            seen: Default::default(),
        };
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        let out = r.resolve(mk_target_form(), &mk_collection(Mapping::new("m1", 5, 10, 3)));
        assert_eq!(texts(out.field(5).unwrap()), vec!["Red", "Blue"]);
    }

    #[test]
    fn absent_flag_and_true_flag_resolve_identically() {
        let catalog = mk_catalog(&["X", "Y"]);
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        let absent = Mapping::new("m1", 5, 10, 7);
        let explicit = Mapping { is_active: Some(true), ..absent.clone() };

        assert_eq!(
            r.resolve(mk_target_form(), &mk_collection(absent)),
            r.resolve(mk_target_form(), &mk_collection(explicit))
        );
    }

    #[test]
    fn inactive_mapping_leaves_field_untouched() {
        let catalog = ProbeCatalog { inner: mk_catalog(&["X"]), fail: false, calls: Cell::new(0) };
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        let m = Mapping { is_active: Some(false), ..Mapping::new("m1", 5, 10, 7) };
        let out = r.resolve(mk_target_form(), &mk_collection(m));

        assert_eq!(out, mk_target_form());
        assert_eq!(catalog.calls.get(), 0);
    }

    #[test]
    fn non_populateable_target_is_skipped() {
        let catalog = mk_catalog(&["X"]);
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        //field 4 is a text field
        let out = r.resolve(mk_target_form(), &mk_collection(Mapping::new("m1", 4, 10, 7)));
        assert_eq!(out, mk_target_form());
    }

    #[test]
    fn hook_can_opt_in_other_types_and_change_limit() {
        struct Generous;
        impl Hooks for Generous {
            fn is_populateable(&self, ty: &FieldType, default_verdict: bool) -> bool {
                default_verdict || *ty == FieldType::Text
            }
            fn entry_limit(&self, _default_limit: usize) -> usize {
                1
            }
        }

        let catalog = mk_catalog(&["Q", "P"]);
        let config = Config::default();
        let r = Resolver::new(&catalog, &Generous, &config);

        let out = r.resolve(mk_target_form(), &mk_collection(Mapping::new("m1", 4, 10, 7)));
        assert_eq!(texts(out.field(4).unwrap()), vec!["P"]);
    }

    #[test]
    fn cap_takes_first_n_by_ascending_value() {
        //500 entries, zero-padded so lexical order == numeric order, inserted reversed
        let values: Vec<String> = (0..500).rev().map(|i| format!("v{i:03}")).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let catalog = mk_catalog(&refs);
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        let out = r.resolve(mk_target_form(), &mk_collection(Mapping::new("m1", 5, 10, 7)));
        let colour = out.field(5).unwrap();

        assert_eq!(colour.choices.len(), 200);
        assert_eq!(colour.choices[0].value, "v000");
        assert_eq!(colour.choices[199].value, "v199");
    }

    #[test]
    fn catalog_failure_yields_empty_choices_not_static_ones() {
        let catalog = ProbeCatalog { inner: mk_catalog(&["X"]), fail: true, calls: Cell::new(0) };
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        let out = r.resolve(mk_target_form(), &mk_collection(Mapping::new("m1", 5, 10, 7)));
        assert!(out.field(5).unwrap().choices.is_empty());
        assert_eq!(catalog.calls.get(), 1);
    }

    #[test]
    fn inactive_entries_are_not_harvested() {
        let mut catalog = mk_catalog(&["Kept"]);
        catalog.add_entries(10, vec![Entry::new([("7", "Spammy")]).with_status(EntryStatus::Spam)]);
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        let out = r.resolve(mk_target_form(), &mk_collection(Mapping::new("m1", 5, 10, 7)));
        assert_eq!(texts(out.field(5).unwrap()), vec!["Kept"]);
    }

    #[test]
    fn resolve_is_idempotent() {
        let catalog = mk_catalog(&["B", "A"]);
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);
        let collection = mk_collection(Mapping::new("m1", 5, 10, 7));

        let once = r.resolve(mk_target_form(), &collection);
        let twice = r.resolve(once.clone(), &collection);
        assert_eq!(once, twice);
    }

    #[test]
    fn first_mapping_for_a_field_wins() {
        let catalog = mk_catalog(&["X"]);
        let config = Config::default();
        let r = Resolver::new(&catalog, &DefaultHooks, &config);

        let collection: MappingCollection =
            vec![Mapping::new("first", 5, 10, 7), Mapping::new("second", 5, 20, 7)]
                .into_iter()
                .collect();

        let out = r.resolve(mk_target_form(), &collection);
        assert_eq!(texts(out.field(5).unwrap()), vec!["X"]);
    }
}
