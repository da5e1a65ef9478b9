// field catalog adapter: the host's view of forms, fields and entries
use std::collections::HashMap;

use crate::core::error::CatalogError;
use crate::core::types::{Entry, EntryStatus, FieldId, Form, FormField, FormId, FormSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Search, sort and paging for one entry fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub form_id: FormId,
    pub status: EntryStatus,
    pub sort_key: FieldId,
    pub direction: SortDirection,
    pub offset: usize,
    pub limit: usize,
}

impl EntryQuery {
    /// Active entries of `form_id`, ascending by `field_id`, first `limit` only.
    pub fn harvest(form_id: FormId, field_id: FieldId, limit: usize) -> Self {
        Self {
            form_id,
            status: EntryStatus::Active,
            sort_key: field_id,
            direction: SortDirection::Asc,
            offset: 0,
            limit,
        }
    }
}

/// Read-only access to the host's forms. Implementations normalize whatever the
/// host stores into [`FormField`] / [`Entry`].
pub trait FieldCatalog {
    fn form_fields(&self, form_id: FormId) -> Result<Vec<FormField>, CatalogError>;
    fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CatalogError>;
    fn forms(&self) -> Result<Vec<FormSummary>, CatalogError>;
}

impl<T: FieldCatalog + ?Sized> FieldCatalog for &T {
    fn form_fields(&self, form_id: FormId) -> Result<Vec<FormField>, CatalogError> {
        (**self).form_fields(form_id)
    }

    fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CatalogError> {
        (**self).entries(query)
    }

    fn forms(&self) -> Result<Vec<FormSummary>, CatalogError> {
        (**self).forms()
    }
}

/// In-process catalog. Forms are listed in insertion order; entries keep their
/// submission order until a query sorts them.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    forms: Vec<Form>,
    entries: HashMap<FormId, Vec<Entry>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_form(&mut self, form: Form) -> &mut Self {
        match self.forms.iter().position(|f| f.id == form.id) {
            Some(i) => self.forms[i] = form,
            None => self.forms.push(form),
        }
        self
    }

    pub fn add_entries(&mut self, form_id: FormId, entries: impl IntoIterator<Item = Entry>) -> &mut Self {
        self.entries.entry(form_id).or_default().extend(entries);
        self
    }

    pub fn form(&self, form_id: FormId) -> Option<&Form> {
        self.forms.iter().find(|f| f.id == form_id)
    }
}

impl FieldCatalog for MemoryCatalog {
    fn form_fields(&self, form_id: FormId) -> Result<Vec<FormField>, CatalogError> {
        self.form(form_id)
            .map(|f| f.fields.clone())
            .ok_or(CatalogError::FormNotFound(form_id))
    }

    fn entries(&self, query: &EntryQuery) -> Result<Vec<Entry>, CatalogError> {
        if self.form(query.form_id).is_none() {
            return Err(CatalogError::FormNotFound(query.form_id));
        }

        let mut matched: Vec<&Entry> = self
            .entries
            .get(&query.form_id)
            .map(|all| all.iter().filter(|e| e.status == query.status).collect())
            .unwrap_or_default();

        //stable, so equal values keep submission order; missing values sort as ""
        matched.sort_by(|a, b| {
            let va = a.value(query.sort_key).unwrap_or("");
            let vb = b.value(query.sort_key).unwrap_or("");
            match query.direction {
                SortDirection::Asc => va.cmp(vb),
                SortDirection::Desc => vb.cmp(va),
            }
        });

        Ok(matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    fn forms(&self) -> Result<Vec<FormSummary>, CatalogError> {
        Ok(self
            .forms
            .iter()
            .map(|f| FormSummary { id: f.id, title: f.title.clone() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FieldType;

    fn mk_catalog() -> MemoryCatalog {
        let mut c = MemoryCatalog::new();
        c.add_form(Form::new(10, "Colours", vec![FormField::new(3, "Name", FieldType::Text)]));
        c.add_entries(
            10,
            vec![
                Entry::new([("3", "Red")]),
                Entry::new([("3", "Amber")]).with_status(EntryStatus::Trash),
                Entry::new([("3", "Blue")]),
                Entry::new([("3", "Green")]),
            ],
        );
        c
    }

    fn values(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.value(3).unwrap_or("")).collect()
    }

    #[test]
    fn harvest_query_filters_sorts_and_caps() {
        let c = mk_catalog();

        let all = c.entries(&EntryQuery::harvest(10, 3, 200)).unwrap();
        assert_eq!(values(&all), vec!["Blue", "Green", "Red"]);

        let capped = c.entries(&EntryQuery::harvest(10, 3, 2)).unwrap();
        assert_eq!(values(&capped), vec!["Blue", "Green"]);
    }

    #[test]
    fn offset_and_descending() {
        let c = mk_catalog();
        let q = EntryQuery { offset: 1, direction: SortDirection::Desc, ..EntryQuery::harvest(10, 3, 10) };
        assert_eq!(values(&c.entries(&q).unwrap()), vec!["Green", "Blue"]);
    }

    #[test]
    fn unknown_form_is_an_error() {
        let c = mk_catalog();
        assert!(matches!(c.form_fields(99), Err(CatalogError::FormNotFound(99))));
        assert!(c.entries(&EntryQuery::harvest(99, 1, 10)).is_err());
    }

    #[test]
    fn add_form_replaces_same_id_in_place() {
        let mut c = mk_catalog();
        c.add_form(Form::new(11, "Sizes", vec![]));
        c.add_form(Form::new(10, "Colours v2", vec![]));

        let forms = c.forms().unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0], FormSummary { id: 10, title: "Colours v2".to_string() });
    }
}
