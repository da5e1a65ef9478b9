// shared ids + form/entry shapes handed to us by the host platform
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type FormId = u32;
pub type FieldId = u32;
pub type MappingId = String;

/// Field type tag as reported by the host form builder.
///
/// Unknown tags are kept verbatim in `Other` so a host-specific type can still
/// opt in through [`crate::core::hooks::Hooks::is_populateable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Select,
    MultiSelect,
    Radio,
    Checkbox,
    Text,
    TextArea,
    Number,
    Email,
    Hidden,
    Section,
    Page,
    Html,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Select => "select",
            FieldType::MultiSelect => "multiselect",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Text => "text",
            FieldType::TextArea => "textarea",
            FieldType::Number => "number",
            FieldType::Email => "email",
            FieldType::Hidden => "hidden",
            FieldType::Section => "section",
            FieldType::Page => "page",
            FieldType::Html => "html",
            FieldType::Other(tag) => tag,
        }
    }

    /// Built-in populateable set, before any hook gets a say.
    pub fn is_choice_type(&self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::MultiSelect | FieldType::Radio | FieldType::Checkbox
        )
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        match tag {
            "select" => FieldType::Select,
            "multiselect" => FieldType::MultiSelect,
            "radio" => FieldType::Radio,
            "checkbox" => FieldType::Checkbox,
            "text" => FieldType::Text,
            "textarea" => FieldType::TextArea,
            "number" => FieldType::Number,
            "email" => FieldType::Email,
            "hidden" => FieldType::Hidden,
            "section" => FieldType::Section,
            "page" => FieldType::Page,
            "html" => FieldType::Html,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        FieldType::from(tag.as_str())
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable option. Text and value are always the same harvested string
/// when the option was produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub value: String,
}

impl Choice {
    pub fn same(raw: &str) -> Self {
        Self { text: raw.to_string(), value: raw.to_string() }
    }
}

/// Canonical field shape; catalog adapters normalize to this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub id: FieldId,
    #[serde(default)]
    pub label: String,
    //hosts send camelCase keys
    #[serde(default, alias = "adminLabel")]
    pub admin_label: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, alias = "displayOnly")]
    pub display_only: bool,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl FormField {
    pub fn new(id: FieldId, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id,
            label: label.into(),
            admin_label: None,
            field_type,
            display_only: false,
            choices: Vec::new(),
        }
    }

    pub fn with_admin_label(mut self, admin_label: impl Into<String>) -> Self {
        self.admin_label = Some(admin_label.into());
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn display_only(mut self) -> Self {
        self.display_only = true;
        self
    }

    /// Admin label wins over the public label when set and non-empty.
    pub fn display_label(&self) -> &str {
        match self.admin_label.as_deref() {
            Some(admin) if !admin.is_empty() => admin,
            _ => &self.label,
        }
    }
}

/// Live form definition as emitted by the host at render/validation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl Form {
    pub fn new(id: FormId, title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self { id, title: title.into(), fields }
    }

    pub fn field(&self, field_id: FieldId) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == field_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: FormId,
    pub title: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Active,
    Spam,
    Trash,
}

/// One submission of a source form: sparse field-id -> value.
///
/// Keys are strings because hosts address sub-inputs as `"3.1"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub status: EntryStatus,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl Entry {
    pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            status: EntryStatus::Active,
            values: values.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn value(&self, field_id: FieldId) -> Option<&str> {
        self.values.get(&field_id.to_string()).map(String::as_str)
    }
}
