//! Ready-to-paste WhatsApp message templates sent to clients.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::store::{JsonStore, Record, now_iso, timestamp_id};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WaForm {
    pub id: String,
    pub title: String,
    /// Shown as `Umum` when empty
    pub category: String,
    pub content: String,
    pub last_updated: String,
}

impl Record for WaForm {
    fn id(&self) -> &str {
        &self.id
    }
}

pub fn save_template(store: &JsonStore<WaForm>, mut form: WaForm) -> Result<WaForm> {
    if form.title.trim().is_empty() || form.content.trim().is_empty() {
        return Err(AppError::invalid("template title and content are required"));
    }
    if form.id.trim().is_empty() {
        form.id = timestamp_id();
    }
    form.last_updated = now_iso();
    store.save(form)
}

/// Templates whose title or category contains `query`, case-insensitively.
pub fn search<'a>(forms: &'a [WaForm], query: &str) -> Vec<&'a WaForm> {
    let query = query.trim().to_lowercase();
    forms
        .iter()
        .filter(|f| {
            query.is_empty()
                || f.title.to_lowercase().contains(&query)
                || f.category.to_lowercase().contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "wa-forms.json");
        let blank = WaForm {
            title: "Data pendirian PT".to_string(),
            ..WaForm::default()
        };
        assert!(save_template(&store, blank).is_err());

        let saved = save_template(
            &store,
            WaForm {
                title: "Data pendirian PT".to_string(),
                category: "Badan Usaha".to_string(),
                content: "Mohon kirimkan:\n1. KTP\n2. NPWP".to_string(),
                ..WaForm::default()
            },
        )
        .unwrap();
        assert!(!saved.last_updated.is_empty());

        let edited = save_template(
            &store,
            WaForm {
                content: "Mohon kirimkan KTP".to_string(),
                ..saved.clone()
            },
        )
        .unwrap();
        assert_eq!(edited.id, saved.id);

        let all = store.list();
        assert_eq!(all.len(), 1);
        assert_eq!(search(&all, "badan").len(), 1);
        assert!(search(&all, "waris").is_empty());
    }
}
