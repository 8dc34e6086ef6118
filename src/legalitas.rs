//! Archive of legal-entity documents: each entity holds four columns of
//! uploaded files or free-text notes.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::store::{JsonStore, Record, now_iso, prefixed_id, timestamp_id};
use crate::upload::StoredFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityCategory {
    Client,
    Notaris,
    Instansi,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocType {
    #[default]
    Legalitas,
    Ppat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Note,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// File URL or note text
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    pub created_at: String,
}

impl LegalItem {
    pub fn note(text: &str) -> Self {
        LegalItem {
            id: timestamp_id(),
            kind: ItemKind::Note,
            content: text.to_string(),
            file_name: None,
            file_type: None,
            created_at: now_iso(),
        }
    }

    pub fn file(stored: StoredFile) -> Self {
        LegalItem {
            id: timestamp_id(),
            kind: ItemKind::File,
            content: stored.file_url,
            file_name: Some(stored.file_name),
            file_type: Some(stored.file_type),
            created_at: now_iso(),
        }
    }
}

/// One of the four document columns of an entity.
///
/// In `LEGALITAS` mode the columns hold copies/decrees, tax (Coretax)
/// documents, OSS licences and other documents; in `PPAT` mode client,
/// PPAT, agency and other documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "col2")]
    First,
    #[serde(rename = "col3")]
    Second,
    #[serde(rename = "col4")]
    Third,
    #[serde(rename = "col5")]
    Fourth,
}

impl Column {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "col2" => Some(Column::First),
            "col3" => Some(Column::Second),
            "col4" => Some(Column::Third),
            "col5" => Some(Column::Fourth),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EntityCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    #[serde(default)]
    pub nama: String,
    /// NPWP or decree number
    #[serde(default)]
    pub nomor: String,
    /// Date of establishment
    #[serde(default)]
    pub tanggal: String,
    #[serde(default)]
    pub col2: Vec<LegalItem>,
    #[serde(default)]
    pub col3: Vec<LegalItem>,
    #[serde(default)]
    pub col4: Vec<LegalItem>,
    #[serde(default)]
    pub col5: Vec<LegalItem>,
    #[serde(default)]
    pub updated_at: String,
}

impl Record for LegalEntity {
    fn id(&self) -> &str {
        &self.id
    }
}

impl LegalEntity {
    pub fn column_mut(&mut self, column: Column) -> &mut Vec<LegalItem> {
        match column {
            Column::First => &mut self.col2,
            Column::Second => &mut self.col3,
            Column::Third => &mut self.col4,
            Column::Fourth => &mut self.col5,
        }
    }

    fn columns_mut(&mut self) -> [&mut Vec<LegalItem>; 4] {
        [&mut self.col2, &mut self.col3, &mut self.col4, &mut self.col5]
    }

    /// Number of columns holding at least one item (0..=4).
    pub fn completeness(&self) -> usize {
        [&self.col2, &self.col3, &self.col4, &self.col5]
            .iter()
            .filter(|c| !c.is_empty())
            .count()
    }

    pub fn view(&self) -> EntityView<'_> {
        EntityView {
            entity: self,
            completeness: self.completeness(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntityView<'a> {
    #[serde(flatten)]
    pub entity: &'a LegalEntity,
    pub completeness: usize,
}

/// Save an entity; new ones get an id and go to the front of the list.
pub fn save_entity(store: &JsonStore<LegalEntity>, mut entity: LegalEntity) -> Result<LegalEntity> {
    if entity.id.trim().is_empty() {
        entity.id = prefixed_id("LEG-");
    }
    entity.updated_at = now_iso();
    store.save(entity)
}

/// Append `item` to `column` of the entity with `entity_id`.
pub fn add_item(
    store: &JsonStore<LegalEntity>,
    entity_id: &str,
    column: Column,
    item: LegalItem,
) -> Result<LegalEntity> {
    store.update(|entities| {
        let entity = entities
            .iter_mut()
            .find(|e| e.id == entity_id)
            .ok_or_else(|| AppError::not_found("legal entity", entity_id))?;
        entity.column_mut(column).push(item);
        entity.updated_at = now_iso();
        Ok(entity.clone())
    })
}

/// Remove the item with `item_id` from whichever column holds it.
pub fn remove_item(
    store: &JsonStore<LegalEntity>,
    entity_id: &str,
    item_id: &str,
) -> Result<LegalEntity> {
    store.update(|entities| {
        let entity = entities
            .iter_mut()
            .find(|e| e.id == entity_id)
            .ok_or_else(|| AppError::not_found("legal entity", entity_id))?;
        let mut removed = false;
        for column in entity.columns_mut() {
            let before = column.len();
            column.retain(|item| item.id != item_id);
            removed |= column.len() != before;
        }
        if !removed {
            return Err(AppError::not_found("document item", item_id));
        }
        entity.updated_at = now_iso();
        Ok(entity.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, JsonStore<LegalEntity>) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "legalitas-badan.json").inserting_at_front();
        (dir, store)
    }

    fn entity(nama: &str) -> LegalEntity {
        serde_json::from_value(serde_json::json!({ "nama": nama, "docType": "PPAT" })).unwrap()
    }

    #[test]
    fn new_entities_go_first() {
        let (_dir, store) = store();
        save_entity(&store, entity("PT Satu")).unwrap();
        save_entity(&store, entity("PT Dua")).unwrap();
        let names: Vec<String> = store.list().into_iter().map(|e| e.nama).collect();
        assert_eq!(names, vec!["PT Dua", "PT Satu"]);
    }

    #[test]
    fn items_fill_columns_and_can_be_removed() {
        let (_dir, store) = store();
        let saved = save_entity(&store, entity("CV Maju")).unwrap();
        assert_eq!(saved.completeness(), 0);

        let note = LegalItem::note("SK menyusul");
        let note_id = note.id.clone();
        add_item(&store, &saved.id, Column::Second, note).unwrap();
        let updated = add_item(&store, &saved.id, Column::Fourth, LegalItem::note("OSS")).unwrap();
        assert_eq!(updated.completeness(), 2);
        assert_eq!(serde_json::to_value(updated.view()).unwrap()["completeness"], 2);
        assert_eq!(updated.col3[0].content, "SK menyusul");

        let after = remove_item(&store, &saved.id, &note_id).unwrap();
        assert_eq!(after.completeness(), 1);
        assert!(matches!(
            remove_item(&store, &saved.id, &note_id),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn unknown_entity_is_not_found() {
        let (_dir, store) = store();
        let result = add_item(&store, "missing", Column::First, LegalItem::note("x"));
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
