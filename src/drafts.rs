//! Bank of deed drafts: uploaded templates the staff start new deeds from,
//! filed under Notaris or PPAT.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::store::{JsonStore, Record, now_iso, timestamp_id};
use crate::upload::{StoredFile, Uploads};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DraftCategory {
    #[default]
    Notaris,
    #[serde(rename = "PPAT")]
    Ppat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    pub title: String,
    pub category: DraftCategory,
    pub filename: String,
    pub file_url: String,
    pub upload_date: String,
}

impl Record for Draft {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Draft {
    fn stored_file(&self) -> StoredFile {
        StoredFile {
            file_url: self.file_url.clone(),
            file_name: self.filename.clone(),
            file_type: String::new(),
            file_size: 0,
        }
    }
}

/// Store an uploaded draft file and put its record at the front of the bank.
pub fn add_draft(
    store: &JsonStore<Draft>,
    uploads: &Uploads,
    title: &str,
    category: DraftCategory,
    file_name: &str,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<Draft> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::invalid("draft title is required"));
    }
    let stored = uploads.store("bank-draft", file_name, content_type, bytes)?;
    let draft = Draft {
        id: timestamp_id(),
        title: title.to_string(),
        category,
        filename: stored.file_name.clone(),
        file_url: stored.file_url.clone(),
        upload_date: now_iso(),
    };
    store.save(draft).inspect_err(|_| {
        if let Err(e) = uploads.remove(&stored) {
            log::warn!("could not remove {}: {}", stored.file_url, e);
        }
    })
}

/// Drop a draft and its file. Returns whether the draft existed.
pub fn delete_draft(store: &JsonStore<Draft>, uploads: &Uploads, id: &str) -> Result<bool> {
    let Some(draft) = store.find(id)? else {
        return Ok(false);
    };
    store.delete(id)?;
    if let Err(e) = uploads.remove(&draft.stored_file()) {
        log::warn!("draft {} removed but its file was kept: {}", id, e);
    }
    Ok(true)
}

/// Drafts in `category` (all when `None`) whose title or file name contains
/// `query`, case-insensitively.
pub fn filter<'a>(
    drafts: &'a [Draft],
    category: Option<DraftCategory>,
    query: &str,
) -> Vec<&'a Draft> {
    let query = query.trim().to_lowercase();
    drafts
        .iter()
        .filter(|d| category.is_none_or(|c| d.category == c))
        .filter(|d| {
            query.is_empty()
                || d.title.to_lowercase().contains(&query)
                || d.filename.to_lowercase().contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> (tempfile::TempDir, JsonStore<Draft>, Uploads) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("data"), "bank-draft.json").inserting_at_front();
        let uploads = Uploads::new(dir.path().join("public"), 1024);
        (dir, store, uploads)
    }

    #[test]
    fn add_filter_and_delete() {
        let (dir, store, uploads) = bank();
        let apht = add_draft(&store, &uploads, "APHT", DraftCategory::Ppat, "apht.docx", None, b"x")
            .unwrap();
        add_draft(&store, &uploads, "Pendirian PT", DraftCategory::Notaris, "pt.docx", None, b"y")
            .unwrap();

        let all = store.list();
        assert_eq!(all[0].title, "Pendirian PT");
        assert_eq!(filter(&all, Some(DraftCategory::Ppat), "").len(), 1);
        assert_eq!(filter(&all, None, "PT.DOCX").len(), 1);
        assert_eq!(filter(&all, Some(DraftCategory::Ppat), "pendirian").len(), 0);

        let path = dir.path().join("public").join(apht.file_url.trim_start_matches('/'));
        assert!(path.exists());
        assert!(delete_draft(&store, &uploads, &apht.id).unwrap());
        assert!(!path.exists());
        assert!(!delete_draft(&store, &uploads, &apht.id).unwrap());
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn untitled_draft_is_not_stored() {
        let (dir, store, uploads) = bank();
        let err = add_draft(&store, &uploads, "  ", DraftCategory::Notaris, "a.docx", None, b"x");
        assert!(matches!(err, Err(AppError::Invalid(_))));
        assert!(!dir.path().join("public/uploads/bank-draft").exists());
        assert!(store.list().is_empty());
    }

    #[test]
    fn category_wire_names() {
        let json = serde_json::to_value(DraftCategory::Ppat).unwrap();
        assert_eq!(json, "PPAT");
    }
}
