//! One newest-first list of every archived document: invoices, hand-over
//! receipts, deed cover sheets and both kinds of CDD form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cdd::{CddKorporasi, CddPerorangan};
use crate::error::Result;
use crate::forms::{FormRecord, Invoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Invoice,
    SerahTerima,
    CddPerorangan,
    CddKorporasi,
    CoverAkta,
}

impl DocumentType {
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Invoice => "Invoice",
            DocumentType::SerahTerima => "Serah Terima Dokumen",
            DocumentType::CddPerorangan => "CDD Perorangan",
            DocumentType::CddKorporasi => "CDD Korporasi",
            DocumentType::CoverAkta => "Cover Akta",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::SerahTerima => "serah-terima",
            DocumentType::CddPerorangan => "cdd-perorangan",
            DocumentType::CddKorporasi => "cdd-korporasi",
            DocumentType::CoverAkta => "cover-akta",
        }
    }
}

/// A document as shown in the history list; `data` is the archived record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique across types, e.g. `invoice-1710750000000`
    pub id: String,
    pub original_id: String,
    #[serde(rename = "type")]
    pub kind: DocumentType,
    pub type_label: &'static str,
    pub title: String,
    pub date: String,
    pub data: Value,
}

/// The archives the history is read from.
pub struct Archives<'a> {
    pub invoices: &'a [Invoice],
    pub serah_terima: &'a [FormRecord],
    pub cover_akta: &'a [FormRecord],
    pub cdd_perorangan: &'a [CddPerorangan],
    pub cdd_korporasi: &'a [CddKorporasi],
}

fn entry<T: Serialize>(
    kind: DocumentType,
    id: &str,
    title: String,
    date: &str,
    record: &T,
) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: format!("{}-{}", kind.slug(), id),
        original_id: id.to_string(),
        kind,
        type_label: kind.label(),
        title: or_untitled(title),
        date: date.to_string(),
        data: serde_json::to_value(record)?,
    })
}

fn or_untitled(title: String) -> String {
    if title.trim().is_empty() {
        "(tanpa judul)".to_string()
    } else {
        title.trim().to_string()
    }
}

fn text<'a>(fields: &'a FormRecord, path: &[&str]) -> &'a str {
    let mut value = fields.fields.get(path[0]);
    for key in &path[1..] {
        value = value.and_then(|v| v.get(key));
    }
    value.and_then(Value::as_str).unwrap_or_default()
}

/// Collect every archived document, newest first.
pub fn collect(archives: &Archives<'_>) -> Result<Vec<HistoryEntry>> {
    let mut entries = Vec::new();
    for invoice in archives.invoices {
        let client = if invoice.recipient.name.trim().is_empty() {
            &invoice.recipient.company
        } else {
            &invoice.recipient.name
        };
        entries.push(entry(
            DocumentType::Invoice,
            &invoice.id,
            client.clone(),
            &invoice.created_at,
            &invoice.view(),
        )?);
    }
    for form in archives.serah_terima {
        let title = format!("Serah terima dari {}", text(form, &["deliverer", "name"]).trim());
        entries.push(entry(DocumentType::SerahTerima, &form.id, title, &form.created_at, form)?);
    }
    for form in archives.cover_akta {
        let title = match text(form, &["nomorAkta"]).trim() {
            "" => text(form, &["judulAkta"]).to_string(),
            number => format!("{} No. {}", text(form, &["judulAkta"]), number),
        };
        entries.push(entry(DocumentType::CoverAkta, &form.id, title, &form.created_at, form)?);
    }
    for form in archives.cdd_perorangan {
        entries.push(entry(
            DocumentType::CddPerorangan,
            &form.id,
            form.nama_lengkap.clone(),
            &form.created_at,
            form,
        )?);
    }
    for form in archives.cdd_korporasi {
        entries.push(entry(
            DocumentType::CddKorporasi,
            &form.id,
            form.nama_korporasi.clone(),
            &form.created_at,
            form,
        )?);
    }
    // ISO timestamps sort chronologically as strings
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(entries)
}

/// Entries of `kind` (all when `None`) whose title or type label contains
/// `query`, case-insensitively.
pub fn filter(
    entries: Vec<HistoryEntry>,
    kind: Option<DocumentType>,
    query: &str,
) -> Vec<HistoryEntry> {
    let query = query.trim().to_lowercase();
    entries
        .into_iter()
        .filter(|e| kind.is_none_or(|k| e.kind == k))
        .filter(|e| {
            query.is_empty()
                || e.title.to_lowercase().contains(&query)
                || e.type_label.to_lowercase().contains(&query)
        })
        .collect()
}
