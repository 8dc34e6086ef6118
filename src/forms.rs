//! Append-only archives of printed forms: invoices, deed cover sheets,
//! document hand-over receipts and signing attendance sheets.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::format::{sum_amounts, terbilang};
use crate::store::{JsonStore, Record, now_iso, timestamp_id};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipient {
    pub name: String,
    pub position: String,
    pub company: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceItem {
    pub deskripsi: String,
    pub biaya: i64,
    pub keterangan: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentScheme {
    pub description: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankInfo {
    pub name: String,
    pub account_no: String,
    pub account_name: String,
}

impl Default for BankInfo {
    fn default() -> Self {
        BankInfo {
            name: "Bank BCA".to_string(),
            account_no: String::new(),
            account_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
    pub id: String,
    pub created_at: String,
    pub recipient: Recipient,
    pub items: Vec<InvoiceItem>,
    pub payment_schemes: Vec<PaymentScheme>,
    pub bank: BankInfo,
    pub invoice_date: String,
    pub show_stamp: bool,
}

impl Record for Invoice {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Invoice {
    pub fn total(&self) -> i64 {
        sum_amounts(self.items.iter().map(|item| item.biaya))
    }

    /// The total in words as printed under the invoice table.
    pub fn total_in_words(&self) -> String {
        format!("{} Rupiah", terbilang(self.total().max(0) as u64))
    }

    pub fn view(&self) -> InvoiceView<'_> {
        InvoiceView {
            invoice: self,
            total: self.total(),
            terbilang: self.total_in_words(),
        }
    }
}

/// An invoice as sent to the print page, with its computed total.
#[derive(Debug, Serialize)]
pub struct InvoiceView<'a> {
    #[serde(flatten)]
    pub invoice: &'a Invoice,
    pub total: i64,
    pub terbilang: String,
}

/// Archive a new invoice. Invoices are never edited in place.
pub fn create_invoice(store: &JsonStore<Invoice>, mut invoice: Invoice) -> Result<Invoice> {
    if invoice.items.iter().any(|item| item.biaya < 0) {
        return Err(AppError::invalid("invoice item cost cannot be negative"));
    }
    invoice.id = timestamp_id();
    invoice.created_at = now_iso();
    store.save(invoice)
}

/// The free-form archives kept alongside invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    CoverAkta,
    SerahTerima,
    DaftarHadir,
}

impl FormKind {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "cover-akta" => Some(FormKind::CoverAkta),
            "serah-terima" => Some(FormKind::SerahTerima),
            "daftar-hadir" => Some(FormKind::DaftarHadir),
            _ => None,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            FormKind::CoverAkta => "cover-akta.json",
            FormKind::SerahTerima => "serah-terima.json",
            FormKind::DaftarHadir => "daftar-hadir.json",
        }
    }
}

/// A submitted form whose fields are stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord {
    pub id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record for FormRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Archive a submitted form object with a fresh id and creation time.
pub fn archive_form(store: &JsonStore<FormRecord>, payload: Value) -> Result<FormRecord> {
    let mut fields = match payload {
        Value::Object(map) => map,
        _ => return Err(AppError::invalid("form payload must be a JSON object")),
    };
    fields.remove("id");
    fields.remove("createdAt");
    store.save(FormRecord {
        id: timestamp_id(),
        created_at: now_iso(),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invoice_total_and_words() {
        let invoice: Invoice = serde_json::from_value(json!({
            "items": [
                { "deskripsi": "Akta Pendirian PT", "biaya": 2500000 },
                { "deskripsi": "Pengesahan", "biaya": 250000 }
            ]
        }))
        .unwrap();
        assert_eq!(invoice.total(), 2_750_000);
        assert_eq!(
            invoice.total_in_words(),
            "Dua juta tujuh ratus lima puluh ribu Rupiah"
        );

        let view = serde_json::to_value(invoice.view()).unwrap();
        assert_eq!(view["total"], 2_750_000);
        assert_eq!(view["items"].as_array().unwrap().len(), 2);
        assert!(view["terbilang"].as_str().unwrap().ends_with("Rupiah"));
    }

    #[test]
    fn archived_forms_keep_their_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), FormKind::CoverAkta.file_name());
        let first = archive_form(&store, json!({ "nomorAkta": "12", "id": "spoofed" })).unwrap();
        let second = archive_form(&store, json!({ "nomorAkta": "13" })).unwrap();

        assert_ne!(first.id, "spoofed");
        assert_ne!(first.id, second.id);
        let all = store.list();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].fields["nomorAkta"], "12");
        assert!(archive_form(&store, json!([1, 2])).is_err());
    }
}
