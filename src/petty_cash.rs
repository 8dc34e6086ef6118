//! Petty-cash ledger: cash in (debit) and out (credit) entries plus the
//! settings that bound them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::format::{parse_date, sum_amounts};
use crate::store::{JsonDocument, JsonStore, Record, prefixed_id, today};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Money into the cash box
    Debit,
    /// Money out of the cash box
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Transfer,
    #[serde(rename = "QRIS")]
    Qris,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flags {
    pub urgent: bool,
    pub reimburse: bool,
    pub related_to_client: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: String,
    pub nominal: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub method: PaymentMethod,
    /// URL of the uploaded receipt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub person_in_charge: String,
}

impl Record for Transaction {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Balance when the ledger was started
    pub initial_balance: i64,
    pub max_limit_per_item: i64,
    pub low_balance_threshold: i64,
    pub categories: Vec<String>,
    pub admin_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            initial_balance: 0,
            max_limit_per_item: 1_000_000,
            low_balance_threshold: 500_000,
            categories: [
                "Refill Kas",
                "ATK",
                "Materai",
                "Transport",
                "Konsumsi",
                "Fotokopi",
                "Operasional",
                "Lain-lain",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            admin_name: "Admin Notaris".to_string(),
        }
    }
}

pub fn settings_document(data_dir: &std::path::Path) -> JsonDocument<Settings> {
    JsonDocument::new(data_dir, "petty-cash-settings.json", Settings::default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub total_in: i64,
    pub total_out: i64,
    pub current_balance: i64,
    pub is_low: bool,
}

/// `initial + Σ debit − Σ credit`, flagged low at or below the threshold.
pub fn balance(transactions: &[Transaction], settings: &Settings) -> Balance {
    let total_in = sum_amounts(
        transactions
            .iter()
            .filter(|t| t.kind == EntryType::Debit)
            .map(|t| t.nominal),
    );
    let total_out = sum_amounts(
        transactions
            .iter()
            .filter(|t| t.kind == EntryType::Credit)
            .map(|t| t.nominal),
    );
    let current_balance = settings
        .initial_balance
        .saturating_add(total_in)
        .saturating_sub(total_out);
    Balance {
        total_in,
        total_out,
        current_balance,
        is_low: current_balance <= settings.low_balance_threshold,
    }
}

/// Validate and record a new entry at the top of the ledger.
pub fn add_transaction(
    store: &JsonStore<Transaction>,
    settings: &Settings,
    mut entry: Transaction,
) -> Result<Transaction> {
    if entry.nominal <= 0 {
        return Err(AppError::invalid("nominal must be greater than zero"));
    }
    if entry.kind == EntryType::Credit && entry.nominal > settings.max_limit_per_item {
        return Err(AppError::LimitExceeded {
            amount: entry.nominal,
            limit: settings.max_limit_per_item,
        });
    }
    if entry.date.is_empty() {
        entry.date = today();
    }
    if entry.category.trim().is_empty() {
        entry.category = "Lain-lain".to_string();
    }
    if entry.proof.as_deref().is_some_and(|p| p.is_empty()) {
        entry.proof = None;
    }
    entry.id = prefixed_id("trx-");
    entry.person_in_charge = settings.admin_name.clone();
    store.save(entry)
}

/// Entries whose description or category contains `query`, newest first.
pub fn search<'a>(transactions: &'a [Transaction], query: &str) -> Vec<&'a Transaction> {
    let query = query.trim().to_lowercase();
    let mut found: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| {
            query.is_empty()
                || t.description.to_lowercase().contains(&query)
                || t.category.to_lowercase().contains(&query)
        })
        .collect();
    found.sort_by(|a, b| parse_date(&b.date).cmp(&parse_date(&a.date)));
    found
}

/// Spending (credit) per category.
pub fn spending_by_category(transactions: &[Transaction]) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.kind == EntryType::Credit) {
        let total = totals.entry(t.category.clone()).or_insert(0i64);
        *total = total.saturating_add(t.nominal);
    }
    totals
}

/// Money in and out for entries dated in `year`/`month`.
pub fn month_totals(transactions: &[Transaction], year: i32, month: u32) -> (i64, i64) {
    use chrono::Datelike;
    transactions
        .iter()
        .filter(|t| {
            parse_date(&t.date).is_some_and(|d| d.year() == year && d.month() == month)
        })
        .fold((0, 0), |(inflow, outflow), t| match t.kind {
            EntryType::Debit => (i64::saturating_add(inflow, t.nominal), outflow),
            EntryType::Credit => (inflow, i64::saturating_add(outflow, t.nominal)),
        })
}

/// The ledger as an XLSX workbook, oldest entry first with a running balance.
pub fn export_xlsx(transactions: &[Transaction], settings: &Settings) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    let bold = Format::new().set_bold();

    let headers = [
        "Tanggal",
        "Kategori",
        "Keterangan",
        "Metode",
        "Masuk",
        "Keluar",
        "Saldo",
    ];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by(|a, b| parse_date(&a.date).cmp(&parse_date(&b.date)));

    let mut running = settings.initial_balance;
    worksheet.write_string(1, 2, "Saldo awal")?;
    worksheet.write_number(1, 6, running as f64)?;

    for (i, t) in ordered.iter().enumerate() {
        let row = (i + 2) as u32;
        worksheet.write_string(row, 0, &t.date)?;
        worksheet.write_string(row, 1, &t.category)?;
        worksheet.write_string(row, 2, &t.description)?;
        let method = match t.method {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Transfer => "Transfer",
            PaymentMethod::Qris => "QRIS",
        };
        worksheet.write_string(row, 3, method)?;
        match t.kind {
            EntryType::Debit => {
                running = running.saturating_add(t.nominal);
                worksheet.write_number(row, 4, t.nominal as f64)?;
            }
            EntryType::Credit => {
                running = running.saturating_sub(t.nominal);
                worksheet.write_number(row, 5, t.nominal as f64)?;
            }
        }
        worksheet.write_number(row, 6, running as f64)?;
    }

    workbook.push_worksheet(worksheet);
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: EntryType, nominal: i64, date: &str, category: &str) -> Transaction {
        Transaction {
            id: String::new(),
            kind,
            date: date.to_string(),
            category: category.to_string(),
            nominal,
            description: format!("{} {}", category, nominal),
            method: PaymentMethod::Cash,
            proof: None,
            flags: Flags::default(),
            person_in_charge: String::new(),
        }
    }

    #[test]
    fn huge_entries_saturate_instead_of_wrapping() {
        let settings = Settings::default();
        let ledger = vec![
            entry(EntryType::Debit, i64::MAX, "2024-03-01", "Refill Kas"),
            entry(EntryType::Debit, i64::MAX, "2024-03-02", "Refill Kas"),
            entry(EntryType::Credit, 10, "2024-03-03", "ATK"),
        ];
        let b = balance(&ledger, &settings);
        assert_eq!(b.total_in, i64::MAX);
        assert_eq!(b.current_balance, i64::MAX - 10);
        assert!(!b.is_low);
        assert_eq!(month_totals(&ledger, 2024, 3), (i64::MAX, 10));
    }

    #[test]
    fn balance_includes_initial_amount() {
        let settings = Settings {
            initial_balance: 1_000_000,
            ..Settings::default()
        };
        let ledger = vec![
            entry(EntryType::Debit, 500_000, "2024-03-01", "Refill Kas"),
            entry(EntryType::Credit, 200_000, "2024-03-02", "ATK"),
            entry(EntryType::Credit, 850_000, "2024-03-03", "Transport"),
        ];
        let b = balance(&ledger, &settings);
        assert_eq!(b.total_in, 500_000);
        assert_eq!(b.total_out, 1_050_000);
        assert_eq!(b.current_balance, 450_000);
        assert!(b.is_low);
    }

    #[test]
    fn low_flag_is_inclusive() {
        let settings = Settings::default();
        let ledger = vec![entry(EntryType::Debit, 500_000, "2024-03-01", "Refill Kas")];
        assert!(balance(&ledger, &settings).is_low);
        let ledger = vec![entry(EntryType::Debit, 500_001, "2024-03-01", "Refill Kas")];
        assert!(!balance(&ledger, &settings).is_low);
    }

    #[test]
    fn add_rejects_bad_amounts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "petty-cash-transactions.json").inserting_at_front();
        let settings = Settings::default();

        let zero = entry(EntryType::Debit, 0, "2024-03-01", "Refill Kas");
        assert!(matches!(add_transaction(&store, &settings, zero), Err(AppError::Invalid(_))));

        let big = entry(EntryType::Credit, 1_000_001, "2024-03-01", "ATK");
        assert!(matches!(
            add_transaction(&store, &settings, big),
            Err(AppError::LimitExceeded { .. })
        ));

        // the limit only applies to spending
        let refill = entry(EntryType::Debit, 5_000_000, "2024-03-01", "Refill Kas");
        let saved = add_transaction(&store, &settings, refill).unwrap();
        assert!(saved.id.starts_with("trx-"));
        assert_eq!(saved.person_in_charge, "Admin Notaris");

        let spend = entry(EntryType::Credit, 1_000_000, "2024-03-02", "ATK");
        add_transaction(&store, &settings, spend).unwrap();
        let ledger = store.list();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].kind, EntryType::Credit);
    }

    #[test]
    fn search_sorts_newest_first() {
        let ledger = vec![
            entry(EntryType::Credit, 10_000, "2024-03-01", "ATK"),
            entry(EntryType::Credit, 20_000, "2024-03-09", "Materai"),
            entry(EntryType::Credit, 30_000, "2024-03-05", "ATK"),
        ];
        let found = search(&ledger, "atk");
        let dates: Vec<&str> = found.iter().map(|t| t.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-05", "2024-03-01"]);
        assert_eq!(search(&ledger, "").len(), 3);
    }

    #[test]
    fn category_and_month_totals() {
        let ledger = vec![
            entry(EntryType::Credit, 10_000, "2024-03-01", "ATK"),
            entry(EntryType::Credit, 30_000, "2024-02-05", "ATK"),
            entry(EntryType::Credit, 6_000, "2024-03-09", "Materai"),
            entry(EntryType::Debit, 100_000, "2024-03-01", "Refill Kas"),
        ];
        let totals = spending_by_category(&ledger);
        assert_eq!(totals["ATK"], 40_000);
        assert_eq!(totals["Materai"], 6_000);
        assert!(!totals.contains_key("Refill Kas"));
        assert_eq!(month_totals(&ledger, 2024, 3), (100_000, 16_000));
    }

    #[test]
    fn export_produces_a_workbook() {
        let ledger = vec![entry(EntryType::Credit, 10_000, "2024-03-01", "ATK")];
        let bytes = export_xlsx(&ledger, &Settings::default()).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }
}
