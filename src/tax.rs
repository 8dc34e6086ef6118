//! Land transaction tax estimate (BPHTB, PPh and PNBP).

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::format::format_rupiah;
use crate::store::{JsonStore, Record, now_iso, timestamp_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Acquisition {
    #[default]
    #[serde(rename = "Jual Beli")]
    JualBeli,
    Hibah,
    Waris,
}

impl Acquisition {
    /// Non-taxable acquisition value deducted before BPHTB.
    pub fn npoptkp(self) -> i64 {
        match self {
            Acquisition::JualBeli | Acquisition::Hibah => 80_000_000,
            Acquisition::Waris => 300_000_000,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Acquisition::JualBeli => "Jual Beli",
            Acquisition::Hibah => "Hibah",
            Acquisition::Waris => "Waris",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxInput {
    pub harga_transaksi: i64,
    pub njop: i64,
    #[serde(default)]
    pub jenis_perolehan: Acquisition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxEstimate {
    pub npop: i64,
    pub npoptkp: i64,
    /// Buyer's acquisition duty
    pub bphtb: i64,
    /// Seller's income tax, sales only
    pub pph: i64,
    /// Land office title-transfer fee
    pub pnbp: i64,
    pub total_biaya: i64,
}

/// Estimate the costs of a transfer. Fractions of a rupiah are dropped.
pub fn calculate(input: &TaxInput) -> Result<TaxEstimate> {
    if input.harga_transaksi < 0 || input.njop < 0 {
        return Err(AppError::invalid("price and NJOP cannot be negative"));
    }
    let too_large = || AppError::invalid("amount too large");
    let npop = input.harga_transaksi.max(input.njop);
    let npoptkp = input.jenis_perolehan.npoptkp();
    let bphtb = (npop - npoptkp)
        .max(0)
        .checked_mul(5)
        .ok_or_else(too_large)?
        / 100;
    let pph = match input.jenis_perolehan {
        Acquisition::JualBeli => npop.checked_mul(25).ok_or_else(too_large)? / 1000,
        Acquisition::Hibah | Acquisition::Waris => 0,
    };
    let pnbp = npop / 1000 + 50_000;
    let total_biaya = bphtb
        .checked_add(pph)
        .and_then(|sum| sum.checked_add(pnbp))
        .ok_or_else(too_large)?;
    Ok(TaxEstimate {
        npop,
        npoptkp,
        bphtb,
        pph,
        pnbp,
        total_biaya,
    })
}

/// Plain-text breakdown for pasting into a chat message.
pub fn summary_text(input: &TaxInput, estimate: &TaxEstimate) -> String {
    format!(
        "*Estimasi Biaya Transaksi ({})*\n\
         --------------------------------\n\
         Harga Transaksi: {}\n\
         NJOP: {}\n\
         NPOP (Dasar Pengenaan): {}\n\
         \n\
         1. BPHTB (Pembeli): {}\n\
         2. PPh (Penjual): {}\n\
         3. PNBP (Balik Nama): {}\n\
         --------------------------------\n\
         *Total Estimasi: {}*",
        input.jenis_perolehan.label(),
        format_rupiah(input.harga_transaksi),
        format_rupiah(input.njop),
        format_rupiah(estimate.npop),
        format_rupiah(estimate.bphtb),
        format_rupiah(estimate.pph),
        format_rupiah(estimate.pnbp),
        format_rupiah(estimate.total_biaya),
    )
}

/// An estimate kept for later reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCalculation {
    pub id: String,
    pub date: String,
    pub harga_transaksi: i64,
    pub njop: i64,
    pub jenis_perolehan: Acquisition,
    pub total_biaya: i64,
    #[serde(default)]
    pub label: String,
}

impl Record for SavedCalculation {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Recalculate and store an estimate, newest first.
pub fn save_calculation(
    store: &JsonStore<SavedCalculation>,
    input: &TaxInput,
    label: &str,
) -> Result<SavedCalculation> {
    let estimate = calculate(input)?;
    store.save(SavedCalculation {
        id: timestamp_id(),
        date: now_iso(),
        harga_transaksi: input.harga_transaksi,
        njop: input.njop,
        jenis_perolehan: input.jenis_perolehan,
        total_biaya: estimate.total_biaya,
        label: label.trim().to_string(),
    })
}
