//! Payment receipts (kwitansi): a third of an A4 page with the amount in
//! figures and in words. Receipts are printed, not archived.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::format::{format_date_long, group_thousands, parse_date, terbilang};
use crate::report::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    Cash,
    #[default]
    Transfer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Receipt {
    pub received_from: String,
    pub amount: i64,
    pub purpose: String,
    pub payment_method: PaymentMethod,
    /// `YYYY-MM-DD`; the print date when empty
    pub date: String,
    /// The office city when empty
    pub city: String,
    /// Who signs for the office; the official when empty
    pub recipient_name: String,
    pub payer_name: String,
}

/// The amount as written on the receipt: `Satu juta lima ratus ribu Rupiah`.
pub fn amount_in_words(amount: i64) -> String {
    format!("{} Rupiah", terbilang(amount.unsigned_abs()))
}

/// Render a receipt as a printable HTML page.
pub fn render(
    renderer: &Renderer,
    receipt: &Receipt,
    config: &Config,
    printed_on: NaiveDate,
) -> Result<String> {
    if receipt.amount <= 0 {
        return Err(AppError::invalid("receipt amount must be positive"));
    }
    if receipt.received_from.trim().is_empty() {
        return Err(AppError::invalid("payer is required"));
    }
    let date = if receipt.date.trim().is_empty() {
        printed_on
    } else {
        parse_date(&receipt.date)
            .ok_or_else(|| AppError::invalid(format!("invalid date {:?}", receipt.date)))?
    };
    let or = |value: &str, fallback: &str| {
        if value.trim().is_empty() {
            fallback.to_string()
        } else {
            value.trim().to_string()
        }
    };

    let context = json!({
        "signatory": config.official_name,
        "receivedFrom": receipt.received_from.trim(),
        "amount": group_thousands(receipt.amount.unsigned_abs()),
        "amountWords": amount_in_words(receipt.amount),
        "purpose": receipt.purpose,
        "cash": receipt.payment_method == PaymentMethod::Cash,
        "transfer": receipt.payment_method == PaymentMethod::Transfer,
        "city": or(&receipt.city, &config.office_city),
        "date": format_date_long(date),
        "recipientName": or(&receipt.recipient_name, &config.official_name),
        "payerName": or(&receipt.payer_name, &receipt.received_from),
    });
    renderer.render_page("kwitansi", &context)
}
