//! Month-at-a-glance figures for the landing page.

use chrono::Datelike;
use serde::Serialize;

use crate::format::parse_date;
use crate::jobs::{self, Job};
use crate::petty_cash::{self, Balance, Settings, Transaction};
use crate::report::{DeedRecord, Period};
use crate::tracking::TrackingJob;

/// A figure for the selected month next to the month before.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub current: i64,
    pub previous: i64,
    /// Relative change in percent, `None` when the previous month is zero
    pub change_percent: Option<f64>,
}

impl Comparison {
    pub fn new(current: i64, previous: i64) -> Self {
        let change_percent = if previous == 0 {
            None
        } else {
            let change = (current as f64 - previous as f64) / previous as f64 * 100.0;
            Some((change * 10.0).round() / 10.0)
        };
        Comparison {
            current,
            previous,
            change_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub month: u32,
    pub year: i32,
    pub notaris_deeds: Comparison,
    pub ppat_deeds: Comparison,
    pub ppat_transaction_value: Comparison,
    pub petty_cash_in: Comparison,
    pub petty_cash_out: Comparison,
    pub petty_cash_balance: Balance,
    pub jobs_created: Comparison,
    pub outstanding_receivable: i64,
    pub active_tracking_jobs: usize,
    pub employees: usize,
}

/// Everything the dashboard reads, loaded by the caller.
pub struct Sources<'a> {
    pub deeds: &'a [DeedRecord],
    pub jobs: &'a [Job],
    pub tracking: &'a [TrackingJob],
    pub transactions: &'a [Transaction],
    pub petty_cash_settings: &'a Settings,
    pub employees: usize,
}

pub fn previous_month(month: u32, year: i32) -> (u32, i32) {
    if month <= 1 { (12, year - 1) } else { (month - 1, year) }
}

fn jobs_created_in(jobs: &[Job], month: u32, year: i32) -> i64 {
    jobs.iter()
        .filter_map(|job| parse_date(&job.date).or_else(|| parse_date(&job.created_at)))
        .filter(|date| date.month() == month && date.year() == year)
        .count() as i64
}

pub fn build(sources: &Sources<'_>, month: u32, year: i32) -> Dashboard {
    let (prev_month, prev_year) = previous_month(month, year);
    let current = Period::new(sources.deeds, month, year);
    let previous = Period::new(sources.deeds, prev_month, prev_year);
    let (current_deeds, previous_deeds) = (current.summary(), previous.summary());

    let (in_now, out_now) = petty_cash::month_totals(sources.transactions, year, month);
    let (in_before, out_before) =
        petty_cash::month_totals(sources.transactions, prev_year, prev_month);

    Dashboard {
        month,
        year,
        notaris_deeds: Comparison::new(
            current_deeds.total_notaris as i64,
            previous_deeds.total_notaris as i64,
        ),
        ppat_deeds: Comparison::new(
            current_deeds.total_ppat as i64,
            previous_deeds.total_ppat as i64,
        ),
        ppat_transaction_value: Comparison::new(
            current_deeds.total_transaksi,
            previous_deeds.total_transaksi,
        ),
        petty_cash_in: Comparison::new(in_now, in_before),
        petty_cash_out: Comparison::new(out_now, out_before),
        petty_cash_balance: petty_cash::balance(sources.transactions, sources.petty_cash_settings),
        jobs_created: Comparison::new(
            jobs_created_in(sources.jobs, month, year),
            jobs_created_in(sources.jobs, prev_month, prev_year),
        ),
        outstanding_receivable: jobs::summarize(sources.jobs).receivable,
        active_tracking_jobs: sources.tracking.iter().filter(|j| j.is_active()).count(),
        employees: sources.employees,
    }
}
