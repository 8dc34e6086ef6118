//! Job billing list: what each client job costs, what has been paid and
//! what the office has spent on processing it.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::format::sum_amounts;
use crate::store::{JsonStore, Record, now_iso, today, uuid_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JobCategory {
    #[default]
    Kenotariatan,
    #[serde(rename = "PPAT")]
    Ppat,
    Lainnya,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JobStatus {
    #[default]
    Baru,
    Proses,
    Selesai,
    Batal,
    Tertunda,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub name: String,
    pub amount: i64,
}

/// An instalment received from the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentTermin {
    pub termin_number: u32,
    pub date: String,
    pub amount: i64,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub id: String,
    pub category: JobCategory,
    pub client_name: String,
    pub job_name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub status: JobStatus,
    pub total_cost: i64,
    pub paid_amount: i64,
    pub notes: String,
    pub created_at: String,
    pub cost_items: Vec<LineItem>,
    pub process_items: Vec<LineItem>,
    pub payment_termins: Vec<PaymentTermin>,
    pub total_budget_biaya_proses: i64,
}

impl Record for Job {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Job {
    pub fn receivable(&self) -> i64 {
        self.total_cost.saturating_sub(self.paid_amount)
    }

    /// Process budget left after the recorded process expenses.
    pub fn process_budget_remaining(&self) -> i64 {
        let spent = sum_amounts(self.process_items.iter().map(|i| i.amount));
        self.total_budget_biaya_proses.saturating_sub(spent)
    }

    pub fn view(&self) -> JobView<'_> {
        JobView {
            job: self,
            receivable: self.receivable(),
            process_budget_remaining: self.process_budget_remaining(),
        }
    }
}

/// A job with the figures the billing table shows next to it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView<'a> {
    #[serde(flatten)]
    pub job: &'a Job,
    pub receivable: i64,
    pub process_budget_remaining: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub total: i64,
    pub paid: i64,
    pub receivable: i64,
}

pub fn summarize<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> JobSummary {
    let mut summary = JobSummary::default();
    for job in jobs {
        summary.total = summary.total.saturating_add(job.total_cost);
        summary.paid = summary.paid.saturating_add(job.paid_amount);
    }
    summary.receivable = summary.total.saturating_sub(summary.paid);
    summary
}

/// Jobs in `category` (all when `None`) whose client or job name contains
/// `query`, case-insensitively.
pub fn filter<'a>(jobs: &'a [Job], category: Option<JobCategory>, query: &str) -> Vec<&'a Job> {
    let query = query.trim().to_lowercase();
    jobs.iter()
        .filter(|job| category.is_none_or(|c| job.category == c))
        .filter(|job| {
            query.is_empty()
                || job.client_name.to_lowercase().contains(&query)
                || job.job_name.to_lowercase().contains(&query)
        })
        .collect()
}

/// Save a job. The paid amount follows the payment instalments when any are
/// recorded; new jobs get an id and go to the front of the list.
pub fn save_job(store: &JsonStore<Job>, mut job: Job) -> Result<Job> {
    if job.total_cost < 0 {
        return Err(AppError::invalid("total cost cannot be negative"));
    }
    if !job.payment_termins.is_empty() {
        job.paid_amount = sum_amounts(job.payment_termins.iter().map(|t| t.amount));
    }
    if job.id.trim().is_empty() {
        job.id = uuid_id();
    }
    if job.created_at.is_empty() {
        job.created_at = now_iso();
    }
    if job.date.is_empty() {
        job.date = today();
    }
    store.save(job)
}

pub fn update_notes(store: &JsonStore<Job>, id: &str, notes: &str) -> Result<Job> {
    store.update(|jobs| {
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| AppError::not_found("job", id))?;
        job.notes = notes.to_string();
        Ok(job.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(client: &str, category: JobCategory, total: i64, paid: i64) -> Job {
        Job {
            client_name: client.to_string(),
            job_name: "Balik Nama".to_string(),
            category,
            total_cost: total,
            paid_amount: paid,
            ..Job::default()
        }
    }

    #[test]
    fn termins_drive_paid_amount() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "daftar-pekerjaan.json").inserting_at_front();

        let mut draft = job("Budi", JobCategory::Ppat, 5_000_000, 999);
        draft.payment_termins = vec![
            PaymentTermin {
                termin_number: 1,
                amount: 1_000_000,
                ..PaymentTermin::default()
            },
            PaymentTermin {
                termin_number: 2,
                amount: 1_500_000,
                ..PaymentTermin::default()
            },
        ];
        let saved = save_job(&store, draft).unwrap();
        assert_eq!(saved.paid_amount, 2_500_000);
        assert_eq!(saved.receivable(), 2_500_000);
        assert!(!saved.id.is_empty());
    }

    #[test]
    fn summary_and_filter() {
        let jobs = vec![
            job("Budi", JobCategory::Ppat, 5_000_000, 2_000_000),
            job("Sari", JobCategory::Kenotariatan, 3_000_000, 3_000_000),
            job("budiman", JobCategory::Kenotariatan, 1_000_000, 0),
        ];
        let summary = summarize(&jobs);
        assert_eq!(
            summary,
            JobSummary {
                total: 9_000_000,
                paid: 5_000_000,
                receivable: 4_000_000
            }
        );

        assert_eq!(filter(&jobs, None, "BUDI").len(), 2);
        assert_eq!(filter(&jobs, Some(JobCategory::Kenotariatan), "budi").len(), 1);
        assert_eq!(filter(&jobs, Some(JobCategory::Lainnya), "").len(), 0);
    }

    #[test]
    fn summary_saturates_on_huge_costs() {
        let jobs = vec![
            job("A", JobCategory::Ppat, i64::MAX, 0),
            job("B", JobCategory::Ppat, i64::MAX, 0),
        ];
        let summary = summarize(&jobs);
        assert_eq!(summary.total, i64::MAX);
        assert_eq!(summary.receivable, i64::MAX);
    }

    #[test]
    fn process_budget() {
        let mut j = job("Budi", JobCategory::Ppat, 0, 0);
        j.total_budget_biaya_proses = 1_000_000;
        j.process_items = vec![
            LineItem {
                name: "Cek sertifikat".to_string(),
                amount: 150_000,
            },
            LineItem {
                name: "Validasi pajak".to_string(),
                amount: 100_000,
            },
        ];
        assert_eq!(j.process_budget_remaining(), 750_000);
        let view = serde_json::to_value(j.view()).unwrap();
        assert_eq!(view["processBudgetRemaining"], 750_000);
        assert_eq!(view["totalBudgetBiayaProses"], 1_000_000);
    }
}
