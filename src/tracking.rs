//! Tracked jobs and their progress history.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::format::parse_date;
use crate::store::{JsonStore, Record, now_iso, prefixed_id, today};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    Medium,
    #[default]
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HistoryStatus {
    Done,
    #[default]
    #[serde(rename = "On Progress")]
    OnProgress,
    Pending,
    Issue,
}

/// One progress update on a job's timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryItem {
    pub id: String,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub date: String,
    pub title: String,
    pub description: String,
    pub status: HistoryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingJob {
    pub id: String,
    pub client_name: String,
    pub service_name: String,
    /// Free text, `Baru` for new jobs
    pub status: String,
    pub priority: Priority,
    pub start_date: String,
    pub target_date: String,
    pub pic: String,
    pub history: Vec<HistoryItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_progress: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for TrackingJob {
    fn default() -> Self {
        TrackingJob {
            id: String::new(),
            client_name: String::new(),
            service_name: String::new(),
            status: "Baru".to_string(),
            priority: Priority::Normal,
            start_date: String::new(),
            target_date: String::new(),
            pic: String::new(),
            history: Vec::new(),
            last_progress: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

impl Record for TrackingJob {
    fn id(&self) -> &str {
        &self.id
    }
}

impl TrackingJob {
    /// Whether the job still needs attention.
    pub fn is_active(&self) -> bool {
        !matches!(self.status.as_str(), "Selesai" | "Done" | "Batal")
    }

    fn refresh_last_progress(&mut self) {
        self.last_progress = self
            .history
            .iter()
            .max_by(|a, b| history_key(&a.date).cmp(&history_key(&b.date)))
            .map(|item| item.title.clone());
    }
}

// RFC 3339 strings in UTC sort chronologically as text; bare dates sort
// before any timestamp of the same day.
fn history_key(date: &str) -> (Option<chrono::NaiveDate>, &str) {
    (parse_date(date), date)
}

/// Jobs whose client or service name contains `query`, case-insensitively.
pub fn search<'a>(jobs: &'a [TrackingJob], query: &str) -> Vec<&'a TrackingJob> {
    let query = query.trim().to_lowercase();
    jobs.iter()
        .filter(|job| {
            query.is_empty()
                || job.client_name.to_lowercase().contains(&query)
                || job.service_name.to_lowercase().contains(&query)
        })
        .collect()
}

/// Create a job (no id) or merge an edit into an existing one.
///
/// The history of an existing job is only changed through
/// [`save_history_item`] and [`delete_history_item`]; edits keep it.
pub fn save_job(store: &JsonStore<TrackingJob>, mut job: TrackingJob) -> Result<TrackingJob> {
    let now = now_iso();
    if job.id.trim().is_empty() {
        job.id = prefixed_id("TRACK-");
        if job.start_date.is_empty() {
            job.start_date = today();
        }
        if job.status.is_empty() {
            job.status = "Baru".to_string();
        }
        job.refresh_last_progress();
        job.created_at = now.clone();
        job.updated_at = now;
        return store.save(job);
    }

    store.update(|jobs| {
        let existing = jobs
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| AppError::not_found("tracking job", job.id.clone()))?;
        job.history = std::mem::take(&mut existing.history);
        job.last_progress = existing.last_progress.take();
        job.created_at = std::mem::take(&mut existing.created_at);
        job.updated_at = now;
        *existing = job.clone();
        Ok(job)
    })
}

/// Add a history item (empty id) or replace the one with the same id.
pub fn save_history_item(
    store: &JsonStore<TrackingJob>,
    job_id: &str,
    mut item: HistoryItem,
) -> Result<TrackingJob> {
    store.update(|jobs| {
        let job = jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| AppError::not_found("tracking job", job_id))?;

        if item.date.is_empty() {
            item.date = now_iso();
        }
        if item.id.trim().is_empty() {
            item.id = prefixed_id("p-");
            job.history.push(item);
        } else {
            let slot = job
                .history
                .iter_mut()
                .find(|h| h.id == item.id)
                .ok_or_else(|| AppError::not_found("history item", item.id.clone()))?;
            *slot = item;
        }

        job.refresh_last_progress();
        job.updated_at = now_iso();
        Ok(job.clone())
    })
}

pub fn delete_history_item(
    store: &JsonStore<TrackingJob>,
    job_id: &str,
    item_id: &str,
) -> Result<TrackingJob> {
    store.update(|jobs| {
        let job = jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or_else(|| AppError::not_found("tracking job", job_id))?;
        job.history.retain(|h| h.id != item_id);
        job.refresh_last_progress();
        job.updated_at = now_iso();
        Ok(job.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(date: &str, title: &str) -> HistoryItem {
        HistoryItem {
            date: date.to_string(),
            title: title.to_string(),
            ..HistoryItem::default()
        }
    }

    #[test]
    fn history_updates_track_latest_title() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "data-tracking.json");
        let job = save_job(
            &store,
            TrackingJob {
                client_name: "Ibu Rina".to_string(),
                service_name: "Pecah Sertifikat".to_string(),
                ..TrackingJob::default()
            },
        )
        .unwrap();
        assert!(job.id.starts_with("TRACK-"));
        assert_eq!(job.status, "Baru");
        assert!(job.last_progress.is_none());

        save_history_item(&store, &job.id, history("2024-03-04T09:00:00.000Z", "Berkas masuk")).unwrap();
        let job = save_history_item(&store, &job.id, history("2024-03-11T09:00:00.000Z", "Ukur ulang"))
            .unwrap();
        save_history_item(&store, &job.id, history("2024-03-01T09:00:00.000Z", "Konsultasi")).unwrap();
        let latest = store.find(&job.id).unwrap().unwrap();
        assert_eq!(latest.history.len(), 3);
        assert_eq!(latest.last_progress.as_deref(), Some("Ukur ulang"));

        let ukur = latest.history.iter().find(|h| h.title == "Ukur ulang").unwrap().id.clone();
        let after = delete_history_item(&store, &job.id, &ukur).unwrap();
        assert_eq!(after.last_progress.as_deref(), Some("Berkas masuk"));
    }

    #[test]
    fn editing_a_job_keeps_its_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "data-tracking.json");
        let job = save_job(&store, TrackingJob::default()).unwrap();
        save_history_item(&store, &job.id, history("2024-03-04", "Berkas masuk")).unwrap();

        let edit = TrackingJob {
            id: job.id.clone(),
            status: "Proses".to_string(),
            priority: Priority::High,
            ..TrackingJob::default()
        };
        let saved = save_job(&store, edit).unwrap();
        assert_eq!(saved.history.len(), 1);
        assert_eq!(saved.priority, Priority::High);
        assert_eq!(saved.created_at, job.created_at);
    }

    #[test]
    fn missing_job_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "data-tracking.json");
        let result = save_history_item(&store, "TRACK-0", history("2024-01-01", "x"));
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[test]
    fn search_matches_client_or_service() {
        let jobs = vec![
            TrackingJob {
                client_name: "Ibu Rina".to_string(),
                service_name: "Pecah Sertifikat".to_string(),
                ..TrackingJob::default()
            },
            TrackingJob {
                client_name: "PT Garut Jaya".to_string(),
                service_name: "Akta Pendirian".to_string(),
                ..TrackingJob::default()
            },
        ];
        assert_eq!(search(&jobs, "sertifikat").len(), 1);
        assert_eq!(search(&jobs, "garut").len(), 1);
        assert_eq!(search(&jobs, "").len(), 2);
    }
}
