use axum::{
    Json, Router,
    extract::{ConnectInfo, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::attendance::{self, AttendanceStatus, Employee};
use crate::accounts::{self, ClientAccount};
use crate::cdd::{self, CddKorporasi, CddPerorangan};
use crate::chat::{self, Attachment};
use crate::config::Config;
use crate::drafts::{self, DraftCategory};
use crate::error::{AppError, Result};
use crate::forms::{self, FormKind, Invoice};
use crate::history::{self, DocumentType};
use crate::jobs::{self, Job, JobCategory};
use crate::kwitansi::{self, Receipt};
use crate::legalitas::{self, Column, LegalEntity, LegalItem};
use crate::office::Office;
use crate::petty_cash::{self, Settings, Transaction};
use crate::report::{self, Period, PrintKind};
use crate::tax::{self, TaxInput};
use crate::timeline::{self, GridSettings};
use crate::tracking::{self, HistoryItem, TrackingJob};
use crate::wa_forms::{self, WaForm};
use crate::webform::{self, WebForm};

pub type AppState = Arc<Office>;

const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Serialize)]
struct ActionResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

fn success<T: Serialize>(data: T) -> Response {
    Json(ActionResponse {
        success: true,
        message: None,
        data: Some(data),
    })
    .into_response()
}

/// Log the failure and report it as an unsuccessful action.
fn failure(action: &str, error: AppError) -> Response {
    match &error {
        AppError::Invalid(_)
        | AppError::NotFound { .. }
        | AppError::LimitExceeded { .. }
        | AppError::Upload(_) => log::warn!("{} rejected: {}", action, error),
        _ => log::error!("{} failed: {}", action, error),
    }
    Json(ActionResponse::<()> {
        success: false,
        message: Some(error.to_string()),
        data: None,
    })
    .into_response()
}

fn respond<T: Serialize>(action: &str, result: Result<T>) -> Response {
    match result {
        Ok(data) => success(data),
        Err(e) => failure(action, e),
    }
}

/// Run store work on the blocking thread pool. Every store call reads or
/// rewrites a whole file.
async fn blocking<T, F>(office: &AppState, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Office) -> Result<T> + Send + 'static,
{
    let office = Arc::clone(office);
    tokio::task::spawn_blocking(move || work(&office))
        .await
        .map_err(|e| AppError::Io(std::io::Error::other(e)))?
}

fn not_found(what: &str) -> Response {
    log::warn!("unknown {}", what);
    (
        StatusCode::NOT_FOUND,
        Json(ActionResponse::<()> {
            success: false,
            message: Some(format!("unknown {}", what)),
            data: None,
        }),
    )
        .into_response()
}

fn download(file_name: &str, content_type: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[derive(Deserialize)]
struct PeriodQuery {
    month: Option<u32>,
    year: Option<i32>,
}

impl PeriodQuery {
    /// The requested month, defaulting to the current one.
    fn resolve(&self) -> Result<(u32, i32)> {
        let today = chrono::Local::now().date_naive();
        let month = self.month.unwrap_or(today.month());
        if !(1..=12).contains(&month) {
            return Err(AppError::invalid(format!("invalid month {}", month)));
        }
        Ok((month, self.year.unwrap_or(today.year())))
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct JobsQuery {
    category: Option<JobCategory>,
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct DraftsQuery {
    /// `Notaris`, `PPAT` or `ALL`
    #[serde(default)]
    category: String,
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct HistoryQuery {
    /// A document type or `all`
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct PrintQuery {
    month: Option<u32>,
    year: Option<i32>,
    to: Option<String>,
}

#[derive(Deserialize)]
struct NotesUpdate {
    notes: String,
}

#[derive(Deserialize)]
struct NoteItem {
    column: Column,
    content: String,
}

#[derive(Deserialize)]
struct AttendanceUpdate {
    date: String,
    status: AttendanceStatus,
}

#[derive(Deserialize)]
struct EntryTimeUpdate {
    date: String,
    #[serde(default)]
    time: String,
}

#[derive(Deserialize)]
struct StickyNoteUpdate {
    content: String,
}

#[derive(Deserialize)]
struct SaveCalculation {
    #[serde(flatten)]
    input: TaxInput,
    #[serde(default)]
    label: String,
}

/// Build the router over an opened office.
pub fn router(office: Arc<Office>) -> Router {
    let uploads_dir = office.config.public_dir.join("uploads");
    let body_limit = office.config.max_upload_bytes as usize + 64 * 1024;

    Router::new()
        .route("/", get(serve_dashboard_page))
        .route("/api/dashboard", get(get_dashboard))
        .route(
            "/api/cdd/perorangan",
            get(list_cdd_perorangan).post(save_cdd_perorangan),
        )
        .route("/api/cdd/perorangan/:id", delete(delete_cdd_perorangan))
        .route(
            "/api/cdd/korporasi",
            get(list_cdd_korporasi).post(save_cdd_korporasi),
        )
        .route("/api/cdd/korporasi/:id", delete(delete_cdd_korporasi))
        .route("/api/legalitas", get(list_legalitas).post(save_legalitas))
        .route("/api/legalitas/:id", delete(delete_legalitas))
        .route("/api/legalitas/:id/upload", post(upload_legalitas_file))
        .route("/api/legalitas/:id/note", post(add_legalitas_note))
        .route(
            "/api/legalitas/:id/items/:item",
            delete(remove_legalitas_item),
        )
        .route("/api/forms/:kind", get(list_forms).post(archive_form))
        .route("/api/jobs", get(list_jobs).post(save_job))
        .route("/api/jobs/summary", get(jobs_summary))
        .route("/api/jobs/:id", delete(delete_job))
        .route("/api/jobs/:id/notes", put(update_job_notes))
        .route("/api/tracking", get(list_tracking).post(save_tracking))
        .route("/api/tracking/timeline", get(tracking_timeline))
        .route("/api/tracking/:id", delete(delete_tracking))
        .route("/api/tracking/:id/history", post(save_tracking_history))
        .route(
            "/api/tracking/:id/history/:hid",
            delete(delete_tracking_history),
        )
        .route(
            "/api/petty-cash/transactions",
            get(list_transactions).post(add_transaction),
        )
        .route(
            "/api/petty-cash/transactions/:id",
            delete(delete_transaction),
        )
        .route(
            "/api/petty-cash/settings",
            get(get_petty_cash_settings).post(save_petty_cash_settings),
        )
        .route("/api/petty-cash/upload", post(upload_petty_cash_proof))
        .route("/api/petty-cash/summary", get(petty_cash_summary))
        .route("/api/petty-cash/export.xlsx", get(export_petty_cash))
        .route("/api/employees", get(list_employees).post(save_employee))
        .route("/api/employees/:id", delete(delete_employee))
        .route("/api/employees/:id/attendance", put(update_attendance))
        .route("/api/employees/:id/entry-time", put(set_entry_time))
        .route("/api/employees/:id/report", get(employee_report))
        .route("/api/deeds", get(list_deeds).post(create_deed))
        .route("/api/deeds/summary", get(deeds_summary))
        .route("/api/deeds/ppat-lampiran.xlsx", get(export_ppat_annex))
        .route("/api/deeds/:id", put(update_deed).delete(delete_deed))
        .route("/print/lapbul/:kind", get(print_lapbul))
        .route("/api/chat", get(get_chat).post(send_chat))
        .route("/api/chat/note", get(get_chat_note).post(save_chat_note))
        .route("/api/tax/calculate", post(calculate_tax))
        .route("/api/tax/history", get(list_tax_history).post(save_tax_history))
        .route("/api/tax/history/:id", delete(delete_tax_history))
        .route("/api/history", get(list_history))
        .route("/print/kwitansi", post(print_kwitansi))
        .route("/api/bank-draft", get(list_drafts).post(upload_draft))
        .route("/api/bank-draft/:id", delete(delete_draft))
        .route(
            "/api/client-accounts",
            get(list_client_accounts).post(save_client_account),
        )
        .route("/api/client-accounts/:id", delete(delete_client_account))
        .route("/api/wa-forms", get(list_wa_forms).post(save_wa_form))
        .route("/api/wa-forms/:id", delete(delete_wa_form))
        .route("/api/webforms", get(list_webforms).post(save_webform))
        .route(
            "/api/webforms/:id",
            get(get_webform).delete(delete_webform),
        )
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(office)
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind.clone();
    log::info!(
        "data directory {}, uploads under {}",
        config.data_dir.display(),
        config.public_dir.join("uploads").display()
    );
    let office = Arc::new(Office::open(config)?);
    let app = router(office);

    let listener = TcpListener::bind(&bind).await?;
    log::info!("listening on http://{}", bind);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn serve_dashboard_page() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

async fn get_dashboard(
    State(office): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let (month, year) = match query.resolve() {
        Ok(period) => period,
        Err(e) => return failure("dashboard", e),
    };
    respond(
        "dashboard",
        blocking(&office, move |office| Ok(office.dashboard(month, year))).await,
    )
}

// --- customer due diligence ---

async fn list_cdd_perorangan(State(office): State<AppState>) -> Response {
    respond(
        "list CDD perorangan",
        blocking(&office, |office| Ok(office.cdd_perorangan.list())).await,
    )
}

async fn save_cdd_perorangan(
    State(office): State<AppState>,
    Json(form): Json<CddPerorangan>,
) -> Response {
    respond(
        "save CDD perorangan",
        blocking(&office, move |office| cdd::save_form(&office.cdd_perorangan, form)).await,
    )
}

async fn delete_cdd_perorangan(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete CDD perorangan",
        blocking(&office, move |office| office.cdd_perorangan.delete(&id)).await,
    )
}

async fn list_cdd_korporasi(State(office): State<AppState>) -> Response {
    respond(
        "list CDD korporasi",
        blocking(&office, |office| Ok(office.cdd_korporasi.list())).await,
    )
}

async fn save_cdd_korporasi(
    State(office): State<AppState>,
    Json(form): Json<CddKorporasi>,
) -> Response {
    respond(
        "save CDD korporasi",
        blocking(&office, move |office| cdd::save_form(&office.cdd_korporasi, form)).await,
    )
}

async fn delete_cdd_korporasi(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete CDD korporasi",
        blocking(&office, move |office| office.cdd_korporasi.delete(&id)).await,
    )
}

// --- legal entity archive ---

async fn list_legalitas(State(office): State<AppState>) -> Response {
    let result = blocking(&office, |office| {
        let all = office.legalitas.list();
        Ok(serde_json::to_value(all.iter().map(LegalEntity::view).collect::<Vec<_>>())?)
    })
    .await;
    respond("list legal entities", result)
}

async fn save_legalitas(
    State(office): State<AppState>,
    Json(entity): Json<LegalEntity>,
) -> Response {
    respond(
        "save legal entity",
        blocking(&office, move |office| legalitas::save_entity(&office.legalitas, entity)).await,
    )
}

async fn delete_legalitas(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete legal entity",
        blocking(&office, move |office| office.legalitas.delete(&id)).await,
    )
}

async fn upload_legalitas_file(
    State(office): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let result = async {
        let form = read_multipart(multipart).await?;
        let column = form
            .fields
            .get("column")
            .and_then(|key| Column::from_key(key))
            .ok_or_else(|| AppError::invalid("column must be one of col2..col5"))?;
        let file = form
            .file
            .ok_or_else(|| AppError::Upload("no file received".to_string()))?;
        blocking(&office, move |office| {
            if office.legalitas.find(&id)?.is_none() {
                return Err(AppError::not_found("legal entity", id));
            }
            let stored = office.uploads.store(
                &format!("legalitas/{}", id),
                &file.name,
                file.content_type.as_deref(),
                &file.bytes,
            )?;
            let item = LegalItem::file(stored.clone());
            legalitas::add_item(&office.legalitas, &id, column, item).inspect_err(|_| {
                if let Err(e) = office.uploads.remove(&stored) {
                    log::warn!("could not remove {}: {}", stored.file_url, e);
                }
            })
        })
        .await
    }
    .await;
    respond("upload legal document", result)
}

async fn add_legalitas_note(
    State(office): State<AppState>,
    Path(id): Path<String>,
    Json(note): Json<NoteItem>,
) -> Response {
    if note.content.trim().is_empty() {
        return failure("add legal note", AppError::invalid("note is empty"));
    }
    respond(
        "add legal note",
        blocking(&office, move |office| {
            legalitas::add_item(&office.legalitas, &id, note.column, LegalItem::note(&note.content))
        })
        .await,
    )
}

async fn remove_legalitas_item(
    State(office): State<AppState>,
    Path((id, item)): Path<(String, String)>,
) -> Response {
    respond(
        "remove legal item",
        blocking(&office, move |office| {
            legalitas::remove_item(&office.legalitas, &id, &item)
        })
        .await,
    )
}

// --- invoices and printed forms ---

async fn list_forms(State(office): State<AppState>, Path(kind): Path<String>) -> Response {
    if kind == "invoices" {
        let result = blocking(&office, |office| {
            let all = office.invoices.list();
            Ok(serde_json::to_value(all.iter().map(Invoice::view).collect::<Vec<_>>())?)
        })
        .await;
        return respond("list invoices", result);
    }
    match FormKind::from_slug(&kind) {
        Some(kind) => respond(
            "list forms",
            blocking(&office, move |office| Ok(office.forms(kind).list())).await,
        ),
        None => not_found(&format!("form archive {:?}", kind)),
    }
}

async fn archive_form(
    State(office): State<AppState>,
    Path(kind): Path<String>,
    Json(payload): Json<Value>,
) -> Response {
    if kind == "invoices" {
        let result = blocking(&office, move |office| {
            let invoice = serde_json::from_value::<Invoice>(payload)?;
            let invoice = forms::create_invoice(&office.invoices, invoice)?;
            Ok(serde_json::to_value(invoice.view())?)
        })
        .await;
        return respond("archive invoice", result);
    }
    match FormKind::from_slug(&kind) {
        Some(form) => respond(
            "archive form",
            blocking(&office, move |office| forms::archive_form(office.forms(form), payload)).await,
        ),
        None => not_found(&format!("form archive {:?}", kind)),
    }
}

// --- job billing list ---

async fn list_jobs(State(office): State<AppState>, Query(query): Query<JobsQuery>) -> Response {
    let result = blocking(&office, move |office| {
        let all = office.jobs.list();
        let found = jobs::filter(&all, query.category, &query.q);
        let views: Vec<_> = found.iter().map(|job| job.view()).collect();
        Ok(json!({
            "jobs": views,
            "summary": jobs::summarize(found.iter().copied()),
        }))
    })
    .await;
    respond("list jobs", result)
}

async fn save_job(State(office): State<AppState>, Json(job): Json<Job>) -> Response {
    respond(
        "save job",
        blocking(&office, move |office| jobs::save_job(&office.jobs, job)).await,
    )
}

async fn jobs_summary(State(office): State<AppState>) -> Response {
    respond(
        "job summary",
        blocking(&office, |office| Ok(jobs::summarize(&office.jobs.list()))).await,
    )
}

async fn delete_job(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete job",
        blocking(&office, move |office| office.jobs.delete(&id)).await,
    )
}

async fn update_job_notes(
    State(office): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<NotesUpdate>,
) -> Response {
    respond(
        "update job notes",
        blocking(&office, move |office| jobs::update_notes(&office.jobs, &id, &update.notes)).await,
    )
}

// --- job tracking ---

async fn list_tracking(
    State(office): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let result = blocking(&office, move |office| {
        let all = office.tracking.list();
        Ok(tracking::search(&all, &query.q).into_iter().cloned().collect::<Vec<_>>())
    })
    .await;
    respond("list tracking jobs", result)
}

async fn save_tracking(State(office): State<AppState>, Json(job): Json<TrackingJob>) -> Response {
    respond(
        "save tracking job",
        blocking(&office, move |office| tracking::save_job(&office.tracking, job)).await,
    )
}

async fn delete_tracking(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete tracking job",
        blocking(&office, move |office| office.tracking.delete(&id)).await,
    )
}

async fn save_tracking_history(
    State(office): State<AppState>,
    Path(id): Path<String>,
    Json(item): Json<HistoryItem>,
) -> Response {
    respond(
        "save timeline item",
        blocking(&office, move |office| {
            tracking::save_history_item(&office.tracking, &id, item)
        })
        .await,
    )
}

async fn delete_tracking_history(
    State(office): State<AppState>,
    Path((id, hid)): Path<(String, String)>,
) -> Response {
    respond(
        "delete timeline item",
        blocking(&office, move |office| {
            tracking::delete_history_item(&office.tracking, &id, &hid)
        })
        .await,
    )
}

async fn tracking_timeline(State(office): State<AppState>) -> Response {
    let result = blocking(&office, |office| {
        Ok(timeline::chart(&office.tracking.list(), GridSettings::default()))
    })
    .await;
    respond("tracking timeline", result)
}

// --- petty cash ---

async fn list_transactions(
    State(office): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let result = blocking(&office, move |office| {
        let all = office.petty_cash.list();
        Ok(petty_cash::search(&all, &query.q).into_iter().cloned().collect::<Vec<_>>())
    })
    .await;
    respond("list petty cash entries", result)
}

async fn add_transaction(
    State(office): State<AppState>,
    Json(entry): Json<Transaction>,
) -> Response {
    respond(
        "add petty cash entry",
        blocking(&office, move |office| {
            let settings = office.petty_cash_settings.get();
            petty_cash::add_transaction(&office.petty_cash, &settings, entry)
        })
        .await,
    )
}

async fn delete_transaction(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete petty cash entry",
        blocking(&office, move |office| office.petty_cash.delete(&id)).await,
    )
}

async fn get_petty_cash_settings(State(office): State<AppState>) -> Response {
    respond(
        "read petty cash settings",
        blocking(&office, move |office| office.petty_cash_settings.load()).await,
    )
}

async fn save_petty_cash_settings(
    State(office): State<AppState>,
    Json(settings): Json<Settings>,
) -> Response {
    if settings.max_limit_per_item <= 0 {
        return failure(
            "save petty cash settings",
            AppError::invalid("maxLimitPerItem must be positive"),
        );
    }
    respond(
        "save petty cash settings",
        blocking(&office, move |office| {
            office.petty_cash_settings.save(&settings).map(|_| settings)
        })
        .await,
    )
}

async fn upload_petty_cash_proof(State(office): State<AppState>, multipart: Multipart) -> Response {
    let result = async {
        let form = read_multipart(multipart).await?;
        let file = form
            .file
            .ok_or_else(|| AppError::Upload("no file received".to_string()))?;
        blocking(&office, move |office| {
            office
                .uploads
                .store("petty-cash", &file.name, file.content_type.as_deref(), &file.bytes)
        })
        .await
    }
    .await;
    respond("upload petty cash proof", result)
}

async fn petty_cash_summary(State(office): State<AppState>) -> Response {
    let result = blocking(&office, |office| {
        let all = office.petty_cash.list();
        let settings = office.petty_cash_settings.get();
        Ok(json!({
            "balance": petty_cash::balance(&all, &settings),
            "byCategory": petty_cash::spending_by_category(&all),
        }))
    })
    .await;
    respond("petty cash summary", result)
}

async fn export_petty_cash(State(office): State<AppState>) -> Response {
    let result = blocking(&office, |office| {
        let all = office.petty_cash.list();
        let settings = office.petty_cash_settings.get();
        petty_cash::export_xlsx(&all, &settings)
    })
    .await;
    match result {
        Ok(bytes) => download("petty-cash.xlsx", XLSX, bytes),
        Err(e) => failure("export petty cash", e),
    }
}

// --- attendance ---

async fn list_employees(State(office): State<AppState>) -> Response {
    respond(
        "list employees",
        blocking(&office, |office| Ok(office.employees.list())).await,
    )
}

async fn save_employee(State(office): State<AppState>, Json(employee): Json<Employee>) -> Response {
    respond(
        "save employee",
        blocking(&office, move |office| {
            attendance::save_employee(&office.employees, employee)
        })
        .await,
    )
}

async fn delete_employee(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete employee",
        blocking(&office, move |office| office.employees.delete(&id)).await,
    )
}

async fn update_attendance(
    State(office): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<AttendanceUpdate>,
) -> Response {
    respond(
        "update attendance",
        blocking(&office, move |office| {
            attendance::update_attendance(&office.employees, &id, &update.date, update.status)
        })
        .await,
    )
}

async fn set_entry_time(
    State(office): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<EntryTimeUpdate>,
) -> Response {
    respond(
        "set entry time",
        blocking(&office, move |office| {
            attendance::set_entry_time(&office.employees, &id, &update.date, &update.time)
        })
        .await,
    )
}

async fn employee_report(
    State(office): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let (month, year) = match query.resolve() {
        Ok(period) => period,
        Err(e) => return failure("attendance report", e),
    };
    let result = blocking(&office, move |office| {
        let employee = office
            .employees
            .find(&id)?
            .ok_or_else(|| AppError::not_found("employee", id))?;
        attendance::monthly_report(&employee, year, month)
    })
    .await;
    respond("attendance report", result)
}

// --- monthly report ---

async fn list_deeds(State(office): State<AppState>, Query(query): Query<PeriodQuery>) -> Response {
    let result = blocking(&office, move |office| {
        let all = office.deeds.list();
        Ok(match (query.month, query.year) {
            (Some(month), Some(year)) => {
                report::in_period(&all, month, year).into_iter().cloned().collect()
            }
            _ => all,
        })
    })
    .await;
    respond("list deeds", result)
}

async fn create_deed(State(office): State<AppState>, Json(payload): Json<Value>) -> Response {
    respond(
        "create deed",
        blocking(&office, move |office| report::create_deed(&office.deeds, payload)).await,
    )
}

async fn update_deed(
    State(office): State<AppState>,
    Path(id): Path<String>,
    Json(updates): Json<Value>,
) -> Response {
    respond(
        "update deed",
        blocking(&office, move |office| report::update_deed(&office.deeds, &id, updates)).await,
    )
}

async fn delete_deed(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete deed",
        blocking(&office, move |office| report::delete_deed(&office.deeds, &id)).await,
    )
}

async fn deeds_summary(State(office): State<AppState>, Query(query): Query<PeriodQuery>) -> Response {
    let (month, year) = match query.resolve() {
        Ok(period) => period,
        Err(e) => return failure("deed summary", e),
    };
    let result = blocking(&office, move |office| {
        Ok(Period::new(&office.deeds.list(), month, year).summary())
    })
    .await;
    respond("deed summary", result)
}

async fn export_ppat_annex(
    State(office): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let (month, year) = match query.resolve() {
        Ok(period) => period,
        Err(e) => return failure("export PPAT annex", e),
    };
    let result = blocking(&office, move |office| {
        report::export_ppat_xlsx(&Period::new(&office.deeds.list(), month, year))
    })
    .await;
    match result {
        Ok(bytes) => download(
            &format!("lampiran-ppat-{}-{:02}.xlsx", year, month),
            XLSX,
            bytes,
        ),
        Err(e) => failure("export PPAT annex", e),
    }
}

async fn print_lapbul(
    State(office): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<PrintQuery>,
) -> Response {
    let Some(print_kind) = PrintKind::from_slug(&kind) else {
        return not_found(&format!("print target {:?}", kind));
    };
    let period = PeriodQuery {
        month: query.month,
        year: query.year,
    };
    let (month, year) = match period.resolve() {
        Ok(period) => period,
        Err(e) => return failure("print monthly report", e),
    };

    let result = blocking(&office, move |office| {
        let recipients = report::parse_recipients(query.to.as_deref())?;
        let all = office.deeds.list();
        office.renderer.render(
            print_kind,
            &Period::new(&all, month, year),
            &recipients,
            &office.config,
            chrono::Local::now().date_naive(),
        )
    })
    .await;
    match result {
        Ok(html) => Html(html).into_response(),
        Err(e) => failure("print monthly report", e),
    }
}

// --- chat ---

fn request_ip(headers: &HeaderMap, peer: Option<ConnectInfo<SocketAddr>>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());
    let peer = peer.map(|ConnectInfo(addr)| addr.ip().to_string());
    chat::client_ip(forwarded, peer.as_deref())
}

async fn get_chat(
    State(office): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let ip = request_ip(&headers, peer);
    let loaded = blocking(&office, |office| Ok((office.chat.list(), office.chat_note.get()))).await;
    let (messages, note) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => return failure("read chat", e),
    };
    Json(json!({
        "success": true,
        "messages": messages,
        "userIp": ip,
        "note": note,
        "pollIntervalMs": office.config.chat_poll_interval_ms,
    }))
    .into_response()
}

async fn send_chat(
    State(office): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    multipart: Multipart,
) -> Response {
    let ip = request_ip(&headers, peer);
    let result = async {
        let form = read_multipart(multipart).await?;
        blocking(&office, move |office| {
            let text = form.fields.get("message").map(String::as_str).unwrap_or("");
            let attachment = form.file.as_ref().map(|file| Attachment {
                file_name: &file.name,
                content_type: file.content_type.as_deref(),
                bytes: &file.bytes,
            });
            chat::send_message(
                &office.chat,
                &office.uploads,
                &ip,
                text,
                attachment,
                office.config.chat_history_limit,
            )
        })
        .await
    }
    .await;
    respond("send chat message", result)
}

async fn get_chat_note(State(office): State<AppState>) -> Response {
    respond(
        "read chat note",
        blocking(&office, move |office| office.chat_note.load()).await,
    )
}

async fn save_chat_note(
    State(office): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(update): Json<StickyNoteUpdate>,
) -> Response {
    let ip = request_ip(&headers, peer);
    respond(
        "save chat note",
        blocking(&office, move |office| {
            chat::save_note(&office.chat_note, &update.content, &ip)
        })
        .await,
    )
}

// --- tax estimate ---

async fn calculate_tax(Json(input): Json<TaxInput>) -> Response {
    let result = tax::calculate(&input).map(|estimate| {
        json!({
            "estimate": estimate,
            "text": tax::summary_text(&input, &estimate),
        })
    });
    respond("calculate tax", result)
}

async fn list_tax_history(State(office): State<AppState>) -> Response {
    respond(
        "list tax estimates",
        blocking(&office, |office| Ok(office.tax_history.list())).await,
    )
}

async fn save_tax_history(
    State(office): State<AppState>,
    Json(request): Json<SaveCalculation>,
) -> Response {
    respond(
        "save tax estimate",
        blocking(&office, move |office| {
            tax::save_calculation(&office.tax_history, &request.input, &request.label)
        })
        .await,
    )
}

async fn delete_tax_history(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete tax estimate",
        blocking(&office, move |office| office.tax_history.delete(&id)).await,
    )
}

// --- document history ---

async fn list_history(State(office): State<AppState>, Query(query): Query<HistoryQuery>) -> Response {
    let kind = match query.kind.as_str() {
        "" | "all" => None,
        slug => match serde_json::from_value::<DocumentType>(Value::from(slug)) {
            Ok(kind) => Some(kind),
            Err(_) => {
                return failure(
                    "list history",
                    AppError::invalid(format!("unknown document type {}", slug)),
                );
            }
        },
    };
    let result = blocking(&office, move |office| {
        Ok(history::filter(office.history()?, kind, &query.q))
    })
    .await;
    respond("list history", result)
}

// --- receipts ---

async fn print_kwitansi(State(office): State<AppState>, Json(receipt): Json<Receipt>) -> Response {
    let today = chrono::Local::now().date_naive();
    match kwitansi::render(&office.renderer, &receipt, &office.config, today) {
        Ok(html) => Html(html).into_response(),
        Err(e) => failure("print receipt", e),
    }
}

// --- deed drafts ---

async fn list_drafts(State(office): State<AppState>, Query(query): Query<DraftsQuery>) -> Response {
    let category = match query.category.as_str() {
        "" | "ALL" => None,
        "Notaris" => Some(DraftCategory::Notaris),
        "PPAT" => Some(DraftCategory::Ppat),
        other => {
            return failure(
                "list drafts",
                AppError::invalid(format!("unknown draft category {}", other)),
            );
        }
    };
    let result = blocking(&office, move |office| {
        let all = office.drafts.list();
        Ok(drafts::filter(&all, category, &query.q).into_iter().cloned().collect::<Vec<_>>())
    })
    .await;
    respond("list drafts", result)
}

async fn upload_draft(State(office): State<AppState>, multipart: Multipart) -> Response {
    let result = async {
        let form = read_multipart(multipart).await?;
        let category = match form.fields.get("category").map(String::as_str) {
            None | Some("Notaris") => DraftCategory::Notaris,
            Some("PPAT") => DraftCategory::Ppat,
            Some(other) => {
                return Err(AppError::invalid(format!("unknown draft category {}", other)));
            }
        };
        let title = form.fields.get("title").cloned().unwrap_or_default();
        let file = form
            .file
            .ok_or_else(|| AppError::Upload("no file received".to_string()))?;
        blocking(&office, move |office| {
            drafts::add_draft(
                &office.drafts,
                &office.uploads,
                &title,
                category,
                &file.name,
                file.content_type.as_deref(),
                &file.bytes,
            )
        })
        .await
    }
    .await;
    respond("upload draft", result)
}

async fn delete_draft(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete draft",
        blocking(&office, move |office| {
            drafts::delete_draft(&office.drafts, &office.uploads, &id)
        })
        .await,
    )
}

// --- client portal accounts ---

async fn list_client_accounts(
    State(office): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let result = blocking(&office, move |office| {
        Ok(accounts::search(&office.client_accounts.list(), &query.q))
    })
    .await;
    respond("list client accounts", result)
}

async fn save_client_account(
    State(office): State<AppState>,
    Json(account): Json<ClientAccount>,
) -> Response {
    respond(
        "save client account",
        blocking(&office, move |office| {
            accounts::save_account(&office.client_accounts, account)
        })
        .await,
    )
}

async fn delete_client_account(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete client account",
        blocking(&office, move |office| office.client_accounts.delete(&id)).await,
    )
}

// --- WhatsApp templates ---

async fn list_wa_forms(State(office): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let result = blocking(&office, move |office| {
        let all = office.wa_forms.list();
        Ok(wa_forms::search(&all, &query.q).into_iter().cloned().collect::<Vec<_>>())
    })
    .await;
    respond("list WhatsApp templates", result)
}

async fn save_wa_form(State(office): State<AppState>, Json(form): Json<WaForm>) -> Response {
    respond(
        "save WhatsApp template",
        blocking(&office, move |office| wa_forms::save_template(&office.wa_forms, form)).await,
    )
}

async fn delete_wa_form(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete WhatsApp template",
        blocking(&office, move |office| office.wa_forms.delete(&id)).await,
    )
}

// --- incorporation questionnaires ---

async fn list_webforms(State(office): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let result = blocking(&office, move |office| {
        let found = webform::search(&office.webforms.list(), &query.q);
        Ok(serde_json::to_value(found.iter().map(WebForm::view).collect::<Vec<_>>())?)
    })
    .await;
    respond("list webforms", result)
}

async fn get_webform(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    let result = blocking(&office, move |office| {
        let form = office
            .webforms
            .find(&id)?
            .ok_or_else(|| AppError::not_found("webform", id))?;
        Ok(serde_json::to_value(form.view())?)
    })
    .await;
    respond("read webform", result)
}

async fn save_webform(State(office): State<AppState>, Json(form): Json<WebForm>) -> Response {
    respond(
        "save webform",
        blocking(&office, move |office| webform::save_form(&office.webforms, form)).await,
    )
}

async fn delete_webform(State(office): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        "delete webform",
        blocking(&office, move |office| office.webforms.delete(&id)).await,
    )
}

// --- multipart ---

struct UploadedPart {
    name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

struct MultipartForm {
    fields: HashMap<String, String>,
    file: Option<UploadedPart>,
}

/// Collect text fields and the `file` part of a multipart body.
async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm> {
    let mut form = MultipartForm {
        fields: HashMap::new(),
        file: None,
    };
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Upload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Upload(e.to_string()))?;
            form.file = Some(UploadedPart {
                name: file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Upload(e.to_string()))?;
            form.fields.insert(name, text);
        }
    }
    Ok(form)
}
