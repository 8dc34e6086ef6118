//! The data stores of one office, opened from a [`Config`].

use std::fs::create_dir_all;

use crate::accounts::ClientAccount;
use crate::attendance::Employee;
use crate::cdd::{CddKorporasi, CddPerorangan};
use crate::chat::{self, ChatMessage, StickyNote};
use crate::config::Config;
use crate::dashboard::{self, Dashboard, Sources};
use crate::drafts::Draft;
use crate::error::Result;
use crate::forms::{FormKind, FormRecord, Invoice};
use crate::history::{self, Archives, HistoryEntry};
use crate::jobs::Job;
use crate::legalitas::LegalEntity;
use crate::petty_cash::{self, Settings, Transaction};
use crate::report::{DeedRecord, Renderer};
use crate::store::{JsonDocument, JsonStore};
use crate::tax::SavedCalculation;
use crate::tracking::TrackingJob;
use crate::upload::Uploads;
use crate::wa_forms::WaForm;
use crate::webform::WebForm;

pub struct Office {
    pub config: Config,
    pub uploads: Uploads,
    pub renderer: Renderer,
    pub cdd_perorangan: JsonStore<CddPerorangan>,
    pub cdd_korporasi: JsonStore<CddKorporasi>,
    pub legalitas: JsonStore<LegalEntity>,
    pub invoices: JsonStore<Invoice>,
    pub cover_akta: JsonStore<FormRecord>,
    pub serah_terima: JsonStore<FormRecord>,
    pub daftar_hadir: JsonStore<FormRecord>,
    pub jobs: JsonStore<Job>,
    pub tracking: JsonStore<TrackingJob>,
    pub petty_cash: JsonStore<Transaction>,
    pub petty_cash_settings: JsonDocument<Settings>,
    pub employees: JsonStore<Employee>,
    pub deeds: JsonStore<DeedRecord>,
    pub chat: JsonStore<ChatMessage>,
    pub chat_note: JsonDocument<StickyNote>,
    pub tax_history: JsonStore<SavedCalculation>,
    pub drafts: JsonStore<Draft>,
    pub client_accounts: JsonStore<ClientAccount>,
    pub wa_forms: JsonStore<WaForm>,
    pub webforms: JsonStore<WebForm>,
}

impl Office {
    /// Create the data and upload directories and open every store.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let data = config.data_dir.clone();
        create_dir_all(&data)?;
        create_dir_all(config.public_dir.join("uploads"))?;

        Ok(Office {
            uploads: Uploads::new(config.public_dir.clone(), config.max_upload_bytes),
            renderer: Renderer::new()?,
            cdd_perorangan: JsonStore::new(&data, "cdd-perorangan.json"),
            cdd_korporasi: JsonStore::new(&data, "cdd-korporasi.json"),
            legalitas: JsonStore::new(&data, "legalitas-badan.json").inserting_at_front(),
            invoices: JsonStore::new(&data, "invoices.json"),
            cover_akta: JsonStore::new(&data, FormKind::CoverAkta.file_name()),
            serah_terima: JsonStore::new(&data, FormKind::SerahTerima.file_name()),
            daftar_hadir: JsonStore::new(&data, FormKind::DaftarHadir.file_name()),
            jobs: JsonStore::new(&data, "daftar-pekerjaan.json").inserting_at_front(),
            tracking: JsonStore::new(&data, "data-tracking.json"),
            petty_cash: JsonStore::new(&data, "petty-cash-transactions.json").inserting_at_front(),
            petty_cash_settings: petty_cash::settings_document(&data),
            employees: JsonStore::new(&data, "laporan-karyawan.json"),
            deeds: JsonStore::new(&data, "deeds.json"),
            chat: JsonStore::new(&data, "chat-history.json"),
            chat_note: chat::note_document(&data),
            tax_history: JsonStore::new(&data, "tax-calculations.json").inserting_at_front(),
            drafts: JsonStore::new(&data, "bank-draft.json").inserting_at_front(),
            client_accounts: JsonStore::new(&data, "client-accounts.json"),
            wa_forms: JsonStore::new(&data, "wa-forms.json").inserting_at_front(),
            webforms: JsonStore::new(&data, "webforms.json").inserting_at_front(),
            config,
        })
    }

    pub fn forms(&self, kind: FormKind) -> &JsonStore<FormRecord> {
        match kind {
            FormKind::CoverAkta => &self.cover_akta,
            FormKind::SerahTerima => &self.serah_terima,
            FormKind::DaftarHadir => &self.daftar_hadir,
        }
    }

    /// Every archived document, newest first.
    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        let invoices = self.invoices.load()?;
        let serah_terima = self.serah_terima.load()?;
        let cover_akta = self.cover_akta.load()?;
        let cdd_perorangan = self.cdd_perorangan.load()?;
        let cdd_korporasi = self.cdd_korporasi.load()?;
        history::collect(&Archives {
            invoices: &invoices,
            serah_terima: &serah_terima,
            cover_akta: &cover_akta,
            cdd_perorangan: &cdd_perorangan,
            cdd_korporasi: &cdd_korporasi,
        })
    }

    pub fn dashboard(&self, month: u32, year: i32) -> Dashboard {
        let deeds = self.deeds.list();
        let jobs = self.jobs.list();
        let tracking = self.tracking.list();
        let transactions = self.petty_cash.list();
        let settings = self.petty_cash_settings.get();
        let sources = Sources {
            deeds: &deeds,
            jobs: &jobs,
            tracking: &tracking,
            transactions: &transactions,
            petty_cash_settings: &settings,
            employees: self.employees.list().len(),
        };
        dashboard::build(&sources, month, year)
    }
}
