//! Incorporation questionnaires (PT, PT PMA, PT Perorangan, CV, foundations
//! and the like) filled in section by section, saved as drafts and finally
//! submitted to the office.
//!
//! The seven sections are stored as given. Only the parts the office
//! checks or computes from are read back: the identity in section 1, the
//! capital in section 2, the shareholders in section 4 and the document
//! checklist in section 7.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::store::{JsonStore, Record, now_iso, timestamp_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    #[default]
    Draft,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebForm {
    pub id: String,
    /// Template the form was started from
    pub form_type: String,
    pub created_at: String,
    pub updated_at: String,
    /// The applicant's e-mail address
    pub client_name: String,
    /// First choice of entity name
    pub entity_name: String,
    pub status: FormStatus,
    /// `section1` .. `section7`
    pub form_data: Map<String, Value>,
}

impl Default for WebForm {
    fn default() -> Self {
        WebForm {
            id: String::new(),
            form_type: "AIO".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
            client_name: String::new(),
            entity_name: String::new(),
            status: FormStatus::Draft,
            form_data: Map::new(),
        }
    }
}

impl Record for WebForm {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Identity {
    jenis_badan: String,
    email: String,
    nama_opsi1: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Capital {
    modal_disetor: f64,
    harga_per_lembar: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Shareholder {
    nama_lengkap: String,
    persentase_saham: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Shareholders {
    shareholders: Vec<Shareholder>,
}

/// Documents the applicant confirms are attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Checklist {
    #[serde(rename = "scanKTP")]
    pub scan_ktp: bool,
    #[serde(rename = "scanNPWP")]
    pub scan_npwp: bool,
    pub foto_selfie: bool,
    pub berita_acara: bool,
    pub dokumen_pendukung: bool,
}

/// A shareholder's stake expressed in shares of the paid-up capital.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shareholding {
    pub name: String,
    pub percentage: f64,
    pub shares: i64,
    pub value: i64,
}

/// A form with what the office computes from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebFormView<'a> {
    #[serde(flatten)]
    pub form: &'a WebForm,
    pub total_percentage: f64,
    pub shareholdings: Vec<Shareholding>,
    pub checklist: Checklist,
}

const PERORANGAN: &str = "PT Perorangan";

impl WebForm {
    /// Read `section<n>` as `T`, falling back to the default when it is
    /// missing or malformed.
    fn section<T: serde::de::DeserializeOwned + Default>(&self, n: u8) -> T {
        self.form_data
            .get(&format!("section{}", n))
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    pub fn total_percentage(&self) -> f64 {
        self.section::<Shareholders>(4)
            .shareholders
            .iter()
            .map(|s| s.persentase_saham)
            .sum()
    }

    /// Shares held per shareholder: the stake of the paid-up capital
    /// divided by the share price, rounded down. Zero when either is unset.
    pub fn shareholdings(&self) -> Vec<Shareholding> {
        let capital: Capital = self.section(2);
        self.section::<Shareholders>(4)
            .shareholders
            .into_iter()
            .map(|holder| {
                let shares = if capital.harga_per_lembar > 0.0 && capital.modal_disetor > 0.0 {
                    let stake = capital.modal_disetor * holder.persentase_saham / 100.0;
                    (stake / capital.harga_per_lembar).floor() as i64
                } else {
                    0
                };
                Shareholding {
                    name: holder.nama_lengkap,
                    percentage: holder.persentase_saham,
                    shares,
                    value: shares.saturating_mul(capital.harga_per_lembar as i64),
                }
            })
            .collect()
    }

    pub fn checklist(&self) -> Checklist {
        self.section(7)
    }

    pub fn view(&self) -> WebFormView<'_> {
        WebFormView {
            form: self,
            total_percentage: self.total_percentage(),
            shareholdings: self.shareholdings(),
            checklist: self.checklist(),
        }
    }

    /// Check what a submitted form must satisfy: at least two shareholders
    /// (one for PT Perorangan) whose stakes add up to 100%.
    pub fn check_submission(&self) -> Result<()> {
        let identity: Identity = self.section(1);
        let count = self.section::<Shareholders>(4).shareholders.len();
        let minimum = if identity.jenis_badan == PERORANGAN { 1 } else { 2 };
        if count < minimum {
            return Err(AppError::invalid(format!(
                "at least {} shareholders are required, got {}",
                minimum, count
            )));
        }
        let total = self.total_percentage();
        if (total - 100.0).abs() > 0.001 {
            return Err(AppError::invalid(format!("shares total {}%, not 100%", total)));
        }
        Ok(())
    }
}

/// Save a form. The client and entity names follow section 1; a submitted
/// form must pass [`WebForm::check_submission`].
pub fn save_form(store: &JsonStore<WebForm>, mut form: WebForm) -> Result<WebForm> {
    if form.status == FormStatus::Submitted {
        form.check_submission()?;
    }
    let identity: Identity = form.section(1);
    form.client_name = identity.email;
    form.entity_name = identity.nama_opsi1;
    if form.form_type.trim().is_empty() {
        form.form_type = "AIO".to_string();
    }

    let now = now_iso();
    if form.id.trim().is_empty() {
        form.id = timestamp_id();
    }
    if form.created_at.is_empty() {
        form.created_at = match store.find(&form.id)? {
            Some(existing) => existing.created_at,
            None => now.clone(),
        };
    }
    form.updated_at = now;
    store.save(form)
}

/// Forms whose client, entity name or template contains `query`, most
/// recently updated first.
pub fn search(forms: &[WebForm], query: &str) -> Vec<WebForm> {
    let query = query.trim().to_lowercase();
    let mut found: Vec<WebForm> = forms
        .iter()
        .filter(|f| {
            query.is_empty()
                || f.client_name.to_lowercase().contains(&query)
                || f.entity_name.to_lowercase().contains(&query)
                || f.form_type.to_lowercase().contains(&query)
        })
        .cloned()
        .collect();
    found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(data: Value, status: FormStatus) -> WebForm {
        WebForm {
            status,
            form_data: data.as_object().cloned().unwrap(),
            ..WebForm::default()
        }
    }

    fn pt(stakes: &[f64]) -> Value {
        let holders: Vec<Value> = stakes
            .iter()
            .enumerate()
            .map(|(i, p)| json!({ "namaLengkap": format!("Pendiri {}", i + 1), "persentaseSaham": p }))
            .collect();
        json!({
            "section1": { "jenisBadan": "PT", "email": "budi@example.com", "namaOpsi1": "PT Maju Jaya" },
            "section2": { "modalDasar": 200000000, "modalDisetor": 50000000, "hargaPerLembar": 1000000 },
            "section4": { "shareholders": holders },
            "section7": { "scanKTP": true, "beritaAcara": true }
        })
    }

    #[test]
    fn drafts_skip_the_share_check_and_take_names_from_section_one() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "webforms.json");
        let saved = save_form(&store, form(pt(&[30.0]), FormStatus::Draft)).unwrap();
        assert_eq!(saved.client_name, "budi@example.com");
        assert_eq!(saved.entity_name, "PT Maju Jaya");
        assert_eq!(saved.form_type, "AIO");
        assert_eq!(saved.created_at, saved.updated_at);

        let mut resubmitted = saved.clone();
        resubmitted.created_at.clear();
        resubmitted.form_data = pt(&[60.0, 40.0]).as_object().cloned().unwrap();
        resubmitted.status = FormStatus::Submitted;
        let submitted = save_form(&store, resubmitted).unwrap();
        assert_eq!(submitted.created_at, saved.created_at);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn submission_needs_full_shares_and_enough_holders() {
        assert!(form(pt(&[60.0, 30.0]), FormStatus::Submitted).check_submission().is_err());
        assert!(form(pt(&[100.0]), FormStatus::Submitted).check_submission().is_err());
        assert!(form(pt(&[33.4, 33.3, 33.3]), FormStatus::Submitted).check_submission().is_ok());

        let mut single = pt(&[100.0]);
        single["section1"]["jenisBadan"] = json!("PT Perorangan");
        assert!(form(single, FormStatus::Submitted).check_submission().is_ok());
    }

    #[test]
    fn shareholdings_follow_paid_up_capital() {
        let view = form(pt(&[60.0, 40.0]), FormStatus::Draft);
        let holdings = view.shareholdings();
        assert_eq!(holdings[0].shares, 30);
        assert_eq!(holdings[0].value, 30_000_000);
        assert_eq!(holdings[1].shares, 20);
        assert_eq!(view.total_percentage(), 100.0);

        let checklist = view.checklist();
        assert!(checklist.scan_ktp && checklist.berita_acara);
        assert!(!checklist.foto_selfie);

        let json = serde_json::to_value(view.view()).unwrap();
        assert_eq!(json["totalPercentage"], 100.0);
        assert_eq!(json["checklist"]["scanNPWP"], false);
        assert_eq!(json["formData"]["section1"]["namaOpsi1"], "PT Maju Jaya");
    }

    #[test]
    fn search_matches_names_and_template() {
        let mut a = form(pt(&[]), FormStatus::Draft);
        a.client_name = "budi@example.com".to_string();
        a.entity_name = "PT Maju Jaya".to_string();
        a.updated_at = "2024-01-01T00:00:00.000Z".to_string();
        let mut b = WebForm {
            form_type: "CV".to_string(),
            updated_at: "2024-02-01T00:00:00.000Z".to_string(),
            ..WebForm::default()
        };
        b.entity_name = "CV Sentosa".to_string();
        let all = vec![a, b];
        assert_eq!(search(&all, "")[0].entity_name, "CV Sentosa");
        assert_eq!(search(&all, "maju").len(), 1);
        assert_eq!(search(&all, "cv").len(), 1);
    }
}
