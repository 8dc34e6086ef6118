//! Monthly statutory reports (laporan bulanan) for the notary and the land
//! deed official.
//!
//! Deeds are recorded throughout the month and tagged with the reporting
//! period. At the end of the month they are rendered into the cover letters
//! and tables the supervising offices expect:
//!
//! * PPAT: one cover letter per receiving office plus a landscape annex
//!   listing every land deed with its tax payments.
//! * Notaris: a letter to the supervisory board plus the N-1 .. N-5 model
//!   tables grouped by deed category.

use chrono::{Datelike, NaiveDate};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::format::{
    format_date_long, format_date_text, format_rupiah, month_name, parse_date, parse_rupiah,
    sum_amounts, to_roman,
};
use crate::store::{JsonStore, Record, now_iso, timestamp_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DeedType {
    #[default]
    Notaris,
    #[serde(rename = "PPAT")]
    Ppat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NotarisCategory {
    #[default]
    Akta,
    Legalisasi,
    Waarmerking,
    Wasiat,
    Protes,
}

/// Report order of the notary categories.
pub const CATEGORIES: [NotarisCategory; 5] = [
    NotarisCategory::Akta,
    NotarisCategory::Legalisasi,
    NotarisCategory::Waarmerking,
    NotarisCategory::Wasiat,
    NotarisCategory::Protes,
];

impl NotarisCategory {
    pub fn label(self) -> &'static str {
        match self {
            NotarisCategory::Akta => "Akta",
            NotarisCategory::Legalisasi => "Legalisasi",
            NotarisCategory::Waarmerking => "Waarmerking",
            NotarisCategory::Wasiat => "Wasiat",
            NotarisCategory::Protes => "Protes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActingCapacity {
    #[serde(rename = "self")]
    Own,
    Representative,
    Both,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeedParty {
    pub name: String,
    /// Pihak I, Pihak II, ...
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acting_capacity: Option<ActingCapacity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub represented_parties: Vec<String>,
}

/// Land-deed specifics. Amounts are kept as typed by the user
/// (`"Rp 150.000.000"`) and parsed when totalled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PpatDetails {
    pub nop: String,
    pub njop: String,
    pub luas_tanah: String,
    pub luas_bangunan: String,
    pub lokasi_objek: String,
    pub nilai_transaksi: String,
    /// Seller's income tax payment
    pub ssp: String,
    pub tgl_ssp: String,
    /// Buyer's acquisition duty payment
    pub ssb: String,
    pub tgl_ssb: String,
    /// HM, HGB, ...
    pub jenis_hak: String,
    pub pihak_penerima: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeedRecord {
    pub id: String,
    pub jenis: DeedType,
    pub nomor_akta: String,
    /// `YYYY-MM-DD`
    pub tanggal_akta: String,
    #[serde(default)]
    pub judul_akta: String,
    #[serde(default)]
    pub pihak: Vec<DeedParty>,
    pub kategori: Option<NotarisCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nomor_bulanan: Option<String>,
    #[serde(rename = "detailPPAT")]
    pub detail_ppat: Option<PpatDetails>,
    pub bulan_pelaporan: u32,
    pub tahun_pelaporan: i32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Record for DeedRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DeedRecord {
    /// Category used for the notary model tables.
    pub fn category(&self) -> NotarisCategory {
        self.kategori.unwrap_or_default()
    }

    pub fn party_names(&self) -> String {
        self.pihak
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A deed as submitted by the form: every field optional, old payloads may
/// carry `sifatAkta` instead of `judulAkta`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DeedInput {
    jenis: Option<DeedType>,
    nomor_akta: Option<String>,
    tanggal_akta: Option<String>,
    judul_akta: Option<String>,
    sifat_akta: Option<String>,
    pihak: Option<Vec<DeedParty>>,
    kategori: Option<NotarisCategory>,
    nomor_bulanan: Option<String>,
    #[serde(rename = "detailPPAT")]
    detail_ppat: Option<PpatDetails>,
    bulan_pelaporan: Option<u32>,
    tahun_pelaporan: Option<i32>,
}

/// Turn a submitted payload into a consistent record (without id or
/// timestamps).
///
/// Parties without a name are dropped, PPAT details only survive on PPAT
/// deeds and categories only on notary deeds. The reporting period defaults
/// to the month of the deed date, or of `today` when that is unparseable.
pub fn normalize(payload: Value, today: NaiveDate) -> Result<DeedRecord> {
    let input: DeedInput = serde_json::from_value(payload)?;
    let jenis = input.jenis.unwrap_or_default();

    let tanggal_akta = input
        .tanggal_akta
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());
    let period_date = parse_date(&tanggal_akta).unwrap_or(today);

    let pihak = input
        .pihak
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.name.trim().is_empty())
        .collect();

    let bulan_pelaporan = input.bulan_pelaporan.unwrap_or(period_date.month());
    if !(1..=12).contains(&bulan_pelaporan) {
        return Err(AppError::invalid(format!(
            "invalid reporting month {}",
            bulan_pelaporan
        )));
    }

    Ok(DeedRecord {
        id: String::new(),
        jenis,
        nomor_akta: input.nomor_akta.unwrap_or_default(),
        tanggal_akta,
        judul_akta: input.judul_akta.or(input.sifat_akta).unwrap_or_default(),
        pihak,
        kategori: match jenis {
            DeedType::Notaris => Some(input.kategori.unwrap_or_default()),
            DeedType::Ppat => None,
        },
        nomor_bulanan: input.nomor_bulanan.filter(|n| !n.trim().is_empty()),
        detail_ppat: match jenis {
            DeedType::Ppat => input.detail_ppat,
            DeedType::Notaris => None,
        },
        bulan_pelaporan,
        tahun_pelaporan: input.tahun_pelaporan.unwrap_or(period_date.year()),
        created_at: String::new(),
        updated_at: String::new(),
    })
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn create_deed(store: &JsonStore<DeedRecord>, payload: Value) -> Result<DeedRecord> {
    let mut deed = normalize(payload, local_today())?;
    let now = now_iso();
    deed.id = timestamp_id();
    deed.created_at = now.clone();
    deed.updated_at = now;
    store.save(deed)
}

/// Merge `updates` over the stored deed and normalize the result.
pub fn update_deed(store: &JsonStore<DeedRecord>, id: &str, updates: Value) -> Result<DeedRecord> {
    if id.trim().is_empty() {
        return Err(AppError::invalid("deed id is required for update"));
    }
    let Value::Object(updates) = updates else {
        return Err(AppError::invalid("deed update must be a JSON object"));
    };

    store.update(|deeds| {
        let existing = deeds
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::not_found("deed", id))?;

        let mut merged: Map<String, Value> = match serde_json::to_value(&*existing)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        // a null clears the field, which the normalizer reads as unset
        merged.retain(|_, v| !v.is_null());
        merged.extend(updates);

        let mut deed = normalize(Value::Object(merged), local_today())?;
        deed.id = existing.id.clone();
        deed.created_at = std::mem::take(&mut existing.created_at);
        deed.updated_at = now_iso();
        *existing = deed.clone();
        Ok(deed)
    })
}

/// Delete a deed. Deleting an unknown id succeeds.
pub fn delete_deed(store: &JsonStore<DeedRecord>, id: &str) -> Result<bool> {
    if id.trim().is_empty() {
        return Err(AppError::invalid("deed id is required for delete"));
    }
    store.delete(id)
}

/// Deeds reported in `month`/`year`.
pub fn in_period(deeds: &[DeedRecord], month: u32, year: i32) -> Vec<&DeedRecord> {
    deeds
        .iter()
        .filter(|d| d.bulan_pelaporan == month && d.tahun_pelaporan == year)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub kategori: NotarisCategory,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub month: u32,
    pub year: i32,
    pub total_notaris: usize,
    #[serde(rename = "totalPPAT")]
    pub total_ppat: usize,
    pub total_transaksi: i64,
    #[serde(rename = "totalSSP")]
    pub total_ssp: i64,
    #[serde(rename = "totalSSB")]
    pub total_ssb: i64,
    pub by_category: Vec<CategoryCount>,
}

/// Deeds of one period split by kind.
pub struct Period<'a> {
    pub month: u32,
    pub year: i32,
    pub notaris: Vec<&'a DeedRecord>,
    pub ppat: Vec<&'a DeedRecord>,
}

impl<'a> Period<'a> {
    pub fn new(deeds: &'a [DeedRecord], month: u32, year: i32) -> Self {
        let (ppat, notaris): (Vec<&DeedRecord>, Vec<&DeedRecord>) = in_period(deeds, month, year)
            .into_iter()
            .partition(|d| d.jenis == DeedType::Ppat);
        Period {
            month,
            year,
            notaris,
            ppat,
        }
    }

    pub fn in_category(&self, category: NotarisCategory) -> Vec<&'a DeedRecord> {
        self.notaris
            .iter()
            .copied()
            .filter(|d| d.category() == category)
            .collect()
    }

    fn ppat_total(&self, field: fn(&PpatDetails) -> &str) -> i64 {
        sum_amounts(
            self.ppat
                .iter()
                .filter_map(|d| d.detail_ppat.as_ref())
                .map(|detail| parse_rupiah(field(detail))),
        )
    }

    pub fn summary(&self) -> Summary {
        Summary {
            month: self.month,
            year: self.year,
            total_notaris: self.notaris.len(),
            total_ppat: self.ppat.len(),
            total_transaksi: self.ppat_total(|d| d.nilai_transaksi.as_str()),
            total_ssp: self.ppat_total(|d| d.ssp.as_str()),
            total_ssb: self.ppat_total(|d| d.ssb.as_str()),
            by_category: CATEGORIES
                .iter()
                .map(|&kategori| CategoryCount {
                    kategori,
                    count: self.in_category(kategori).len(),
                })
                .collect(),
        }
    }
}

/// `01/PPAT/HA/III/2024`
pub fn letter_number(sequence: u32, month: u32, year: i32) -> String {
    format!("{:02}/PPAT/HA/{}/{}", sequence, to_roman(month), year)
}

/// Offices that receive the PPAT monthly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    BpnKab,
    BpnKanwil,
    Dispenda,
    KppPratama,
}

pub const RECIPIENTS: [Recipient; 4] = [
    Recipient::BpnKab,
    Recipient::BpnKanwil,
    Recipient::Dispenda,
    Recipient::KppPratama,
];

impl Recipient {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "bpnKab" => Some(Recipient::BpnKab),
            "bpnKanwil" => Some(Recipient::BpnKanwil),
            "dispenda" | "bapenda" => Some(Recipient::Dispenda),
            "kppPratama" => Some(Recipient::KppPratama),
            _ => None,
        }
    }

    /// Address lines of the receiving office.
    pub fn addressee(self, city: &str) -> Vec<String> {
        match self {
            Recipient::BpnKab => vec![
                "Kepala Kantor".to_string(),
                "Badan Pertanahan Nasional".to_string(),
                format!("Kabupaten {}", city),
            ],
            Recipient::BpnKanwil => vec![
                "Kepala Kantor Wilayah".to_string(),
                "Badan Pertanahan Nasional".to_string(),
                "Provinsi Jawa Barat".to_string(),
            ],
            Recipient::Dispenda => vec![
                "Kepala Kantor".to_string(),
                format!("Badan Pendapatan Daerah Kabupaten {}", city),
            ],
            Recipient::KppPratama => vec![
                "Kepala Kantor".to_string(),
                format!("Pelayanan Pajak Pratama {}", city),
            ],
        }
    }
}

/// Parse a comma separated recipient list. Nothing selected means every
/// office.
pub fn parse_recipients(list: Option<&str>) -> Result<Vec<Recipient>> {
    let keys: Vec<&str> = list
        .unwrap_or_default()
        .split(',')
        .filter(|k| !k.trim().is_empty())
        .collect();
    if keys.is_empty() {
        return Ok(RECIPIENTS.to_vec());
    }
    keys.into_iter()
        .map(|k| {
            Recipient::from_key(k)
                .ok_or_else(|| AppError::invalid(format!("unknown recipient {:?}", k)))
        })
        .collect()
}

/// Printable documents of the monthly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintKind {
    PpatSurat,
    PpatLampiran,
    NotarisSurat,
    NotarisModel,
}

impl PrintKind {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "ppat-surat" => Some(PrintKind::PpatSurat),
            "ppat-lampiran" => Some(PrintKind::PpatLampiran),
            "notaris-surat" => Some(PrintKind::NotarisSurat),
            "notaris-model" => Some(PrintKind::NotarisModel),
            _ => None,
        }
    }

    fn template(self) -> &'static str {
        match self {
            PrintKind::PpatSurat => "ppat-surat",
            PrintKind::PpatLampiran => "ppat-lampiran",
            PrintKind::NotarisSurat => "notaris-surat",
            PrintKind::NotarisModel => "notaris-model",
        }
    }
}

struct Model {
    code: &'static str,
    title: &'static str,
    /// `None` lists every notary deed
    category: Option<NotarisCategory>,
}

const MODELS: [Model; 5] = [
    Model {
        code: "N-1",
        title: "Akta Notariil",
        category: Some(NotarisCategory::Akta),
    },
    Model {
        code: "N-2",
        title: "Legalisasi",
        category: Some(NotarisCategory::Legalisasi),
    },
    Model {
        code: "N-3",
        title: "Waarmerking",
        category: Some(NotarisCategory::Waarmerking),
    },
    Model {
        code: "N-4",
        title: "Wasiat / Hibah",
        category: Some(NotarisCategory::Wasiat),
    },
    Model {
        code: "N-5",
        title: "Rekapitulasi Umum",
        category: None,
    },
];

/// Handlebars registry holding the report templates.
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_partial("a4_style", include_str!("templates/a4-style.hbs"))?;
        registry.register_template_string("ppat-surat", include_str!("templates/ppat-surat.hbs"))?;
        registry.register_template_string(
            "ppat-lampiran",
            include_str!("templates/ppat-lampiran.hbs"),
        )?;
        registry.register_template_string(
            "notaris-surat",
            include_str!("templates/notaris-surat.hbs"),
        )?;
        registry.register_template_string(
            "notaris-model",
            include_str!("templates/notaris-model.hbs"),
        )?;
        registry.register_template_string("kwitansi", include_str!("templates/kwitansi.hbs"))?;
        Ok(Renderer { registry })
    }

    /// Render one printable document of the monthly report as an HTML page.
    ///
    /// # Arguments
    /// * `kind` - Which letter or annex to print
    /// * `period` - The deeds of the reported month, already split by register
    /// * `recipients` - Addressees of the PPAT cover letter, one page each
    /// * `config` - Office city, signing official and letter sequence number
    /// * `printed_on` - Date written above the signature
    ///
    /// # Returns
    /// * `Result<String>` - The complete HTML page, or a template error
    pub fn render(
        &self,
        kind: PrintKind,
        period: &Period<'_>,
        recipients: &[Recipient],
        config: &Config,
        printed_on: NaiveDate,
    ) -> Result<String> {
        let context = context(kind, period, recipients, config, printed_on);
        Ok(self.registry.render(kind.template(), &context)?)
    }

    /// Render a registered template that is not part of the monthly report.
    pub(crate) fn render_page(&self, template: &str, context: &Value) -> Result<String> {
        Ok(self.registry.render(template, context)?)
    }
}

fn context(
    kind: PrintKind,
    period: &Period<'_>,
    recipients: &[Recipient],
    config: &Config,
    printed_on: NaiveDate,
) -> Value {
    let summary = period.summary();
    let signatory = if config.official_name.trim().is_empty() {
        "........................................".to_string()
    } else {
        config.official_name.clone()
    };
    let mut context = json!({
        "month": month_name(period.month),
        "monthUpper": month_name(period.month).to_uppercase(),
        "year": period.year,
        "city": config.office_city,
        "printedOn": format_date_long(printed_on),
        "signatory": signatory,
    });

    let extra = match kind {
        PrintKind::PpatSurat => json!({
            "letters": recipients.iter().enumerate().map(|(i, r)| json!({
                "pageBreak": i > 0,
                "number": letter_number(config.letter_sequence, period.month, period.year),
                "addressee": r.addressee(&config.office_city),
            })).collect::<Vec<_>>(),
            "count": summary.total_ppat,
            "totalTransaksi": format_rupiah(summary.total_transaksi),
            "totalSsp": format_rupiah(summary.total_ssp),
            "totalSsb": format_rupiah(summary.total_ssb),
        }),
        PrintKind::PpatLampiran => json!({
            "rows": period.ppat.iter().enumerate().map(|(i, d)| ppat_row(i + 1, d)).collect::<Vec<_>>(),
            "totalTransaksi": format_rupiah(summary.total_transaksi),
            "totalSsp": format_rupiah(summary.total_ssp),
            "totalSsb": format_rupiah(summary.total_ssb),
        }),
        PrintKind::NotarisSurat => json!({
            "count": summary.total_notaris,
            "categories": summary.by_category.iter().map(category_line).collect::<Vec<_>>(),
        }),
        PrintKind::NotarisModel => json!({
            "models": MODELS.iter().map(|m| {
                let deeds = match m.category {
                    Some(category) => period.in_category(category),
                    None => period.notaris.clone(),
                };
                json!({
                    "code": m.code,
                    "title": m.title,
                    "detailed": m.code == "N-1",
                    "count": deeds.len(),
                    "rows": deeds.iter().enumerate().map(|(i, d)| notaris_row(i + 1, d)).collect::<Vec<_>>(),
                })
            }).collect::<Vec<_>>(),
        }),
    };

    if let (Value::Object(base), Value::Object(extra)) = (&mut context, extra) {
        base.extend(extra);
    }
    context
}

fn category_line(count: &CategoryCount) -> Value {
    let shown = if count.count == 0 {
        "NIHIL".to_string()
    } else {
        count.count.to_string()
    };
    json!({ "label": count.kategori.label(), "count": shown })
}

fn or_dash(text: &str) -> String {
    if text.trim().is_empty() {
        "-".to_string()
    } else {
        text.to_string()
    }
}

fn ppat_row(no: usize, deed: &DeedRecord) -> Value {
    let detail = deed.detail_ppat.clone().unwrap_or_default();
    let area = if deed.detail_ppat.is_some() {
        format!(
            "{} / {}",
            if detail.luas_tanah.is_empty() { "0" } else { detail.luas_tanah.as_str() },
            if detail.luas_bangunan.is_empty() { "0" } else { detail.luas_bangunan.as_str() },
        )
    } else {
        "-".to_string()
    };
    json!({
        "no": no,
        "nomorAkta": deed.nomor_akta,
        "tanggal": format_date_text(&deed.tanggal_akta),
        "judul": or_dash(&deed.judul_akta),
        "pihak": or_dash(&deed.party_names()),
        "penerima": or_dash(&detail.pihak_penerima),
        "jenisHak": or_dash(&detail.jenis_hak),
        "nop": or_dash(&detail.nop),
        "lokasi": or_dash(&detail.lokasi_objek),
        "luas": area,
        "nilaiTransaksi": or_dash(&detail.nilai_transaksi),
        "ssp": or_dash(&detail.ssp),
        "ssb": or_dash(&detail.ssb),
    })
}

fn notaris_row(no: usize, deed: &DeedRecord) -> Value {
    json!({
        "no": no,
        "nomorBulanan": deed.nomor_bulanan.clone().unwrap_or_else(|| "-".to_string()),
        "nomorAkta": or_dash(&deed.nomor_akta),
        "tanggal": format_date_text(&deed.tanggal_akta),
        "judul": or_dash(&deed.judul_akta),
        "pihak": deed.pihak.iter().enumerate().map(|(i, p)| json!({
            "no": i + 1,
            "name": p.name,
            "forSelf": matches!(p.acting_capacity, Some(ActingCapacity::Own | ActingCapacity::Both)),
            "onBehalf": matches!(p.acting_capacity, Some(ActingCapacity::Representative | ActingCapacity::Both)),
            "represented": p.represented_parties.iter().enumerate().map(|(r, name)| json!({
                "letter": ((b'a' + (r % 26) as u8) as char).to_string(),
                "name": name,
            })).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
    })
}

/// The PPAT annex as an XLSX workbook.
pub fn export_ppat_xlsx(period: &Period<'_>) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    let bold = Format::new().set_bold();

    worksheet.write_string_with_format(
        0,
        0,
        &format!(
            "Lampiran Detail Akta PPAT - {} {}",
            month_name(period.month),
            period.year
        ),
        &bold,
    )?;

    let headers = [
        "No",
        "Nomor Akta",
        "Tanggal",
        "Bentuk Perbuatan Hukum",
        "Pihak",
        "Pihak Penerima",
        "Jenis Hak",
        "NOP",
        "Lokasi",
        "Luas Tanah",
        "Luas Bangunan",
        "Nilai Transaksi",
        "SSP",
        "SSB",
    ];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(2, col as u16, *header, &bold)?;
    }

    for (i, deed) in period.ppat.iter().enumerate() {
        let row = (i + 3) as u32;
        let detail = deed.detail_ppat.clone().unwrap_or_default();
        worksheet.write_number(row, 0, (i + 1) as f64)?;
        worksheet.write_string(row, 1, &deed.nomor_akta)?;
        worksheet.write_string(row, 2, &format_date_text(&deed.tanggal_akta))?;
        worksheet.write_string(row, 3, &deed.judul_akta)?;
        worksheet.write_string(row, 4, &deed.party_names())?;
        worksheet.write_string(row, 5, &detail.pihak_penerima)?;
        worksheet.write_string(row, 6, &detail.jenis_hak)?;
        worksheet.write_string(row, 7, &detail.nop)?;
        worksheet.write_string(row, 8, &detail.lokasi_objek)?;
        worksheet.write_string(row, 9, &detail.luas_tanah)?;
        worksheet.write_string(row, 10, &detail.luas_bangunan)?;
        worksheet.write_number(row, 11, parse_rupiah(&detail.nilai_transaksi) as f64)?;
        worksheet.write_number(row, 12, parse_rupiah(&detail.ssp) as f64)?;
        worksheet.write_number(row, 13, parse_rupiah(&detail.ssb) as f64)?;
    }

    if period.ppat.is_empty() {
        worksheet.write_string(3, 0, "NIHIL")?;
    } else {
        let summary = period.summary();
        let row = (period.ppat.len() + 3) as u32;
        worksheet.write_string_with_format(row, 10, "Jumlah", &bold)?;
        worksheet.write_number_with_format(row, 11, summary.total_transaksi as f64, &bold)?;
        worksheet.write_number_with_format(row, 12, summary.total_ssp as f64, &bold)?;
        worksheet.write_number_with_format(row, 13, summary.total_ssb as f64, &bold)?;
    }

    workbook.push_worksheet(worksheet);
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ppat(nomor: &str, nilai: &str, ssp: &str, ssb: &str) -> DeedRecord {
        normalize(
            json!({
                "jenis": "PPAT",
                "nomorAkta": nomor,
                "tanggalAkta": "2024-03-05",
                "judulAkta": "Jual Beli",
                "pihak": [{ "name": "Asep", "role": "Pihak I" }],
                "detailPPAT": { "nilaiTransaksi": nilai, "ssp": ssp, "ssb": ssb, "luasTanah": "120" }
            }),
            ymd(2024, 3, 20),
        )
        .unwrap()
    }

    #[test]
    fn oversized_amounts_do_not_wrap_the_totals() {
        let deeds = vec![
            ppat("1", "99999999999999999999", "", ""),
            ppat("2", "99999999999999999999", "", ""),
        ];
        let summary = Period::new(&deeds, 3, 2024).summary();
        assert_eq!(summary.total_ppat, 2);
        assert_eq!(summary.total_transaksi, i64::MAX);
    }

    fn notaris(nomor: &str, kategori: &str) -> DeedRecord {
        normalize(
            json!({
                "nomorAkta": nomor,
                "tanggalAkta": "2024-03-07",
                "kategori": kategori,
                "sifatAkta": "Pendirian CV",
                "pihak": [{ "name": "Rina", "role": "Pihak I" }]
            }),
            ymd(2024, 3, 20),
        )
        .unwrap()
    }

    #[test]
    fn normalize_drops_and_derives() {
        let deed = normalize(
            json!({
                "nomorAkta": "12",
                "tanggalAkta": "2024-02-28",
                "sifatAkta": "Kuasa",
                "pihak": [{ "name": "Budi", "role": "Pihak I" }, { "name": "  ", "role": "Pihak II" }],
                "detailPPAT": { "nop": "32.05" }
            }),
            ymd(2024, 3, 20),
        )
        .unwrap();
        assert_eq!(deed.jenis, DeedType::Notaris);
        assert_eq!(deed.kategori, Some(NotarisCategory::Akta));
        assert_eq!(deed.judul_akta, "Kuasa");
        assert_eq!(deed.pihak.len(), 1);
        assert!(deed.detail_ppat.is_none());
        assert_eq!((deed.bulan_pelaporan, deed.tahun_pelaporan), (2, 2024));

        let land = ppat("7", "Rp 100.000.000", "", "");
        assert!(land.kategori.is_none());
        assert!(land.detail_ppat.is_some());
    }

    #[test]
    fn unparseable_date_uses_today_for_period() {
        let deed = normalize(json!({ "tanggalAkta": "besok" }), ymd(2024, 11, 2)).unwrap();
        assert_eq!((deed.bulan_pelaporan, deed.tahun_pelaporan), (11, 2024));
        assert_eq!(deed.tanggal_akta, "besok");
    }

    #[test]
    fn summary_sums_currency_strings() {
        let deeds = vec![
            ppat("1", "Rp 150.000.000", "Rp 3.750.000", "2.500.000"),
            ppat("2", "75000000", "", "Rp 0"),
            notaris("3", "Legalisasi"),
            notaris("4", "Akta"),
        ];
        let period = Period::new(&deeds, 3, 2024);
        let summary = period.summary();
        assert_eq!(summary.total_ppat, 2);
        assert_eq!(summary.total_notaris, 2);
        assert_eq!(summary.total_transaksi, 225_000_000);
        assert_eq!(summary.total_ssp, 3_750_000);
        assert_eq!(summary.total_ssb, 2_500_000);
        assert_eq!(summary.by_category[1].count, 1);
        assert_eq!(summary.by_category[3].count, 0);

        assert!(Period::new(&deeds, 4, 2024).ppat.is_empty());
    }

    #[test]
    fn letter_numbers_use_roman_months() {
        assert_eq!(letter_number(1, 3, 2024), "01/PPAT/HA/III/2024");
        assert_eq!(letter_number(12, 12, 2023), "12/PPAT/HA/XII/2023");
    }

    #[test]
    fn recipients_default_to_all() {
        assert_eq!(parse_recipients(None).unwrap().len(), 4);
        assert_eq!(
            parse_recipients(Some("bpnKab,kppPratama")).unwrap(),
            vec![Recipient::BpnKab, Recipient::KppPratama]
        );
        assert!(parse_recipients(Some("bpnKab,mpd")).is_err());
    }

    #[test]
    fn renders_every_document() {
        let deeds = vec![
            ppat("1", "Rp 150.000.000", "Rp 3.750.000", "Rp 2.500.000"),
            notaris("2", "Waarmerking"),
        ];
        let period = Period::new(&deeds, 3, 2024);
        let config = Config::default();
        let renderer = Renderer::new().unwrap();
        let today = ymd(2024, 4, 1);

        let letters = renderer
            .render(PrintKind::PpatSurat, &period, &RECIPIENTS[..2], &config, today)
            .unwrap();
        assert!(letters.contains("01/PPAT/HA/III/2024"));
        assert!(letters.contains("Provinsi Jawa Barat"));
        assert!(letters.contains("Rp 150.000.000"));
        assert!(letters.contains("01 April 2024"));

        let annex = renderer
            .render(PrintKind::PpatLampiran, &period, &[], &config, today)
            .unwrap();
        assert!(annex.contains("A4 landscape"));
        assert!(annex.contains("05 Maret 2024"));

        let letter = renderer
            .render(PrintKind::NotarisSurat, &period, &[], &config, today)
            .unwrap();
        assert!(letter.contains("NIHIL"));

        let models = renderer
            .render(PrintKind::NotarisModel, &period, &[], &config, today)
            .unwrap();
        assert!(models.contains("N-3"));
        assert!(models.contains("Pendirian CV"));
    }

    #[test]
    fn annex_exports_to_xlsx() {
        let deeds = vec![ppat("1", "Rp 150.000.000", "", "")];
        let bytes = export_ppat_xlsx(&Period::new(&deeds, 3, 2024)).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
