//! Customer Due Diligence forms for individuals and corporations.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{JsonStore, Record, now_iso, timestamp_id, today};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IdentityType {
    #[default]
    #[serde(rename = "KTP")]
    Ktp,
    #[serde(rename = "Paspor")]
    Paspor,
    #[serde(rename = "SIM")]
    Sim,
    #[serde(rename = "")]
    Unset,
}

/// CDD form for a natural person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CddPerorangan {
    pub id: String,
    pub created_at: String,
    pub nama_lengkap: String,
    pub jenis_identitas: IdentityType,
    pub no_identitas: String,
    pub npwp: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: String,
    pub kewarganegaraan: String,
    pub alamat_tinggal: String,
    pub alamat_domisili: String,
    pub alamat_negara_asal: String,
    pub telp: String,
    pub jenis_kelamin: String,
    pub status_pernikahan: String,
    pub status_pernikahan_lainnya: String,
    pub sumber_pendapatan: Vec<String>,
    pub sumber_pendapatan_lainnya: String,
    pub bidang_usaha: String,
    /// One of `<=12`, `>12-120`, `>120-1.2M`, `>1.2M` (millions of rupiah a year)
    pub range_pendapatan: String,
    pub tujuan_transaksi: String,
    pub tempat_tanda_tangan: String,
    pub tanggal_tanda_tangan: String,
}

impl Default for CddPerorangan {
    fn default() -> Self {
        CddPerorangan {
            id: String::new(),
            created_at: String::new(),
            nama_lengkap: String::new(),
            jenis_identitas: IdentityType::Ktp,
            no_identitas: String::new(),
            npwp: String::new(),
            tempat_lahir: String::new(),
            tanggal_lahir: String::new(),
            kewarganegaraan: "Indonesia".to_string(),
            alamat_tinggal: String::new(),
            alamat_domisili: String::new(),
            alamat_negara_asal: String::new(),
            telp: String::new(),
            jenis_kelamin: "Laki-Laki".to_string(),
            status_pernikahan: "Belum Menikah".to_string(),
            status_pernikahan_lainnya: String::new(),
            sumber_pendapatan: Vec::new(),
            sumber_pendapatan_lainnya: String::new(),
            bidang_usaha: String::new(),
            range_pendapatan: String::new(),
            tujuan_transaksi: String::new(),
            tempat_tanda_tangan: "Garut".to_string(),
            tanggal_tanda_tangan: today(),
        }
    }
}

impl Record for CddPerorangan {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The natural person who ultimately owns or controls a corporation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BeneficialOwner {
    pub nama: String,
    pub alias: String,
    pub jenis_identitas: IdentityType,
    pub no_identitas: String,
    pub tempat_lahir: String,
    pub tgl_lahir: String,
    pub kewarganegaraan: String,
    pub alamat: String,
    pub alamat_asal: String,
    pub npwp: String,
    /// Relationship between the owner and the corporation
    pub hubungan: String,
}

impl Default for BeneficialOwner {
    fn default() -> Self {
        BeneficialOwner {
            nama: String::new(),
            alias: String::new(),
            jenis_identitas: IdentityType::Ktp,
            no_identitas: String::new(),
            tempat_lahir: String::new(),
            tgl_lahir: String::new(),
            kewarganegaraan: "Indonesia".to_string(),
            alamat: String::new(),
            alamat_asal: String::new(),
            npwp: String::new(),
            hubungan: String::new(),
        }
    }
}

/// CDD form for a corporation, filled in by the person appearing for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CddKorporasi {
    pub id: String,
    pub created_at: String,
    pub nama_korporasi: String,
    pub bentuk_korporasi: String,
    #[serde(rename = "noSK")]
    pub no_sk: String,
    #[serde(rename = "tglSK")]
    pub tgl_sk: String,
    pub no_ijin_usaha: String,
    pub tgl_ijin_usaha: String,
    pub npwp: String,
    pub alamat_akta: String,
    pub alamat_usaha: String,
    pub telp: String,
    pub fax: String,
    pub bidang_usaha: String,
    pub no_akta_terakhir: String,
    pub sumber_dana: String,
    pub pendapatan_tahunan: String,
    pub tujuan_transaksi: String,
    /// `None` when the corporation declared no beneficial owner
    pub beneficial_owner: Option<BeneficialOwner>,
    pub jabatan_kuasa: String,
    pub jabatan_lainnya: String,
    pub no_surat_kuasa: String,
    pub tgl_surat_kuasa: String,
    pub penandatangan_kuasa: String,
    pub jabatan_penandatangan: String,
    pub nama_pengguna_jasa: String,
    pub alias_pengguna_jasa: String,
    pub no_identitas_pengguna_jasa: String,
    pub jenis_identitas_pengguna_jasa: IdentityType,
    pub tempat_lahir_pengguna: String,
    pub tgl_lahir_pengguna: String,
    pub kewarganegaraan_pengguna: String,
    pub alamat_pengguna: String,
    pub kota_tanda_tangan: String,
    pub tgl_tanda_tangan: String,
}

impl Default for CddKorporasi {
    fn default() -> Self {
        CddKorporasi {
            id: String::new(),
            created_at: String::new(),
            nama_korporasi: String::new(),
            bentuk_korporasi: "Perseroan Terbatas (PT)".to_string(),
            no_sk: String::new(),
            tgl_sk: String::new(),
            no_ijin_usaha: String::new(),
            tgl_ijin_usaha: String::new(),
            npwp: String::new(),
            alamat_akta: String::new(),
            alamat_usaha: String::new(),
            telp: String::new(),
            fax: String::new(),
            bidang_usaha: String::new(),
            no_akta_terakhir: String::new(),
            sumber_dana: String::new(),
            pendapatan_tahunan: String::new(),
            tujuan_transaksi: String::new(),
            beneficial_owner: None,
            jabatan_kuasa: String::new(),
            jabatan_lainnya: String::new(),
            no_surat_kuasa: String::new(),
            tgl_surat_kuasa: String::new(),
            penandatangan_kuasa: String::new(),
            jabatan_penandatangan: String::new(),
            nama_pengguna_jasa: String::new(),
            alias_pengguna_jasa: String::new(),
            no_identitas_pengguna_jasa: String::new(),
            jenis_identitas_pengguna_jasa: IdentityType::Ktp,
            tempat_lahir_pengguna: String::new(),
            tgl_lahir_pengguna: String::new(),
            kewarganegaraan_pengguna: "Indonesia".to_string(),
            alamat_pengguna: String::new(),
            kota_tanda_tangan: "Garut".to_string(),
            tgl_tanda_tangan: today(),
        }
    }
}

impl Record for CddKorporasi {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Forms that get an id and creation time when first saved.
pub trait NewForm: Record {
    fn identify(&mut self, id: String, created_at: String);
}

impl NewForm for CddPerorangan {
    fn identify(&mut self, id: String, created_at: String) {
        self.id = id;
        self.created_at = created_at;
    }
}

impl NewForm for CddKorporasi {
    fn identify(&mut self, id: String, created_at: String) {
        self.id = id;
        self.created_at = created_at;
    }
}

/// Save a CDD form, assigning an id on first save. The stored form is fully
/// replaced on later saves.
pub fn save_form<T: NewForm>(store: &JsonStore<T>, mut form: T) -> Result<T> {
    if form.id().trim().is_empty() {
        form.identify(timestamp_id(), now_iso());
    }
    store.save(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korporasi_without_owner_serializes_null() {
        let form = CddKorporasi::default();
        let json = serde_json::to_value(&form).unwrap();
        assert!(json["beneficialOwner"].is_null());
        assert_eq!(json["noSK"], "");
        assert_eq!(json["bentukKorporasi"], "Perseroan Terbatas (PT)");
    }

    #[test]
    fn partial_payload_fills_defaults() {
        let form: CddPerorangan =
            serde_json::from_str(r#"{ "namaLengkap": "Siti Aminah", "jenisIdentitas": "Paspor" }"#)
                .unwrap();
        assert_eq!(form.nama_lengkap, "Siti Aminah");
        assert_eq!(form.jenis_identitas, IdentityType::Paspor);
        assert_eq!(form.kewarganegaraan, "Indonesia");
    }
}
