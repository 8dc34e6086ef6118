//! Client accounts on government portals (OSS, AHU, Coretax and the like)
//! that the office operates on a client's behalf.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::store::{JsonStore, Record, now_iso, timestamp_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountStatus {
    #[default]
    Active,
    #[serde(rename = "In Review")]
    InReview,
    Blacklist,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientAccount {
    pub id: String,
    pub name: String,
    pub platform: String,
    pub username: String,
    pub password: String,
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: String,
}

impl Default for ClientAccount {
    fn default() -> Self {
        ClientAccount {
            id: String::new(),
            name: "-".to_string(),
            platform: String::new(),
            username: String::new(),
            password: String::new(),
            status: AccountStatus::Active,
            notes: None,
            updated_at: String::new(),
        }
    }
}

impl Record for ClientAccount {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Save an account, stamping `updatedAt`. Platform, username and client
/// name are required.
pub fn save_account(
    store: &JsonStore<ClientAccount>,
    mut account: ClientAccount,
) -> Result<ClientAccount> {
    let name = account.name.trim();
    if account.platform.trim().is_empty() || account.username.trim().is_empty() {
        return Err(AppError::invalid("platform and username are required"));
    }
    if name.is_empty() || name == "-" {
        return Err(AppError::invalid("client name is required"));
    }
    if account.id.trim().is_empty() {
        account.id = timestamp_id();
    }
    account.updated_at = now_iso();
    store.save(account)
}

/// Accounts matching `query` on name, username or platform, most recently
/// updated first.
pub fn search(accounts: &[ClientAccount], query: &str) -> Vec<ClientAccount> {
    let query = query.trim().to_lowercase();
    let mut found: Vec<ClientAccount> = accounts
        .iter()
        .filter(|a| {
            query.is_empty()
                || a.name.to_lowercase().contains(&query)
                || a.username.to_lowercase().contains(&query)
                || a.platform.to_lowercase().contains(&query)
        })
        .cloned()
        .collect();
    // ISO timestamps sort chronologically as strings
    found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, platform: &str, username: &str) -> ClientAccount {
        ClientAccount {
            name: name.to_string(),
            platform: platform.to_string(),
            username: username.to_string(),
            ..ClientAccount::default()
        }
    }

    #[test]
    fn requires_platform_username_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path(), "client-accounts.json");
        assert!(save_account(&store, account("PT Maju", "", "maju")).is_err());
        assert!(save_account(&store, account("PT Maju", "OSS", " ")).is_err());
        assert!(save_account(&store, account("-", "OSS", "maju")).is_err());

        let saved = save_account(&store, account("PT Maju", "OSS", "maju")).unwrap();
        assert!(!saved.id.is_empty());
        assert!(!saved.updated_at.is_empty());
        assert_eq!(saved.status, AccountStatus::Active);
    }

    #[test]
    fn search_orders_by_last_update() {
        let mut older = account("CV Sentosa", "AHU", "sentosa");
        older.updated_at = "2024-01-02T00:00:00.000Z".to_string();
        let mut newer = account("PT Maju", "Coretax", "maju01");
        newer.updated_at = "2024-03-02T00:00:00.000Z".to_string();
        let all = vec![older, newer];

        let found = search(&all, "");
        assert_eq!(found[0].name, "PT Maju");
        assert_eq!(search(&all, "ahu").len(), 1);
        assert_eq!(search(&all, "MAJU01")[0].platform, "Coretax");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let account: ClientAccount =
            serde_json::from_str(r#"{ "platform": "OSS", "username": "u", "status": "In Review" }"#)
                .unwrap();
        assert_eq!(account.name, "-");
        assert_eq!(account.status, AccountStatus::InReview);
        assert!(serde_json::to_value(&account).unwrap().get("notes").is_none());
    }
}
