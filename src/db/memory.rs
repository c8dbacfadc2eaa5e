use crate::db::CredentialStore;
use crate::db::models::ProviderCredential;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
struct AccountRecord {
    slack_token: Option<String>,
    credential: Option<ProviderCredential>,
    last_status: Option<String>,
}

/// In-memory credential store. Backs the unit and scenario tests so the
/// schedulers can run against fake collaborators without Postgres.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<String, AccountRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account row, as the connect flow would.
    pub fn insert_account(&self, user_id: &str, slack_token: Option<&str>) {
        let mut accounts = self.accounts.lock().unwrap();
        accounts.insert(
            user_id.to_string(),
            AccountRecord {
                slack_token: slack_token.map(str::to_string),
                ..Default::default()
            },
        );
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(user_id)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn list_connected_users(&self) -> Result<Vec<String>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        let mut users: Vec<String> = accounts
            .iter()
            .filter(|(_, record)| record.slack_token.is_some() && record.credential.is_some())
            .map(|(id, _)| id.clone())
            .collect();
        users.sort();
        Ok(users)
    }

    async fn list_expiring_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        let mut users: Vec<String> = accounts
            .iter()
            .filter(|(_, record)| {
                record
                    .credential
                    .as_ref()
                    .is_some_and(|c| c.expires_at <= cutoff)
            })
            .map(|(id, _)| id.clone())
            .collect();
        users.sort();
        Ok(users)
    }

    async fn get_credential(
        &self,
        user_id: &str,
    ) -> Result<Option<ProviderCredential>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.get(user_id).and_then(|r| r.credential.clone()))
    }

    async fn upsert_credential(
        &self,
        user_id: &str,
        credential: &ProviderCredential,
    ) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let record = accounts.entry(user_id.to_string()).or_default();
        record.credential = Some(credential.clone());
        Ok(())
    }

    async fn get_slack_token(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.get(user_id).and_then(|r| r.slack_token.clone()))
    }

    async fn get_last_status(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.get(user_id).and_then(|r| r.last_status.clone()))
    }

    async fn set_last_status(&self, user_id: &str, status: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(record) = accounts.get_mut(user_id) {
            record.last_status = Some(status.to_string());
        }
        Ok(())
    }

    async fn delete_all_data(&self, user_id: &str) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        accounts.remove(user_id);
        Ok(())
    }
}
