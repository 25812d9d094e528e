//! 인메모리 계정 저장소.
//!
//! 테스트와 로컬 실행용. PostgreSQL 구현과 같은 고유성/정렬 규칙을 따릅니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Account, AccountFilter, AccountPage, AccountStore, SessionTokens};
use crate::error::{StoreError, StoreResult};

/// `RwLock<Vec<Account>>` 기반 저장소.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<Vec<Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 계정 수.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn count(&self, filter: &AccountFilter) -> StoreResult<u64> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().filter(|a| filter.matches(a)).count() as u64)
    }

    async fn insert(&self, account: &Account) -> StoreResult<()> {
        let mut accounts = self.accounts.write().await;

        if accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::Duplicate("email".to_string()));
        }
        if accounts.iter().any(|a| a.phone == account.phone) {
            return Err(StoreError::Duplicate("phone".to_string()));
        }
        if accounts.iter().any(|a| a.account_id == account.account_id) {
            return Err(StoreError::Duplicate("account_id".to_string()));
        }

        accounts.push(account.clone());
        Ok(())
    }

    async fn find_one(&self, filter: &AccountFilter) -> StoreResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| filter.matches(a)).cloned())
    }

    async fn update_tokens(
        &self,
        account_id: &str,
        tokens: &SessionTokens,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .iter_mut()
            .find(|a| a.account_id == account_id)
            .ok_or_else(|| StoreError::NotFound(account_id.to_string()))?;

        account.token = Some(tokens.token.clone());
        account.refresh_token = Some(tokens.refresh_token.clone());
        account.updated_at = now;
        Ok(())
    }

    async fn rotate_tokens(
        &self,
        account_id: &str,
        expected_refresh_token: &str,
        tokens: &SessionTokens,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        // 쓰기 잠금 안에서 비교 후 교체
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .iter_mut()
            .find(|a| {
                a.account_id == account_id
                    && a.refresh_token.as_deref() == Some(expected_refresh_token)
            })
            .ok_or_else(|| StoreError::Superseded(account_id.to_string()))?;

        account.token = Some(tokens.token.clone());
        account.refresh_token = Some(tokens.refresh_token.clone());
        account.updated_at = now;
        Ok(())
    }

    async fn list_page(&self, skip: u64, limit: u64) -> StoreResult<AccountPage> {
        let accounts = self.accounts.read().await;

        let mut ordered: Vec<&Account> = accounts.iter().collect();
        ordered.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });

        let items = ordered
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(AccountPage {
            total_count: accounts.len() as u64,
            items,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
