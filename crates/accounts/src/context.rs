//! Token context resolution.
//!
//! The resolver combines the current account record with a session-scoped
//! token cache. The cache holds values the operator selected during the
//! session (chosen page, manually obtained tokens) that may not be in the
//! record yet; the record stays the source of truth where it has data.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use graph_client::Page;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::Result;
use crate::models::TokenPatch;
use crate::store::AccountStore;

/// Lifetime assumed for a freshly exchanged long-lived token.
pub const LONG_LIVED_TOKEN_DAYS: i64 = 60;

/// Tokens needed to authorize a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenContext {
    pub long_lived_token: String,
    pub page_token: String,
    pub page_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
}

/// Fields to merge into the token cache. `None` keeps the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUpdate {
    pub long_lived_token: Option<String>,
    pub page_token: Option<String>,
    pub page_id: Option<String>,
    pub page_index: Option<usize>,
}

impl TokenUpdate {
    pub fn long_lived(token: impl Into<String>) -> Self {
        Self {
            long_lived_token: Some(token.into()),
            ..Default::default()
        }
    }

    /// Update selecting a page.
    pub fn page(page: &Page, index: usize) -> Self {
        Self {
            page_token: Some(page.access_token.clone()),
            page_id: Some(page.id.clone()),
            page_index: Some(index),
            ..Default::default()
        }
    }

    pub fn with_long_lived(mut self, token: impl Into<String>) -> Self {
        self.long_lived_token = Some(token.into());
        self
    }
}

/// Resolves and persists [`TokenContext`]s.
#[derive(Debug, Clone)]
pub struct TokenContextResolver {
    store: AccountStore,
    cache: Arc<RwLock<TokenContext>>,
}

impl TokenContextResolver {
    /// Resolver with an empty cache.
    pub fn new(store: AccountStore) -> Self {
        Self::with_cache(store, TokenContext::default())
    }

    /// Resolver with a pre-populated cache.
    pub fn with_cache(store: AccountStore, cache: TokenContext) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Current cache contents, without consulting the store.
    pub async fn cached(&self) -> TokenContext {
        self.cache.read().await.clone()
    }

    /// Effective tokens for the current account.
    pub async fn resolve(&self) -> Result<TokenContext> {
        let cache = self.cached().await;

        let Some(account) = self.store.current().await? else {
            return Ok(cache);
        };
        if !account.has_long_lived_token() {
            return Ok(cache);
        }

        if let Some(index) = cache.page_index {
            if let Some(page) = account.pages.get(index) {
                return Ok(TokenContext {
                    long_lived_token: account.long_lived_token,
                    page_token: page.access_token.clone(),
                    page_id: page.id.clone(),
                    page_index: Some(index),
                });
            }
        }

        Ok(TokenContext {
            long_lived_token: account.long_lived_token,
            page_token: cache.page_token,
            page_id: cache.page_id,
            page_index: None,
        })
    }

    /// Merge `update` into the cache and propagate it to the current account.
    pub async fn persist(&self, update: TokenUpdate) -> Result<TokenContext> {
        self.persist_at(update, Utc::now()).await
    }

    /// [`persist`](Self::persist) with an explicit clock.
    ///
    /// The cache is updated first; a store failure leaves the cache ahead of
    /// the record.
    pub async fn persist_at(
        &self,
        update: TokenUpdate,
        now: DateTime<Utc>,
    ) -> Result<TokenContext> {
        let merged = {
            let mut cache = self.cache.write().await;
            info!(
                long_lived_token = change(&update.long_lived_token, &cache.long_lived_token),
                page_token = change(&update.page_token, &cache.page_token),
                page_id = update
                    .page_id
                    .as_deref()
                    .or(Some(cache.page_id.as_str()).filter(|id| !id.is_empty()))
                    .unwrap_or("[empty]"),
                page_index = ?update.page_index.or(cache.page_index),
                "Token cache updated"
            );

            if let Some(token) = &update.long_lived_token {
                cache.long_lived_token = token.clone();
            }
            if let Some(token) = &update.page_token {
                cache.page_token = token.clone();
            }
            if let Some(id) = &update.page_id {
                cache.page_id = id.clone();
            }
            if update.page_index.is_some() {
                cache.page_index = update.page_index;
            }
            cache.clone()
        };

        let Some(account) = self.store.current().await? else {
            return Ok(merged);
        };

        if let Some(token) = non_empty(&update.long_lived_token) {
            let expiry = now + Duration::days(LONG_LIVED_TOKEN_DAYS);
            self.store
                .update_tokens(&account.id, TokenPatch::long_lived(token, expiry))
                .await?;
        }

        if let (Some(token), Some(page_id)) =
            (non_empty(&update.page_token), non_empty(&update.page_id))
        {
            if let Some(existing) = account.page(page_id).filter(|p| p.access_token != token) {
                self.store
                    .update_page(
                        &account.id,
                        Page {
                            id: page_id.to_string(),
                            name: existing.name.clone(),
                            access_token: token.to_string(),
                        },
                    )
                    .await?;
            }
        }

        Ok(merged)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Log-safe description of a token change.
fn change(update: &Option<String>, previous: &str) -> &'static str {
    if non_empty(update).is_some() {
        "[updated]"
    } else if !previous.is_empty() {
        "[unchanged]"
    } else {
        "[empty]"
    }
}
