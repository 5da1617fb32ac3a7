//! JSON-document account store.
//!
//! The whole document is read, modified and written back on every mutation.
//! A store-wide async mutex serializes these read-modify-write cycles, so
//! concurrent requests in one process never interleave their writes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use graph_client::Page;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::models::{Account, AccountSummary, AccountsDocument, TokenPatch};

/// Default document file name.
pub const DEFAULT_ACCOUNTS_PATH: &str = "accounts.json";

/// Where the document lives between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreMode {
    /// Read from and write to the file on every operation.
    #[default]
    Persistent,
    /// Read the file once, then keep the document in memory only.
    Ephemeral,
}

/// Account record store.
#[derive(Debug, Clone)]
pub struct AccountStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    mode: StoreMode,
    cache: Mutex<Option<AccountsDocument>>,
}

impl AccountStore {
    /// Open a store backed by the file at `path`.
    ///
    /// The file does not need to exist; a missing file reads as an empty document.
    pub fn open(path: impl Into<PathBuf>, mode: StoreMode) -> Self {
        let path = path.into();
        info!(path = %path.display(), ?mode, "Opened account store");
        Self {
            inner: Arc::new(Inner {
                path,
                mode,
                cache: Mutex::new(None),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn mode(&self) -> StoreMode {
        self.inner.mode
    }

    /// Snapshot of the whole document.
    pub async fn document(&self) -> Result<AccountsDocument> {
        let mut cache = self.inner.cache.lock().await;
        self.load(&mut cache).await
    }

    /// The current account.
    ///
    /// When no current account is set, the first account becomes current and
    /// the choice is saved.
    pub async fn current(&self) -> Result<Option<Account>> {
        let mut cache = self.inner.cache.lock().await;
        let mut doc = self.load(&mut cache).await?;

        if doc.current_account_id.is_empty() {
            if let Some(first) = doc.accounts.first() {
                doc.current_account_id = first.id.clone();
                debug!(account_id = %doc.current_account_id, "Defaulting current account");
                self.save(&mut cache, &doc).await?;
            }
        }

        Ok(doc.current().cloned())
    }

    /// Look up an account by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Account>> {
        let doc = self.document().await?;
        Ok(doc.account(id).cloned())
    }

    /// Make `id` the current account. Returns `false` if it does not exist.
    pub async fn set_current(&self, id: &str) -> Result<bool> {
        let mut cache = self.inner.cache.lock().await;
        let mut doc = self.load(&mut cache).await?;

        if doc.account(id).is_none() {
            return Ok(false);
        }

        doc.current_account_id = id.to_string();
        self.save(&mut cache, &doc).await?;
        info!(account_id = id, "Switched current account");
        Ok(true)
    }

    /// Merge token fields into an account.
    pub async fn update_tokens(&self, id: &str, patch: TokenPatch) -> Result<Option<Account>> {
        self.modify(id, |account| account.apply(patch)).await
    }

    /// Add a page to an account, or overwrite the page with the same id.
    pub async fn update_page(&self, id: &str, page: Page) -> Result<Option<Account>> {
        self.modify(id, |account| {
            let page_id = page.id.clone();
            if account.upsert_page(page) {
                debug!(page_id = %page_id, "Added page");
            }
        })
        .await
    }

    /// Account list view plus the current account id.
    pub async fn summaries(&self) -> Result<(Vec<AccountSummary>, String)> {
        let doc = self.document().await?;
        Ok((doc.summaries(), doc.current_account_id))
    }

    async fn modify<F>(&self, id: &str, apply: F) -> Result<Option<Account>>
    where
        F: FnOnce(&mut Account),
    {
        let mut cache = self.inner.cache.lock().await;
        let mut doc = self.load(&mut cache).await?;

        let Some(account) = doc.account_mut(id) else {
            return Ok(None);
        };
        apply(account);
        let updated = account.clone();

        doc.last_updated = Some(Utc::now());
        self.save(&mut cache, &doc).await?;
        Ok(Some(updated))
    }

    async fn load(&self, cache: &mut Option<AccountsDocument>) -> Result<AccountsDocument> {
        if self.inner.mode == StoreMode::Ephemeral {
            if let Some(doc) = cache.as_ref() {
                return Ok(doc.clone());
            }
        }

        let doc = match tokio::fs::read_to_string(&self.inner.path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => AccountsDocument::default(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.inner.path.clone(),
                    source,
                })
            }
        };

        if self.inner.mode == StoreMode::Ephemeral {
            *cache = Some(doc.clone());
        }
        Ok(doc)
    }

    async fn save(
        &self,
        cache: &mut Option<AccountsDocument>,
        doc: &AccountsDocument,
    ) -> Result<()> {
        if self.inner.mode == StoreMode::Ephemeral {
            *cache = Some(doc.clone());
            return Ok(());
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.inner.path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: self.inner.path.clone(),
            source,
        };
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.inner.path)
            .await
            .map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_doc() -> AccountsDocument {
        AccountsDocument {
            accounts: vec![
                Account {
                    id: "acct-1".to_string(),
                    name: "First".to_string(),
                    app_id: "app-1".to_string(),
                    app_secret: "secret-1".to_string(),
                    short_lived_token: "short-1".to_string(),
                    pages: vec![Page {
                        id: "page-1".to_string(),
                        name: "Page One".to_string(),
                        access_token: "page-token-1".to_string(),
                    }],
                    ..Default::default()
                },
                Account {
                    id: "acct-2".to_string(),
                    name: "Second".to_string(),
                    ..Default::default()
                },
            ],
            current_account_id: String::new(),
            last_updated: None,
        }
    }

    async fn store_with(doc: &AccountsDocument, mode: StoreMode) -> (TempDir, AccountStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        tokio::fs::write(&path, serde_json::to_string(doc).unwrap())
            .await
            .unwrap();
        (dir, AccountStore::open(path, mode))
    }

    async fn read_file(store: &AccountStore) -> AccountsDocument {
        let contents = tokio::fs::read_to_string(store.path()).await.unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::open(dir.path().join("nope.json"), StoreMode::Persistent);

        let doc = store.document().await.unwrap();
        assert!(doc.accounts.is_empty());
        assert!(store.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        tokio::fs::write(&path, "{not json").await.unwrap();
        let store = AccountStore::open(path, StoreMode::Persistent);

        assert!(matches!(store.document().await, Err(StoreError::Json(_))));
    }

    #[tokio::test]
    async fn test_current_defaults_to_first_and_persists() {
        let (_dir, store) = store_with(&sample_doc(), StoreMode::Persistent).await;

        let current = store.current().await.unwrap().unwrap();
        assert_eq!(current.id, "acct-1");
        assert_eq!(read_file(&store).await.current_account_id, "acct-1");
    }

    #[tokio::test]
    async fn test_set_current() {
        let (_dir, store) = store_with(&sample_doc(), StoreMode::Persistent).await;

        assert!(store.set_current("acct-2").await.unwrap());
        assert!(!store.set_current("missing").await.unwrap());

        assert_eq!(store.current().await.unwrap().unwrap().id, "acct-2");
        assert_eq!(read_file(&store).await.current_account_id, "acct-2");
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (_dir, store) = store_with(&sample_doc(), StoreMode::Persistent).await;

        assert_eq!(store.get_by_id("acct-2").await.unwrap().unwrap().name, "Second");
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_tokens_stamps_last_updated() {
        let (_dir, store) = store_with(&sample_doc(), StoreMode::Persistent).await;
        let expiry = Utc::now() + chrono::Duration::days(60);

        let updated = store
            .update_tokens("acct-1", TokenPatch::long_lived("long-token", expiry))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.long_lived_token, "long-token");

        let on_disk = read_file(&store).await;
        assert_eq!(on_disk.accounts[0].long_lived_token, "long-token");
        assert_eq!(on_disk.accounts[0].short_lived_token, "short-1");
        assert!(on_disk.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_update_unknown_account_is_none() {
        let (_dir, store) = store_with(&sample_doc(), StoreMode::Persistent).await;

        let result = store
            .update_tokens("missing", TokenPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(read_file(&store).await.last_updated.is_none());
    }

    #[tokio::test]
    async fn test_update_page_adds_and_overwrites() {
        let (_dir, store) = store_with(&sample_doc(), StoreMode::Persistent).await;

        store
            .update_page(
                "acct-1",
                Page {
                    id: "page-2".to_string(),
                    name: "Page Two".to_string(),
                    access_token: "page-token-2".to_string(),
                },
            )
            .await
            .unwrap();
        let account = store
            .update_page(
                "acct-1",
                Page {
                    id: "page-1".to_string(),
                    name: "Renamed".to_string(),
                    access_token: "fresh".to_string(),
                },
            )
            .await
            .unwrap()
            .unwrap();

        let ids: Vec<_> = account.pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["page-1", "page-2"]);
        assert_eq!(account.pages[0].access_token, "fresh");
        assert_eq!(read_file(&store).await.accounts[0].pages.len(), 2);
    }

    #[tokio::test]
    async fn test_ephemeral_mode_never_writes() {
        let (_dir, store) = store_with(&sample_doc(), StoreMode::Ephemeral).await;

        assert!(store.set_current("acct-2").await.unwrap());
        assert_eq!(store.current().await.unwrap().unwrap().id, "acct-2");

        // Changes live in memory only.
        assert_eq!(read_file(&store).await.current_account_id, "");
    }

    #[tokio::test]
    async fn test_summaries() {
        let (_dir, store) = store_with(&sample_doc(), StoreMode::Persistent).await;
        store.set_current("acct-1").await.unwrap();

        let (summaries, current) = store.summaries().await.unwrap();
        assert_eq!(current, "acct-1");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].pages_count, 1);
        assert!(summaries[0].is_current);
    }
}
