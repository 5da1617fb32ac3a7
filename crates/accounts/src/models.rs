//! Account document models.

use chrono::{DateTime, Utc};
use graph_client::Page;
use serde::{Deserialize, Deserializer, Serialize};

/// An advertiser account with its credentials and discovered pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
    #[serde(default)]
    pub short_lived_token: String,
    #[serde(default)]
    pub long_lived_token: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub long_lived_token_expiry: Option<DateTime<Utc>>,
    /// Pages in discovery order.
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Account {
    /// Look up a page by id.
    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == page_id)
    }

    /// Insert a page, or overwrite the one with the same id in place.
    ///
    /// Returns `true` when the page was new.
    pub fn upsert_page(&mut self, page: Page) -> bool {
        match self.pages.iter_mut().find(|existing| existing.id == page.id) {
            Some(existing) => {
                *existing = page;
                false
            }
            None => {
                self.pages.push(page);
                true
            }
        }
    }

    pub fn has_long_lived_token(&self) -> bool {
        !self.long_lived_token.is_empty()
    }

    /// Apply a token patch; absent fields are left alone.
    pub fn apply(&mut self, patch: TokenPatch) {
        if let Some(token) = patch.short_lived_token {
            self.short_lived_token = token;
        }
        if let Some(token) = patch.long_lived_token {
            self.long_lived_token = token;
        }
        if let Some(expiry) = patch.long_lived_token_expiry {
            self.long_lived_token_expiry = Some(expiry);
        }
    }
}

/// Partial token update for an account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenPatch {
    pub short_lived_token: Option<String>,
    pub long_lived_token: Option<String>,
    pub long_lived_token_expiry: Option<DateTime<Utc>>,
}

impl TokenPatch {
    /// Patch setting a long-lived token and its expiry.
    pub fn long_lived(token: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self {
            long_lived_token: Some(token.into()),
            long_lived_token_expiry: Some(expiry),
            ..Default::default()
        }
    }
}

/// The persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsDocument {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub current_account_id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl AccountsDocument {
    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn current(&self) -> Option<&Account> {
        self.account(&self.current_account_id)
    }

    /// Account list view for the operator.
    pub fn summaries(&self) -> Vec<AccountSummary> {
        self.accounts
            .iter()
            .map(|account| AccountSummary {
                id: account.id.clone(),
                name: account.name.clone(),
                pages_count: account.pages.len(),
                is_current: account.id == self.current_account_id,
            })
            .collect()
    }
}

/// Public view of an account, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub pages_count: usize,
    pub is_current: bool,
}

/// Accept RFC 3339 strings, treating empty or unparsable values as unset.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        DateTime::parse_from_rfc3339(&value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str, name: &str, token: &str) -> Page {
        Page {
            id: id.to_string(),
            name: name.to_string(),
            access_token: token.to_string(),
        }
    }

    #[test]
    fn test_upsert_page_preserves_position() {
        let mut account = Account::default();
        assert!(account.upsert_page(page("1", "First", "t1")));
        assert!(account.upsert_page(page("2", "Second", "t2")));
        assert!(!account.upsert_page(page("1", "Renamed", "t3")));

        assert_eq!(account.pages.len(), 2);
        assert_eq!(account.pages[0], page("1", "Renamed", "t3"));
        assert_eq!(account.pages[1].id, "2");
    }

    #[test]
    fn test_document_layout() {
        let json = r#"{
            "accounts": [{
                "id": "acct-1",
                "name": "Main",
                "appId": "app",
                "appSecret": "secret",
                "shortLivedToken": "short",
                "longLivedToken": "long",
                "longLivedTokenExpiry": "2024-03-01T00:00:00.000Z",
                "pages": [{"id": "p1", "name": "Page", "access_token": "pt"}]
            }],
            "currentAccountId": "acct-1",
            "lastUpdated": ""
        }"#;

        let doc: AccountsDocument = serde_json::from_str(json).unwrap();
        let account = doc.current().unwrap();
        assert_eq!(account.app_id, "app");
        assert_eq!(account.pages[0].access_token, "pt");
        assert!(account.long_lived_token_expiry.is_some());
        assert!(doc.last_updated.is_none());

        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(out["accounts"][0]["longLivedToken"], "long");
        assert_eq!(out["currentAccountId"], "acct-1");
    }

    #[test]
    fn test_summaries() {
        let doc = AccountsDocument {
            accounts: vec![
                Account {
                    id: "a".to_string(),
                    name: "A".to_string(),
                    pages: vec![page("1", "P", "t")],
                    ..Default::default()
                },
                Account {
                    id: "b".to_string(),
                    name: "B".to_string(),
                    ..Default::default()
                },
            ],
            current_account_id: "b".to_string(),
            last_updated: None,
        };

        let summaries = doc.summaries();
        assert_eq!(summaries[0].pages_count, 1);
        assert!(!summaries[0].is_current);
        assert!(summaries[1].is_current);

        let json = serde_json::to_value(&summaries[1]).unwrap();
        assert_eq!(json["pagesCount"], 0);
        assert_eq!(json["isCurrent"], true);
    }

    #[test]
    fn test_apply_patch() {
        let mut account = Account {
            short_lived_token: "short".to_string(),
            ..Default::default()
        };
        let expiry = Utc::now();
        account.apply(TokenPatch::long_lived("long", expiry));

        assert_eq!(account.short_lived_token, "short");
        assert_eq!(account.long_lived_token, "long");
        assert_eq!(account.long_lived_token_expiry, Some(expiry));
    }
}
