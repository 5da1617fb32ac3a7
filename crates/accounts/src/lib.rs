//! Advertiser account records for the lead exporter.
//!
//! This crate keeps the operator's advertiser accounts (app credentials,
//! tokens and discovered pages) in a flat JSON document and resolves the
//! tokens needed for each Graph request.
//!
//! # Example
//!
//! ```no_run
//! use accounts::{AccountStore, StoreMode, TokenContextResolver};
//!
//! # async fn example() -> accounts::Result<()> {
//! let store = AccountStore::open("accounts.json", StoreMode::Persistent);
//! let resolver = TokenContextResolver::new(store);
//!
//! let ctx = resolver.resolve().await?;
//! println!("page {} selected", ctx.page_id);
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod models;
pub mod store;

pub use context::{TokenContext, TokenContextResolver, TokenUpdate, LONG_LIVED_TOKEN_DAYS};
pub use error::{Result, StoreError};
pub use models::{Account, AccountSummary, AccountsDocument, TokenPatch};
pub use store::{AccountStore, StoreMode, DEFAULT_ACCOUNTS_PATH};
