//! Application state shared across handlers.

use accounts::{AccountStore, TokenContext, TokenContextResolver};
use graph_client::{FetchOptions, GraphClient, LeadFetcher, WindowCalculator};
use lead_export::LeadExporter;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Token cache plus account records.
    pub resolver: TokenContextResolver,
    /// Graph client for token, page and form calls.
    pub graph: GraphClient,
    /// Lead pagination driver.
    pub fetcher: LeadFetcher,
    pub exporter: LeadExporter,
}

impl AppState {
    /// Create new application state.
    pub fn new(resolver: TokenContextResolver, graph: GraphClient, fetcher: LeadFetcher) -> Self {
        Self {
            resolver,
            graph,
            fetcher,
            exporter: LeadExporter::new(),
        }
    }

    /// Build state from configuration.
    ///
    /// Pauses inside lead fetches abort once `shutdown` is cancelled.
    pub fn from_config(
        config: &Config,
        graph: GraphClient,
        shutdown: CancellationToken,
    ) -> Self {
        let store = AccountStore::open(config.accounts_path.clone(), config.store_mode);
        let seed = TokenContext {
            page_token: config.page_token.clone().unwrap_or_default(),
            page_id: config.page_id.clone().unwrap_or_default(),
            ..Default::default()
        };
        let resolver = TokenContextResolver::with_cache(store, seed);

        let calculator = WindowCalculator::new().with_policy(config.range_policy);
        let fetcher = LeadFetcher::with_calculator(graph.clone(), calculator)
            .with_options(FetchOptions::default().with_retry(config.retry))
            .with_cancellation(shutdown);

        Self::new(resolver, graph, fetcher)
    }

    pub fn store(&self) -> &AccountStore {
        self.resolver.store()
    }
}
