//! Paginated lead retrieval.

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::GraphClient;
use crate::error::GraphError;
use crate::mask_token;
use crate::retry::RetryPolicy;
use crate::types::{Lead, ListResponse};
use crate::window::{QueryRange, TimeFilter, WindowCalculator};

/// Fields requested for every lead.
pub const LEAD_FIELDS: &str = "id,created_time,field_data";

/// Tokens shorter than this are rejected without calling the API.
pub const MIN_TOKEN_LEN: usize = 20;

/// Default cap on the number of leads returned.
pub const DEFAULT_MAX_LEADS: usize = 1000;

/// Tuning for [`LeadFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// `limit` sent with the first request.
    pub page_size: u32,
    /// Pause after every this many pages (0 disables).
    pub throttle_every: usize,
    /// Length of the pause.
    pub throttle_delay: Duration,
    /// Retry behavior for failed page requests.
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            throttle_every: 10,
            throttle_delay: Duration::from_millis(500),
            retry: RetryPolicy::None,
        }
    }
}

impl FetchOptions {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_throttle(mut self, every: usize, delay: Duration) -> Self {
        self.throttle_every = every;
        self.throttle_delay = delay;
        self
    }
}

/// Which leads to fetch.
#[derive(Debug, Clone)]
pub struct LeadQuery {
    pub filter: TimeFilter,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub max_leads: usize,
}

impl LeadQuery {
    pub fn new(filter: TimeFilter) -> Self {
        Self {
            filter,
            start_date: None,
            end_date: None,
            max_leads: DEFAULT_MAX_LEADS,
        }
    }

    /// Set explicit custom bounds (`YYYY-MM-DD`).
    pub fn with_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }

    pub fn with_max_leads(mut self, max_leads: usize) -> Self {
        self.max_leads = max_leads;
        self
    }
}

/// Result of a fetch.
#[derive(Debug, Clone, Default)]
pub struct LeadBatch {
    /// Leads in fetch order, at most the requested cap.
    pub leads: Vec<Lead>,
    /// Cursor to resume from when the cap stopped pagination.
    pub next: Option<String>,
}

impl LeadBatch {
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }
}

/// Reject missing or implausibly short tokens.
pub fn validate_token(token: &str) -> Result<(), GraphError> {
    if token.len() < MIN_TOKEN_LEN {
        return Err(GraphError::InvalidToken);
    }
    Ok(())
}

/// Drives the cursor-paginated leads endpoint.
#[derive(Debug, Clone)]
pub struct LeadFetcher<Tz: TimeZone = Local> {
    client: GraphClient,
    calculator: WindowCalculator<Tz>,
    options: FetchOptions,
    cancel: Option<CancellationToken>,
}

impl LeadFetcher<Local> {
    /// Fetcher using the server's local timezone for query dates.
    pub fn new(client: GraphClient) -> Self {
        Self::with_calculator(client, WindowCalculator::new())
    }
}

impl<Tz: TimeZone> LeadFetcher<Tz> {
    pub fn with_calculator(client: GraphClient, calculator: WindowCalculator<Tz>) -> Self {
        Self {
            client,
            calculator,
            options: FetchOptions::default(),
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Abort pauses (throttle and retry backoff) when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn calculator(&self) -> &WindowCalculator<Tz> {
        &self.calculator
    }

    /// Fetch the leads of `form_id` matching `query`, as of now.
    pub async fn fetch_all(
        &self,
        form_id: &str,
        token: &str,
        query: &LeadQuery,
    ) -> Result<LeadBatch, GraphError> {
        self.fetch_all_at(form_id, token, query, Utc::now()).await
    }

    /// Fetch with an explicit clock.
    pub async fn fetch_all_at(
        &self,
        form_id: &str,
        token: &str,
        query: &LeadQuery,
        now: DateTime<Utc>,
    ) -> Result<LeadBatch, GraphError> {
        validate_token(token)?;
        let range = self.range_for(query, now)?;
        self.fetch_range(form_id, token, &range, query.max_leads).await
    }

    /// Compute the `since`/`until` values for `query`.
    pub fn range_for(
        &self,
        query: &LeadQuery,
        now: DateTime<Utc>,
    ) -> Result<QueryRange, GraphError> {
        let window = self
            .calculator
            .compute(
                query.filter,
                query.start_date.as_deref(),
                query.end_date.as_deref(),
                now,
            )
            .map_err(|err| GraphError::InvalidInput(err.to_string()))?;
        Ok(self.calculator.query_range(query.filter, window.as_ref()))
    }

    /// Fetch pages until the cursor runs out or `max_leads` is reached.
    pub async fn fetch_range(
        &self,
        form_id: &str,
        token: &str,
        range: &QueryRange,
        max_leads: usize,
    ) -> Result<LeadBatch, GraphError> {
        validate_token(token)?;
        if form_id.trim().is_empty() {
            return Err(GraphError::InvalidInput("formId is required".to_string()));
        }

        let url = self.client.config().leads_url(form_id);
        let mut params = vec![
            ("access_token".to_string(), token.to_string()),
            ("fields".to_string(), LEAD_FIELDS.to_string()),
            ("limit".to_string(), self.options.page_size.to_string()),
        ];
        params.extend(range.to_params());

        info!(
            form_id,
            since = ?range.since,
            until = ?range.until,
            max_leads,
            token = %mask_token(token),
            "Fetching leads"
        );

        let result = self.paginate(&url, &params, max_leads).await;
        if let Err(err) = &result {
            error!(form_id, error = %err, "Error fetching leads");
        }
        result
    }

    async fn paginate(
        &self,
        url: &str,
        params: &[(String, String)],
        max_leads: usize,
    ) -> Result<LeadBatch, GraphError> {
        let first = self.get_page(url, params).await?;
        let mut next = first.next_cursor();
        let mut leads = first.data;
        let mut pages = 1usize;

        while let Some(cursor) = next.clone() {
            if leads.len() >= max_leads {
                break;
            }

            debug!(page = pages + 1, "Fetching next page of leads");
            let page = self.get_page(&cursor, &[]).await?;
            next = page.next_cursor();
            leads.extend(page.data);

            if leads.len() >= max_leads {
                info!(max_leads, "Reached maximum lead limit, stopping pagination");
                break;
            }

            pages += 1;
            if self.options.throttle_every > 0 && pages % self.options.throttle_every == 0 {
                debug!(pages, "Throttling before next page");
                self.pause(self.options.throttle_delay).await?;
            }
        }

        info!(total = leads.len(), pages, "Fetched leads");

        if leads.len() > max_leads {
            debug!(max_leads, "Truncating leads");
            leads.truncate(max_leads);
        }

        Ok(LeadBatch { leads, next })
    }

    async fn get_page(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<ListResponse<Lead>, GraphError> {
        let mut attempt = 0u32;
        loop {
            match self.client.get::<ListResponse<Lead>>(url, params).await {
                Ok(page) => return Ok(page),
                Err(err) => {
                    attempt += 1;
                    match self.options.retry.delay_for(attempt, &err) {
                        Some(delay) => {
                            warn!(attempt, ?delay, error = %err, "Retrying lead page");
                            self.pause(delay).await?;
                        }
                        None => return Err(err),
                    }
                }
            }
        }
    }

    async fn pause(&self, delay: Duration) -> Result<(), GraphError> {
        match &self.cancel {
            Some(cancel) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(GraphError::Cancelled),
                    _ = tokio::time::sleep(delay) => Ok(()),
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}
