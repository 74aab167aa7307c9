// src/services/pipeline.rs
// DOCUMENTATION: Fetch-paginate-classify-export pipeline
// PURPOSE: Orchestrate one location query from first page to spreadsheet

use crate::errors::PlacesError;
use crate::models::{CategoryTable, PlaceRecord, SearchQuery};
use crate::services::{Exporter, PlacesClient, RetryPolicy, SearchPage, Sleeper};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

/// Run statistics
/// DOCUMENTATION: Tracks results of a single pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Location that was queried
    pub location: String,
    /// API calls attempted, retries included
    pub api_requests: u32,
    /// Searches run, one per place type filter
    pub searches: u32,
    /// Pages successfully retrieved
    pub pages_fetched: u32,
    /// Raw results received across all pages
    pub places_retrieved: u32,
    /// Unique records kept
    pub places_recorded: u32,
    /// Kept records with no MCC mapping
    pub places_uncategorized: u32,
    /// Results dropped because their place id was already seen
    pub duplicates_skipped: u32,
    /// Results dropped for lacking an id, a name or coordinates
    pub incomplete_skipped: u32,
    /// Retries after transient or quota failures
    pub retries: u32,
    /// Total run duration in milliseconds
    pub duration_ms: u64,
    /// Timestamp when the run started
    pub started_at: String,
    /// Timestamp when the run completed
    pub completed_at: Option<String>,
}

impl RunStats {
    /// Create new run statistics tracker
    pub fn new(location: String) -> Self {
        Self {
            location,
            api_requests: 0,
            searches: 0,
            pages_fetched: 0,
            places_retrieved: 0,
            places_recorded: 0,
            places_uncategorized: 0,
            duplicates_skipped: 0,
            incomplete_skipped: 0,
            retries: 0,
            duration_ms: 0,
            started_at: Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }

    /// Mark run as completed
    pub fn complete(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis() as u64;
        self.completed_at = Some(Utc::now().to_rfc3339());
    }
}

/// Operational bounds for a run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Upper bound on pages fetched per run
    pub max_pages: u32,
    /// Wait before following a next-page token
    pub page_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_pages: 3,
            page_delay: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

/// Records collected by one run, in first-seen order
#[derive(Debug)]
pub struct Collected {
    pub records: Vec<PlaceRecord>,
    pub stats: RunStats,
}

/// Pipeline for one location query
/// DOCUMENTATION: Drives paged retrieval through a PlacesClient, deduplicates by
/// place id, classifies through the CategoryTable and hands the result to an Exporter
pub struct Pipeline<'a, C: PlacesClient, S: Sleeper> {
    client: &'a C,
    categories: &'a CategoryTable,
    sleeper: S,
    settings: PipelineSettings,
}

impl<'a, C: PlacesClient, S: Sleeper> Pipeline<'a, C, S> {
    pub fn new(
        client: &'a C,
        categories: &'a CategoryTable,
        sleeper: S,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            client,
            categories,
            sleeper,
            settings,
        }
    }

    /// Run the full pipeline and write the spreadsheet
    /// DOCUMENTATION: Main entry point
    ///
    /// Process:
    /// 1. Validate the query
    /// 2. Fetch pages until no token is returned or max_pages is reached
    /// 3. Convert and deduplicate results
    /// 4. Export the collection
    ///
    /// Nothing is written when retrieval fails.
    ///
    /// # Returns
    /// RunStats with operation results
    pub async fn run<E: Exporter>(
        &self,
        query: &SearchQuery,
        exporter: &E,
        output: &Path,
    ) -> Result<RunStats, PlacesError> {
        let start_time = Instant::now();
        let Collected { records, mut stats } = self.collect(query).await?;

        if records.is_empty() {
            log::warn!("No places found for location: {}", query.location);
        }

        exporter.write(&records, output)?;
        stats.complete(start_time.elapsed());

        log::info!(
            "Run completed for {}: {} records ({} duplicates, {} incomplete) from {} pages in {}ms, written to {}",
            stats.location,
            stats.places_recorded,
            stats.duplicates_skipped,
            stats.incomplete_skipped,
            stats.pages_fetched,
            stats.duration_ms,
            output.display()
        );

        Ok(stats)
    }

    /// Retrieve and classify every page for the query
    /// DOCUMENTATION: Runs one paged search per place type filter (a single
    /// unfiltered search when there are none). Deduplication spans all searches.
    pub async fn collect(&self, query: &SearchQuery) -> Result<Collected, PlacesError> {
        let radius = query.checked_radius()?;
        let mut stats = RunStats::new(query.location.clone());
        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        log::info!(
            "Starting search for '{}' within {}m",
            query.location,
            radius
        );

        for place_type in query.searches() {
            stats.searches += 1;
            if let Some(place_type) = place_type {
                log::info!("Searching place type: {}", place_type);
            }

            let mut page_token: Option<String> = None;
            let mut pages = 0;

            loop {
                if page_token.is_some() {
                    self.sleeper.sleep(self.settings.page_delay).await;
                }

                let page = self
                    .fetch_page(
                        &query.location,
                        radius,
                        place_type,
                        page_token.as_deref(),
                        &mut stats,
                    )
                    .await?;

                pages += 1;
                stats.pages_fetched += 1;
                stats.places_retrieved += page.results.len() as u32;

                log::info!("Page {}: retrieved {} places", pages, page.results.len());

                for raw in &page.results {
                    let Some(record) = PlaceRecord::from_raw(raw, self.categories) else {
                        stats.incomplete_skipped += 1;
                        log::warn!(
                            "Skipping incomplete result (place_id={:?}, name={:?})",
                            raw.place_id,
                            raw.name
                        );
                        continue;
                    };

                    if !seen.insert(record.place_id().to_string()) {
                        stats.duplicates_skipped += 1;
                        log::debug!("Skipping duplicate place: {}", record.place_id());
                        continue;
                    }

                    if record.category_code().is_none() {
                        stats.places_uncategorized += 1;
                    }
                    records.push(record);
                }

                page_token = page.next_page_token;

                if page_token.is_none() {
                    break;
                }
                if pages >= self.settings.max_pages {
                    log::info!(
                        "Reached page limit ({}); remaining pages are not fetched",
                        self.settings.max_pages
                    );
                    break;
                }
            }
        }

        stats.places_recorded = records.len() as u32;
        Ok(Collected { records, stats })
    }

    /// Fetch one page, retrying transient and quota failures within the policy bounds
    async fn fetch_page(
        &self,
        location: &str,
        radius: u32,
        place_type: Option<&str>,
        page_token: Option<&str>,
        stats: &mut RunStats,
    ) -> Result<SearchPage, PlacesError> {
        let policy = &self.settings.retry;
        let mut transient_retries = 0;
        let mut quota_retries = 0;

        loop {
            stats.api_requests += 1;

            let err = match self
                .client
                .search(location, radius, place_type, page_token)
                .await
            {
                Ok(page) => return Ok(page),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            let delay = match err {
                PlacesError::Transient(message) => {
                    if transient_retries >= policy.max_retries {
                        log::error!(
                            "Giving up after {} attempts: {}",
                            transient_retries + 1,
                            message
                        );
                        return Err(PlacesError::Fetch {
                            attempts: transient_retries + 1,
                            message,
                        });
                    }
                    transient_retries += 1;
                    let delay = policy.backoff_for(transient_retries);
                    log::warn!(
                        "Transient failure ({}); retry {}/{} in {:?}",
                        message,
                        transient_retries,
                        policy.max_retries,
                        delay
                    );
                    delay
                }
                PlacesError::QuotaExceeded { retry_after } => {
                    if quota_retries >= policy.max_quota_retries {
                        log::error!("Rate limit persisted after {} retries", quota_retries);
                        return Err(PlacesError::QuotaExceeded { retry_after });
                    }
                    quota_retries += 1;
                    let delay = policy.quota_wait(retry_after);
                    log::warn!(
                        "Rate limited; retry {}/{} in {:?}",
                        quota_retries,
                        policy.max_quota_retries,
                        delay
                    );
                    delay
                }
                other => return Err(other),
            };

            stats.retries += 1;
            self.sleeper.sleep(delay).await;
        }
    }
}
