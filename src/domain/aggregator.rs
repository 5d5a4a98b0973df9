//! Walks the roster, prices each operator and accumulates the report.

use std::{future::Future, time::Duration};

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::entities::{EntityFailure, EntityResult, FetchedItems, RosterReport};
use super::error::ConfigurationError;
use super::evaluation::{aggregate_item_costs, evaluate_entity};
use super::reference::ReferenceTable;
use super::roster::Roster;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("invalid page URL: {0}")]
    InvalidUrl(String),
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Supplies the scraped item list for one operator.
pub trait ItemSource {
    fn fetch_items(
        &self,
        entity: &str,
    ) -> impl Future<Output = Result<FetchedItems, FetchError>> + Send;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    /// Maximum fetches in flight. Results are still committed in roster order.
    pub concurrency: usize,
    /// A fetch exceeding this is handled like any other fetch failure.
    pub fetch_timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            fetch_timeout: Some(Duration::from_secs(30)),
        }
    }
}

struct Job<'a> {
    entity: &'a str,
    tier_index: usize,
    baseline: f64,
}

/// Produces one `EntityResult` per roster occurrence, in roster order.
///
/// Configuration problems abort before anything is fetched. An operator
/// whose fetch fails goes to `failures` and is left out of the grand total;
/// the remaining operators are still processed.
pub async fn run_roster<S>(
    roster: &Roster,
    table: &ReferenceTable,
    source: &S,
    options: &RunOptions,
) -> Result<RosterReport, ConfigurationError>
where
    S: ItemSource + Sync,
{
    roster.validate()?;

    let mut jobs = Vec::with_capacity(roster.entity_count());
    for (tier_index, tier) in roster.tiers.iter().enumerate() {
        let baseline = roster
            .baseline(tier_index)
            .ok_or(ConfigurationError::MissingBaseline(tier_index))?;
        debug!(tier = %tier.label, baseline, operators = tier.entities.len(), "queued tier");
        jobs.extend(tier.entities.iter().map(|entity| Job {
            entity: entity.as_str(),
            tier_index,
            baseline,
        }));
    }

    let total = jobs.len();
    let timeout = options.fetch_timeout;
    // `buffered` yields in submission order regardless of completion order.
    let mut fetches = stream::iter(jobs)
        .map(|job| async move {
            let fetched = fetch_entity(source, job.entity, timeout).await;
            (job, fetched)
        })
        .buffered(options.concurrency.max(1));

    let mut report = RosterReport::default();
    let mut position = 0_usize;
    while let Some((job, fetched)) = fetches.next().await {
        position += 1;
        match fetched {
            Ok(fetched) => {
                if fetched.from_stale_cache {
                    warn!(entity = job.entity, "[{position}/{total}] priced from stale cache");
                }
                let aggregation = aggregate_item_costs(job.entity, &fetched.entries, table);
                let total_cost = evaluate_entity(job.baseline, &aggregation.items);
                info!(
                    entity = job.entity,
                    total_cost,
                    skipped = aggregation.skipped.len(),
                    "[{position}/{total}] priced operator"
                );
                report.record(EntityResult {
                    name: job.entity.to_string(),
                    tier_index: job.tier_index,
                    total_cost,
                    resolved_items: aggregation.items.len(),
                    from_stale_cache: fetched.from_stale_cache,
                });
                report.extend_skipped(aggregation.skipped);
            }
            Err(error) => {
                warn!(entity = job.entity, "[{position}/{total}] fetch failed: {error}");
                report.record_failure(EntityFailure {
                    entity: job.entity.to_string(),
                    tier_index: job.tier_index,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(report)
}

async fn fetch_entity<S: ItemSource>(
    source: &S,
    entity: &str,
    timeout: Option<Duration>,
) -> Result<FetchedItems, FetchError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, source.fetch_items(entity))
            .await
            .unwrap_or(Err(FetchError::Timeout(limit))),
        None => source.fetch_items(entity).await,
    }
}
