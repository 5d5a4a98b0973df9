use serde::{Deserialize, Serialize};

/// Display name of a material as it appears on the wiki and in the reference table.
pub type ItemName = String;

/// One scraped (item, quantity text) pair, exactly as the page shows it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItemEntry {
    pub name: ItemName,
    pub quantity: String,
}

impl RawItemEntry {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
        }
    }
}

/// What an item source hands back for one operator page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchedItems {
    pub entries: Vec<RawItemEntry>,
    /// Served from an expired cache entry because the live fetch failed.
    pub from_stale_cache: bool,
}

impl FetchedItems {
    pub fn fresh(entries: Vec<RawItemEntry>) -> Self {
        Self {
            entries,
            from_stale_cache: false,
        }
    }

    pub fn stale(entries: Vec<RawItemEntry>) -> Self {
        Self {
            entries,
            from_stale_cache: true,
        }
    }
}

/// An entry whose name resolved and whose quantity parsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedItemCost {
    pub name: ItemName,
    pub cost: f64,
}

impl ResolvedItemCost {
    pub fn new(name: impl Into<String>, cost: f64) -> Self {
        Self {
            name: name.into(),
            cost,
        }
    }
}

/// Why a scraped entry was left out of an operator's total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Name has no row in the reference table.
    UnresolvedName,
    /// Quantity text could not be turned into a count.
    UnparsableQuantity(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub entity: String,
    pub item: ItemName,
    pub quantity: String,
    pub reason: SkipReason,
}

/// Final tally for one operator occurrence on the roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityResult {
    pub name: String,
    pub tier_index: usize,
    pub total_cost: f64,
    /// Number of item entries that contributed to `total_cost`.
    pub resolved_items: usize,
    #[serde(default)]
    pub from_stale_cache: bool,
}

/// An operator whose item list could not be fetched.
/// It is kept out of `RosterReport::entries` and the grand total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFailure {
    pub entity: String,
    pub tier_index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterReport {
    /// Roster traversal order.
    pub entries: Vec<EntityResult>,
    pub grand_total: f64,
    pub skipped: Vec<SkippedEntry>,
    pub failures: Vec<EntityFailure>,
}

impl RosterReport {
    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }

    /// Appends one operator and folds its cost into the running total.
    pub fn record(&mut self, entry: EntityResult) {
        self.grand_total += entry.total_cost;
        self.entries.push(entry);
    }

    /// Entries priced from an expired cached item list.
    pub fn stale_entries(&self) -> impl Iterator<Item = &EntityResult> {
        self.entries.iter().filter(|entry| entry.from_stale_cache)
    }

    pub fn record_failure(&mut self, failure: EntityFailure) {
        self.failures.push(failure);
    }

    pub fn extend_skipped(&mut self, skipped: impl IntoIterator<Item = SkippedEntry>) {
        self.skipped.extend(skipped);
    }
}
