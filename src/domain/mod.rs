//! Cost normalization and aggregation lives here.

pub mod aggregator;
pub mod entities;
pub mod error;
pub mod evaluation;
pub mod quantity;
pub mod reference;
pub mod roster;

#[allow(unused_imports)]
pub use aggregator::{run_roster, FetchError, ItemSource, RunOptions};
#[allow(unused_imports)]
pub use entities::{
    EntityFailure, EntityResult, FetchedItems, ItemName, RawItemEntry, ResolvedItemCost, RosterReport,
    SkipReason, SkippedEntry,
};
pub use error::ConfigurationError;
#[allow(unused_imports)]
pub use evaluation::{aggregate_item_costs, evaluate_entity, ItemAggregation};
#[allow(unused_imports)]
pub use quantity::{parse_quantity, QuantityFormatError};
pub use reference::ReferenceTable;
#[allow(unused_imports)]
pub use roster::{Roster, Tier};
