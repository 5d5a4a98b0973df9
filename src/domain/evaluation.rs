use tracing::warn;

use super::entities::{RawItemEntry, ResolvedItemCost, SkipReason, SkippedEntry};
use super::quantity::parse_quantity;
use super::reference::ReferenceTable;

/// Costed entries for one operator plus everything that had to be dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemAggregation {
    pub items: Vec<ResolvedItemCost>,
    pub skipped: Vec<SkippedEntry>,
}

/// Prices every scraped entry of `entity` against the reference table.
///
/// Unknown names and unparsable quantities are logged and recorded in
/// `skipped`; they never abort the batch. Repeated item names are costed
/// independently and kept in input order.
pub fn aggregate_item_costs(
    entity: &str,
    entries: &[RawItemEntry],
    table: &ReferenceTable,
) -> ItemAggregation {
    let mut items = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();

    for entry in entries {
        let Some(unit_cost) = table.resolve(&entry.name) else {
            warn!(entity, item = %entry.name, "no reference cost for item");
            skipped.push(skip(entity, entry, SkipReason::UnresolvedName));
            continue;
        };

        let quantity = match parse_quantity(&entry.quantity) {
            Ok(quantity) => quantity,
            Err(error) => {
                warn!(entity, item = %entry.name, "{error}");
                skipped.push(skip(
                    entity,
                    entry,
                    SkipReason::UnparsableQuantity(error.to_string()),
                ));
                continue;
            }
        };

        items.push(ResolvedItemCost::new(
            entry.name.clone(),
            unit_cost * quantity as f64,
        ));
    }

    ItemAggregation { items, skipped }
}

fn skip(entity: &str, entry: &RawItemEntry, reason: SkipReason) -> SkippedEntry {
    SkippedEntry {
        entity: entity.to_string(),
        item: entry.name.clone(),
        quantity: entry.quantity.clone(),
        reason,
    }
}

/// Baseline plus the left-to-right sum of item costs.
pub fn evaluate_entity(baseline: f64, items: &[ResolvedItemCost]) -> f64 {
    items.iter().fold(baseline, |total, item| total + item.cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ReferenceTable {
        ReferenceTable::from_rows([("A", 1.0), ("B", 2.0), ("芯片", 0.5)]).unwrap()
    }

    #[test]
    fn costs_resolved_entries_in_order() {
        let entries = [RawItemEntry::new("A", "2"), RawItemEntry::new("B", "1w")];
        let aggregation = aggregate_item_costs("X", &entries, &table());

        assert_eq!(
            aggregation.items,
            vec![
                ResolvedItemCost::new("A", 2.0),
                ResolvedItemCost::new("B", 20_000.0),
            ]
        );
        assert!(aggregation.skipped.is_empty());
    }

    #[test]
    fn unresolved_names_are_skipped_with_diagnostic() {
        let entries = [
            RawItemEntry::new("A", "2"),
            RawItemEntry::new("Missing", "5"),
            RawItemEntry::new("B", "3"),
        ];
        let aggregation = aggregate_item_costs("X", &entries, &table());

        assert_eq!(aggregation.items.len(), 2);
        assert_eq!(aggregation.skipped.len(), 1);
        let skipped = &aggregation.skipped[0];
        assert_eq!(skipped.entity, "X");
        assert_eq!(skipped.item, "Missing");
        assert_eq!(skipped.reason, SkipReason::UnresolvedName);
    }

    #[test]
    fn unparsable_quantities_are_skipped_with_diagnostic() {
        let entries = [RawItemEntry::new("A", "lots"), RawItemEntry::new("B", "4")];
        let aggregation = aggregate_item_costs("X", &entries, &table());

        assert_eq!(aggregation.items, vec![ResolvedItemCost::new("B", 8.0)]);
        assert_eq!(aggregation.skipped[0].quantity, "lots");
        assert!(matches!(
            aggregation.skipped[0].reason,
            SkipReason::UnparsableQuantity(ref msg) if msg.contains("lots")
        ));
    }

    #[test]
    fn lookup_happens_before_quantity_parse() {
        let entries = [RawItemEntry::new("Missing", "garbage")];
        let aggregation = aggregate_item_costs("X", &entries, &table());
        assert_eq!(aggregation.skipped[0].reason, SkipReason::UnresolvedName);
    }

    #[test]
    fn duplicate_items_are_not_merged() {
        let entries = [RawItemEntry::new("芯片", "3"), RawItemEntry::new("芯片", "5")];
        let aggregation = aggregate_item_costs("X", &entries, &table());

        assert_eq!(
            aggregation.items,
            vec![
                ResolvedItemCost::new("芯片", 1.5),
                ResolvedItemCost::new("芯片", 2.5),
            ]
        );
    }

    #[test]
    fn baseline_only_when_no_items() {
        assert_eq!(evaluate_entity(100.0, &[]), 100.0);
    }

    #[test]
    fn sum_is_order_independent() {
        let forward = [ResolvedItemCost::new("A", 50.0), ResolvedItemCost::new("B", 25.0)];
        let backward = [ResolvedItemCost::new("B", 25.0), ResolvedItemCost::new("A", 50.0)];

        assert_eq!(evaluate_entity(100.0, &forward), 175.0);
        assert_eq!(evaluate_entity(100.0, &backward), 175.0);
    }
}
