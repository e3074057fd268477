use std::collections::HashSet;

use datawagon::normalize::{normalize_column_name, normalize_column_names};
use proptest::prelude::*;

#[test]
fn report_headers_normalize_to_warehouse_identifiers() {
    let header = [
        "Asset ID",
        "Partner Revenue (USD)",
        "Is Claimed?",
        "Time: UTC",
        "Asset ID",
        "asset_id",
    ];
    assert_eq!(
        normalize_column_names(&header),
        vec![
            "asset_id",
            "partner_revenue__usd",
            "is_claimed",
            "time_utc",
            "asset_id_1",
            "asset_id_2",
        ]
    );
}

proptest! {
    #[test]
    fn normalized_headers_stay_unique_and_aligned(
        names in prop::collection::vec("[A-Za-z0-9 .()?:/-]{0,12}", 0..24)
    ) {
        let normalized = normalize_column_names(&names);
        prop_assert_eq!(normalized.len(), names.len());
        let distinct: HashSet<&String> = normalized.iter().collect();
        prop_assert_eq!(distinct.len(), normalized.len());
    }

    #[test]
    fn normalized_names_use_identifier_characters(name in "[A-Za-z0-9 .()?:/-]{0,24}") {
        let normalized = normalize_column_name(&name);
        prop_assert!(
            normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
            "unexpected character in {:?}",
            normalized
        );
        prop_assert_eq!(normalize_column_name(&normalized), normalized.clone());
    }
}
