// Display-list filtering: free-text title query AND status category

use media_tracker_models::{Item, StatusCategory};

/// True when `item` passes both the title query and the status category.
/// A blank query matches everything; otherwise the query is matched as typed,
/// case-insensitively, anywhere in the title.
pub fn matches(item: &Item, query: &str, category: StatusCategory) -> bool {
    matches_query(item, query) && category.matches(item.status)
}

fn matches_query(item: &Item, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    item.title.to_lowercase().contains(&query.to_lowercase())
}

/// Items passing both predicates, in their original order
pub fn filter_items(items: &[Item], query: &str, category: StatusCategory) -> Vec<Item> {
    items
        .iter()
        .filter(|item| matches(item, query, category))
        .cloned()
        .collect()
}
