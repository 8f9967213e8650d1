//! Catalog statistics for the admin dashboard.

use std::collections::{BTreeMap, HashMap};

use chrono::Duration;
use serde::Serialize;

use crate::library::LibraryItem;
use crate::types::BroadcastDate;

/// Programs dated within this many days of today count as recent.
pub const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    /// Share of all programs, 0.0 - 100.0.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: BroadcastDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total_programs: usize,
    pub category_distribution: Vec<CategoryShare>,
    pub recent_uploads: Vec<DailyCount>,
}

/// Summarise the catalog as of `today`.
///
/// Categories are ordered by count descending, then by name. Recent uploads
/// are grouped per broadcast date, newest first.
pub fn catalog_stats<T: LibraryItem>(items: &[T], today: BroadcastDate) -> CatalogStats {
    let total = items.len();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.category()).or_default() += 1;
    }
    let mut category_distribution: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(category, count)| CategoryShare {
            category: category.to_string(),
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect();
    category_distribution.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
    });

    let since = today - Duration::days(RECENT_WINDOW_DAYS);
    let mut per_day: BTreeMap<BroadcastDate, usize> = BTreeMap::new();
    for item in items.iter().filter(|item| item.date() >= since) {
        *per_day.entry(item.date()).or_default() += 1;
    }
    let recent_uploads = per_day
        .into_iter()
        .rev()
        .map(|(date, count)| DailyCount { date, count })
        .collect();

    CatalogStats {
        total_programs: total,
        category_distribution,
        recent_uploads,
    }
}
