use std::collections::BTreeSet;

use clustering::LocationPoint;

/// Category selection plus free-text search over the location set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilter {
    pub category: Option<String>,
    /// Case-insensitive substring matched against name and category.
    pub search: String,
}

impl LocationFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.search.trim().is_empty()
    }

    pub fn matches(&self, point: &LocationPoint) -> bool {
        if let Some(category) = &self.category {
            if point.category != *category {
                return false;
            }
        }
        let query = self.search.trim().to_lowercase();
        query.is_empty()
            || point.name.to_lowercase().contains(&query)
            || point.category.to_lowercase().contains(&query)
    }

    /// Matching points, input order preserved.
    pub fn apply(&self, points: &[LocationPoint]) -> Vec<LocationPoint> {
        points.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}

/// Distinct categories, sorted.
pub fn categories(points: &[LocationPoint]) -> Vec<String> {
    points
        .iter()
        .map(|p| p.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
