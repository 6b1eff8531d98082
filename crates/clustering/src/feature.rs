use std::collections::BTreeMap;

use foundation::camera::LngLat;
use foundation::ids::{ClusterId, LocationId};
use serde::{Deserialize, Serialize};

/// A single location visible at the queried zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    pub id: LocationId,
    pub category: String,
    pub longitude: f64,
    pub latitude: f64,
}

/// Two or more locations merged for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateFeature {
    pub cluster_id: ClusterId,
    pub point_count: usize,
    /// Short label such as `"845"`, `"1.2k"` or `"12k"`.
    pub point_count_abbreviated: String,
    /// Weighted centroid of the members.
    pub longitude: f64,
    pub latitude: f64,
    /// Member count per category, in category order.
    pub categories: BTreeMap<String, usize>,
}

/// One entry of a cluster query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClusterFeature {
    Point(PointFeature),
    Aggregate(AggregateFeature),
}

/// Stable identity of a feature across queries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureKey {
    Location(LocationId),
    Cluster(ClusterId),
}

impl ClusterFeature {
    pub fn key(&self) -> FeatureKey {
        match self {
            ClusterFeature::Point(p) => FeatureKey::Location(p.id),
            ClusterFeature::Aggregate(a) => FeatureKey::Cluster(a.cluster_id),
        }
    }

    pub fn position(&self) -> LngLat {
        match self {
            ClusterFeature::Point(p) => LngLat::new(p.longitude, p.latitude),
            ClusterFeature::Aggregate(a) => LngLat::new(a.longitude, a.latitude),
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            ClusterFeature::Point(_) => 1,
            ClusterFeature::Aggregate(a) => a.point_count,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, ClusterFeature::Aggregate(_))
    }

    pub fn as_point(&self) -> Option<&PointFeature> {
        match self {
            ClusterFeature::Point(p) => Some(p),
            ClusterFeature::Aggregate(_) => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&AggregateFeature> {
        match self {
            ClusterFeature::Aggregate(a) => Some(a),
            ClusterFeature::Point(_) => None,
        }
    }
}

pub fn abbreviate_count(count: usize) -> String {
    if count >= 10_000 {
        format!("{}k", (count as f64 / 1000.0).round())
    } else if count >= 1000 {
        format!("{}k", (count as f64 / 100.0).round() / 10.0)
    } else {
        count.to_string()
    }
}
