use foundation::camera::LngLat;
use foundation::ids::LocationId;
use serde::{Deserialize, Serialize};

/// Immutable location record supplied by the data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub id: LocationId,
    pub longitude: f64,
    pub latitude: f64,
    pub category: String,
    /// Display name; only used for search.
    #[serde(default)]
    pub name: String,
}

impl LocationPoint {
    pub fn new(id: u64, longitude: f64, latitude: f64, category: impl Into<String>) -> Self {
        Self {
            id: LocationId(id),
            longitude,
            latitude,
            category: category.into(),
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn position(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }
}
