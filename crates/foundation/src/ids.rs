use serde::{Deserialize, Serialize};

/// Identity of a location record, assigned by the data provider.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u64);

/// Identity of an aggregate produced by the cluster index.
///
/// Layout: `(origin_slot << 5) | origin_zoom`. `origin_zoom` is the tree level
/// one step finer than the zoom the aggregate was formed at, and
/// `origin_slot` is the position of the seed node inside that level. This is
/// enough to locate the aggregate's children without a side table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u64);

impl ClusterId {
    pub const ZOOM_BITS: u32 = 5;
    /// Largest origin zoom that fits in the id layout.
    pub const MAX_ORIGIN_ZOOM: u8 = (1 << Self::ZOOM_BITS) - 1;

    pub fn new(origin_slot: usize, origin_zoom: u8) -> Self {
        debug_assert!(origin_zoom <= Self::MAX_ORIGIN_ZOOM);
        ClusterId(((origin_slot as u64) << Self::ZOOM_BITS) | u64::from(origin_zoom))
    }

    pub fn origin_slot(self) -> usize {
        (self.0 >> Self::ZOOM_BITS) as usize
    }

    pub fn origin_zoom(self) -> u8 {
        (self.0 & u64::from(Self::MAX_ORIGIN_ZOOM)) as u8
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cluster#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::ClusterId;

    #[test]
    fn cluster_id_packs_slot_and_zoom() {
        let id = ClusterId::new(1234, 7);
        assert_eq!(id.origin_slot(), 1234);
        assert_eq!(id.origin_zoom(), 7);
        assert_eq!(id.0, (1234 << 5) | 7);
    }

    #[test]
    fn distinct_levels_never_collide() {
        assert_ne!(ClusterId::new(3, 1), ClusterId::new(3, 2));
        assert_ne!(ClusterId::new(0, 31), ClusterId::new(1, 0));
    }
}
