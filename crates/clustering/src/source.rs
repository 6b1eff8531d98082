use foundation::bounds::GeoBounds;
use foundation::ids::ClusterId;
use foundation::math::precision::canonical_f64;
use tracing::debug;

use crate::error::ClusterError;
use crate::feature::{ClusterFeature, PointFeature};
use crate::index::ClusterIndex;
use crate::options::ClusterOptions;
use crate::point::LocationPoint;
use crate::reading_order::ReadingOrder;

/// Owns the current [`ClusterIndex`] and rebuilds it when the input changes.
///
/// Queries before the first [`load`](Self::load) fail with
/// [`ClusterError::NotBuilt`].
#[derive(Debug, Clone)]
pub struct ClusterSource {
    options: ClusterOptions,
    index: Option<ClusterIndex>,
    fingerprint: Option<blake3::Hash>,
    generation: u64,
}

impl ClusterSource {
    pub fn new(options: ClusterOptions) -> Result<Self, ClusterError> {
        options.validate()?;
        Ok(Self {
            options,
            index: None,
            fingerprint: None,
            generation: 0,
        })
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Rebuilds the index if `points` differs from the last load.
    ///
    /// Returns `true` when a rebuild happened.
    pub fn load(&mut self, points: &[LocationPoint]) -> Result<bool, ClusterError> {
        let fingerprint = fingerprint(points);
        if self.index.is_some() && self.fingerprint == Some(fingerprint) {
            debug!(points = points.len(), "cluster input unchanged, keeping index");
            return Ok(false);
        }

        let index = ClusterIndex::build(points, self.options.clone())?;
        self.index = Some(index);
        self.fingerprint = Some(fingerprint);
        self.generation += 1;
        debug!(
            points = points.len(),
            generation = self.generation,
            fingerprint = %fingerprint.to_hex(),
            "rebuilt cluster index"
        );
        Ok(true)
    }

    /// Drops the index; later queries fail with `NotBuilt` until the next load.
    pub fn clear(&mut self) {
        self.index = None;
        self.fingerprint = None;
    }

    pub fn is_built(&self) -> bool {
        self.index.is_some()
    }

    /// Bumped on every rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> Result<&ClusterIndex, ClusterError> {
        self.index.as_ref().ok_or(ClusterError::NotBuilt)
    }

    pub fn query(&self, bbox: &GeoBounds, zoom: f64) -> Result<Vec<ClusterFeature>, ClusterError> {
        Ok(self.index()?.query(bbox, zoom))
    }

    pub fn query_ordered(
        &self,
        bbox: &GeoBounds,
        zoom: f64,
        order: &ReadingOrder,
    ) -> Result<Vec<ClusterFeature>, ClusterError> {
        Ok(self.index()?.query_ordered(bbox, zoom, order))
    }

    pub fn expansion_zoom(&self, cluster_id: ClusterId) -> Result<u8, ClusterError> {
        self.index()?.expansion_zoom(cluster_id)
    }

    pub fn children(&self, cluster_id: ClusterId) -> Result<Vec<ClusterFeature>, ClusterError> {
        self.index()?.children(cluster_id)
    }

    pub fn leaves(
        &self,
        cluster_id: ClusterId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PointFeature>, ClusterError> {
        self.index()?.leaves(cluster_id, limit, offset)
    }
}

/// Content hash over the fields that affect clustering. Names are excluded.
fn fingerprint(points: &[LocationPoint]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(points.len() as u64).to_le_bytes());
    for p in points {
        hasher.update(&p.id.0.to_le_bytes());
        hasher.update(&canonical_f64(p.longitude).to_bits().to_le_bytes());
        hasher.update(&canonical_f64(p.latitude).to_bits().to_le_bytes());
        hasher.update(&(p.category.len() as u64).to_le_bytes());
        hasher.update(p.category.as_bytes());
    }
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::ClusterSource;
    use crate::error::ClusterError;
    use crate::options::ClusterOptions;
    use crate::point::LocationPoint;
    use crate::reading_order::ReadingOrder;
    use foundation::bounds::GeoBounds;

    fn points() -> Vec<LocationPoint> {
        vec![
            LocationPoint::new(1, 10.0, 10.0, "city"),
            LocationPoint::new(2, 10.2, 10.1, "city"),
            LocationPoint::new(3, -60.0, -10.0, "nature"),
        ]
    }

    #[test]
    fn query_before_load_is_not_built() {
        let source = ClusterSource::new(ClusterOptions::default()).unwrap();
        assert_eq!(
            source.query(&GeoBounds::FULL_WORLD, 2.0),
            Err(ClusterError::NotBuilt)
        );
        assert!(!source.is_built());
    }

    #[test]
    fn identical_input_skips_rebuild() {
        let mut source = ClusterSource::new(ClusterOptions::default()).unwrap();
        assert!(source.load(&points()).unwrap());
        assert!(!source.load(&points()).unwrap());
        assert_eq!(source.generation(), 1);

        let renamed: Vec<_> = points().into_iter().map(|p| p.with_name("x")).collect();
        assert!(!source.load(&renamed).unwrap());

        let mut moved = points();
        moved[2].latitude = -11.0;
        assert!(source.load(&moved).unwrap());
        assert_eq!(source.generation(), 2);
    }

    #[test]
    fn clear_forces_rebuild() {
        let mut source = ClusterSource::new(ClusterOptions::default()).unwrap();
        source.load(&points()).unwrap();
        source.clear();
        assert_eq!(source.index().err(), Some(ClusterError::NotBuilt));
        assert!(source.load(&points()).unwrap());
    }

    #[test]
    fn ordered_query_runs_north_to_south() {
        let mut source = ClusterSource::new(ClusterOptions::default()).unwrap();
        source.load(&points()).unwrap();
        let out = source
            .query_ordered(&GeoBounds::FULL_WORLD, 7.0, &ReadingOrder::default())
            .unwrap();
        let lats: Vec<f64> = out.iter().map(|f| f.position().lat).collect();
        assert_eq!(lats, vec![10.0, 10.1, -10.0]);
    }

    #[test]
    fn invalid_options_are_rejected_up_front() {
        let opts = ClusterOptions {
            radius: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            ClusterSource::new(opts),
            Err(ClusterError::InvalidOptions(_))
        ));
    }
}
