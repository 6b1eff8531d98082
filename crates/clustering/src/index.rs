//! Hierarchical point clustering.
//!
//! Points are projected to the unit Web-Mercator square and clustered greedily
//! once per integer zoom, from `max_zoom` down to `min_zoom`. Level
//! `max_zoom + 1` holds the raw points; level `z` holds the aggregates and
//! leftover singletons formed at zoom `z` out of level `z + 1`.
//!
//! Ordering contract:
//! - `query` returns features in ascending slot order of the queried level,
//!   which is a pure function of the input point order. Display code is
//!   expected to apply a [`ReadingOrder`](crate::ReadingOrder) on top.

use std::collections::BTreeMap;

use foundation::bounds::{Aabb2, GeoBounds};
use foundation::ids::ClusterId;
use foundation::math::mercator::{unit_x, unit_x_to_lng, unit_y, unit_y_to_lat};
use tracing::{debug, trace, warn};

use crate::error::ClusterError;
use crate::feature::{AggregateFeature, ClusterFeature, PointFeature, abbreviate_count};
use crate::options::ClusterOptions;
use crate::point::LocationPoint;
use crate::reading_order::ReadingOrder;
use crate::spatial::KdTree;

/// Marks a node that has not been claimed at the zoom being built.
const UNCLAIMED: u8 = u8::MAX;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeKind {
    /// Index into `ClusterIndex::points`.
    Point(u32),
    /// Index into `ClusterIndex::aggregates`.
    Aggregate(u32),
}

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    /// Zoom at which this node was claimed while building the next coarser
    /// level.
    claimed_at: u8,
    num_points: usize,
    parent: Option<ClusterId>,
    kind: NodeKind,
}

impl Node {
    fn fresh_copy(&self) -> Node {
        Node {
            claimed_at: UNCLAIMED,
            parent: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
struct Aggregate {
    id: ClusterId,
    /// Member count per interned category.
    categories: BTreeMap<u32, usize>,
}

#[derive(Debug, Clone)]
struct Level {
    nodes: Vec<Node>,
    tree: KdTree,
}

impl Level {
    fn new(nodes: Vec<Node>, node_size: usize) -> Self {
        let coords: Vec<[f64; 2]> = nodes.iter().map(|n| [n.x, n.y]).collect();
        let tree = KdTree::build(&coords, node_size);
        Self { nodes, tree }
    }

    fn empty() -> Self {
        Self::new(Vec::new(), 1)
    }
}

/// Immutable cluster hierarchy over one snapshot of location points.
///
/// Rebuild (rather than mutate) when the point set changes.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    options: ClusterOptions,
    points: Vec<LocationPoint>,
    point_categories: Vec<u32>,
    category_names: Vec<String>,
    aggregates: Vec<Aggregate>,
    /// Indexed by zoom; entries below `min_zoom` stay empty.
    levels: Vec<Level>,
}

impl ClusterIndex {
    pub fn build(points: &[LocationPoint], options: ClusterOptions) -> Result<Self, ClusterError> {
        options.validate()?;

        let mut kept: Vec<LocationPoint> = Vec::with_capacity(points.len());
        for p in points {
            if p.longitude.is_finite() && p.latitude.is_finite() {
                kept.push(p.clone());
            } else {
                warn!("skipping location {:?} with non-finite coordinates", p.id);
            }
        }

        let mut category_names: Vec<String> = Vec::new();
        let mut by_name: BTreeMap<String, u32> = BTreeMap::new();
        let mut point_categories = Vec::with_capacity(kept.len());
        for p in &kept {
            let next = category_names.len() as u32;
            let idx = *by_name.entry(p.category.clone()).or_insert_with(|| {
                category_names.push(p.category.clone());
                next
            });
            point_categories.push(idx);
        }

        let leaves: Vec<Node> = kept
            .iter()
            .enumerate()
            .map(|(i, p)| Node {
                x: unit_x(p.longitude),
                y: unit_y(p.latitude),
                claimed_at: UNCLAIMED,
                num_points: 1,
                parent: None,
                kind: NodeKind::Point(i as u32),
            })
            .collect();

        let mut index = ClusterIndex {
            levels: vec![Level::empty(); usize::from(options.max_zoom) + 2],
            options,
            points: kept,
            point_categories,
            category_names,
            aggregates: Vec::new(),
        };

        let top = usize::from(index.options.max_zoom) + 1;
        index.levels[top] = Level::new(leaves, index.options.node_size);
        for z in (index.options.min_zoom..=index.options.max_zoom).rev() {
            let nodes = index.cluster_level(z);
            trace!(zoom = z, nodes = nodes.len(), "built cluster level");
            index.levels[usize::from(z)] = Level::new(nodes, index.options.node_size);
        }

        debug!(
            points = index.points.len(),
            aggregates = index.aggregates.len(),
            min_zoom = index.options.min_zoom,
            max_zoom = index.options.max_zoom,
            "built cluster index"
        );
        Ok(index)
    }

    pub fn with_defaults(points: &[LocationPoint]) -> Result<Self, ClusterError> {
        Self::build(points, ClusterOptions::default())
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Forms level `zoom` out of level `zoom + 1`.
    fn cluster_level(&mut self, zoom: u8) -> Vec<Node> {
        let radius = self.options.unit_radius(zoom);
        let min_points = self.options.min_points;
        let finer = usize::from(zoom) + 1;
        let Level { nodes, tree } = &mut self.levels[finer];

        let mut out = Vec::new();
        for i in 0..nodes.len() {
            if nodes[i].claimed_at <= zoom {
                continue;
            }
            nodes[i].claimed_at = zoom;

            let seed = nodes[i].clone();
            let neighbors = tree.query_within([seed.x, seed.y], radius);

            let mut num_points = seed.num_points;
            for &n in &neighbors {
                let n = &nodes[n as usize];
                if n.claimed_at > zoom {
                    num_points += n.num_points;
                }
            }

            if num_points > seed.num_points && num_points >= min_points {
                let id = ClusterId::new(i, zoom + 1);
                let mut wx = seed.x * seed.num_points as f64;
                let mut wy = seed.y * seed.num_points as f64;
                let mut categories = BTreeMap::new();
                merge_categories(
                    &mut categories,
                    &seed.kind,
                    &self.point_categories,
                    &self.aggregates,
                );

                for &n in &neighbors {
                    let member = &mut nodes[n as usize];
                    if member.claimed_at <= zoom {
                        continue;
                    }
                    member.claimed_at = zoom;
                    member.parent = Some(id);
                    wx += member.x * member.num_points as f64;
                    wy += member.y * member.num_points as f64;
                    merge_categories(
                        &mut categories,
                        &member.kind,
                        &self.point_categories,
                        &self.aggregates,
                    );
                }
                nodes[i].parent = Some(id);

                let aggregate = self.aggregates.len() as u32;
                self.aggregates.push(Aggregate { id, categories });
                out.push(Node {
                    x: wx / num_points as f64,
                    y: wy / num_points as f64,
                    claimed_at: UNCLAIMED,
                    num_points,
                    parent: None,
                    kind: NodeKind::Aggregate(aggregate),
                });
            } else {
                out.push(seed.fresh_copy());
                if num_points > 1 {
                    for &n in &neighbors {
                        let member = &mut nodes[n as usize];
                        if member.claimed_at <= zoom {
                            continue;
                        }
                        member.claimed_at = zoom;
                        out.push(member.fresh_copy());
                    }
                }
            }
        }
        out
    }

    /// Features visible in `bbox` at `zoom`.
    ///
    /// `zoom` is rounded to the nearest level and clamped into
    /// `[min_zoom, max_zoom + 1]`. Boxes crossing the antimeridian are split;
    /// boxes at least 360° wide cover every longitude.
    pub fn query(&self, bbox: &GeoBounds, zoom: f64) -> Vec<ClusterFeature> {
        let level = self.options.level_for(zoom);

        let min_lat = bbox.min_lat.clamp(-90.0, 90.0);
        let max_lat = bbox.max_lat.clamp(-90.0, 90.0);
        let mut min_lng = wrap_lng(bbox.min_lng);
        let mut max_lng = if bbox.max_lng == 180.0 {
            180.0
        } else {
            wrap_lng(bbox.max_lng)
        };

        if bbox.max_lng - bbox.min_lng >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut out = self.query_level(level, min_lng, min_lat, 180.0, max_lat);
            out.extend(self.query_level(level, -180.0, min_lat, max_lng, max_lat));
            return out;
        }

        self.query_level(level, min_lng, min_lat, max_lng, max_lat)
    }

    /// [`Self::query`] followed by a reading-order pass.
    pub fn query_ordered(
        &self,
        bbox: &GeoBounds,
        zoom: f64,
        order: &ReadingOrder,
    ) -> Vec<ClusterFeature> {
        order.sorted(self.query(bbox, zoom))
    }

    fn query_level(
        &self,
        level: u8,
        min_lng: f64,
        min_lat: f64,
        max_lng: f64,
        max_lat: f64,
    ) -> Vec<ClusterFeature> {
        let level = &self.levels[usize::from(level)];
        let query = Aabb2::new(
            [unit_x(min_lng), unit_y(max_lat)],
            [unit_x(max_lng), unit_y(min_lat)],
        );
        level
            .tree
            .query_range(&query)
            .into_iter()
            .map(|slot| self.feature(&level.nodes[slot as usize]))
            .collect()
    }

    fn feature(&self, node: &Node) -> ClusterFeature {
        match node.kind {
            NodeKind::Point(i) => {
                let p = &self.points[i as usize];
                ClusterFeature::Point(PointFeature {
                    id: p.id,
                    category: p.category.clone(),
                    longitude: p.longitude,
                    latitude: p.latitude,
                })
            }
            NodeKind::Aggregate(a) => {
                let agg = &self.aggregates[a as usize];
                let categories = agg
                    .categories
                    .iter()
                    .map(|(c, n)| (self.category_names[*c as usize].clone(), *n))
                    .collect();
                ClusterFeature::Aggregate(AggregateFeature {
                    cluster_id: agg.id,
                    point_count: node.num_points,
                    point_count_abbreviated: abbreviate_count(node.num_points),
                    longitude: unit_x_to_lng(node.x),
                    latitude: unit_y_to_lat(node.y),
                    categories,
                })
            }
        }
    }

    /// Immediate members of an aggregate, one zoom level finer.
    pub fn children(&self, cluster_id: ClusterId) -> Result<Vec<ClusterFeature>, ClusterError> {
        let origin_zoom = cluster_id.origin_zoom();
        if origin_zoom <= self.options.min_zoom || origin_zoom > self.options.max_zoom + 1 {
            return Err(ClusterError::UnknownCluster(cluster_id));
        }
        let level = &self.levels[usize::from(origin_zoom)];
        let Some(origin) = level.nodes.get(cluster_id.origin_slot()) else {
            return Err(ClusterError::UnknownCluster(cluster_id));
        };
        if origin.parent != Some(cluster_id) {
            return Err(ClusterError::UnknownCluster(cluster_id));
        }

        let radius = self.options.unit_radius(origin_zoom - 1);
        let children: Vec<ClusterFeature> = level
            .tree
            .query_within([origin.x, origin.y], radius)
            .into_iter()
            .map(|slot| &level.nodes[slot as usize])
            .filter(|n| n.parent == Some(cluster_id))
            .map(|n| self.feature(n))
            .collect();

        if children.is_empty() {
            return Err(ClusterError::UnknownCluster(cluster_id));
        }
        Ok(children)
    }

    /// The zoom at which an aggregate first splits into more than one feature.
    pub fn expansion_zoom(&self, cluster_id: ClusterId) -> Result<u8, ClusterError> {
        let mut id = cluster_id;
        let mut zoom = cluster_id.origin_zoom().saturating_sub(1);
        while zoom <= self.options.max_zoom {
            let children = self.children(id)?;
            zoom += 1;
            if children.len() != 1 {
                break;
            }
            match children[0].as_aggregate() {
                Some(child) => id = child.cluster_id,
                None => break,
            }
        }
        Ok(zoom)
    }

    /// Input points under an aggregate, depth-first, paged by
    /// `offset`/`limit`.
    pub fn leaves(
        &self,
        cluster_id: ClusterId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PointFeature>, ClusterError> {
        let mut out = Vec::new();
        let mut skipped = 0;
        self.append_leaves(&mut out, cluster_id, limit, offset, &mut skipped)?;
        Ok(out)
    }

    fn append_leaves(
        &self,
        out: &mut Vec<PointFeature>,
        cluster_id: ClusterId,
        limit: usize,
        offset: usize,
        skipped: &mut usize,
    ) -> Result<(), ClusterError> {
        for child in self.children(cluster_id)? {
            if out.len() >= limit {
                break;
            }
            match child {
                ClusterFeature::Aggregate(agg) => {
                    if *skipped + agg.point_count <= offset {
                        *skipped += agg.point_count;
                    } else {
                        self.append_leaves(out, agg.cluster_id, limit, offset, skipped)?;
                    }
                }
                ClusterFeature::Point(p) => {
                    if *skipped < offset {
                        *skipped += 1;
                    } else {
                        out.push(p);
                    }
                }
            }
        }
        Ok(())
    }
}

fn merge_categories(
    into: &mut BTreeMap<u32, usize>,
    kind: &NodeKind,
    point_categories: &[u32],
    aggregates: &[Aggregate],
) {
    match *kind {
        NodeKind::Point(i) => *into.entry(point_categories[i as usize]).or_insert(0) += 1,
        NodeKind::Aggregate(a) => {
            for (c, n) in &aggregates[a as usize].categories {
                *into.entry(*c).or_insert(0) += n;
            }
        }
    }
}

fn wrap_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}
