use foundation::bounds::Aabb2;
use foundation::math::precision::stable_total_cmp_f64;

/// Static 2-D k-d tree over point slots.
///
/// Points are addressed by their slot (position in the input slice). The tree
/// is built once and never mutated.
///
/// Ordering contract:
/// - `query_range` and `query_within` return slots in ascending order.
#[derive(Debug, Clone)]
pub struct KdTree {
    node_size: usize,
    slots: Vec<u32>,
    coords: Vec<[f64; 2]>,
}

impl KdTree {
    pub fn build(points: &[[f64; 2]], node_size: usize) -> Self {
        let mut entries: Vec<(u32, [f64; 2])> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32, *p))
            .collect();
        let node_size = node_size.max(1);
        sort_node(&mut entries, node_size, 0);

        let (slots, coords) = entries.into_iter().unzip();
        Self {
            node_size,
            slots,
            coords,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots whose point lies inside `query` (edges inclusive).
    pub fn query_range(&self, query: &Aabb2) -> Vec<u32> {
        let mut hits = Vec::new();
        self.walk(query, |p| query.contains(p), &mut hits);
        hits.sort_unstable();
        hits
    }

    /// Slots whose point lies within `radius` of `center`.
    pub fn query_within(&self, center: [f64; 2], radius: f64) -> Vec<u32> {
        let r2 = radius * radius;
        let query = Aabb2::new(
            [center[0] - radius, center[1] - radius],
            [center[0] + radius, center[1] + radius],
        );
        let mut hits = Vec::new();
        self.walk(&query, |p| sq_dist(p, center) <= r2, &mut hits);
        hits.sort_unstable();
        hits
    }

    fn walk(&self, query: &Aabb2, accept: impl Fn([f64; 2]) -> bool, hits: &mut Vec<u32>) {
        if self.slots.is_empty() {
            return;
        }

        // (start, end, axis) over half-open ranges of the flattened tree.
        let mut stack: Vec<(usize, usize, usize)> = vec![(0, self.slots.len(), 0)];
        while let Some((start, end, axis)) = stack.pop() {
            if end - start <= self.node_size {
                for i in start..end {
                    if accept(self.coords[i]) {
                        hits.push(self.slots[i]);
                    }
                }
                continue;
            }

            let mid = start + (end - start) / 2;
            let p = self.coords[mid];
            if accept(p) {
                hits.push(self.slots[mid]);
            }

            let next_axis = 1 - axis;
            if query.min[axis] <= p[axis] {
                stack.push((start, mid, next_axis));
            }
            if query.max[axis] >= p[axis] {
                stack.push((mid + 1, end, next_axis));
            }
        }
    }
}

fn sort_node(entries: &mut [(u32, [f64; 2])], node_size: usize, axis: usize) {
    if entries.len() <= node_size {
        return;
    }

    // Slot tie-break keeps the layout independent of sort stability.
    entries.sort_by(|a, b| {
        stable_total_cmp_f64(a.1[axis], b.1[axis]).then_with(|| a.0.cmp(&b.0))
    });

    let mid = entries.len() / 2;
    let (left, rest) = entries.split_at_mut(mid);
    sort_node(left, node_size, 1 - axis);
    sort_node(&mut rest[1..], node_size, 1 - axis);
}

fn sq_dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
