//! Index Bounding Volume Hierarchy.

use order_stat::kth_by;
use photongi_core::common::*;
use photongi_core::geometry::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A point entry indexable by the spatial acceleration structures.
pub trait BvhEntry {
    /// Returns the entry's position.
    fn position(&self) -> Point3f;

    /// Returns the entry's surface normal.
    fn normal(&self) -> Normal3f;
}

/// A query result record: the index of a matched entry and its squared
/// distance from the query point. Ordered by distance, then by entry index.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NearPhoton {
    /// Index of the matched entry.
    pub entry_index: usize,

    /// Squared distance between the query point and the entry.
    pub distance2: Float,
}

impl NearPhoton {
    /// Create a new `NearPhoton`.
    ///
    /// * `entry_index` - Index of the matched entry.
    /// * `distance2`   - Squared distance between the query point and the entry.
    pub fn new(entry_index: usize, distance2: Float) -> Self {
        Self { entry_index, distance2 }
    }
}

// Distances are finite by construction, so the total order is well defined.
impl Eq for NearPhoton {}

impl PartialOrd for NearPhoton {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NearPhoton {
    /// Orders by squared distance; entries at equal distance order by index so
    /// that culling the greatest element keeps the lower index.
    ///
    /// * `other` - The other query result.
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance2
            .partial_cmp(&other.distance2)
            .unwrap_or(Ordering::Equal)
            .then(self.entry_index.cmp(&other.entry_index))
    }
}

/// A node of the linear skip-pointer layout. A traversal advances by one on a
/// hit and jumps to the skip index on a miss; it terminates when the current
/// index reaches the node count.
#[derive(Clone, Debug)]
enum IndexBvhNode {
    /// Carries the index of one indexed entry.
    Leaf { entry_index: u32 },

    /// Carries the subtree bound (inflated by the entry radius) and the index
    /// of the next node to visit when a query point misses the bound.
    Interior { bounds: Bounds3f, skip_index: u32 },
}

/// A bounding volume hierarchy over a frozen vector of point entries,
/// answering radius and normal constrained nearest neighbor queries.
pub struct IndexBvh<E> {
    /// The indexed entries. Frozen for the lifetime of the hierarchy.
    entries: Vec<E>,

    /// Flattened nodes in depth first order.
    nodes: Vec<IndexBvhNode>,

    /// Filter radius of every query.
    entry_radius: Float,

    /// Squared filter radius, computed once.
    entry_radius2: Float,

    /// Cosine of the normal filter angle, computed once.
    normal_cos_angle: Float,

    /// Upper bound on the number of entries returned by a lookup.
    lookup_max_count: usize,
}

impl<E: BvhEntry> IndexBvh<E> {
    /// Builds a hierarchy over the given entries.
    ///
    /// * `entries`          - The entries to index; the vector is frozen from
    ///                        here on.
    /// * `lookup_max_count` - Upper bound on the entries a lookup returns.
    /// * `entry_radius`     - Query filter radius.
    /// * `normal_angle`     - Query normal filter angle in degrees.
    pub fn new(entries: Vec<E>, lookup_max_count: usize, entry_radius: Float, normal_angle: Float) -> Self {
        let mut nodes = Vec::with_capacity(2 * entries.len());

        if !entries.is_empty() {
            let mut build_info: Vec<(u32, Point3f)> = entries
                .iter()
                .enumerate()
                .map(|(i, e)| (i as u32, e.position()))
                .collect();
            Self::build(&mut build_info, &mut nodes, entry_radius);

            debug!(
                "Index BVH built with {} nodes for {} entries ({})",
                nodes.len(),
                entries.len(),
                memory_string(nodes.len() * std::mem::size_of::<IndexBvhNode>())
            );
        }

        Self {
            entries,
            nodes,
            entry_radius,
            entry_radius2: entry_radius * entry_radius,
            normal_cos_angle: radians(normal_angle).cos(),
            lookup_max_count,
        }
    }

    /// Recursively emits the subtree for a slice of entries, splitting at the
    /// median of the longest centroid extent.
    ///
    /// * `info`         - (entry index, position) pairs of the subtree.
    /// * `nodes`        - Node list under construction.
    /// * `entry_radius` - Query filter radius used to inflate interior bounds.
    fn build(info: &mut [(u32, Point3f)], nodes: &mut Vec<IndexBvhNode>, entry_radius: Float) {
        if info.len() == 1 {
            nodes.push(IndexBvhNode::Leaf { entry_index: info[0].0 });
            return;
        }

        let mut point_bounds = Bounds3f::EMPTY;
        for (_, p) in info.iter() {
            point_bounds = point_bounds.union_point(p);
        }
        // Inflating by the radius makes every entry within entry_radius of a
        // contained query point reachable through the point-in-box test.
        let bounds = point_bounds.expand(entry_radius);

        let dim = point_bounds.maximum_extent();
        let mid = info.len() / 2;
        kth_by(info, mid, |a, b| {
            a.1[dim].partial_cmp(&b.1[dim]).unwrap_or(Ordering::Equal)
        });

        let node_index = nodes.len();
        nodes.push(IndexBvhNode::Interior { bounds, skip_index: 0 });

        let (left, right) = info.split_at_mut(mid);
        Self::build(left, nodes, entry_radius);
        Self::build(right, nodes, entry_radius);

        let skip_index = nodes.len() as u32;
        if let IndexBvhNode::Interior { skip_index: skip, .. } = &mut nodes[node_index] {
            *skip = skip_index;
        }
    }

    /// Returns every entry within the filter radius of the query point whose
    /// normal passes the cosine test, capped at the `lookup_max_count`
    /// closest, together with the squared filter radius.
    ///
    /// * `p` - Query point.
    /// * `n` - Query normal.
    pub fn get_all_near_entries(&self, p: &Point3f, n: &Normal3f) -> (Vec<NearPhoton>, Float) {
        let mut heap: BinaryHeap<NearPhoton> = BinaryHeap::with_capacity(min(self.lookup_max_count, 1024).saturating_add(1));

        let mut current_node = 0;
        let stop_node = self.nodes.len();
        while current_node < stop_node {
            match &self.nodes[current_node] {
                IndexBvhNode::Leaf { entry_index } => {
                    let entry = &self.entries[*entry_index as usize];
                    let distance2 = p.distance_squared(entry.position());
                    if distance2 <= self.entry_radius2 && n.dot(&entry.normal()) >= self.normal_cos_angle {
                        heap.push(NearPhoton::new(*entry_index as usize, distance2));
                        if heap.len() > self.lookup_max_count {
                            // The greatest element is the farthest match; at
                            // equal distance the higher entry index goes.
                            heap.pop();
                        }
                    }
                    current_node += 1;
                }
                IndexBvhNode::Interior { bounds, skip_index } => {
                    if bounds.contains(p) {
                        current_node += 1;
                    } else {
                        current_node = *skip_index as usize;
                    }
                }
            }
        }

        (heap.into_sorted_vec(), self.entry_radius2)
    }

    /// Returns the single entry with the smallest squared distance passing the
    /// radius and normal filter.
    ///
    /// * `p` - Query point.
    /// * `n` - Query normal.
    pub fn get_nearest_entry(&self, p: &Point3f, n: &Normal3f) -> Option<&E> {
        let mut nearest: Option<usize> = None;
        let mut nearest_distance2 = self.entry_radius2;

        let mut current_node = 0;
        let stop_node = self.nodes.len();
        while current_node < stop_node {
            match &self.nodes[current_node] {
                IndexBvhNode::Leaf { entry_index } => {
                    let entry = &self.entries[*entry_index as usize];
                    let distance2 = p.distance_squared(entry.position());
                    if distance2 <= self.entry_radius2
                        && n.dot(&entry.normal()) >= self.normal_cos_angle
                        && (nearest.is_none() || distance2 < nearest_distance2)
                    {
                        nearest = Some(*entry_index as usize);
                        nearest_distance2 = distance2;
                    }
                    current_node += 1;
                }
                IndexBvhNode::Interior { bounds, skip_index } => {
                    if bounds.contains(p) {
                        current_node += 1;
                    } else {
                        current_node = *skip_index as usize;
                    }
                }
            }
        }

        nearest.map(|i| &self.entries[i])
    }

    /// Returns the indexed entries.
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Returns the entry at the given index.
    ///
    /// * `index` - The entry index.
    pub fn entry(&self, index: usize) -> &E {
        &self.entries[index]
    }

    /// Returns the number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the hierarchy indexes no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the upper bound on the entries a lookup returns.
    pub fn lookup_max_count(&self) -> usize {
        self.lookup_max_count
    }

    /// Returns the query filter radius.
    pub fn entry_radius(&self) -> Float {
        self.entry_radius
    }

    /// Returns the squared query filter radius.
    pub fn entry_radius2(&self) -> Float {
        self.entry_radius2
    }

    /// Returns the memory footprint of the nodes and the indexed entries.
    pub fn memory_usage(&self) -> usize {
        self.nodes.len() * std::mem::size_of::<IndexBvhNode>() + self.entries.len() * std::mem::size_of::<E>()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
