//! Visibility particle octree.

use crate::index_bvh::BvhEntry;
use photongi_core::common::*;
use photongi_core::geometry::*;
use std::sync::RwLock;

/// Subdivision stops once a cell's extent falls below twice the entry radius.
const MAX_DEPTH: usize = 24;

/// An octree cell. Entries are stored at the deepest cell whose extent still
/// spans the entry radius.
#[derive(Default)]
struct OctreeNode {
    children: [Option<Box<OctreeNode>>; 8],
    entry_indices: Vec<u32>,
}

/// A point membership octree over particles, built incrementally as particles
/// are discovered. Queries accept any particle within the entry radius whose
/// normal passes the cosine test.
pub struct PgciOctree<E> {
    /// Root cell spanning the expanded world bound.
    root: OctreeNode,

    /// World bound of the octree, expanded by the entry radius.
    world_bound: Bounds3f,

    /// Membership radius of every query.
    entry_radius: Float,

    /// Squared membership radius, computed once.
    entry_radius2: Float,

    /// Cosine of the normal filter angle, computed once.
    normal_cos_angle: Float,

    /// The stored particles.
    entries: Vec<E>,
}

impl<E: BvhEntry> PgciOctree<E> {
    /// Creates a new empty octree.
    ///
    /// * `world_bound`  - Bounding box of the scene.
    /// * `entry_radius` - Query membership radius.
    /// * `normal_angle` - Query normal filter angle in degrees.
    pub fn new(world_bound: Bounds3f, entry_radius: Float, normal_angle: Float) -> Self {
        Self {
            root: OctreeNode::default(),
            world_bound: world_bound.expand(entry_radius),
            entry_radius,
            entry_radius2: entry_radius * entry_radius,
            normal_cos_angle: radians(normal_angle).cos(),
            entries: Vec::new(),
        }
    }

    /// Inserts a particle.
    ///
    /// * `entry` - The particle to insert.
    pub fn add(&mut self, entry: E) {
        let index = self.entries.len() as u32;
        let p = entry.position();
        debug_assert!(self.world_bound.contains(&p));
        self.entries.push(entry);

        let mut node = &mut self.root;
        let mut bound = self.world_bound;
        for _ in 0..MAX_DEPTH {
            if bound.diagonal().x.max(bound.diagonal().y).max(bound.diagonal().z) < 2.0 * self.entry_radius {
                break;
            }
            let (child_index, child_bound) = child_cell(&bound, &p);
            node = node.children[child_index].get_or_insert_with(Box::default).as_mut();
            bound = child_bound;
        }
        node.entry_indices.push(index);
    }

    /// Returns the index of the nearest particle within the membership radius
    /// whose normal passes the cosine test.
    ///
    /// * `p` - Query point.
    /// * `n` - Query normal.
    pub fn get_nearest_entry(&self, p: &Point3f, n: &Normal3f) -> Option<usize> {
        let mut nearest: Option<usize> = None;
        let mut nearest_distance2 = self.entry_radius2;
        self.visit(&self.root, &self.world_bound, p, n, &mut nearest, &mut nearest_distance2);
        nearest
    }

    /// Recursive query walk; a cell is descended only when the query point
    /// lies within the cell expanded by the membership radius.
    fn visit(
        &self,
        node: &OctreeNode,
        bound: &Bounds3f,
        p: &Point3f,
        n: &Normal3f,
        nearest: &mut Option<usize>,
        nearest_distance2: &mut Float,
    ) {
        if !bound.expand(self.entry_radius).contains(p) {
            return;
        }

        for index in node.entry_indices.iter() {
            let entry = &self.entries[*index as usize];
            let distance2 = p.distance_squared(entry.position());
            if distance2 <= self.entry_radius2
                && n.dot(&entry.normal()) >= self.normal_cos_angle
                && (nearest.is_none() || distance2 < *nearest_distance2)
            {
                *nearest = Some(*index as usize);
                *nearest_distance2 = distance2;
            }
        }

        for (child_index, child) in node.children.iter().enumerate() {
            if let Some(child) = child {
                let child_bound = cell_bound(bound, child_index);
                self.visit(child, &child_bound, p, n, nearest, nearest_distance2);
            }
        }
    }

    /// Returns the stored particles.
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Returns the particle at the given index.
    ///
    /// * `index` - The particle index.
    pub fn entry(&self, index: usize) -> &E {
        &self.entries[index]
    }

    /// Returns the number of stored particles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the octree holds no particles.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Returns the child cell containing the point.
///
/// * `bound` - The parent cell.
/// * `p`     - The point.
fn child_cell(bound: &Bounds3f, p: &Point3f) -> (usize, Bounds3f) {
    let center = bound.center();
    let mut index = 0;
    if p.x > center.x {
        index |= 1;
    }
    if p.y > center.y {
        index |= 2;
    }
    if p.z > center.z {
        index |= 4;
    }
    (index, cell_bound(bound, index))
}

/// Returns the bounding box of a child cell.
///
/// * `bound` - The parent cell.
/// * `index` - The child index.
fn cell_bound(bound: &Bounds3f, index: usize) -> Bounds3f {
    let center = bound.center();
    let x = if index & 1 == 0 {
        (bound.p_min.x, center.x)
    } else {
        (center.x, bound.p_max.x)
    };
    let y = if index & 2 == 0 {
        (bound.p_min.y, center.y)
    } else {
        (center.y, bound.p_max.y)
    };
    let z = if index & 4 == 0 {
        (bound.p_min.z, center.z)
    } else {
        (center.z, bound.p_max.z)
    };
    Bounds3f::new(Point3f::new(x.0, y.0, z.0), Point3f::new(x.1, y.1, z.1))
}

/// Wraps an octree for the build phase, when multiple threads race to admit
/// particles. The lookup-then-insert pair runs under one lock so a particle is
/// admitted at most once under the radius and normal filter.
pub struct SharedOctree<E> {
    inner: RwLock<PgciOctree<E>>,
}

impl<E: BvhEntry> SharedOctree<E> {
    /// Wraps an octree for shared mutation.
    ///
    /// * `octree` - The octree to share.
    pub fn new(octree: PgciOctree<E>) -> Self {
        Self {
            inner: RwLock::new(octree),
        }
    }

    /// Atomically checks for a particle compatible with `entry` and inserts
    /// `entry` when none is found. Returns true on a cache hit (a compatible
    /// particle was already present).
    ///
    /// * `entry` - The candidate particle.
    pub fn check_and_insert(&self, entry: E) -> bool {
        let mut octree = self.inner.write().expect("unable to lock the visibility octree");
        if octree.get_nearest_entry(&entry.position(), &entry.normal()).is_some() {
            true
        } else {
            octree.add(entry);
            false
        }
    }

    /// Returns the number of admitted particles.
    pub fn len(&self) -> usize {
        self.inner.read().expect("unable to lock the visibility octree").len()
    }

    /// Returns true when no particle was admitted yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unwraps the octree once the build phase has joined; queries after this
    /// point need no locking.
    pub fn into_inner(self) -> PgciOctree<E> {
        self.inner.into_inner().expect("unable to unwrap the visibility octree")
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use photongi_core::rng::RNG;

    #[derive(Clone, Debug)]
    struct TestParticle {
        p: Point3f,
        n: Normal3f,
    }

    impl BvhEntry for TestParticle {
        fn position(&self) -> Point3f {
            self.p
        }

        fn normal(&self) -> Normal3f {
            self.n
        }
    }

    fn test_bound() -> Bounds3f {
        Bounds3f::new(Point3f::new(-2.0, -2.0, -2.0), Point3f::new(2.0, 2.0, 2.0))
    }

    #[test]
    fn nearest_entry_within_radius() {
        let mut octree = PgciOctree::new(test_bound(), 0.25, 10.0);
        let up = Normal3f::new(0.0, 1.0, 0.0);
        octree.add(TestParticle {
            p: Point3f::new(0.0, 0.0, 0.0),
            n: up,
        });

        assert_eq!(octree.get_nearest_entry(&Point3f::new(0.1, 0.0, 0.0), &up), Some(0));
        assert_eq!(octree.get_nearest_entry(&Point3f::new(1.0, 0.0, 0.0), &up), None);
    }

    #[test]
    fn normal_filter_rejects_back_faces() {
        let mut octree = PgciOctree::new(test_bound(), 0.25, 10.0);
        let up = Normal3f::new(0.0, 1.0, 0.0);
        octree.add(TestParticle {
            p: Point3f::new(0.0, 0.0, 0.0),
            n: up,
        });

        assert_eq!(octree.get_nearest_entry(&Point3f::zero(), &-up), None);
    }

    #[test]
    fn admission_is_at_most_once() {
        let octree = SharedOctree::new(PgciOctree::new(test_bound(), 0.25, 10.0));
        let up = Normal3f::new(0.0, 1.0, 0.0);

        let particle = TestParticle {
            p: Point3f::new(0.5, 0.5, 0.5),
            n: up,
        };
        assert!(!octree.check_and_insert(particle.clone()));
        assert!(octree.check_and_insert(particle.clone()));

        // An incompatible normal at the same position is a new particle.
        assert!(!octree.check_and_insert(TestParticle {
            p: Point3f::new(0.5, 0.5, 0.5),
            n: -up,
        }));
        assert_eq!(octree.len(), 2);
    }

    #[test]
    fn nearest_matches_linear_scan() {
        let mut octree = PgciOctree::new(test_bound(), 0.5, 90.0);
        let up = Normal3f::new(0.0, 1.0, 0.0);

        let mut rng = RNG::new(11);
        let mut particles = Vec::new();
        for _ in 0..256 {
            let p = Point3f::new(
                rng.uniform_float() * 4.0 - 2.0,
                rng.uniform_float() * 4.0 - 2.0,
                rng.uniform_float() * 4.0 - 2.0,
            );
            particles.push(p);
            octree.add(TestParticle { p, n: up });
        }

        for _ in 0..64 {
            let q = Point3f::new(
                rng.uniform_float() * 4.0 - 2.0,
                rng.uniform_float() * 4.0 - 2.0,
                rng.uniform_float() * 4.0 - 2.0,
            );
            let expected = particles
                .iter()
                .enumerate()
                .filter(|(_, p)| q.distance_squared(**p) <= 0.25)
                .min_by(|a, b| {
                    q.distance_squared(*a.1)
                        .partial_cmp(&q.distance_squared(*b.1))
                        .unwrap()
                })
                .map(|(i, _)| i);
            assert_eq!(octree.get_nearest_entry(&q, &up), expected);
        }
    }
}
