//! Visibility particle tracing

use crate::params::PhotonGICacheParams;
use crate::photon::VisibilityParticle;
use indicatif::ProgressBar;
use photongi_accelerators::SharedOctree;
use photongi_core::common::*;
use photongi_core::geometry::*;
use photongi_core::sampling::{radical_inverse, MAX_SAMPLE_DIMENSIONS};
use photongi_core::scene::{Scene, VolumeInfo};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Hit rate statistics are meaningless before this many octree lookups.
const WARM_UP_LOOKUP_COUNT: u32 = 4096;

/// Minimum camera paths before the hit rate may terminate the pass.
const MIN_SAMPLE_COUNT: u32 = 16384;

/// State shared by the visibility tracing workers.
pub(crate) struct TraceVisibilityState<'a> {
    /// The octree admitting particles.
    pub octree: &'a SharedOctree<VisibilityParticle>,

    /// Octree admission attempts.
    pub lookups: AtomicU32,

    /// Admission attempts that found an existing compatible particle.
    pub hits: AtomicU32,

    /// Camera paths sampled so far.
    pub sample_count: AtomicU32,

    /// Forces full sampling until the octree has grown enough to give
    /// meaningful hit rate statistics.
    pub warm_up: AtomicBool,

    /// Cooperative termination flag.
    pub done: AtomicBool,
}

impl<'a> TraceVisibilityState<'a> {
    /// Create the shared state for a visibility pass.
    ///
    /// * `octree` - The octree admitting particles.
    pub fn new(octree: &'a SharedOctree<VisibilityParticle>) -> Self {
        Self {
            octree,
            lookups: AtomicU32::new(0),
            hits: AtomicU32::new(0),
            sample_count: AtomicU32::new(0),
            warm_up: AtomicBool::new(true),
            done: AtomicBool::new(false),
        }
    }

    /// Returns the measured octree hit rate.
    pub fn hit_rate(&self) -> Float {
        let lookups = self.lookups.load(Ordering::SeqCst);
        if lookups == 0 {
            0.0
        } else {
            self.hits.load(Ordering::SeqCst) as Float / lookups as Float
        }
    }
}

/// A worker distributing camera-visible surface points into the shared
/// octree. One worker runs per hardware thread; each draws low discrepancy
/// camera paths keyed by its index and cooperatively exits once the octree
/// hit rate reaches its target.
pub(crate) struct TraceVisibilityWorker<'a> {
    pub worker_index: usize,
    pub worker_count: usize,
    pub params: &'a PhotonGICacheParams,
    pub scene: &'a dyn Scene,
    pub state: &'a TraceVisibilityState<'a>,
    pub interrupt: &'a AtomicBool,
    pub progress: Option<&'a ProgressBar>,
}

impl TraceVisibilityWorker<'_> {
    /// Runs the worker loop until the pass terminates.
    pub fn run(&self) {
        let mut local_index: u64 = 0;

        loop {
            if self.interrupt.load(Ordering::Relaxed) || self.state.done.load(Ordering::Relaxed) {
                break;
            }

            // Workers interleave one global low discrepancy sequence.
            let sample_index = self.worker_index as u64 + self.worker_count as u64 * local_index;
            local_index += 1;

            self.trace_visibility_path(sample_index);

            let sample_count = self.state.sample_count.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(progress) = self.progress {
                progress.set_position(u64::from(sample_count));
            }

            if sample_count >= self.params.visibility.max_sample_count {
                self.state.done.store(true, Ordering::SeqCst);
                break;
            }

            if self.state.warm_up.load(Ordering::SeqCst) {
                if self.state.lookups.load(Ordering::SeqCst) >= WARM_UP_LOOKUP_COUNT {
                    self.state.warm_up.store(false, Ordering::SeqCst);
                }
            } else if sample_count >= MIN_SAMPLE_COUNT
                && self.state.hit_rate() >= self.params.visibility.target_hit_rate
            {
                self.state.done.store(true, Ordering::SeqCst);
                break;
            }
        }
    }

    /// Traces one short camera path, trying to admit every photon-GI-enabled
    /// surface hit into the octree.
    ///
    /// * `sample_index` - Index into the low discrepancy sequence.
    fn trace_visibility_path(&self, sample_index: u64) {
        let sample = |dim: usize| radical_inverse(dim % MAX_SAMPLE_DIMENSIONS, sample_index);

        let time = self.scene.camera_ray_time(sample(0));
        let mut ray = match self.scene.generate_camera_ray(sample(1), sample(2), time) {
            Some(ray) => ray,
            None => return,
        };

        let mut vol = VolumeInfo::default();
        let mut sample_dim = 3;
        let mut depth = 1;
        while depth <= self.params.photon.max_path_depth {
            let hit = match self.scene.intersect(&ray, &mut vol, sample(sample_dim)) {
                Some(hit) => hit,
                None => break,
            };
            sample_dim += 1;

            let bsdf = hit.bsdf;
            if bsdf.is_photon_gi_enabled() {
                let hit_point = *bsdf.hit_point();
                let landing_normal = hit_point.shade_n.face_forward(&-ray.d);

                let was_hit = self
                    .state
                    .octree
                    .check_and_insert(VisibilityParticle::new(hit_point.p, landing_normal, false));
                self.state.lookups.fetch_add(1, Ordering::SeqCst);
                if was_hit {
                    self.state.hits.fetch_add(1, Ordering::SeqCst);
                }
            }

            if depth >= self.params.photon.max_path_depth {
                break;
            }

            let bsdf_sample = bsdf.sample(sample(sample_dim), sample(sample_dim + 1));
            sample_dim += 2;
            if bsdf_sample.value.is_black() {
                break;
            }

            vol.update(bsdf_sample.event, bsdf.as_ref());
            ray = Ray::new(bsdf.hit_point().p, bsdf_sample.d, time);
            depth += 1;
        }
    }
}
