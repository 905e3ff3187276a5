//! Photon mapping global illumination cache.
//!
//! The cache precomputes a sparse, spatially indexed approximation of direct,
//! indirect and caustic light transport by shooting photons into a scene,
//! depositing them on surfaces and answering radiance queries from the
//! renderer's surface interaction points. Construction is a one-shot
//! preprocess; the scene, light and material models stay behind the oracle
//! interfaces of `photongi_core`.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod error;
mod estimator;
mod params;
mod photon;
mod tracer;
mod visibility;

#[cfg(test)]
mod testscene;

// Re-export
pub use error::Error;
pub use params::*;
pub use photon::*;
pub use photongi_accelerators::{BvhEntry, IndexBvh, NearPhoton, PgciOctree, SharedOctree};

use crate::estimator::process_cache_entries;
use crate::tracer::{TracePhotonsState, TracePhotonsWorker};
use crate::visibility::{TraceVisibilityState, TraceVisibilityWorker};
use indicatif::{ProgressBar, ProgressStyle};
use photongi_core::bsdf::Bsdf;
use photongi_core::common::*;
use photongi_core::geometry::Normal3f;
use photongi_core::properties::Properties;
use photongi_core::scene::Scene;
use photongi_core::spectrum::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

/// The photon mapping global illumination cache. Built once by
/// `preprocess()`, then queried read-only by the renderer.
pub struct PhotonGICache<'a> {
    /// The scene oracle.
    scene: &'a dyn Scene,

    /// Normalized parameter block.
    params: PhotonGICacheParams,

    /// Cooperative interruption flag, shared with `interrupt_handle()`.
    interrupt: Arc<AtomicBool>,

    /// Per-population estimator denominators, recorded during tracing.
    direct_photon_traced_count: u32,
    indirect_photon_traced_count: u32,
    caustic_photon_traced_count: u32,

    /// Camera-visible particles gating photon deposition; alive only during
    /// the photon tracing step.
    visibility_octree: Option<PgciOctree<VisibilityParticle>>,

    direct_photons_bvh: Option<IndexBvh<Photon>>,
    indirect_photons_bvh: Option<IndexBvh<Photon>>,
    caustic_photons_bvh: Option<IndexBvh<Photon>>,
    radiance_photons_bvh: Option<IndexBvh<RadiancePhoton>>,
}

impl<'a> PhotonGICache<'a> {
    /// Create a new cache. `preprocess()` must run before any query.
    ///
    /// * `scene`  - The scene oracle.
    /// * `params` - The parameter block; normalized here.
    pub fn new(scene: &'a dyn Scene, params: PhotonGICacheParams) -> Self {
        let mut params = params;
        params.normalize();

        Self {
            scene,
            params,
            interrupt: Arc::new(AtomicBool::new(false)),
            direct_photon_traced_count: 0,
            indirect_photon_traced_count: 0,
            caustic_photon_traced_count: 0,
            visibility_octree: None,
            direct_photons_bvh: None,
            indirect_photons_bvh: None,
            caustic_photons_bvh: None,
            radiance_photons_bvh: None,
        }
    }

    /// Create a cache from configuration properties. Returns `None` when no
    /// photon population is enabled and no cache is needed.
    ///
    /// * `scene` - The scene oracle.
    /// * `cfg`   - The configuration properties.
    pub fn from_properties(scene: &'a dyn Scene, cfg: &Properties) -> Result<Option<Self>, Error> {
        Ok(PhotonGICacheParams::from_properties(cfg)?.map(|params| Self::new(scene, params)))
    }

    /// Returns the normalized parameter block.
    pub fn params(&self) -> &PhotonGICacheParams {
        &self.params
    }

    /// Returns the rendering-time visualization mode.
    pub fn debug_type(&self) -> DebugType {
        self.params.debug_type
    }

    /// Returns a handle other threads may use to cancel construction.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Returns the direct photon map, present after `preprocess()` iff the
    /// direct population is enabled and non-empty.
    pub fn direct_photons_bvh(&self) -> Option<&IndexBvh<Photon>> {
        self.direct_photons_bvh.as_ref()
    }

    /// Returns the indirect photon map; always `None` after `preprocess()`
    /// because the radiance cache supersedes it.
    pub fn indirect_photons_bvh(&self) -> Option<&IndexBvh<Photon>> {
        self.indirect_photons_bvh.as_ref()
    }

    /// Returns the caustic photon map, present after `preprocess()` iff the
    /// caustic population is enabled and non-empty.
    pub fn caustic_photons_bvh(&self) -> Option<&IndexBvh<Photon>> {
        self.caustic_photons_bvh.as_ref()
    }

    /// Returns the radiance photon map, present after `preprocess()` iff the
    /// indirect population is enabled and at least one radiance photon was
    /// deposited.
    pub fn radiance_photons_bvh(&self) -> Option<&IndexBvh<RadiancePhoton>> {
        self.radiance_photons_bvh.as_ref()
    }

    /// Returns the direct population's estimator denominator.
    pub fn direct_photon_traced_count(&self) -> u32 {
        self.direct_photon_traced_count
    }

    /// Returns the indirect population's estimator denominator.
    pub fn indirect_photon_traced_count(&self) -> u32 {
        self.indirect_photon_traced_count
    }

    /// Returns the caustic population's estimator denominator.
    pub fn caustic_photon_traced_count(&self) -> u32 {
        self.caustic_photon_traced_count
    }

    /// Returns the worker thread count for the construction passes.
    fn thread_count(&self) -> usize {
        if self.params.thread_count > 0 {
            self.params.thread_count
        } else {
            thread::available_parallelism().map_or(1, |n| n.get())
        }
    }

    /// Returns the progress bar style shared by the construction passes.
    fn progress_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{msg:25.cyan.bold} [{bar:40.green/white}] {pos:>8}/{len:8} ({elapsed}|{eta})")
            .progress_chars("█▓▒░  ")
    }

    /// Runs the visibility pass: one worker per thread distributes
    /// camera-visible surface points into a shared octree until the octree
    /// hit rate reaches its target.
    fn trace_visibility_particles(&self) -> Result<PgciOctree<VisibilityParticle>, Error> {
        let thread_count = self.thread_count();
        info!("Photon GI trace visibility particles thread count: {}", thread_count);

        let octree = SharedOctree::new(PgciOctree::new(
            self.scene.world_bound(),
            self.params.visibility.lookup_radius,
            self.params.visibility.lookup_normal_angle,
        ));
        let state = TraceVisibilityState::new(&octree);

        let progress = ProgressBar::new(u64::from(self.params.visibility.max_sample_count));
        progress.set_style(Self::progress_style());
        progress.set_message("Visibility particles");

        thread::scope(|scope| {
            for worker_index in 0..thread_count {
                let state = &state;
                let progress = &progress;
                scope.spawn(move || {
                    TraceVisibilityWorker {
                        worker_index,
                        worker_count: thread_count,
                        params: &self.params,
                        scene: self.scene,
                        state,
                        interrupt: self.interrupt.as_ref(),
                        progress: Some(progress),
                    }
                    .run();
                });
            }
        });

        progress.finish_and_clear();

        if self.interrupt.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }

        info!(
            "Photon GI visibility total entries: {} (hit rate {:.3})",
            octree.len(),
            state.hit_rate()
        );

        Ok(octree.into_inner())
    }

    /// Runs the photon tracing pass and returns the concatenated photon
    /// populations.
    #[allow(clippy::type_complexity)]
    fn trace_photons(&mut self) -> Result<(Vec<Photon>, Vec<Photon>, Vec<Photon>, Vec<RadiancePhoton>), Error> {
        let thread_count = self.thread_count();
        info!("Photon GI trace photons thread count: {}", thread_count);

        let state = TracePhotonsState::new();

        let progress = ProgressBar::new(u64::from(self.params.photon.max_traced_count));
        progress.set_style(Self::progress_style());
        progress.set_message("Tracing photons");

        let params = &self.params;
        let scene = self.scene;
        let visibility_octree = self.visibility_octree.as_ref();
        let interrupt = self.interrupt.as_ref();

        let mut workers: Vec<TracePhotonsWorker> = (0..thread_count)
            .map(|worker_index| {
                TracePhotonsWorker::new(
                    worker_index,
                    params,
                    scene,
                    visibility_octree,
                    &state,
                    interrupt,
                    Some(&progress),
                )
            })
            .collect();

        let results: Vec<Result<(), Error>> = thread::scope(|scope| {
            let handles: Vec<_> = workers
                .iter_mut()
                .map(|worker| scope.spawn(move || worker.run()))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("photon tracing worker panicked"))
                .collect()
        });

        progress.finish_and_clear();

        // A failed bootstrap outranks the cancellations it triggered in the
        // other workers.
        if results.iter().any(|result| *result == Err(Error::EmptyScene)) {
            return Err(Error::EmptyScene);
        }
        if let Some(Err(err)) = results.iter().find(|result| result.is_err()) {
            return Err(err.clone());
        }

        // Concatenate the thread local vectors.
        let mut direct_photons = Vec::new();
        let mut indirect_photons = Vec::new();
        let mut caustic_photons = Vec::new();
        let mut radiance_photons = Vec::new();
        for worker in workers.iter_mut() {
            direct_photons.append(&mut worker.direct_photons);
            indirect_photons.append(&mut worker.indirect_photons);
            caustic_photons.append(&mut worker.caustic_photons);
            radiance_photons.append(&mut worker.radiance_photons);
        }

        self.direct_photon_traced_count = state.direct_traced.load(Ordering::SeqCst);
        self.indirect_photon_traced_count = state.indirect_traced.load(Ordering::SeqCst);
        self.caustic_photon_traced_count = state.caustic_traced.load(Ordering::SeqCst);

        debug_assert_eq!(state.direct_size.load(Ordering::SeqCst) as usize, direct_photons.len());
        debug_assert_eq!(state.indirect_size.load(Ordering::SeqCst) as usize, indirect_photons.len());
        debug_assert_eq!(state.caustic_size.load(Ordering::SeqCst) as usize, caustic_photons.len());

        direct_photons.shrink_to_fit();
        indirect_photons.shrink_to_fit();
        caustic_photons.shrink_to_fit();
        radiance_photons.shrink_to_fit();

        // The bucket counter overshoots the actual total by up to one bucket
        // per worker.
        info!(
            "Photon GI total photon traced: {}",
            state.photons_counter.load(Ordering::SeqCst)
        );
        info!(
            "Photon GI total direct photon stored: {} ({} traced)",
            direct_photons.len(),
            self.direct_photon_traced_count
        );
        info!(
            "Photon GI total indirect photon stored: {} ({} traced)",
            indirect_photons.len(),
            self.indirect_photon_traced_count
        );
        info!(
            "Photon GI total caustic photon stored: {} ({} traced)",
            caustic_photons.len(),
            self.caustic_photon_traced_count
        );
        info!("Photon GI total radiance photon stored: {}", radiance_photons.len());

        Ok((direct_photons, indirect_photons, caustic_photons, radiance_photons))
    }

    /// Accumulates one population's box filtered contribution into a radiance
    /// photon.
    ///
    /// * `radiance_photon`     - The radiance photon being integrated.
    /// * `photons_bvh`         - The population's photon map, when present.
    /// * `photon_traced_count` - The population's estimator denominator.
    fn add_outgoing_radiance(
        radiance_photon: &mut RadiancePhoton,
        photons_bvh: Option<&IndexBvh<Photon>>,
        photon_traced_count: u32,
    ) {
        if let Some(bvh) = photons_bvh {
            let (entries, max_distance2) = bvh.get_all_near_entries(&radiance_photon.p, &radiance_photon.n);

            if !entries.is_empty() {
                let mut result = Spectrum::ZERO;
                for near_photon in entries.iter() {
                    let photon = bvh.entry(near_photon.entry_index);

                    // Using a box filter here.
                    result += photon.alpha * radiance_photon.n.abs_dot_vec(&-photon.d);
                }

                result /= photon_traced_count as Float * max_distance2 * PI;

                radiance_photon.outgoing_radiance += result;
            }
        }
    }

    /// Rewrites one radiance photon's scratch albedo into its final outgoing
    /// radiance.
    ///
    /// * `radiance_photon` - The radiance photon to integrate.
    fn fill_radiance_photon_data(&self, radiance_photon: &mut RadiancePhoton) {
        // This value was saved at creation time.
        let bsdf_evaluate_total = radiance_photon.outgoing_radiance;

        radiance_photon.outgoing_radiance = Spectrum::ZERO;
        Self::add_outgoing_radiance(
            radiance_photon,
            self.direct_photons_bvh.as_ref(),
            self.direct_photon_traced_count,
        );
        Self::add_outgoing_radiance(
            radiance_photon,
            self.indirect_photons_bvh.as_ref(),
            self.indirect_photon_traced_count,
        );
        Self::add_outgoing_radiance(
            radiance_photon,
            self.caustic_photons_bvh.as_ref(),
            self.caustic_photon_traced_count,
        );

        radiance_photon.outgoing_radiance *= bsdf_evaluate_total * INV_PI;
    }

    /// Pre-integrates every radiance photon; embarrassingly parallel, each
    /// entry written once.
    ///
    /// * `radiance_photons` - The radiance photons to integrate.
    fn fill_radiance_photons_data(&self, radiance_photons: &mut [RadiancePhoton]) {
        let total = radiance_photons.len();
        let counter = AtomicU32::new(0);

        radiance_photons.par_iter_mut().for_each(|radiance_photon| {
            self.fill_radiance_photon_data(radiance_photon);

            let filled = counter.fetch_add(1, Ordering::Relaxed) + 1;
            if filled % 65536 == 0 {
                info!("Radiance photon filled entries: {}/{}", filled, total);
            }
        });
    }

    /// Builds the cache: visibility pass, photon tracing, spatial index
    /// construction, radiance pre-integration and the release of everything
    /// rendering will not consult. Either completes fully or reports an
    /// error; never leaves a half-built cache behind.
    pub fn preprocess(&mut self) -> Result<(), Error> {
        // Visibility information is used only by the Metropolis sampler.
        if self.params.sampler_type == SamplerType::Metropolis && self.params.visibility.enabled {
            let octree = self.trace_visibility_particles()?;
            self.visibility_octree = Some(octree);
        }

        // Fill all photon populations.
        let trace_result = self.trace_photons();

        // The visibility octree is dead weight from here on, even when
        // tracing failed.
        self.visibility_octree = None;

        let (direct_photons, indirect_photons, caustic_photons, mut radiance_photons) = trace_result?;

        // Direct light photon map; also needed to seed the radiance cache.
        if !direct_photons.is_empty() && (self.params.direct.enabled || self.params.indirect.enabled) {
            info!("Photon GI building direct photons BVH");
            self.direct_photons_bvh = Some(IndexBvh::new(
                direct_photons,
                self.params.direct.lookup_max_count as usize,
                self.params.direct.lookup_radius,
                self.params.direct.lookup_normal_angle,
            ));
        }

        // Indirect light photon map.
        if !indirect_photons.is_empty() && self.params.indirect.enabled {
            info!("Photon GI building indirect photons BVH");
            self.indirect_photons_bvh = Some(IndexBvh::new(
                indirect_photons,
                self.params.indirect.lookup_max_count as usize,
                self.params.indirect.lookup_radius,
                self.params.indirect.lookup_normal_angle,
            ));
        }

        // Caustic photon map.
        if !caustic_photons.is_empty() && self.params.caustic.enabled {
            info!("Photon GI building caustic photons BVH");
            self.caustic_photons_bvh = Some(IndexBvh::new(
                caustic_photons,
                self.params.caustic.lookup_max_count as usize,
                self.params.caustic.lookup_radius,
                self.params.caustic.lookup_normal_angle,
            ));
        }

        // Radiance photon map. Pre-integration must run while the indirect
        // map is still alive.
        if !radiance_photons.is_empty() && self.params.indirect.enabled {
            info!("Photon GI building radiance photon data");
            self.fill_radiance_photons_data(&mut radiance_photons);

            info!("Photon GI building radiance photons BVH");
            self.radiance_photons_bvh = Some(IndexBvh::new(
                radiance_photons,
                self.params.indirect.lookup_max_count as usize,
                self.params.indirect.lookup_radius,
                self.params.indirect.lookup_normal_angle,
            ));
        }

        // Release whatever rendering is not going to consult.
        if !self.params.direct.enabled {
            self.direct_photons_bvh = None;
        }

        // The radiance cache supersedes the indirect photon map.
        self.indirect_photons_bvh = None;

        if !self.params.caustic.enabled {
            self.caustic_photons_bvh = None;
        }

        // Memory statistics.
        let mut total_memory_usage = 0;
        if let Some(bvh) = &self.direct_photons_bvh {
            info!("Photon GI direct cache memory usage: {}", memory_string(bvh.memory_usage()));
            total_memory_usage += bvh.memory_usage();
        }
        if let Some(bvh) = &self.caustic_photons_bvh {
            info!("Photon GI caustic cache memory usage: {}", memory_string(bvh.memory_usage()));
            total_memory_usage += bvh.memory_usage();
        }
        if let Some(bvh) = &self.radiance_photons_bvh {
            info!("Photon GI radiance cache memory usage: {}", memory_string(bvh.memory_usage()));
            total_memory_usage += bvh.memory_usage();
        }
        info!("Photon GI total memory usage: {}", memory_string(total_memory_usage));

        Ok(())
    }

    /// Returns the query normal: the shading normal flipped to the side the
    /// interaction was created on.
    fn query_normal(bsdf: &dyn Bsdf) -> Normal3f {
        let hit_point = bsdf.hit_point();
        (if hit_point.into_object { 1.0 } else { -1.0 }) * hit_point.shade_n
    }

    /// Density estimated radiance from the direct photon map, or black when
    /// the map is absent.
    ///
    /// * `bsdf` - The surface interaction being shaded; must participate in
    ///            photon based global illumination.
    pub fn direct_radiance(&self, bsdf: &dyn Bsdf) -> Spectrum {
        debug_assert!(bsdf.is_photon_gi_enabled());

        match &self.direct_photons_bvh {
            Some(bvh) => {
                let n = Self::query_normal(bsdf);
                let (entries, max_distance2) = bvh.get_all_near_entries(&bsdf.hit_point().p, &n);
                process_cache_entries(
                    &entries,
                    bvh.entries(),
                    self.direct_photon_traced_count,
                    max_distance2,
                    bsdf,
                )
            }
            None => Spectrum::ZERO,
        }
    }

    /// The nearest pre-integrated radiance cache entry, or black when the
    /// radiance map is absent.
    ///
    /// * `bsdf` - The surface interaction being shaded; must participate in
    ///            photon based global illumination.
    pub fn indirect_radiance(&self, bsdf: &dyn Bsdf) -> Spectrum {
        debug_assert!(bsdf.is_photon_gi_enabled());

        match &self.radiance_photons_bvh {
            Some(bvh) => {
                let n = Self::query_normal(bsdf);
                match bvh.get_nearest_entry(&bsdf.hit_point().p, &n) {
                    Some(radiance_photon) => radiance_photon.outgoing_radiance,
                    None => Spectrum::ZERO,
                }
            }
            None => Spectrum::ZERO,
        }
    }

    /// Density estimated radiance from the caustic photon map, or black when
    /// the map is absent.
    ///
    /// * `bsdf` - The surface interaction being shaded; must participate in
    ///            photon based global illumination.
    pub fn caustic_radiance(&self, bsdf: &dyn Bsdf) -> Spectrum {
        debug_assert!(bsdf.is_photon_gi_enabled());

        match &self.caustic_photons_bvh {
            Some(bvh) => {
                let n = Self::query_normal(bsdf);
                let (entries, max_distance2) = bvh.get_all_near_entries(&bsdf.hit_point().p, &n);
                process_cache_entries(
                    &entries,
                    bvh.entries(),
                    self.caustic_photon_traced_count,
                    max_distance2,
                    bsdf,
                )
            }
            None => Spectrum::ZERO,
        }
    }

    /// Box filter average of every radiance cache entry inside the filter
    /// ball, or black when the radiance map is absent.
    ///
    /// * `bsdf` - The surface interaction being shaded; must participate in
    ///            photon based global illumination.
    pub fn all_radiance(&self, bsdf: &dyn Bsdf) -> Spectrum {
        debug_assert!(bsdf.is_photon_gi_enabled());

        let mut result = Spectrum::ZERO;
        if let Some(bvh) = &self.radiance_photons_bvh {
            let n = Self::query_normal(bsdf);
            let (entries, _max_distance2) = bvh.get_all_near_entries(&bsdf.hit_point().p, &n);

            if !entries.is_empty() {
                for near_photon in entries.iter() {
                    // Using a box filter here.
                    result += bvh.entry(near_photon.entry_index).outgoing_radiance;
                }
                result /= entries.len() as Float;
            }
        }

        result
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
