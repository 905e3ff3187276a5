//! Photon tracing workers
//!
//! The Metropolis sampler implements the adaptive Markov chain photon tracing
//! of Hachisuka and Jensen, "Robust Adaptive Photon Tracing using Photon Path
//! Visibility" (2011).

use crate::error::Error;
use crate::params::{PhotonGICacheParams, SamplerType};
use crate::photon::{Photon, RadiancePhoton, VisibilityParticle};
use indicatif::ProgressBar;
use photongi_accelerators::PgciOctree;
use photongi_core::bsdf::BSDFEvent;
use photongi_core::common::*;
use photongi_core::geometry::*;
use photongi_core::rng::RNG;
use photongi_core::scene::{Scene, VolumeInfo};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Samples consumed before the first light vertex: camera time, light pick
/// and five emission samples.
pub(crate) const SAMPLE_BOOT_SIZE: usize = 7;

/// Samples consumed per light vertex.
pub(crate) const SAMPLE_STEP_SIZE: usize = 4;

/// Photons competed for per bucket of work.
pub(crate) const PHOTON_WORK_BUCKET: u32 = 4096;

/// Uniform attempts to seed a Markov chain before giving up on the scene.
const BOOTSTRAP_MAX_ATTEMPTS: usize = 16384;

/// Probability of depositing a radiance photon alongside a stored photon; a
/// Russian-roulette style subsampling of the radiance cache.
const RADIANCE_PHOTON_PROBABILITY: Float = 0.9;

/// The optimal asymptotic acceptance ratio, 23.4% [Roberts et al. 1997].
const TARGET_ACCEPTANCE_RATE: Float = 0.234;

/// Counters shared by the photon tracing workers. Population sizes are
/// reserved against their budget with a bounded compare-and-swap, so stored
/// counts never exceed the budget.
pub(crate) struct TracePhotonsState {
    /// Bucket allocator over the traced photon budget.
    pub photons_counter: AtomicU32,

    /// Per-population traced counters, the density estimator denominators.
    pub direct_traced: AtomicU32,
    pub indirect_traced: AtomicU32,
    pub caustic_traced: AtomicU32,

    /// Per-population stored sizes.
    pub direct_size: AtomicU32,
    pub indirect_size: AtomicU32,
    pub caustic_size: AtomicU32,
}

impl TracePhotonsState {
    /// Create zeroed counters for a photon tracing pass.
    pub fn new() -> Self {
        Self {
            photons_counter: AtomicU32::new(0),
            direct_traced: AtomicU32::new(0),
            indirect_traced: AtomicU32::new(0),
            caustic_traced: AtomicU32::new(0),
            direct_size: AtomicU32::new(0),
            indirect_size: AtomicU32::new(0),
            caustic_size: AtomicU32::new(0),
        }
    }
}

/// Photons deposited by a single light path.
#[derive(Clone, Default)]
pub(crate) struct PathPhotons {
    pub direct: Vec<Photon>,
    pub indirect: Vec<Photon>,
    pub caustic: Vec<Photon>,
    pub radiance: Vec<RadiancePhoton>,
}

impl PathPhotons {
    /// Clears all photon lists.
    fn clear(&mut self) {
        self.direct.clear();
        self.indirect.clear();
        self.caustic.clear();
        self.radiance.clear();
    }
}

/// Chain statistics of one Metropolis bucket.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BucketStats {
    pub uniform_count: u32,
    pub accepted_count: u32,
    pub mutated_count: u32,
}

/// Applies the exponential kernel mutation to one sample value, wrapping the
/// result back into `[0, 1)`.
///
/// * `rng`           - The worker's random generator.
/// * `value`         - The sample value to mutate.
/// * `mutation_size` - The mutation step size.
pub(crate) fn mutate_sample(rng: &mut RNG, value: Float, mutation_size: Float) -> Float {
    debug_assert!(mutation_size > 0.0);

    let delta_u = rng.uniform_float().powf(1.0 / mutation_size + 1.0);

    let mut mutated = value;
    if rng.uniform_float() < 0.5 {
        mutated += delta_u;
        if mutated >= 1.0 {
            mutated -= 1.0;
        }
    } else {
        mutated -= delta_u;
        if mutated < 0.0 {
            mutated += 1.0;
        }
    }

    // Numerical precision can still leave the value at the excluded bound.
    if mutated == 1.0 {
        0.0
    } else {
        mutated
    }
}

/// Mutates every sample of a path independently.
///
/// * `rng`           - The worker's random generator.
/// * `current`       - The samples of the current path.
/// * `candidate`     - Receives the mutated samples.
/// * `mutation_size` - The mutation step size.
pub(crate) fn mutate_samples(rng: &mut RNG, current: &[Float], candidate: &mut [Float], mutation_size: Float) {
    debug_assert_eq!(current.len(), candidate.len());

    for (candidate_value, value) in candidate.iter_mut().zip(current.iter()) {
        let mutated = mutate_sample(rng, *value, mutation_size);
        debug_assert!((0.0..1.0).contains(&mutated));
        *candidate_value = mutated;
    }
}

/// Reserves up to `want` slots against a population budget. The bounded
/// compare-and-swap keeps the stored size at or below the budget even while
/// several workers flush concurrently.
///
/// * `size`     - The population's shared size counter.
/// * `max_size` - The population budget.
/// * `want`     - Entries the caller would like to store.
fn reserve_entries(size: &AtomicU32, max_size: u32, want: usize) -> usize {
    if want == 0 {
        return 0;
    }

    let mut current = size.load(Ordering::SeqCst);
    loop {
        if current >= max_size {
            return 0;
        }
        let take = min(want as u32, max_size - current);
        match size.compare_exchange_weak(current, current + take, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return take as usize,
            Err(actual) => current = actual,
        }
    }
}

/// A photon tracing worker. Workers compete over the shared bucket allocator
/// and deposit photons into thread local vectors, concatenated by the
/// coordinator after the join.
pub(crate) struct TracePhotonsWorker<'a> {
    pub worker_index: usize,
    params: &'a PhotonGICacheParams,
    scene: &'a dyn Scene,
    visibility_octree: Option<&'a PgciOctree<VisibilityParticle>>,
    state: &'a TracePhotonsState,
    interrupt: &'a AtomicBool,
    progress: Option<&'a ProgressBar>,

    rng: RNG,

    // Population-full snapshots taken at each bucket start.
    direct_done: bool,
    indirect_done: bool,
    caustic_done: bool,

    /// Deposited photons, owned by this worker until the join.
    pub direct_photons: Vec<Photon>,
    pub indirect_photons: Vec<Photon>,
    pub caustic_photons: Vec<Photon>,
    pub radiance_photons: Vec<RadiancePhoton>,
}

impl<'a> TracePhotonsWorker<'a> {
    /// Create a new worker.
    ///
    /// * `worker_index`      - Index of this worker, also its seed.
    /// * `params`            - The cache parameter block.
    /// * `scene`             - The scene oracle.
    /// * `visibility_octree` - Optional visibility gate for deposits.
    /// * `state`             - Shared counters.
    /// * `interrupt`         - Cooperative interruption flag.
    /// * `progress`          - Optional progress reporting.
    pub fn new(
        worker_index: usize,
        params: &'a PhotonGICacheParams,
        scene: &'a dyn Scene,
        visibility_octree: Option<&'a PgciOctree<VisibilityParticle>>,
        state: &'a TracePhotonsState,
        interrupt: &'a AtomicBool,
        progress: Option<&'a ProgressBar>,
    ) -> Self {
        Self {
            worker_index,
            params,
            scene,
            visibility_octree,
            state,
            interrupt,
            progress,
            rng: RNG::new(1 + worker_index as u64),
            direct_done: false,
            indirect_done: false,
            caustic_done: false,
            direct_photons: Vec::new(),
            indirect_photons: Vec::new(),
            caustic_photons: Vec::new(),
            radiance_photons: Vec::new(),
        }
    }

    /// Runs the worker until the photon budget is exhausted, every enabled
    /// population is full, or the pass is interrupted. On failing to seed a
    /// Markov chain the worker raises the interruption flag so its peers exit
    /// promptly.
    pub fn run(&mut self) -> Result<(), Error> {
        let max_traced_count = self.params.photon.max_traced_count;
        let sample_size = SAMPLE_BOOT_SIZE + self.params.photon.max_path_depth as usize * SAMPLE_STEP_SIZE;

        loop {
            if self.interrupt.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }

            // Compete for a bucket of work.
            let mut work_counter = self.state.photons_counter.load(Ordering::SeqCst);
            loop {
                match self.state.photons_counter.compare_exchange_weak(
                    work_counter,
                    work_counter + PHOTON_WORK_BUCKET,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                ) {
                    Ok(_) => break,
                    Err(actual) => work_counter = actual,
                }
            }

            if work_counter >= max_traced_count {
                break;
            }

            // Snapshot the population budgets before counting this bucket:
            // once a population is full its photons receive no new
            // contributions, so later buckets must not dilute its estimator
            // denominator.
            self.direct_done = self.state.direct_size.load(Ordering::SeqCst) >= self.params.direct.max_size;
            self.indirect_done = self.state.indirect_size.load(Ordering::SeqCst) >= self.params.indirect.max_size;
            self.caustic_done = self.state.caustic_size.load(Ordering::SeqCst) >= self.params.caustic.max_size;

            let work_to_do = min(PHOTON_WORK_BUCKET, max_traced_count - work_counter);

            if !self.direct_done {
                self.state.direct_traced.fetch_add(work_to_do, Ordering::SeqCst);
            }
            if !self.indirect_done {
                self.state.indirect_traced.fetch_add(work_to_do, Ordering::SeqCst);
            }
            if !self.caustic_done {
                self.state.caustic_traced.fetch_add(work_to_do, Ordering::SeqCst);
            }

            if let Some(progress) = self.progress {
                progress.set_position(u64::from(work_counter));
            }

            match self.params.sampler_type {
                SamplerType::Metropolis => {
                    let direct_start = self.direct_photons.len();
                    let indirect_start = self.indirect_photons.len();
                    let caustic_start = self.caustic_photons.len();

                    let stats = match self.metropolis_bucket(sample_size, work_to_do) {
                        Ok(stats) => stats,
                        Err(err) => {
                            self.interrupt.store(true, Ordering::SeqCst);
                            return Err(err);
                        }
                    };

                    // Normalize this bucket's photons by the share of uniform
                    // samples; radiance photons carry albedos, not radiometric
                    // values, and stay unscaled.
                    let scale_factor = stats.uniform_count as Float / work_to_do as Float;
                    for photon in self.direct_photons[direct_start..].iter_mut() {
                        photon.alpha *= scale_factor;
                    }
                    for photon in self.indirect_photons[indirect_start..].iter_mut() {
                        photon.alpha *= scale_factor;
                    }
                    for photon in self.caustic_photons[caustic_start..].iter_mut() {
                        photon.alpha *= scale_factor;
                    }
                }
                SamplerType::Random => self.random_bucket(sample_size, work_to_do)?,
            }

            if self.direct_done && self.indirect_done && self.caustic_done {
                break;
            }
        }

        Ok(())
    }

    /// Traces a bucket of uniform light paths.
    ///
    /// * `sample_size` - Length of a path sample vector.
    /// * `work_to_do`  - Paths to trace.
    fn random_bucket(&mut self, sample_size: usize, work_to_do: u32) -> Result<(), Error> {
        let mut samples = vec![0.0; sample_size];
        let mut path = PathPhotons::default();

        for _ in 0..work_to_do {
            if self.interrupt.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }

            self.uniform_mutate(&mut samples);
            self.trace_photon_path(&samples, &mut path);
            self.add_photons(1.0, &path);
        }

        Ok(())
    }

    /// Runs one bucket of the Markov chain: bootstrap a useful path with
    /// uniform sampling, then alternate uniform replacement and exponential
    /// mutations, flushing the current state at every transition.
    ///
    /// * `sample_size` - Length of a path sample vector.
    /// * `work_to_do`  - Chain steps to run.
    fn metropolis_bucket(&mut self, sample_size: usize, work_to_do: u32) -> Result<BucketStats, Error> {
        let mut current_samples = vec![0.0; sample_size];
        let mut candidate_samples = vec![0.0; sample_size];
        let mut uniform_samples = vec![0.0; sample_size];

        let mut current = PathPhotons::default();
        let mut candidate = PathPhotons::default();
        let mut uniform = PathPhotons::default();

        // Look for a useful path to start with.
        let mut found_useful = false;
        for _ in 0..BOOTSTRAP_MAX_ATTEMPTS {
            if self.interrupt.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }

            self.uniform_mutate(&mut current_samples);
            if self.trace_photon_path(&current_samples, &mut current) {
                found_useful = true;
                break;
            }
        }
        if !found_useful {
            return Err(Error::EmptyScene);
        }

        let mut current_photons_scale: u32 = 1;
        let mut mutation_size: Float = 1.0;
        let mut accepted_count: u32 = 1;
        let mut mutated_count: u32 = 1;
        let mut uniform_count: u32 = 1;

        for _ in 0..work_to_do {
            if self.interrupt.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }

            self.uniform_mutate(&mut uniform_samples);
            if self.trace_photon_path(&uniform_samples, &mut uniform) {
                // Flush the old current photons, scaled by their multiplicity.
                self.add_photons(current_photons_scale as Float, &current);

                // The uniform path becomes the current one.
                current_samples.copy_from_slice(&uniform_samples);
                std::mem::swap(&mut current, &mut uniform);
                current_photons_scale = 1;

                uniform_count += 1;
            } else {
                // Try a mutation of the current path.
                mutate_samples(&mut self.rng, &current_samples, &mut candidate_samples, mutation_size);
                mutated_count += 1;

                if self.trace_photon_path(&candidate_samples, &mut candidate) {
                    self.add_photons(current_photons_scale as Float, &current);

                    current_samples.copy_from_slice(&candidate_samples);
                    std::mem::swap(&mut current, &mut candidate);
                    current_photons_scale = 1;

                    accepted_count += 1;
                } else {
                    // Rejected; the current state accrues one more copy.
                    current_photons_scale += 1;
                }

                let acceptance_rate = accepted_count as Float / mutated_count as Float;
                mutation_size += (acceptance_rate - TARGET_ACCEPTANCE_RATE) / mutated_count as Float;
                // Keep the mutation kernel exponent positive.
                mutation_size = max(mutation_size, DEFAULT_EPSILON_MIN);
            }
        }

        // Flush the last current state; dropping it would lose its
        // accumulated multiplicity.
        self.add_photons(current_photons_scale as Float, &current);

        Ok(BucketStats {
            uniform_count,
            accepted_count,
            mutated_count,
        })
    }

    /// Fills a sample vector with uniform random values.
    ///
    /// * `samples` - The sample vector to fill.
    fn uniform_mutate(&mut self, samples: &mut [Float]) {
        for sample in samples.iter_mut() {
            *sample = self.rng.uniform_float();
        }
    }

    /// Traces one light path, depositing classified photons into `out`.
    /// Returns true when the path deposited, or would have deposited, at
    /// least one photon for an enabled population.
    ///
    /// * `samples` - The path's sample vector.
    /// * `out`     - Receives the deposited photons.
    pub(crate) fn trace_photon_path(&mut self, samples: &[Float], out: &mut PathPhotons) -> bool {
        out.clear();

        let mut useful_path = false;

        let time = self.scene.camera_ray_time(samples[0]);

        // Select one light source.
        let (light, light_pick_pdf) = match self.scene.sample_light(samples[1]) {
            Some(pick) => pick,
            None => return false,
        };

        // Initialize the light path.
        let emission = light.emit(
            self.scene,
            [samples[2], samples[3], samples[4], samples[5], samples[6]],
        );
        if emission.value.is_black() || emission.pdf_w <= 0.0 || light_pick_pdf <= 0.0 {
            return false;
        }

        let mut ray = emission.ray;
        ray.time = time;
        let mut light_path_flux = emission.value / (emission.pdf_w * light_pick_pdf);
        debug_assert!(!light_path_flux.has_nans() && !light_path_flux.is_infinite());

        let mut specular_path = true;
        let mut vol = VolumeInfo::default();
        let mut depth: u32 = 1;
        while depth <= self.params.photon.max_path_depth {
            let sample_offset = SAMPLE_BOOT_SIZE + (depth as usize - 1) * SAMPLE_STEP_SIZE;

            let hit = match self.scene.intersect(&ray, &mut vol, samples[sample_offset]) {
                Some(hit) => hit,
                // Ray lost in space.
                None => break,
            };

            light_path_flux *= hit.throughput;
            let bsdf = hit.bsdf;

            // Photons are deposited on diffuse surfaces only.
            if bsdf.is_photon_gi_enabled() {
                let hit_point = *bsdf.hit_point();
                let landing_normal = hit_point.shade_n.face_forward(&-ray.d);

                // With a visibility octree present, keep only vertices the
                // rendering will actually look at.
                let visible_point = match self.visibility_octree {
                    Some(octree) => octree.get_nearest_entry(&hit_point.p, &landing_normal).is_some(),
                    None => true,
                };

                if visible_point {
                    let mut used_photon = false;
                    if depth == 1 && (self.params.direct.enabled || self.params.indirect.enabled) {
                        // It is a direct light photon.
                        if !self.direct_done {
                            out.direct
                                .push(Photon::new(hit_point.p, ray.d, light_path_flux, landing_normal));
                            used_photon = true;
                        }
                        useful_path = true;
                    } else if depth > 1 && specular_path && self.params.caustic.enabled {
                        // It is a caustic photon.
                        if !self.caustic_done {
                            out.caustic
                                .push(Photon::new(hit_point.p, ray.d, light_path_flux, landing_normal));
                            used_photon = true;
                        }
                        useful_path = true;
                    } else if self.params.indirect.enabled {
                        // It is an indirect photon.
                        if !self.indirect_done {
                            out.indirect
                                .push(Photon::new(hit_point.p, ray.d, light_path_flux, landing_normal));
                            used_photon = true;
                        }
                        useful_path = true;
                    }

                    // Subsample the radiance cache; the stored value is the
                    // surface albedo until pre-integration rewrites it.
                    if used_photon
                        && self.params.indirect.enabled
                        && self.rng.uniform_float() < RADIANCE_PHOTON_PROBABILITY
                    {
                        out.radiance
                            .push(RadiancePhoton::new(hit_point.p, landing_normal, bsdf.evaluate_total()));
                    }
                }
            }

            if depth >= self.params.photon.max_path_depth {
                break;
            }

            // Build the next path vertex ray. The sample at offset + 1 stays
            // reserved for the intersection sampler.
            let bsdf_sample = bsdf.sample(samples[sample_offset + 2], samples[sample_offset + 3]);
            if bsdf_sample.value.is_black() {
                break;
            }

            // Is it still a specular path?
            specular_path = specular_path && bsdf_sample.event.contains(BSDFEvent::SPECULAR);

            light_path_flux *= bsdf_sample.value;
            debug_assert!(!light_path_flux.has_nans() && !light_path_flux.is_infinite());

            vol.update(bsdf_sample.event, bsdf.as_ref());

            ray = Ray::new(bsdf.hit_point().p, bsdf_sample.d, time);
            depth += 1;
        }

        useful_path
    }

    /// Flushes one path's photons into the worker vectors, scaled by the
    /// path's multiplicity and capped by the population budgets.
    ///
    /// * `photons_scale` - The path's multiplicity.
    /// * `new_photons`   - The photons to flush.
    pub(crate) fn add_photons(&mut self, photons_scale: Float, new_photons: &PathPhotons) {
        let take = reserve_entries(&self.state.direct_size, self.params.direct.max_size, new_photons.direct.len());
        for photon in new_photons.direct.iter().take(take) {
            let mut photon = photon.clone();
            photon.alpha *= photons_scale;
            self.direct_photons.push(photon);
        }

        let take = reserve_entries(
            &self.state.indirect_size,
            self.params.indirect.max_size,
            new_photons.indirect.len(),
        );
        for photon in new_photons.indirect.iter().take(take) {
            let mut photon = photon.clone();
            photon.alpha *= photons_scale;
            self.indirect_photons.push(photon);
        }

        let take = reserve_entries(
            &self.state.caustic_size,
            self.params.caustic.max_size,
            new_photons.caustic.len(),
        );
        for photon in new_photons.caustic.iter().take(take) {
            let mut photon = photon.clone();
            photon.alpha *= photons_scale;
            self.caustic_photons.push(photon);
        }

        // Nothing to scale for radiance photons.
        self.radiance_photons.extend_from_slice(&new_photons.radiance);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testscene::{cornell_box, open_floor_scene};
    use photongi_core::spectrum::Spectrum;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mutation_stays_in_the_unit_interval(
            value in 0.0..1.0f32,
            mutation_size in 0.001..64.0f32,
            seed in 0u64..1024,
        ) {
            let mut rng = RNG::new(seed);
            for _ in 0..16 {
                let mutated = mutate_sample(&mut rng, value, mutation_size);
                prop_assert!((0.0..1.0).contains(&mutated));
            }
        }
    }

    #[test]
    fn reservation_respects_the_budget() {
        let size = AtomicU32::new(0);
        assert_eq!(reserve_entries(&size, 10, 6), 6);
        assert_eq!(reserve_entries(&size, 10, 6), 4);
        assert_eq!(reserve_entries(&size, 10, 6), 0);
        assert_eq!(size.load(Ordering::SeqCst), 10);
    }

    fn test_params(sampler_type: SamplerType) -> PhotonGICacheParams {
        let mut params = PhotonGICacheParams {
            sampler_type,
            ..Default::default()
        };
        params.direct.enabled = true;
        params.direct.max_size = 1 << 20;
        params.visibility.enabled = false;
        params.thread_count = 1;
        params.normalize();
        params
    }

    #[test]
    fn every_chain_transition_is_flushed() {
        // Every light path in the closed box hits a wall at depth one, so
        // every uniform draw replaces the current state and each state is
        // flushed with multiplicity one: the chain stores exactly one photon
        // more than its step count.
        let scene = cornell_box();
        let params = test_params(SamplerType::Metropolis);
        let state = TracePhotonsState::new();
        let interrupt = AtomicBool::new(false);

        let mut worker = TracePhotonsWorker::new(0, &params, &scene, None, &state, &interrupt, None);
        let work_to_do = 1024;
        let stats = worker
            .metropolis_bucket(
                SAMPLE_BOOT_SIZE + params.photon.max_path_depth as usize * SAMPLE_STEP_SIZE,
                work_to_do,
            )
            .unwrap();

        assert_eq!(stats.uniform_count, work_to_do + 1);
        assert_eq!(worker.direct_photons.len() as u32, work_to_do + 1);
    }

    #[test]
    fn chain_multiplicity_is_conserved() {
        // In the open scene roughly half of the emitted photons miss the
        // floor; rejected transitions accrue multiplicity on the current
        // state. Every chain step contributes exactly one multiplicity to
        // some flushed state, so the unscaled energies sum to step count plus
        // one times the per-path energy.
        let scene = open_floor_scene();
        let params = test_params(SamplerType::Metropolis);
        let state = TracePhotonsState::new();
        let interrupt = AtomicBool::new(false);

        let mut worker = TracePhotonsWorker::new(0, &params, &scene, None, &state, &interrupt, None);
        let work_to_do = 1024;
        worker
            .metropolis_bucket(
                SAMPLE_BOOT_SIZE + params.photon.max_path_depth as usize * SAMPLE_STEP_SIZE,
                work_to_do,
            )
            .unwrap();

        // Uniform emission over the sphere: flux = intensity * 4 pi.
        let per_path_energy = (Spectrum::new(1.0) * 4.0 * PI).y();
        let total: Float = worker.direct_photons.iter().map(|p| p.alpha.y()).sum();
        let expected = (work_to_do + 1) as Float * per_path_energy;
        assert!(
            (total - expected).abs() / expected < 1e-3,
            "total {} expected {}",
            total,
            expected
        );
    }

    #[test]
    fn classification_without_specular_surfaces_yields_no_caustics() {
        let scene = cornell_box();
        let mut params = test_params(SamplerType::Random);
        params.indirect.enabled = true;
        params.indirect.max_size = 1 << 20;
        params.caustic.enabled = true;
        params.caustic.max_size = 1 << 20;
        params.normalize();

        let state = TracePhotonsState::new();
        let interrupt = AtomicBool::new(false);
        let mut worker = TracePhotonsWorker::new(0, &params, &scene, None, &state, &interrupt, None);
        worker.random_bucket(
            SAMPLE_BOOT_SIZE + params.photon.max_path_depth as usize * SAMPLE_STEP_SIZE,
            2048,
        )
        .unwrap();

        assert!(!worker.direct_photons.is_empty());
        assert!(!worker.indirect_photons.is_empty());
        assert!(worker.caustic_photons.is_empty());
    }

    #[test]
    fn landing_normals_face_the_incoming_photon() {
        let scene = cornell_box();
        let params = test_params(SamplerType::Random);
        let state = TracePhotonsState::new();
        let interrupt = AtomicBool::new(false);
        let mut worker = TracePhotonsWorker::new(0, &params, &scene, None, &state, &interrupt, None);
        worker.random_bucket(
            SAMPLE_BOOT_SIZE + params.photon.max_path_depth as usize * SAMPLE_STEP_SIZE,
            1024,
        )
        .unwrap();

        assert!(!worker.direct_photons.is_empty());
        for photon in worker.direct_photons.iter() {
            assert!(photon.n.dot_vec(&-photon.d) >= 0.0);
        }
    }
}
