//! Scene oracle interface

use crate::bsdf::{BSDFEvent, Bsdf};
use crate::common::*;
use crate::geometry::*;
use crate::light::ArcLight;
use crate::spectrum::*;

/// Tracks the refractive boundaries a light path has crossed so transmittance
/// along the next ray segment can be resolved by the scene.
#[derive(Clone, Debug, Default)]
pub struct VolumeInfo {
    boundary_depth: u32,
}

impl VolumeInfo {
    /// Updates the volume bookkeeping after a BSDF sample.
    ///
    /// * `event` - The sampled scattering event.
    /// * `bsdf`  - The interaction the event was sampled at.
    pub fn update(&mut self, event: BSDFEvent, bsdf: &dyn Bsdf) {
        if event.contains(BSDFEvent::TRANSMIT) {
            if bsdf.hit_point().into_object {
                self.boundary_depth += 1;
            } else {
                self.boundary_depth = self.boundary_depth.saturating_sub(1);
            }
        }
    }

    /// Returns true while the path is inside a refractive object.
    pub fn inside_object(&self) -> bool {
        self.boundary_depth > 0
    }
}

/// Return value for `Scene::intersect()`.
pub struct SurfaceHit {
    /// The surface interaction at the hit point.
    pub bsdf: Box<dyn Bsdf>,

    /// Transmittance of the participating media crossed by the ray segment.
    pub throughput: Spectrum,
}

/// The scene interface the photon GI cache consumes. Geometry, lights,
/// materials and media stay behind this trait; the cache treats them all as
/// oracles.
pub trait Scene: Sync {
    /// Intersects a ray with the scene.
    ///
    /// * `ray` - The ray.
    /// * `vol` - Volume bookkeeping for the path the ray belongs to.
    /// * `u`   - Random sample reserved for volume scattering decisions.
    fn intersect(&self, ray: &Ray, vol: &mut VolumeInfo, u: Float) -> Option<SurfaceHit>;

    /// Maps a random sample to a camera time.
    ///
    /// * `u` - Random sample.
    fn camera_ray_time(&self, u: Float) -> Float;

    /// Generates a primary ray through the camera's image plane.
    ///
    /// * `u0`   - Image plane sample.
    /// * `u1`   - Image plane sample.
    /// * `time` - Camera time.
    fn generate_camera_ray(&self, u0: Float, u1: Float, time: Float) -> Option<Ray>;

    /// Picks a light source for emission, returning the light and its pick
    /// probability.
    ///
    /// * `u` - Random sample.
    fn sample_light(&self, u: Float) -> Option<(ArcLight, Float)>;

    /// Returns a bounding box of the whole scene in world space.
    fn world_bound(&self) -> Bounds3f;
}
