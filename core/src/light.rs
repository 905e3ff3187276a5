//! Light oracle interface

use crate::common::*;
use crate::geometry::*;
use crate::scene::Scene;
use crate::spectrum::*;
use std::sync::Arc;

/// Return value for `Light::emit()`.
#[derive(Clone)]
pub struct LightEmission {
    /// Ray leaving the light source.
    pub ray: Ray,

    /// The emission's probability density, the product of the positional and
    /// directional densities.
    pub pdf_w: Float,

    /// Emitted flux along the ray.
    pub value: Spectrum,
}

/// The light source interface consumed by the photon GI cache when starting
/// light paths.
pub trait Light: Send + Sync {
    /// Samples an emitted ray leaving the light.
    ///
    /// * `scene` - The scene the light belongs to.
    /// * `u`     - Five random samples driving position and direction.
    fn emit(&self, scene: &dyn Scene, u: [Float; 5]) -> LightEmission;
}

/// Atomic reference counted `Light`.
pub type ArcLight = Arc<dyn Light>;
