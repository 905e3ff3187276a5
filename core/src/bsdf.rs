//! BSDF oracle interface

use crate::common::*;
use crate::geometry::*;
use crate::spectrum::*;
use bitflags::bitflags;

bitflags! {
    /// Scattering event classification returned by BSDF sampling and
    /// evaluation.
    pub struct BSDFEvent: u8 {
        const REFLECT  = 1 << 0;
        const TRANSMIT = 1 << 1;
        const DIFFUSE  = 1 << 2;
        const GLOSSY   = 1 << 3;
        const SPECULAR = 1 << 4;
    }
}

/// Broad material classification of a surface interaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaterialType {
    /// Purely diffuse reflector.
    Matte,
    /// Rough specular reflector.
    Glossy,
    /// Perfect mirror.
    Mirror,
    /// Refracting dielectric.
    Glass,
}

/// Geometric fields of a surface interaction.
#[derive(Copy, Clone, Debug)]
pub struct HitPoint {
    /// Hit point.
    pub p: Point3f,

    /// Shading normal.
    pub shade_n: Normal3f,

    /// True when the incoming ray enters the surface from outside the object.
    pub into_object: bool,
}

/// Return value of `Bsdf::sample()`.
#[derive(Copy, Clone, Debug)]
pub struct BsdfSample {
    /// The sampled incident direction.
    pub d: Vector3f,

    /// The sample's probability density with respect to solid angle.
    pub pdf: Float,

    /// The scattering event classification.
    pub event: BSDFEvent,

    /// The sampled BSDF value, already weighted by the cosine factor and the
    /// sample pdf, ready to multiply into a path throughput.
    pub value: Spectrum,
}

/// The surface interaction interface the photon GI cache consumes. The scene's
/// material system implements it; the cache only ever treats it as an oracle.
pub trait Bsdf {
    /// Returns the geometric fields of the interaction.
    fn hit_point(&self) -> &HitPoint;

    /// Returns true when the surface participates in photon based global
    /// illumination (diffuse enough to deposit photons on).
    fn is_photon_gi_enabled(&self) -> bool;

    /// Returns the broad material classification.
    fn material_type(&self) -> MaterialType;

    /// Samples an incident direction for the outgoing ray this interaction was
    /// created with.
    ///
    /// * `u0` - Random sample.
    /// * `u1` - Random sample.
    fn sample(&self, u0: Float, u1: Float) -> BsdfSample;

    /// Evaluates the BSDF for an incident direction. The returned value
    /// includes the cosine of the incident angle.
    ///
    /// * `wi` - The incident direction.
    fn evaluate(&self, wi: &Vector3f) -> (Spectrum, BSDFEvent);

    /// Returns the hemispherical integral of the BSDF times cosine, the
    /// albedo used to turn incident irradiance into outgoing radiance.
    fn evaluate_total(&self) -> Spectrum;
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
