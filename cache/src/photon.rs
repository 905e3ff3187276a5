//! Photon records

use photongi_accelerators::BvhEntry;
use photongi_core::geometry::*;
use photongi_core::spectrum::*;

/// A quantum of light energy deposited at a surface intersection. Immutable
/// once stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Photon {
    /// Landing position.
    pub p: Point3f,

    /// Incoming direction, pointing toward the surface.
    pub d: Vector3f,

    /// Carried energy.
    pub alpha: Spectrum,

    /// Landing surface normal, oriented toward the incoming photon.
    pub n: Normal3f,
}

impl Photon {
    /// Create a new `Photon`.
    ///
    /// * `p`     - Landing position.
    /// * `d`     - Incoming direction, pointing toward the surface.
    /// * `alpha` - Carried energy.
    /// * `n`     - Landing surface normal.
    pub fn new(p: Point3f, d: Vector3f, alpha: Spectrum, n: Normal3f) -> Self {
        Self { p, d, alpha, n }
    }
}

impl BvhEntry for Photon {
    fn position(&self) -> Point3f {
        self.p
    }

    fn normal(&self) -> Normal3f {
        self.n
    }
}

/// A pre-integrated surface record caching the diffuse outgoing radiance at
/// its position and normal. Until pre-integration rewrites it, the radiance
/// field holds the surface albedo sampled at creation time.
#[derive(Clone, Debug, PartialEq)]
pub struct RadiancePhoton {
    /// Position.
    pub p: Point3f,

    /// Surface normal.
    pub n: Normal3f,

    /// Outgoing radiance (the surface albedo until pre-integration).
    pub outgoing_radiance: Spectrum,
}

impl RadiancePhoton {
    /// Create a new `RadiancePhoton`.
    ///
    /// * `p`                 - Position.
    /// * `n`                 - Surface normal.
    /// * `outgoing_radiance` - Scratch albedo value rewritten by
    ///                         pre-integration.
    pub fn new(p: Point3f, n: Normal3f, outgoing_radiance: Spectrum) -> Self {
        Self { p, n, outgoing_radiance }
    }
}

impl BvhEntry for RadiancePhoton {
    fn position(&self) -> Point3f {
        self.p
    }

    fn normal(&self) -> Normal3f {
        self.n
    }
}

/// A camera-visible point gating photon deposition during tracing.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityParticle {
    /// Position.
    pub p: Point3f,

    /// Surface normal.
    pub n: Normal3f,

    /// True for points inside participating media rather than on surfaces.
    pub is_volume: bool,
}

impl VisibilityParticle {
    /// Create a new `VisibilityParticle`.
    ///
    /// * `p`         - Position.
    /// * `n`         - Surface normal.
    /// * `is_volume` - True for points inside participating media.
    pub fn new(p: Point3f, n: Normal3f, is_volume: bool) -> Self {
        Self { p, n, is_volume }
    }
}

impl BvhEntry for VisibilityParticle {
    fn position(&self) -> Point3f {
        self.p
    }

    fn normal(&self) -> Normal3f {
        self.n
    }
}
