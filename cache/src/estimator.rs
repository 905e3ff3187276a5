//! Photon density estimation

use crate::photon::Photon;
use photongi_accelerators::NearPhoton;
use photongi_core::bsdf::{Bsdf, MaterialType};
use photongi_core::common::*;
use photongi_core::geometry::*;
use photongi_core::spectrum::*;

/// Simpson filter from classic photon mapping: weights photons by distance,
/// giving more weight to the nearest.
///
/// * `p1`        - Query point.
/// * `p2`        - Photon position.
/// * `max_dist2` - Squared filter radius; callers guarantee the points are no
///                 farther apart than this.
pub(crate) fn simpson_kernel(p1: &Point3f, p2: &Point3f, max_dist2: Float) -> Float {
    let dist2 = p1.distance_squared(*p2);
    assert!(dist2 <= max_dist2, "Simpson kernel invoked outside its domain");

    let s = 1.0 - dist2 / max_dist2;
    3.0 * INV_PI * s * s
}

/// Reconstructs outgoing radiance from the photons in a query neighborhood.
/// The accumulated filtered energy is normalized by the photons traced for the
/// population and the squared filter radius.
///
/// * `entries`             - The photons matched by the lookup.
/// * `photons`             - The population the entries index into.
/// * `photon_traced_count` - Light paths traced for the population.
/// * `max_distance2`       - Squared filter radius of the lookup.
/// * `bsdf`                - The surface interaction being shaded.
pub(crate) fn process_cache_entries(
    entries: &[NearPhoton],
    photons: &[Photon],
    photon_traced_count: u32,
    max_distance2: Float,
    bsdf: &dyn Bsdf,
) -> Spectrum {
    debug_assert!(photon_traced_count > 0);

    let mut result = Spectrum::ZERO;

    if !entries.is_empty() {
        let hit_point = bsdf.hit_point();

        if bsdf.material_type() == MaterialType::Matte {
            // A fast path for matte material.
            for near_photon in entries.iter() {
                let photon = &photons[near_photon.entry_index];
                result += simpson_kernel(&hit_point.p, &photon.p, max_distance2)
                    * hit_point.shade_n.abs_dot_vec(&-photon.d)
                    * photon.alpha;
            }

            result *= bsdf.evaluate_total() * INV_PI;
        } else {
            // Generic path; the BSDF evaluation carries the cosine term.
            for near_photon in entries.iter() {
                let photon = &photons[near_photon.entry_index];
                let (bsdf_eval, _event) = bsdf.evaluate(&-photon.d);
                result += simpson_kernel(&hit_point.p, &photon.p, max_distance2) * bsdf_eval * photon.alpha;
            }
        }
    }

    result / (photon_traced_count as Float * max_distance2)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
