//! Cache parameters

use crate::error::Error;
use photongi_core::common::*;
use photongi_core::properties::Properties;
use std::fmt;
use std::str::FromStr;

/// Sampling strategy driving the photon tracing workers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SamplerType {
    /// Uniform random light paths.
    Random,

    /// Adaptive Markov chain light paths guided by visibility.
    Metropolis,
}

impl FromStr for SamplerType {
    type Err = Error;

    /// Parse a `SamplerType` from its configuration tag.
    ///
    /// * `s` - The configuration tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RANDOM" => Ok(SamplerType::Random),
            "METROPOLIS" => Ok(SamplerType::Metropolis),
            _ => Err(Error::Configuration(format!("unknown sampler type '{}'", s))),
        }
    }
}

impl fmt::Display for SamplerType {
    /// Formats the value using the given formatter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerType::Random => write!(f, "RANDOM"),
            SamplerType::Metropolis => write!(f, "METROPOLIS"),
        }
    }
}

/// Rendering-time visualization modes. The cache itself only stores the tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DebugType {
    None,
    ShowDirect,
    ShowIndirect,
    ShowCaustic,
}

impl FromStr for DebugType {
    type Err = Error;

    /// Parse a `DebugType` from its configuration tag.
    ///
    /// * `s` - The configuration tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DebugType::None),
            "showdirect" => Ok(DebugType::ShowDirect),
            "showindirect" => Ok(DebugType::ShowIndirect),
            "showcaustic" => Ok(DebugType::ShowCaustic),
            _ => Err(Error::Configuration(format!("unknown debug type '{}'", s))),
        }
    }
}

impl fmt::Display for DebugType {
    /// Formats the value using the given formatter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebugType::None => write!(f, "none"),
            DebugType::ShowDirect => write!(f, "showdirect"),
            DebugType::ShowIndirect => write!(f, "showindirect"),
            DebugType::ShowCaustic => write!(f, "showcaustic"),
        }
    }
}

/// Global photon tracing parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhotonParams {
    /// Upper bound on the number of traced light paths.
    pub max_traced_count: u32,

    /// Maximum light path length.
    pub max_path_depth: u32,
}

/// Visibility pass parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VisibilityParams {
    /// Enables the visibility pass (Metropolis sampler only).
    pub enabled: bool,

    /// Octree hit rate at which sampling may stop.
    pub target_hit_rate: Float,

    /// Upper bound on the number of camera paths sampled.
    pub max_sample_count: u32,

    /// Particle admission radius.
    pub lookup_radius: Float,

    /// Squared admission radius, computed once.
    pub lookup_radius2: Float,

    /// Particle admission normal angle in degrees.
    pub lookup_normal_angle: Float,
}

/// Per-population photon map parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhotonMapParams {
    /// Enables storing and querying this population.
    pub enabled: bool,

    /// Storage budget in entries.
    pub max_size: u32,

    /// Upper bound on the entries a lookup returns.
    pub lookup_max_count: u32,

    /// Lookup filter radius.
    pub lookup_radius: Float,

    /// Squared lookup filter radius, computed once.
    pub lookup_radius2: Float,

    /// Lookup normal filter angle in degrees.
    pub lookup_normal_angle: Float,
}

/// The full parameter block of the cache.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhotonGICacheParams {
    /// Sampling strategy.
    pub sampler_type: SamplerType,

    /// Global photon tracing parameters.
    pub photon: PhotonParams,

    /// Visibility pass parameters.
    pub visibility: VisibilityParams,

    /// Direct photon map parameters.
    pub direct: PhotonMapParams,

    /// Indirect photon map parameters.
    pub indirect: PhotonMapParams,

    /// Caustic photon map parameters.
    pub caustic: PhotonMapParams,

    /// Rendering-time visualization mode.
    pub debug_type: DebugType,

    /// Worker threads for the visibility and photon passes; 0 selects the
    /// hardware concurrency. Fixing this to 1 makes construction fully
    /// deterministic for a given seed.
    pub thread_count: usize,
}

impl Default for PhotonGICacheParams {
    /// Returns the default parameter block, matching `default_properties()`.
    fn default() -> Self {
        Self {
            sampler_type: SamplerType::Metropolis,
            photon: PhotonParams {
                max_traced_count: 500000,
                max_path_depth: 4,
            },
            visibility: VisibilityParams {
                enabled: true,
                target_hit_rate: 0.99,
                max_sample_count: 1024 * 1024,
                lookup_radius: 0.15,
                lookup_radius2: 0.15 * 0.15,
                lookup_normal_angle: 10.0,
            },
            direct: PhotonMapParams {
                enabled: false,
                max_size: 25000,
                lookup_max_count: 64,
                lookup_radius: 0.15,
                lookup_radius2: 0.15 * 0.15,
                lookup_normal_angle: 10.0,
            },
            indirect: PhotonMapParams {
                enabled: false,
                max_size: 100000,
                lookup_max_count: 64,
                lookup_radius: 0.15,
                lookup_radius2: 0.15 * 0.15,
                lookup_normal_angle: 10.0,
            },
            caustic: PhotonMapParams {
                enabled: false,
                max_size: 100000,
                lookup_max_count: 256,
                lookup_radius: 0.15,
                lookup_radius2: 0.15 * 0.15,
                lookup_normal_angle: 10.0,
            },
            debug_type: DebugType::None,
            thread_count: 0,
        }
    }
}

impl PhotonGICacheParams {
    /// Normalizes the parameter block before use: derives the direct map
    /// parameters from the indirect ones when only the latter is enabled (the
    /// radiance cache needs a direct map to integrate), zeroes the budgets of
    /// disabled populations and caches the squared lookup radii.
    pub fn normalize(&mut self) {
        if !self.direct.enabled {
            if self.indirect.enabled {
                self.direct.max_size = self.indirect.max_size / max(1, self.photon.max_path_depth);
                self.direct.lookup_max_count = self.indirect.lookup_max_count;
                self.direct.lookup_radius = self.indirect.lookup_radius;
                self.direct.lookup_normal_angle = self.indirect.lookup_normal_angle;
            } else {
                self.direct.max_size = 0;
            }
        }

        if !self.indirect.enabled {
            self.indirect.max_size = 0;
        }

        if !self.caustic.enabled {
            self.caustic.max_size = 0;
        }

        self.visibility.lookup_radius2 = self.visibility.lookup_radius * self.visibility.lookup_radius;
        self.direct.lookup_radius2 = self.direct.lookup_radius * self.direct.lookup_radius;
        self.indirect.lookup_radius2 = self.indirect.lookup_radius * self.indirect.lookup_radius;
        self.caustic.lookup_radius2 = self.caustic.lookup_radius * self.caustic.lookup_radius;
    }

    /// Builds a parameter block from a property bag, falling back to
    /// `default_properties()` for unset keys. Returns `None` when no photon
    /// population is enabled and the cache would serve no queries.
    ///
    /// * `cfg` - The configuration properties.
    pub fn from_properties(cfg: &Properties) -> Result<Option<Self>, Error> {
        let defaults = default_properties();
        let mut params = Self::default();

        params.direct.enabled = cfg.find_one_bool(
            "path.photongi.direct.enabled",
            defaults.find_one_bool("path.photongi.direct.enabled", false),
        );
        params.indirect.enabled = cfg.find_one_bool(
            "path.photongi.indirect.enabled",
            defaults.find_one_bool("path.photongi.indirect.enabled", false),
        );
        params.caustic.enabled = cfg.find_one_bool(
            "path.photongi.caustic.enabled",
            defaults.find_one_bool("path.photongi.caustic.enabled", false),
        );

        if !params.direct.enabled && !params.indirect.enabled && !params.caustic.enabled {
            return Ok(None);
        }

        params.sampler_type = cfg
            .find_one_string(
                "path.photongi.sampler.type",
                defaults.find_one_string("path.photongi.sampler.type", String::from("METROPOLIS")),
            )
            .parse()?;

        params.photon.max_traced_count = max(
            1,
            cfg.find_one_int(
                "path.photongi.photon.maxcount",
                defaults.find_one_int("path.photongi.photon.maxcount", 500000),
            ),
        ) as u32;
        params.photon.max_path_depth = max(
            1,
            cfg.find_one_int(
                "path.photongi.photon.maxdepth",
                defaults.find_one_int("path.photongi.photon.maxdepth", 4),
            ),
        ) as u32;

        if params.sampler_type == SamplerType::Metropolis {
            params.visibility.enabled = cfg.find_one_bool(
                "path.photongi.visibility.enabled",
                defaults.find_one_bool("path.photongi.visibility.enabled", true),
            );
            params.visibility.target_hit_rate = cfg.find_one_float(
                "path.photongi.visibility.targethitrate",
                defaults.find_one_float("path.photongi.visibility.targethitrate", 0.99),
            );
            params.visibility.max_sample_count = max(
                1,
                cfg.find_one_int(
                    "path.photongi.visibility.maxsamplecount",
                    defaults.find_one_int("path.photongi.visibility.maxsamplecount", 1024 * 1024),
                ),
            ) as u32;
            params.visibility.lookup_radius = max(
                DEFAULT_EPSILON_MIN,
                cfg.find_one_float(
                    "path.photongi.visibility.lookup.radius",
                    defaults.find_one_float("path.photongi.visibility.lookup.radius", 0.15),
                ),
            );
            params.visibility.lookup_normal_angle = max(
                DEFAULT_EPSILON_MIN,
                cfg.find_one_float(
                    "path.photongi.visibility.lookup.normalangle",
                    defaults.find_one_float("path.photongi.visibility.lookup.normalangle", 10.0),
                ),
            );
        } else {
            params.visibility.enabled = false;
        }

        if params.direct.enabled {
            read_map_params(&mut params.direct, cfg, defaults, "direct");
        }
        if params.indirect.enabled {
            read_map_params(&mut params.indirect, cfg, defaults, "indirect");
        }
        if params.caustic.enabled {
            read_map_params(&mut params.caustic, cfg, defaults, "caustic");
        }

        params.debug_type = cfg
            .find_one_string(
                "path.photongi.debug.type",
                defaults.find_one_string("path.photongi.debug.type", String::from("none")),
            )
            .parse()?;

        Ok(Some(params))
    }

    /// Writes the parameter block back to its property representation.
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();

        props.add_string("path.photongi.sampler.type", self.sampler_type.to_string());
        props.add_int("path.photongi.photon.maxcount", self.photon.max_traced_count as Int);
        props.add_int("path.photongi.photon.maxdepth", self.photon.max_path_depth as Int);

        props.add_bool("path.photongi.visibility.enabled", self.visibility.enabled);
        props.add_float("path.photongi.visibility.targethitrate", self.visibility.target_hit_rate);
        props.add_int(
            "path.photongi.visibility.maxsamplecount",
            self.visibility.max_sample_count as Int,
        );
        props.add_float("path.photongi.visibility.lookup.radius", self.visibility.lookup_radius);
        props.add_float(
            "path.photongi.visibility.lookup.normalangle",
            self.visibility.lookup_normal_angle,
        );

        write_map_params(&self.direct, &mut props, "direct");
        write_map_params(&self.indirect, &mut props, "indirect");
        write_map_params(&self.caustic, &mut props, "caustic");

        props.add_string("path.photongi.debug.type", self.debug_type.to_string());

        props
    }
}

/// Reads one population's parameters from the configuration.
///
/// * `map`      - The population parameters to fill.
/// * `cfg`      - The configuration properties.
/// * `defaults` - The default properties.
/// * `name`     - The population name in configuration keys.
fn read_map_params(map: &mut PhotonMapParams, cfg: &Properties, defaults: &Properties, name: &str) {
    let key = |suffix: &str| format!("path.photongi.{}.{}", name, suffix);

    map.max_size = max(
        0,
        cfg.find_one_int(&key("maxsize"), defaults.find_one_int(&key("maxsize"), 100000)),
    ) as u32;
    map.lookup_max_count = max(
        1,
        cfg.find_one_int(&key("lookup.maxcount"), defaults.find_one_int(&key("lookup.maxcount"), 64)),
    ) as u32;
    map.lookup_radius = max(
        DEFAULT_EPSILON_MIN,
        cfg.find_one_float(&key("lookup.radius"), defaults.find_one_float(&key("lookup.radius"), 0.15)),
    );
    map.lookup_normal_angle = max(
        DEFAULT_EPSILON_MIN,
        cfg.find_one_float(
            &key("lookup.normalangle"),
            defaults.find_one_float(&key("lookup.normalangle"), 10.0),
        ),
    );
}

/// Writes one population's parameters to the property representation.
///
/// * `map`   - The population parameters.
/// * `props` - The properties to fill.
/// * `name`  - The population name in configuration keys.
fn write_map_params(map: &PhotonMapParams, props: &mut Properties, name: &str) {
    let key = |suffix: &str| format!("path.photongi.{}.{}", name, suffix);

    props.add_bool(&key("enabled"), map.enabled);
    props.add_int(&key("maxsize"), map.max_size as Int);
    props.add_int(&key("lookup.maxcount"), map.lookup_max_count as Int);
    props.add_float(&key("lookup.radius"), map.lookup_radius);
    props.add_float(&key("lookup.normalangle"), map.lookup_normal_angle);
}

lazy_static! {
    static ref DEFAULT_PROPS: Properties = {
        let mut props = Properties::new();

        props.add_string("path.photongi.sampler.type", String::from("METROPOLIS"));
        props.add_int("path.photongi.photon.maxcount", 500000);
        props.add_int("path.photongi.photon.maxdepth", 4);
        props.add_bool("path.photongi.visibility.enabled", true);
        props.add_float("path.photongi.visibility.targethitrate", 0.99);
        props.add_int("path.photongi.visibility.maxsamplecount", 1024 * 1024);
        props.add_float("path.photongi.visibility.lookup.radius", 0.15);
        props.add_float("path.photongi.visibility.lookup.normalangle", 10.0);
        props.add_bool("path.photongi.direct.enabled", false);
        props.add_int("path.photongi.direct.maxsize", 25000);
        props.add_int("path.photongi.direct.lookup.maxcount", 64);
        props.add_float("path.photongi.direct.lookup.radius", 0.15);
        props.add_float("path.photongi.direct.lookup.normalangle", 10.0);
        props.add_bool("path.photongi.indirect.enabled", false);
        props.add_int("path.photongi.indirect.maxsize", 100000);
        props.add_int("path.photongi.indirect.lookup.maxcount", 64);
        props.add_float("path.photongi.indirect.lookup.radius", 0.15);
        props.add_float("path.photongi.indirect.lookup.normalangle", 10.0);
        props.add_bool("path.photongi.caustic.enabled", false);
        props.add_int("path.photongi.caustic.maxsize", 100000);
        props.add_int("path.photongi.caustic.lookup.maxcount", 256);
        props.add_float("path.photongi.caustic.lookup.radius", 0.15);
        props.add_float("path.photongi.caustic.lookup.normalangle", 10.0);
        props.add_string("path.photongi.debug.type", String::from("none"));

        props
    };
}

/// Returns the default configuration properties of the cache.
pub fn default_properties() -> &'static Properties {
    &DEFAULT_PROPS
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indirect_only_derives_direct_parameters() {
        let mut params = PhotonGICacheParams::default();
        params.indirect.enabled = true;
        params.indirect.max_size = 20000;
        params.indirect.lookup_radius = 0.3;
        params.normalize();

        assert_eq!(params.direct.max_size, 20000 / params.photon.max_path_depth);
        assert_eq!(params.direct.lookup_max_count, params.indirect.lookup_max_count);
        assert_eq!(params.direct.lookup_radius, 0.3);
        assert_eq!(params.direct.lookup_radius2, 0.3 * 0.3);
        assert_eq!(params.indirect.lookup_radius2, 0.3 * 0.3);
    }

    #[test]
    fn disabled_populations_lose_their_budget() {
        let mut params = PhotonGICacheParams::default();
        params.normalize();
        assert_eq!(params.direct.max_size, 0);
        assert_eq!(params.indirect.max_size, 0);
        assert_eq!(params.caustic.max_size, 0);
    }

    #[test]
    fn no_population_enabled_yields_no_cache() {
        let cfg = Properties::new();
        assert_eq!(PhotonGICacheParams::from_properties(&cfg), Ok(None));
    }

    #[test]
    fn unknown_sampler_tag_is_rejected() {
        let mut cfg = Properties::new();
        cfg.add_bool("path.photongi.direct.enabled", true);
        cfg.add_string("path.photongi.sampler.type", String::from("SOBOL"));
        match PhotonGICacheParams::from_properties(&cfg) {
            Err(Error::Configuration(_)) => (),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_debug_tag_is_rejected() {
        let mut cfg = Properties::new();
        cfg.add_bool("path.photongi.direct.enabled", true);
        cfg.add_string("path.photongi.debug.type", String::from("showall"));
        match PhotonGICacheParams::from_properties(&cfg) {
            Err(Error::Configuration(_)) => (),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn properties_round_trip() {
        let mut cfg = Properties::new();
        cfg.add_bool("path.photongi.caustic.enabled", true);
        cfg.add_int("path.photongi.caustic.maxsize", 50000);
        cfg.add_float("path.photongi.caustic.lookup.radius", 0.2);
        cfg.add_string("path.photongi.sampler.type", String::from("RANDOM"));

        let params = PhotonGICacheParams::from_properties(&cfg).unwrap().unwrap();
        assert_eq!(params.sampler_type, SamplerType::Random);
        assert!(!params.visibility.enabled);
        assert_eq!(params.caustic.max_size, 50000);
        assert_eq!(params.caustic.lookup_radius, 0.2);
        assert_eq!(params.caustic.lookup_max_count, 256);

        let props = params.to_properties();
        let reparsed = PhotonGICacheParams::from_properties(&props).unwrap().unwrap();
        assert_eq!(reparsed.caustic, params.caustic);
        assert_eq!(reparsed.sampler_type, params.sampler_type);
    }

    #[test]
    fn sampler_and_debug_tags_round_trip() {
        for sampler in [SamplerType::Random, SamplerType::Metropolis] {
            assert_eq!(sampler.to_string().parse::<SamplerType>(), Ok(sampler));
        }
        for debug in [
            DebugType::None,
            DebugType::ShowDirect,
            DebugType::ShowIndirect,
            DebugType::ShowCaustic,
        ] {
            assert_eq!(debug.to_string().parse::<DebugType>(), Ok(debug));
        }
    }
}
