//! Environment-driven configuration.
//!
//! Every knob has a default; a variable that is set but unparseable is an
//! error rather than a silent fallback.

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::error::ConfigError;
use crate::filter::DELIVERY_RADIUS_KM;
use crate::osrm::OsrmConfig;

pub const ENV_OSRM_URL: &str = "PROXIMITY_OSRM_URL";
pub const ENV_OSRM_PROFILE: &str = "PROXIMITY_OSRM_PROFILE";
pub const ENV_OSRM_TIMEOUT_SECS: &str = "PROXIMITY_OSRM_TIMEOUT_SECS";
pub const ENV_CACHE_CAPACITY: &str = "PROXIMITY_CACHE_CAPACITY";
pub const ENV_CACHE_TTL_SECS: &str = "PROXIMITY_CACHE_TTL_SECS";
pub const ENV_FAILURE_TTL_SECS: &str = "PROXIMITY_FAILURE_TTL_SECS";
pub const ENV_FAN_OUT: &str = "PROXIMITY_FAN_OUT";
pub const ENV_RADIUS_KM: &str = "PROXIMITY_RADIUS_KM";

#[derive(Debug, Clone)]
pub struct ProximityConfig {
    pub osrm: OsrmConfig,
    pub cache: CacheConfig,
    /// Suppress provider retries for keys that failed this recently.
    pub failure_ttl: Option<Duration>,
    /// Cap on lookups in flight per filter run. `None` resolves the whole
    /// batch at once.
    pub fan_out: Option<NonZeroUsize>,
    pub radius_km: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            osrm: OsrmConfig::default(),
            cache: CacheConfig::default(),
            failure_ttl: None,
            fan_out: None,
            radius_km: DELIVERY_RADIUS_KM,
        }
    }
}

impl ProximityConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = non_empty(&lookup, ENV_OSRM_URL) {
            config.osrm.base_url = url;
        }
        if let Some(profile) = non_empty(&lookup, ENV_OSRM_PROFILE) {
            config.osrm.profile = profile;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_OSRM_TIMEOUT_SECS)? {
            if secs == 0 {
                return Err(invalid(ENV_OSRM_TIMEOUT_SECS, "0", "timeout must be positive"));
            }
            config.osrm.timeout_secs = secs;
        }

        if let Some(capacity) = parse_var::<usize, _>(&lookup, ENV_CACHE_CAPACITY)? {
            config.cache.capacity = NonZeroUsize::new(capacity)
                .ok_or_else(|| invalid(ENV_CACHE_CAPACITY, "0", "capacity must be positive"))?;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CACHE_TTL_SECS)? {
            config.cache.ttl = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_FAILURE_TTL_SECS)? {
            config.failure_ttl = Some(Duration::from_secs(secs));
        }

        if let Some(fan_out) = parse_var::<usize, _>(&lookup, ENV_FAN_OUT)? {
            let fan_out = NonZeroUsize::new(fan_out)
                .ok_or_else(|| invalid(ENV_FAN_OUT, "0", "fan-out must be positive"))?;
            config.fan_out = Some(fan_out);
        }

        if let Some(radius_km) = parse_var::<f64, _>(&lookup, ENV_RADIUS_KM)? {
            if !radius_km.is_finite() || radius_km < 0.0 {
                return Err(invalid(
                    ENV_RADIUS_KM,
                    &radius_km.to_string(),
                    "radius must be a finite, non-negative number",
                ));
            }
            config.radius_km = radius_km;
        }

        tracing::debug!(?config, "loaded proximity configuration");
        Ok(config)
    }
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, var) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|err| invalid(var, &raw, &err.to_string())),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
