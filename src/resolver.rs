//! Cache-first distance resolution.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::DistanceCache;
use crate::geo::GeoCoordinate;
use crate::key::CacheKey;
use crate::traits::DistanceProvider;

/// Resolves travel distances, consulting the shared cache before the provider.
///
/// Every failure (invalid coordinate, transport error, provider status,
/// malformed payload) comes back as `None` so one bad lookup never sinks a
/// batch.
pub struct DistanceResolver<P> {
    provider: P,
    cache: Arc<DistanceCache>,
    failure_ttl: Option<Duration>,
}

impl<P: DistanceProvider> DistanceResolver<P> {
    pub fn new(provider: P, cache: Arc<DistanceCache>) -> Self {
        Self {
            provider,
            cache,
            failure_ttl: None,
        }
    }

    /// Skip the provider for keys that failed less than `ttl` ago.
    ///
    /// Off by default: without it every retry of a failing key queries the
    /// provider again.
    pub fn with_failure_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.failure_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &Arc<DistanceCache> {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Travel distance in kilometers from `origin` to `destination`.
    pub fn resolve_distance(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Option<f64> {
        let Some(key) = CacheKey::new(origin, destination) else {
            tracing::debug!(?origin, ?destination, "skipping invalid coordinate pair");
            return None;
        };

        if let Some(distance_km) = self.cache.get(&key) {
            return Some(distance_km);
        }

        if let Some(ttl) = self.failure_ttl {
            if self.cache.recent_failure(&key, ttl) {
                tracing::debug!(%key, "skipping recently failed lookup");
                return None;
            }
        }

        match self.provider.route_distance_meters(origin, destination) {
            Ok(meters) if meters.is_finite() && meters >= 0.0 => {
                let distance_km = meters / 1000.0;
                self.cache.set(key, distance_km);
                tracing::debug!(%key, distance_km, "resolved distance");
                Some(distance_km)
            }
            Ok(meters) => {
                tracing::warn!(%key, meters, "provider returned unusable distance");
                self.note_failure(key);
                None
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "distance resolution failed");
                self.note_failure(key);
                None
            }
        }
    }

    fn note_failure(&self, key: CacheKey) {
        if self.failure_ttl.is_some() {
            self.cache.record_failure(key);
        }
    }
}
