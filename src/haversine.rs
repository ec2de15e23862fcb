//! Haversine distance provider (fallback when OSRM unavailable).
//!
//! Uses great-circle distance scaled by a detour factor.
//! Less accurate than OSRM (ignores roads) but always available.

use crate::error::RoutingError;
use crate::geo::GeoCoordinate;
use crate::traits::DistanceProvider;

/// Typical ratio of road distance to straight-line distance in cities.
const DEFAULT_DETOUR_FACTOR: f64 = 1.3;

/// Haversine-based distance provider.
///
/// Never touches the network. Useful offline or as a stand-in for a routing
/// backend in tests.
#[derive(Debug, Clone)]
pub struct HaversineDistance {
    /// Multiplier applied to the great-circle distance.
    pub detour_factor: f64,
}

impl Default for HaversineDistance {
    fn default() -> Self {
        Self {
            detour_factor: DEFAULT_DETOUR_FACTOR,
        }
    }
}

impl HaversineDistance {
    pub fn new(detour_factor: f64) -> Self {
        Self { detour_factor }
    }

    /// Straight-line distance, no detour applied.
    pub fn straight_line() -> Self {
        Self { detour_factor: 1.0 }
    }
}

impl DistanceProvider for HaversineDistance {
    fn route_distance_meters(
        &self,
        origin: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> Result<f64, RoutingError> {
        let meters = origin.haversine_km(&destination) * self.detour_factor * 1000.0;
        if !meters.is_finite() {
            return Err(RoutingError::InvalidDistance(meters));
        }
        Ok(meters)
    }
}
