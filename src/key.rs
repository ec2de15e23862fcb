//! Cache keys for (origin, destination) coordinate pairs.
//!
//! Coordinates are quantized to [`KEY_PRECISION_DECIMALS`] places (~11 m) so
//! near-identical queries share an entry. Keys are order-sensitive: a route
//! from A to B is keyed apart from B to A.

use std::fmt;

use crate::geo::GeoCoordinate;

/// Decimal places kept per coordinate component.
pub const KEY_PRECISION_DECIMALS: u32 = 4;

const KEY_SCALE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    origin_lat: i64,
    origin_lng: i64,
    dest_lat: i64,
    dest_lng: i64,
}

impl CacheKey {
    /// Returns `None` when either endpoint is not a valid coordinate.
    pub fn new(origin: GeoCoordinate, destination: GeoCoordinate) -> Option<Self> {
        if !origin.is_valid() || !destination.is_valid() {
            return None;
        }

        Some(Self {
            origin_lat: quantize(origin.lat),
            origin_lng: quantize(origin.lng),
            dest_lat: quantize(destination.lat),
            dest_lng: quantize(destination.lng),
        })
    }

    /// The quantized origin.
    pub fn origin(&self) -> GeoCoordinate {
        GeoCoordinate::new(dequantize(self.origin_lat), dequantize(self.origin_lng))
    }

    /// The quantized destination.
    pub fn destination(&self) -> GeoCoordinate {
        GeoCoordinate::new(dequantize(self.dest_lat), dequantize(self.dest_lng))
    }
}

/// Whether two points collapse to the same quantized location.
pub fn same_quantized_point(a: GeoCoordinate, b: GeoCoordinate) -> bool {
    quantize(a.lat) == quantize(b.lat) && quantize(a.lng) == quantize(b.lng)
}

// f64::round is half-away-from-zero
fn quantize(value: f64) -> i64 {
    (value * KEY_SCALE).round() as i64
}

fn dequantize(value: i64) -> f64 {
    value as f64 / KEY_SCALE
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = KEY_PRECISION_DECIMALS as usize;
        let origin = self.origin();
        let destination = self.destination();
        write!(
            f,
            "{:.p$},{:.p$}->{:.p$},{:.p$}",
            origin.lat,
            origin.lng,
            destination.lat,
            destination.lng,
            p = precision
        )
    }
}
