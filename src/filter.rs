//! Proximity filter engine.
//!
//! Fans distance lookups for a batch of candidates out over a dedicated
//! thread pool, waits for every lookup to settle, then keeps the candidates
//! within the radius sorted nearest first.

use std::num::NonZeroUsize;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::cache::DistanceCache;
use crate::config::ProximityConfig;
use crate::error::FilterError;
use crate::geo::GeoCoordinate;
use crate::resolver::DistanceResolver;
use crate::traits::{Candidate, DistanceProvider};

/// Radius used by the delivery-candidate listing.
pub const DELIVERY_RADIUS_KM: f64 = 200.0;

/// Radius used by store listings.
pub const STORE_RADIUS_KM: f64 = 100.0;

/// A candidate that passed the filter, with its resolved distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredCandidate<C> {
    pub candidate: C,
    pub distance_km: f64,
}

pub struct ProximityFilter<P> {
    resolver: DistanceResolver<P>,
    max_in_flight: Option<NonZeroUsize>,
}

impl<P: DistanceProvider> ProximityFilter<P> {
    /// Every located candidate gets its own lookup thread, so a whole batch
    /// is in flight at once.
    pub fn new(resolver: DistanceResolver<P>) -> Self {
        Self {
            resolver,
            max_in_flight: None,
        }
    }

    /// Caps the lookups in flight per run. `None` removes the cap.
    pub fn with_max_in_flight(mut self, max_in_flight: Option<NonZeroUsize>) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_config(provider: P, config: &ProximityConfig) -> Self {
        let cache = Arc::new(DistanceCache::new(config.cache.clone()));
        let resolver = DistanceResolver::new(provider, cache).with_failure_ttl(config.failure_ttl);
        Self::new(resolver).with_max_in_flight(config.fan_out)
    }

    pub fn max_in_flight(&self) -> Option<NonZeroUsize> {
        self.max_in_flight
    }

    pub fn resolver(&self) -> &DistanceResolver<P> {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<DistanceCache> {
        self.resolver.cache()
    }

    /// Candidates within `radius_km` of `user_location`, nearest first.
    ///
    /// Candidates without usable coordinates or whose lookup fails are left
    /// out; they never fail the batch. Equal distances keep their input
    /// order. Errors are an unusable radius or a lookup pool that could not
    /// be started.
    pub fn filter_by_proximity<C>(
        &self,
        candidates: &[C],
        user_location: GeoCoordinate,
        radius_km: f64,
    ) -> Result<Vec<FilteredCandidate<C>>, FilterError>
    where
        C: Candidate + Clone,
    {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(FilterError::InvalidRadius(radius_km));
        }

        let span = tracing::debug_span!("filter_run", candidates = candidates.len(), radius_km);

        let located: Vec<(usize, GeoCoordinate)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                candidate
                    .pickup_coordinates()
                    .filter(GeoCoordinate::is_valid)
                    .map(|pickup| (index, pickup))
            })
            .collect();

        if located.is_empty() {
            span.in_scope(|| tracing::debug!("no candidate carries usable coordinates"));
            return Ok(Vec::new());
        }

        // one blocking lookup per thread, up to the cap
        let width = match self.max_in_flight {
            Some(cap) => located.len().min(cap.get()),
            None => located.len(),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|index| format!("proximity-resolve-{}", index))
            .build()?;

        let resolved: Vec<(usize, Option<f64>)> = pool.install(|| {
            located
                .par_iter()
                .map(|&(index, pickup)| {
                    let distance = span.in_scope(|| self.resolver.resolve_distance(user_location, pickup));
                    (index, distance)
                })
                .collect()
        });

        let mut unresolved = 0usize;
        let mut filtered: Vec<FilteredCandidate<C>> = resolved
            .into_iter()
            .filter_map(|(index, distance)| match distance {
                Some(distance_km) if distance_km <= radius_km => Some(FilteredCandidate {
                    candidate: candidates[index].clone(),
                    distance_km,
                }),
                Some(_) => None,
                None => {
                    unresolved += 1;
                    None
                }
            })
            .collect();

        // sort_by is stable
        filtered.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        span.in_scope(|| {
            tracing::debug!(
                kept = filtered.len(),
                without_coordinates = candidates.len() - located.len(),
                unresolved,
                "filter run complete"
            )
        });

        Ok(filtered)
    }
}
