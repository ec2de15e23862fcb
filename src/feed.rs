//! Listing feed: the state a listing screen renders from.
//!
//! Inputs (candidate refreshes, location fixes, search text) can change while
//! a filter run is still waiting on the network. Each run is tagged with a
//! generation when it starts and its result is published only if no newer
//! run has started since. Stale runs finish normally and are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ProximityConfig;
use crate::error::{FilterError, ProximityError};
use crate::filter::{FilteredCandidate, ProximityFilter};
use crate::geo::GeoCoordinate;
use crate::key::same_quantized_point;
use crate::osrm::OsrmClient;
use crate::traits::{Candidate, DistanceProvider};

/// What the listing should render.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingState<C> {
    /// Nothing published yet.
    Loading,
    /// The candidate source could not be reached.
    Failed(String),
    /// Loaded, nothing within range.
    Empty,
    Ready(Vec<FilteredCandidate<C>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingView<C> {
    pub state: ListingState<C>,
    /// The most recently started run has not settled yet.
    pub is_fetching: bool,
}

/// Handle for one filter run. Consumed when the run settles.
#[derive(Debug)]
#[must_use = "a run ticket must be settled with apply, fail or abandon"]
pub struct RunTicket {
    generation: u64,
}

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run was the latest and its result is now visible.
    Applied,
    /// A newer run started first; the result was discarded.
    Superseded,
    /// No location fix yet, nothing to filter against.
    AwaitingLocation,
}

struct FeedInner<C> {
    latest: u64,
    settled: u64,
    location: Option<GeoCoordinate>,
    state: ListingState<C>,
}

pub struct ListingFeed<C, P> {
    engine: Arc<ProximityFilter<P>>,
    radius_km: f64,
    inner: Mutex<FeedInner<C>>,
}

impl<C> ListingFeed<C, OsrmClient>
where
    C: Candidate + Clone,
{
    /// Feed backed by an OSRM routing server.
    pub fn from_config(config: &ProximityConfig) -> Result<Self, ProximityError> {
        let provider = OsrmClient::new(config.osrm.clone())?;
        let engine = ProximityFilter::with_config(provider, config);
        Ok(Self::new(Arc::new(engine), config.radius_km)?)
    }
}

impl<C, P> ListingFeed<C, P>
where
    C: Candidate + Clone,
    P: DistanceProvider,
{
    pub fn new(engine: Arc<ProximityFilter<P>>, radius_km: f64) -> Result<Self, FilterError> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(FilterError::InvalidRadius(radius_km));
        }

        Ok(Self {
            engine,
            radius_km,
            inner: Mutex::new(FeedInner {
                latest: 0,
                settled: 0,
                location: None,
                state: ListingState::Loading,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, FeedInner<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn engine(&self) -> &Arc<ProximityFilter<P>> {
        &self.engine
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn location(&self) -> Option<GeoCoordinate> {
        self.lock().location
    }

    /// Records a new location fix.
    ///
    /// Returns `true` when the fix moved the user. Cached distances were
    /// measured from the old position, so a move clears the cache and
    /// supersedes every run already started. The view reports `is_fetching`
    /// until the caller's next [`ListingFeed::refresh`] settles. Fixes that
    /// land on the same quantized point are ignored.
    pub fn update_location(&self, fix: GeoCoordinate) -> bool {
        if let Err(err) = fix.validate() {
            tracing::warn!(?fix, error = %err, "ignoring invalid location fix");
            return false;
        }

        let previous = {
            let mut inner = self.lock();
            let previous = inner.location;
            if previous.is_some_and(|prev| same_quantized_point(prev, fix)) {
                return false;
            }
            inner.location = Some(fix);
            inner.latest += 1;
            previous
        };

        if previous.is_some() {
            tracing::info!(?previous, ?fix, "user moved, invalidating cached distances");
            self.engine.cache().clear();
        }
        true
    }

    /// Starts a run. Any run started earlier is superseded from now on.
    pub fn begin_run(&self) -> RunTicket {
        let mut inner = self.lock();
        inner.latest += 1;
        RunTicket {
            generation: inner.latest,
        }
    }

    /// Publishes `results` if `ticket` is still the latest run.
    pub fn apply(&self, ticket: RunTicket, results: Vec<FilteredCandidate<C>>) -> RunOutcome {
        let state = if results.is_empty() {
            ListingState::Empty
        } else {
            ListingState::Ready(results)
        };
        self.publish(ticket, state)
    }

    /// Publishes a candidate-source failure if `ticket` is still the latest run.
    pub fn fail(&self, ticket: RunTicket, message: impl Into<String>) -> RunOutcome {
        self.publish(ticket, ListingState::Failed(message.into()))
    }

    /// Settles a run without touching the visible state.
    pub fn abandon(&self, ticket: RunTicket) {
        let mut inner = self.lock();
        if ticket.generation == inner.latest {
            inner.settled = ticket.generation;
        }
    }

    fn publish(&self, ticket: RunTicket, state: ListingState<C>) -> RunOutcome {
        let mut inner = self.lock();
        if ticket.generation != inner.latest {
            tracing::info!(
                generation = ticket.generation,
                latest = inner.latest,
                "discarding superseded filter run"
            );
            return RunOutcome::Superseded;
        }

        inner.state = state;
        inner.settled = ticket.generation;
        RunOutcome::Applied
    }

    /// Filters a fresh snapshot against the current location and publishes it.
    ///
    /// `None` candidates (source returned nothing) is treated as an empty
    /// list. Blank `query` matches everything.
    pub fn refresh(&self, candidates: Option<&[C]>, query: &str) -> Result<RunOutcome, FilterError> {
        let ticket = self.begin_run();

        let Some(origin) = self.location() else {
            tracing::debug!(generation = ticket.generation, "no location fix yet");
            self.abandon(ticket);
            return Ok(RunOutcome::AwaitingLocation);
        };

        let query = query.trim();
        let matching: Vec<&C> = candidates
            .unwrap_or_default()
            .iter()
            .filter(|candidate| query.is_empty() || candidate.matches_query(query))
            .collect();

        let filtered = match self
            .engine
            .filter_by_proximity(&matching, origin, self.radius_km)
        {
            Ok(filtered) => filtered,
            Err(err) => {
                self.abandon(ticket);
                return Err(err);
            }
        };

        let results = filtered
            .into_iter()
            .map(|item| FilteredCandidate {
                candidate: C::clone(item.candidate),
                distance_km: item.distance_km,
            })
            .collect();

        Ok(self.apply(ticket, results))
    }

    pub fn view(&self) -> ListingView<C> {
        let inner = self.lock();
        ListingView {
            state: inner.state.clone(),
            is_fetching: inner.latest != inner.settled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine::HaversineDistance;
    use crate::resolver::DistanceResolver;

    #[derive(Debug, Clone, PartialEq)]
    struct Store {
        name: &'static str,
        location: GeoCoordinate,
    }

    impl Candidate for Store {
        fn pickup_coordinates(&self) -> Option<GeoCoordinate> {
            Some(self.location)
        }

        fn matches_query(&self, query: &str) -> bool {
            self.name.contains(query)
        }
    }

    fn feed(radius_km: f64) -> ListingFeed<Store, HaversineDistance> {
        let resolver = DistanceResolver::new(HaversineDistance::straight_line(), Arc::default());
        let engine = ProximityFilter::new(resolver);
        ListingFeed::new(Arc::new(engine), radius_km).unwrap()
    }

    fn stores() -> Vec<Store> {
        vec![
            Store { name: "yaba-laundry", location: GeoCoordinate::new(6.5095, 3.3711) },
            Store { name: "ikeja-kitchen", location: GeoCoordinate::new(6.6018, 3.3515) },
        ]
    }

    const LAGOS_ISLAND: GeoCoordinate = GeoCoordinate::new(6.4541, 3.3947);

    #[test]
    fn test_starts_loading() {
        let view = feed(100.0).view();
        assert_eq!(view.state, ListingState::Loading);
        assert!(!view.is_fetching);
    }

    #[test]
    fn test_invalid_radius_rejected() {
        let resolver = DistanceResolver::new(HaversineDistance::default(), Arc::default());
        let engine = Arc::new(ProximityFilter::new(resolver));
        assert!(ListingFeed::<Store, _>::new(engine, f64::INFINITY).is_err());
    }

    #[test]
    fn test_refresh_without_location_awaits() {
        let feed = feed(100.0);
        let outcome = feed.refresh(Some(&stores()), "").unwrap();
        assert_eq!(outcome, RunOutcome::AwaitingLocation);
        let view = feed.view();
        assert_eq!(view.state, ListingState::Loading);
        assert!(!view.is_fetching);
    }

    #[test]
    fn test_refresh_publishes_ready() {
        let feed = feed(100.0);
        assert!(feed.update_location(LAGOS_ISLAND));
        assert_eq!(feed.refresh(Some(&stores()), "").unwrap(), RunOutcome::Applied);

        match feed.view().state {
            ListingState::Ready(items) => {
                let names: Vec<_> = items.iter().map(|i| i.candidate.name).collect();
                assert_eq!(names, vec!["yaba-laundry", "ikeja-kitchen"]);
            }
            other => panic!("expected ready state, got {:?}", other),
        }
    }

    #[test]
    fn test_query_narrows_results() {
        let feed = feed(100.0);
        feed.update_location(LAGOS_ISLAND);
        feed.refresh(Some(&stores()), " kitchen ").unwrap();

        match feed.view().state {
            ListingState::Ready(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].candidate.name, "ikeja-kitchen");
            }
            other => panic!("expected ready state, got {:?}", other),
        }
    }

    #[test]
    fn test_none_candidates_is_empty_state() {
        let feed = feed(100.0);
        feed.update_location(LAGOS_ISLAND);
        assert_eq!(feed.refresh(None, "").unwrap(), RunOutcome::Applied);
        assert_eq!(feed.view().state, ListingState::Empty);
    }

    #[test]
    fn test_failure_state() {
        let feed = feed(100.0);
        let ticket = feed.begin_run();
        assert!(feed.view().is_fetching);
        assert_eq!(feed.fail(ticket, "listing service unavailable"), RunOutcome::Applied);
        let view = feed.view();
        assert_eq!(view.state, ListingState::Failed("listing service unavailable".to_string()));
        assert!(!view.is_fetching);
    }

    #[test]
    fn test_stale_ticket_is_superseded() {
        let feed = feed(100.0);
        let stale = feed.begin_run();
        let fresh = feed.begin_run();
        assert!(fresh.generation() > stale.generation());

        assert_eq!(feed.apply(fresh, Vec::new()), RunOutcome::Applied);
        let late = vec![FilteredCandidate { candidate: stores()[0].clone(), distance_km: 1.0 }];
        assert_eq!(feed.apply(stale, late), RunOutcome::Superseded);
        assert_eq!(feed.view().state, ListingState::Empty);
    }

    #[test]
    fn test_moving_clears_cache_but_jitter_does_not() {
        let feed = feed(100.0);
        assert!(feed.update_location(LAGOS_ISLAND));
        feed.refresh(Some(&stores()), "").unwrap();
        assert_eq!(feed.engine().cache().len(), 2);

        // within the key precision
        assert!(!feed.update_location(GeoCoordinate::new(6.454_12, 3.394_71)));
        assert_eq!(feed.engine().cache().len(), 2);

        assert!(feed.update_location(GeoCoordinate::new(6.4600, 3.4000)));
        assert!(feed.engine().cache().is_empty());
    }

    #[test]
    fn test_move_reports_fetching_until_next_refresh() {
        let feed = feed(100.0);
        feed.update_location(LAGOS_ISLAND);
        feed.refresh(Some(&stores()), "").unwrap();
        assert!(!feed.view().is_fetching);

        let pending = feed.begin_run();
        assert!(feed.update_location(GeoCoordinate::new(6.6018, 3.3515)));
        assert!(feed.view().is_fetching);
        assert_eq!(feed.apply(pending, Vec::new()), RunOutcome::Superseded);
        assert!(matches!(feed.view().state, ListingState::Ready(_)));

        assert_eq!(feed.refresh(Some(&stores()), "").unwrap(), RunOutcome::Applied);
        assert!(!feed.view().is_fetching);
    }

    #[test]
    fn test_invalid_fix_ignored() {
        let feed = feed(100.0);
        assert!(!feed.update_location(GeoCoordinate::new(f64::NAN, 3.3)));
        assert_eq!(feed.location(), None);
    }
}
