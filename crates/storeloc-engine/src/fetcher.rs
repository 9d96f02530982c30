//! Store data fetcher.
//!
//! Every call to [`StoreFetcher::fetch_stores`] takes a new generation number
//! and aborts the previous request. A fetch commits in two phases, the plain
//! list first and the geocoded list second, and each phase is applied only
//! while its generation is still the latest. A response from a superseded
//! request therefore never reaches the visible list, even if it slips past the
//! abort.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use storeloc_client::{Geocoder, GeocodingProvider, StoreDirectory};
use storeloc_core::{normalize_store, store_coordinates, LatLng, NormalizedStore, PageInfo, StoreQuery};

use crate::state::StoreListState;

/// How a single fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Results were committed. `located` counts stores with coordinates
    /// after enrichment.
    Committed { count: usize, located: usize },
    /// A newer fetch replaced this one before it could commit.
    Superseded,
    /// The directory request failed; the visible list was cleared.
    Failed,
}

/// Handle to a spawned fetch.
#[derive(Debug)]
pub struct FetchHandle {
    generation: u64,
    task: JoinHandle<FetchOutcome>,
}

impl FetchHandle {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the fetch, including enrichment, to finish.
    pub async fn finished(self) -> FetchOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => FetchOutcome::Superseded,
            Err(e) => {
                tracing::error!(generation = self.generation, error = %e, "fetch task panicked");
                FetchOutcome::Failed
            }
        }
    }
}

/// Issues directory queries and owns the published [`StoreListState`].
pub struct StoreFetcher<D, G> {
    directory: Arc<D>,
    geocoder: Arc<Geocoder<G>>,
    state: Arc<watch::Sender<StoreListState>>,
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl<D, G> StoreFetcher<D, G>
where
    D: StoreDirectory,
    G: GeocodingProvider,
{
    pub fn new(directory: D, geocoder: Geocoder<G>) -> Self {
        let (state, _) = watch::channel(StoreListState::default());
        Self {
            directory: Arc::new(directory),
            geocoder: Arc::new(geocoder),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
        }
    }

    /// Start a fetch for `query`, aborting whichever fetch was running.
    ///
    /// With `is_initial` the result also replaces the all-stores cache.
    /// Must be called from within a tokio runtime.
    pub fn fetch_stores(&self, query: StoreQuery, is_initial: bool) -> FetchHandle {
        // Generation and in-flight slot change together so the newest
        // generation always owns the slot.
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = slot.take() {
            if !previous.is_finished() {
                tracing::debug!(generation, "aborting superseded store fetch");
            }
            previous.abort();
        }

        self.state.send_modify(|s| s.loading = true);

        let job = FetchJob {
            directory: Arc::clone(&self.directory),
            geocoder: Arc::clone(&self.geocoder),
            state: Arc::clone(&self.state),
            current: Arc::clone(&self.generation),
            generation,
            query,
            is_initial,
        };
        let task = tokio::spawn(job.run());
        *slot = Some(task.abort_handle());

        FetchHandle { generation, task }
    }

    /// Abort any in-flight fetch and invalidate its pending commits.
    pub fn cancel(&self) {
        let previous = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            self.generation.fetch_add(1, Ordering::SeqCst);
            slot.take()
        };
        if let Some(previous) = previous {
            previous.abort();
        }
        self.state.send_if_modified(|s| {
            let changed = s.loading || s.enriching;
            s.loading = false;
            s.enriching = false;
            changed
        });
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreListState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreListState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn all_stores_loaded(&self) -> bool {
        self.state.borrow().all_stores_loaded
    }

    #[must_use]
    pub fn geocoding_available(&self) -> bool {
        self.geocoder.is_available()
    }

    /// Latest generation handed out.
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl<D, G> Drop for StoreFetcher<D, G> {
    fn drop(&mut self) {
        if let Some(previous) = self
            .in_flight
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            previous.abort();
        }
    }
}

/// Everything one spawned fetch needs, owned.
struct FetchJob<D, G> {
    directory: Arc<D>,
    geocoder: Arc<Geocoder<G>>,
    state: Arc<watch::Sender<StoreListState>>,
    current: Arc<AtomicU64>,
    generation: u64,
    query: StoreQuery,
    is_initial: bool,
}

impl<D, G> FetchJob<D, G>
where
    D: StoreDirectory,
    G: GeocodingProvider,
{
    async fn run(self) -> FetchOutcome {
        let origin = query_origin(&self.query);

        let page = match self.directory.fetch_stores(&self.query).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(
                    generation = self.generation,
                    initial = self.is_initial,
                    error = %e,
                    "store fetch failed; clearing list"
                );
                let is_initial = self.is_initial;
                self.commit(|s| {
                    s.display_stores.clear();
                    s.page = PageInfo::default();
                    if is_initial {
                        s.all_stores.clear();
                        s.all_stores_loaded = true;
                    }
                    s.loading = false;
                    s.enriching = false;
                });
                return FetchOutcome::Failed;
            }
        };

        let stores: Vec<NormalizedStore> = page
            .items
            .into_iter()
            .map(|record| normalize_store(Arc::new(record), origin))
            .collect();
        let count = stores.len();
        let enrich = self.geocoder.is_available();

        let committed = self.commit(|s| {
            if self.is_initial {
                s.all_stores.clone_from(&stores);
                s.all_stores_loaded = true;
            }
            s.display_stores.clone_from(&stores);
            s.page = page.page.clone();
            s.loading = false;
            s.enriching = enrich;
            s.generation = self.generation;
        });
        if !committed {
            return FetchOutcome::Superseded;
        }
        tracing::debug!(generation = self.generation, count, "committed store list");

        if !enrich {
            let located = stores.iter().filter(|s| store_coordinates(s).is_some()).count();
            return FetchOutcome::Committed { count, located };
        }

        let enriched = enrich_stores(&self.geocoder, &stores, origin).await;
        let located = enriched.iter().filter(|s| store_coordinates(s).is_some()).count();

        let committed = self.commit(|s| {
            s.display_stores = enriched;
            s.enriching = false;
        });
        if !committed {
            tracing::debug!(generation = self.generation, "dropping stale enrichment");
            return FetchOutcome::Superseded;
        }
        tracing::debug!(generation = self.generation, count, located, "committed enriched store list");
        FetchOutcome::Committed { count, located }
    }

    /// Apply `update` only while this job's generation is still current.
    fn commit(&self, update: impl FnOnce(&mut StoreListState)) -> bool {
        self.state.send_if_modified(|s| {
            if self.current.load(Ordering::SeqCst) != self.generation {
                return false;
            }
            update(s);
            true
        })
    }
}

/// Geocode every store lacking a position, concurrently. Stores whose lookup
/// fails are returned unchanged.
async fn enrich_stores<G: GeocodingProvider>(
    geocoder: &Geocoder<G>,
    stores: &[NormalizedStore],
    origin: Option<LatLng>,
) -> Vec<NormalizedStore> {
    join_all(stores.iter().map(|store| async move {
        if store_coordinates(store).is_some() {
            return store.clone();
        }
        match geocoder.geocode(&store.address).await {
            Some(point) => store.with_coordinates(point, origin),
            None => store.clone(),
        }
    }))
    .await
}

/// The point distances are measured from, when the query has one.
fn query_origin(query: &StoreQuery) -> Option<LatLng> {
    match (query.latitude, query.longitude) {
        (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)),
        _ => None,
    }
}
