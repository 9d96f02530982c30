//! Search and city filter state, with debounced refetching.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use storeloc_client::{GeocodingProvider, StoreDirectory};
use storeloc_core::{LatLng, NormalizedStore, StoreQuery};

use crate::fetcher::StoreFetcher;

/// User-controlled filter values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub search_value: String,
    pub city_value: String,
    pub selected_store: Option<NormalizedStore>,
    pub user_location: Option<LatLng>,
}

/// Owns [`FilterState`] and turns changes into fetches.
///
/// Text searches wait for `debounce` after the last change; other changes
/// fetch right away. Only the most recently scheduled fetch ever fires.
pub struct FilterController<D, G> {
    fetcher: Arc<StoreFetcher<D, G>>,
    state: FilterState,
    debounce: Duration,
    page_size: u32,
    search_range_meters: u32,
    timer: Option<JoinHandle<()>>,
    /// A change arrived before the initial fetch finished.
    replay_pending: bool,
}

impl<D, G> FilterController<D, G>
where
    D: StoreDirectory,
    G: GeocodingProvider,
{
    pub fn new(
        fetcher: Arc<StoreFetcher<D, G>>,
        debounce: Duration,
        page_size: u32,
        search_range_meters: u32,
    ) -> Self {
        Self {
            fetcher,
            state: FilterState::default(),
            debounce,
            page_size,
            search_range_meters,
            timer: None,
            replay_pending: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Update the search text. Clears the selected store.
    pub fn set_search(&mut self, value: &str) {
        if self.state.search_value == value {
            return;
        }
        value.clone_into(&mut self.state.search_value);
        self.state.selected_store = None;
        self.schedule();
    }

    pub fn set_city(&mut self, value: &str) {
        if self.state.city_value == value {
            return;
        }
        value.clone_into(&mut self.state.city_value);
        self.schedule();
    }

    /// Set or clear the point "near me" searches are centered on.
    pub fn set_user_location(&mut self, location: Option<LatLng>) {
        if self.state.user_location == location {
            return;
        }
        self.state.user_location = location;
        self.schedule();
    }

    pub fn select_store(&mut self, store: NormalizedStore) {
        self.state.selected_store = Some(store);
    }

    pub fn clear_selection(&mut self) {
        self.state.selected_store = None;
    }

    /// Query for the current filters. Blank values are left unset.
    #[must_use]
    pub fn query(&self) -> StoreQuery {
        let non_blank = |v: &str| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        };
        let location = self.state.user_location;
        StoreQuery {
            page_no: 1,
            page_size: self.page_size,
            city: non_blank(&self.state.city_value),
            query: non_blank(&self.state.search_value),
            latitude: location.map(|p| p.lat),
            longitude: location.map(|p| p.lng),
            range: location.map(|_| self.search_range_meters),
        }
    }

    /// Fire the fetch for a change that arrived before the initial load.
    pub fn replay_pending(&mut self) {
        if std::mem::take(&mut self.replay_pending) {
            self.schedule();
        }
    }

    /// Whether a debounced fetch is waiting to fire.
    #[must_use]
    pub fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Wait until a scheduled fetch, if any, has been issued.
    pub async fn wait_for_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            if let Err(e) = timer.await {
                if !e.is_cancelled() {
                    tracing::error!(error = %e, "debounce task panicked");
                }
            }
        }
    }

    /// Drop any scheduled fetch.
    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn schedule(&mut self) {
        self.cancel_timer();

        if !self.fetcher.all_stores_loaded() {
            tracing::debug!("initial store load pending; deferring filtered fetch");
            self.replay_pending = true;
            return;
        }

        let query = self.query();
        let delay = if self.state.search_value.trim().is_empty() {
            Duration::ZERO
        } else {
            self.debounce
        };

        if delay.is_zero() {
            self.fetcher.fetch_stores(query, false);
            return;
        }

        let fetcher = Arc::clone(&self.fetcher);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::debug!(query = query.query.as_deref(), "debounce elapsed; fetching");
            fetcher.fetch_stores(query, false);
        }));
    }
}

impl<D, G> Drop for FilterController<D, G> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// City dropdown options from an unfiltered store set.
///
/// Deduplicated case-insensitively, keeping the first casing seen, sorted
/// case-insensitively by label.
#[must_use]
pub fn derive_city_options(stores: &[NormalizedStore]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut options: Vec<String> = stores
        .iter()
        .filter_map(|s| s.original.address.city.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(c.to_lowercase()))
        .map(str::to_string)
        .collect();
    options.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    options
}
