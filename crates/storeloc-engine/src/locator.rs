//! The store locator: fetcher, filters, and map viewport wired together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use storeloc_client::{Geocoder, GeocodingProvider, StoreDirectory};
use storeloc_core::{store_coordinates, AppConfig, LatLng, StoreQuery};

use crate::error::EngineError;
use crate::fetcher::{FetchOutcome, StoreFetcher};
use crate::filters::{derive_city_options, FilterController, FilterState};
use crate::state::StoreListState;
use crate::viewport::{CameraMove, MapWidget, ViewportSettings, ViewportSynchronizer};

#[derive(Debug, Clone, Copy)]
pub struct LocatorSettings {
    pub page_size: u32,
    pub search_debounce: Duration,
    pub search_range_meters: u32,
    pub viewport: ViewportSettings,
}

impl LocatorSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_size: config.page_size,
            search_debounce: Duration::from_millis(config.search_debounce_ms),
            search_range_meters: config.search_range_meters,
            viewport: ViewportSettings {
                fallback_center: config.default_center,
                focus_zoom: config.focus_zoom,
                focus_delay: Duration::from_millis(config.focus_delay_ms),
            },
        }
    }
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            search_debounce: Duration::from_millis(500),
            search_range_meters: 10_000,
            viewport: ViewportSettings::default(),
        }
    }
}

/// A store locator session.
///
/// Call [`StoreLocator::load`] once, then drive it with filter changes and
/// map lifecycle events. Must live inside a tokio runtime.
pub struct StoreLocator<D, G, W> {
    fetcher: Arc<StoreFetcher<D, G>>,
    filters: FilterController<D, G>,
    viewport: ViewportSynchronizer<W>,
    page_size: u32,
}

impl<D, G, W> StoreLocator<D, G, W>
where
    D: StoreDirectory,
    G: GeocodingProvider,
    W: MapWidget,
{
    pub fn new(directory: D, geocoder: Geocoder<G>, settings: LocatorSettings) -> Self {
        let fetcher = Arc::new(StoreFetcher::new(directory, geocoder));
        let filters = FilterController::new(
            Arc::clone(&fetcher),
            settings.search_debounce,
            settings.page_size,
            settings.search_range_meters,
        );
        Self {
            fetcher,
            filters,
            viewport: ViewportSynchronizer::new(settings.viewport),
            page_size: settings.page_size,
        }
    }

    /// Fetch every store, fill the all-stores cache, then apply any filter
    /// changes made while it ran.
    pub async fn load(&mut self) -> FetchOutcome {
        let handle = self
            .fetcher
            .fetch_stores(StoreQuery::unfiltered(self.page_size), true);
        let outcome = handle.finished().await;
        tracing::info!(?outcome, "initial store load finished");
        self.filters.replay_pending();
        outcome
    }

    pub fn set_search(&mut self, text: &str) {
        self.filters.set_search(text);
        if self.filters.state().selected_store.is_none() {
            self.viewport.clear_focus();
        }
    }

    pub fn set_city(&mut self, city: &str) {
        self.filters.set_city(city);
    }

    pub fn set_user_location(&mut self, location: Option<LatLng>) {
        self.filters.set_user_location(location);
    }

    /// Select a displayed store and focus the map on it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownStore`] if `id` is not in the displayed
    /// list.
    pub async fn select_store(&mut self, id: &str) -> Result<CameraMove, EngineError> {
        let store = self
            .fetcher
            .snapshot()
            .find(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownStore(id.to_string()))?;
        let point = store_coordinates(&store);
        self.filters.select_store(store);

        match point {
            Some(point) => Ok(self.viewport.focus(point).await),
            None => {
                tracing::debug!(id, "selected store has no coordinates; camera unchanged");
                Ok(CameraMove::None)
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.filters.clear_selection();
        self.viewport.clear_focus();
    }

    /// City filter options, from the unfiltered initial load.
    #[must_use]
    pub fn city_options(&self) -> Vec<String> {
        derive_city_options(&self.fetcher.snapshot().all_stores)
    }

    #[must_use]
    pub fn filters(&self) -> &FilterState {
        self.filters.state()
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreListState {
        self.fetcher.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreListState> {
        self.fetcher.subscribe()
    }

    /// Wait for pending debounce timers and fetches, then return the state.
    pub async fn settled(&mut self) -> StoreListState {
        self.filters.wait_for_timer().await;
        let mut rx = self.fetcher.subscribe();
        let state = match rx.wait_for(StoreListState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.fetcher.snapshot(),
        };
        state
    }

    /// Bring the map camera in line with the displayed stores.
    pub fn sync_map(&mut self) -> CameraMove {
        let state = self.fetcher.snapshot();
        self.viewport.sync(&state.display_stores)
    }

    /// The map finished loading.
    pub fn attach_map(&mut self, widget: W) -> CameraMove {
        self.viewport.attach(widget);
        self.sync_map()
    }

    pub fn on_map_idle(&mut self) {
        self.viewport.on_idle();
    }

    pub fn detach_map(&mut self) -> Option<W> {
        self.viewport.detach()
    }

    #[must_use]
    pub fn viewport(&self) -> &ViewportSynchronizer<W> {
        &self.viewport
    }

    /// Abort the pending debounce timer and the in-flight fetch.
    pub fn shutdown(&mut self) {
        self.filters.cancel_timer();
        self.fetcher.cancel();
        tracing::debug!("store locator shut down");
    }
}
