//! Observable store list state.

use storeloc_core::{store_coordinates, LatLng, NormalizedStore, PageInfo};

/// Snapshot of what the locator is currently showing.
///
/// Published through a `tokio::sync::watch` channel; only the fetcher writes
/// it.
#[derive(Debug, Clone, Default)]
pub struct StoreListState {
    /// Stores matching the active filters.
    pub display_stores: Vec<NormalizedStore>,
    /// Unfiltered result of the initial fetch; source of filter options.
    pub all_stores: Vec<NormalizedStore>,
    /// The initial fetch has finished, successfully or not.
    pub all_stores_loaded: bool,
    /// A directory request is in flight.
    pub loading: bool,
    /// The visible list is waiting on geocode enrichment.
    pub enriching: bool,
    pub page: PageInfo,
    /// Generation of the fetch that produced `display_stores`.
    pub generation: u64,
}

impl StoreListState {
    /// Displayed stores that have a known position, in display order.
    #[must_use]
    pub fn stores_with_coordinates(&self) -> Vec<&NormalizedStore> {
        self.display_stores
            .iter()
            .filter(|s| store_coordinates(s).is_some())
            .collect()
    }

    /// Positions of the displayed stores that have one.
    #[must_use]
    pub fn coordinates(&self) -> Vec<LatLng> {
        self.display_stores
            .iter()
            .filter_map(store_coordinates)
            .collect()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&NormalizedStore> {
        self.display_stores.iter().find(|s| s.id == id)
    }

    /// Nothing to show and nothing pending: the "no stores found" state.
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        !self.loading && self.display_stores.is_empty()
    }

    /// No request or enrichment pending.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.loading && !self.enriching
    }
}
