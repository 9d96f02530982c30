//! In-memory store directory backed by a YAML fixture.

use std::path::Path;

use storeloc_core::normalize::format_address;
use storeloc_core::store::LatLong;
use storeloc_core::{
    haversine_distance_km, load_stores_file, ConfigError, PageInfo, StorePage, StoreQuery,
    StoreRecord,
};

use crate::directory::StoreDirectory;
use crate::error::DirectoryError;

/// Serves store listings from a fixed record set, applying the same filters
/// the backend does: exact city (case-insensitive), free-text query over
/// name/code/address, and a radius around a point.
#[derive(Debug, Clone, Default)]
pub struct FixtureDirectory {
    stores: Vec<StoreRecord>,
}

impl FixtureDirectory {
    #[must_use]
    pub fn new(stores: Vec<StoreRecord>) -> Self {
        Self { stores }
    }

    /// Load records from a YAML stores file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let file = load_stores_file(path)?;
        tracing::debug!(path = %path.display(), count = file.stores.len(), "loaded store fixture");
        Ok(Self::new(file.stores))
    }

    fn matches(store: &StoreRecord, query: &StoreQuery) -> bool {
        if let Some(city) = query.city.as_deref() {
            let store_city = store.address.city.as_deref().unwrap_or("").trim();
            if !store_city.eq_ignore_ascii_case(city.trim()) {
                return false;
            }
        }
        if let Some(text) = query.query.as_deref() {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() {
                let haystack = format!(
                    "{} {} {}",
                    store.name,
                    store.store_code.as_deref().unwrap_or(""),
                    format_address(&store.address)
                )
                .to_lowercase();
                if !haystack.contains(&needle) {
                    return false;
                }
            }
        }
        true
    }

    /// Distance in km from the query point, when the query has one and the
    /// store carries coordinates.
    fn distance_km(store: &StoreRecord, query: &StoreQuery) -> Option<f64> {
        let (lat, lng) = (query.latitude?, query.longitude?);
        let geo = store
            .address
            .lat_long
            .as_ref()
            .and_then(LatLong::to_geo_location)?;
        Some(haversine_distance_km(lat, lng, geo.latitude, geo.longitude))
    }
}

impl StoreDirectory for FixtureDirectory {
    async fn fetch_stores(&self, query: &StoreQuery) -> Result<StorePage, DirectoryError> {
        let mut matched: Vec<(Option<f64>, &StoreRecord)> = self
            .stores
            .iter()
            .filter(|s| Self::matches(s, query))
            .map(|s| (Self::distance_km(s, query), s))
            .collect();

        if let (Some(_), Some(_)) = (query.latitude, query.longitude) {
            if let Some(range_m) = query.range {
                let range_km = f64::from(range_m) / 1000.0;
                matched.retain(|(d, _)| d.is_some_and(|km| km <= range_km));
            }
            matched.sort_by(|(a, _), (b, _)| {
                a.unwrap_or(f64::MAX).total_cmp(&b.unwrap_or(f64::MAX))
            });
        }

        let item_total = u32::try_from(matched.len()).unwrap_or(u32::MAX);
        let size = query.page_size.max(1);
        let start = usize::try_from(query.page_no.saturating_sub(1).saturating_mul(size))
            .unwrap_or(usize::MAX);
        let items: Vec<StoreRecord> = matched
            .into_iter()
            .skip(start)
            .take(size as usize)
            .map(|(_, s)| s.clone())
            .collect();
        let shown = u32::try_from(start.saturating_add(items.len())).unwrap_or(u32::MAX);

        Ok(StorePage {
            items,
            page: PageInfo {
                current: query.page_no.max(1),
                size,
                item_total,
                has_next: shown < item_total,
            },
        })
    }
}
