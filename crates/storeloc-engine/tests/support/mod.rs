//! Test doubles shared by the engine integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storeloc_client::{DirectoryError, GeocodeError, GeocodingProvider, StoreDirectory};
use storeloc_core::store::{LatLong, StoreAddress};
use storeloc_core::{Bounds, LatLng, PageInfo, StorePage, StoreQuery, StoreRecord};
use storeloc_engine::{CameraMove, MapError, MapWidget};

pub fn store(uid: i64, name: &str, address1: &str, city: &str) -> StoreRecord {
    StoreRecord {
        uid: Some(uid),
        name: name.to_string(),
        address: StoreAddress {
            address1: Some(address1.to_string()),
            city: Some(city.to_string()),
            ..StoreAddress::default()
        },
        ..StoreRecord::default()
    }
}

/// A store whose directory record already carries a position.
pub fn located_store(uid: i64, name: &str, city: &str, point: LatLng) -> StoreRecord {
    let mut record = store(uid, name, &format!("{uid} Main Road"), city);
    record.address.lat_long = Some(LatLong {
        kind: Some("Point".to_string()),
        coordinates: vec![point.lng, point.lat],
    });
    record
}

/// In-memory directory that records queries and can be slowed or broken
/// per test.
pub struct ScriptedDirectory {
    stores: Vec<StoreRecord>,
    delays: HashMap<String, Duration>,
    failing: Arc<AtomicBool>,
    log: Arc<Mutex<Vec<StoreQuery>>>,
}

impl ScriptedDirectory {
    pub fn new(stores: Vec<StoreRecord>) -> Self {
        Self {
            stores,
            delays: HashMap::new(),
            failing: Arc::new(AtomicBool::new(false)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay responses for queries filtered to `city`.
    pub fn with_delay(mut self, city: &str, delay: Duration) -> Self {
        self.delays.insert(city.to_lowercase(), delay);
        self
    }

    pub fn query_log(&self) -> Arc<Mutex<Vec<StoreQuery>>> {
        Arc::clone(&self.log)
    }

    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failing)
    }
}

impl StoreDirectory for ScriptedDirectory {
    async fn fetch_stores(&self, query: &StoreQuery) -> Result<StorePage, DirectoryError> {
        self.log.lock().expect("query log poisoned").push(query.clone());

        let city = query.city.as_deref().map(str::to_lowercase);
        if let Some(delay) = city.as_ref().and_then(|c| self.delays.get(c)) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DirectoryError::Graphql("backend unavailable".to_string()));
        }

        let needle = query.query.as_deref().map(str::to_lowercase);
        let items: Vec<StoreRecord> = self
            .stores
            .iter()
            .filter(|s| {
                city.as_deref().is_none_or(|c| {
                    s.address.city.as_deref().map(str::to_lowercase).as_deref() == Some(c)
                })
            })
            .filter(|s| {
                needle
                    .as_deref()
                    .is_none_or(|n| s.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();

        let total = u32::try_from(items.len()).expect("test store count fits u32");
        Ok(StorePage {
            items,
            page: PageInfo {
                current: 1,
                size: query.page_size,
                item_total: total,
                has_next: false,
            },
        })
    }
}

/// Geocoder answering from a fixed table; addresses listed in `failing`
/// return a service error and those in `delays` answer late.
#[derive(Default)]
pub struct TableGeocoder {
    table: HashMap<String, LatLng>,
    failing: Vec<String>,
    delays: HashMap<String, Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl TableGeocoder {
    pub fn with(mut self, address: &str, point: LatLng) -> Self {
        self.table.insert(address.to_string(), point);
        self
    }

    pub fn failing(mut self, address: &str) -> Self {
        self.failing.push(address.to_string());
        self
    }

    pub fn with_delay(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_string(), delay);
        self
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

impl GeocodingProvider for TableGeocoder {
    fn is_available(&self) -> bool {
        true
    }

    async fn geocode(&self, address: &str) -> Result<Option<LatLng>, GeocodeError> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(address.to_string());
        if let Some(delay) = self.delays.get(address) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.iter().any(|a| a == address) {
            return Err(GeocodeError::Service {
                status: "UNKNOWN_ERROR".to_string(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(self.table.get(address).copied())
    }
}

/// Map widget that records every camera call.
#[derive(Debug, Default)]
pub struct RecordingMap {
    pub center: Option<LatLng>,
    pub zoom: Option<u8>,
    pub calls: Vec<CameraMove>,
}

impl RecordingMap {
    pub fn fit_bounds_calls(&self) -> Vec<Bounds> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                CameraMove::FitBounds(b) => Some(*b),
                _ => None,
            })
            .collect()
    }
}

impl MapWidget for RecordingMap {
    fn pan_to(&mut self, center: LatLng) -> Result<(), MapError> {
        self.center = Some(center);
        self.calls.push(CameraMove::PanTo(center));
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: Bounds) -> Result<(), MapError> {
        self.center = Some(bounds.center());
        self.calls.push(CameraMove::FitBounds(bounds));
        Ok(())
    }

    fn set_zoom(&mut self, zoom: u8) -> Result<(), MapError> {
        self.zoom = Some(zoom);
        Ok(())
    }

    fn center(&self) -> Option<LatLng> {
        self.center
    }

    fn zoom(&self) -> Option<u8> {
        self.zoom
    }
}
