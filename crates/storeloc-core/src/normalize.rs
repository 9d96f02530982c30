//! Mapping from raw directory records to the display shape.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Weekday;
use serde::Serialize;

use crate::geo::{format_distance_km, GeoLocation, LatLng};
use crate::store::{ContactNumbers, LatLong, PhoneNumber, StoreAddress, StoreRecord, StoreTiming};

/// A store ready for display.
///
/// Never mutated in place: coordinate enrichment produces a new value via
/// [`NormalizedStore::with_coordinates`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedStore {
    pub id: String,
    pub name: String,
    pub distance: Option<String>,
    pub address: String,
    pub phone: String,
    pub hours: Vec<StoreTiming>,
    pub badges: BTreeSet<String>,
    pub coordinates: Option<LatLng>,
    pub geo_location: Option<GeoLocation>,
    /// The source record, for fields not promoted to this shape.
    #[serde(skip)]
    pub original: Arc<StoreRecord>,
}

impl NormalizedStore {
    /// Copy of this store positioned at `point`, with `distance` recomputed
    /// against `user_location`.
    #[must_use]
    pub fn with_coordinates(&self, point: LatLng, user_location: Option<LatLng>) -> Self {
        Self {
            coordinates: Some(point),
            geo_location: Some(point.into()),
            distance: user_location.map(|user| format_distance_km(user.distance_km(&point))),
            ..self.clone()
        }
    }

    /// Copy of this store with `distance` recomputed against `user_location`.
    #[must_use]
    pub fn with_user_location(&self, user_location: Option<LatLng>) -> Self {
        let distance = match (user_location, store_coordinates(self)) {
            (Some(user), Some(point)) => Some(format_distance_km(user.distance_km(&point))),
            _ => None,
        };
        Self {
            distance,
            ..self.clone()
        }
    }

    /// Opening hours label for `weekday`: `"10:00 - 21:00"`, `"Closed"`, or
    /// `None` when the directory has no timing for that day.
    #[must_use]
    pub fn hours_for(&self, weekday: Weekday) -> Option<String> {
        let wanted = weekday_name(weekday);
        let timing = self
            .hours
            .iter()
            .find(|t| t.weekday.trim().eq_ignore_ascii_case(wanted))?;
        if !timing.open {
            return Some("Closed".to_string());
        }
        match (timing.opening, timing.closing) {
            (Some(open), Some(close)) => Some(format!("{open} - {close}")),
            _ => Some("Open".to_string()),
        }
    }
}

/// Build the display shape of `record`.
///
/// `coordinates` always starts empty; `geo_location` is filled only when the
/// directory already supplied a point. `distance` is set when both that point
/// and `user_location` are known.
#[must_use]
pub fn normalize_store(record: Arc<StoreRecord>, user_location: Option<LatLng>) -> NormalizedStore {
    let geo_location = record
        .address
        .lat_long
        .as_ref()
        .and_then(LatLong::to_geo_location);
    let distance = match (user_location, geo_location) {
        (Some(user), Some(geo)) => Some(format_distance_km(user.distance_km(&geo.into()))),
        _ => None,
    };

    NormalizedStore {
        id: record.id(),
        name: record.name.trim().to_string(),
        distance,
        address: format_address(&record.address),
        phone: format_phone(&record.contact_numbers),
        hours: record.timing.clone(),
        badges: store_badges(&record),
        coordinates: None,
        geo_location,
        original: record,
    }
}

/// Coordinates of a store: `coordinates` first, then `geo_location`.
#[must_use]
pub fn store_coordinates(store: &NormalizedStore) -> Option<LatLng> {
    store
        .coordinates
        .or_else(|| store.geo_location.map(LatLng::from))
}

/// Join the non-empty structured address parts with `", "`.
///
/// Falls back to the free-text `address` field when every structured part is
/// empty.
#[must_use]
pub fn format_address(address: &StoreAddress) -> String {
    let line = [address.address1.as_deref(), address.address2.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let parts: Vec<&str> = std::iter::once(line.as_str())
        .chain(
            [
                address.city.as_deref(),
                address.state.as_deref(),
                address.pincode.as_deref(),
                address.country.as_deref(),
            ]
            .into_iter()
            .flatten(),
        )
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        return address
            .address
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
    }
    parts.join(", ")
}

/// Display form of a store's contact numbers.
#[must_use]
pub fn format_phone(contact: &ContactNumbers) -> String {
    match contact {
        ContactNumbers::Text(text) => text.clone(),
        ContactNumbers::Structured(phone) => format_phone_number(phone),
        ContactNumbers::List(list) => list.first().map(format_phone_number).unwrap_or_default(),
        ContactNumbers::None | ContactNumbers::Other(_) => String::new(),
    }
}

fn format_phone_number(phone: &PhoneNumber) -> String {
    let Some(number) = phone.number.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
        return String::new();
    };
    let code = match &phone.country_code {
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s.trim().trim_start_matches('+').to_string(),
        _ => String::new(),
    };
    if code.is_empty() {
        number.to_string()
    } else {
        format!("+{code} {number}")
    }
}

/// Capability tags shown on a store card.
fn store_badges(record: &StoreRecord) -> BTreeSet<String> {
    let mut badges: BTreeSet<String> = record
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(kind) = record.store_type.as_deref().map(humanize).filter(|k| !k.is_empty()) {
        badges.insert(kind);
    }
    badges
}

/// `"high_street"` → `"High Street"`.
fn humanize(raw: &str) -> String {
    raw.split(['_', '-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
