//! Store directory records and query parameters.

use serde::{Deserialize, Serialize};

use crate::geo::GeoLocation;

/// A raw store directory entry as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreRecord {
    pub uid: Option<i64>,
    pub store_code: Option<String>,
    pub name: String,
    pub address: StoreAddress,
    pub contact_numbers: ContactNumbers,
    pub store_type: Option<String>,
    pub tags: Vec<String>,
    pub timing: Vec<StoreTiming>,
    pub manager: Option<StoreManager>,
}

impl StoreRecord {
    /// Stable identifier: `uid` when present, else `store_code`.
    #[must_use]
    pub fn id(&self) -> String {
        match (self.uid, self.store_code.as_deref()) {
            (Some(uid), _) => uid.to_string(),
            (None, Some(code)) => code.to_string(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreAddress {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub landmark: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: Option<String>,
    /// Free-text single-line address some directories send instead of
    /// structured fields.
    pub address: Option<String>,
    pub lat_long: Option<LatLong>,
}

/// GeoJSON point; `coordinates` is `[lng, lat]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatLong {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub coordinates: Vec<f64>,
}

impl LatLong {
    /// Returns the point when both axes are present and not the `[0, 0]`
    /// placeholder.
    #[must_use]
    pub fn to_geo_location(&self) -> Option<GeoLocation> {
        match self.coordinates.as_slice() {
            [lng, lat, ..] if !(*lat == 0.0 && *lng == 0.0) => Some(GeoLocation {
                latitude: *lat,
                longitude: *lng,
            }),
            _ => None,
        }
    }
}

/// A `{country_code, number}` phone entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneNumber {
    pub country_code: Option<serde_json::Value>,
    pub number: Option<String>,
}

/// Contact numbers come in several shapes depending on the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContactNumbers {
    #[default]
    None,
    Text(String),
    // Must precede `Structured`: a defaulted struct also accepts a sequence.
    List(Vec<PhoneNumber>),
    Structured(PhoneNumber),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Opening hours for one weekday.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreTiming {
    /// Lower-case English weekday name, e.g. `"monday"`.
    pub weekday: String,
    pub open: bool,
    pub opening: Option<TimeOfDay>,
    pub closing: Option<TimeOfDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreManager {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile_no: Option<PhoneNumber>,
}

/// Page metadata returned alongside a store listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageInfo {
    pub current: u32,
    pub size: u32,
    pub item_total: u32,
    pub has_next: bool,
}

/// One page of directory results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorePage {
    pub items: Vec<StoreRecord>,
    pub page: PageInfo,
}

/// Query parameters for a directory listing.
///
/// Optional fields left as `None` are not sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub page_no: u32,
    pub page_size: u32,
    pub city: Option<String>,
    pub query: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Search radius in meters around `latitude`/`longitude`.
    pub range: Option<u32>,
}

impl StoreQuery {
    /// First page, no filters.
    #[must_use]
    pub fn unfiltered(page_size: u32) -> Self {
        Self {
            page_no: 1,
            page_size,
            city: None,
            query: None,
            latitude: None,
            longitude: None,
            range: None,
        }
    }

    /// GraphQL variables with unset filters omitted.
    #[must_use]
    pub fn to_variables(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut vars = serde_json::Map::new();
        vars.insert("pageNo".to_string(), self.page_no.into());
        vars.insert("pageSize".to_string(), self.page_size.into());
        if let Some(city) = &self.city {
            vars.insert("city".to_string(), city.clone().into());
        }
        if let Some(query) = &self.query {
            vars.insert("query".to_string(), query.clone().into());
        }
        if let Some(lat) = self.latitude {
            vars.insert("latitude".to_string(), lat.into());
        }
        if let Some(lng) = self.longitude {
            vars.insert("longitude".to_string(), lng.into());
        }
        if let Some(range) = self.range {
            vars.insert("range".to_string(), range.into());
        }
        vars
    }
}
