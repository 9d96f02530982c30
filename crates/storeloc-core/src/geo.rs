//! Coordinate types and great-circle math.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by [`haversine_distance_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Two centers closer than this (in degrees, per axis) are treated as equal.
pub const CENTER_EPSILON_DEG: f64 = 0.001;

/// A map point in the `{lat, lng}` shape used by map widgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` when either axis differs from `other` by more than
    /// [`CENTER_EPSILON_DEG`].
    #[must_use]
    pub fn differs_from(&self, other: &LatLng) -> bool {
        (self.lat - other.lat).abs() > CENTER_EPSILON_DEG
            || (self.lng - other.lng).abs() > CENTER_EPSILON_DEG
    }

    #[must_use]
    pub fn distance_km(&self, other: &LatLng) -> f64 {
        haversine_distance_km(self.lat, self.lng, other.lat, other.lng)
    }
}

impl From<GeoLocation> for LatLng {
    fn from(geo: GeoLocation) -> Self {
        Self {
            lat: geo.latitude,
            lng: geo.longitude,
        }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

impl std::str::FromStr for LatLng {
    type Err = String;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected \"lat,lng\", got \"{s}\""))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid latitude \"{}\": {e}", lat.trim()))?;
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid longitude \"{}\": {e}", lng.trim()))?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("latitude {lat} out of range"));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!("longitude {lng} out of range"));
        }
        Ok(Self { lat, lng })
    }
}

/// A point in the `{latitude, longitude}` shape the store directory uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LatLng> for GeoLocation {
    fn from(point: LatLng) -> Self {
        Self {
            latitude: point.lat,
            longitude: point.lng,
        }
    }
}

/// Axis-aligned bounding box over a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self {
            south_west: *first,
            north_east: *first,
        };
        for point in rest {
            bounds.extend(*point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    #[must_use]
    pub fn contains(&self, point: &LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&point.lng)
    }

    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }
}

/// Great-circle distance between two points in kilometers.
#[must_use]
pub fn haversine_distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Arithmetic mean of a set of points, or `None` when empty.
#[must_use]
pub fn mean_center(points: &[LatLng]) -> Option<LatLng> {
    if points.is_empty() {
        return None;
    }
    // Point counts are tiny; no precision concern.
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (lat_sum, lng_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(LatLng {
        lat: lat_sum / n,
        lng: lng_sum / n,
    })
}

/// Display label for a distance, e.g. `"3.4 km"`.
#[must_use]
pub fn format_distance_km(km: f64) -> String {
    format!("{km:.1} km")
}
