//! A map widget that renders camera moves as log lines.

use storeloc_core::{Bounds, LatLng};
use storeloc_engine::{MapError, MapWidget};

#[derive(Debug, Clone)]
pub(crate) struct TerminalMap {
    center: LatLng,
    zoom: u8,
}

impl TerminalMap {
    pub(crate) fn new(center: LatLng, zoom: u8) -> Self {
        Self { center, zoom }
    }
}

impl MapWidget for TerminalMap {
    fn pan_to(&mut self, center: LatLng) -> Result<(), MapError> {
        tracing::info!(%center, "map: pan");
        self.center = center;
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: Bounds) -> Result<(), MapError> {
        tracing::info!(
            south_west = %bounds.south_west,
            north_east = %bounds.north_east,
            "map: fit bounds"
        );
        self.center = bounds.center();
        Ok(())
    }

    fn set_zoom(&mut self, zoom: u8) -> Result<(), MapError> {
        if zoom > 22 {
            return Err(MapError(format!("zoom {zoom} out of range")));
        }
        tracing::info!(zoom, "map: zoom");
        self.zoom = zoom;
        Ok(())
    }

    fn center(&self) -> Option<LatLng> {
        Some(self.center)
    }

    fn zoom(&self) -> Option<u8> {
        Some(self.zoom)
    }
}
