//! Keeps a map widget's camera in step with the displayed stores.
//!
//! The camera moves only when the mean center of the located stores drifts
//! more than [`CENTER_EPSILON_DEG`] from the last center we moved to, or when
//! the located set grows from one store to several. Map idle events feed back
//! the widget's own center but never trigger a move by themselves, so a
//! `fit_bounds` that lands slightly off the mean does not start a loop.

use std::time::Duration;

use storeloc_core::geo::{mean_center, CENTER_EPSILON_DEG};
use storeloc_core::{store_coordinates, Bounds, LatLng, NormalizedStore};

use crate::error::MapError;

/// Imperative camera API of an embedded map.
pub trait MapWidget {
    fn pan_to(&mut self, center: LatLng) -> Result<(), MapError>;
    fn fit_bounds(&mut self, bounds: Bounds) -> Result<(), MapError>;
    fn set_zoom(&mut self, zoom: u8) -> Result<(), MapError>;
    /// Current camera center, if the widget can report one.
    fn center(&self) -> Option<LatLng>;
    fn zoom(&self) -> Option<u8>;
}

/// What a synchronizer call did to the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraMove {
    None,
    PanTo(LatLng),
    FitBounds(Bounds),
    Focus { center: LatLng, zoom: u8 },
}

#[derive(Debug, Clone, Copy)]
pub struct ViewportSettings {
    /// Center used before any store has been located.
    pub fallback_center: LatLng,
    pub focus_zoom: u8,
    /// Settle time before focusing a selected store.
    pub focus_delay: Duration,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            fallback_center: LatLng::new(19.0760, 72.8777),
            focus_zoom: 15,
            focus_delay: Duration::from_millis(100),
        }
    }
}

pub struct ViewportSynchronizer<W> {
    settings: ViewportSettings,
    widget: Option<W>,
    stable_center: Option<LatLng>,
    idle_center: Option<LatLng>,
    located_count: usize,
    focused: Option<LatLng>,
}

impl<W: MapWidget> ViewportSynchronizer<W> {
    #[must_use]
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            settings,
            widget: None,
            stable_center: None,
            idle_center: None,
            located_count: 0,
            focused: None,
        }
    }

    /// The widget finished loading; camera calls are allowed from now on.
    pub fn attach(&mut self, widget: W) {
        self.idle_center = widget.center();
        self.widget = Some(widget);
        tracing::debug!("map widget attached");
    }

    /// The widget is going away. Returns it to the caller.
    ///
    /// Camera history goes with it: the next attached widget starts from
    /// its own center.
    pub fn detach(&mut self) -> Option<W> {
        self.stable_center = None;
        self.idle_center = None;
        self.located_count = 0;
        self.focused = None;
        self.widget.take()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.widget.is_some()
    }

    #[must_use]
    pub fn widget(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    /// Record where the widget settled after a move or user drag.
    pub fn on_idle(&mut self) {
        if let Some(center) = self.widget.as_ref().and_then(MapWidget::center) {
            self.idle_center = Some(center);
        }
    }

    /// Stable center, or the fallback before any store was located.
    #[must_use]
    pub fn center(&self) -> LatLng {
        self.stable_center.unwrap_or(self.settings.fallback_center)
    }

    /// Whether a selected store currently owns the camera.
    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused.is_some()
    }

    /// Move the camera to cover the located stores in `stores`, if needed.
    pub fn sync(&mut self, stores: &[NormalizedStore]) -> CameraMove {
        if self.widget.is_none() || self.focused.is_some() {
            return CameraMove::None;
        }

        let points: Vec<LatLng> = stores.iter().filter_map(store_coordinates).collect();
        let Some(candidate) = mean_center(&points) else {
            return CameraMove::None;
        };

        let grew_from_single = self.located_count == 1 && points.len() > 1;
        let reference = self
            .stable_center
            .or(self.idle_center)
            .unwrap_or(self.settings.fallback_center);
        if !grew_from_single && !candidate.differs_from(&reference) {
            tracing::trace!(%candidate, %reference, epsilon = CENTER_EPSILON_DEG, "center unchanged");
            self.located_count = points.len();
            return CameraMove::None;
        }

        let Some(widget) = self.widget.as_mut() else {
            return CameraMove::None;
        };
        let result = match points.as_slice() {
            [single] => widget.pan_to(*single).map(|()| CameraMove::PanTo(*single)),
            _ => match Bounds::from_points(&points) {
                Some(bounds) => widget
                    .fit_bounds(bounds)
                    .map(|()| CameraMove::FitBounds(bounds)),
                None => return CameraMove::None,
            },
        };

        // Only a completed move updates history, so a failed one is retried.
        match result {
            Ok(moved) => {
                self.stable_center = Some(candidate);
                self.located_count = points.len();
                moved
            }
            Err(e) => {
                tracing::warn!(error = %e, located = points.len(), "map camera move failed");
                CameraMove::None
            }
        }
    }

    /// Center and zoom on a selected store after the settle delay.
    ///
    /// Aggregate syncing is suspended until [`Self::clear_focus`].
    pub async fn focus(&mut self, point: LatLng) -> CameraMove {
        self.focused = Some(point);
        if self.widget.is_none() {
            return CameraMove::None;
        }

        tokio::time::sleep(self.settings.focus_delay).await;

        let zoom = self.settings.focus_zoom;
        let Some(widget) = self.widget.as_mut() else {
            return CameraMove::None;
        };
        let result = widget.pan_to(point).and_then(|()| widget.set_zoom(zoom));
        match result {
            Ok(()) => CameraMove::Focus {
                center: point,
                zoom,
            },
            Err(e) => {
                tracing::warn!(error = %e, %point, "map focus failed");
                CameraMove::None
            }
        }
    }

    /// Hand the camera back to aggregate syncing. The next [`Self::sync`]
    /// compares against wherever the widget is now.
    pub fn clear_focus(&mut self) {
        if self.focused.take().is_some() {
            self.stable_center = None;
            self.located_count = 0;
            self.on_idle();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storeloc_core::store::{LatLong, StoreAddress};
    use storeloc_core::{normalize_store, StoreRecord};

    use super::*;

    #[derive(Default)]
    struct FakeMap {
        center: Option<LatLng>,
        zoom: Option<u8>,
        calls: Vec<CameraMove>,
        fail: bool,
        transient_failures: u32,
    }

    impl FakeMap {
        fn check(&mut self) -> Result<(), MapError> {
            if self.transient_failures > 0 {
                self.transient_failures -= 1;
                return Err(MapError("tiles still loading".to_string()));
            }
            if self.fail {
                return Err(MapError("not provisioned".to_string()));
            }
            Ok(())
        }
    }

    impl MapWidget for FakeMap {
        fn pan_to(&mut self, center: LatLng) -> Result<(), MapError> {
            self.check()?;
            self.center = Some(center);
            self.calls.push(CameraMove::PanTo(center));
            Ok(())
        }

        fn fit_bounds(&mut self, bounds: Bounds) -> Result<(), MapError> {
            self.check()?;
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

    fn located(uid: i64, lat: f64, lng: f64) -> NormalizedStore {
        normalize_store(
            Arc::new(StoreRecord {
                uid: Some(uid),
                name: format!("Store {uid}"),
                address: StoreAddress {
                    lat_long: Some(LatLong {
                        kind: Some("Point".to_string()),
                        coordinates: vec![lng, lat],
                    }),
                    ..StoreAddress::default()
                },
                ..StoreRecord::default()
            }),
            None,
        )
    }

    fn attached() -> ViewportSynchronizer<FakeMap> {
        let mut sync = ViewportSynchronizer::new(ViewportSettings {
            fallback_center: LatLng::new(0.0, 0.0),
            ..ViewportSettings::default()
        });
        sync.attach(FakeMap::default());
        sync
    }

    fn calls(sync: &ViewportSynchronizer<FakeMap>) -> usize {
        sync.widget().map_or(0, |w| w.calls.len())
    }

    #[test]
    fn does_nothing_before_attach() {
        let mut sync: ViewportSynchronizer<FakeMap> =
            ViewportSynchronizer::new(ViewportSettings::default());
        assert_eq!(sync.sync(&[located(1, 19.1, 72.9)]), CameraMove::None);
        assert!(!sync.is_ready());
    }

    #[test]
    fn pans_to_single_store() {
        let mut sync = attached();
        let moved = sync.sync(&[located(1, 19.076, 72.8777)]);
        assert_eq!(moved, CameraMove::PanTo(LatLng::new(19.076, 72.8777)));
    }

    #[test]
    fn sub_epsilon_drift_does_not_move_camera() {
        let mut sync = attached();
        sync.sync(&[located(1, 19.0760, 72.8777)]);
        assert_eq!(calls(&sync), 1);

        assert_eq!(sync.sync(&[located(1, 19.07601, 72.87771)]), CameraMove::None);
        assert_eq!(calls(&sync), 1);

        assert_ne!(sync.sync(&[located(1, 19.10, 72.90)]), CameraMove::None);
        assert_eq!(calls(&sync), 2);
    }

    #[test]
    fn growing_from_one_to_many_fits_bounds_even_at_same_center() {
        let mut sync = attached();
        sync.sync(&[located(1, 19.0, 72.0)]);

        // Mean of these two is the single store's position.
        let moved = sync.sync(&[located(2, 18.9, 71.9), located(3, 19.1, 72.1)]);
        assert!(matches!(moved, CameraMove::FitBounds(_)), "got: {moved:?}");
    }

    #[test]
    fn no_located_stores_keeps_previous_center() {
        let mut sync = attached();
        sync.sync(&[located(1, 19.1, 72.9)]);
        let unlocated = normalize_store(Arc::new(StoreRecord::default()), None);

        assert_eq!(sync.sync(&[unlocated]), CameraMove::None);
        assert_eq!(sync.center(), LatLng::new(19.1, 72.9));
    }

    #[test]
    fn widget_errors_are_swallowed() {
        let mut sync = ViewportSynchronizer::new(ViewportSettings::default());
        sync.attach(FakeMap {
            fail: true,
            ..FakeMap::default()
        });
        assert_eq!(sync.sync(&[located(1, 28.7, 77.1)]), CameraMove::None);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_overrides_aggregate_sync_until_cleared() {
        let mut sync = attached();
        let point = LatLng::new(19.2, 72.95);

        let moved = sync.focus(point).await;
        assert_eq!(moved, CameraMove::Focus { center: point, zoom: 15 });
        assert_eq!(sync.widget().and_then(MapWidget::zoom), Some(15));

        assert_eq!(sync.sync(&[located(1, 28.7, 77.1)]), CameraMove::None);

        sync.clear_focus();
        assert_ne!(sync.sync(&[located(1, 28.7, 77.1)]), CameraMove::None);
    }

    #[test]
    fn reattached_widget_is_recentered() {
        let mut sync = attached();
        let delhi = [located(1, 28.70, 77.10)];
        assert!(matches!(sync.sync(&delhi), CameraMove::PanTo(_)));

        let old = sync.detach().expect("widget was attached");
        assert_eq!(old.calls.len(), 1);
        assert!(!sync.is_ready());

        sync.attach(FakeMap {
            center: Some(LatLng::new(19.076, 72.8777)),
            ..FakeMap::default()
        });
        let moved = sync.sync(&delhi);
        assert_eq!(moved, CameraMove::PanTo(LatLng::new(28.70, 77.10)));
        assert_eq!(calls(&sync), 1);
    }

    #[test]
    fn failed_move_is_retried_on_next_sync() {
        let mut sync = ViewportSynchronizer::new(ViewportSettings {
            fallback_center: LatLng::new(0.0, 0.0),
            ..ViewportSettings::default()
        });
        sync.attach(FakeMap {
            transient_failures: 1,
            ..FakeMap::default()
        });
        let stores = [located(1, 28.7, 77.1)];

        assert_eq!(sync.sync(&stores), CameraMove::None);
        assert_eq!(sync.center(), LatLng::new(0.0, 0.0));

        assert_eq!(sync.sync(&stores), CameraMove::PanTo(LatLng::new(28.7, 77.1)));
        assert_eq!(sync.center(), LatLng::new(28.7, 77.1));
        assert_eq!(calls(&sync), 1);
    }
}
