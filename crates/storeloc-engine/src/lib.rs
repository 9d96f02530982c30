//! Store locator orchestration: fetching, filtering, and map syncing.

pub mod error;
pub mod fetcher;
pub mod filters;
pub mod locator;
pub mod state;
pub mod viewport;

pub use error::{EngineError, MapError};
pub use fetcher::{FetchHandle, FetchOutcome, StoreFetcher};
pub use filters::{derive_city_options, FilterController, FilterState};
pub use locator::{LocatorSettings, StoreLocator};
pub use state::StoreListState;
pub use viewport::{CameraMove, MapWidget, ViewportSettings, ViewportSynchronizer};
