pub mod directory;
pub mod error;
pub mod fixture;
pub mod geocode;

pub use directory::{GraphqlDirectory, StoreDirectory};
pub use error::{DirectoryError, GeocodeError};
pub use fixture::FixtureDirectory;
pub use geocode::{Geocoder, GeocodingProvider, HttpGeocoder, NoopGeocoder};
