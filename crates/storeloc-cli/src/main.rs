use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use storeloc_client::{
    FixtureDirectory, Geocoder, GeocodingProvider, GraphqlDirectory, HttpGeocoder, StoreDirectory,
};
use storeloc_core::{AppConfig, DirectorySource, LatLng};
use storeloc_engine::{LocatorSettings, StoreLocator};

mod map;
mod search;

#[derive(Debug, Parser)]
#[command(name = "storeloc")]
#[command(about = "Store locator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search stores by city, name, or proximity
    Search {
        /// Only stores in this city
        #[arg(long)]
        city: Option<String>,

        /// Free-text search over store names
        #[arg(long)]
        query: Option<String>,

        /// Search around a point, given as `LAT,LNG`
        #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
        near: Option<LatLng>,

        /// Focus the map on this store id after the search
        #[arg(long, value_name = "STORE_ID")]
        select: Option<String>,
    },
    /// List the cities that have at least one store
    Cities,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = storeloc_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        println!("storeloc ready; see `storeloc --help` for commands");
        return Ok(());
    };

    let geocoder = build_geocoder(&config)?;
    match &config.directory {
        DirectorySource::Graphql {
            url,
            application_token,
        } => {
            let directory = GraphqlDirectory::new(
                url,
                application_token.as_deref(),
                config.request_timeout_secs,
                &config.user_agent,
            )?;
            run(command, directory, geocoder, &config).await
        }
        DirectorySource::Fixture(path) => {
            let directory = FixtureDirectory::from_path(path)?;
            tracing::info!(path = %path.display(), "serving stores from fixture file");
            run(command, directory, geocoder, &config).await
        }
    }
}

/// HTTP geocoder when an API key is configured, otherwise a geocoder that
/// never resolves anything.
fn build_geocoder(config: &AppConfig) -> anyhow::Result<Geocoder<Option<HttpGeocoder>>> {
    let provider = match config.geocoder_api_key.as_deref() {
        Some(key) => Some(HttpGeocoder::new(
            &config.geocoder_url,
            key,
            config.request_timeout_secs,
            &config.user_agent,
        )?),
        None => {
            tracing::info!("STORELOC_GEOCODER_API_KEY not set; geocoding disabled");
            None
        }
    };
    Ok(Geocoder::new(provider))
}

async fn run<D, G>(
    command: Commands,
    directory: D,
    geocoder: Geocoder<G>,
    config: &AppConfig,
) -> anyhow::Result<()>
where
    D: StoreDirectory,
    G: GeocodingProvider,
{
    let mut locator = StoreLocator::new(directory, geocoder, LocatorSettings::from_config(config));

    let result = match command {
        Commands::Search {
            city,
            query,
            near,
            select,
        } => {
            let args = search::SearchArgs {
                city,
                query,
                near,
                select,
            };
            search::run_search(&mut locator, config, &args).await
        }
        Commands::Cities => search::run_cities(&mut locator).await,
    };

    locator.shutdown();
    result
}
