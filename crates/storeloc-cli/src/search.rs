//! `search` and `cities` command handlers.

use chrono::Datelike;

use storeloc_client::{GeocodingProvider, StoreDirectory};
use storeloc_core::{AppConfig, LatLng, NormalizedStore};
use storeloc_engine::{CameraMove, FetchOutcome, StoreLocator};

use crate::map::TerminalMap;

#[derive(Debug, Default)]
pub(crate) struct SearchArgs {
    pub(crate) city: Option<String>,
    pub(crate) query: Option<String>,
    pub(crate) near: Option<LatLng>,
    pub(crate) select: Option<String>,
}

/// Run a filtered search and print the matching stores.
///
/// The terminal map follows the results the way an embedded map would, so
/// camera moves show up in the log.
///
/// # Errors
///
/// Returns an error if `--select` names a store that is not in the results.
pub(crate) async fn run_search<D, G>(
    locator: &mut StoreLocator<D, G, TerminalMap>,
    config: &AppConfig,
    args: &SearchArgs,
) -> anyhow::Result<()>
where
    D: StoreDirectory,
    G: GeocodingProvider,
{
    locator.attach_map(TerminalMap::new(config.default_center, 11));
    if locator.load().await == FetchOutcome::Failed {
        anyhow::bail!("could not load stores; see log for details");
    }

    if let Some(city) = args.city.as_deref() {
        locator.set_city(city);
    }
    if let Some(query) = args.query.as_deref() {
        locator.set_search(query);
    }
    if args.near.is_some() {
        locator.set_user_location(args.near);
    }

    let state = locator.settled().await;
    locator.sync_map();
    locator.on_map_idle();

    if state.display_stores.is_empty() {
        println!("no stores found{}", describe_filters(args));
        return Ok(());
    }

    print_stores(&state.display_stores);
    println!();
    println!(
        "{} stores, {} on the map",
        state.display_stores.len(),
        state.stores_with_coordinates().len()
    );

    if let Some(id) = args.select.as_deref() {
        match locator.select_store(id).await? {
            CameraMove::Focus { center, zoom } => {
                println!("map focused on store {id} at {center} (zoom {zoom})");
            }
            _ => println!("store {id} has no known location"),
        }
    }

    Ok(())
}

/// Print the city filter options.
///
/// # Errors
///
/// Returns an error if the store directory cannot be reached.
pub(crate) async fn run_cities<D, G>(
    locator: &mut StoreLocator<D, G, TerminalMap>,
) -> anyhow::Result<()>
where
    D: StoreDirectory,
    G: GeocodingProvider,
{
    if locator.load().await == FetchOutcome::Failed {
        anyhow::bail!("could not load stores; see log for details");
    }

    let cities = locator.city_options();
    if cities.is_empty() {
        println!("no cities found");
        return Ok(());
    }
    for city in &cities {
        println!("{city}");
    }
    Ok(())
}

fn print_stores(stores: &[NormalizedStore]) {
    let today = chrono::Local::now().weekday();
    let header = format!(
        "{:<10}{:<30}{:<10}{:<16}{:<18}ADDRESS",
        "ID", "NAME", "DISTANCE", "TODAY", "PHONE"
    );
    println!("{header}");
    for store in stores {
        println!(
            "{:<10}{:<30}{:<10}{:<16}{:<18}{}",
            store.id,
            truncate(&store.name, 28),
            store.distance.as_deref().unwrap_or("-"),
            store.hours_for(today).unwrap_or_else(|| "-".to_string()),
            if store.phone.is_empty() { "-" } else { store.phone.as_str() },
            store.address,
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max.saturating_sub(3)).collect::<String>())
    } else {
        text.to_string()
    }
}

fn describe_filters(args: &SearchArgs) -> String {
    let mut parts = Vec::new();
    if let Some(city) = &args.city {
        parts.push(format!("city {city}"));
    }
    if let Some(query) = &args.query {
        parts.push(format!("\"{query}\""));
    }
    if let Some(near) = args.near {
        parts.push(format!("near {near}"));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" for {}", parts.join(", "))
    }
}
