use crate::output::{self, OutputFormat, rows::LocationRow};
use anyhow::{Context, Result, anyhow};
use libstore::{Coordinate, LocationTable, RecordStore, view::MapView};

fn load(store: &RecordStore) -> Result<LocationTable> {
    let (table, _) = store.load().with_context(|| {
        format!(
            "Failed to load store data from '{}'",
            store.path().display()
        )
    })?;
    if table.is_empty() {
        return Err(anyhow!(
            "No store data found in '{}'",
            store.path().display()
        ));
    }
    Ok(table)
}

pub(crate) fn status(store: &RecordStore) -> Result<()> {
    let table = load(store)?;
    println!("Using store data '{}'", store.path().display());
    println!(
        "{} stores, {} with location data",
        table.len(),
        table.coordinated_count()
    );
    Ok(())
}

pub(crate) fn list(store: &RecordStore, all: bool, format: OutputFormat) -> Result<()> {
    let table = load(store)?;
    let rows = table
        .iter()
        .filter(|r| all || r.is_coordinated())
        .map(LocationRow::new)
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return Err(anyhow!(
            "No stores with location data. Run 'geocode' first or pass --all"
        ));
    }
    println!("{}", output::format_seq(rows, format)?);
    Ok(())
}

pub(crate) fn view(
    store: &RecordStore,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<()> {
    let table = load(store)?;
    let user_location = match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::try_new(lat, lon)?),
        _ => None,
    };
    let view = MapView::new(&table, user_location)
        .ok_or_else(|| anyhow!("No stores with location data. Run 'geocode' first"))?;
    println!(
        "Center: {:.6}, {:.6} (zoom {})",
        view.center.latitude, view.center.longitude, view.zoom
    );
    if let Some(me) = view.user_location {
        println!("Your location: {:.6}, {:.6}", me.latitude, me.longitude);
    }
    println!("{} stores on the map", view.markers().len());
    println!("{}", view.viewer_uri());
    Ok(())
}
