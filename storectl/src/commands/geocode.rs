use crate::config::Config;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use libstore::{
    LocationTable, RecordStore,
    enrich::{Enricher, Outcome, Report},
    geocode,
};
use tracing::debug;

#[derive(Debug, PartialEq)]
enum Plan {
    Lookup,
    Done(String),
}

/// Decide whether a pass is needed, before any provider is set up
fn plan(
    table: &mut LocationTable,
    has_coordinates: bool,
    resume: bool,
    refresh: bool,
) -> libstore::Result<Plan> {
    if table.is_empty() {
        return Err(libstore::Error::EmptyTable);
    }
    if refresh {
        debug!("Discarding all existing coordinates");
        table.clear_coordinates();
    } else if has_coordinates {
        if !resume {
            return Ok(Plan::Done(format!(
                "{} of {} stores already have location data. Use --resume to look up the remaining stores or --refresh to look up all of them again.",
                table.coordinated_count(),
                table.len()
            )));
        }
        if table.pending_count() == 0 {
            return Ok(Plan::Done(format!(
                "All {} stores already have location data.",
                table.len()
            )));
        }
    }
    Ok(Plan::Lookup)
}

pub(crate) async fn handle_command(
    store: &RecordStore,
    cfg: &Config,
    resume: bool,
    refresh: bool,
) -> Result<()> {
    let (mut table, has_coordinates) = store.load().with_context(|| {
        format!(
            "Failed to load store data from '{}'",
            store.path().display()
        )
    })?;

    match plan(&mut table, has_coordinates, resume, refresh).with_context(|| {
        format!("No store data found in '{}'", store.path().display())
    })? {
        Plan::Lookup => (),
        Plan::Done(message) => {
            println!("{message}");
            return Ok(());
        }
    }

    let api_key = cfg.api_key().await?;
    if api_key.is_none() {
        eprintln!(
            "No geocoding API key configured (set {} or geocoder.api_key), using the Nominatim service (slower)",
            crate::config::API_KEY_VAR
        );
    }
    let geocoder = geocode::from_credential(api_key, &cfg.provider_settings())?;
    let enricher = Enricher::new(geocoder, cfg.policy());

    let progress = ProgressBar::new(table.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {wide_msg}",
    )?);
    let report = enricher
        .run(&mut table, |p| {
            progress.set_position(p.completed as u64);
            progress.set_message(p.record.name.clone());
            if let Outcome::Unresolved(warning) = p.outcome {
                progress.println(format!("warning: {warning}"));
            }
        })
        .await
        .with_context(|| {
            format!(
                "Cannot look up locations for '{}'",
                store.path().display()
            )
        })?;
    progress.finish_and_clear();
    print_summary(&report);

    if report.resolved > 0 || refresh {
        store.save(&table).with_context(|| {
            format!("Failed to save store data to '{}'", store.path().display())
        })?;
        println!(
            "Updated '{}' with location data",
            store.path().display()
        );
    }
    Ok(())
}

fn print_summary(report: &Report) {
    println!(
        "Looked up {} of {} stores: {} found, {} not resolved, {} already had location data",
        report.lookups,
        report.total,
        report.resolved,
        report.warnings.len(),
        report.skipped
    );
}
