use anyhow::anyhow;
use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::calendar;
use crate::cli::Invocation;
use crate::config::Config;
use crate::datastore::DataStore;
use crate::datetime;
use crate::fetch::{SnapshotCell, StayService};
use crate::filter::RoomFilter;
use crate::grid;
use crate::render::Renderer;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "grid", "rooms", "stays", "sync", "config", "version", "help",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(store, cfg, renderer, inv))]
pub fn dispatch(
    store: &DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let today = datetime::to_property_date(Utc::now());
    let command = inv.command.as_str();

    debug!(command, filter = ?inv.filter_terms, args = ?inv.command_args, "dispatching");

    match command {
        "grid" => cmd_grid(store, cfg, renderer, &inv, today),
        "rooms" => cmd_rooms(store, renderer, &inv),
        "stays" => cmd_stays(store, renderer),
        "sync" => cmd_sync(store, cfg, &inv),
        "config" => cmd_config(cfg),
        "version" => {
            println!("frontdesk {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" => {
            print_help();
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip_all)]
fn cmd_grid(
    store: &DataStore,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: &Invocation,
    today: chrono::NaiveDate,
) -> anyhow::Result<()> {
    let anchor = match inv.command_args.first() {
        Some(expr) => datetime::parse_anchor_expr(expr, today)?,
        None => today,
    };

    let days = cfg.get_usize_or("window.days", 23);
    let lead = cfg.get_usize_or("window.lead", 3);
    let window = calendar::date_window(anchor, days, lead, today);

    let filter = RoomFilter::parse(&inv.filter_terms)?;
    let rooms = store.load_rooms()?;
    let snapshot = store.load_snapshot()?;

    let grid = grid::project(&rooms, &window, &snapshot, &filter);
    renderer.print_grid(&grid, &calendar::month_label(anchor))?;
    renderer.print_legend()?;
    Ok(())
}

#[instrument(skip_all)]
fn cmd_rooms(store: &DataStore, renderer: &mut Renderer, inv: &Invocation) -> anyhow::Result<()> {
    let filter = RoomFilter::parse(&inv.filter_terms)?;
    let rooms: Vec<_> = store
        .load_rooms()?
        .into_iter()
        .filter(|room| filter.matches(room))
        .collect();

    renderer.print_rooms(&rooms)
}

#[instrument(skip_all)]
fn cmd_stays(store: &DataStore, renderer: &mut Renderer) -> anyhow::Result<()> {
    let snapshot = store.load_snapshot()?;
    renderer.print_stays(&snapshot)
}

/// Pulls a fresh snapshot from the upstream endpoints and replaces the
/// local cache. Both collections are fetched before anything is
/// applied; a failed fetch leaves the cache untouched for the caller to
/// retry.
#[instrument(skip_all)]
fn cmd_sync(store: &DataStore, cfg: &Config, inv: &Invocation) -> anyhow::Result<()> {
    let base = match inv.command_args.first() {
        Some(url) => url.clone(),
        None => cfg
            .get("api.base")
            .ok_or_else(|| anyhow!("no api.base configured"))?,
    };

    let service = StayService::new(&base)?;
    let mut cell = SnapshotCell::new();
    let ticket = cell.begin_request();

    let (bookings, reservations) = service.fetch_snapshot_records_blocking()?;

    let snapshot = crate::stay::Snapshot::new(
        bookings.iter().cloned().filter_map(|r| r.into_stay()).collect(),
        reservations
            .iter()
            .cloned()
            .filter_map(|r| r.into_stay())
            .collect(),
    );
    if !cell.complete(ticket, snapshot) {
        return Err(anyhow!("snapshot superseded before it could be applied"));
    }

    store.save_bookings(&bookings)?;
    store.save_reservations(&reservations)?;

    let applied = cell.snapshot().map(|s| (s.bookings.len(), s.reservations.len()));
    info!(?applied, base = %base, "synced stay snapshot");
    println!(
        "synced {} bookings and {} reservations from {}",
        bookings.len(),
        reservations.len(),
        base
    );
    Ok(())
}

fn cmd_config(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<_> = cfg.iter().collect();
    entries.sort_by_key(|(k, _)| k.clone());

    for (key, value) in entries {
        println!("{key}={value}");
    }
    Ok(())
}

fn print_help() {
    println!("usage: frontdesk [filter terms] <command> [args]");
    println!();
    println!("commands:");
    println!("  grid [anchor]   occupancy calendar (anchor: ISO date, today, +2w, -1m)");
    println!("  rooms           list rooms matching the filter");
    println!("  stays           list cached bookings and reservations");
    println!("  sync [url]      fetch bookings and reservations from the API");
    println!("  config          show effective configuration");
    println!("  version         print the version");
    println!();
    println!("filter terms: type:<all|single|double|family>, free text matches room numbers");
}
