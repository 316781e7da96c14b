use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::stay::{BookingRecord, ReservationRecord, Room, RoomCategory, Snapshot};

/// Read-side cache of the upstream data: three JSON files under the
/// data directory. Missing files are seeded on open so a fresh install
/// renders an empty (but populated-with-rooms) grid.
#[derive(Debug)]
pub struct DataStore {
    pub data_dir: PathBuf,
    pub rooms_path: PathBuf,
    pub bookings_path: PathBuf,
    pub reservations_path: PathBuf,
}

impl DataStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let rooms_path = data_dir.join("rooms.json");
        let bookings_path = data_dir.join("bookings.json");
        let reservations_path = data_dir.join("reservations.json");

        if !rooms_path.exists() {
            save_json_atomic(&rooms_path, &default_rooms())?;
        }
        if !bookings_path.exists() {
            fs::write(&bookings_path, "[]\n")?;
        }
        if !reservations_path.exists() {
            fs::write(&reservations_path, "[]\n")?;
        }

        info!(
            data_dir = %data_dir.display(),
            rooms = %rooms_path.display(),
            bookings = %bookings_path.display(),
            reservations = %reservations_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            rooms_path,
            bookings_path,
            reservations_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load_rooms(&self) -> anyhow::Result<Vec<Room>> {
        load_json(&self.rooms_path).context("failed to load rooms.json")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_bookings(&self) -> anyhow::Result<Vec<BookingRecord>> {
        load_json(&self.bookings_path).context("failed to load bookings.json")
    }

    #[tracing::instrument(skip(self))]
    pub fn load_reservations(&self) -> anyhow::Result<Vec<ReservationRecord>> {
        load_json(&self.reservations_path).context("failed to load reservations.json")
    }

    /// Builds the resolution snapshot from both cached collections.
    /// Records that fail the data model (zero nights) are dropped with a
    /// warning inside the conversion, never surfaced as errors.
    #[tracing::instrument(skip(self))]
    pub fn load_snapshot(&self) -> anyhow::Result<Snapshot> {
        let bookings = self
            .load_bookings()?
            .into_iter()
            .filter_map(|record| record.into_stay())
            .collect();
        let reservations = self
            .load_reservations()?
            .into_iter()
            .filter_map(|record| record.into_stay())
            .collect();

        Ok(Snapshot::new(bookings, reservations))
    }

    #[tracing::instrument(skip(self, records))]
    pub fn save_bookings(&self, records: &[BookingRecord]) -> anyhow::Result<()> {
        save_json_atomic(&self.bookings_path, records).context("failed to save bookings.json")
    }

    #[tracing::instrument(skip(self, records))]
    pub fn save_reservations(&self, records: &[ReservationRecord]) -> anyhow::Result<()> {
        save_json_atomic(&self.reservations_path, records)
            .context("failed to save reservations.json")
    }
}

/// The reference property's room inventory, used only to seed a fresh
/// data directory.
fn default_rooms() -> Vec<Room> {
    let room = |id: &str, number: &str, category| Room {
        id: id.to_string(),
        number: number.to_string(),
        category,
        active: true,
    };

    vec![
        room("1", "101", RoomCategory::Single),
        room("2", "510", RoomCategory::Single),
        room("3", "204", RoomCategory::Single),
        room("4", "102", RoomCategory::Double),
        room("5", "202", RoomCategory::Double),
        room("6", "307", RoomCategory::Double),
        room("7", "408", RoomCategory::Double),
        room("8", "305", RoomCategory::Family),
        room("9", "601", RoomCategory::Family),
        room("10", "701", RoomCategory::Family),
    ]
}

#[tracing::instrument(skip(path))]
fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    debug!(file = %path.display(), "loading json collection");
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;

    let records: Vec<T> = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing {}", path.display()))?;

    debug!(count = records.len(), "loaded records");
    Ok(records)
}

#[tracing::instrument(skip(path, records))]
fn save_json_atomic<T: Serialize>(path: &Path, records: &[T]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = records.len(), "saving json atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    let serialized = serde_json::to_string_pretty(records)?;
    writeln!(temp, "{serialized}")?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
