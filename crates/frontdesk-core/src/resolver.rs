use chrono::NaiveDate;
use tracing::trace;

use crate::stay::{Snapshot, Stay, StayKind};

/// The stay occupying a (room, date) cell, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy<'a> {
    pub kind: StayKind,
    pub stay: &'a Stay,
}

/// Finds the stay covering `date` in the given room, if any.
///
/// Bookings always win over reservations: the reservation collection is
/// scanned only after the booking collection is exhausted, regardless of
/// how the intervals line up. A room string that does not parse as a
/// number cannot match anything and yields `None`.
pub fn resolve<'a>(
    snapshot: &'a Snapshot,
    room_number: &str,
    date: NaiveDate,
) -> Option<Occupancy<'a>> {
    let room: u32 = room_number.trim().parse().ok()?;

    let occupancy = find_covering(&snapshot.bookings, room, date)
        .or_else(|| find_covering(&snapshot.reservations, room, date))
        .map(|stay| Occupancy {
            kind: stay.kind,
            stay,
        });

    trace!(
        room,
        date = %date,
        hit = occupancy.map(|o| o.stay.id),
        "occupancy probe"
    );
    occupancy
}

/// True iff `date` is the check-in day of the stay that `resolve` would
/// return for this cell. Start-ness is a property of the resolved stay,
/// not of any stay that happens to share the room.
pub fn is_stay_start(snapshot: &Snapshot, room_number: &str, date: NaiveDate) -> bool {
    resolve(snapshot, room_number, date)
        .map(|occ| occ.stay.checkin_date == date)
        .unwrap_or(false)
}

fn find_covering(stays: &[Stay], room: u32, date: NaiveDate) -> Option<&Stay> {
    // Collections are id-sorted by Snapshot::new, so the first hit is the
    // lowest-id stay when upstream data violates the no-overlap invariant.
    stays
        .iter()
        .find(|stay| stay.occupies_room(room) && stay.covers(date))
}
